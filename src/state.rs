use std::sync::Arc;

use crate::upstream::PortalApi;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn PortalApi>,
}

impl AppState {
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self { api }
    }
}
