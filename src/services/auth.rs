use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{Credentials, Role, User};
use crate::upstream::PortalApi;

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub access: String,
    pub refresh: String,
    pub user: User,
    pub dashboard: &'static str,
}

pub struct AuthService {
    api: Arc<dyn PortalApi>,
}

impl AuthService {
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self { api }
    }

    /// Exchanges credentials for tokens, then loads the profile to pick the
    /// landing dashboard.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, AppError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(AppError::BadRequest(
                "email and password are required".to_string(),
            ));
        }

        let tokens = self.api.obtain_token(credentials).await?;
        let user = self.api.current_user(&tokens.access).await?;
        info!("{} (user {}) logged in as {:?}", user.display_name(), user.id, user.role);

        Ok(LoginOutcome {
            access: tokens.access,
            refresh: tokens.refresh,
            dashboard: user.role.dashboard_path(),
            user,
        })
    }

    /// Revokes the refresh token upstream. Failures are logged, never returned:
    /// the client discards its tokens either way.
    pub async fn logout(&self, refresh: &str) {
        if let Err(e) = self.api.logout(refresh).await {
            warn!("backend logout failed: {}", e);
        }
    }

    pub async fn current_user(&self, token: &str) -> Result<User, AppError> {
        self.api.current_user(token).await
    }

    pub async fn require_role(&self, token: &str, allowed: &[Role]) -> Result<User, AppError> {
        let user = self.current_user(token).await?;
        if allowed.contains(&user.role) {
            Ok(user)
        } else {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
    }
}
