use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub listen_addr: SocketAddr,
    pub request_timeout_secs: u64,
}

impl PortalConfig {
    /// Reads `PORTAL_API_BASE_URL`, `PORTAL_LISTEN_ADDR` and
    /// `PORTAL_REQUEST_TIMEOUT_SECS`, falling back to local defaults.
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("PORTAL_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let listen_addr = lookup("PORTAL_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.parse::<SocketAddr>().map_err(|e| {
            AppError::Config(format!("PORTAL_LISTEN_ADDR {:?} is invalid: {}", listen_addr, e))
        })?;

        let request_timeout_secs = match lookup("PORTAL_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|v| *v > 0).ok_or_else(|| {
                AppError::Config(format!(
                    "PORTAL_REQUEST_TIMEOUT_SECS must be a positive integer, got {:?}",
                    raw
                ))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base_url,
            listen_addr,
            request_timeout_secs,
        })
    }
}
