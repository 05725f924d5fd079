use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use pokebot_core::AppError;
use tracing_subscriber::EnvFilter;

use crate::auth::AdminCredentials;

/// Runtime configuration, read once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub admin_credentials: Option<AdminCredentials>,
    pub decisions_dir: PathBuf,
    pub purchases_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_host = lookup("API_HOST")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "0.0.0.0".to_owned());
        let api_port = match lookup("PORT").filter(|value| !value.trim().is_empty()) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid PORT '{value}': {error}")))?,
            None => 5000,
        };

        // Auth is only enabled when both halves are present.
        let admin_credentials = match (lookup("ADMIN_USER"), lookup("ADMIN_PASS")) {
            (Some(username), Some(password))
                if !username.is_empty() && !password.is_empty() =>
            {
                Some(AdminCredentials::new(username, password)?)
            }
            _ => None,
        };

        let directory = |name: &str, default: &str| {
            PathBuf::from(
                lookup(name)
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| default.to_owned()),
            )
        };

        Ok(Self {
            api_host,
            api_port,
            admin_credentials,
            decisions_dir: directory("DECISIONS_DIR", "decisions"),
            purchases_dir: directory("PURCHASES_DIR", "purchases"),
            logs_dir: directory("LOGS_DIR", "logs"),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
