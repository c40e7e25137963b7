use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use labgear_store::{
    ApiToken, MachineRepository, SqliteMachineRepository, SystemConfig, SystemConfigLoader,
};
use serde::Serialize;
use tracing::warn;

use crate::error::AppError;

pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

pub struct AppState {
    pub repo: Arc<dyn MachineRepository>,
    pub api_token: ApiToken,
    pub build: BuildInfo,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(repo: Arc<dyn MachineRepository>, api_token: ApiToken) -> Self {
        Self {
            repo,
            api_token,
            build: BuildInfo::current(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn from_config(config: &SystemConfig) -> Result<Self, AppError> {
        let api_token = ApiToken::new(config.require_string("security.api_token")?);
        let repo = build_repository(config)?;
        let limit = config.get_number("server.max_body_bytes");
        let limit = if limit <= 0 {
            DEFAULT_MAX_BODY_BYTES
        } else {
            limit as usize
        };
        Ok(Self::new(repo, api_token).with_max_body_bytes(limit))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("LABGEAR_COMMIT").unwrap_or("none").to_string(),
        }
    }
}

/// Reads the TOML config file. A missing file is not an error: defaults and
/// environment overrides are enough to run.
pub fn load_config(path: &Path) -> Result<SystemConfig, AppError> {
    if !path.exists() {
        warn!(path = %path.display(), "config file missing, using defaults and environment");
        return Ok(SystemConfigLoader::from_str("")?);
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(SystemConfigLoader::from_str(&raw)?)
}

pub fn listen_addr(config: &SystemConfig) -> Result<SocketAddr, AppError> {
    let host = config.get_string("server.host");
    let port = config.get_number("server.port");
    let port = u16::try_from(port)
        .map_err(|_| AppError::bad_request(format!("server.port out of range: {port}")))?;
    let ip = host
        .parse::<IpAddr>()
        .map_err(|err| AppError::bad_request(format!("invalid server.host {host:?}: {err}")))?;
    Ok(SocketAddr::new(ip, port))
}

fn build_repository(config: &SystemConfig) -> Result<Arc<dyn MachineRepository>, AppError> {
    let path = config.get_string("storage.sqlite_path");
    let repo = SqliteMachineRepository::open(&path)?;
    repo.ensure_schema()?;
    Ok(Arc::new(repo))
}
