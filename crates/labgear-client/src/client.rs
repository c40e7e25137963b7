use std::time::Duration;

use labgear_store::{ApiToken, Machine, MachineKind, MachineSpec};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;

const MACHINES_PATH: &str = "/api/v1/machines";

#[derive(Clone, Debug)]
pub struct MachineClientConfig {
    pub endpoint: String,
    pub token: ApiToken,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for MachineClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: ApiToken::new(""),
            timeout_ms: 30_000,
            user_agent: concat!("labgear-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    /// The server had no such record; the delete is already satisfied.
    AlreadyAbsent,
}

/// One HTTP call per operation against the inventory API.
#[derive(Clone)]
pub struct MachineClient {
    http: reqwest::Client,
    endpoint: String,
    token: ApiToken,
}

impl MachineClient {
    pub fn new(config: MachineClientConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(ClientError::Config("endpoint must not be empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .user_agent(config.user_agent)
            .build()
            .map_err(|err| ClientError::Config(err.to_string()))?;
        Ok(Self {
            http,
            endpoint,
            token: config.token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn create_machine(&self, spec: &MachineSpec) -> Result<Machine, ClientError> {
        let resp = self
            .request(Method::POST, MACHINES_PATH.to_string())
            .json(spec)
            .send()
            .await?;
        match resp.status() {
            StatusCode::CREATED => decode(resp).await,
            _ => Err(unexpected(resp).await),
        }
    }

    /// `Ok(None)` when the server answers 404.
    pub async fn get_machine(&self, id: &str) -> Result<Option<Machine>, ClientError> {
        let resp = self.request(Method::GET, machine_path(id)).send().await?;
        match resp.status() {
            StatusCode::OK => decode(resp).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(unexpected(resp).await),
        }
    }

    pub async fn list_machines(&self, kind: Option<MachineKind>) -> Result<Vec<Machine>, ClientError> {
        let path = match kind {
            Some(kind) => format!("{MACHINES_PATH}?kind={}", kind.as_str()),
            None => MACHINES_PATH.to_string(),
        };
        let resp = self.request(Method::GET, path).send().await?;
        match resp.status() {
            StatusCode::OK => decode(resp).await,
            _ => Err(unexpected(resp).await),
        }
    }

    pub async fn update_machine(&self, id: &str, spec: &MachineSpec) -> Result<Machine, ClientError> {
        let resp = self
            .request(Method::PUT, machine_path(id))
            .json(spec)
            .send()
            .await?;
        match resp.status() {
            StatusCode::OK => decode(resp).await,
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(id.to_string())),
            _ => Err(unexpected(resp).await),
        }
    }

    pub async fn delete_machine(&self, id: &str) -> Result<DeleteOutcome, ClientError> {
        let resp = self.request(Method::DELETE, machine_path(id)).send().await?;
        match resp.status() {
            StatusCode::NO_CONTENT => Ok(DeleteOutcome::Deleted),
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::AlreadyAbsent),
            _ => Err(unexpected(resp).await),
        }
    }

    fn request(&self, method: Method, path: String) -> RequestBuilder {
        debug!(%method, path = %path, "lab_gear api call");
        self.http
            .request(method, format!("{}{}", self.endpoint, path))
            .header(AUTHORIZATION, self.token.authorization_value())
            .header(ACCEPT, "application/json")
    }
}

fn machine_path(id: &str) -> String {
    format!("{MACHINES_PATH}/{}", urlencoding::encode(id))
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
}

async fn unexpected(resp: Response) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    debug!(status, body = %body, "unexpected lab_gear api status");
    ClientError::UnexpectedStatus { status, body }
}
