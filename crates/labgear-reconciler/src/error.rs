use labgear_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Api(#[from] ClientError),
    #[error("cannot import machine {0}: no such record")]
    ImportNotFound(String),
    #[error("provider configuration error: {0}")]
    Config(String),
}
