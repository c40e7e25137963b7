mod client;
mod error;

pub use client::{DeleteOutcome, MachineClient, MachineClientConfig};
pub use error::ClientError;
