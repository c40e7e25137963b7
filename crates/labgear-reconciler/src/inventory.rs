use std::sync::Arc;

use labgear_store::{Machine, MachineKind};
use tracing::debug;

use crate::api::MachineApi;
use crate::error::ReconcileError;

/// Read-only view over every machine the server knows about.
#[derive(Clone)]
pub struct MachineInventory {
    api: Arc<dyn MachineApi>,
}

impl MachineInventory {
    pub fn new(api: Arc<dyn MachineApi>) -> Self {
        Self { api }
    }

    pub async fn list(&self, kind: Option<MachineKind>) -> Result<Vec<Machine>, ReconcileError> {
        let machines = self.api.list_machines(kind).await?;
        debug!(kind = ?kind, count = machines.len(), "listed machines");
        Ok(machines)
    }
}
