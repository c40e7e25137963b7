use async_trait::async_trait;
use labgear_client::{ClientError, DeleteOutcome, MachineClient};
use labgear_store::{Machine, MachineKind, MachineSpec};

/// The remote operations the controller needs. `MachineClient` is the
/// production implementation; tests substitute an in-process fake.
#[async_trait]
pub trait MachineApi: Send + Sync {
    async fn create_machine(&self, spec: &MachineSpec) -> Result<Machine, ClientError>;
    async fn get_machine(&self, id: &str) -> Result<Option<Machine>, ClientError>;
    async fn list_machines(&self, kind: Option<MachineKind>) -> Result<Vec<Machine>, ClientError>;
    async fn update_machine(&self, id: &str, spec: &MachineSpec) -> Result<Machine, ClientError>;
    async fn delete_machine(&self, id: &str) -> Result<DeleteOutcome, ClientError>;
}

#[async_trait]
impl MachineApi for MachineClient {
    async fn create_machine(&self, spec: &MachineSpec) -> Result<Machine, ClientError> {
        MachineClient::create_machine(self, spec).await
    }

    async fn get_machine(&self, id: &str) -> Result<Option<Machine>, ClientError> {
        MachineClient::get_machine(self, id).await
    }

    async fn list_machines(&self, kind: Option<MachineKind>) -> Result<Vec<Machine>, ClientError> {
        MachineClient::list_machines(self, kind).await
    }

    async fn update_machine(&self, id: &str, spec: &MachineSpec) -> Result<Machine, ClientError> {
        MachineClient::update_machine(self, id, spec).await
    }

    async fn delete_machine(&self, id: &str) -> Result<DeleteOutcome, ClientError> {
        MachineClient::delete_machine(self, id).await
    }
}
