use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::machine::{Machine, MachineKind};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("repository error: {0}")]
    Store(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("machine not found: {0}")]
    NotFound(String),
    #[error("machine already exists: {0}")]
    Conflict(String),
}

/// Persistence for machine records. Every call is atomic on its own; there
/// are no transactions spanning calls.
pub trait MachineRepository: Send + Sync {
    fn create(&self, machine: &Machine) -> Result<(), RepositoryError>;
    fn get_by_id(&self, id: &str) -> Result<Option<Machine>, RepositoryError>;
    fn list(&self, kind: Option<MachineKind>) -> Result<Vec<Machine>, RepositoryError>;
    /// Replaces the mutable fields and `updated_at` of an existing record.
    /// `id` and `created_at` on disk are left untouched.
    fn update(&self, machine: &Machine) -> Result<(), RepositoryError>;
    fn delete(&self, id: &str) -> Result<(), RepositoryError>;
    fn ping(&self) -> Result<(), RepositoryError>;
}

#[derive(Clone, Default)]
pub struct InMemoryMachineRepository {
    machines: Arc<RwLock<HashMap<String, Machine>>>,
}

impl InMemoryMachineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl MachineRepository for InMemoryMachineRepository {
    fn create(&self, machine: &Machine) -> Result<(), RepositoryError> {
        let mut machines = self.machines.write();
        if machines.contains_key(&machine.id) {
            return Err(RepositoryError::Conflict(machine.id.clone()));
        }
        machines.insert(machine.id.clone(), machine.clone());
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Machine>, RepositoryError> {
        Ok(self.machines.read().get(id).cloned())
    }

    fn list(&self, kind: Option<MachineKind>) -> Result<Vec<Machine>, RepositoryError> {
        Ok(self
            .machines
            .read()
            .values()
            .filter(|machine| kind.map_or(true, |kind| machine.kind == kind))
            .cloned()
            .collect())
    }

    fn update(&self, machine: &Machine) -> Result<(), RepositoryError> {
        let mut machines = self.machines.write();
        let item = machines
            .get_mut(&machine.id)
            .ok_or_else(|| RepositoryError::NotFound(machine.id.clone()))?;
        let created_at = item.created_at;
        *item = Machine {
            created_at,
            ..machine.clone()
        };
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.machines
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
