use std::sync::Arc;

use labgear_client::DeleteOutcome;
use labgear_store::Machine;
use tracing::{info, instrument, warn};

use crate::api::MachineApi;
use crate::declaration::MachineDeclaration;
use crate::error::ReconcileError;

#[derive(Clone, Debug, PartialEq)]
pub enum Plan {
    Create,
    Update { changed: Vec<&'static str> },
    NoOp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Created,
    Updated { changed: Vec<&'static str> },
    Deleted,
    Unchanged,
}

/// Outcome of one reconciliation pass.
#[derive(Clone, Debug)]
pub struct Reconciled {
    pub state: Option<Machine>,
    pub action: Action,
    /// The tracked record had been removed out of band and was dropped.
    pub drifted: bool,
}

/// Drives one declared machine towards its declaration. The tracked state is
/// always the record last returned by the server.
#[derive(Clone)]
pub struct MachineResource {
    api: Arc<dyn MachineApi>,
}

impl MachineResource {
    pub fn new(api: Arc<dyn MachineApi>) -> Self {
        Self { api }
    }

    #[instrument(skip_all, fields(name = %declaration.name, kind = %declaration.kind))]
    pub async fn create(&self, declaration: &MachineDeclaration) -> Result<Machine, ReconcileError> {
        let created = self.api.create_machine(&declaration.to_spec()).await?;
        info!(id = %created.id, "machine created");
        Ok(created)
    }

    /// `Ok(None)` means the record no longer exists and tracked state should
    /// be dropped.
    #[instrument(skip_all, fields(id = %state.id))]
    pub async fn read(&self, state: &Machine) -> Result<Option<Machine>, ReconcileError> {
        let current = self.api.get_machine(&state.id).await?;
        if current.is_none() {
            warn!("machine removed outside of reconciliation, dropping state");
        }
        Ok(current)
    }

    #[instrument(skip_all, fields(id = %state.id))]
    pub async fn update(
        &self,
        state: &Machine,
        declaration: &MachineDeclaration,
    ) -> Result<Machine, ReconcileError> {
        let spec = declaration.merged_spec(state);
        let mut updated = self.api.update_machine(&state.id, &spec).await?;
        updated.id = state.id.clone();
        info!(updated_at = %updated.updated_at, "machine updated");
        Ok(updated)
    }

    #[instrument(skip_all, fields(id = %state.id))]
    pub async fn delete(&self, state: &Machine) -> Result<(), ReconcileError> {
        match self.api.delete_machine(&state.id).await? {
            DeleteOutcome::Deleted => info!("machine deleted"),
            DeleteOutcome::AlreadyAbsent => info!("machine already absent"),
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn import(&self, id: &str) -> Result<Machine, ReconcileError> {
        self.api
            .get_machine(id)
            .await?
            .ok_or_else(|| ReconcileError::ImportNotFound(id.to_string()))
    }

    pub fn plan(state: Option<&Machine>, declaration: &MachineDeclaration) -> Plan {
        let Some(state) = state else {
            return Plan::Create;
        };
        let changed = declaration.drift(state);
        if changed.is_empty() {
            Plan::NoOp
        } else {
            Plan::Update { changed }
        }
    }

    /// Refresh, plan and act, in that order. A `None` declaration destroys
    /// whatever is tracked.
    pub async fn reconcile(
        &self,
        state: Option<Machine>,
        declaration: Option<&MachineDeclaration>,
    ) -> Result<Reconciled, ReconcileError> {
        let had_state = state.is_some();
        let current = match state {
            Some(state) => self.read(&state).await?,
            None => None,
        };
        let drifted = had_state && current.is_none();

        let Some(declaration) = declaration else {
            let action = match &current {
                Some(machine) => {
                    self.delete(machine).await?;
                    Action::Deleted
                }
                None => Action::Unchanged,
            };
            return Ok(Reconciled {
                state: None,
                action,
                drifted,
            });
        };

        let (state, action) = match (Self::plan(current.as_ref(), declaration), current) {
            (Plan::Update { changed }, Some(machine)) => {
                let updated = self.update(&machine, declaration).await?;
                (updated, Action::Updated { changed })
            }
            (Plan::NoOp, Some(machine)) => (machine, Action::Unchanged),
            _ => (self.create(declaration).await?, Action::Created),
        };
        Ok(Reconciled {
            state: Some(state),
            action,
            drifted,
        })
    }
}
