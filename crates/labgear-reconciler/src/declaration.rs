use labgear_store::{Machine, MachineKind, MachineSpec};
use serde::{Deserialize, Serialize};

/// Desired state of one machine. There is no `id` or `created_at` here:
/// both are assigned by the server and only ever read back from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineDeclaration {
    pub name: String,
    pub kind: MachineKind,
    pub make: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_gb: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_tb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MachineDeclaration {
    pub fn new(
        name: impl Into<String>,
        kind: MachineKind,
        make: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            make: make.into(),
            model: model.into(),
            cpu: None,
            ram_gb: None,
            storage_tb: None,
            location: None,
            serial: None,
            notes: None,
        }
    }

    /// Request body carrying only what was declared.
    pub fn to_spec(&self) -> MachineSpec {
        MachineSpec {
            name: self.name.clone(),
            kind: self.kind.as_str().to_string(),
            make: self.make.clone(),
            model: self.model.clone(),
            cpu: self.cpu.clone(),
            ram_gb: self.ram_gb,
            storage_tb: self.storage_tb,
            location: self.location.clone(),
            serial: self.serial.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Full replacement body for an update. Optionals the declaration leaves
    /// unset keep the values the server already holds.
    pub fn merged_spec(&self, state: &Machine) -> MachineSpec {
        let current = state.to_spec();
        MachineSpec {
            cpu: self.cpu.clone().or(current.cpu),
            ram_gb: self.ram_gb.or(current.ram_gb),
            storage_tb: self.storage_tb.or(current.storage_tb),
            location: self.location.clone().or(current.location),
            serial: self.serial.clone().or(current.serial),
            notes: self.notes.clone().or(current.notes),
            ..self.to_spec()
        }
    }

    /// Names of declared attributes whose value differs from `state`.
    /// Unset optionals never count.
    pub fn drift(&self, state: &Machine) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.name != state.name {
            changed.push("name");
        }
        if self.kind != state.kind {
            changed.push("kind");
        }
        if self.make != state.make {
            changed.push("make");
        }
        if self.model != state.model {
            changed.push("model");
        }
        if differs(&self.cpu, &state.cpu) {
            changed.push("cpu");
        }
        if differs(&self.ram_gb, &state.ram_gb) {
            changed.push("ram_gb");
        }
        if differs(&self.storage_tb, &state.storage_tb) {
            changed.push("storage_tb");
        }
        if differs(&self.location, &state.location) {
            changed.push("location");
        }
        if differs(&self.serial, &state.serial) {
            changed.push("serial");
        }
        if differs(&self.notes, &state.notes) {
            changed.push("notes");
        }
        changed
    }
}

fn differs<T: PartialEq>(declared: &Option<T>, actual: &T) -> bool {
    declared.as_ref().is_some_and(|value| value != actual)
}
