use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineKind {
    Proxmox,
    Nas,
    Sbc,
    BareMetal,
    Workstation,
    Laptop,
}

impl MachineKind {
    pub const ALL: [MachineKind; 6] = [
        MachineKind::Proxmox,
        MachineKind::Nas,
        MachineKind::Sbc,
        MachineKind::BareMetal,
        MachineKind::Workstation,
        MachineKind::Laptop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineKind::Proxmox => "proxmox",
            MachineKind::Nas => "nas",
            MachineKind::Sbc => "sbc",
            MachineKind::BareMetal => "bare_metal",
            MachineKind::Workstation => "workstation",
            MachineKind::Laptop => "laptop",
        }
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invalid kind: {0}")]
pub struct InvalidKind(pub String);

/// The single parse path for kind values. Create, update, list filters and
/// store decoding all go through here, and matching is exact.
impl FromStr for MachineKind {
    type Err = InvalidKind;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        MachineKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == input)
            .ok_or_else(|| InvalidKind(input.to_string()))
    }
}

/// A stored inventory record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub kind: MachineKind,
    pub make: String,
    pub model: String,
    pub cpu: String,
    pub ram_gb: i64,
    pub storage_tb: f64,
    pub location: String,
    pub serial: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for create and update. Required fields that are missing or
/// `null` decode as empty strings so they surface as a validation error
/// rather than a decode error. Identity and timestamps are not part of the body; any such keys
/// sent by a caller are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub make: String,
    #[serde(default, deserialize_with = "null_as_empty")]
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

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("name, kind, make, and model are required")]
    MissingRequired,
    #[error("invalid kind")]
    InvalidKind(String),
    #[error("ram_gb must not be negative")]
    NegativeRam(i64),
    #[error("storage_tb must be a non-negative number")]
    InvalidStorage(f64),
}

impl From<InvalidKind> for ValidationError {
    fn from(err: InvalidKind) -> Self {
        ValidationError::InvalidKind(err.0)
    }
}

impl MachineSpec {
    pub fn validate(&self) -> Result<MachineKind, ValidationError> {
        let required = [&self.name, &self.kind, &self.make, &self.model];
        if required.iter().any(|value| value.is_empty()) {
            return Err(ValidationError::MissingRequired);
        }
        let kind = self.kind.parse::<MachineKind>()?;
        if let Some(ram_gb) = self.ram_gb {
            if ram_gb < 0 {
                return Err(ValidationError::NegativeRam(ram_gb));
            }
        }
        if let Some(storage_tb) = self.storage_tb {
            if !storage_tb.is_finite() || storage_tb < 0.0 {
                return Err(ValidationError::InvalidStorage(storage_tb));
            }
        }
        Ok(kind)
    }

    /// Builds a fresh record with both timestamps set to `now`.
    pub fn into_machine(self, id: String, now: DateTime<Utc>) -> Result<Machine, ValidationError> {
        let kind = self.validate()?;
        Ok(Machine {
            id,
            name: self.name,
            kind,
            make: self.make,
            model: self.model,
            cpu: self.cpu.unwrap_or_default(),
            ram_gb: self.ram_gb.unwrap_or_default(),
            storage_tb: self.storage_tb.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            serial: self.serial.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }
}

impl Machine {
    /// Full replacement of the mutable fields. `id` and `created_at` always
    /// come from `self`.
    pub fn replace_with(&self, spec: MachineSpec, now: DateTime<Utc>) -> Result<Machine, ValidationError> {
        let mut next = spec.into_machine(self.id.clone(), now)?;
        next.created_at = self.created_at;
        Ok(next)
    }

    pub fn to_spec(&self) -> MachineSpec {
        MachineSpec {
            name: self.name.clone(),
            kind: self.kind.as_str().to_string(),
            make: self.make.clone(),
            model: self.model.clone(),
            cpu: Some(self.cpu.clone()),
            ram_gb: Some(self.ram_gb),
            storage_tb: Some(self.storage_tb),
            location: Some(self.location.clone()),
            serial: Some(self.serial.clone()),
            notes: Some(self.notes.clone()),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Current time at the precision the store persists (microseconds), so a
/// freshly minted record compares equal to its stored copy.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
