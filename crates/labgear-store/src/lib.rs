pub mod config;
pub mod machine;
pub mod repository;
pub mod security;
pub mod sqlite_repository;
pub mod static_config;

pub use config::{ConfigError, SystemConfig, SystemConfigLoader};
pub use machine::{now_utc, InvalidKind, Machine, MachineKind, MachineSpec, ValidationError};
pub use repository::{InMemoryMachineRepository, MachineRepository, RepositoryError};
pub use security::{ApiToken, BEARER_PREFIX};
pub use sqlite_repository::SqliteMachineRepository;
