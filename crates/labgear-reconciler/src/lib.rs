pub mod api;
pub mod declaration;
pub mod error;
pub mod inventory;
pub mod provider;
pub mod resource;

pub use api::MachineApi;
pub use declaration::MachineDeclaration;
pub use error::ReconcileError;
pub use inventory::MachineInventory;
pub use provider::{ProviderConfig, ENDPOINT_ENV, TOKEN_ENV};
pub use resource::{Action, MachineResource, Plan, Reconciled};
