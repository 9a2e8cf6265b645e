//! Entity structs for all LIMS domain objects.
//!
//! Each entity maps to a table created by the `lims-db` migrations. All structs
//! derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON output and
//! schema validation.

mod account;
mod audit;
mod crm;
mod equipment;
mod inventory;
mod pricing;
mod project;
mod transfer;
mod workflow;

pub use account::{Group, User};
pub use audit::AuditEntry;
pub use crm::{CrmAccount, CrmAccountRecord, CrmProject, CrmQuote};
pub use equipment::{DataFile, Equipment, EquipmentReservation};
pub use inventory::{AmountMeasure, InventorySet, Item, ItemType, Location, LocationNode};
pub use pricing::Price;
pub use project::{Product, ProductAttachment, ProductStatus, Project, ProjectLink};
pub use transfer::ItemTransfer;
pub use workflow::{DataEntry, Run, TaskInputField, TaskTemplate, Workflow};
