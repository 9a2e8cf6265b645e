mod crm;
mod equipment;
mod inventory;
mod jobs;
mod pricing;
mod project;
mod transfer;
mod workflow;

pub use crm::CrmCommands;
pub use equipment::{DataFileCommands, EquipmentCommands};
pub use inventory::{ItemCommands, ItemTypeCommands, LocationCommands, SetCommands};
pub use jobs::{DeadlineCommands, SchedulerCommands};
pub use pricing::PriceCommands;
pub use project::{ProductCommands, ProjectCommands};
pub use transfer::TransferCommands;
pub use workflow::{RunCommands, TemplateCommands, WorkflowCommands};
