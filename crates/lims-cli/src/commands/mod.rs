pub mod audit;
pub mod crm;
pub mod dispatch;
pub mod equipment;
pub mod init;
pub mod inventory;
pub mod jobs;
pub mod pricing;
pub mod project;
pub mod run;
pub mod setup;
pub mod shared;
pub mod transfer;
pub mod workflow;
