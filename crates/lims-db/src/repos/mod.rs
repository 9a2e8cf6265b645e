//! Domain repositories, each an `impl LimsService` block.
//!
//! Modules are split by bounded context. Every mutation appends an audit
//! entry; multi-row mutations run inside one transaction.

pub mod account;
pub mod audit;
pub mod crm;
pub mod deadlines;
pub mod equipment;
pub mod inventory;
pub mod location;
pub mod pricing;
pub mod project;
pub mod run;
pub mod transfer;
pub mod workflow;
