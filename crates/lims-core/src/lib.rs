//! # lims-core
//!
//! Core types, ID prefixes, and error types for the LIMS.
//!
//! This crate provides the foundational types shared across all LIMS crates:
//! - Entity structs for inventory, transfers, workflows, projects, CRM mirrors,
//!   equipment, pricing, and accounts
//! - Status enums with state machine transitions (data entries, runs, deadlines)
//! - ID prefix constants
//! - Cross-cutting error types
//! - Audit detail sub-types
//! - CLI response types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod responses;
