//! Shared types and models for the Fireworks Order Management Platform
//!
//! This crate contains domain types shared between the backend service,
//! its integration tests, and any future tooling built on top of the
//! order ledger.

pub mod ids;
pub mod models;
pub mod validation;

pub use ids::*;
pub use models::*;
pub use validation::*;
