//! Domain-specific data types for the knowledge engine.

pub mod config;
pub mod domain;
pub mod field;
pub mod observation;
pub mod report;
