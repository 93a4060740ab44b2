//! Core trait abstractions for the domain knowledge library.
//!
//! Applications implement these to plug in their own persistence.

pub mod store;
