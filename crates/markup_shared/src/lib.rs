//! Shared functionality
//!
//! This crate supplies the pieces shared by the markup parser crates: source locations, node
//! identifiers and the common error types.

pub mod errors;
pub mod location;
pub mod node;
pub mod types;
