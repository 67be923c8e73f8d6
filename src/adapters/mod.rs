//! Infrastructure adapters. Implement outbound ports.
//!
//! Storage, host selection, identity. Map errors to DomainError.

pub mod host_selection;
pub mod identity;
pub mod persistence;
