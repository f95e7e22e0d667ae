//! Forest OID registry

pub mod oid_registry;

pub use crate::registry::oid_registry::*;
