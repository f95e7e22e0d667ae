//! Effective access rights of identities on certificate templates

pub mod access_rules;

pub use crate::access::access_rules::*;
