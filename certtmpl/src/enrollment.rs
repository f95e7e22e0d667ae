//! Enrollment services and their association with certificate templates

pub mod association;
pub mod enrollment_service;

pub use crate::enrollment::{association::*, enrollment_service::*};
