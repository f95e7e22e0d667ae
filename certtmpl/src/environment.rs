//! Settings and the switchboard used to read the Public Key Services container of a forest

pub mod policy_environment;
pub mod policy_settings;

pub use crate::{environment::policy_environment::*, environment::policy_settings::*};
