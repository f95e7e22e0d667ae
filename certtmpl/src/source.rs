//! Traits and in-memory implementations that supply raw directory attributes to the decoders

pub mod attribute_source;
pub mod snapshot_source;

pub use crate::{source::attribute_source::*, source::snapshot_source::*};
