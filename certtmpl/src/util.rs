//! Primitive codecs, OID definitions, error and logging support

pub mod codecs;
pub mod error;
#[cfg(feature = "std")]
pub mod file_utils;
pub mod logging;
pub mod oids;

#[cfg(feature = "std")]
pub use crate::util::file_utils::*;
pub use crate::{util::codecs::*, util::error::*, util::logging::*, util::oids::*};
