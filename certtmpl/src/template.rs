//! Certificate template policy decoding

pub mod certificate_template;
pub mod extended_key_usage;
pub mod flags;
pub mod os_support;
pub mod template_extension;

pub use crate::template::{
    certificate_template::*, extended_key_usage::*, flags::*, os_support::*,
    template_extension::*,
};
