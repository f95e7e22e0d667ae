#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod access;
pub mod asn1;
pub mod enrollment;
pub mod environment;
pub mod registry;
pub mod source;
pub mod template;
pub mod util;

extern crate alloc;

// order of pub use statements below is intended to assure the list emitted by cargo doc on the main
// index.html page is in alphabetical order.
pub use crate::{access::*, asn1::*, enrollment::*, environment::*, registry::*};

pub use crate::{source::*, template::*, util::*};
