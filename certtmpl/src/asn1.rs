//! ASN.1 types for the certificate extensions ADCS adds to issued certificates

pub mod certificate_template_extensions;

pub use crate::asn1::certificate_template_extensions::*;
