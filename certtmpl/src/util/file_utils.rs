//! File-based utilities used to load saved settings, directory snapshots and certificates

use alloc::vec::Vec;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use der::{Decode, DecodePem};
use log::error;
use x509_cert::Certificate;

use crate::{Error, Result};

/// `get_file_as_byte_vec` takes a Path containing a file name and returns a vector of bytes containing
/// the contents of that file or an [Error::StdIoError].
pub fn get_file_as_byte_vec(filename: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(filename).map_err(|e| Error::StdIoError(e.kind()))?;
    let mut buffer = Vec::new();
    f.read_to_end(&mut buffer)
        .map_err(|e| Error::StdIoError(e.kind()))?;
    Ok(buffer)
}

/// `read_certificate_file` reads a PEM or DER encoded certificate from the named file, i.e., a
/// certificate issued from a template that is to be matched using
/// [`find_template_for_certificate`](crate::find_template_for_certificate).
pub fn read_certificate_file(filename: &Path) -> Result<Certificate> {
    let b = get_file_as_byte_vec(filename)?;
    let r = if b.first() == Some(&0x2D) {
        Certificate::from_pem(b.as_slice())
    } else {
        Certificate::from_der(b.as_slice())
    };
    r.map_err(|e| {
        error!("Failed to parse certificate from {:?}: {:?}", filename, e);
        Error::Asn1Error(e)
    })
}

#[test]
fn missing_file() {
    let r = get_file_as_byte_vec(Path::new("tests/examples/nonexistent.json"));
    assert_eq!(Err(Error::StdIoError(std::io::ErrorKind::NotFound)), r);
}
