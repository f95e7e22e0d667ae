//! Minimum supported client and CA server versions of a certificate template
//!
//! Templates created by recent management consoles store the compatibility settings in two four-bit
//! fields of the private key flags. Older templates leave both fields zero, in which case the
//! minimum is implied by the template schema version.

use crate::util::codecs::extract_masked_field;
use crate::{CLIENT_VERSION_MASK, SERVER_VERSION_MASK};

/// Returned when a compatibility field holds a value with no known meaning
pub const UNKNOWN_OS: &str = "Unknown";

fn legacy_client(schema_version: u32) -> &'static str {
    match schema_version {
        1 => "Windows 2000",
        2 => "Windows XP / Windows Server 2003",
        3 => "Windows Vista / Windows Server 2008",
        4 => "Windows 8 / Windows Server 2012",
        _ => UNKNOWN_OS,
    }
}

fn legacy_server(schema_version: u32) -> &'static str {
    match schema_version {
        1 => "Windows 2000 Server",
        2 => "Windows Server 2003",
        3 => "Windows Server 2008",
        4 => "Windows Server 2012",
        _ => UNKNOWN_OS,
    }
}

/// `minimum_supported_client` describes the oldest client operating system able to enroll for a
/// template with the given private key flags and schema version.
pub fn minimum_supported_client(private_key_flags: u32, schema_version: u32) -> &'static str {
    match extract_masked_field(private_key_flags, CLIENT_VERSION_MASK) {
        0 => legacy_client(schema_version),
        0x0100_0000 => "Windows XP / Windows Server 2003",
        0x0200_0000 => "Windows Vista / Windows Server 2008",
        0x0300_0000 => "Windows 7 / Windows Server 2008 R2",
        0x0400_0000 => "Windows 8 / Windows Server 2012",
        0x0500_0000 => "Windows 8.1 / Windows Server 2012 R2",
        0x0600_0000 => "Windows 10 / Windows Server 2016",
        _ => UNKNOWN_OS,
    }
}

/// `minimum_supported_server` describes the oldest CA server operating system able to issue
/// certificates based on a template with the given private key flags and schema version.
pub fn minimum_supported_server(private_key_flags: u32, schema_version: u32) -> &'static str {
    match extract_masked_field(private_key_flags, SERVER_VERSION_MASK) {
        0 => legacy_server(schema_version),
        0x0001_0000 => "Windows Server 2003",
        0x0002_0000 => "Windows Server 2008",
        0x0003_0000 => "Windows Server 2008 R2",
        0x0004_0000 => "Windows Server 2012",
        0x0005_0000 => "Windows Server 2012 R2",
        0x0006_0000 => "Windows Server 2016",
        _ => UNKNOWN_OS,
    }
}

#[test]
fn client_test() {
    assert_eq!(
        "Windows 7 / Windows Server 2008 R2",
        minimum_supported_client(0x0300_0000, 2)
    );
    assert_eq!(
        "Windows XP / Windows Server 2003",
        minimum_supported_client(0, 2)
    );
    assert_eq!("Windows 2000", minimum_supported_client(0x0000_0010, 1));
    assert_eq!(
        "Windows 10 / Windows Server 2016",
        minimum_supported_client(0x0605_0010, 4)
    );
    assert_eq!(UNKNOWN_OS, minimum_supported_client(0x0700_0000, 2));
    assert_eq!(UNKNOWN_OS, minimum_supported_client(0, 5));
}

#[test]
fn server_test() {
    assert_eq!("Windows Server 2012 R2", minimum_supported_server(0x0305_0000, 2));
    assert_eq!("Windows Server 2003", minimum_supported_server(0x0300_0000, 2));
    assert_eq!("Windows Server 2012", minimum_supported_server(0, 4));
    assert_eq!(UNKNOWN_OS, minimum_supported_server(0x000F_0000, 4));
    assert_eq!(UNKNOWN_OS, minimum_supported_server(0, 0));
}
