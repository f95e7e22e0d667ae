//! Types for the certificate template extensions that ADCS places in issued certificates

use alloc::string::String;

use const_oid::ObjectIdentifier;
use der::asn1::AnyRef;
use der::{Decode, Sequence, Tag, Tagged};

use crate::{Error, Result};

/// Certificate template information extension, identified by
/// [`MS_CERTIFICATE_TEMPLATE_INFORMATION`](crate::MS_CERTIFICATE_TEMPLATE_INFORMATION) and present
/// in certificates issued from version 2 and later templates.
///
/// ```text
/// CertificateTemplate ::= SEQUENCE {
///     templateID              EncodedObjectID,
///     templateMajorVersion    TemplateVersion,
///     templateMinorVersion    TemplateVersion OPTIONAL
/// }
/// TemplateVersion ::= INTEGER (0..4294967295)
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CertificateTemplateInfo {
    /// OID of the template
    pub template_id: ObjectIdentifier,
    /// Major revision of the template at issuance
    pub major_version: u32,
    /// Minor revision of the template at issuance
    #[asn1(optional = "true")]
    pub minor_version: Option<u32>,
}

/// `decode_certificate_template_name` decodes the value of the certificate template name
/// extension, identified by [`MS_CERTIFICATE_TEMPLATE_NAME`](crate::MS_CERTIFICATE_TEMPLATE_NAME)
/// and present in certificates issued from version 1 templates.
///
/// ```text
/// CertificateTemplateName ::= BMPString
/// ```
pub fn decode_certificate_template_name(enc: &[u8]) -> Result<String> {
    let any = AnyRef::from_der(enc)?;
    if any.tag() != Tag::BmpString || any.value().len() % 2 != 0 {
        return Err(Error::ParseError);
    }
    let units = any
        .value()
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]));
    char::decode_utf16(units)
        .collect::<core::result::Result<String, _>>()
        .map_err(|_e| Error::ParseError)
}

#[test]
fn template_info_test() {
    use der::Encode;

    let info = CertificateTemplateInfo {
        template_id: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.21.8.1.2"),
        major_version: 100,
        minor_version: Some(4),
    };
    let der = info.to_der().unwrap();
    assert_eq!(info, CertificateTemplateInfo::from_der(&der).unwrap());

    let info = CertificateTemplateInfo {
        minor_version: None,
        ..info
    };
    let der = info.to_der().unwrap();
    assert_eq!(None, CertificateTemplateInfo::from_der(&der).unwrap().minor_version);
}

#[test]
fn template_name_test() {
    use hex_literal::hex;

    // BMPString "User"
    let enc = hex!("1e080055007300650072");
    assert_eq!("User", decode_certificate_template_name(&enc).unwrap());

    // UTF8String "User"
    let enc = hex!("0c0455736572");
    assert_eq!(Err(Error::ParseError), decode_certificate_template_name(&enc));
}
