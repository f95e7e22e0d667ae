//! Identifies the certificate template a certificate was issued from

use alloc::string::{String, ToString};

use const_oid::ObjectIdentifier;
use der::Decode;
use x509_cert::ext::Extension;
use x509_cert::Certificate;

use crate::{
    decode_certificate_template_name, CertificateTemplateInfo, CertificateTemplatePolicy, Error,
    Result, MS_CERTIFICATE_TEMPLATE_INFORMATION, MS_CERTIFICATE_TEMPLATE_NAME,
};

/// Template reference carried by an issued certificate
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TemplateReference {
    /// From the certificate template information extension
    Oid(CertificateTemplateInfo),
    /// From the certificate template name extension
    Name(String),
}

/// `get_template_reference` reads the template reference from a list of extensions. The template
/// information extension is preferred when both are present.
pub fn get_template_reference(extensions: Option<&[Extension]>) -> Result<TemplateReference> {
    let extensions = extensions.unwrap_or_default();
    let find = |oid: &ObjectIdentifier| extensions.iter().find(|e| &e.extn_id == oid);

    if let Some(ext) = find(&MS_CERTIFICATE_TEMPLATE_INFORMATION) {
        let info = CertificateTemplateInfo::from_der(ext.extn_value.as_bytes())?;
        return Ok(TemplateReference::Oid(info));
    }
    if let Some(ext) = find(&MS_CERTIFICATE_TEMPLATE_NAME) {
        let name = decode_certificate_template_name(ext.extn_value.as_bytes())?;
        return Ok(TemplateReference::Name(name));
    }
    Err(Error::TemplateExtensionNotFound)
}

/// `find_template` returns the template matching a reference. OID references only match templates
/// with a schema version above 1, since version 1 templates are identified by name.
pub fn find_template<'a>(
    reference: &TemplateReference,
    templates: &'a [CertificateTemplatePolicy],
) -> Result<&'a CertificateTemplatePolicy> {
    let found = match reference {
        TemplateReference::Oid(info) => {
            let oid = info.template_id.to_string();
            templates
                .iter()
                .find(|t| t.schema_version > 1 && t.oid == oid)
        }
        TemplateReference::Name(name) => templates.iter().find(|t| t.name() == name),
    };
    found.ok_or(Error::NotFound)
}

/// `find_template_for_certificate` returns the decoded template that `cert` was issued from.
///
/// Returns [`Error::TemplateExtensionNotFound`] when the certificate carries no template extension
/// and [`Error::NotFound`] when no template in `templates` matches.
pub fn find_template_for_certificate<'a>(
    cert: &Certificate,
    templates: &'a [CertificateTemplatePolicy],
) -> Result<&'a CertificateTemplatePolicy> {
    let reference = get_template_reference(cert.tbs_certificate.extensions.as_deref())?;
    find_template(&reference, templates)
}

#[cfg(test)]
fn test_templates() -> alloc::vec::Vec<CertificateTemplatePolicy> {
    let mut user = CertificateTemplatePolicy::default();
    user.identity.name = "User".to_string();
    user.oid = "1.3.6.1.4.1.311.21.8.1.1".to_string();
    user.schema_version = 1;

    let mut web = CertificateTemplatePolicy::default();
    web.identity.name = "WebServer2".to_string();
    web.oid = "1.3.6.1.4.1.311.21.8.1.2".to_string();
    web.schema_version = 2;
    alloc::vec![user, web]
}

#[test]
fn template_reference_test() {
    use der::asn1::OctetString;
    use der::Encode;
    use hex_literal::hex;

    assert_eq!(
        Err(Error::TemplateExtensionNotFound),
        get_template_reference(None)
    );

    let name_ext = Extension {
        extn_id: MS_CERTIFICATE_TEMPLATE_NAME,
        critical: false,
        extn_value: OctetString::new(hex!("1e080055007300650072").to_vec()).unwrap(),
    };
    let reference = get_template_reference(Some(&[name_ext.clone()][..])).unwrap();
    assert_eq!(TemplateReference::Name("User".into()), reference);

    let info = CertificateTemplateInfo {
        template_id: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.21.8.1.2"),
        major_version: 100,
        minor_version: Some(3),
    };
    let info_ext = Extension {
        extn_id: MS_CERTIFICATE_TEMPLATE_INFORMATION,
        critical: false,
        extn_value: OctetString::new(info.to_der().unwrap()).unwrap(),
    };
    let reference = get_template_reference(Some(&[name_ext, info_ext][..])).unwrap();
    assert_eq!(TemplateReference::Oid(info), reference);
}

#[test]
fn find_template_test() {
    let templates = test_templates();
    let by_name = TemplateReference::Name("User".to_string());
    assert_eq!("User", find_template(&by_name, &templates).unwrap().name());

    let by_oid = TemplateReference::Oid(CertificateTemplateInfo {
        template_id: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.21.8.1.2"),
        major_version: 100,
        minor_version: None,
    });
    assert_eq!("WebServer2", find_template(&by_oid, &templates).unwrap().name());

    // version 1 templates are not matched by OID
    let v1_oid = TemplateReference::Oid(CertificateTemplateInfo {
        template_id: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.21.8.1.1"),
        major_version: 4,
        minor_version: None,
    });
    assert_eq!(Err(Error::NotFound), find_template(&v1_oid, &templates));

    let missing = TemplateReference::Name("Machine".to_string());
    assert_eq!(Err(Error::NotFound), find_template(&missing, &templates));
}
