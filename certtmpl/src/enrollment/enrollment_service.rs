//! Decodes `pKIEnrollmentService` objects, which describe the certification authorities of a forest
//! and the certificate templates each one publishes

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use const_oid::db::rfc4519::COMMON_NAME;
use der::asn1::{Ia5String, PrintableString, Utf8StringRef};
use der::{Decode, Tagged};
#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};
use x509_cert::name::Name;
use x509_cert::Certificate;

use crate::{
    decode_directory_identity, CertificateTemplatePolicy, DirectoryIdentity, DirectoryObject,
    EnrollmentServiceFlag, EnrollmentServiceFlags, Error, Result, ATTR_CA_CERTIFICATE,
    ATTR_CA_CERTIFICATE_DN, ATTR_CERTIFICATE_TEMPLATES, ATTR_DNS_HOST_NAME, ATTR_FLAGS,
};

/// Decoded enrollment service
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct EnrollmentServiceRecord {
    /// Stable identifier: the object GUID, or the distinguished name when no GUID was read
    pub id: String,
    /// Naming attributes. The name is the common name of the CA.
    pub identity: DirectoryIdentity,
    /// DNS name of the host where the CA is installed
    pub dns_host_name: String,
    /// DER-encoded CA certificate, empty when not published
    pub ca_certificate: Vec<u8>,
    /// Subject DN of the CA certificate
    pub ca_certificate_dn: String,
    /// Flags
    pub flags: EnrollmentServiceFlags,
    /// True for an enterprise CA, false for a standalone CA
    pub is_enterprise: bool,
    /// Names of the certificate templates the CA publishes
    pub published_templates: Vec<String>,
}

impl EnrollmentServiceRecord {
    /// Returns the common name of the CA
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// `ca_config_name` returns the `host\name` string used to address the CA.
    pub fn ca_config_name(&self) -> String {
        let mut retval = self.dns_host_name.clone();
        retval.push('\\');
        retval.push_str(self.name());
        retval
    }

    /// `publishes` returns true if the CA publishes the named template. Names are compared
    /// exactly.
    pub fn publishes(&self, template_name: &str) -> bool {
        self.published_templates.iter().any(|t| t == template_name)
    }

    /// `get_published_certificate_templates` returns the templates from `templates` that the CA
    /// publishes.
    pub fn get_published_certificate_templates<'a>(
        &self,
        templates: &'a [CertificateTemplatePolicy],
    ) -> Vec<&'a CertificateTemplatePolicy> {
        templates.iter().filter(|t| self.publishes(t.name())).collect()
    }

    /// `get_ca_certificate` parses the CA certificate, if one is published.
    pub fn get_ca_certificate(&self) -> Result<Certificate> {
        if self.ca_certificate.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(Certificate::from_der(&self.ca_certificate)?)
    }

    /// `has_ca_subject` returns true if `subject_dn` names the CA certificate of this service.
    pub fn has_ca_subject(&self, subject_dn: &str) -> bool {
        !self.ca_certificate_dn.is_empty()
            && distinguished_names_match(&self.ca_certificate_dn, subject_dn)
    }
}

/// `distinguished_names_match` compares two string DNs, ignoring case and whitespace around the RDN
/// separators. The directory renders `cACertificateDN` with `", "` separators where RFC 4514 strings
/// have none.
pub fn distinguished_names_match(lhs: &str, rhs: &str) -> bool {
    let mut l = lhs.split(',').map(str::trim);
    let mut r = rhs.split(',').map(str::trim);
    loop {
        match (l.next(), r.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {}
            _ => return false,
        }
    }
}

/// `get_common_name` returns the first common name value of the most specific RDN that has one.
pub fn get_common_name(name: &Name) -> Option<String> {
    for rdn in name.0.iter().rev() {
        for atav in rdn.0.iter() {
            if atav.oid != COMMON_NAME {
                continue;
            }
            let val = match atav.value.tag() {
                der::Tag::PrintableString => atav
                    .value
                    .decode_as()
                    .ok()
                    .map(|s: PrintableString| s.to_string()),
                der::Tag::Utf8String => atav
                    .value
                    .decode_as()
                    .ok()
                    .map(|s: Utf8StringRef<'_>| s.to_string()),
                der::Tag::Ia5String => atav
                    .value
                    .decode_as()
                    .ok()
                    .map(|s: Ia5String| s.to_string()),
                _ => None,
            };
            if val.is_some() {
                return val;
            }
        }
    }
    None
}

fn decode_service_attributes(obj: &dyn DirectoryObject) -> Result<EnrollmentServiceRecord> {
    let identity = decode_directory_identity(obj)?;
    let dns_host_name = obj.require_string(ATTR_DNS_HOST_NAME)?;
    let ca_certificate = obj
        .get_bytes(ATTR_CA_CERTIFICATE)?
        .map(|b| b.to_vec())
        .unwrap_or_default();

    let ca_certificate_dn = match obj.get_string(ATTR_CA_CERTIFICATE_DN)? {
        Some(dn) if !dn.is_empty() => dn,
        _ => match Certificate::from_der(&ca_certificate) {
            Ok(cert) => cert.tbs_certificate.subject.to_string(),
            Err(_e) => return Err(Error::MissingAttribute(ATTR_CA_CERTIFICATE_DN.to_string())),
        },
    };

    let flags = EnrollmentServiceFlags::new_truncated(obj.get_flags(ATTR_FLAGS)?);
    let id = match &identity.object_guid {
        Some(guid) => guid.clone(),
        None if !identity.distinguished_name.is_empty() => identity.distinguished_name.clone(),
        None => identity.name.clone(),
    };
    Ok(EnrollmentServiceRecord {
        id,
        identity,
        dns_host_name,
        ca_certificate,
        ca_certificate_dn,
        flags,
        is_enterprise: flags.contains(EnrollmentServiceFlag::IsEnterprise),
        published_templates: obj.get_string_list(ATTR_CERTIFICATE_TEMPLATES)?,
    })
}

/// `decode_enrollment_service` produces an [`EnrollmentServiceRecord`] from the attributes of an
/// object of class `pKIEnrollmentService`.
///
/// `name` and `dNSHostName` are required. `cACertificateDN` is required unless it can be read from
/// the published CA certificate.
pub fn decode_enrollment_service(obj: &dyn DirectoryObject) -> Result<EnrollmentServiceRecord> {
    decode_service_attributes(obj).map_err(|e| Error::malformed_enrollment_service(&obj.label(), e))
}

#[cfg(test)]
pub(crate) fn test_enrollment_service(
    name: &str,
    published: &[&str],
) -> crate::DirectoryEntrySnapshot {
    use crate::{AttributeValue, DirectoryEntrySnapshot, ATTR_DISTINGUISHED_NAME, ATTR_NAME};
    use alloc::format;

    DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String(name.to_string()))
        .with_attribute(
            ATTR_DISTINGUISHED_NAME,
            AttributeValue::String(format!(
                "CN={name},CN=Enrollment Services,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com"
            )),
        )
        .with_attribute(
            ATTR_DNS_HOST_NAME,
            AttributeValue::String(format!("{}.contoso.com", name.to_lowercase())),
        )
        .with_attribute(
            ATTR_CA_CERTIFICATE_DN,
            AttributeValue::String(format!("CN={name},DC=contoso,DC=com")),
        )
        .with_attribute(ATTR_FLAGS, AttributeValue::Integer(0x0A))
        .with_attribute(
            ATTR_CERTIFICATE_TEMPLATES,
            AttributeValue::Strings(published.iter().map(|s| s.to_string()).collect()),
        )
}

#[test]
fn decode_service_test() {
    let e = test_enrollment_service("IssuingCA", &["User", "WebServer"]);
    let s = decode_enrollment_service(&e).unwrap();
    assert_eq!("IssuingCA", s.name());
    assert_eq!("issuingca.contoso.com\\IssuingCA", s.ca_config_name());
    assert_eq!("CN=IssuingCA,DC=contoso,DC=com", s.ca_certificate_dn);
    assert!(s.is_enterprise);
    assert!(s.flags.contains(EnrollmentServiceFlag::Unknown));
    assert!(s.id.starts_with("CN=IssuingCA,CN=Enrollment Services"));
    assert!(s.publishes("WebServer"));
    assert!(!s.publishes("webserver"));
    assert_eq!(Err(Error::NotFound), s.get_ca_certificate().map(|_| ()));

    let mut user = CertificateTemplatePolicy::default();
    user.identity.name = "User".to_string();
    let mut machine = CertificateTemplatePolicy::default();
    machine.identity.name = "Machine".to_string();
    let templates = [user, machine];
    let published = s.get_published_certificate_templates(&templates);
    assert_eq!(1, published.len());
    assert_eq!("User", published[0].name());
}

#[test]
fn decode_service_errors_test() {
    use crate::AttributeValue;

    let mut e = test_enrollment_service("IssuingCA", &[]);
    e.attributes.remove(ATTR_DNS_HOST_NAME);
    match decode_enrollment_service(&e) {
        Err(Error::MalformedEnrollmentService { attribute, .. }) => {
            assert_eq!(ATTR_DNS_HOST_NAME, attribute)
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // no DN attribute and an unparseable certificate
    let mut e = test_enrollment_service("IssuingCA", &[]);
    e.attributes.remove(ATTR_CA_CERTIFICATE_DN);
    e.set_attribute(ATTR_CA_CERTIFICATE, AttributeValue::Bytes(alloc::vec![0x30, 0x00]));
    match decode_enrollment_service(&e) {
        Err(Error::MalformedEnrollmentService { attribute, .. }) => {
            assert_eq!(ATTR_CA_CERTIFICATE_DN, attribute)
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // standalone CA
    let mut e = test_enrollment_service("Standalone", &[]);
    e.set_attribute(ATTR_FLAGS, AttributeValue::Integer(0x02));
    assert!(!decode_enrollment_service(&e).unwrap().is_enterprise);
}

#[test]
fn ca_subject_test() {
    use core::str::FromStr;

    assert!(distinguished_names_match(
        "CN=Contoso Issuing CA, DC=contoso, DC=com",
        "CN=Contoso Issuing CA,DC=Contoso,DC=com"
    ));
    assert!(!distinguished_names_match(
        "CN=Contoso Issuing CA,DC=contoso,DC=com",
        "CN=Contoso Issuing CA,DC=contoso"
    ));
    assert!(!distinguished_names_match("CN=A,DC=contoso", "CN=B,DC=contoso"));

    let name = Name::from_str("CN=Contoso Issuing CA,OU=PKI,DC=contoso,DC=com").unwrap();
    assert_eq!(Some("Contoso Issuing CA".to_string()), get_common_name(&name));
    let name = Name::from_str("OU=PKI,DC=contoso,DC=com").unwrap();
    assert_eq!(None, get_common_name(&name));

    let mut record = EnrollmentServiceRecord::default();
    assert!(!record.has_ca_subject(""));
    record.ca_certificate_dn = "CN=Contoso Issuing CA, DC=contoso, DC=com".to_string();
    assert!(record.has_ca_subject("CN=Contoso Issuing CA,DC=contoso,DC=com"));
}
