//! The forest OID registry (`msPKI-Enterprise-Oid` objects in the OID container) and the resolution
//! of friendly names for custom OIDs against it

use alloc::string::{String, ToString};
use core::fmt;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::{
    decode_directory_identity, CertificateTemplatePolicy, CustomOid, DirectoryIdentity,
    DirectoryObject, Error, Result, ATTR_CERT_TEMPLATE_OID, ATTR_FLAGS,
};

/// Category of an OID registry object, from its `flags` attribute
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum OidType {
    /// Uncategorized
    #[default]
    None,
    /// Certificate template OID
    CertificateTemplate,
    /// Issuance policy OID
    CertificatePolicy,
    /// Application policy (extended key usage) OID
    EnhancedKeyUsage,
}

impl From<u32> for OidType {
    fn from(flags: u32) -> Self {
        match flags {
            1 => OidType::CertificateTemplate,
            2 => OidType::CertificatePolicy,
            3 => OidType::EnhancedKeyUsage,
            _ => OidType::None,
        }
    }
}

impl fmt::Display for OidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OidType::None => write!(f, "None"),
            OidType::CertificateTemplate => write!(f, "Certificate Template"),
            OidType::CertificatePolicy => write!(f, "Issuance Policy"),
            OidType::EnhancedKeyUsage => write!(f, "Application Policy"),
        }
    }
}

/// Decoded OID registry object
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct OidRecord {
    /// Naming attributes. The display name is the friendly name of the OID.
    pub identity: DirectoryIdentity,
    /// OID value
    pub oid: String,
    /// Category
    pub oid_type: OidType,
}

impl OidRecord {
    /// Returns the friendly name registered for the OID
    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }
}

/// `decode_oid_record` produces an [`OidRecord`] from the attributes of an object of class
/// `msPKI-Enterprise-Oid`.
pub fn decode_oid_record(obj: &dyn DirectoryObject) -> Result<OidRecord> {
    let decode = || -> Result<OidRecord> {
        Ok(OidRecord {
            identity: decode_directory_identity(obj)?,
            oid: obj.require_string(ATTR_CERT_TEMPLATE_OID)?,
            oid_type: OidType::from(obj.get_flags(ATTR_FLAGS)?),
        })
    };
    decode().map_err(|e| Error::malformed_oid(&obj.label(), e))
}

/// `resolve_friendly_name` returns the first record whose OID equals `oid` exactly.
pub fn resolve_friendly_name<'a>(oid: &str, registry: &'a [OidRecord]) -> Option<&'a OidRecord> {
    registry.iter().find(|r| r.oid == oid)
}

/// `resolve_custom_oid` sets the friendly name of `custom` from the registry. The name is left
/// unchanged when no record matches.
pub fn resolve_custom_oid(custom: &mut CustomOid, registry: &[OidRecord]) {
    if let Some(record) = resolve_friendly_name(&custom.oid, registry) {
        custom.friendly_name = Some(record.display_name().to_string());
    }
}

/// `resolve_custom_oid_names` resolves the custom extended key usages of each template.
pub fn resolve_custom_oid_names(templates: &mut [CertificateTemplatePolicy], registry: &[OidRecord]) {
    for template in templates.iter_mut() {
        for custom in template.enhanced_key_usage.custom.iter_mut() {
            resolve_custom_oid(custom, registry);
        }
    }
}

#[cfg(test)]
pub(crate) fn test_oid_entry(oid: &str, display_name: &str, flags: i64) -> crate::DirectoryEntrySnapshot {
    use crate::{AttributeValue, DirectoryEntrySnapshot, ATTR_DISPLAY_NAME, ATTR_NAME};
    use alloc::format;

    DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String(format!("{}.{}", flags, oid.len())))
        .with_attribute(ATTR_DISPLAY_NAME, AttributeValue::String(display_name.to_string()))
        .with_attribute(ATTR_CERT_TEMPLATE_OID, AttributeValue::String(oid.to_string()))
        .with_attribute(ATTR_FLAGS, AttributeValue::Integer(flags))
}

#[test]
fn oid_record_test() {
    let r = decode_oid_record(&test_oid_entry("1.3.6.1.4.1.99999.1", "Contoso VPN", 3)).unwrap();
    assert_eq!("1.3.6.1.4.1.99999.1", r.oid);
    assert_eq!("Contoso VPN", r.display_name());
    assert_eq!(OidType::EnhancedKeyUsage, r.oid_type);

    assert_eq!(OidType::None, OidType::from(0));
    assert_eq!(OidType::CertificateTemplate, OidType::from(1));
    assert_eq!(OidType::CertificatePolicy, OidType::from(2));
    assert_eq!(OidType::None, OidType::from(7));

    let mut e = test_oid_entry("1.2.3", "x", 1);
    e.attributes.remove(ATTR_CERT_TEMPLATE_OID);
    match decode_oid_record(&e) {
        Err(Error::MalformedOid { attribute, .. }) => assert_eq!(ATTR_CERT_TEMPLATE_OID, attribute),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn resolve_test() {
    use alloc::vec;

    let registry = vec![
        decode_oid_record(&test_oid_entry("1.3.6.1.4.1.99999.1", "Contoso VPN", 3)).unwrap(),
        decode_oid_record(&test_oid_entry("1.3.6.1.4.1.99999.1", "Duplicate", 3)).unwrap(),
        decode_oid_record(&test_oid_entry("1.3.6.1.4.1.99999.2", "Contoso Policy", 2)).unwrap(),
    ];
    assert_eq!(
        "Contoso VPN",
        resolve_friendly_name("1.3.6.1.4.1.99999.1", &registry)
            .unwrap()
            .display_name()
    );
    assert!(resolve_friendly_name("1.3.6.1.4.1.99999", &registry).is_none());
    assert!(resolve_friendly_name("", &[]).is_none());

    let mut t = CertificateTemplatePolicy::default();
    t.enhanced_key_usage.custom = vec![
        CustomOid::new("1.3.6.1.4.1.99999.1"),
        CustomOid::new("1.3.6.1.4.1.12345.1"),
    ];
    let mut templates = [t];
    resolve_custom_oid_names(&mut templates, &registry);
    let custom = &templates[0].enhanced_key_usage.custom;
    assert_eq!(Some("Contoso VPN".to_string()), custom[0].friendly_name);
    assert_eq!(None, custom[1].friendly_name);
}
