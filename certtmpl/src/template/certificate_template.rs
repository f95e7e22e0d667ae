//! Decodes the attributes of one `pKICertificateTemplate` object into a [`CertificateTemplatePolicy`]
//!
//! The decoder is a pure function of the object's attribute values and authorization entries.
//! Attribute problems are reported as [`Error::MalformedTemplate`]. Failure to read the
//! authorization entries is reported as [`Error::AccessRuleRetrieval`]. The enrollment service
//! set is left empty here and populated by [`assign_enrollment_services`](crate::assign_enrollment_services)
//! once every template in the forest has been decoded.

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::time::Duration;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::util::codecs::*;
use crate::{
    classify_extended_key_usages, key_attestation_from_private_key_flags, key_usage_from_bytes,
    minimum_supported_client, minimum_supported_server, resolve_access_rules, AccessRules,
    CertificateTemplateFlag, CertificateTemplateFlags, DirectoryObject, EnhancedKeyUsageFlag,
    EnhancedKeyUsageFlags, EnrollmentFlags, Error, KeyAttestationEnforcement,
    KeyAttestationMethods, KeyUsageFlags, PolicySettings, PrivateKeyFlag, PrivateKeyFlags,
    Result, SubjectNameFlag, SubjectNameFlags, ATTR_CERTIFICATE_APPLICATION_POLICY,
    ATTR_CERTIFICATE_NAME_FLAG, ATTR_CERT_TEMPLATE_OID, ATTR_CRITICAL_EXTENSIONS,
    ATTR_DISPLAY_NAME, ATTR_DISTINGUISHED_NAME, ATTR_ENROLLMENT_FLAG, ATTR_EXPIRATION_PERIOD,
    ATTR_EXTENDED_KEY_USAGE, ATTR_FLAGS, ATTR_KEY_USAGE, ATTR_MINIMAL_KEY_SIZE, ATTR_NAME,
    ATTR_OBJECT_GUID, ATTR_PRIVATE_KEY_FLAG, ATTR_RA_SIGNATURE, ATTR_REVISION,
    ATTR_TEMPLATE_MINOR_REVISION, ATTR_TEMPLATE_SCHEMA_VERSION, ATTR_WHEN_CHANGED,
    ATTR_WHEN_CREATED, ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE,
};

/// Naming and bookkeeping attributes common to the objects in the Public Key Services container
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct DirectoryIdentity {
    /// Common name
    pub name: String,
    /// Display name, empty when not set
    pub display_name: String,
    /// Distinguished name, empty when not reported by the source
    pub distinguished_name: String,
    /// Object GUID in canonical text form
    pub object_guid: Option<String>,
    /// Creation time in seconds since the Unix epoch, zero when unknown
    pub when_created: u64,
    /// Modification time in seconds since the Unix epoch, zero when unknown
    pub when_changed: u64,
}

fn get_timestamp(obj: &dyn DirectoryObject, attribute: &str) -> u64 {
    obj.get_string(attribute)
        .ok()
        .flatten()
        .and_then(|s| parse_generalized_time(&s).ok())
        .unwrap_or_default()
}

/// `decode_directory_identity` reads the [`DirectoryIdentity`] of an object. Only `name` is
/// required.
pub fn decode_directory_identity(obj: &dyn DirectoryObject) -> Result<DirectoryIdentity> {
    let object_guid = match obj.get_bytes(ATTR_OBJECT_GUID)? {
        Some(b) => Some(guid_bytes_to_string(b).map_err(|_e| Error::AttributeShape {
            attribute: ATTR_OBJECT_GUID.to_string(),
            expected: "16 byte GUID",
        })?),
        None => None,
    };
    Ok(DirectoryIdentity {
        name: obj.require_string(ATTR_NAME)?,
        display_name: obj.get_string(ATTR_DISPLAY_NAME)?.unwrap_or_default(),
        distinguished_name: obj.get_string(ATTR_DISTINGUISHED_NAME)?.unwrap_or_default(),
        object_guid,
        when_created: get_timestamp(obj, ATTR_WHEN_CREATED),
        when_changed: get_timestamp(obj, ATTR_WHEN_CHANGED),
    })
}

/// An OID not found in the table of well-known values
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct CustomOid {
    /// OID as read from the directory
    pub oid: String,
    /// Display name from the forest OID registry, when resolved
    pub friendly_name: Option<String>,
}

impl CustomOid {
    /// Creates an unresolved custom OID
    pub fn new(oid: &str) -> Self {
        CustomOid {
            oid: oid.to_string(),
            friendly_name: None,
        }
    }
}

/// Key usage extension of certificates issued from a template
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct KeyUsageExtension {
    /// Asserted key usages
    pub value: KeyUsageFlags,
    /// Whether the extension is marked critical
    pub is_critical: bool,
}

/// Extended key usage extension of certificates issued from a template
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct EnhancedKeyUsageExtension {
    /// Well-known extended key usages
    pub value: EnhancedKeyUsageFlags,
    /// Remaining extended key usages, in directory order
    pub custom: Vec<CustomOid>,
    /// Whether the extension is marked critical
    pub is_critical: bool,
}

/// Decoded policy of a certificate template
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct CertificateTemplatePolicy {
    /// Naming attributes
    pub identity: DirectoryIdentity,
    /// Template OID
    pub oid: String,
    /// Schema version (1 through 4)
    pub schema_version: u32,
    /// Major revision
    pub major_revision: u32,
    /// Minor revision
    pub minor_revision: u32,
    /// Validity period of issued certificates
    pub validity_period: Duration,
    /// Key usage extension
    pub key_usage: KeyUsageExtension,
    /// Extended key usage extension
    pub enhanced_key_usage: EnhancedKeyUsageExtension,
    /// Application policy OIDs, in directory order
    pub application_policies: Vec<String>,
    /// OIDs of extensions marked critical
    pub critical_extensions: Vec<String>,
    /// Minimum public key length in bits
    pub minimum_public_key_length: u32,
    /// Number of authorized signatures required on a request
    pub ra_signatures_required: u32,
    /// General flags
    pub general_flags: CertificateTemplateFlags,
    /// Subject name flags
    pub subject_name_flags: SubjectNameFlags,
    /// Enrollment flags
    pub enrollment_flags: EnrollmentFlags,
    /// Single-bit private key flags
    pub private_key_flags: PrivateKeyFlags,
    /// Key attestation enforcement
    pub key_attestation_enforcement: KeyAttestationEnforcement,
    /// Key attestation methods, empty unless attestation is enforced
    pub key_attestation_methods: KeyAttestationMethods,
    /// Whether the key attestation issuance policy is asserted
    pub asserts_key_attestation_policy: bool,
    /// Oldest client able to enroll
    pub minimum_supported_client: String,
    /// Oldest CA server able to issue
    pub minimum_supported_server: String,
    /// Identifiers of the enrollment services that publish the template
    pub enrollment_services: BTreeSet<String>,
    /// Effective rights of each identity on the template
    pub access_rules: AccessRules,
}

impl CertificateTemplatePolicy {
    /// Returns the template name
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Returns true if the CA archives the private key
    pub fn key_archival_required(&self) -> bool {
        self.private_key_flags.contains(PrivateKeyFlag::RequireKeyArchival)
    }

    /// Returns true if the private key may be exported
    pub fn exportable_private_key(&self) -> bool {
        self.private_key_flags.contains(PrivateKeyFlag::AllowKeyExport)
    }

    /// Returns true if strong private key protection is required
    pub fn requires_strong_key_protection(&self) -> bool {
        self.private_key_flags.contains(PrivateKeyFlag::RequireStrongProtection)
    }

    /// Returns true if the subject name is supplied in the request rather than built from the
    /// directory, which is how offline templates are identified
    pub fn enrollee_supplies_subject(&self) -> bool {
        self.subject_name_flags.contains(SubjectNameFlag::EnrolleeSuppliesSubject)
    }

    /// Returns true if the template is intended for CA certificates
    pub fn is_ca(&self) -> bool {
        self.general_flags.contains(CertificateTemplateFlag::IsCA)
    }

    /// Returns true if issued certificates may be used for any purpose
    pub fn allows_any_purpose(&self) -> bool {
        self.enhanced_key_usage.value.contains(EnhancedKeyUsageFlag::Any)
            || (self.enhanced_key_usage.value.is_empty()
                && self.enhanced_key_usage.custom.is_empty())
    }

    /// Returns true if the enrollment service with the given identifier publishes the template
    pub fn is_published_by(&self, service_id: &str) -> bool {
        self.enrollment_services.contains(service_id)
    }
}

fn to_u32(attribute: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_e| Error::AttributeShape {
        attribute: attribute.to_string(),
        expected: "non-negative integer",
    })
}

fn get_u32(obj: &dyn DirectoryObject, attribute: &str) -> Result<u32> {
    to_u32(attribute, obj.get_int(attribute)?.unwrap_or_default())
}

fn decode_template_attributes(obj: &dyn DirectoryObject) -> Result<CertificateTemplatePolicy> {
    let identity = decode_directory_identity(obj)?;
    let oid = obj.require_string(ATTR_CERT_TEMPLATE_OID)?;
    let schema_version = to_u32(
        ATTR_TEMPLATE_SCHEMA_VERSION,
        obj.require_int(ATTR_TEMPLATE_SCHEMA_VERSION)?,
    )?;

    let critical_extensions = obj.get_string_list(ATTR_CRITICAL_EXTENSIONS)?;
    let is_critical = |oid: &str| critical_extensions.iter().any(|c| c.trim() == oid);

    let key_usage = KeyUsageExtension {
        value: key_usage_from_bytes(obj.get_bytes(ATTR_KEY_USAGE)?.unwrap_or_default()),
        is_critical: is_critical(ID_CE_KEY_USAGE.to_string().as_str()),
    };

    let (value, custom) = classify_extended_key_usages(&obj.get_string_list(ATTR_EXTENDED_KEY_USAGE)?);
    let enhanced_key_usage = EnhancedKeyUsageExtension {
        value,
        custom,
        is_critical: is_critical(ID_CE_EXT_KEY_USAGE.to_string().as_str()),
    };

    let raw_private_key_flags = obj.get_flags(ATTR_PRIVATE_KEY_FLAG)?;
    let private_key_flags = PrivateKeyFlags::new_truncated(raw_private_key_flags);
    let attestation = key_attestation_from_private_key_flags(private_key_flags);

    Ok(CertificateTemplatePolicy {
        identity,
        oid,
        schema_version,
        major_revision: get_u32(obj, ATTR_REVISION)?,
        minor_revision: get_u32(obj, ATTR_TEMPLATE_MINOR_REVISION)?,
        validity_period: decode_negative_interval_duration(obj.get_bytes(ATTR_EXPIRATION_PERIOD)?),
        key_usage,
        enhanced_key_usage,
        application_policies: obj.get_string_list(ATTR_CERTIFICATE_APPLICATION_POLICY)?,
        critical_extensions: critical_extensions.clone(),
        minimum_public_key_length: get_u32(obj, ATTR_MINIMAL_KEY_SIZE)?,
        ra_signatures_required: get_u32(obj, ATTR_RA_SIGNATURE)?,
        general_flags: CertificateTemplateFlags::new_truncated(obj.get_flags(ATTR_FLAGS)?),
        subject_name_flags: SubjectNameFlags::new_truncated(
            obj.get_flags(ATTR_CERTIFICATE_NAME_FLAG)?,
        ),
        enrollment_flags: EnrollmentFlags::new_truncated(obj.get_flags(ATTR_ENROLLMENT_FLAG)?),
        private_key_flags,
        key_attestation_enforcement: attestation.enforcement,
        key_attestation_methods: attestation.methods,
        asserts_key_attestation_policy: attestation.asserts_policy,
        minimum_supported_client: minimum_supported_client(raw_private_key_flags, schema_version)
            .to_string(),
        minimum_supported_server: minimum_supported_server(raw_private_key_flags, schema_version)
            .to_string(),
        enrollment_services: BTreeSet::new(),
        access_rules: AccessRules::new(),
    })
}

/// `decode_certificate_template` produces a [`CertificateTemplatePolicy`] from the attributes and
/// authorization entries of an object of class `pKICertificateTemplate`.
///
/// Deny entries are combined per the `PS_DENY_RULE_POLICY` value in `settings`. Decoding the same
/// object twice yields equal values.
pub fn decode_certificate_template(
    obj: &dyn DirectoryObject,
    settings: &PolicySettings,
) -> Result<CertificateTemplatePolicy> {
    let mut template =
        decode_template_attributes(obj).map_err(|e| Error::malformed_template(&obj.label(), e))?;
    let rules = obj.access_rules().map_err(|e| Error::AccessRuleRetrieval {
        name: template.identity.name.clone(),
        oid: template.oid.clone(),
        reason: e.to_string(),
    })?;
    template.access_rules = resolve_access_rules(&rules, settings.get_deny_rule_policy());
    Ok(template)
}

#[cfg(test)]
fn web_server_entry() -> crate::DirectoryEntrySnapshot {
    use crate::{AttributeValue, DirectoryEntrySnapshot, RawAccessRule, ENROLL_EXTENDED_RIGHT, RIGHTS_EXTENDED_RIGHT};
    use alloc::vec;

    let mut e = DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String("WebServer".to_string()))
        .with_attribute(ATTR_DISPLAY_NAME, AttributeValue::String("Web Server".to_string()))
        .with_attribute(
            ATTR_DISTINGUISHED_NAME,
            AttributeValue::String(
                "CN=WebServer,CN=Certificate Templates,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com"
                    .to_string(),
            ),
        )
        .with_attribute(
            ATTR_CERT_TEMPLATE_OID,
            AttributeValue::String(
                "1.3.6.1.4.1.311.21.8.1.2.3.4.5.6.7.8.9.10".to_string(),
            ),
        )
        .with_attribute(ATTR_TEMPLATE_SCHEMA_VERSION, AttributeValue::Integer(2))
        .with_attribute(ATTR_REVISION, AttributeValue::Integer(100))
        .with_attribute(ATTR_TEMPLATE_MINOR_REVISION, AttributeValue::String("4".to_string()))
        .with_attribute(
            ATTR_EXPIRATION_PERIOD,
            AttributeValue::Bytes(vec![0x00, 0x40, 0x39, 0x87, 0x2E, 0xE1, 0xFE, 0xFF]),
        )
        .with_attribute(ATTR_KEY_USAGE, AttributeValue::Bytes(vec![0xA0, 0x00]))
        .with_attribute(
            ATTR_EXTENDED_KEY_USAGE,
            AttributeValue::String("1.3.6.1.5.5.7.3.1".to_string()),
        )
        .with_attribute(
            ATTR_CRITICAL_EXTENSIONS,
            AttributeValue::Strings(vec!["2.5.29.15".to_string()]),
        )
        .with_attribute(ATTR_MINIMAL_KEY_SIZE, AttributeValue::Integer(2048))
        .with_attribute(ATTR_PRIVATE_KEY_FLAG, AttributeValue::Integer(0x0305_2610))
        .with_attribute(ATTR_CERTIFICATE_NAME_FLAG, AttributeValue::Integer(1))
        .with_attribute(ATTR_FLAGS, AttributeValue::Integer(0x0002_0240))
        .with_attribute(ATTR_WHEN_CREATED, AttributeValue::String("20230115093000.0Z".to_string()));
    e.set_access_rules(Some(vec![
        RawAccessRule::allow("CONTOSO\\Domain Admins", 0x0000_0094, None),
        RawAccessRule::allow(
            "CONTOSO\\Domain Admins",
            RIGHTS_EXTENDED_RIGHT,
            Some(ENROLL_EXTENDED_RIGHT),
        ),
    ]));
    e
}

#[test]
fn decode_template_test() {
    use crate::{AccessFlag, KeyAttestationMethod, KeyUsageFlag};

    let settings = PolicySettings::new();
    let t = decode_certificate_template(&web_server_entry(), &settings).unwrap();
    assert_eq!("WebServer", t.name());
    assert_eq!("Web Server", t.identity.display_name);
    assert_eq!(1673775000, t.identity.when_created);
    assert_eq!(0, t.identity.when_changed);
    assert_eq!(None, t.identity.object_guid);
    assert_eq!(2, t.schema_version);
    assert_eq!(100, t.major_revision);
    assert_eq!(4, t.minor_revision);
    assert_eq!(Duration::from_secs(365 * 24 * 60 * 60), t.validity_period);
    assert_eq!(
        KeyUsageFlag::DigitalSignature | KeyUsageFlag::KeyEncipherment,
        t.key_usage.value
    );
    assert!(t.key_usage.is_critical);
    assert_eq!(
        EnhancedKeyUsageFlags::from(EnhancedKeyUsageFlag::ServerAuthentication),
        t.enhanced_key_usage.value
    );
    assert!(t.enhanced_key_usage.custom.is_empty());
    assert!(!t.enhanced_key_usage.is_critical);
    assert!(!t.allows_any_purpose());
    assert_eq!(2048, t.minimum_public_key_length);
    assert_eq!(0, t.ra_signatures_required);

    assert!(t.exportable_private_key());
    assert!(!t.key_archival_required());
    assert!(!t.requires_strong_key_protection());
    assert!(t.enrollee_supplies_subject());
    assert!(!t.is_ca());
    assert!(t.general_flags.contains(CertificateTemplateFlag::MachineType));
    assert!(t.general_flags.contains(CertificateTemplateFlag::AddTemplateName));
    assert!(t.general_flags.contains(CertificateTemplateFlag::IsModified));

    assert_eq!(KeyAttestationEnforcement::Required, t.key_attestation_enforcement);
    assert_eq!(
        KeyAttestationMethod::TrustOnUse | KeyAttestationMethod::ValidateCert,
        t.key_attestation_methods
    );
    assert!(t.asserts_key_attestation_policy);
    assert_eq!("Windows 7 / Windows Server 2008 R2", t.minimum_supported_client);
    assert_eq!("Windows Server 2012 R2", t.minimum_supported_server);

    assert_eq!(1, t.access_rules.len());
    assert_eq!(
        AccessFlag::Read | AccessFlag::Enroll,
        t.access_rules["CONTOSO\\Domain Admins"]
    );
    assert!(t.enrollment_services.is_empty());

    // decoding is a pure function of the attributes
    let again = decode_certificate_template(&web_server_entry(), &settings).unwrap();
    assert_eq!(t, again);
}

#[test]
fn decode_template_defaults_test() {
    use crate::{AttributeValue, DirectoryEntrySnapshot};

    let e = DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String("Minimal".to_string()))
        .with_attribute(ATTR_CERT_TEMPLATE_OID, AttributeValue::String("1.2.3.4".to_string()))
        .with_attribute(ATTR_TEMPLATE_SCHEMA_VERSION, AttributeValue::Integer(1));
    let t = decode_certificate_template(&e, &PolicySettings::new()).unwrap();
    assert_eq!(Duration::ZERO, t.validity_period);
    assert!(t.key_usage.value.is_empty());
    assert!(t.allows_any_purpose());
    assert!(t.general_flags.is_empty());
    assert_eq!(KeyAttestationEnforcement::None, t.key_attestation_enforcement);
    assert!(t.key_attestation_methods.is_empty());
    assert!(!t.asserts_key_attestation_policy);
    assert_eq!("Windows 2000", t.minimum_supported_client);
    assert_eq!("Windows 2000 Server", t.minimum_supported_server);
    assert!(t.access_rules.is_empty());
}

#[test]
fn decode_template_errors_test() {
    use crate::AttributeValue;

    let mut e = web_server_entry();
    e.attributes.remove(ATTR_TEMPLATE_SCHEMA_VERSION);
    match decode_certificate_template(&e, &PolicySettings::new()) {
        Err(Error::MalformedTemplate {
            object, attribute, ..
        }) => {
            assert!(object.starts_with("CN=WebServer,"));
            assert_eq!(ATTR_TEMPLATE_SCHEMA_VERSION, attribute);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let mut e = web_server_entry();
    e.set_attribute(ATTR_PRIVATE_KEY_FLAG, AttributeValue::Bytes(alloc::vec![1, 2]));
    match decode_certificate_template(&e, &PolicySettings::new()) {
        Err(Error::MalformedTemplate { attribute, .. }) => {
            assert_eq!(ATTR_PRIVATE_KEY_FLAG, attribute)
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let mut e = web_server_entry();
    e.set_access_rules(None);
    assert_eq!(
        Err(Error::AccessRuleRetrieval {
            name: "WebServer".to_string(),
            oid: "1.3.6.1.4.1.311.21.8.1.2.3.4.5.6.7.8.9.10".to_string(),
            reason: "NotFound".to_string(),
        }),
        decode_certificate_template(&e, &PolicySettings::new())
    );
}

#[test]
fn decode_identity_test() {
    use crate::{AttributeValue, DirectoryEntrySnapshot};

    let e = DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String("User".to_string()))
        .with_attribute(
            ATTR_OBJECT_GUID,
            AttributeValue::Bytes(alloc::vec![
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC,
                0xDD, 0xEE, 0xFF
            ]),
        )
        .with_attribute(ATTR_WHEN_CHANGED, AttributeValue::String("garbage".to_string()));
    let id = decode_directory_identity(&e).unwrap();
    assert_eq!(
        Some("00112233-4455-6677-8899-aabbccddeeff".to_string()),
        id.object_guid
    );
    assert_eq!(0, id.when_changed);
    assert_eq!("", id.display_name);

    let e = DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String("User".to_string()))
        .with_attribute(ATTR_OBJECT_GUID, AttributeValue::Bytes(alloc::vec![1, 2, 3]));
    assert!(decode_directory_identity(&e).is_err());
    assert_eq!(
        Err(Error::MissingAttribute(ATTR_NAME.to_string())),
        decode_directory_identity(&DirectoryEntrySnapshot::new())
    );
}
