//! The attribute source traits describe the seam between the decoders in this crate and whatever
//! mechanism retrieves objects from the directory (LDAP, an exported snapshot, a test fixture).
//!
//! A [`DirectoryObject`] yields attribute values by name. Directory attributes may be absent, hold a
//! single value or hold several values depending on cardinality at read time, so values are read
//! through typed accessors ([`DirectoryObject::get_int`], [`DirectoryObject::get_bytes`],
//! [`DirectoryObject::get_string`], [`DirectoryObject::get_string_list`]) that normalize the
//! single-versus-array inconsistency and return [`Error::AttributeShape`] on a shape mismatch.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

//-----------------------------------------------------------------------------------------------
// Attribute names
//-----------------------------------------------------------------------------------------------
/// Common name of the object, i.e., the short name by which CAs publish a template
pub const ATTR_NAME: &str = "name";
/// Display name of the object
pub const ATTR_DISPLAY_NAME: &str = "displayName";
/// Distinguished name of the object
pub const ATTR_DISTINGUISHED_NAME: &str = "distinguishedName";
/// Binary GUID of the object
pub const ATTR_OBJECT_GUID: &str = "objectGUID";
/// Object class hierarchy, most derived class last
pub const ATTR_OBJECT_CLASS: &str = "objectClass";
/// Creation time in generalized time form
pub const ATTR_WHEN_CREATED: &str = "whenCreated";
/// Modification time in generalized time form
pub const ATTR_WHEN_CHANGED: &str = "whenChanged";
/// General flags of a template, enrollment service or OID registry object
pub const ATTR_FLAGS: &str = "flags";
/// Template OID, also the OID value of an OID registry object
pub const ATTR_CERT_TEMPLATE_OID: &str = "msPKI-Cert-Template-OID";
/// Template schema version
pub const ATTR_TEMPLATE_SCHEMA_VERSION: &str = "msPKI-Template-Schema-Version";
/// Template major revision
pub const ATTR_REVISION: &str = "revision";
/// Template minor revision
pub const ATTR_TEMPLATE_MINOR_REVISION: &str = "msPKI-Template-Minor-Revision";
/// Validity period as a negative 100-nanosecond interval
pub const ATTR_EXPIRATION_PERIOD: &str = "pKIExpirationPeriod";
/// Extended key usage OIDs
pub const ATTR_EXTENDED_KEY_USAGE: &str = "pKIExtendedKeyUsage";
/// Key usage bits, most significant bit first
pub const ATTR_KEY_USAGE: &str = "pKIKeyUsage";
/// Minimum public key length in bits
pub const ATTR_MINIMAL_KEY_SIZE: &str = "msPKI-Minimal-Key-Size";
/// Number of authorized signatures required on a request
pub const ATTR_RA_SIGNATURE: &str = "msPKI-RA-Signature";
/// Private key flags
pub const ATTR_PRIVATE_KEY_FLAG: &str = "msPKI-Private-Key-Flag";
/// Enrollment flags
pub const ATTR_ENROLLMENT_FLAG: &str = "msPKI-Enrollment-Flag";
/// Subject name flags
pub const ATTR_CERTIFICATE_NAME_FLAG: &str = "msPKI-Certificate-Name-Flag";
/// OIDs of extensions marked critical in issued certificates
pub const ATTR_CRITICAL_EXTENSIONS: &str = "pKICriticalExtensions";
/// Application policy OIDs of a version 2 or later template
pub const ATTR_CERTIFICATE_APPLICATION_POLICY: &str = "msPKI-Certificate-Application-Policy";
/// DNS host name of an enrollment service
pub const ATTR_DNS_HOST_NAME: &str = "dNSHostName";
/// CA certificate of an enrollment service
pub const ATTR_CA_CERTIFICATE: &str = "cACertificate";
/// Subject DN of the CA certificate of an enrollment service
pub const ATTR_CA_CERTIFICATE_DN: &str = "cACertificateDN";
/// Names of the templates published by an enrollment service
pub const ATTR_CERTIFICATE_TEMPLATES: &str = "certificateTemplates";

/// Object class of certificate template objects
pub const CLASS_CERTIFICATE_TEMPLATE: &str = "pKICertificateTemplate";
/// Object class of enrollment service objects
pub const CLASS_ENROLLMENT_SERVICE: &str = "pKIEnrollmentService";
/// Object class of OID registry objects
pub const CLASS_ENTERPRISE_OID: &str = "msPKI-Enterprise-Oid";

//-----------------------------------------------------------------------------------------------
// Raw values
//-----------------------------------------------------------------------------------------------
/// `AttributeValue` represents one attribute value as it was read from the directory. Absence is
/// expressed by [`DirectoryObject::attribute`] returning `None`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum AttributeValue {
    /// Single string value
    String(String),
    /// Single integer value
    Integer(i64),
    /// Single binary value
    Bytes(Vec<u8>),
    /// Ordered list of string values
    Strings(Vec<String>),
}

/// Whether an authorization entry grants or denies the rights it carries
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum AccessControlType {
    /// Rights are granted
    Allow,
    /// Rights are denied
    Deny,
}

/// `RawAccessRule` is one authorization entry from the security descriptor of a directory object.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct RawAccessRule {
    /// Identity (account name or SID string) the entry applies to. Entries whose identity could
    /// not be translated are carried with `None` and are ignored during resolution.
    pub identity: Option<String>,
    /// Directory rights bitmask
    pub rights: u32,
    /// Extended right GUID, when the entry applies to a specific extended right
    pub object_type: Option<String>,
    /// Allow or deny
    pub access_control_type: AccessControlType,
}

impl RawAccessRule {
    /// Creates an allow entry
    pub fn allow(identity: &str, rights: u32, object_type: Option<&str>) -> Self {
        RawAccessRule {
            identity: Some(identity.to_string()),
            rights,
            object_type: object_type.map(|s| s.to_string()),
            access_control_type: AccessControlType::Allow,
        }
    }

    /// Creates a deny entry
    pub fn deny(identity: &str, rights: u32, object_type: Option<&str>) -> Self {
        RawAccessRule {
            identity: Some(identity.to_string()),
            rights,
            object_type: object_type.map(|s| s.to_string()),
            access_control_type: AccessControlType::Deny,
        }
    }
}

//-----------------------------------------------------------------------------------------------
// Traits
//-----------------------------------------------------------------------------------------------
/// The [`DirectoryObject`] trait enables trait objects to provide the attributes and authorization
/// entries of a single directory object.
pub trait DirectoryObject {
    /// Returns the value of the named attribute or None if the attribute is absent
    fn attribute(&self, name: &str) -> Option<&AttributeValue>;

    /// Returns the authorization entries of the object, in security descriptor order. An error
    /// indicates the security descriptor could not be read.
    fn access_rules(&self) -> Result<Vec<RawAccessRule>>;

    /// `get_int` returns an integer value. Integer-convertible strings, including a single-valued
    /// list, are accepted. Returns `Ok(None)` when the attribute is absent.
    fn get_int(&self, name: &str) -> Result<Option<i64>> {
        let shape_error = || Error::AttributeShape {
            attribute: name.to_string(),
            expected: "integer",
        };
        match self.attribute(name) {
            None => Ok(None),
            Some(AttributeValue::Integer(i)) => Ok(Some(*i)),
            Some(AttributeValue::String(s)) => s.trim().parse().map(Some).map_err(|_| shape_error()),
            Some(AttributeValue::Strings(v)) if v.len() == 1 => {
                v[0].trim().parse().map(Some).map_err(|_| shape_error())
            }
            Some(_) => Err(shape_error()),
        }
    }

    /// `get_bytes` returns a binary value. Returns `Ok(None)` when the attribute is absent.
    fn get_bytes(&self, name: &str) -> Result<Option<&[u8]>> {
        match self.attribute(name) {
            None => Ok(None),
            Some(AttributeValue::Bytes(b)) => Ok(Some(b.as_slice())),
            Some(_) => Err(Error::AttributeShape {
                attribute: name.to_string(),
                expected: "binary",
            }),
        }
    }

    /// `get_string` returns a single string value. A single-valued list is accepted. Returns
    /// `Ok(None)` when the attribute is absent.
    fn get_string(&self, name: &str) -> Result<Option<String>> {
        match self.attribute(name) {
            None => Ok(None),
            Some(AttributeValue::String(s)) => Ok(Some(s.clone())),
            Some(AttributeValue::Strings(v)) if v.len() == 1 => Ok(Some(v[0].clone())),
            Some(_) => Err(Error::AttributeShape {
                attribute: name.to_string(),
                expected: "string",
            }),
        }
    }

    /// `get_string_list` returns the values of a multi-valued string attribute in directory order.
    /// A single string is returned as a one element list and an absent attribute as an empty list.
    fn get_string_list(&self, name: &str) -> Result<Vec<String>> {
        match self.attribute(name) {
            None => Ok(vec![]),
            Some(AttributeValue::String(s)) => Ok(vec![s.clone()]),
            Some(AttributeValue::Strings(v)) => Ok(v.clone()),
            Some(_) => Err(Error::AttributeShape {
                attribute: name.to_string(),
                expected: "string list",
            }),
        }
    }

    /// `require_int` is [`DirectoryObject::get_int`] for attributes that have no sensible default.
    fn require_int(&self, name: &str) -> Result<i64> {
        self.get_int(name)?
            .ok_or_else(|| Error::MissingAttribute(name.to_string()))
    }

    /// `require_string` is [`DirectoryObject::get_string`] for attributes that have no sensible
    /// default. Empty strings are treated as absent.
    fn require_string(&self, name: &str) -> Result<String> {
        match self.get_string(name)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(Error::MissingAttribute(name.to_string())),
        }
    }

    /// `get_flags` returns a 32-bit flag word, or zero when absent. Directory integers are signed,
    /// so words with the high bit set may arrive as negative values. Values outside
    /// `i32::MIN..=u32::MAX` are rejected.
    fn get_flags(&self, name: &str) -> Result<u32> {
        let value = self.get_int(name)?.unwrap_or_default();
        if let Ok(v) = u32::try_from(value) {
            Ok(v)
        } else if let Ok(v) = i32::try_from(value) {
            Ok(v as u32)
        } else {
            Err(Error::AttributeShape {
                attribute: name.to_string(),
                expected: "32-bit flag word",
            })
        }
    }

    /// `label` returns the distinguished name of the object, falling back to its name, for use in
    /// error and log messages.
    fn label(&self) -> String {
        for attribute in [ATTR_DISTINGUISHED_NAME, ATTR_NAME] {
            if let Ok(Some(s)) = self.get_string(attribute) {
                if !s.is_empty() {
                    return s;
                }
            }
        }
        "<unnamed>".to_string()
    }

    /// `is_object_class` returns true when the most derived object class (the last `objectClass`
    /// value) matches `class`, ignoring case.
    fn is_object_class(&self, class: &str) -> bool {
        match self.get_string_list(ATTR_OBJECT_CLASS) {
            Ok(classes) => classes
                .last()
                .map_or(false, |c| c.eq_ignore_ascii_case(class)),
            Err(_) => false,
        }
    }
}

/// The [`PublicKeyServicesSource`] trait enables trait objects to enumerate the objects stored in the
/// Public Key Services container of a forest, backed via some means, i.e., LDAP, a saved snapshot,
/// hard-coded fixtures, etc.
pub trait PublicKeyServicesSource {
    /// Returns the objects found in the Certificate Templates container
    fn get_certificate_templates(&self) -> Result<Vec<&dyn DirectoryObject>>;

    /// Returns the objects found in the Enrollment Services container
    fn get_enrollment_services(&self) -> Result<Vec<&dyn DirectoryObject>>;

    /// Returns the objects found in the OID container
    fn get_oid_objects(&self) -> Result<Vec<&dyn DirectoryObject>>;
}
