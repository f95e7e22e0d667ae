//! In-memory attribute sources built from already-fetched directory data
//!
//! [`DirectoryEntrySnapshot`] holds the attributes and authorization entries of one directory object.
//! [`PublicKeyServicesSnapshot`] holds a set of entries and routes them to the certificate template,
//! enrollment service and OID containers using the locations derived from [`PolicySettings`]. When
//! no forest root is configured, entries are routed by object class instead.
//!
//! With the `std` feature, snapshots can be saved to and read from JSON files, which supports
//! offline review of an exported Public Key Services container.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::{
    AttributeValue, DirectoryObject, Error, PolicySettings, PublicKeyServicesSource,
    RawAccessRule, Result, ATTR_DISTINGUISHED_NAME, CLASS_CERTIFICATE_TEMPLATE,
    CLASS_ENROLLMENT_SERVICE, CLASS_ENTERPRISE_OID,
};

#[cfg(feature = "std")]
use crate::util::file_utils::get_file_as_byte_vec;
#[cfg(feature = "std")]
use std::path::Path;

/// `DirectoryEntrySnapshot` is a [`DirectoryObject`] backed by values captured from the directory.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct DirectoryEntrySnapshot {
    /// Attribute values keyed by attribute name
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Authorization entries, or None when the security descriptor could not be read
    pub access_rules: Option<Vec<RawAccessRule>>,
}

impl Default for DirectoryEntrySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryEntrySnapshot {
    /// Creates an entry with no attributes and an empty, readable, list of authorization entries
    pub fn new() -> Self {
        DirectoryEntrySnapshot {
            attributes: BTreeMap::new(),
            access_rules: Some(Vec::new()),
        }
    }

    /// Adds or replaces an attribute value, returning the updated entry
    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Adds or replaces an attribute value
    pub fn set_attribute(&mut self, name: &str, value: AttributeValue) {
        self.attributes.insert(name.to_string(), value);
    }

    /// Replaces the authorization entries. Passing None marks the security descriptor as unreadable.
    pub fn set_access_rules(&mut self, rules: Option<Vec<RawAccessRule>>) {
        self.access_rules = rules;
    }

    /// Returns the distinguished name of the entry or an empty string
    pub fn distinguished_name(&self) -> String {
        self.get_string(ATTR_DISTINGUISHED_NAME)
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

impl DirectoryObject for DirectoryEntrySnapshot {
    // attribute names are case-insensitive in the directory
    fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    fn access_rules(&self) -> Result<Vec<RawAccessRule>> {
        match &self.access_rules {
            Some(rules) => Ok(rules.clone()),
            None => Err(Error::NotFound),
        }
    }
}

fn is_in_container(dn: &str, container: &str) -> bool {
    let dn = dn.to_ascii_lowercase();
    let container = container.to_ascii_lowercase();
    match dn.strip_suffix(container.as_str()) {
        Some(rdn) => rdn.ends_with(',') && !rdn[..rdn.len() - 1].contains(','),
        None => false,
    }
}

/// `PublicKeyServicesSnapshot` is a [`PublicKeyServicesSource`] backed by a list of
/// [`DirectoryEntrySnapshot`] values.
#[derive(Clone, Debug, Default)]
pub struct PublicKeyServicesSnapshot {
    certificate_templates_dn: Option<String>,
    enrollment_services_dn: Option<String>,
    oid_container_dn: Option<String>,
    entries: Vec<DirectoryEntrySnapshot>,
}

impl PublicKeyServicesSnapshot {
    /// Creates an empty snapshot that routes entries using the container locations derived from
    /// `settings`.
    pub fn new(settings: &PolicySettings) -> Self {
        PublicKeyServicesSnapshot {
            certificate_templates_dn: settings.get_certificate_templates_dn(),
            enrollment_services_dn: settings.get_enrollment_services_dn(),
            oid_container_dn: settings.get_oid_container_dn(),
            entries: Vec::new(),
        }
    }

    /// Adds an entry to the snapshot
    pub fn add_entry(&mut self, entry: DirectoryEntrySnapshot) {
        self.entries.push(entry);
    }

    /// Returns the entries in the order they were added
    pub fn entries(&self) -> &[DirectoryEntrySnapshot] {
        &self.entries
    }

    fn select(&self, container: &Option<String>, class: &str) -> Vec<&dyn DirectoryObject> {
        self.entries
            .iter()
            .filter(|e| match container {
                Some(container) => is_in_container(&e.distinguished_name(), container),
                None => e.is_object_class(class),
            })
            .map(|e| e as &dyn DirectoryObject)
            .collect()
    }
}

impl PublicKeyServicesSource for PublicKeyServicesSnapshot {
    fn get_certificate_templates(&self) -> Result<Vec<&dyn DirectoryObject>> {
        Ok(self.select(&self.certificate_templates_dn, CLASS_CERTIFICATE_TEMPLATE))
    }

    fn get_enrollment_services(&self) -> Result<Vec<&dyn DirectoryObject>> {
        Ok(self.select(&self.enrollment_services_dn, CLASS_ENROLLMENT_SERVICE))
    }

    fn get_oid_objects(&self) -> Result<Vec<&dyn DirectoryObject>> {
        Ok(self.select(&self.oid_container_dn, CLASS_ENTERPRISE_OID))
    }
}

/// `read_snapshot` reads a JSON file containing an array of [`DirectoryEntrySnapshot`] values and
/// returns a [`PublicKeyServicesSnapshot`] that routes them per `settings`.
#[cfg(feature = "std")]
pub fn read_snapshot(fname: &Path, settings: &PolicySettings) -> Result<PublicKeyServicesSnapshot> {
    let json = get_file_as_byte_vec(fname)?;
    let entries: Vec<DirectoryEntrySnapshot> =
        serde_json::from_slice(&json).map_err(|_e| Error::ParseError)?;
    let mut snapshot = PublicKeyServicesSnapshot::new(settings);
    for e in entries {
        snapshot.add_entry(e);
    }
    Ok(snapshot)
}

/// `write_snapshot` saves the entries of a [`PublicKeyServicesSnapshot`] as a JSON array.
#[cfg(feature = "std")]
pub fn write_snapshot(fname: &Path, snapshot: &PublicKeyServicesSnapshot) -> Result<()> {
    let json = serde_json::to_vec_pretty(snapshot.entries()).map_err(|_e| Error::ParseError)?;
    std::fs::write(fname, json).map_err(|e| Error::StdIoError(e.kind()))
}

#[test]
fn container_test() {
    let c = "CN=Certificate Templates,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com";
    assert!(is_in_container(
        "CN=User,CN=Certificate Templates,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com",
        c
    ));
    assert!(is_in_container(
        "cn=User,cn=certificate templates,CN=Public Key Services,CN=Services,CN=Configuration,DC=CONTOSO,DC=com",
        c
    ));
    assert!(!is_in_container(c, c));
    assert!(!is_in_container(
        "CN=Child,CN=User,CN=Certificate Templates,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com",
        c
    ));
    assert!(!is_in_container(
        "CN=User,CN=Certificate Templates,CN=Public Key Services,CN=Services,CN=Configuration,DC=fabrikam,DC=com",
        c
    ));
}

#[test]
fn snapshot_attribute_test() {
    use crate::{ATTR_NAME, ATTR_OBJECT_CLASS};
    use alloc::vec;

    let mut e = DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String("User".to_string()))
        .with_attribute(
            ATTR_OBJECT_CLASS,
            AttributeValue::Strings(vec!["top".to_string(), "pKICertificateTemplate".to_string()]),
        );
    assert_eq!(Some("User".to_string()), e.get_string("NAME").unwrap());
    assert!(e.is_object_class(CLASS_CERTIFICATE_TEMPLATE));
    assert!(!e.is_object_class(CLASS_ENROLLMENT_SERVICE));
    assert_eq!(Ok(vec![]), e.access_rules());
    e.set_access_rules(None);
    assert_eq!(Err(Error::NotFound), e.access_rules());
    assert_eq!("", e.distinguished_name());
}

#[test]
fn flag_word_test() {
    use crate::ATTR_FLAGS;

    let flags = |v: i64| {
        DirectoryEntrySnapshot::new()
            .with_attribute(ATTR_FLAGS, AttributeValue::Integer(v))
            .get_flags(ATTR_FLAGS)
    };
    assert_eq!(Ok(0), DirectoryEntrySnapshot::new().get_flags(ATTR_FLAGS));
    assert_eq!(Ok(0x0305_2610), flags(0x0305_2610));
    assert_eq!(Ok(0x8000_0000), flags(i32::MIN as i64));
    assert_eq!(Ok(0xFFFF_FFFF), flags(-1));
    assert_eq!(Ok(0xFFFF_FFFF), flags(u32::MAX as i64));
    assert!(matches!(
        flags(u32::MAX as i64 + 1),
        Err(Error::AttributeShape { .. })
    ));
    assert!(matches!(
        flags(i32::MIN as i64 - 1),
        Err(Error::AttributeShape { .. })
    ));
}
