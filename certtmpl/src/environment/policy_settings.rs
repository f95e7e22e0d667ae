//! Structures and functions related to configuring directory scans and policy decoding
//!
//! [`PolicySettings`] is passed to attribute sources and to [`PolicyEnvironment`](crate::PolicyEnvironment)
//! at construction. It identifies the forest being examined (and thus the location of the Public Key
//! Services container) and selects the options applied while decoding.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use pkiprocmacros::*;

use crate::DenyRulePolicy;

#[cfg(feature = "std")]
use std::path::Path;

#[cfg(feature = "std")]
use crate::util::file_utils::get_file_as_byte_vec;
#[cfg(feature = "std")]
use crate::{Error, Result};

//-----------------------------------------------------------------------------------------------
// Type definitions used in the definition of policy settings
//-----------------------------------------------------------------------------------------------
/// `Strings` is a typedef for a vector of String values.
pub type Strings = Vec<String>;

/// `PolicySettings` is a typedef for a `BTreeMap` that maps arbitrary string values to a
/// variant map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct PolicySettings(pub BTreeMap<String, PolicyProcessingTypes>);

impl PolicySettings {
    /// Creates a new empty [`PolicySettings`]
    pub fn new() -> Self {
        Self::default()
    }
}

/// `PolicyProcessingTypes` is used to define a variant map with types associated with reading
/// and decoding the Public Key Services container.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum PolicyProcessingTypes {
    /// Represents bool values
    Bool(bool),
    /// Represents String values
    String(String),
    /// Represents vectors of Strings
    Strings(Strings),
    /// Represents the combination applied to Deny authorization entries
    DenyRulePolicy(DenyRulePolicy),
}

//-----------------------------------------------------------------------------------------------
// Types of policy settings
//-----------------------------------------------------------------------------------------------
/// `PS_DOMAIN_CONTROLLER` is used to retrieve a String value from a [`PolicySettings`] object
/// naming the domain controller to which LDAP URLs are addressed. When absent, serverless LDAP URLs
/// are produced.
pub static PS_DOMAIN_CONTROLLER: &str = "psDomainController";

/// `PS_FOREST_ROOT_DN` is used to retrieve a String value from a [`PolicySettings`] object containing
/// the distinguished name of the forest root domain, i.e., `DC=contoso,DC=com`. Container locations
/// are derived from this value.
pub static PS_FOREST_ROOT_DN: &str = "psForestRootDn";

/// `PS_DENY_RULE_POLICY` is used to retrieve a [`DenyRulePolicy`] value from a [`PolicySettings`]
/// object. By default, [`DenyRulePolicy::Subtract`] is used.
pub static PS_DENY_RULE_POLICY: &str = "psDenyRulePolicy";

/// `PS_RESOLVE_CUSTOM_OID_NAMES` is used to retrieve a boolean value from a [`PolicySettings`]
/// object. When true, friendly names of custom extended key usage OIDs are resolved against the
/// forest OID registry after all templates are decoded. By default, this setting is set to true.
pub static PS_RESOLVE_CUSTOM_OID_NAMES: &str = "psResolveCustomOidNames";

/// `PS_REQUIRE_OBJECT_CLASS` is used to retrieve a boolean value from a [`PolicySettings`] object.
/// When true, objects whose class does not match the container being read are skipped. By default,
/// this setting is set to true.
pub static PS_REQUIRE_OBJECT_CLASS: &str = "psRequireObjectClass";

/// `PS_TEMPLATE_NAMES` is used to retrieve a Strings value from a [`PolicySettings`] object. When
/// present, only certificate templates with one of the listed names are decoded.
pub static PS_TEMPLATE_NAMES: &str = "psTemplateNames";

//-----------------------------------------------------------------------------------------------
// Getters/setters for settings
//-----------------------------------------------------------------------------------------------
ps_gets_and_sets!(PS_DOMAIN_CONTROLLER, String);
ps_gets_and_sets!(PS_FOREST_ROOT_DN, String);
ps_gets_and_sets!(PS_TEMPLATE_NAMES, Strings);
ps_gets_and_sets_with_default!(PS_DENY_RULE_POLICY, DenyRulePolicy, DenyRulePolicy::Subtract);
ps_gets_and_sets_with_default!(PS_RESOLVE_CUSTOM_OID_NAMES, bool, true);
ps_gets_and_sets_with_default!(PS_REQUIRE_OBJECT_CLASS, bool, true);

//-----------------------------------------------------------------------------------------------
// Container locations
//-----------------------------------------------------------------------------------------------
impl PolicySettings {
    /// `get_public_key_services_dn` returns the distinguished name of the Public Key Services
    /// container, or None when `PS_FOREST_ROOT_DN` is not set.
    pub fn get_public_key_services_dn(&self) -> Option<String> {
        self.get_forest_root_dn()
            .map(|root| format!("CN=Public Key Services,CN=Services,CN=Configuration,{root}"))
    }

    /// `get_certificate_templates_dn` returns the distinguished name of the Certificate Templates container
    pub fn get_certificate_templates_dn(&self) -> Option<String> {
        self.get_public_key_services_dn()
            .map(|pks| format!("CN=Certificate Templates,{pks}"))
    }

    /// `get_enrollment_services_dn` returns the distinguished name of the Enrollment Services container
    pub fn get_enrollment_services_dn(&self) -> Option<String> {
        self.get_public_key_services_dn()
            .map(|pks| format!("CN=Enrollment Services,{pks}"))
    }

    /// `get_oid_container_dn` returns the distinguished name of the OID container
    pub fn get_oid_container_dn(&self) -> Option<String> {
        self.get_public_key_services_dn()
            .map(|pks| format!("CN=OID,{pks}"))
    }

    /// `ldap_url` returns an LDAP URL for the object with the given common name in the given container.
    pub fn ldap_url(&self, container_dn: &str, name: &str) -> String {
        match self.get_domain_controller() {
            Some(dc) => format!("LDAP://{dc}/CN={name},{container_dn}"),
            None => format!("LDAP://CN={name},{container_dn}"),
        }
    }

    /// `get_certificate_template_ldap_url` returns the LDAP URL of the named certificate template.
    pub fn get_certificate_template_ldap_url(&self, name: &str) -> Option<String> {
        self.get_certificate_templates_dn()
            .map(|c| self.ldap_url(&c, name))
    }

    /// `get_enrollment_service_ldap_url` returns the LDAP URL of the named enrollment service.
    pub fn get_enrollment_service_ldap_url(&self, name: &str) -> Option<String> {
        self.get_enrollment_services_dn()
            .map(|c| self.ldap_url(&c, name))
    }

    /// `is_template_selected` returns true when `PS_TEMPLATE_NAMES` is absent or contains `name`.
    pub fn is_template_selected(&self, name: &str) -> bool {
        match self.get_template_names() {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }
}

/// `read_settings` accepts a string containing the name of a file that notionally contains JSON data
/// that represents PolicySettings. An absent file name, or a name that does not exist, yields an
/// empty settings object.
#[cfg(feature = "std")]
pub fn read_settings(fname: &Option<String>) -> Result<PolicySettings> {
    if let Some(fname) = fname {
        let p = Path::new(fname.as_str());
        if Path::exists(p) {
            let json = get_file_as_byte_vec(p)?;
            return serde_json::from_slice(&json).map_err(|_e| Error::ParseError);
        }
    }
    Ok(PolicySettings::new())
}

#[test]
fn test_default_gets_ps() {
    let ps = PolicySettings::default();
    assert_eq!(None, ps.get_domain_controller());
    assert_eq!(None, ps.get_forest_root_dn());
    assert_eq!(None, ps.get_template_names());
    assert_eq!(DenyRulePolicy::Subtract, ps.get_deny_rule_policy());
    assert!(ps.get_resolve_custom_oid_names());
    assert!(ps.get_require_object_class());
    assert_eq!(None, ps.get_public_key_services_dn());
    assert_eq!(None, ps.get_certificate_template_ldap_url("User"));
    assert!(ps.is_template_selected("User"));
}

#[test]
fn test_gets_and_sets_ps() {
    let mut ps = PolicySettings::new();
    ps.set_forest_root_dn("DC=contoso,DC=com".to_string());
    ps.set_deny_rule_policy(DenyRulePolicy::Intersect);
    ps.set_resolve_custom_oid_names(false);
    ps.set_require_object_class(false);
    ps.set_template_names(alloc::vec!["WebServer".to_string()]);

    assert_eq!(DenyRulePolicy::Intersect, ps.get_deny_rule_policy());
    assert!(!ps.get_resolve_custom_oid_names());
    assert!(!ps.get_require_object_class());
    assert!(ps.is_template_selected("WebServer"));
    assert!(!ps.is_template_selected("webserver"));

    assert_eq!(
        Some(
            "CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com".to_string()
        ),
        ps.get_public_key_services_dn()
    );
    assert_eq!(
        Some(
            "CN=Enrollment Services,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com"
                .to_string()
        ),
        ps.get_enrollment_services_dn()
    );
    assert_eq!(
        Some("CN=OID,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com".to_string()),
        ps.get_oid_container_dn()
    );
    assert_eq!(
        Some("LDAP://CN=User,CN=Certificate Templates,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com".to_string()),
        ps.get_certificate_template_ldap_url("User")
    );

    ps.set_domain_controller("dc01.contoso.com".to_string());
    assert_eq!(
        Some("LDAP://dc01.contoso.com/CN=Issuing CA,CN=Enrollment Services,CN=Public Key Services,CN=Services,CN=Configuration,DC=contoso,DC=com".to_string()),
        ps.get_enrollment_service_ldap_url("Issuing CA")
    );
}
