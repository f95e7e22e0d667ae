//! Resolves the authorization entries of a certificate template into the effective rights held by
//! each identity.
//!
//! Entries are processed in two passes. Allow entries are classified with [`access_flags_for_rule`]
//! and OR-ed per identity. Deny entries are then classified the same way and combined, via
//! [`apply_deny_rule`], into the value of identities that already hold an Allow value. A Deny entry
//! never creates an entry for an identity.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use flagset::{flags, FlagSet};
#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::{AccessControlType, RawAccessRule};

//-----------------------------------------------------------------------------------------------
// Directory rights
//-----------------------------------------------------------------------------------------------
/// Every right defined for directory objects; classification as FullControl requires all bits
pub const RIGHTS_GENERIC_ALL: u32 = 0x000F_01FF;
/// ReadControl, ListChildren, ReadProperty and ListObject
pub const RIGHTS_GENERIC_READ: u32 = 0x0002_0094;
/// ReadControl, Self and WriteProperty
pub const RIGHTS_GENERIC_WRITE: u32 = 0x0002_0028;
/// Control access right, qualified by the extended right GUID carried in the entry object type
pub const RIGHTS_EXTENDED_RIGHT: u32 = 0x0000_0100;

/// Certificate-Enrollment extended right
pub const ENROLL_EXTENDED_RIGHT: &str = "0e10c968-78fb-11d2-90d4-00c04f79dc55";
/// Certificate-AutoEnrollment extended right
pub const AUTOENROLL_EXTENDED_RIGHT: &str = "a05b8cc2-17bc-4802-a710-e7c15ab866a2";

flags! {
    /// Rights an identity holds on a certificate template
    pub enum AccessFlag: u8 {
        /// Read the template
        Read = 0x01,
        /// Modify the template
        Write = 0x02,
        /// All rights on the template
        FullControl = 0x04,
        /// Request certificates based on the template
        Enroll = 0x08,
        /// Request certificates based on the template via autoenrollment
        Autoenroll = 0x10,
    }
}

/// `EffectiveAccess` is the set of [`AccessFlag`] values held by one identity
pub type EffectiveAccess = FlagSet<AccessFlag>;

/// `AccessRules` maps identities to the rights they hold on a certificate template
pub type AccessRules = BTreeMap<String, EffectiveAccess>;

/// `DenyRulePolicy` selects how a Deny entry is combined with the rights an identity was granted by
/// Allow entries.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum DenyRulePolicy {
    /// The denied rights are cleared from the granted rights
    #[default]
    Subtract,
    /// The granted rights are intersected with the denied rights. This reproduces the results
    /// reported by earlier tools, where a Deny entry retains only the rights it names.
    Intersect,
}

impl fmt::Display for DenyRulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyRulePolicy::Subtract => write!(f, "Subtract"),
            DenyRulePolicy::Intersect => write!(f, "Intersect"),
        }
    }
}

/// `access_flags_for_rule` classifies the rights bitmask of one authorization entry.
///
/// FullControl is returned alone when every generic-all bit is present. Otherwise Read is set when
/// any generic-read bit is present, Write when any generic-write bit is present and, when the
/// extended right bit is present, Enroll or Autoenroll according to the entry object type.
///
/// Both generic masks include READ_CONTROL, so an entry carrying plain GenericRead (0x20094), as
/// found on default templates, reports Read and Write. Write here does not mean the identity can
/// modify the template.
pub fn access_flags_for_rule(rule: &RawAccessRule) -> EffectiveAccess {
    let rights = rule.rights;
    if rights & RIGHTS_GENERIC_ALL == RIGHTS_GENERIC_ALL {
        return AccessFlag::FullControl.into();
    }

    let mut retval = EffectiveAccess::default();
    if rights & RIGHTS_GENERIC_READ != 0 {
        retval |= AccessFlag::Read;
    }
    if rights & RIGHTS_EXTENDED_RIGHT != 0 {
        if let Some(object_type) = &rule.object_type {
            let object_type = object_type.trim_matches(|c| c == '{' || c == '}');
            if object_type.eq_ignore_ascii_case(ENROLL_EXTENDED_RIGHT) {
                retval |= AccessFlag::Enroll;
            } else if object_type.eq_ignore_ascii_case(AUTOENROLL_EXTENDED_RIGHT) {
                retval |= AccessFlag::Autoenroll;
            }
        }
    }
    if rights & RIGHTS_GENERIC_WRITE != 0 {
        retval |= AccessFlag::Write;
    }
    retval
}

/// `apply_deny_rule` combines the rights denied by one Deny entry with the rights an identity
/// already holds.
pub fn apply_deny_rule(
    granted: EffectiveAccess,
    denied: EffectiveAccess,
    policy: DenyRulePolicy,
) -> EffectiveAccess {
    match policy {
        DenyRulePolicy::Subtract => granted - denied,
        DenyRulePolicy::Intersect => granted & denied,
    }
}

/// `resolve_access_rules` returns the effective rights of each identity named by an Allow entry in
/// `rules`. Entries without an identity are ignored.
pub fn resolve_access_rules(rules: &[RawAccessRule], policy: DenyRulePolicy) -> AccessRules {
    let mut access_rules = AccessRules::new();
    let mut deny_rules: Vec<(&String, &RawAccessRule)> = Vec::new();

    for rule in rules {
        let identity = match &rule.identity {
            Some(identity) => identity,
            None => continue,
        };
        match rule.access_control_type {
            AccessControlType::Deny => deny_rules.push((identity, rule)),
            AccessControlType::Allow => {
                *access_rules.entry(identity.clone()).or_default() |= access_flags_for_rule(rule);
            }
        }
    }

    for (identity, rule) in deny_rules {
        if let Some(granted) = access_rules.get_mut(identity) {
            *granted = apply_deny_rule(*granted, access_flags_for_rule(rule), policy);
        }
    }
    access_rules
}

#[cfg(test)]
fn domain_users_enroll() -> RawAccessRule {
    RawAccessRule::allow(
        "CONTOSO\\Domain Users",
        RIGHTS_EXTENDED_RIGHT,
        Some(ENROLL_EXTENDED_RIGHT),
    )
}

#[test]
fn classify_test() {
    let fc = RawAccessRule::allow("CONTOSO\\Enterprise Admins", 0x000F_01FF, None);
    assert_eq!(EffectiveAccess::from(AccessFlag::FullControl), access_flags_for_rule(&fc));

    // generic all with extended right GUID still reports FullControl only
    let fc = RawAccessRule::allow(
        "CONTOSO\\Enterprise Admins",
        0x000F_01FF,
        Some(ENROLL_EXTENDED_RIGHT),
    );
    assert_eq!(EffectiveAccess::from(AccessFlag::FullControl), access_flags_for_rule(&fc));

    let read = RawAccessRule::allow("NT AUTHORITY\\Authenticated Users", 0x0000_0094, None);
    assert_eq!(EffectiveAccess::from(AccessFlag::Read), access_flags_for_rule(&read));

    // read control is shared by generic read and generic write
    let read = RawAccessRule::allow("NT AUTHORITY\\Authenticated Users", RIGHTS_GENERIC_READ, None);
    assert_eq!(AccessFlag::Read | AccessFlag::Write, access_flags_for_rule(&read));

    assert_eq!(
        EffectiveAccess::from(AccessFlag::Enroll),
        access_flags_for_rule(&domain_users_enroll())
    );

    let auto = RawAccessRule::allow(
        "CONTOSO\\Domain Computers",
        RIGHTS_EXTENDED_RIGHT,
        Some("{A05B8CC2-17BC-4802-A710-E7C15AB866A2}"),
    );
    assert_eq!(EffectiveAccess::from(AccessFlag::Autoenroll), access_flags_for_rule(&auto));

    // unknown extended right
    let other = RawAccessRule::allow(
        "CONTOSO\\Domain Computers",
        RIGHTS_EXTENDED_RIGHT,
        Some("00299570-246d-11d0-a768-00aa006e0529"),
    );
    assert!(access_flags_for_rule(&other).is_empty());

    // write property alone overlaps generic write; read control overlaps both
    let write = RawAccessRule::allow("CONTOSO\\PKI Admins", 0x0000_0020, None);
    assert_eq!(EffectiveAccess::from(AccessFlag::Write), access_flags_for_rule(&write));
    let write = RawAccessRule::allow("CONTOSO\\PKI Admins", 0x0002_0028, None);
    assert_eq!(
        AccessFlag::Write | AccessFlag::Read,
        access_flags_for_rule(&write)
    );
}

#[test]
fn resolve_empty_test() {
    assert!(resolve_access_rules(&[], DenyRulePolicy::Subtract).is_empty());
    assert!(resolve_access_rules(&[], DenyRulePolicy::Intersect).is_empty());
}

#[test]
fn resolve_merge_test() {
    let rules = [
        RawAccessRule::allow("CONTOSO\\Domain Users", 0x0000_0094, None),
        domain_users_enroll(),
        RawAccessRule {
            identity: None,
            rights: RIGHTS_GENERIC_ALL,
            object_type: None,
            access_control_type: AccessControlType::Allow,
        },
    ];
    let ar = resolve_access_rules(&rules, DenyRulePolicy::Subtract);
    assert_eq!(1, ar.len());
    assert_eq!(
        AccessFlag::Read | AccessFlag::Enroll,
        ar["CONTOSO\\Domain Users"]
    );
}

#[test]
fn resolve_deny_only_test() {
    let rules = [
        RawAccessRule::deny("CONTOSO\\Guests", RIGHTS_GENERIC_ALL, None),
        RawAccessRule::allow("CONTOSO\\Domain Users", 0x0000_0094, None),
    ];
    for policy in [DenyRulePolicy::Subtract, DenyRulePolicy::Intersect] {
        let ar = resolve_access_rules(&rules, policy);
        assert!(!ar.contains_key("CONTOSO\\Guests"));
        assert_eq!(1, ar.len());
    }
}

#[test]
fn resolve_deny_policy_test() {
    let rules = [
        RawAccessRule::deny(
            "CONTOSO\\Domain Users",
            RIGHTS_EXTENDED_RIGHT,
            Some(ENROLL_EXTENDED_RIGHT),
        ),
        RawAccessRule::allow("CONTOSO\\Domain Users", 0x0000_0094, None),
        domain_users_enroll(),
    ];

    let ar = resolve_access_rules(&rules, DenyRulePolicy::Subtract);
    assert_eq!(
        EffectiveAccess::from(AccessFlag::Read),
        ar["CONTOSO\\Domain Users"]
    );

    let ar = resolve_access_rules(&rules, DenyRulePolicy::Intersect);
    assert_eq!(
        EffectiveAccess::from(AccessFlag::Enroll),
        ar["CONTOSO\\Domain Users"]
    );
}

#[test]
fn apply_deny_rule_test() {
    let granted = AccessFlag::Read | AccessFlag::Write | AccessFlag::Enroll;
    let denied = AccessFlag::Write | AccessFlag::Autoenroll;
    assert_eq!(
        AccessFlag::Read | AccessFlag::Enroll,
        apply_deny_rule(granted, denied, DenyRulePolicy::Subtract)
    );
    assert_eq!(
        EffectiveAccess::from(AccessFlag::Write),
        apply_deny_rule(granted, denied, DenyRulePolicy::Intersect)
    );
    assert_eq!(DenyRulePolicy::Subtract, DenyRulePolicy::default());
}
