#![cfg(feature = "std")]

use certtmpl::*;
use std::path::Path;

fn user_template() -> DirectoryEntrySnapshot {
    let mut e = DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String("User".to_string()))
        .with_attribute(
            ATTR_OBJECT_CLASS,
            AttributeValue::Strings(vec!["top".to_string(), "pKICertificateTemplate".to_string()]),
        )
        .with_attribute(
            ATTR_CERT_TEMPLATE_OID,
            AttributeValue::String("1.3.6.1.4.1.311.21.8.100.2".to_string()),
        )
        .with_attribute(ATTR_TEMPLATE_SCHEMA_VERSION, AttributeValue::Integer(1))
        .with_attribute(
            ATTR_EXTENDED_KEY_USAGE,
            AttributeValue::Strings(vec![
                "1.3.6.1.4.1.311.10.3.4".to_string(),
                "1.3.6.1.5.5.7.3.4".to_string(),
                "1.3.6.1.5.5.7.3.2".to_string(),
            ]),
        )
        .with_attribute(ATTR_KEY_USAGE, AttributeValue::Bytes(vec![0xA0, 0x00]))
        .with_attribute(ATTR_FLAGS, AttributeValue::Integer(0x0001_023A));
    e.set_access_rules(Some(vec![RawAccessRule::allow(
        "CONTOSO\\Domain Users",
        RIGHTS_EXTENDED_RIGHT,
        Some("{0E10C968-78FB-11D2-90D4-00C04F79DC55}"),
    )]));
    e
}

#[test]
fn snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let fname = dir.path().join("pks.json");

    let settings = PolicySettings::new();
    let mut snapshot = PublicKeyServicesSnapshot::new(&settings);
    snapshot.add_entry(user_template());
    let mut unreadable = user_template();
    unreadable.set_attribute(ATTR_NAME, AttributeValue::String("Locked".to_string()));
    unreadable.set_access_rules(None);
    snapshot.add_entry(unreadable);
    write_snapshot(&fname, &snapshot).unwrap();

    let read = read_snapshot(&fname, &settings).unwrap();
    assert_eq!(snapshot.entries(), read.entries());

    let mut pe = PolicyEnvironment::new(settings);
    pe.add_public_key_services_source(Box::new(read));
    let pks = pe.get_public_key_services();
    assert_eq!(1, pks.certificate_templates.len());
    assert_eq!(
        vec![Error::AccessRuleRetrieval {
            name: "Locked".to_string(),
            oid: "1.3.6.1.4.1.311.21.8.100.2".to_string(),
            reason: "NotFound".to_string()
        }],
        pks.failures
    );

    let user = &pks.certificate_templates[0];
    assert_eq!(
        EnhancedKeyUsageFlag::EFS
            | EnhancedKeyUsageFlag::SecureEmail
            | EnhancedKeyUsageFlag::ClientAuthentication,
        user.enhanced_key_usage.value
    );
    assert!(user.general_flags.contains(CertificateTemplateFlag::IsDefault));
    assert!(user.general_flags.contains(CertificateTemplateFlag::Autoenrollment));
    assert!(!user.is_ca());
    assert_eq!(
        EffectiveAccess::from(AccessFlag::Enroll),
        user.access_rules["CONTOSO\\Domain Users"]
    );
    assert_eq!("Windows 2000", user.minimum_supported_client);

    // the decoded model serializes
    let json = serde_json::to_string(&pks).unwrap();
    let back: PublicKeyServices = serde_json::from_str(&json).unwrap();
    assert_eq!(pks.certificate_templates, back.certificate_templates);
    assert!(back.failures.is_empty());
}

#[test]
fn snapshot_read_errors() {
    let settings = PolicySettings::new();
    assert_eq!(
        Err(Error::StdIoError(std::io::ErrorKind::NotFound)),
        read_snapshot(Path::new("tests/does_not_exist.json"), &settings).map(|_| ())
    );

    let dir = tempfile::tempdir().unwrap();
    let fname = dir.path().join("bad.json");
    std::fs::write(&fname, b"{ not json").unwrap();
    assert_eq!(
        Err(Error::ParseError),
        read_snapshot(&fname, &settings).map(|_| ())
    );
}

#[test]
fn settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let fname = dir.path().join("settings.json");

    let mut settings = PolicySettings::new();
    settings.set_forest_root_dn("DC=contoso,DC=com".to_string());
    settings.set_domain_controller("dc01.contoso.com".to_string());
    settings.set_deny_rule_policy(DenyRulePolicy::Intersect);
    settings.set_template_names(vec!["User".to_string(), "WebServer".to_string()]);
    std::fs::write(&fname, serde_json::to_vec(&settings).unwrap()).unwrap();

    let fname = fname.to_str().unwrap().to_string();
    let read = read_settings(&Some(fname)).unwrap();
    assert_eq!(settings, read);
    assert_eq!(DenyRulePolicy::Intersect, read.get_deny_rule_policy());
    assert!(read.is_template_selected("WebServer"));
    assert!(!read.is_template_selected("Machine"));

    // absent file yields defaults
    let read = read_settings(&Some("tests/does_not_exist.json".to_string())).unwrap();
    assert_eq!(PolicySettings::new(), read);
    assert_eq!(PolicySettings::new(), read_settings(&None).unwrap());
}

#[test]
fn certificate_file_errors() {
    assert_eq!(
        Err(Error::StdIoError(std::io::ErrorKind::NotFound)),
        read_certificate_file(Path::new("tests/does_not_exist.der")).map(|_| ())
    );

    let dir = tempfile::tempdir().unwrap();
    let fname = dir.path().join("garbage.der");
    std::fs::write(&fname, [0x30, 0x03, 0x02, 0x01, 0x01]).unwrap();
    assert!(matches!(
        read_certificate_file(&fname),
        Err(Error::Asn1Error(_))
    ));
}
