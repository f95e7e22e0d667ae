#![cfg(feature = "std")]

use certtmpl::*;

const ROOT: &str = "DC=contoso,DC=com";

fn pks_dn(container: &str, name: &str) -> String {
    format!("CN={name},CN={container},CN=Public Key Services,CN=Services,CN=Configuration,{ROOT}")
}

fn template(name: &str, oid: &str, schema_version: i64) -> DirectoryEntrySnapshot {
    let mut e = DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String(name.to_string()))
        .with_attribute(
            ATTR_DISTINGUISHED_NAME,
            AttributeValue::String(pks_dn("Certificate Templates", name)),
        )
        .with_attribute(
            ATTR_OBJECT_CLASS,
            AttributeValue::Strings(vec!["top".to_string(), "pKICertificateTemplate".to_string()]),
        )
        .with_attribute(ATTR_CERT_TEMPLATE_OID, AttributeValue::String(oid.to_string()))
        .with_attribute(ATTR_TEMPLATE_SCHEMA_VERSION, AttributeValue::Integer(schema_version))
        .with_attribute(
            ATTR_EXPIRATION_PERIOD,
            AttributeValue::Bytes(vec![0x00, 0x40, 0x39, 0x87, 0x2E, 0xE1, 0xFE, 0xFF]),
        )
        .with_attribute(ATTR_KEY_USAGE, AttributeValue::Bytes(vec![0xA0, 0x00]));
    e.set_access_rules(Some(vec![
        RawAccessRule::allow("NT AUTHORITY\\Authenticated Users", RIGHTS_GENERIC_READ, None),
        RawAccessRule::allow("CONTOSO\\Enterprise Admins", RIGHTS_GENERIC_ALL, None),
        RawAccessRule::allow(
            "CONTOSO\\Domain Users",
            RIGHTS_EXTENDED_RIGHT,
            Some(ENROLL_EXTENDED_RIGHT),
        ),
        RawAccessRule::allow(
            "CONTOSO\\Domain Users",
            RIGHTS_EXTENDED_RIGHT,
            Some(AUTOENROLL_EXTENDED_RIGHT),
        ),
        RawAccessRule::deny(
            "CONTOSO\\Domain Users",
            RIGHTS_EXTENDED_RIGHT,
            Some(AUTOENROLL_EXTENDED_RIGHT),
        ),
        RawAccessRule::deny("CONTOSO\\Guests", RIGHTS_GENERIC_ALL, None),
    ]));
    e
}

fn enrollment_service(name: &str, published: &[&str]) -> DirectoryEntrySnapshot {
    DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String(name.to_string()))
        .with_attribute(
            ATTR_DISTINGUISHED_NAME,
            AttributeValue::String(pks_dn("Enrollment Services", name)),
        )
        .with_attribute(
            ATTR_OBJECT_CLASS,
            AttributeValue::Strings(vec!["top".to_string(), "pKIEnrollmentService".to_string()]),
        )
        .with_attribute(
            ATTR_OBJECT_GUID,
            AttributeValue::Bytes(vec![name.as_bytes()[0]; 16]),
        )
        .with_attribute(
            ATTR_DNS_HOST_NAME,
            AttributeValue::String(format!("{}.contoso.com", name.to_lowercase())),
        )
        .with_attribute(
            ATTR_CA_CERTIFICATE_DN,
            AttributeValue::String(format!("CN={name},{ROOT}")),
        )
        .with_attribute(ATTR_FLAGS, AttributeValue::Integer(0x0A))
        .with_attribute(
            ATTR_CERTIFICATE_TEMPLATES,
            AttributeValue::Strings(published.iter().map(|s| s.to_string()).collect()),
        )
}

fn oid(name: &str, value: &str, display_name: &str) -> DirectoryEntrySnapshot {
    DirectoryEntrySnapshot::new()
        .with_attribute(ATTR_NAME, AttributeValue::String(name.to_string()))
        .with_attribute(ATTR_DISTINGUISHED_NAME, AttributeValue::String(pks_dn("OID", name)))
        .with_attribute(
            ATTR_OBJECT_CLASS,
            AttributeValue::Strings(vec!["top".to_string(), "msPKI-Enterprise-Oid".to_string()]),
        )
        .with_attribute(ATTR_DISPLAY_NAME, AttributeValue::String(display_name.to_string()))
        .with_attribute(ATTR_CERT_TEMPLATE_OID, AttributeValue::String(value.to_string()))
        .with_attribute(ATTR_FLAGS, AttributeValue::Integer(3))
}

fn forest_settings() -> PolicySettings {
    let mut settings = PolicySettings::new();
    settings.set_forest_root_dn(ROOT.to_string());
    settings
}

fn forest_snapshot(settings: &PolicySettings) -> PublicKeyServicesSnapshot {
    let mut snapshot = PublicKeyServicesSnapshot::new(settings);

    let mut web = template("WebServer", "1.3.6.1.4.1.311.21.8.100.1", 2);
    web.set_attribute(
        ATTR_EXTENDED_KEY_USAGE,
        AttributeValue::Strings(vec![
            "1.3.6.1.5.5.7.3.1".to_string(),
            "1.3.6.1.4.1.99999.7".to_string(),
        ]),
    );
    snapshot.add_entry(web);
    snapshot.add_entry(template("User", "1.3.6.1.4.1.311.21.8.100.2", 1));
    snapshot.add_entry(template("Machine", "1.3.6.1.4.1.311.21.8.100.3", 1));

    // missing msPKI-Cert-Template-OID
    let mut broken = template("Broken", "", 2);
    broken.attributes.remove(ATTR_CERT_TEMPLATE_OID);
    snapshot.add_entry(broken);

    // template container object of another class
    snapshot.add_entry(
        DirectoryEntrySnapshot::new()
            .with_attribute(ATTR_NAME, AttributeValue::String("Stray".to_string()))
            .with_attribute(
                ATTR_DISTINGUISHED_NAME,
                AttributeValue::String(pks_dn("Certificate Templates", "Stray")),
            )
            .with_attribute(
                ATTR_OBJECT_CLASS,
                AttributeValue::Strings(vec!["top".to_string(), "container".to_string()]),
            ),
    );

    snapshot.add_entry(enrollment_service("A", &["WebServer", "User"]));
    snapshot.add_entry(enrollment_service("B", &["User"]));
    snapshot.add_entry(oid("7.ABCDEF", "1.3.6.1.4.1.99999.7", "Contoso Web Client"));
    snapshot
}

#[test]
fn scan_forest() {
    let settings = forest_settings();
    let snapshot = forest_snapshot(&settings);
    let mut pe = PolicyEnvironment::new(settings);
    pe.add_public_key_services_source(Box::new(snapshot));
    let pks = pe.get_public_key_services();

    assert_eq!(3, pks.certificate_templates.len());
    assert_eq!(2, pks.enrollment_services.len());
    assert_eq!(1, pks.oids.len());
    assert_eq!(1, pks.failures.len());
    match &pks.failures[0] {
        Error::MalformedTemplate { object, attribute, .. } => {
            assert!(object.starts_with("CN=Broken,"));
            assert_eq!(ATTR_CERT_TEMPLATE_OID, attribute);
        }
        other => panic!("unexpected failure: {:?}", other),
    }

    let a = &pks.enrollment_services[0];
    let b = &pks.enrollment_services[1];
    assert_eq!("41414141-4141-4141-4141-414141414141", a.id);
    assert_eq!("a.contoso.com\\A", a.ca_config_name());

    let web = pks.get_certificate_template("WebServer").unwrap();
    assert!(web.is_published_by(&a.id));
    assert!(!web.is_published_by(&b.id));
    let user = pks.get_certificate_template("User").unwrap();
    assert_eq!(2, user.enrollment_services.len());
    let machine = pks.get_certificate_template_by_oid("1.3.6.1.4.1.311.21.8.100.3").unwrap();
    assert!(machine.enrollment_services.is_empty());

    let published = pks.get_published_certificate_templates(&b.id).unwrap();
    assert_eq!(1, published.len());
    assert_eq!("User", published[0].name());

    assert_eq!(
        EnhancedKeyUsageFlags::from(EnhancedKeyUsageFlag::ServerAuthentication),
        web.enhanced_key_usage.value
    );
    assert_eq!(1, web.enhanced_key_usage.custom.len());
    assert_eq!(
        Some("Contoso Web Client".to_string()),
        web.enhanced_key_usage.custom[0].friendly_name
    );

    assert_eq!(
        std::time::Duration::from_secs(365 * 24 * 60 * 60),
        web.validity_period
    );
    assert_eq!(
        KeyUsageFlag::DigitalSignature | KeyUsageFlag::KeyEncipherment,
        web.key_usage.value
    );
}

#[test]
fn access_rules_follow_deny_policy() {
    let settings = forest_settings();
    let snapshot = forest_snapshot(&settings);
    let mut pe = PolicyEnvironment::new(settings.clone());
    pe.add_public_key_services_source(Box::new(snapshot.clone()));
    let pks = pe.get_public_key_services();
    let web = pks.get_certificate_template("WebServer").unwrap();

    assert_eq!(3, web.access_rules.len());
    assert!(!web.access_rules.contains_key("CONTOSO\\Guests"));
    assert_eq!(
        EffectiveAccess::from(AccessFlag::FullControl),
        web.access_rules["CONTOSO\\Enterprise Admins"]
    );
    // generic read includes read control, which overlaps generic write
    assert_eq!(
        AccessFlag::Read | AccessFlag::Write,
        web.access_rules["NT AUTHORITY\\Authenticated Users"]
    );
    assert_eq!(
        EffectiveAccess::from(AccessFlag::Enroll),
        web.access_rules["CONTOSO\\Domain Users"]
    );

    let mut settings = settings;
    settings.set_deny_rule_policy(DenyRulePolicy::Intersect);
    let mut pe = PolicyEnvironment::new(settings);
    pe.add_public_key_services_source(Box::new(snapshot));
    let pks = pe.get_public_key_services();
    let web = pks.get_certificate_template("WebServer").unwrap();
    assert_eq!(
        EffectiveAccess::from(AccessFlag::Autoenroll),
        web.access_rules["CONTOSO\\Domain Users"]
    );
}

#[test]
fn scan_options() {
    let mut settings = forest_settings();
    settings.set_resolve_custom_oid_names(false);
    settings.set_template_names(vec!["WebServer".to_string()]);
    let snapshot = forest_snapshot(&settings);
    let mut pe = PolicyEnvironment::new(settings);
    pe.add_public_key_services_source(Box::new(snapshot));
    let pks = pe.get_public_key_services();

    assert_eq!(1, pks.certificate_templates.len());
    assert!(pks.failures.is_empty());
    let web = &pks.certificate_templates[0];
    assert_eq!(None, web.enhanced_key_usage.custom[0].friendly_name);
    assert_eq!(
        "Contoso Web Client",
        pe.oid_friendly_name(&web.enhanced_key_usage.custom[0].oid, &pks.oids)
    );
}

#[test]
fn scan_without_forest_root() {
    // entries are routed by object class when no forest root is configured
    let settings = PolicySettings::new();
    let snapshot = forest_snapshot(&settings);
    let mut pe = PolicyEnvironment::new(settings);
    pe.add_public_key_services_source(Box::new(snapshot));
    let pks = pe.get_public_key_services();
    assert_eq!(3, pks.certificate_templates.len());
    assert_eq!(2, pks.enrollment_services.len());
    assert_eq!(1, pks.oids.len());

    // with the class check disabled the stray object is decoded and fails
    let mut settings = forest_settings();
    settings.set_require_object_class(false);
    let snapshot = forest_snapshot(&settings);
    let mut pe = PolicyEnvironment::new(settings);
    pe.add_public_key_services_source(Box::new(snapshot));
    let pks = pe.get_public_key_services();
    assert_eq!(3, pks.certificate_templates.len());
    assert_eq!(2, pks.failures.len());
}

fn ca_certificate(subject: &str) -> x509_cert::Certificate {
    use der::asn1::BitString;
    use std::str::FromStr;
    use x509_cert::name::Name;
    use x509_cert::serial_number::SerialNumber;
    use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
    use x509_cert::time::Validity;
    use x509_cert::{Certificate, TbsCertificate, Version};

    let alg = AlgorithmIdentifierOwned {
        oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
        parameters: None,
    };
    let name = Name::from_str(subject).unwrap();
    Certificate {
        tbs_certificate: TbsCertificate {
            version: Version::V3,
            serial_number: SerialNumber::new(&[1]).unwrap(),
            signature: alg.clone(),
            issuer: name.clone(),
            validity: Validity::from_now(std::time::Duration::from_secs(3600)).unwrap(),
            subject: name,
            subject_public_key_info: SubjectPublicKeyInfoOwned {
                algorithm: AlgorithmIdentifierOwned {
                    oid: const_oid::db::rfc5912::RSA_ENCRYPTION,
                    parameters: None,
                },
                subject_public_key: BitString::from_bytes(&[4, 1, 2]).unwrap(),
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        },
        signature_algorithm: alg,
        signature: BitString::from_bytes(&[0]).unwrap(),
    }
}

#[test]
fn enrollment_service_for_ca_certificate() {
    let settings = forest_settings();
    let snapshot = forest_snapshot(&settings);
    let mut pe = PolicyEnvironment::new(settings);
    pe.add_public_key_services_source(Box::new(snapshot));
    let pks = pe.get_public_key_services();

    // subject DN matches cACertificateDN
    let ca = pks
        .get_enrollment_service_for_certificate(&ca_certificate("CN=B,DC=contoso,DC=com"))
        .unwrap();
    assert_eq!("B", ca.name());

    // DN differs, common name matches the service name
    let ca = pks
        .get_enrollment_service_for_certificate(&ca_certificate("CN=a,O=Contoso Renewal"))
        .unwrap();
    assert_eq!("A", ca.name());

    assert_eq!(
        Err(Error::NotFound),
        pks.get_enrollment_service_for_certificate(&ca_certificate("CN=Z,DC=contoso,DC=com"))
            .map(|_| ())
    );
    assert_eq!(
        Err(Error::NotFound),
        pks.get_enrollment_service_for_certificate(&ca_certificate("O=Contoso,DC=com"))
            .map(|_| ())
    );
}
