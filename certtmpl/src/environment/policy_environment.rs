//! PolicyEnvironment aggregates the attribute sources and OID lookup functions used to read the
//! Public Key Services container of a forest into a [`PublicKeyServices`] result set.
//!
//! The sample below illustrates reading a saved snapshot.
//! ```no_run
//! use certtmpl::*;
//!
//! let settings = read_settings(&Some("settings.json".to_string())).unwrap();
//! let snapshot = read_snapshot(std::path::Path::new("pks.json"), &settings).unwrap();
//!
//! let mut pe = PolicyEnvironment::new(settings);
//! pe.add_public_key_services_source(Box::new(snapshot));
//! let pks = pe.get_public_key_services();
//! for t in &pks.certificate_templates {
//!     println!("{}: {} enrollment service(s)", t.name(), t.enrollment_services.len());
//! }
//! ```
//!
//! Objects are decoded in three passes (OID registry, enrollment services, templates), after which
//! templates are associated with the enrollment services that publish them and custom OIDs are
//! given friendly names from the registry. An object that fails to decode is logged, recorded in
//! [`PublicKeyServices::failures`] and skipped.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::{vec, vec::Vec};

use const_oid::ObjectIdentifier;
#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};
use x509_cert::Certificate;

use crate::util::logging::*;
use crate::{
    assign_enrollment_services, decode_certificate_template, decode_enrollment_service,
    decode_oid_record, eku_friendly_name, find_template_for_certificate, get_common_name,
    resolve_custom_oid_names, resolve_friendly_name, CertificateTemplatePolicy, DirectoryObject,
    EnrollmentServiceRecord, Error, OidRecord, PolicySettings, PublicKeyServicesSource, Result,
    CLASS_CERTIFICATE_TEMPLATE, CLASS_ENROLLMENT_SERVICE, CLASS_ENTERPRISE_OID,
};

/// `OidLookup` is the signature of functions that return a friendly name for an OID
pub type OidLookup = fn(&ObjectIdentifier) -> Result<String>;

/// Decoded contents of the Public Key Services container of a forest
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct PublicKeyServices {
    /// Decoded certificate templates, associated with enrollment services
    pub certificate_templates: Vec<CertificateTemplatePolicy>,
    /// Decoded enrollment services
    pub enrollment_services: Vec<EnrollmentServiceRecord>,
    /// Decoded OID registry objects
    pub oids: Vec<OidRecord>,
    /// Errors for objects that were skipped
    #[cfg_attr(feature = "std", serde(skip))]
    pub failures: Vec<Error>,
}

impl PublicKeyServices {
    /// Returns the template with the given name
    pub fn get_certificate_template(&self, name: &str) -> Result<&CertificateTemplatePolicy> {
        self.certificate_templates
            .iter()
            .find(|t| t.name() == name)
            .ok_or(Error::NotFound)
    }

    /// Returns the template with the given OID
    pub fn get_certificate_template_by_oid(&self, oid: &str) -> Result<&CertificateTemplatePolicy> {
        self.certificate_templates
            .iter()
            .find(|t| t.oid == oid)
            .ok_or(Error::NotFound)
    }

    /// Returns the enrollment service with the given identifier
    pub fn get_enrollment_service(&self, id: &str) -> Result<&EnrollmentServiceRecord> {
        self.enrollment_services
            .iter()
            .find(|s| s.id == id)
            .ok_or(Error::NotFound)
    }

    /// Returns the templates published by the enrollment service with the given identifier
    pub fn get_published_certificate_templates(
        &self,
        id: &str,
    ) -> Result<Vec<&CertificateTemplatePolicy>> {
        let service = self.get_enrollment_service(id)?;
        Ok(service.get_published_certificate_templates(&self.certificate_templates))
    }

    /// Returns the template `cert` was issued from
    pub fn get_template_for_certificate(&self, cert: &Certificate) -> Result<&CertificateTemplatePolicy> {
        find_template_for_certificate(cert, &self.certificate_templates)
    }

    /// Returns the enrollment service whose CA certificate is `cert`. The subject DN is matched
    /// against `cACertificateDN` first, then the subject common name against the service name.
    pub fn get_enrollment_service_for_certificate(
        &self,
        cert: &Certificate,
    ) -> Result<&EnrollmentServiceRecord> {
        let subject = &cert.tbs_certificate.subject;
        let subject_dn = subject.to_string();
        if let Some(s) = self
            .enrollment_services
            .iter()
            .find(|s| s.has_ca_subject(&subject_dn))
        {
            return Ok(s);
        }

        let cn = get_common_name(subject).ok_or(Error::NotFound)?;
        self.enrollment_services
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(&cn))
            .ok_or(Error::NotFound)
    }
}

/// [`PolicyEnvironment`] provides a switchboard of trait objects and callback functions that
/// allow the means of reading directory data to vary.
pub struct PolicyEnvironment {
    settings: PolicySettings,

    /// List of trait objects that provide access to Public Key Services container objects
    #[cfg(feature = "std")]
    sources: Vec<Box<(dyn PublicKeyServicesSource + Send + Sync)>>,
    #[cfg(not(feature = "std"))]
    sources: Vec<Box<(dyn PublicKeyServicesSource)>>,

    /// List of functions that provide OID lookup capabilities
    oid_lookups: Vec<OidLookup>,
}

impl Default for PolicyEnvironment {
    /// PolicyEnvironment::default returns a new [`PolicyEnvironment`] with default settings, no
    /// sources and [`eku_friendly_name`] as the only OID lookup function.
    fn default() -> Self {
        PolicyEnvironment::new(PolicySettings::default())
    }
}

impl PolicyEnvironment {
    /// PolicyEnvironment::new returns a [`PolicyEnvironment`] with the given settings, no sources
    /// and [`eku_friendly_name`] as the only OID lookup function.
    pub fn new(settings: PolicySettings) -> PolicyEnvironment {
        PolicyEnvironment {
            settings,
            sources: vec![],
            oid_lookups: vec![eku_friendly_name],
        }
    }

    /// Returns the settings in use
    pub fn get_settings(&self) -> &PolicySettings {
        &self.settings
    }

    /// add_public_key_services_source adds a [`PublicKeyServicesSource`] object to the list.
    #[cfg(feature = "std")]
    pub fn add_public_key_services_source(
        &mut self,
        c: Box<(dyn PublicKeyServicesSource + Send + Sync)>,
    ) {
        self.sources.push(c);
    }

    /// add_public_key_services_source adds a [`PublicKeyServicesSource`] object to the list.
    #[cfg(not(feature = "std"))]
    pub fn add_public_key_services_source(&mut self, c: Box<(dyn PublicKeyServicesSource)>) {
        self.sources.push(c);
    }

    /// clear_public_key_services_sources clears the list of [`PublicKeyServicesSource`] objects.
    pub fn clear_public_key_services_sources(&mut self) {
        self.sources.clear();
    }

    /// add_oid_lookup adds a oid_lookup callback to the list supported by this instance.
    pub fn add_oid_lookup(&mut self, c: OidLookup) {
        self.oid_lookups.push(c);
    }

    /// clear_oid_lookups clears the list of oid_lookup callbacks supported by this instance.
    pub fn clear_oid_lookups(&mut self) {
        self.oid_lookups.clear();
    }

    /// oid_lookup takes an ObjectIdentifier and returns a friendly name from the first lookup
    /// function that recognizes it, or the dotted form when none do.
    pub fn oid_lookup(&self, oid: &ObjectIdentifier) -> String {
        for f in &self.oid_lookups {
            let r = f(oid);
            if let Ok(r) = r {
                return r;
            }
        }
        oid.to_string()
    }

    /// oid_friendly_name returns the friendly name of an OID read from the directory, preferring
    /// the forest OID registry over the lookup functions. Values that are not valid OIDs are
    /// returned unchanged.
    pub fn oid_friendly_name(&self, oid: &str, registry: &[OidRecord]) -> String {
        if let Some(r) = resolve_friendly_name(oid, registry) {
            return r.display_name().to_string();
        }
        match ObjectIdentifier::new(oid) {
            Ok(o) => self.oid_lookup(&o),
            Err(_e) => oid.to_string(),
        }
    }

    fn collect<'a>(
        &self,
        kind: &str,
        class: &str,
        objects: Result<Vec<&'a dyn DirectoryObject>>,
        failures: &mut Vec<Error>,
    ) -> Vec<&'a dyn DirectoryObject> {
        let objects = match objects {
            Ok(objects) => objects,
            Err(e) => {
                log_message(
                    &PsLogLevels::PsError,
                    &format!("Failed to enumerate {} objects: {}", kind, e),
                );
                failures.push(e);
                return vec![];
            }
        };
        if !self.settings.get_require_object_class() {
            return objects;
        }
        objects
            .into_iter()
            .filter(|obj| {
                let keep = obj.is_object_class(class);
                if !keep {
                    log_message(
                        &PsLogLevels::PsDebug,
                        &format!("Ignoring {} in {} container: not of class {}", obj.label(), kind, class),
                    );
                }
                keep
            })
            .collect()
    }

    /// get_public_key_services reads and decodes the objects offered by each source.
    pub fn get_public_key_services(&self) -> PublicKeyServices {
        let mut retval = PublicKeyServices::default();

        for source in &self.sources {
            let objects = self.collect(
                "OID",
                CLASS_ENTERPRISE_OID,
                source.get_oid_objects(),
                &mut retval.failures,
            );
            for obj in objects {
                match decode_oid_record(obj) {
                    Ok(r) => retval.oids.push(r),
                    Err(e) => {
                        log_skipped_object("OID", &obj.label(), &e);
                        retval.failures.push(e);
                    }
                }
            }

            let objects = self.collect(
                "enrollment service",
                CLASS_ENROLLMENT_SERVICE,
                source.get_enrollment_services(),
                &mut retval.failures,
            );
            for obj in objects {
                match decode_enrollment_service(obj) {
                    Ok(s) => retval.enrollment_services.push(s),
                    Err(e) => {
                        log_skipped_object("enrollment service", &obj.label(), &e);
                        retval.failures.push(e);
                    }
                }
            }

            let objects = self.collect(
                "certificate template",
                CLASS_CERTIFICATE_TEMPLATE,
                source.get_certificate_templates(),
                &mut retval.failures,
            );
            for obj in objects {
                if let Ok(Some(name)) = obj.get_string(crate::ATTR_NAME) {
                    if !self.settings.is_template_selected(&name) {
                        continue;
                    }
                }
                match decode_certificate_template(obj, &self.settings) {
                    Ok(t) => retval.certificate_templates.push(t),
                    Err(e) => {
                        log_skipped_object("certificate template", &obj.label(), &e);
                        retval.failures.push(e);
                    }
                }
            }
        }

        assign_enrollment_services(
            &mut retval.certificate_templates,
            &retval.enrollment_services,
        );
        if self.settings.get_resolve_custom_oid_names() {
            resolve_custom_oid_names(&mut retval.certificate_templates, &retval.oids);
        }
        log_message(
            &PsLogLevels::PsInfo,
            &format!(
                "Decoded {} certificate templates, {} enrollment services and {} OIDs ({} skipped)",
                retval.certificate_templates.len(),
                retval.enrollment_services.len(),
                retval.oids.len(),
                retval.failures.len()
            ),
        );
        retval
    }
}

#[test]
fn oid_lookup_test() {
    use crate::{ID_KP_CLIENT_AUTH, MS_KP_SMARTCARD_LOGON};

    let mut pe = PolicyEnvironment::default();
    assert_eq!("Client Authentication", pe.oid_lookup(&ID_KP_CLIENT_AUTH));
    assert_eq!("Smartcard Logon", pe.oid_friendly_name("1.3.6.1.4.1.311.20.2.2", &[]));
    assert_eq!("1.2.3.4", pe.oid_friendly_name("1.2.3.4", &[]));
    assert_eq!("bogus", pe.oid_friendly_name("bogus", &[]));

    pe.clear_oid_lookups();
    assert_eq!("1.3.6.1.4.1.311.20.2.2", pe.oid_lookup(&MS_KP_SMARTCARD_LOGON));

    fn everything(_oid: &ObjectIdentifier) -> Result<String> {
        Ok("Everything".to_string())
    }
    pe.add_oid_lookup(everything);
    assert_eq!("Everything", pe.oid_lookup(&MS_KP_SMARTCARD_LOGON));

    let registry = [crate::decode_oid_record(&crate::registry::oid_registry::test_oid_entry(
        "1.2.3.4",
        "Contoso Policy",
        2,
    ))
    .unwrap()];
    assert_eq!("Contoso Policy", pe.oid_friendly_name("1.2.3.4", &registry));
}

#[test]
fn empty_environment_test() {
    let mut pe = PolicyEnvironment::default();
    let pks = pe.get_public_key_services();
    assert_eq!(PublicKeyServices::default(), pks);

    pe.add_public_key_services_source(Box::new(crate::PublicKeyServicesSnapshot::default()));
    assert_eq!(PublicKeyServices::default(), pe.get_public_key_services());
    pe.clear_public_key_services_sources();
    assert_eq!(Err(Error::NotFound), pks.get_certificate_template("User").map(|_| ()));
}
