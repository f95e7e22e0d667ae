//! Associates certificate templates with the enrollment services that publish them
//!
//! Publication is recorded only on enrollment service objects, as a list of template names. The
//! association is built by indexing those lists by name once, then looking up each template.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use crate::{CertificateTemplatePolicy, EnrollmentServiceRecord};

/// `PublishedTemplateIndex` maps template names to the identifiers of the enrollment services that
/// publish them.
pub type PublishedTemplateIndex<'a> = BTreeMap<&'a str, BTreeSet<String>>;

/// `index_published_templates` builds a [`PublishedTemplateIndex`] from a list of enrollment
/// services.
pub fn index_published_templates(services: &[EnrollmentServiceRecord]) -> PublishedTemplateIndex<'_> {
    let mut index = PublishedTemplateIndex::new();
    for service in services {
        for name in &service.published_templates {
            index
                .entry(name.as_str())
                .or_default()
                .insert(service.id.clone());
        }
    }
    index
}

/// `assign_enrollment_services` replaces the enrollment service set of each template with the
/// identifiers of the services whose published template list contains the template name, compared
/// exactly.
pub fn assign_enrollment_services(
    templates: &mut [CertificateTemplatePolicy],
    services: &[EnrollmentServiceRecord],
) {
    let index = index_published_templates(services);
    for template in templates.iter_mut() {
        template.enrollment_services = index
            .get(template.identity.name.as_str())
            .cloned()
            .unwrap_or_default();
    }
}

/// `get_assigned_enrollment_services` returns the services recorded as publishing `template`.
pub fn get_assigned_enrollment_services<'a>(
    template: &CertificateTemplatePolicy,
    services: &'a [EnrollmentServiceRecord],
) -> Vec<&'a EnrollmentServiceRecord> {
    services
        .iter()
        .filter(|s| template.enrollment_services.contains(&s.id))
        .collect()
}

#[test]
fn association_test() {
    use crate::enrollment::enrollment_service::test_enrollment_service;
    use crate::decode_enrollment_service;
    use alloc::string::ToString;

    let a = decode_enrollment_service(&test_enrollment_service("A", &["WebServer", "User"])).unwrap();
    let b = decode_enrollment_service(&test_enrollment_service("B", &["User"])).unwrap();
    let services = [a, b];

    let mut templates: Vec<CertificateTemplatePolicy> = ["WebServer", "User", "Machine", "webserver"]
        .iter()
        .map(|n| {
            let mut t = CertificateTemplatePolicy::default();
            t.identity.name = n.to_string();
            t
        })
        .collect();
    assign_enrollment_services(&mut templates, &services);

    assert_eq!(1, templates[0].enrollment_services.len());
    assert!(templates[0].is_published_by(&services[0].id));
    assert!(!templates[0].is_published_by(&services[1].id));
    assert_eq!(2, templates[1].enrollment_services.len());
    assert!(templates[2].enrollment_services.is_empty());
    assert!(templates[3].enrollment_services.is_empty());

    let assigned = get_assigned_enrollment_services(&templates[0], &services);
    assert_eq!(1, assigned.len());
    assert_eq!("A", assigned[0].name());

    // reassignment replaces rather than accumulates
    assign_enrollment_services(&mut templates, &services[1..]);
    assert!(templates[0].enrollment_services.is_empty());
    assert_eq!(1, templates[1].enrollment_services.len());
}
