//! Error types

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// Error type
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// MissingAttribute occurs when a directory object lacks an attribute that has no sensible default.
    MissingAttribute(String),
    /// AttributeShape occurs when an attribute is present but holds a value of a different shape
    /// than the one requested, i.e., a byte sequence where an integer was expected.
    AttributeShape {
        /// Name of the attribute
        attribute: String,
        /// Shape the caller asked for
        expected: &'static str,
    },
    /// MalformedTemplate occurs when a certificate template object cannot be decoded.
    MalformedTemplate {
        /// Distinguished name (or name) of the offending object
        object: String,
        /// Attribute that was absent or invalid
        attribute: String,
        /// Description of the problem
        reason: String,
    },
    /// MalformedEnrollmentService occurs when an enrollment service object cannot be decoded.
    MalformedEnrollmentService {
        /// Distinguished name (or name) of the offending object
        object: String,
        /// Attribute that was absent or invalid
        attribute: String,
        /// Description of the problem
        reason: String,
    },
    /// MalformedOid occurs when an OID registry object cannot be decoded.
    MalformedOid {
        /// Distinguished name (or name) of the offending object
        object: String,
        /// Attribute that was absent or invalid
        attribute: String,
        /// Description of the problem
        reason: String,
    },
    /// AccessRuleRetrieval occurs when the authorization entries of a certificate template could
    /// not be read, i.e., because the directory denied access to the security descriptor.
    AccessRuleRetrieval {
        /// Name of the certificate template
        name: String,
        /// OID of the certificate template
        oid: String,
        /// Description of the problem reported by the attribute source
        reason: String,
    },
    /// TemplateExtensionNotFound occurs when a certificate features neither the certificate
    /// template information extension nor the certificate template name extension.
    TemplateExtensionNotFound,
    /// NotFound occurs when an action failed because a necessary artifact was not found.
    NotFound,
    /// An artifact could not be parsed
    ParseError,
    /// Asn1Error is used to propagate error information from the der and x509-cert crates.
    Asn1Error(der::Error),
    /// Error encapsulates an error derived from [std::io::ErrorKind]
    #[cfg(feature = "std")]
    StdIoError(std::io::ErrorKind),
}

impl Error {
    /// Splits a MissingAttribute or AttributeShape error into the attribute name and a description
    /// of the problem. Other errors yield an empty attribute name.
    pub(crate) fn attribute_detail(&self) -> (String, String) {
        match self {
            Error::MissingAttribute(attribute) => {
                (attribute.clone(), "attribute is absent".to_string())
            }
            Error::AttributeShape {
                attribute,
                expected,
            } => (attribute.clone(), format!("expected {expected} value")),
            other => (String::new(), other.to_string()),
        }
    }

    /// Wraps an attribute error as a [`Error::MalformedTemplate`] naming the given object.
    pub fn malformed_template(object: &str, err: Error) -> Error {
        let (attribute, reason) = err.attribute_detail();
        Error::MalformedTemplate {
            object: object.to_string(),
            attribute,
            reason,
        }
    }

    /// Wraps an attribute error as a [`Error::MalformedEnrollmentService`] naming the given object.
    pub fn malformed_enrollment_service(object: &str, err: Error) -> Error {
        let (attribute, reason) = err.attribute_detail();
        Error::MalformedEnrollmentService {
            object: object.to_string(),
            attribute,
            reason,
        }
    }

    /// Wraps an attribute error as a [`Error::MalformedOid`] naming the given object.
    pub fn malformed_oid(object: &str, err: Error) -> Error {
        let (attribute, reason) = err.attribute_detail();
        Error::MalformedOid {
            object: object.to_string(),
            attribute,
            reason,
        }
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingAttribute(a) => write!(f, "MissingAttribute: {}", a),
            Error::AttributeShape {
                attribute,
                expected,
            } => write!(f, "AttributeShape: {} is not a {} value", attribute, expected),
            Error::MalformedTemplate {
                object,
                attribute,
                reason,
            } => write!(
                f,
                "MalformedTemplate: {} ({}): {}",
                object, attribute, reason
            ),
            Error::MalformedEnrollmentService {
                object,
                attribute,
                reason,
            } => write!(
                f,
                "MalformedEnrollmentService: {} ({}): {}",
                object, attribute, reason
            ),
            Error::MalformedOid {
                object,
                attribute,
                reason,
            } => write!(f, "MalformedOid: {} ({}): {}", object, attribute, reason),
            Error::AccessRuleRetrieval { name, oid, reason } => write!(
                f,
                "AccessRuleRetrieval: failed to retrieve the access rules for certificate template {} (OID: {}): {}",
                name, oid, reason
            ),
            Error::TemplateExtensionNotFound => write!(f, "TemplateExtensionNotFound"),
            Error::NotFound => write!(f, "NotFound"),
            Error::ParseError => write!(f, "ParseError"),
            Error::Asn1Error(err) => write!(f, "Asn1Error: {}", err),
            #[cfg(feature = "std")]
            Error::StdIoError(err) => write!(f, "StdError: {:?}", err),
        }
    }
}

#[test]
fn error_test() {
    let _s = format!("{}", Error::MissingAttribute("revision".to_string()));
    let _s = format!("{}", Error::TemplateExtensionNotFound);
    let _s = format!("{}", Error::NotFound);
    let _s = format!("{}", Error::ParseError);

    let e = Error::malformed_template(
        "CN=User,CN=Certificate Templates",
        Error::AttributeShape {
            attribute: "flags".to_string(),
            expected: "integer",
        },
    );
    assert_eq!(
        "MalformedTemplate: CN=User,CN=Certificate Templates (flags): expected integer value",
        format!("{}", e)
    );

    let e = Error::malformed_oid("CN=1.2.3", Error::NotFound);
    assert_eq!(
        Error::MalformedOid {
            object: "CN=1.2.3".to_string(),
            attribute: String::new(),
            reason: "NotFound".to_string()
        },
        e
    );

    let e = Error::AccessRuleRetrieval {
        name: "WebServer".to_string(),
        oid: "1.2.3.4".to_string(),
        reason: "access denied".to_string(),
    };
    assert!(format!("{}", e).contains("WebServer (OID: 1.2.3.4)"));
}
