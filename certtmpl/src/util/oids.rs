//! Provides definitions of OIDs used by ADCS certificate templates that are not available from the
//! const-oid database

use der::asn1::ObjectIdentifier;

pub use const_oid::db::rfc5912::{
    ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE, ID_KP_CLIENT_AUTH, ID_KP_CODE_SIGNING,
    ID_KP_EMAIL_PROTECTION, ID_KP_OCSP_SIGNING, ID_KP_SERVER_AUTH, ID_KP_TIME_STAMPING,
};

// -------------------------------------------------------------------------------------------------
// Certificate extensions
// -------------------------------------------------------------------------------------------------

/// szOID_CERTIFICATE_TEMPLATE, carries CertificateTemplate ::= SEQUENCE { templateID, templateMajorVersion,
/// templateMinorVersion OPTIONAL } in certificates issued using version 2 or later templates
pub const MS_CERTIFICATE_TEMPLATE_INFORMATION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.21.7");

/// szOID_ENROLL_CERTTYPE_EXTENSION, carries the template name as a BMPString in certificates issued
/// using version 1 templates
pub const MS_CERTIFICATE_TEMPLATE_NAME: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.20.2");

// -------------------------------------------------------------------------------------------------
// Extended key usages
// -------------------------------------------------------------------------------------------------

/// Encrypting File System
pub const MS_KP_EFS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.4");
/// Smartcard Logon
pub const MS_KP_SMARTCARD_LOGON: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.20.2.2");
/// Private Key Archival
pub const MS_KP_CA_EXCHANGE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.21.5");
/// Microsoft Trust List Signing
pub const MS_KP_CTL_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.1");
/// Document Signing
pub const MS_KP_DOCUMENT_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.12");
/// File Recovery
pub const MS_KP_EFS_RECOVERY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.4.1");
/// Key Recovery
pub const MS_KP_KEY_RECOVERY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.11");
/// Key Recovery Agent
pub const MS_KP_KEY_RECOVERY_AGENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.21.6");
/// Lifetime Signing
pub const MS_KP_LIFETIME_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.13");
/// Qualified Subordination
pub const MS_KP_QUALIFIED_SUBORDINATION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.10");
/// Windows NT embedded cryptography (Embedded Windows System Component Verification)
pub const MS_KP_EMBEDDED_NT_CRYPTO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.8");
/// Microsoft Time Stamping
pub const MS_KP_TIMESTAMP_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.2");
/// License Server Verification
pub const MS_KP_LICENSE_SERVER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.6.2");
/// Key Pack Licenses
pub const MS_KP_KEY_PACK_LICENSES: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.6.1");
/// OEM Windows System Component Verification
pub const MS_KP_OEM_WHQL_CRYPTO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.7");
/// CTL Usage (autoenrollment)
pub const MS_KP_AUTO_ENROLL_CTL_USAGE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.20.1");
/// Certificate Request Agent
pub const MS_KP_ENROLLMENT_AGENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.20.2.1");
/// Directory Service Email Replication
pub const MS_KP_DS_EMAIL_REPLICATION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.21.19");
/// IP security end system
pub const ID_KP_IPSEC_END_SYSTEM: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.5");
/// IP security tunnel termination
pub const ID_KP_IPSEC_TUNNEL: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.6");
/// IP security user
pub const ID_KP_IPSEC_USER: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.7");
/// IP security IKE intermediate
pub const ID_KP_IPSEC_IKE_INTERMEDIATE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.8.2.2");
/// Digital Rights
pub const MS_KP_DRM: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.5.1");
/// Root List Signer
pub const MS_KP_ROOT_LIST_SIGNER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.9");
/// Windows Hardware Driver Verification
pub const MS_KP_WHQL_CRYPTO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.5");
/// Any Application Policy
pub const MS_KP_ANY_APPLICATION_POLICY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.12.1");
