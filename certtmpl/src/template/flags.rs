//! Flag sets decoded from the bit-packed integer attributes of certificate template and enrollment
//! service objects
//!
//! Values are defined by [MS-CRTD]: <https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-crtd>.
//! Raw words are converted with [`FlagSet::new_truncated`], so bits that have no flag defined here
//! are dropped at the decode boundary.

use core::fmt;

use flagset::{flags, FlagSet};
#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::util::codecs::decode_big_endian_u32;

flags! {
    /// General flags (`flags` attribute) of a certificate template
    pub enum CertificateTemplateFlag: u32 {
        /// Subject name is supplied in the request (version 1 templates)
        EnrolleeSuppliesSubject = 0x0000_0001,
        /// Email name is included in the subject alternative name
        AddEmail = 0x0000_0002,
        /// Template OID is included in issued certificates
        AddObjectIdentifier = 0x0000_0004,
        /// Issued certificates are published to the directory
        DsPublish = 0x0000_0008,
        /// Private key may be exported (version 1 templates)
        AllowKeyExport = 0x0000_0010,
        /// Template is available for autoenrollment
        Autoenrollment = 0x0000_0020,
        /// Template is intended for computers
        MachineType = 0x0000_0040,
        /// Template is intended for CA certificates
        IsCA = 0x0000_0080,
        /// Directory path is included in the subject
        AddDirectoryPath = 0x0000_0100,
        /// Template name extension is included in issued certificates
        AddTemplateName = 0x0000_0200,
        /// Subject directory path is included
        AddSubjectDirectoryPath = 0x0000_0400,
        /// Template is intended for cross-certification
        IsCrossCA = 0x0000_0800,
        /// Requests and issued certificates are not persisted in the CA database
        DoNotPersistInDB = 0x0000_1000,
        /// Template is a default template
        IsDefault = 0x0001_0000,
        /// Default template has been modified
        IsModified = 0x0002_0000,
        /// Template has been deleted
        IsDeleted = 0x0004_0000,
        /// Template has a policy mismatch
        PolicyMismatch = 0x0008_0000,
    }
}

flags! {
    /// Subject name flags (`msPKI-Certificate-Name-Flag` attribute) of a certificate template
    pub enum SubjectNameFlag: u32 {
        /// Subject name is supplied in the request
        EnrolleeSuppliesSubject = 0x0000_0001,
        /// Subject and alternative names of the certificate being renewed are reused
        OldCertSuppliesSubjectAndAltName = 0x0000_0008,
        /// Subject alternative name is supplied in the request
        EnrolleeSuppliesAltSubject = 0x0001_0000,
        /// Root domain DNS name is included in the subject alternative name
        AltSubjectRequireDomainDns = 0x0040_0000,
        /// Service principal name is included in the subject alternative name
        AltSubjectRequireSpn = 0x0080_0000,
        /// Directory GUID is included in the subject alternative name
        AltSubjectRequireDirectoryGuid = 0x0100_0000,
        /// User principal name is included in the subject alternative name
        AltSubjectRequireUpn = 0x0200_0000,
        /// Email address is included in the subject alternative name
        AltSubjectRequireEmail = 0x0400_0000,
        /// DNS name is included in the subject alternative name
        AltSubjectRequireDns = 0x0800_0000,
        /// DNS name is used as the subject common name
        SubjectRequireDnsAsCn = 0x1000_0000,
        /// Email address is included in the subject
        SubjectRequireEmail = 0x2000_0000,
        /// Common name is included in the subject
        SubjectRequireCommonName = 0x4000_0000,
        /// Directory path is used as the subject
        SubjectRequireDirectoryPath = 0x8000_0000,
    }
}

flags! {
    /// Enrollment flags (`msPKI-Enrollment-Flag` attribute) of a certificate template
    pub enum EnrollmentFlag: u32 {
        /// S/MIME capabilities are included in the request
        IncludeSymmetricAlgorithms = 0x0000_0001,
        /// Requests are held pending CA manager approval
        PendAllRequests = 0x0000_0002,
        /// Issued certificates are published to the key recovery agent container
        PublishToKraContainer = 0x0000_0004,
        /// Issued certificates are published to the user object
        PublishToDs = 0x0000_0008,
        /// Autoenrollment checks the user object for an existing certificate
        AutoEnrollmentCheckUserDsCertificate = 0x0000_0010,
        /// Template is available for autoenrollment
        AutoEnrollment = 0x0000_0020,
        /// Renewal requests signed by the existing key are approved automatically
        PreviousApprovalValidateReenrollment = 0x0000_0040,
        /// User interaction is required during enrollment
        UserInteractionRequired = 0x0000_0100,
        /// Revoked or expired certificates are removed from the personal store
        RemoveInvalidCertificateFromPersonalStore = 0x0000_0400,
        /// Enrollment on behalf of other users is allowed
        AllowEnrollOnBehalfOf = 0x0000_0800,
        /// OCSP no-check extension is included
        AddOcspNocheck = 0x0000_1000,
        /// Key reuse is allowed when token storage is full
        EnableKeyReuseOnNtTokenKeysetStorageFull = 0x0000_2000,
        /// Revocation information is omitted from issued certificates
        NoRevocationInfoInIssuedCerts = 0x0000_4000,
        /// Basic constraints extension is included in end entity certificates
        IncludeBasicConstraintsForEeCerts = 0x0000_8000,
        /// Key-based renewal is allowed
        AllowPreviousApprovalKeyBasedRenewalValidateReenrollment = 0x0001_0000,
        /// Issuance policies are taken from the request
        IssuancePoliciesFromRequest = 0x0002_0000,
        /// Autoenrollment does not renew the certificate
        SkipAutoRenewal = 0x0004_0000,
        /// Security extension is omitted from issued certificates
        NoSecurityExtension = 0x0008_0000,
    }
}

flags! {
    /// Single-bit private key flags (`msPKI-Private-Key-Flag` attribute) of a certificate template.
    /// The minimum supported client and server fields occupy [`CLIENT_VERSION_MASK`] and
    /// [`SERVER_VERSION_MASK`] and are decoded separately.
    pub enum PrivateKeyFlag: u32 {
        /// Private key is archived by the CA
        RequireKeyArchival = 0x0000_0001,
        /// Private key may be exported
        AllowKeyExport = 0x0000_0010,
        /// Strong private key protection is required
        RequireStrongProtection = 0x0000_0020,
        /// Alternate signature algorithm is required
        RequireAlternateSignatureAlgorithm = 0x0000_0040,
        /// Same key is used on renewal
        ReuseKeysRenewal = 0x0000_0080,
        /// Legacy cryptographic service provider is used
        UseLegacyProvider = 0x0000_0100,
        /// Key attestation via endorsement key trusted on use
        TrustOnUse = 0x0000_0200,
        /// Key attestation via endorsement certificate
        ValidateCert = 0x0000_0400,
        /// Key attestation via endorsement key list
        ValidateKey = 0x0000_0800,
        /// Key attestation is preferred
        AttestationPreferred = 0x0000_1000,
        /// Key attestation is required
        AttestationRequired = 0x0000_2000,
        /// Attestation issuance policy is not asserted
        AttestationWithoutPolicy = 0x0000_4000,
        /// Key is a Windows Hello logon key
        HelloLogonKey = 0x0020_0000,
    }
}

/// Bits 16-19 of the private key flags hold the minimum CA server version
pub const SERVER_VERSION_MASK: u32 = 0x000F_0000;
/// Bits 24-27 of the private key flags hold the minimum client version
pub const CLIENT_VERSION_MASK: u32 = 0x0F00_0000;

flags! {
    /// Key usage bits of a certificate template, in the single-byte-first layout used by
    /// `pKIKeyUsage`
    pub enum KeyUsageFlag: u16 {
        /// Encipher only
        EncipherOnly = 0x0001,
        /// CRL signing
        CrlSign = 0x0002,
        /// Certificate signing
        KeyCertSign = 0x0004,
        /// Key agreement
        KeyAgreement = 0x0008,
        /// Data encipherment
        DataEncipherment = 0x0010,
        /// Key encipherment
        KeyEncipherment = 0x0020,
        /// Non-repudiation
        NonRepudiation = 0x0040,
        /// Digital signature
        DigitalSignature = 0x0080,
        /// Decipher only
        DecipherOnly = 0x8000,
    }
}

impl KeyUsageFlag {
    /// Returns the display name of the key usage
    pub fn name(&self) -> &'static str {
        match self {
            KeyUsageFlag::EncipherOnly => "Encipher Only",
            KeyUsageFlag::CrlSign => "CRL Signing",
            KeyUsageFlag::KeyCertSign => "Certificate Signing",
            KeyUsageFlag::KeyAgreement => "Key Agreement",
            KeyUsageFlag::DataEncipherment => "Data Encipherment",
            KeyUsageFlag::KeyEncipherment => "Key Encipherment",
            KeyUsageFlag::NonRepudiation => "Non Repudiation",
            KeyUsageFlag::DigitalSignature => "Digital Signature",
            KeyUsageFlag::DecipherOnly => "Decipher Only",
        }
    }
}

/// `key_usage_from_bytes` decodes the value of the `pKIKeyUsage` attribute. The first byte carries
/// the eight leading key usage bits and the high bit of the optional second byte carries
/// DecipherOnly.
pub fn key_usage_from_bytes(bytes: &[u8]) -> KeyUsageFlags {
    let leading = bytes.get(..1).map(decode_big_endian_u32).unwrap_or_default() as u16;
    let mut retval = KeyUsageFlags::new_truncated(leading);
    if bytes.get(1).map_or(false, |b| b & 0x80 != 0) {
        retval |= KeyUsageFlag::DecipherOnly;
    }
    retval
}

flags! {
    /// Key attestation methods accepted by a certificate template. Values match the corresponding
    /// private key flag bits.
    pub enum KeyAttestationMethod: u32 {
        /// Endorsement key trusted on use
        TrustOnUse = 0x0000_0200,
        /// Endorsement certificate
        ValidateCert = 0x0000_0400,
        /// Endorsement key list
        ValidateKey = 0x0000_0800,
    }
}

flags! {
    /// Flags (`flags` attribute) of an enrollment service
    pub enum EnrollmentServiceFlag: u32 {
        /// Undocumented bit set on most enrollment services
        Unknown = 0x0000_0002,
        /// Enterprise CA
        IsEnterprise = 0x0000_0008,
    }
}

/// Set of [`CertificateTemplateFlag`] values
pub type CertificateTemplateFlags = FlagSet<CertificateTemplateFlag>;
/// Set of [`SubjectNameFlag`] values
pub type SubjectNameFlags = FlagSet<SubjectNameFlag>;
/// Set of [`EnrollmentFlag`] values
pub type EnrollmentFlags = FlagSet<EnrollmentFlag>;
/// Set of [`PrivateKeyFlag`] values
pub type PrivateKeyFlags = FlagSet<PrivateKeyFlag>;
/// Set of [`KeyUsageFlag`] values
pub type KeyUsageFlags = FlagSet<KeyUsageFlag>;
/// Set of [`KeyAttestationMethod`] values
pub type KeyAttestationMethods = FlagSet<KeyAttestationMethod>;
/// Set of [`EnrollmentServiceFlag`] values
pub type EnrollmentServiceFlags = FlagSet<EnrollmentServiceFlag>;

/// Level of key attestation enforced by a certificate template
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum KeyAttestationEnforcement {
    /// Key attestation is not used
    #[default]
    None,
    /// Key attestation is performed when the client supports it
    Preferred,
    /// Key attestation is required
    Required,
}

impl fmt::Display for KeyAttestationEnforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAttestationEnforcement::None => write!(f, "None"),
            KeyAttestationEnforcement::Preferred => write!(f, "Preferred"),
            KeyAttestationEnforcement::Required => write!(f, "Required"),
        }
    }
}

/// Key attestation settings derived from the private key flags of a certificate template
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct KeyAttestation {
    /// Enforcement level
    pub enforcement: KeyAttestationEnforcement,
    /// Accepted methods, empty unless enforcement is other than None
    pub methods: KeyAttestationMethods,
    /// Whether the CA asserts a key attestation issuance policy in issued certificates
    pub asserts_policy: bool,
}

/// `key_attestation_from_private_key_flags` derives the [`KeyAttestation`] settings carried in a
/// private key flag word.
pub fn key_attestation_from_private_key_flags(flags: PrivateKeyFlags) -> KeyAttestation {
    let enforcement = if flags.contains(PrivateKeyFlag::AttestationRequired) {
        KeyAttestationEnforcement::Required
    } else if flags.contains(PrivateKeyFlag::AttestationPreferred) {
        KeyAttestationEnforcement::Preferred
    } else {
        KeyAttestationEnforcement::None
    };
    if enforcement == KeyAttestationEnforcement::None {
        return KeyAttestation::default();
    }

    let mut methods = KeyAttestationMethods::default();
    if flags.contains(PrivateKeyFlag::TrustOnUse) {
        methods |= KeyAttestationMethod::TrustOnUse;
    }
    if flags.contains(PrivateKeyFlag::ValidateCert) {
        methods |= KeyAttestationMethod::ValidateCert;
    }
    if flags.contains(PrivateKeyFlag::ValidateKey) {
        methods |= KeyAttestationMethod::ValidateKey;
    }
    KeyAttestation {
        enforcement,
        methods,
        asserts_policy: !flags.contains(PrivateKeyFlag::AttestationWithoutPolicy),
    }
}

#[test]
fn private_key_flags_test() {
    // client and server fields are not flags
    let pkf = PrivateKeyFlags::new_truncated(0x0305_0010);
    assert_eq!(PrivateKeyFlags::from(PrivateKeyFlag::AllowKeyExport), pkf);

    let pkf = PrivateKeyFlags::new_truncated(0x0020_0001);
    assert!(pkf.contains(PrivateKeyFlag::RequireKeyArchival));
    assert!(pkf.contains(PrivateKeyFlag::HelloLogonKey));
}

#[test]
fn key_attestation_test() {
    let ka = key_attestation_from_private_key_flags(PrivateKeyFlags::new_truncated(0x2000 | 0x0600));
    assert_eq!(KeyAttestationEnforcement::Required, ka.enforcement);
    assert_eq!(
        KeyAttestationMethod::TrustOnUse | KeyAttestationMethod::ValidateCert,
        ka.methods
    );
    assert!(ka.asserts_policy);

    let ka = key_attestation_from_private_key_flags(PrivateKeyFlags::new_truncated(0x1000 | 0x4000 | 0x0800));
    assert_eq!(KeyAttestationEnforcement::Preferred, ka.enforcement);
    assert_eq!(KeyAttestationMethods::from(KeyAttestationMethod::ValidateKey), ka.methods);
    assert!(!ka.asserts_policy);

    // required wins over preferred
    let ka = key_attestation_from_private_key_flags(PrivateKeyFlags::new_truncated(0x3000));
    assert_eq!(KeyAttestationEnforcement::Required, ka.enforcement);

    // method bits without enforcement are ignored
    for raw in [0u32, 0x0200, 0x0400, 0x0800, 0x0E00, 0x4E00, 0x0F00_0E00] {
        let ka = key_attestation_from_private_key_flags(PrivateKeyFlags::new_truncated(raw));
        assert_eq!(KeyAttestationEnforcement::None, ka.enforcement);
        assert!(ka.methods.is_empty());
        assert!(!ka.asserts_policy);
    }
}

#[test]
fn key_usage_name_test() {
    assert_eq!("Digital Signature", KeyUsageFlag::DigitalSignature.name());
    assert_eq!("Decipher Only", KeyUsageFlag::DecipherOnly.name());
    assert_eq!("Key Encipherment", KeyUsageFlag::KeyEncipherment.name());
}

#[test]
fn key_usage_bytes_test() {
    assert_eq!(
        KeyUsageFlag::DigitalSignature | KeyUsageFlag::KeyEncipherment,
        key_usage_from_bytes(&[0xA0])
    );
    assert_eq!(
        KeyUsageFlag::DigitalSignature | KeyUsageFlag::KeyCertSign | KeyUsageFlag::CrlSign,
        key_usage_from_bytes(&[0x86, 0x00])
    );
    assert_eq!(
        KeyUsageFlag::KeyAgreement | KeyUsageFlag::DecipherOnly,
        key_usage_from_bytes(&[0x08, 0x80])
    );
    assert!(key_usage_from_bytes(&[]).is_empty());
}
