//! Classification of the extended key usage OIDs carried by a certificate template
//!
//! Well-known OIDs map to [`EnhancedKeyUsageFlag`] values through [`EKU_TABLE`]. Anything else,
//! including values that are not valid dotted-decimal OIDs, is kept as a [`CustomOid`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use const_oid::ObjectIdentifier;
use flagset::{flags, FlagSet};

use crate::util::oids::*;
use crate::{CustomOid, Error, Result};

flags! {
    /// Well-known extended key usages
    pub enum EnhancedKeyUsageFlag: u32 {
        /// 1.3.6.1.5.5.7.3.2
        ClientAuthentication = 0x0000_0001,
        /// 1.3.6.1.5.5.7.3.1
        ServerAuthentication = 0x0000_0002,
        /// 1.3.6.1.5.5.7.3.4
        SecureEmail = 0x0000_0004,
        /// 1.3.6.1.4.1.311.10.3.4
        EFS = 0x0000_0008,
        /// 1.3.6.1.4.1.311.20.2.2
        SmartcardLogon = 0x0000_0010,
        /// 1.3.6.1.5.5.7.3.3
        CodeSigning = 0x0000_0020,
        /// 1.3.6.1.5.5.7.3.9
        OCSPResponseSigning = 0x0000_0040,
        /// 1.3.6.1.4.1.311.21.5
        CAExchange = 0x0000_0080,
        /// 1.3.6.1.4.1.311.10.3.1
        CTLSigning = 0x0000_0100,
        /// 1.3.6.1.4.1.311.10.3.12
        DocumentSigning = 0x0000_0200,
        /// 1.3.6.1.4.1.311.10.3.4.1
        EFSDataRecovery = 0x0000_0400,
        /// 1.3.6.1.4.1.311.10.3.11
        KeyRecovery = 0x0000_0800,
        /// 1.3.6.1.4.1.311.21.6
        KeyRecoveryAgent = 0x0000_1000,
        /// 1.3.6.1.4.1.311.10.3.13
        LifetimeSigning = 0x0000_2000,
        /// 1.3.6.1.4.1.311.10.3.10
        QualifiedSubordination = 0x0000_4000,
        /// 1.3.6.1.4.1.311.10.3.8
        WindowsNTEmbeddedCryptography = 0x0000_8000,
        /// 1.3.6.1.4.1.311.10.3.2
        TimestampSigning = 0x0001_0000,
        /// 1.3.6.1.4.1.311.10.6.2
        LicenseServerVerification = 0x0002_0000,
        /// 1.3.6.1.4.1.311.10.6.1
        KeyPackLicenses = 0x0004_0000,
        /// 1.3.6.1.4.1.311.10.3.7
        OemWindowsSystemComponentVerification = 0x0008_0000,
        /// 1.3.6.1.4.1.311.20.1
        CTLAutoenrollment = 0x0010_0000,
        /// 1.3.6.1.4.1.311.20.2.1
        CertificateEnrollmentAgent = 0x0020_0000,
        /// 1.3.6.1.4.1.311.21.19
        DSEmailReplication = 0x0040_0000,
        /// 1.3.6.1.5.5.7.3.5
        IPSec = 0x0080_0000,
        /// 1.3.6.1.5.5.7.3.6
        IPSecTunnel = 0x0100_0000,
        /// 1.3.6.1.5.5.7.3.7
        IPSecUser = 0x0200_0000,
        /// 1.3.6.1.5.5.8.2.2
        IKEIntermediate = 0x0400_0000,
        /// 1.3.6.1.4.1.311.10.5.1
        DRMSigning = 0x0800_0000,
        /// 1.3.6.1.5.5.7.3.8
        PKITimestampSigning = 0x1000_0000,
        /// 1.3.6.1.4.1.311.10.3.9
        CertificateRootListSigning = 0x2000_0000,
        /// 1.3.6.1.4.1.311.10.3.5
        WindowsHardwareDriverVerification = 0x4000_0000,
        /// 1.3.6.1.4.1.311.10.12.1
        Any = 0x8000_0000,
    }
}

/// Set of [`EnhancedKeyUsageFlag`] values
pub type EnhancedKeyUsageFlags = FlagSet<EnhancedKeyUsageFlag>;

/// Well-known extended key usage OIDs with the flag and display name of each
pub static EKU_TABLE: &[(ObjectIdentifier, EnhancedKeyUsageFlag, &str)] = &[
    (ID_KP_CLIENT_AUTH, EnhancedKeyUsageFlag::ClientAuthentication, "Client Authentication"),
    (ID_KP_SERVER_AUTH, EnhancedKeyUsageFlag::ServerAuthentication, "Server Authentication"),
    (ID_KP_EMAIL_PROTECTION, EnhancedKeyUsageFlag::SecureEmail, "Secure Email"),
    (MS_KP_EFS, EnhancedKeyUsageFlag::EFS, "Encrypting File System"),
    (MS_KP_SMARTCARD_LOGON, EnhancedKeyUsageFlag::SmartcardLogon, "Smartcard Logon"),
    (ID_KP_CODE_SIGNING, EnhancedKeyUsageFlag::CodeSigning, "Code Signing"),
    (ID_KP_OCSP_SIGNING, EnhancedKeyUsageFlag::OCSPResponseSigning, "OCSP Response Signing"),
    (MS_KP_CA_EXCHANGE, EnhancedKeyUsageFlag::CAExchange, "CA Exchange"),
    (MS_KP_CTL_SIGNING, EnhancedKeyUsageFlag::CTLSigning, "Microsoft Trust List Signing"),
    (MS_KP_DOCUMENT_SIGNING, EnhancedKeyUsageFlag::DocumentSigning, "Document Signing"),
    (MS_KP_EFS_RECOVERY, EnhancedKeyUsageFlag::EFSDataRecovery, "EFS Data Recovery"),
    (MS_KP_KEY_RECOVERY, EnhancedKeyUsageFlag::KeyRecovery, "Key Recovery"),
    (MS_KP_KEY_RECOVERY_AGENT, EnhancedKeyUsageFlag::KeyRecoveryAgent, "Key Recovery Agent"),
    (MS_KP_LIFETIME_SIGNING, EnhancedKeyUsageFlag::LifetimeSigning, "Lifetime Signing"),
    (MS_KP_QUALIFIED_SUBORDINATION, EnhancedKeyUsageFlag::QualifiedSubordination, "Qualified Subordination"),
    (MS_KP_EMBEDDED_NT_CRYPTO, EnhancedKeyUsageFlag::WindowsNTEmbeddedCryptography, "Windows NT Embedded Cryptography"),
    (MS_KP_TIMESTAMP_SIGNING, EnhancedKeyUsageFlag::TimestampSigning, "Timestamp Signing"),
    (MS_KP_LICENSE_SERVER, EnhancedKeyUsageFlag::LicenseServerVerification, "License Server Verification"),
    (MS_KP_KEY_PACK_LICENSES, EnhancedKeyUsageFlag::KeyPackLicenses, "Key Pack Licenses"),
    (MS_KP_OEM_WHQL_CRYPTO, EnhancedKeyUsageFlag::OemWindowsSystemComponentVerification, "OEM Windows System Component Verification"),
    (MS_KP_AUTO_ENROLL_CTL_USAGE, EnhancedKeyUsageFlag::CTLAutoenrollment, "Certificate Trust List Autoenrollment"),
    (MS_KP_ENROLLMENT_AGENT, EnhancedKeyUsageFlag::CertificateEnrollmentAgent, "Certificate Request Agent"),
    (MS_KP_DS_EMAIL_REPLICATION, EnhancedKeyUsageFlag::DSEmailReplication, "Directory Service Email Replication"),
    (ID_KP_IPSEC_END_SYSTEM, EnhancedKeyUsageFlag::IPSec, "IP Security End System"),
    (ID_KP_IPSEC_TUNNEL, EnhancedKeyUsageFlag::IPSecTunnel, "IP Security Tunnel Termination"),
    (ID_KP_IPSEC_USER, EnhancedKeyUsageFlag::IPSecUser, "IP Security User"),
    (ID_KP_IPSEC_IKE_INTERMEDIATE, EnhancedKeyUsageFlag::IKEIntermediate, "IP Security IKE Intermediate"),
    (MS_KP_DRM, EnhancedKeyUsageFlag::DRMSigning, "Digital Rights"),
    (ID_KP_TIME_STAMPING, EnhancedKeyUsageFlag::PKITimestampSigning, "Time Stamping"),
    (MS_KP_ROOT_LIST_SIGNER, EnhancedKeyUsageFlag::CertificateRootListSigning, "Root List Signer"),
    (MS_KP_WHQL_CRYPTO, EnhancedKeyUsageFlag::WindowsHardwareDriverVerification, "Windows Hardware Driver Verification"),
    (MS_KP_ANY_APPLICATION_POLICY, EnhancedKeyUsageFlag::Any, "Any Application Policy"),
];

impl EnhancedKeyUsageFlag {
    /// Returns the OID of the extended key usage
    pub fn oid(&self) -> ObjectIdentifier {
        let mut retval = MS_KP_ANY_APPLICATION_POLICY;
        for (oid, flag, _) in EKU_TABLE {
            if flag == self {
                retval = *oid;
                break;
            }
        }
        retval
    }

    /// Returns the display name of the extended key usage
    pub fn name(&self) -> &'static str {
        let mut retval = "Any Application Policy";
        for (_, flag, name) in EKU_TABLE {
            if flag == self {
                retval = *name;
                break;
            }
        }
        retval
    }
}

/// `eku_flag_for_oid` returns the flag for a well-known extended key usage OID
pub fn eku_flag_for_oid(oid: &ObjectIdentifier) -> Option<EnhancedKeyUsageFlag> {
    EKU_TABLE
        .iter()
        .find(|(o, _, _)| o == oid)
        .map(|(_, flag, _)| *flag)
}

/// `classify_extended_key_usages` maps each value to a well-known flag or, failing that, appends it
/// to the returned custom list in encounter order. Every value lands in exactly one of the two.
pub fn classify_extended_key_usages(values: &[String]) -> (EnhancedKeyUsageFlags, Vec<CustomOid>) {
    let mut flags = EnhancedKeyUsageFlags::default();
    let mut custom = Vec::new();
    for value in values {
        let flag = ObjectIdentifier::new(value.trim())
            .ok()
            .and_then(|oid| eku_flag_for_oid(&oid));
        match flag {
            Some(flag) => flags |= flag,
            None => custom.push(CustomOid::new(value)),
        }
    }
    (flags, custom)
}

/// `eku_friendly_name` returns the display name of a well-known extended key usage OID. The
/// signature matches [`OidLookup`](crate::OidLookup) so it can be registered with a
/// [`PolicyEnvironment`](crate::PolicyEnvironment).
pub fn eku_friendly_name(oid: &ObjectIdentifier) -> Result<String> {
    match EKU_TABLE.iter().find(|(o, _, _)| o == oid) {
        Some((_, _, name)) => Ok(name.to_string()),
        None => Err(Error::NotFound),
    }
}

#[test]
fn classify_test() {
    use alloc::vec;

    let values = vec![
        "1.3.6.1.5.5.7.3.2".to_string(),
        "1.3.6.1.4.1.311.20.2.2".to_string(),
        "1.3.6.1.4.1.99999.1".to_string(),
        "1.3.6.1.5.5.7.3.1".to_string(),
        "not an oid".to_string(),
    ];
    let (flags, custom) = classify_extended_key_usages(&values);
    assert_eq!(
        EnhancedKeyUsageFlag::ClientAuthentication
            | EnhancedKeyUsageFlag::SmartcardLogon
            | EnhancedKeyUsageFlag::ServerAuthentication,
        flags
    );
    assert_eq!(2, custom.len());
    assert_eq!("1.3.6.1.4.1.99999.1", custom[0].oid);
    assert_eq!("not an oid", custom[1].oid);
    assert!(custom.iter().all(|c| c.friendly_name.is_none()));

    let (flags, custom) = classify_extended_key_usages(&[]);
    assert!(flags.is_empty());
    assert!(custom.is_empty());
}

#[test]
fn table_test() {
    // one row per flag
    assert_eq!(32, EKU_TABLE.len());
    let mut all = EnhancedKeyUsageFlags::default();
    for (oid, flag, _) in EKU_TABLE {
        assert!(!all.contains(*flag));
        all |= *flag;
        assert_eq!(Some(*flag), eku_flag_for_oid(oid));
        assert_eq!(*oid, flag.oid());
    }
    assert_eq!(EnhancedKeyUsageFlags::full(), all);

    assert_eq!("Smartcard Logon", EnhancedKeyUsageFlag::SmartcardLogon.name());
    assert_eq!(
        Ok("Client Authentication".to_string()),
        eku_friendly_name(&ID_KP_CLIENT_AUTH)
    );
    assert_eq!(
        Err(Error::NotFound),
        eku_friendly_name(&ObjectIdentifier::new_unwrap("1.2.3.4"))
    );
}
