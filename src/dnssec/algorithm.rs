use std::fmt;

use ring::signature;

/// DNSSEC signing algorithm numbers (RFC 4034, 5702, 6605, 8080).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Algorithm {
    RsaMd5 = 1,
    Dsa = 3,
    RsaSha1 = 5,
    DsaNsec3Sha1 = 6,
    RsaSha1Nsec3Sha1 = 7,
    RsaSha256 = 8,
    RsaSha512 = 10,
    EccGost = 12,
    EcdsaP256Sha256 = 13,
    EcdsaP384Sha384 = 14,
    Ed25519 = 15,
    Ed448 = 16,
}

impl Algorithm {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::RsaMd5),
            3 => Some(Self::Dsa),
            5 => Some(Self::RsaSha1),
            6 => Some(Self::DsaNsec3Sha1),
            7 => Some(Self::RsaSha1Nsec3Sha1),
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            12 => Some(Self::EccGost),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            16 => Some(Self::Ed448),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Algorithms this validator can verify.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::RsaSha1
                | Self::RsaSha256
                | Self::RsaSha512
                | Self::EcdsaP256Sha256
                | Self::EcdsaP384Sha384
                | Self::Ed25519
        )
    }

    /// Verifies `signature` over `message` with a DNSKEY public key in
    /// its RDATA encoding.
    ///
    /// Key formats differ per family: RSA keys are RFC 3110
    /// length-prefixed exponent + modulus, ECDSA keys are the bare
    /// `x | y` point (RFC 6605) that ring wants prefixed with 0x04, and
    /// Ed25519 keys are the raw 32 bytes (RFC 8080). ECDSA signatures on
    /// the wire are the fixed-width `r | s` concatenation, hence the
    /// `_FIXED` ring algorithms.
    pub fn verify(&self, public_key: &[u8], message: &[u8], sig: &[u8]) -> Result<(), VerifyError> {
        match self {
            // 1024-bit ZSKs are still common in signed zones, so the
            // verification-only legacy parameter sets are required here.
            Self::RsaSha1 => rsa_verify(
                &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
                public_key,
                message,
                sig,
            ),
            Self::RsaSha256 => rsa_verify(
                &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
                public_key,
                message,
                sig,
            ),
            Self::RsaSha512 => rsa_verify(
                &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
                public_key,
                message,
                sig,
            ),
            Self::EcdsaP256Sha256 => {
                ec_verify(&signature::ECDSA_P256_SHA256_FIXED, 32, public_key, message, sig)
            }
            Self::EcdsaP384Sha384 => {
                ec_verify(&signature::ECDSA_P384_SHA384_FIXED, 48, public_key, message, sig)
            }
            Self::Ed25519 => {
                let key = signature::UnparsedPublicKey::new(&signature::ED25519, public_key);
                key.verify(message, sig)
                    .map_err(|_| VerifyError::BadSignature)
            }
            _ => Err(VerifyError::UnsupportedAlgorithm(self.to_u8())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RsaMd5 => write!(f, "RSAMD5"),
            Self::Dsa => write!(f, "DSA"),
            Self::RsaSha1 => write!(f, "RSASHA1"),
            Self::DsaNsec3Sha1 => write!(f, "DSA-NSEC3-SHA1"),
            Self::RsaSha1Nsec3Sha1 => write!(f, "RSASHA1-NSEC3-SHA1"),
            Self::RsaSha256 => write!(f, "RSASHA256"),
            Self::RsaSha512 => write!(f, "RSASHA512"),
            Self::EccGost => write!(f, "ECC-GOST"),
            Self::EcdsaP256Sha256 => write!(f, "ECDSAP256SHA256"),
            Self::EcdsaP384Sha384 => write!(f, "ECDSAP384SHA384"),
            Self::Ed25519 => write!(f, "ED25519"),
            Self::Ed448 => write!(f, "ED448"),
        }
    }
}

/// Low-level signature verification failures, mapped into the resolver
/// error taxonomy by the zone layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    UnsupportedAlgorithm(u8),
    BadPublicKey,
    BadSignature,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported algorithm {}", alg),
            Self::BadPublicKey => write!(f, "malformed public key"),
            Self::BadSignature => write!(f, "signature verification failed"),
        }
    }
}

impl std::error::Error for VerifyError {}

/// Splits an RFC 3110 public key into (exponent, modulus). The exponent
/// length is one octet, or three when the first octet is zero.
fn rsa_components(public_key: &[u8]) -> Result<(&[u8], &[u8]), VerifyError> {
    let (e_len, off) = match public_key.first() {
        Some(0) => {
            if public_key.len() < 3 {
                return Err(VerifyError::BadPublicKey);
            }
            (u16::from_be_bytes([public_key[1], public_key[2]]) as usize, 3)
        }
        Some(&len) => (len as usize, 1),
        None => return Err(VerifyError::BadPublicKey),
    };
    if public_key.len() < off + e_len || e_len == 0 {
        return Err(VerifyError::BadPublicKey);
    }
    let e = &public_key[off..off + e_len];
    let n = &public_key[off + e_len..];
    if n.is_empty() {
        return Err(VerifyError::BadPublicKey);
    }
    Ok((e, n))
}

fn rsa_verify(
    alg: &'static signature::RsaParameters,
    public_key: &[u8],
    message: &[u8],
    sig: &[u8],
) -> Result<(), VerifyError> {
    let (e, n) = rsa_components(public_key)?;
    let key = signature::RsaPublicKeyComponents { n, e };
    key.verify(alg, message, sig)
        .map_err(|_| VerifyError::BadSignature)
}

fn ec_verify(
    alg: &'static signature::EcdsaVerificationAlgorithm,
    field_len: usize,
    public_key: &[u8],
    message: &[u8],
    sig: &[u8],
) -> Result<(), VerifyError> {
    if public_key.len() != 2 * field_len {
        return Err(VerifyError::BadPublicKey);
    }
    // DNSKEY stores the uncompressed point without the 0x04 marker.
    let mut prefixed = Vec::with_capacity(1 + public_key.len());
    prefixed.push(0x04);
    prefixed.extend_from_slice(public_key);
    let key = signature::UnparsedPublicKey::new(alg, prefixed);
    key.verify(message, sig)
        .map_err(|_| VerifyError::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_numbers_roundtrip() {
        assert_eq!(Algorithm::from_u8(8), Some(Algorithm::RsaSha256));
        assert_eq!(Algorithm::from_u8(13), Some(Algorithm::EcdsaP256Sha256));
        assert_eq!(Algorithm::from_u8(15), Some(Algorithm::Ed25519));
        assert_eq!(Algorithm::from_u8(200), None);
        assert_eq!(Algorithm::RsaSha256.to_u8(), 8);
    }

    #[test]
    fn support_matrix() {
        assert!(Algorithm::RsaSha256.is_supported());
        assert!(Algorithm::EcdsaP384Sha384.is_supported());
        assert!(Algorithm::Ed25519.is_supported());
        assert!(!Algorithm::RsaMd5.is_supported());
        assert!(!Algorithm::EccGost.is_supported());
        assert!(!Algorithm::Ed448.is_supported());
    }

    #[test]
    fn rsa_component_split() {
        // One-octet exponent length.
        let key = [3, 1, 0, 1, 0xAA, 0xBB];
        let (e, n) = rsa_components(&key).unwrap();
        assert_eq!(e, &[1, 0, 1]);
        assert_eq!(n, &[0xAA, 0xBB]);

        // Exponent length overrunning the key is rejected.
        let mut overrun = vec![0, 2, 0x00];
        overrun.extend_from_slice(&[7; 256]);
        assert!(rsa_components(&overrun).is_err());

        // Three-octet exponent length.
        let mut ok = vec![0, 1, 0x00];
        ok.extend_from_slice(&[7; 256]);
        ok.extend_from_slice(&[9; 64]);
        let (e, n) = rsa_components(&ok).unwrap();
        assert_eq!(e.len(), 256);
        assert_eq!(n.len(), 64);
    }

    #[test]
    fn rsa_empty_key_rejected() {
        assert!(rsa_components(&[]).is_err());
        assert!(rsa_components(&[0]).is_err());
    }

    #[test]
    fn ec_key_length_enforced() {
        let err = Algorithm::EcdsaP256Sha256.verify(&[0u8; 63], b"m", &[0u8; 64]);
        assert_eq!(err, Err(VerifyError::BadPublicKey));
    }

    #[test]
    fn garbage_ed25519_rejected() {
        let err = Algorithm::Ed25519.verify(&[1u8; 32], b"message", &[2u8; 64]);
        assert_eq!(err, Err(VerifyError::BadSignature));
    }

    #[test]
    fn unsupported_algorithm_rejected() {
        let err = Algorithm::EccGost.verify(&[], b"m", &[]);
        assert_eq!(err, Err(VerifyError::UnsupportedAlgorithm(12)));
    }
}
