use std::fmt;

/// DS digest type algorithms (RFC 4034, 4509, 6605).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DigestType {
    Sha1 = 1,
    Sha256 = 2,
    Gost94 = 3,
    Sha384 = 4,
}

impl DigestType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Sha1),
            2 => Some(Self::Sha256),
            3 => Some(Self::Gost94),
            4 => Some(Self::Sha384),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Digest types the DS check will act on. SHA-256 is mandatory
    /// (RFC 4509); SHA-384 is accepted; SHA-1 is excluded per RFC 8624.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Sha256 | Self::Sha384)
    }

    /// Digest of `data` with this algorithm, if supported.
    pub fn digest(&self, data: &[u8]) -> Option<Vec<u8>> {
        use ring::digest;
        match self {
            Self::Sha256 => Some(digest::digest(&digest::SHA256, data).as_ref().to_vec()),
            Self::Sha384 => Some(digest::digest(&digest::SHA384, data).as_ref().to_vec()),
            _ => None,
        }
    }
}

impl fmt::Display for DigestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Gost94 => write!(f, "GOST94"),
            Self::Sha384 => write!(f, "SHA384"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_types() {
        assert!(DigestType::Sha256.is_supported());
        assert!(DigestType::Sha384.is_supported());
        assert!(!DigestType::Sha1.is_supported());
        assert!(!DigestType::Gost94.is_supported());
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(DigestType::Sha256.digest(b"x").unwrap().len(), 32);
        assert_eq!(DigestType::Sha384.digest(b"x").unwrap().len(), 48);
        assert!(DigestType::Sha1.digest(b"x").is_none());
    }

    #[test]
    fn unknown_type() {
        assert_eq!(DigestType::from_u8(0), None);
        assert_eq!(DigestType::from_u8(9), None);
    }
}
