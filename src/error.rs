use thiserror::Error;

use crate::dns::ParseError;

/// Every way a validated lookup can fail. The verification taxonomy is
/// deliberately flat so callers can match on the exact trust failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("resource is not signed with RRSIG")]
    ResourceNotSigned,

    #[error("requested record does not exist")]
    NoResult,

    #[error("no name server to answer the question")]
    NsNotAvailable,

    #[error("DNSKEY record does not exist")]
    DnskeyNotAvailable,

    #[error("DS record does not exist")]
    DsNotAvailable,

    #[error("invalid RRSIG")]
    InvalidRrsig,

    #[error("record set does not validate against RRSIG")]
    RrsigValidation,

    #[error("invalid RRSIG validity period")]
    RrsigValidityPeriod,

    #[error("unknown DS digest type")]
    UnknownDsDigestType,

    #[error("DS record does not match DNSKEY")]
    DsInvalid,

    #[error("invalid query name: {0:?}")]
    InvalidQuery(String),

    #[error("malformed DNS message: {0}")]
    Malformed(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("query timed out")]
    Timeout,

    #[error("cannot read configuration {path}: {reason}")]
    Config { path: String, reason: String },
}

impl From<std::io::Error> for ResolveError {
    fn from(err: std::io::Error) -> Self {
        ResolveError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
