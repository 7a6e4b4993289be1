pub mod algorithm;
pub mod chain;
pub mod digest;
pub mod key_tag;
pub mod signed_zone;

pub use algorithm::Algorithm;
pub use chain::AuthChain;
pub use digest::DigestType;
pub use key_tag::calculate_key_tag;
pub use signed_zone::SignedZone;

/// UDP payload size advertised through EDNS0 for DNSSEC queries
/// (RFC 4035 §4.1).
pub const EDNS_UDP_SIZE: u16 = 4096;

/// DNSSEC-OK bit in the EDNS0 flags half of the OPT ttl field.
pub const EDNS_DO_FLAG: u16 = 0x8000;

/// ZSK flags value on a DNSKEY.
pub const DNSKEY_FLAGS_ZSK: u16 = 256;

/// KSK flags value on a DNSKEY.
pub const DNSKEY_FLAGS_KSK: u16 = 257;
