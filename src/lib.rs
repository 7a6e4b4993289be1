pub mod config;
pub mod dns;
pub mod dnssec;
pub mod error;
pub mod resolver;
pub mod rrset;
pub mod transport;

pub use config::ResolverConfig;
pub use error::{ResolveError, Result};
pub use resolver::{LookupIp, Resolver, ResolverOpts, ValidationStatus};
pub use rrset::RRSet;
pub use transport::{FixtureTransport, Transport, UdpTransport};
