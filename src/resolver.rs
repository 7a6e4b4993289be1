use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::dns::enums::RecordType;
use crate::dns::name;
use crate::dns::record::{RData, Record};
use crate::dnssec::AuthChain;
use crate::error::{ResolveError, Result};
use crate::rrset::{query_rrset, RRSet};
use crate::transport::{Transport, UdpTransport};

/// Disposition of a lookup that produced records.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValidationStatus {
    /// The full chain of trust verified.
    Secure,
    /// The answer carried no RRSIG; callers decide whether to accept it.
    Insecure,
}

/// Addresses from a lookup together with their validation disposition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupIp {
    pub addrs: Vec<IpAddr>,
    pub status: ValidationStatus,
}

impl LookupIp {
    pub fn is_secure(&self) -> bool {
        self.status == ValidationStatus::Secure
    }
}

/// Options governing chain construction.
#[derive(Clone, Debug)]
pub struct ResolverOpts {
    /// Highest zone the delegation walk reaches. The default walks the
    /// whole suffix chain to the root; setting a TLD here expresses
    /// trust in that zone's keys instead of a root anchor.
    pub trust_zone: String,
}

impl Default for ResolverOpts {
    fn default() -> Self {
        Self {
            trust_zone: ".".to_string(),
        }
    }
}

/// DNSSEC-validating stub resolver.
///
/// Every lookup fetches the answer RRset, builds the chain of trust for
/// its signer zone, verifies it, and only then surfaces records. All
/// state is per-call except the transport, options and test clock, which
/// are fixed at construction.
pub struct Resolver {
    transport: Arc<dyn Transport>,
    opts: ResolverOpts,
    current_time: Option<u32>,
}

impl Resolver {
    /// Creates a resolver from a BIND-style resolv.conf at `path`,
    /// speaking plain DNS to the nameservers configured there.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let config = ResolverConfig::from_file(path)?;
        Ok(Self::with_transport(
            Arc::new(UdpTransport::new(config)),
            ResolverOpts::default(),
        ))
    }

    /// Creates a resolver over an arbitrary transport, typically a
    /// fixture transport in tests.
    pub fn with_transport(transport: Arc<dyn Transport>, opts: ResolverOpts) -> Self {
        Self {
            transport,
            opts,
            current_time: None,
        }
    }

    /// Overrides the zone whose keys form the top of every chain.
    pub fn set_trust_zone(&mut self, zone: &str) {
        self.opts.trust_zone = name::fqdn(zone);
    }

    /// Pins the validation clock, so archived fixture signatures stay
    /// inside their validity window during tests.
    pub fn set_current_time(&mut self, time: u32) {
        self.current_time = Some(time);
    }

    fn current_time(&self) -> u32 {
        self.current_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or_default()
        })
    }

    /// Resolves both A and AAAA records for `name`, merging validated
    /// addresses. The two branches are independent: a verification
    /// failure on one side is logged and does not poison the other, but
    /// if no branch validates the first hard failure wins.
    pub async fn lookup_ip(&self, name: &str) -> Result<LookupIp> {
        let mut addrs = Vec::new();
        let mut insecure = Vec::new();
        let mut failure: Option<ResolveError> = None;

        for qtype in [RecordType::A, RecordType::Aaaa] {
            match self.lookup_addrs(name, qtype).await {
                Ok(lookup) if lookup.is_secure() => addrs.extend(lookup.addrs),
                Ok(lookup) => insecure.extend(lookup.addrs),
                Err(ResolveError::NoResult) => {}
                Err(err) => {
                    warn!("lookup {} {} failed: {}", name, qtype, err);
                    failure.get_or_insert(err);
                }
            }
        }

        if !addrs.is_empty() {
            return Ok(LookupIp {
                addrs,
                status: ValidationStatus::Secure,
            });
        }
        if let Some(err) = failure {
            return Err(err);
        }
        if !insecure.is_empty() {
            return Ok(LookupIp {
                addrs: insecure,
                status: ValidationStatus::Insecure,
            });
        }
        Err(ResolveError::NoResult)
    }

    /// Resolves and validates A records for `name`.
    pub async fn lookup_ipv4(&self, name: &str) -> Result<LookupIp> {
        self.lookup_addrs(name, RecordType::A).await
    }

    /// Resolves and validates AAAA records for `name`.
    pub async fn lookup_ipv6(&self, name: &str) -> Result<LookupIp> {
        self.lookup_addrs(name, RecordType::Aaaa).await
    }

    /// Resolves an arbitrary record type, refusing unsigned answers.
    pub async fn strict_query(&self, name: &str, qtype: RecordType) -> Result<Vec<Record>> {
        let (rrset, status) = self.validated_rrset(name, qtype).await?;
        if status != ValidationStatus::Secure {
            return Err(ResolveError::ResourceNotSigned);
        }
        Ok(rrset.records)
    }

    async fn lookup_addrs(&self, name: &str, qtype: RecordType) -> Result<LookupIp> {
        let (rrset, status) = self.validated_rrset(name, qtype).await?;
        let addrs = rrset
            .records
            .iter()
            .filter_map(|record| match &record.rdata {
                RData::A(addr) => Some(IpAddr::V4(*addr)),
                RData::Aaaa(addr) => Some(IpAddr::V6(*addr)),
                _ => None,
            })
            .collect();
        Ok(LookupIp { addrs, status })
    }

    /// The shared lookup skeleton: fetch the RRset, locate its signer,
    /// populate the authentication chain and verify it.
    async fn validated_rrset(
        &self,
        qname: &str,
        qtype: RecordType,
    ) -> Result<(RRSet, ValidationStatus)> {
        if qname.is_empty() {
            return Err(ResolveError::InvalidQuery(qname.to_string()));
        }
        let qname = name::fqdn(qname);
        if name::validate(&qname).is_err() {
            return Err(ResolveError::InvalidQuery(qname));
        }

        let rrset = query_rrset(self.transport.as_ref(), &qname, qtype).await?;
        if rrset.is_empty() {
            return Err(ResolveError::NoResult);
        }
        if !rrset.is_signed() {
            debug!("answer for {} {} is not signed", qname, qtype);
            return Ok((rrset, ValidationStatus::Insecure));
        }

        let signer = match rrset.signer_name() {
            Some(signer) => signer.to_string(),
            None => return Err(ResolveError::InvalidRrsig),
        };

        let mut chain = AuthChain::new();
        chain
            .populate(&signer, &self.opts.trust_zone, self.transport.as_ref())
            .await?;
        chain.verify(&rrset, self.current_time())?;

        Ok((rrset, ValidationStatus::Secure))
    }
}
