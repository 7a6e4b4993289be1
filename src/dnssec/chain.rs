use tracing::{debug, warn};

use super::signed_zone::SignedZone;
use crate::dns::enums::RecordType;
use crate::dns::name;
use crate::error::{ResolveError, Result};
use crate::rrset::{query_rrset, RRSet};
use crate::transport::Transport;

/// The DNSSEC chain of trust from the queried zone up toward a trust
/// anchor (RFC 4033). `zones[0]` is the deepest zone; each zone links to
/// the one a label up via an index into the same vector, and the last
/// zone has no parent.
///
/// A chain validates when every zone's DNSKEY RRset is self-signed and,
/// for every non-top zone, the parent signs a DS record matching one of
/// the zone's keys.
#[derive(Debug, Default)]
pub struct AuthChain {
    pub zones: Vec<SignedZone>,
}

impl AuthChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the DNSKEY and DS material for every zone between
    /// `signer_name` and `trust_zone` inclusive, deepest first.
    ///
    /// Missing RRsets are recorded as empty rather than failing here, so
    /// verification can tell "zone publishes no keys" apart from a
    /// transport failure. Only transport-level errors abort population.
    pub async fn populate(
        &mut self,
        signer_name: &str,
        trust_zone: &str,
        transport: &dyn Transport,
    ) -> Result<()> {
        let signer = name::fqdn(signer_name);
        let labels = name::labels(&signer);

        // Zones below the configured trust zone are skipped; if the
        // signer is not under the trust zone at all, walk to the root.
        let mut stop = name::labels(trust_zone).len();
        if !name::is_parent_of(trust_zone, &signer) {
            debug!("signer {} is outside trust zone {}", signer, trust_zone);
            stop = 0;
        }

        self.zones = Vec::with_capacity(labels.len() - stop + 1);
        for depth in 0..=(labels.len() - stop) {
            let zone_name = name::suffix(&signer, labels.len() - depth);
            let zone = query_delegation(transport, zone_name).await?;
            self.zones.push(zone);
            let appended = self.zones.len() - 1;
            if appended > 0 {
                self.zones[appended - 1].parent = Some(appended);
            }
        }
        Ok(())
    }

    /// Runs the end-to-end trust check: the answer RRset against the
    /// deepest zone, then per zone the DNSKEY self-signature and, when a
    /// parent exists, the parent-signed DS and its digest. The first
    /// failure aborts the walk.
    pub fn verify(&self, answer: &RRSet, now: u32) -> Result<()> {
        let deepest = match self.zones.first() {
            Some(zone) => zone,
            None => return Err(ResolveError::DnskeyNotAvailable),
        };
        if !deepest.has_dnskeys() {
            return Err(ResolveError::DnskeyNotAvailable);
        }

        if let Err(err) = deepest.verify_rrsig(answer, now) {
            warn!("answer RRSIG did not verify: {}", err);
            return Err(ResolveError::InvalidRrsig);
        }

        for zone in &self.zones {
            if !zone.has_dnskeys() {
                debug!("DNSKEY RRset does not exist on {}", zone.zone);
                return Err(ResolveError::DnskeyNotAvailable);
            }

            // The DNSKEY RRset is signed with the zone's own KSK.
            if let Err(err) = zone.verify_rrsig(&zone.dnskey, now) {
                warn!("DNSKEY validation on {}: {}", zone.zone, err);
                return Err(ResolveError::RrsigValidation);
            }

            let parent = match zone.parent {
                Some(index) => &self.zones[index],
                None => continue, // chain top; its self-signature was the last check
            };

            if zone.ds.is_empty() {
                debug!("DS RRset is not available on {}", zone.zone);
                return Err(ResolveError::DsNotAvailable);
            }
            if let Err(err) = parent.verify_rrsig(&zone.ds, now) {
                warn!(
                    "DS on {} does not validate against parent {}: {}",
                    zone.zone, parent.zone, err
                );
                return Err(ResolveError::RrsigValidation);
            }
            zone.verify_ds(&zone.ds.records).map_err(|err| {
                warn!("DS does not validate on {}: {}", zone.zone, err);
                err
            })?;
        }
        Ok(())
    }
}

/// Builds one chain entry: the zone's DNSKEY RRset (indexed by key tag)
/// and the DS RRset held at its parent.
async fn query_delegation(transport: &dyn Transport, zone_name: String) -> Result<SignedZone> {
    let mut zone = SignedZone::new(zone_name);

    zone.dnskey = match query_rrset(transport, &zone.zone, RecordType::Dnskey).await {
        Ok(rrset) => rrset,
        Err(ResolveError::NoResult) => RRSet::default(),
        Err(err) => return Err(err),
    };
    zone.index_keys();

    // The chain top has no parent to publish a DS; absence only becomes
    // an error during verification if the zone does have a parent.
    zone.ds = match query_rrset(transport, &zone.zone, RecordType::Ds).await {
        Ok(rrset) => rrset,
        Err(ResolveError::NoResult) => RRSet::default(),
        Err(err) => return Err(err),
    };

    Ok(zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FixtureTransport;

    #[test]
    fn empty_chain_fails_verification() {
        let chain = AuthChain::new();
        let answer = RRSet::default();
        assert_eq!(
            chain.verify(&answer, 1552608000),
            Err(ResolveError::DnskeyNotAvailable)
        );
    }

    #[tokio::test]
    async fn populate_links_zones_deepest_first() {
        let transport = FixtureTransport::new("testdata/stakey");
        let mut chain = AuthChain::new();
        chain
            .populate("stakey.org.", "org.", &transport)
            .await
            .unwrap();

        let zones: Vec<&str> = chain.zones.iter().map(|z| z.zone.as_str()).collect();
        assert_eq!(zones, vec!["stakey.org.", "org."]);
        assert_eq!(chain.zones[0].parent, Some(1));
        assert_eq!(chain.zones[1].parent, None);
        assert!(chain.zones[0].has_dnskeys());
        assert!(chain.zones[1].has_dnskeys());
        assert!(!chain.zones[0].ds.is_empty());
    }

    #[tokio::test]
    async fn populate_walks_to_the_root_by_default() {
        let transport = FixtureTransport::new("testdata/stakey");
        let mut chain = AuthChain::new();
        chain.populate("stakey.org.", ".", &transport).await.unwrap();

        let zones: Vec<&str> = chain.zones.iter().map(|z| z.zone.as_str()).collect();
        assert_eq!(zones, vec!["stakey.org.", "org.", "."]);
        // No fixture material for the root: present in the chain, empty.
        assert!(!chain.zones[2].has_dnskeys());
        assert!(chain.zones[2].ds.is_empty());
    }

    #[tokio::test]
    async fn zone_without_keys_fails_with_dnskey_not_available() {
        let transport = FixtureTransport::new("testdata/nokeys");
        let mut chain = AuthChain::new();
        chain
            .populate("stakey.org.", "org.", &transport)
            .await
            .unwrap();

        let answer = crate::rrset::query_rrset(&transport, "stakey.org.", RecordType::A)
            .await
            .unwrap();
        assert!(answer.is_signed());
        assert_eq!(
            chain.verify(&answer, 1552608000),
            Err(ResolveError::DnskeyNotAvailable)
        );
    }
}
