use std::collections::HashMap;

use tracing::{debug, trace, warn};

use super::algorithm::{Algorithm, VerifyError};
use super::digest::DigestType;
use crate::dns::enums::CLASS_IN;
use crate::dns::name;
use crate::dns::record::{Dnskey, Record, RData, Rrsig};
use crate::dns::ParseError;
use crate::error::{ResolveError, Result};
use crate::rrset::RRSet;

/// A DNSSEC-enabled zone: its DNSKEY RRset, the DS RRset the parent
/// publishes about it, and a key tag index over the zone's keys.
///
/// Zones live in the `AuthChain`'s vector; `parent` is an index into
/// that vector rather than a shared pointer, so ownership stays with the
/// chain.
#[derive(Debug, Default)]
pub struct SignedZone {
    pub zone: String,
    pub dnskey: RRSet,
    pub ds: RRSet,
    key_index: HashMap<u16, Dnskey>,
    pub(crate) parent: Option<usize>,
}

impl SignedZone {
    pub fn new(zone: String) -> Self {
        Self {
            zone,
            ..Self::default()
        }
    }

    /// Rebuilds the key tag index from `dnskey.records`. Key tags are
    /// expected to be unique; on a collision the later key wins, which
    /// is tolerable because the DS check iterates records until a
    /// matching tag and digest pair is found.
    pub(crate) fn index_keys(&mut self) {
        self.key_index.clear();
        for record in &self.dnskey.records {
            if let RData::Dnskey(key) = &record.rdata {
                self.key_index.insert(key.key_tag(), key.clone());
            }
        }
    }

    /// Looks up a zone key by its key tag.
    pub fn lookup_key(&self, key_tag: u16) -> Option<&Dnskey> {
        self.key_index.get(&key_tag)
    }

    pub fn has_dnskeys(&self) -> bool {
        !self.dnskey.records.is_empty()
    }

    /// Verifies the RRSIG on `rrset` against this zone's keys and checks
    /// the signature validity period at `now`.
    ///
    /// Every retained covering signature is tried; the first that
    /// verifies wins. With no verifiable signature the most specific
    /// failure seen is returned, falling back to `DnskeyNotAvailable`
    /// when no signature matched a key at all.
    pub fn verify_rrsig(&self, rrset: &RRSet, now: u32) -> Result<()> {
        if !rrset.is_signed() {
            return Err(ResolveError::InvalidRrsig);
        }

        let mut failure: Option<ResolveError> = None;
        for sig in &rrset.sigs {
            let key = match self.lookup_key(sig.key_tag) {
                Some(key) => key,
                None => {
                    debug!("DNSKEY keytag {} not found in {}", sig.key_tag, self.zone);
                    continue;
                }
            };
            match verify_one(sig, key, &rrset.records, now) {
                Ok(()) => {
                    trace!(
                        "RRSIG keytag {} verified against {} ({} records)",
                        sig.key_tag,
                        self.zone,
                        rrset.records.len()
                    );
                    return Ok(());
                }
                Err(err) => {
                    debug!("RRSIG keytag {} on {}: {}", sig.key_tag, self.zone, err);
                    failure.get_or_insert(err);
                }
            }
        }
        Err(failure.unwrap_or(ResolveError::DnskeyNotAvailable))
    }

    /// Validates the parent-held DS RRset against this zone's keys: at
    /// least one DS must carry a supported digest that matches the
    /// digest of the key it names.
    ///
    /// The first DS with a supported digest type decides the outcome; a
    /// mismatch there is already a delegation failure, matching keys on
    /// another record would be unusual.
    pub fn verify_ds(&self, ds_records: &[Record]) -> Result<()> {
        for record in ds_records {
            let ds = match &record.rdata {
                RData::Ds(ds) => ds,
                _ => continue,
            };
            let digest_type = match DigestType::from_u8(ds.digest_type) {
                Some(dt) if dt.is_supported() => dt,
                _ => {
                    debug!("unknown digest type ({}) on DS record", ds.digest_type);
                    continue;
                }
            };
            let key = match self.lookup_key(ds.key_tag) {
                Some(key) => key,
                None => {
                    debug!("DNSKEY keytag {} not found in {}", ds.key_tag, self.zone);
                    return Err(ResolveError::DnskeyNotAvailable);
                }
            };
            let digest = self.dnskey_digest(key, digest_type)?;
            if digest == ds.digest {
                return Ok(());
            }
            warn!("DS digest does not match DNSKEY {} on {}", ds.key_tag, self.zone);
            return Err(ResolveError::DsInvalid);
        }
        Err(ResolveError::UnknownDsDigestType)
    }

    /// DS-style digest over this zone's canonical owner name followed by
    /// the DNSKEY rdata (RFC 4034 §5.1.4, RFC 4509).
    fn dnskey_digest(&self, key: &Dnskey, digest_type: DigestType) -> Result<Vec<u8>> {
        let mut data = name::to_wire_canonical(&self.zone).map_err(ResolveError::Malformed)?;
        data.extend_from_slice(&RData::Dnskey(key.clone()).to_wire());
        digest_type
            .digest(&data)
            .ok_or(ResolveError::UnknownDsDigestType)
    }
}

fn verify_one(sig: &Rrsig, key: &Dnskey, records: &[Record], now: u32) -> Result<()> {
    if key.algorithm != sig.algorithm {
        debug!(
            "DNSKEY keytag {} algorithm {} does not match RRSIG algorithm {}",
            sig.key_tag, key.algorithm, sig.algorithm
        );
        return Err(ResolveError::RrsigValidation);
    }
    let algorithm = match Algorithm::from_u8(sig.algorithm) {
        Some(alg) if alg.is_supported() => alg,
        _ => {
            debug!("unsupported RRSIG algorithm {}", sig.algorithm);
            return Err(ResolveError::RrsigValidation);
        }
    };

    let message = signed_data(sig, records).map_err(ResolveError::Malformed)?;
    algorithm
        .verify(&key.public_key, &message, &sig.signature)
        .map_err(|err| match err {
            VerifyError::UnsupportedAlgorithm(_) | VerifyError::BadPublicKey => {
                debug!("cannot use DNSKEY keytag {}: {}", sig.key_tag, err);
                ResolveError::RrsigValidation
            }
            VerifyError::BadSignature => ResolveError::RrsigValidation,
        })?;

    if !sig.validity_period(now) {
        debug!("RRSIG keytag {} outside validity period", sig.key_tag);
        return Err(ResolveError::RrsigValidityPeriod);
    }
    Ok(())
}

/// Serializes the data an RRSIG signs (RFC 4034 §3.1.8.1): the RRSIG
/// rdata up to and excluding the signature, with the signer name in
/// canonical form, followed by each record of the set in canonical form
/// and canonical order.
pub(crate) fn signed_data(sig: &Rrsig, records: &[Record]) -> std::result::Result<Vec<u8>, ParseError> {
    let mut data = Vec::with_capacity(256);
    data.extend_from_slice(&sig.type_covered.to_u16().to_be_bytes());
    data.push(sig.algorithm);
    data.push(sig.labels);
    data.extend_from_slice(&sig.original_ttl.to_be_bytes());
    data.extend_from_slice(&sig.expiration.to_be_bytes());
    data.extend_from_slice(&sig.inception.to_be_bytes());
    data.extend_from_slice(&sig.key_tag.to_be_bytes());
    data.extend_from_slice(&name::to_wire_canonical(&sig.signer_name)?);

    // Canonical RRset order sorts by rdata, treated as an unsigned
    // octet string.
    let mut rdatas: Vec<(Vec<u8>, &Record)> = records
        .iter()
        .map(|record| (record.rdata.to_wire(), record))
        .collect();
    rdatas.sort_by(|a, b| a.0.cmp(&b.0));

    for (rdata, record) in rdatas {
        let owner = signed_owner(&record.name, sig.labels);
        data.extend_from_slice(&name::to_wire_canonical(&owner)?);
        data.extend_from_slice(&record.rtype.to_u16().to_be_bytes());
        data.extend_from_slice(&CLASS_IN.to_be_bytes());
        data.extend_from_slice(&sig.original_ttl.to_be_bytes());
        data.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        data.extend_from_slice(&rdata);
    }
    Ok(data)
}

/// Owner name as it entered the signature. A wildcard-expanded answer
/// has more labels than the RRSIG's labels field says were signed; the
/// signed owner is then `*.` plus the rightmost labels (RFC 4035
/// §5.3.2).
fn signed_owner(owner: &str, sig_labels: u8) -> String {
    let labels = name::labels(owner);
    if labels.len() > sig_labels as usize {
        format!("*.{}", name::suffix(owner, sig_labels as usize))
    } else {
        name::fqdn(owner)
    }
}
