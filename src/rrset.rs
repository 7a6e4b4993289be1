use tracing::{debug, trace};

use crate::dns::enums::{RecordType, ResponseCode};
use crate::dns::name;
use crate::dns::record::{RData, Record, Rrsig};
use crate::error::{ResolveError, Result};
use crate::transport::Transport;

/// The records of one `(owner, type)` pair together with the RRSIGs
/// covering them. All covering signatures are retained; verification
/// succeeds if any one of them verifies.
#[derive(Clone, Debug, Default)]
pub struct RRSet {
    pub records: Vec<Record>,
    pub sigs: Vec<Rrsig>,
}

impl RRSet {
    pub fn is_signed(&self) -> bool {
        !self.sigs.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Signer zone named by the covering RRSIG, if any.
    pub fn signer_name(&self) -> Option<&str> {
        self.sigs.first().map(|sig| sig.signer_name.as_str())
    }
}

/// Queries `(qname, qtype)` and assembles the answer section into an
/// `RRSet`.
///
/// NXDOMAIN maps to `NoResult`; an empty answer section yields an empty,
/// unsigned set. Answer records of foreign types are dropped, as are
/// RRSIGs that do not cover `qtype` at `qname` or whose signer is not a
/// parent of the owner.
pub(crate) async fn query_rrset(
    transport: &dyn Transport,
    qname: &str,
    qtype: RecordType,
) -> Result<RRSet> {
    let reply = transport.query(qname, qtype).await?;

    if reply.rcode() == ResponseCode::NxDomain {
        debug!("no such domain {}", qname);
        return Err(ResolveError::NoResult);
    }

    let mut result = RRSet::default();
    for record in reply.answers {
        match record.rdata {
            RData::Rrsig(sig) => {
                if sig.type_covered != qtype || !name::eq_ignore_case(&record.name, qname) {
                    trace!(
                        "dropping RRSIG over {} {} while assembling {} {}",
                        record.name, sig.type_covered, qname, qtype
                    );
                    continue;
                }
                if !name::is_parent_of(&sig.signer_name, qname) {
                    debug!(
                        "dropping RRSIG with foreign signer {} on {}",
                        sig.signer_name, qname
                    );
                    continue;
                }
                result.sigs.push(sig);
            }
            _ if record.rtype == qtype && name::eq_ignore_case(&record.name, qname) => {
                result.records.push(record);
            }
            _ => trace!(
                "dropping {} {} from answer for {} {}",
                record.name, record.rtype, qname, qtype
            ),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_predicates() {
        let rrset = RRSet::default();
        assert!(rrset.is_empty());
        assert!(!rrset.is_signed());
        assert_eq!(rrset.signer_name(), None);
    }
}
