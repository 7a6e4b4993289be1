use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use base64::Engine;
use chrono::NaiveDateTime;
use tracing::{debug, trace};

use super::Transport;
use crate::dns::enums::{RecordType, ResponseCode, CLASS_IN};
use crate::dns::name;
use crate::dns::record::{Dnskey, Ds, RData, Record, Rrsig};
use crate::dns::{Message, ParseError};
use crate::error::{ResolveError, Result};

/// Transport replaying canned replies from flat files of
/// presentation-format records, one file per `(qtype, qname)` pair
/// (`A_stakey.org.` and the like).
///
/// A missing file replays as NXDOMAIN and an empty file as a NOERROR
/// reply with no answers. In record mode, queries missing from the
/// fixture directory are forwarded to a live transport and the answer
/// section is written down for later replay.
pub struct FixtureTransport {
    dir: PathBuf,
    live: Option<Box<dyn Transport>>,
}

impl FixtureTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            live: None,
        }
    }

    pub fn recording(dir: impl Into<PathBuf>, live: Box<dyn Transport>) -> Self {
        Self {
            dir: dir.into(),
            live: Some(live),
        }
    }

    fn fixture_path(&self, qname: &str, qtype: RecordType) -> PathBuf {
        self.dir.join(format!("{}_{}", qtype, qname))
    }

    fn replay(&self, path: &Path) -> Result<Message> {
        let text = std::fs::read_to_string(path)?;
        let mut answers = Vec::new();
        for line in text.lines() {
            let line = line.split(';').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            answers.push(parse_record(line).map_err(ResolveError::Malformed)?);
        }
        Ok(Message::reply(ResponseCode::NoError, answers))
    }

    fn record(&self, path: &Path, reply: &Message) -> Result<()> {
        if reply.rcode() != ResponseCode::NoError {
            return Ok(()); // an absent fixture file already means NXDOMAIN
        }
        let mut text = String::new();
        for record in &reply.answers {
            text.push_str(&record.to_string());
            text.push('\n');
        }
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn query(&self, qname: &str, qtype: RecordType) -> Result<Message> {
        let path = self.fixture_path(qname, qtype);
        if path.exists() {
            trace!("replaying fixture {}", path.display());
            return self.replay(&path);
        }
        match &self.live {
            Some(live) => {
                debug!("recording fixture {}", path.display());
                let reply = live.query(qname, qtype).await?;
                self.record(&path, &reply)?;
                Ok(reply)
            }
            None => Ok(Message::reply(ResponseCode::NxDomain, Vec::new())),
        }
    }
}

/// Parses one presentation-format record: owner, ttl, optional class,
/// type, and the type-specific rdata fields.
fn parse_record(line: &str) -> std::result::Result<Record, ParseError> {
    let mut fields = line.split_whitespace();
    let owner = name::fqdn(fields.next().ok_or(ParseError::BadRdata)?);
    name::validate(&owner)?;
    let ttl = fields
        .next()
        .and_then(|f| f.parse::<u32>().ok())
        .ok_or(ParseError::BadRdata)?;
    let mut type_field = fields.next().ok_or(ParseError::BadRdata)?;
    if type_field == "IN" {
        type_field = fields.next().ok_or(ParseError::BadRdata)?;
    }
    let rtype = RecordType::from_str(type_field).map_err(|_| ParseError::BadRdata)?;

    let rest: Vec<&str> = fields.collect();
    let rdata = parse_rdata(rtype, &rest)?;
    Ok(Record {
        name: owner,
        rtype,
        class: CLASS_IN,
        ttl,
        rdata,
    })
}

fn parse_rdata(rtype: RecordType, fields: &[&str]) -> std::result::Result<RData, ParseError> {
    let b64 = base64::engine::general_purpose::STANDARD;
    match rtype {
        RecordType::A => {
            let addr = one_field(fields)?
                .parse::<Ipv4Addr>()
                .map_err(|_| ParseError::BadRdata)?;
            Ok(RData::A(addr))
        }
        RecordType::Aaaa => {
            let addr = one_field(fields)?
                .parse::<Ipv6Addr>()
                .map_err(|_| ParseError::BadRdata)?;
            Ok(RData::Aaaa(addr))
        }
        RecordType::Dnskey => {
            if fields.len() < 4 {
                return Err(ParseError::BadRdata);
            }
            Ok(RData::Dnskey(Dnskey {
                flags: parse_int(fields[0])?,
                protocol: parse_int(fields[1])?,
                algorithm: parse_int(fields[2])?,
                public_key: b64
                    .decode(fields[3..].concat())
                    .map_err(|_| ParseError::BadRdata)?,
            }))
        }
        RecordType::Ds => {
            if fields.len() < 4 {
                return Err(ParseError::BadRdata);
            }
            Ok(RData::Ds(Ds {
                key_tag: parse_int(fields[0])?,
                algorithm: parse_int(fields[1])?,
                digest_type: parse_int(fields[2])?,
                digest: hex::decode(fields[3..].concat().to_lowercase())
                    .map_err(|_| ParseError::BadRdata)?,
            }))
        }
        RecordType::Rrsig => {
            if fields.len() < 9 {
                return Err(ParseError::BadRdata);
            }
            let type_covered =
                RecordType::from_str(fields[0]).map_err(|_| ParseError::BadRdata)?;
            Ok(RData::Rrsig(Rrsig {
                type_covered,
                algorithm: parse_int(fields[1])?,
                labels: parse_int(fields[2])?,
                original_ttl: parse_int(fields[3])?,
                expiration: parse_sig_time(fields[4])?,
                inception: parse_sig_time(fields[5])?,
                key_tag: parse_int(fields[6])?,
                signer_name: name::fqdn(fields[7]),
                signature: b64
                    .decode(fields[8..].concat())
                    .map_err(|_| ParseError::BadRdata)?,
            }))
        }
        _ => Err(ParseError::BadRdata),
    }
}

fn one_field<'a>(fields: &[&'a str]) -> std::result::Result<&'a str, ParseError> {
    match fields {
        &[field] => Ok(field),
        _ => Err(ParseError::BadRdata),
    }
}

fn parse_int<T: FromStr>(field: &str) -> std::result::Result<T, ParseError> {
    field.parse().map_err(|_| ParseError::BadRdata)
}

/// RRSIG timestamps in presentation format are either `YYYYMMDDHHmmSS`
/// in UTC or a plain epoch count (RFC 4034 §3.2).
fn parse_sig_time(field: &str) -> std::result::Result<u32, ParseError> {
    if field.len() == 14 {
        if let Ok(dt) = NaiveDateTime::parse_from_str(field, "%Y%m%d%H%M%S") {
            return Ok(dt.and_utc().timestamp() as u32);
        }
    }
    parse_int(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_a_line() {
        let record = parse_record("stakey.org.\t300\tIN\tA\t192.0.2.7").unwrap();
        assert_eq!(record.name, "stakey.org.");
        assert_eq!(record.ttl, 300);
        assert_eq!(record.rdata, RData::A(Ipv4Addr::new(192, 0, 2, 7)));
    }

    #[test]
    fn parse_line_without_class() {
        let record = parse_record("stakey.org. 300 AAAA 2001:db8::7").unwrap();
        assert_eq!(record.rtype, RecordType::Aaaa);
    }

    #[test]
    fn parse_dnskey_line_with_split_key() {
        let record =
            parse_record("org. 900 IN DNSKEY 256 3 8 AwEA AaBB").unwrap();
        match record.rdata {
            RData::Dnskey(key) => {
                assert_eq!(key.flags, 256);
                assert_eq!(key.protocol, 3);
                assert_eq!(key.algorithm, 8);
                assert!(!key.public_key.is_empty());
            }
            other => panic!("expected DNSKEY, got {:?}", other),
        }
    }

    #[test]
    fn parse_rrsig_line_roundtrips_through_display() {
        let line = "stakey.org. 300 IN RRSIG A 8 2 300 20190316000000 20190314000000 4242 stakey.org. q80=";
        let record = parse_record(line).unwrap();
        let sig = match &record.rdata {
            RData::Rrsig(sig) => sig.clone(),
            other => panic!("expected RRSIG, got {:?}", other),
        };
        assert_eq!(sig.type_covered, RecordType::A);
        assert_eq!(sig.key_tag, 4242);
        assert_eq!(sig.signer_name, "stakey.org.");
        assert!(sig.validity_period(1552608000)); // 2019-03-15
        assert!(!sig.validity_period(1552780800)); // 2019-03-17

        let reparsed = parse_record(&record.to_string()).unwrap();
        assert_eq!(reparsed, record);
    }

    #[test]
    fn garbage_line_rejected() {
        assert!(parse_record("stakey.org. ten IN A 192.0.2.7").is_err());
        assert!(parse_record("stakey.org. 300 IN A not-an-ip").is_err());
        assert!(parse_record("stakey.org. 300 IN TXT \"x\"").is_err());
    }

    struct StaticTransport(Message);

    #[async_trait]
    impl Transport for StaticTransport {
        async fn query(&self, _qname: &str, _qtype: RecordType) -> Result<Message> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn recorded_queries_replay_identically() {
        let dir = tempfile::tempdir().unwrap();
        let answer = parse_record(
            "stakey.org. 300 IN RRSIG A 8 2 300 20190316000000 20190314000000 4242 stakey.org. q80=",
        )
        .unwrap();
        let live = StaticTransport(Message::reply(ResponseCode::NoError, vec![answer.clone()]));

        let recorder = FixtureTransport::recording(dir.path(), Box::new(live));
        let first = recorder.query("stakey.org.", RecordType::A).await.unwrap();
        assert_eq!(first.answers, vec![answer.clone()]);

        let replayer = FixtureTransport::new(dir.path());
        let second = replayer.query("stakey.org.", RecordType::A).await.unwrap();
        assert_eq!(second.answers, vec![answer]);
    }

    #[tokio::test]
    async fn missing_fixture_replays_nxdomain() {
        let transport = FixtureTransport::new("/nonexistent-fixture-dir");
        let reply = transport
            .query("no-such-host.example.", RecordType::A)
            .await
            .unwrap();
        assert_eq!(reply.rcode(), ResponseCode::NxDomain);
    }
}
