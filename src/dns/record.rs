use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use base64::Engine;
use chrono::DateTime;

use super::enums::{RecordType, CLASS_IN};
use super::{name, ParseError};
use crate::dnssec::key_tag::calculate_key_tag;

/// DNSKEY rdata (RFC 4034 §2). Flags 256 mark a ZSK, 257 a KSK.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dnskey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl Dnskey {
    pub fn key_tag(&self) -> u16 {
        calculate_key_tag(self.flags, self.protocol, self.algorithm, &self.public_key)
    }

    pub fn is_zsk(&self) -> bool {
        self.flags == crate::dnssec::DNSKEY_FLAGS_ZSK
    }

    pub fn is_ksk(&self) -> bool {
        self.flags == crate::dnssec::DNSKEY_FLAGS_KSK
    }
}

/// DS rdata (RFC 4034 §5). The digest is stored raw, not hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

/// RRSIG rdata (RFC 4034 §3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: RecordType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

impl Rrsig {
    /// True when `now` falls inside [inception, expiration]. Timestamps
    /// use RFC 1982 serial arithmetic, so comparisons survive the 2106
    /// wrap.
    pub fn validity_period(&self, now: u32) -> bool {
        let since_inception = now.wrapping_sub(self.inception) as i32;
        let until_expiration = self.expiration.wrapping_sub(now) as i32;
        since_inception >= 0 && until_expiration >= 0
    }
}

/// Typed rdata for the record types the resolver inspects; everything
/// else rides along as raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Dnskey(Dnskey),
    Ds(Ds),
    Rrsig(Rrsig),
    Opaque(Vec<u8>),
}

impl RData {
    /// Wire encoding of the rdata. For the types handled here this is
    /// also the canonical form of RFC 4034 §6.2: none of them embeds a
    /// compressible or case-folded name except RRSIG, whose signer name
    /// is emitted uncompressed with its case preserved.
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            Self::A(addr) => addr.octets().to_vec(),
            Self::Aaaa(addr) => addr.octets().to_vec(),
            Self::Dnskey(key) => {
                let mut out = Vec::with_capacity(4 + key.public_key.len());
                out.extend_from_slice(&key.flags.to_be_bytes());
                out.push(key.protocol);
                out.push(key.algorithm);
                out.extend_from_slice(&key.public_key);
                out
            }
            Self::Ds(ds) => {
                let mut out = Vec::with_capacity(4 + ds.digest.len());
                out.extend_from_slice(&ds.key_tag.to_be_bytes());
                out.push(ds.algorithm);
                out.push(ds.digest_type);
                out.extend_from_slice(&ds.digest);
                out
            }
            Self::Rrsig(sig) => {
                let mut out = Vec::with_capacity(18 + sig.signature.len());
                out.extend_from_slice(&sig.type_covered.to_u16().to_be_bytes());
                out.push(sig.algorithm);
                out.push(sig.labels);
                out.extend_from_slice(&sig.original_ttl.to_be_bytes());
                out.extend_from_slice(&sig.expiration.to_be_bytes());
                out.extend_from_slice(&sig.inception.to_be_bytes());
                out.extend_from_slice(&sig.key_tag.to_be_bytes());
                // Names embedded in rdata must not be compressed.
                out.extend_from_slice(&name::to_wire(&sig.signer_name).unwrap_or_else(|_| vec![0]));
                out.extend_from_slice(&sig.signature);
                out
            }
            Self::Opaque(bytes) => bytes.clone(),
        }
    }
}

/// A single resource record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub rtype: RecordType,
    pub class: u16,
    pub ttl: u32,
    pub rdata: RData,
}

impl Record {
    /// Reads one record at absolute position `pos` in the message buffer.
    /// Returns the record and the position just past it.
    pub fn read(buf: &[u8], pos: usize) -> Result<(Self, usize), ParseError> {
        let (owner, pos) = name::read_name(buf, pos)?;
        let fixed = buf.get(pos..pos + 10).ok_or(ParseError::UnexpectedEnd)?;
        let rtype = RecordType::from_u16(u16::from_be_bytes([fixed[0], fixed[1]]));
        let class = u16::from_be_bytes([fixed[2], fixed[3]]);
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rdlen = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;
        let rdata_start = pos + 10;
        let rdata_end = rdata_start + rdlen;
        if buf.len() < rdata_end {
            return Err(ParseError::UnexpectedEnd);
        }
        let rdata = Self::read_rdata(buf, rtype, rdata_start, rdata_end)?;
        Ok((
            Self {
                name: owner,
                rtype,
                class,
                ttl,
                rdata,
            },
            rdata_end,
        ))
    }

    fn read_rdata(
        buf: &[u8],
        rtype: RecordType,
        start: usize,
        end: usize,
    ) -> Result<RData, ParseError> {
        let rdata = &buf[start..end];
        match rtype {
            RecordType::A => {
                let octets: [u8; 4] = rdata.try_into().map_err(|_| ParseError::BadRdata)?;
                Ok(RData::A(Ipv4Addr::from(octets)))
            }
            RecordType::Aaaa => {
                let octets: [u8; 16] = rdata.try_into().map_err(|_| ParseError::BadRdata)?;
                Ok(RData::Aaaa(Ipv6Addr::from(octets)))
            }
            RecordType::Dnskey => {
                if rdata.len() < 4 {
                    return Err(ParseError::BadRdata);
                }
                Ok(RData::Dnskey(Dnskey {
                    flags: u16::from_be_bytes([rdata[0], rdata[1]]),
                    protocol: rdata[2],
                    algorithm: rdata[3],
                    public_key: rdata[4..].to_vec(),
                }))
            }
            RecordType::Ds => {
                if rdata.len() < 4 {
                    return Err(ParseError::BadRdata);
                }
                Ok(RData::Ds(Ds {
                    key_tag: u16::from_be_bytes([rdata[0], rdata[1]]),
                    algorithm: rdata[2],
                    digest_type: rdata[3],
                    digest: rdata[4..].to_vec(),
                }))
            }
            RecordType::Rrsig => {
                if rdata.len() < 18 {
                    return Err(ParseError::BadRdata);
                }
                // The signer name is defined as uncompressed, but it is
                // read against the full message so a compressed one from
                // a sloppy server still parses.
                let (signer_name, sig_start) = name::read_name(buf, start + 18)?;
                if sig_start > end {
                    return Err(ParseError::BadRdata);
                }
                Ok(RData::Rrsig(Rrsig {
                    type_covered: RecordType::from_u16(u16::from_be_bytes([rdata[0], rdata[1]])),
                    algorithm: rdata[2],
                    labels: rdata[3],
                    original_ttl: u32::from_be_bytes([rdata[4], rdata[5], rdata[6], rdata[7]]),
                    expiration: u32::from_be_bytes([rdata[8], rdata[9], rdata[10], rdata[11]]),
                    inception: u32::from_be_bytes([rdata[12], rdata[13], rdata[14], rdata[15]]),
                    key_tag: u16::from_be_bytes([rdata[16], rdata[17]]),
                    signer_name,
                    signature: buf[sig_start..end].to_vec(),
                }))
            }
            _ => Ok(RData::Opaque(rdata.to_vec())),
        }
    }

    /// Serializes the record uncompressed.
    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), ParseError> {
        out.extend_from_slice(&name::to_wire(&self.name)?);
        out.extend_from_slice(&self.rtype.to_u16().to_be_bytes());
        out.extend_from_slice(&self.class.to_be_bytes());
        out.extend_from_slice(&self.ttl.to_be_bytes());
        let rdata = self.rdata.to_wire();
        if rdata.len() > u16::MAX as usize {
            return Err(ParseError::BadRdata);
        }
        out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(&rdata);
        Ok(())
    }
}

fn fmt_sig_time(ts: u32) -> String {
    match DateTime::from_timestamp(ts as i64, 0) {
        Some(dt) => dt.format("%Y%m%d%H%M%S").to_string(),
        None => ts.to_string(),
    }
}

impl fmt::Display for Record {
    /// Presentation format, one record per line, as in a zone file.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class == CLASS_IN {
            write!(f, "{}\t{}\tIN\t{}\t", self.name, self.ttl, self.rtype)?;
        } else {
            write!(
                f,
                "{}\t{}\tCLASS{}\t{}\t",
                self.name, self.ttl, self.class, self.rtype
            )?;
        }
        let b64 = base64::engine::general_purpose::STANDARD;
        match &self.rdata {
            RData::A(addr) => write!(f, "{}", addr),
            RData::Aaaa(addr) => write!(f, "{}", addr),
            RData::Dnskey(key) => write!(
                f,
                "{} {} {} {}",
                key.flags,
                key.protocol,
                key.algorithm,
                b64.encode(&key.public_key)
            ),
            RData::Ds(ds) => write!(
                f,
                "{} {} {} {}",
                ds.key_tag,
                ds.algorithm,
                ds.digest_type,
                hex::encode_upper(&ds.digest)
            ),
            RData::Rrsig(sig) => write!(
                f,
                "{} {} {} {} {} {} {} {} {}",
                sig.type_covered,
                sig.algorithm,
                sig.labels,
                sig.original_ttl,
                fmt_sig_time(sig.expiration),
                fmt_sig_time(sig.inception),
                sig.key_tag,
                sig.signer_name,
                b64.encode(&sig.signature)
            ),
            // RFC 3597 unknown-rdata notation.
            RData::Opaque(bytes) => write!(f, "\\# {} {}", bytes.len(), hex::encode(bytes)),
        }
    }
}
