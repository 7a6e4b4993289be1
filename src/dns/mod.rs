pub mod enums;
pub mod name;
pub mod record;

use enums::{RecordType, ResponseCode, CLASS_IN};
use record::Record;

/// Errors raised while encoding or decoding wire-format messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedEnd,
    BadLabel,
    BadName,
    BadPointer,
    BadRdata,
    BadHeader,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedEnd => write!(f, "message ends unexpectedly"),
            ParseError::BadLabel => write!(f, "invalid label"),
            ParseError::BadName => write!(f, "invalid domain name"),
            ParseError::BadPointer => write!(f, "invalid compression pointer"),
            ParseError::BadRdata => write!(f, "invalid rdata"),
            ParseError::BadHeader => write!(f, "invalid message header"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Message header (RFC 1035 §4.1.1) with the flag word unpacked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub ad: bool,
    pub cd: bool,
    pub rcode: ResponseCode,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    fn read(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < 12 {
            return Err(ParseError::BadHeader);
        }
        let flags = u16::from_be_bytes([buf[2], buf[3]]);
        Ok(Self {
            id: u16::from_be_bytes([buf[0], buf[1]]),
            qr: flags & 0x8000 != 0,
            opcode: ((flags >> 11) & 0x0F) as u8,
            aa: flags & 0x0400 != 0,
            tc: flags & 0x0200 != 0,
            rd: flags & 0x0100 != 0,
            ra: flags & 0x0080 != 0,
            ad: flags & 0x0020 != 0,
            cd: flags & 0x0010 != 0,
            rcode: ResponseCode::from_u8((flags & 0x000F) as u8),
            qdcount: u16::from_be_bytes([buf[4], buf[5]]),
            ancount: u16::from_be_bytes([buf[6], buf[7]]),
            nscount: u16::from_be_bytes([buf[8], buf[9]]),
            arcount: u16::from_be_bytes([buf[10], buf[11]]),
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut flags: u16 = (self.rcode.to_u8() as u16) & 0x0F;
        flags |= (self.opcode as u16 & 0x0F) << 11;
        if self.qr {
            flags |= 0x8000;
        }
        if self.aa {
            flags |= 0x0400;
        }
        if self.tc {
            flags |= 0x0200;
        }
        if self.rd {
            flags |= 0x0100;
        }
        if self.ra {
            flags |= 0x0080;
        }
        if self.ad {
            flags |= 0x0020;
        }
        if self.cd {
            flags |= 0x0010;
        }
        out.extend_from_slice(&self.id.to_be_bytes());
        out.extend_from_slice(&flags.to_be_bytes());
        out.extend_from_slice(&self.qdcount.to_be_bytes());
        out.extend_from_slice(&self.ancount.to_be_bytes());
        out.extend_from_slice(&self.nscount.to_be_bytes());
        out.extend_from_slice(&self.arcount.to_be_bytes());
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub qname: String,
    pub qtype: RecordType,
    pub qclass: u16,
}

/// A DNS message. The validation engine only ever inspects the header
/// rcode and the answer section; the other sections are kept so replies
/// can be logged or recorded losslessly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
}

impl Message {
    /// Builds a recursive query for `(qname, qtype)` with the DNSSEC-OK
    /// bit set through an EDNS0 OPT record advertising a 4096-byte UDP
    /// buffer (RFC 4035 §4.1).
    pub fn query(id: u16, qname: &str, qtype: RecordType) -> Self {
        Self {
            header: Header {
                id,
                rd: true,
                qdcount: 1,
                arcount: 1,
                ..Header::default()
            },
            questions: vec![Question {
                qname: qname.to_string(),
                qtype,
                qclass: CLASS_IN,
            }],
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: vec![Record {
                name: ".".to_string(),
                rtype: RecordType::Opt,
                // For OPT the class field carries the UDP payload size.
                class: crate::dnssec::EDNS_UDP_SIZE,
                // And the ttl carries ext-rcode/version/flags; DO is the
                // top bit of the flags half.
                ttl: crate::dnssec::EDNS_DO_FLAG as u32,
                rdata: record::RData::Opaque(Vec::new()),
            }],
        }
    }

    /// Convenience constructor used by fixture transports.
    pub fn reply(rcode: ResponseCode, answers: Vec<Record>) -> Self {
        Self {
            header: Header {
                qr: true,
                rd: true,
                ra: true,
                rcode,
                ancount: answers.len() as u16,
                ..Header::default()
            },
            questions: Vec::new(),
            answers,
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    pub fn rcode(&self) -> ResponseCode {
        self.header.rcode
    }

    pub fn is_truncated(&self) -> bool {
        self.header.tc
    }

    /// Serializes the message without name compression.
    pub fn to_wire(&self) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::with_capacity(512);
        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authorities.len() as u16;
        header.arcount = self.additionals.len() as u16;
        header.write(&mut out);
        for q in &self.questions {
            out.extend_from_slice(&name::to_wire(&q.qname)?);
            out.extend_from_slice(&q.qtype.to_u16().to_be_bytes());
            out.extend_from_slice(&q.qclass.to_be_bytes());
        }
        for record in self
            .answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additionals.iter())
        {
            record.write(&mut out)?;
        }
        Ok(out)
    }

    /// Parses a wire-format message.
    pub fn from_wire(buf: &[u8]) -> Result<Self, ParseError> {
        let header = Header::read(buf)?;
        let mut pos = 12;

        let mut questions = Vec::with_capacity(header.qdcount as usize);
        for _ in 0..header.qdcount {
            let (qname, after) = name::read_name(buf, pos)?;
            let fixed = buf.get(after..after + 4).ok_or(ParseError::UnexpectedEnd)?;
            questions.push(Question {
                qname,
                qtype: RecordType::from_u16(u16::from_be_bytes([fixed[0], fixed[1]])),
                qclass: u16::from_be_bytes([fixed[2], fixed[3]]),
            });
            pos = after + 4;
        }

        let read_section = |count: u16, pos: &mut usize| -> Result<Vec<Record>, ParseError> {
            let mut records = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let (record, after) = Record::read(buf, *pos)?;
                records.push(record);
                *pos = after;
            }
            Ok(records)
        };

        let answers = read_section(header.ancount, &mut pos)?;
        let authorities = read_section(header.nscount, &mut pos)?;
        let additionals = read_section(header.arcount, &mut pos)?;

        Ok(Self {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }
}
