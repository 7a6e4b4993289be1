pub mod fixture;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::config::ResolverConfig;
use crate::dns::enums::{RecordType, ResponseCode};
use crate::dns::Message;
use crate::error::{ResolveError, Result};

pub use fixture::FixtureTransport;

/// How the validation engine reaches the DNS. The single operation sends
/// one query, with recursion desired and the DNSSEC-OK bit set, and
/// returns the reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn query(&self, qname: &str, qtype: RecordType) -> Result<Message>;
}

static QUERY_ID: AtomicU16 = AtomicU16::new(1);

fn next_query_id() -> u16 {
    QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

/// Stub transport speaking plain DNS over UDP to the configured
/// nameservers, falling back to TCP when a reply comes back truncated.
pub struct UdpTransport {
    config: ResolverConfig,
}

impl UdpTransport {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// One UDP exchange with `server`, retransmitting on timeout up to
    /// the configured attempt count.
    async fn exchange_udp(&self, server: SocketAddr, wire: &[u8], id: u16) -> Result<Message> {
        let socket = if server.is_ipv4() {
            UdpSocket::bind("0.0.0.0:0").await?
        } else {
            UdpSocket::bind("[::]:0").await?
        };
        socket.connect(server).await?;

        let mut buf = vec![0u8; crate::dnssec::EDNS_UDP_SIZE as usize];
        for attempt in 1..=self.config.attempts {
            socket.send(wire).await?;
            match timeout(self.config.timeout, socket.recv(&mut buf)).await {
                Ok(received) => {
                    let len = received?;
                    let reply = Message::from_wire(&buf[..len])?;
                    if reply.header.id != id || !reply.header.qr {
                        debug!("mismatched reply from {}, ignoring", server);
                        continue;
                    }
                    return Ok(reply);
                }
                Err(_) => {
                    trace!(
                        "query to {} timed out (attempt {}/{})",
                        server, attempt, self.config.attempts
                    );
                }
            }
        }
        Err(ResolveError::Timeout)
    }

    /// TCP exchange with the two-octet length framing of RFC 1035 §4.2.2.
    async fn exchange_tcp(&self, server: SocketAddr, wire: &[u8], id: u16) -> Result<Message> {
        let mut stream = timeout(self.config.timeout, TcpStream::connect(server))
            .await
            .map_err(|_| ResolveError::Timeout)??;

        let mut framed = Vec::with_capacity(wire.len() + 2);
        framed.extend_from_slice(&(wire.len() as u16).to_be_bytes());
        framed.extend_from_slice(wire);
        stream.write_all(&framed).await?;

        let exchange = async {
            let mut len_buf = [0u8; 2];
            stream.read_exact(&mut len_buf).await?;
            let len = u16::from_be_bytes(len_buf) as usize;
            let mut buf = vec![0u8; len];
            stream.read_exact(&mut buf).await?;
            Ok::<Vec<u8>, std::io::Error>(buf)
        };
        let buf = timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| ResolveError::Timeout)??;

        let reply = Message::from_wire(&buf)?;
        if reply.header.id != id || !reply.header.qr {
            warn!("mismatched TCP reply from {}", server);
            return Err(ResolveError::NsNotAvailable);
        }
        Ok(reply)
    }

    async fn exchange(&self, server: SocketAddr, wire: &[u8], id: u16) -> Result<Message> {
        let reply = self.exchange_udp(server, wire, id).await?;
        if reply.is_truncated() {
            debug!("truncated reply from {}, retrying over TCP", server);
            return self.exchange_tcp(server, wire, id).await;
        }
        Ok(reply)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    /// Tries the configured servers in order and accepts the first reply
    /// whose rcode is NOERROR or NXDOMAIN. A transport-level failure
    /// aborts the whole attempt rather than failing over; exhausting the
    /// list surfaces `NsNotAvailable`.
    async fn query(&self, qname: &str, qtype: RecordType) -> Result<Message> {
        let id = next_query_id();
        let query = Message::query(id, qname, qtype);
        let wire = query.to_wire().map_err(ResolveError::Malformed)?;

        for server in &self.config.servers {
            let addr = SocketAddr::new(*server, self.config.port);
            trace!("querying {} for {} {}", addr, qname, qtype);
            let reply = self.exchange(addr, &wire, id).await?;
            match reply.rcode() {
                ResponseCode::NoError | ResponseCode::NxDomain => return Ok(reply),
                rcode => {
                    debug!("{} answered {} for {} {}", addr, rcode, qname, qtype);
                }
            }
        }
        Err(ResolveError::NsNotAvailable)
    }
}
