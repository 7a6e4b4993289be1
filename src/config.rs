use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{ResolveError, Result};

/// Resolver configuration read from a BIND-style `resolv.conf`.
///
/// Recognized directives: `nameserver`, `port`, and `options` with
/// `ndots:n`, `timeout:n` (seconds) and `attempts:n`. Unknown lines are
/// ignored, as libc does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    pub servers: Vec<IpAddr>,
    pub port: u16,
    pub ndots: u32,
    pub timeout: Duration,
    pub attempts: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            port: 53,
            ndots: 1,
            timeout: Duration::from_secs(5),
            attempts: 2,
        }
    }
}

impl ResolverConfig {
    /// Reads and parses `path`. Only I/O failures are errors; malformed
    /// directives are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ResolveError::Config {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();
        for line in text.lines() {
            let line = line
                .split(['#', ';'])
                .next()
                .unwrap_or_default()
                .trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("nameserver") => {
                    if let Some(server) = fields.next() {
                        match server.parse::<IpAddr>() {
                            Ok(addr) => config.servers.push(addr),
                            Err(_) => debug!("ignoring invalid nameserver {:?}", server),
                        }
                    }
                }
                Some("port") => {
                    if let Some(port) = fields.next().and_then(|p| p.parse().ok()) {
                        config.port = port;
                    }
                }
                Some("options") => {
                    for option in fields {
                        config.apply_option(option);
                    }
                }
                Some(other) => debug!("ignoring resolv.conf directive {:?}", other),
                None => {}
            }
        }
        config
    }

    fn apply_option(&mut self, option: &str) {
        let (key, value) = match option.split_once(':') {
            Some(pair) => pair,
            None => return,
        };
        match (key, value.parse::<u32>()) {
            ("ndots", Ok(n)) => self.ndots = n,
            ("timeout", Ok(n)) => self.timeout = Duration::from_secs(n.into()),
            ("attempts", Ok(n)) if n > 0 => self.attempts = n,
            _ => debug!("ignoring resolv.conf option {:?}", option),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.port, 53);
        assert_eq!(config.ndots, 1);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.attempts, 2);
        assert!(config.servers.is_empty());
    }

    #[test]
    fn parse_nameservers_and_options() {
        let config = ResolverConfig::parse(
            "# local overrides\n\
             nameserver 127.0.0.53\n\
             nameserver 2001:4860:4860::8888\n\
             port 5353\n\
             options ndots:2 timeout:3 attempts:4\n\
             search example.org ; legacy\n",
        );
        assert_eq!(
            config.servers,
            vec![
                "127.0.0.53".parse::<IpAddr>().unwrap(),
                "2001:4860:4860::8888".parse::<IpAddr>().unwrap(),
            ]
        );
        assert_eq!(config.port, 5353);
        assert_eq!(config.ndots, 2);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.attempts, 4);
    }

    #[test]
    fn malformed_lines_skipped() {
        let config = ResolverConfig::parse(
            "nameserver not-an-ip\n\
             port many\n\
             options attempts:0 ndots:one\n",
        );
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = ResolverConfig::from_file("/nonexistent/resolv.conf").unwrap_err();
        assert!(matches!(err, ResolveError::Config { .. }));
    }
}
