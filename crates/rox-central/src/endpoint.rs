use std::fmt;

use crate::error::RemoteError;

const DEFAULT_PORT: u16 = 443;

/// A parsed Central endpoint.
///
/// Accepts `host`, `host:port`, `[v6addr]:port`, optionally prefixed with
/// `https://`. The host doubles as the TLS server name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, RemoteError> {
        let invalid = |reason: &str| RemoteError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.starts_with("http://") {
            return Err(invalid("plaintext http is not supported"));
        }
        let rest = trimmed.strip_prefix("https://").unwrap_or(trimmed);
        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            return Err(invalid("empty endpoint"));
        }
        if rest.contains('/') {
            return Err(invalid("endpoint must not contain a path"));
        }

        let (host, port) = if let Some(v6) = rest.strip_prefix('[') {
            let (host, after) = v6
                .split_once(']')
                .ok_or_else(|| invalid("unterminated IPv6 address"))?;
            let port = match after {
                "" => None,
                p => Some(p.strip_prefix(':').ok_or_else(|| invalid("garbage after IPv6 address"))?),
            };
            (host, port)
        } else {
            match rest.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') => (host, Some(port)),
                Some(_) => return Err(invalid("IPv6 addresses must be bracketed")),
                None => (rest, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| invalid("port is not a number"))?,
            None => DEFAULT_PORT,
        };
        if port == 0 {
            return Err(invalid("port must be non-zero"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Name presented in the TLS handshake.
    pub fn server_name(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> String {
        format!("https://{self}")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
