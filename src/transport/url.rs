//! Endpoint addressing: `udp://[user[:password]@]host:port[#group]` or
//! `file:///dev/...[#group]`.
//!
//! Userinfo without a password, or with an empty one, is a shared secret.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::client::UdpClient;
use super::config::{ClientConfig, Credentials};
use super::device::DeviceTransport;
use super::error::TransportError;
use super::ump_transport::UmpTransport;

/// Parsed endpoint address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointUrl {
    /// Network MIDI 2.0 host
    Udp {
        /// Host name or address (IPv6 without brackets)
        host: String,
        /// UDP port
        port: u16,
        /// Embedded credentials
        credentials: Option<Credentials>,
        /// Selected UMP group
        group: Option<u8>,
    },
    /// Local UMP character device
    Device {
        /// Device path
        path: PathBuf,
        /// Selected UMP group
        group: Option<u8>,
    },
}

fn invalid(url: &str, reason: &'static str) -> TransportError {
    TransportError::InvalidUrl {
        url: url.to_owned(),
        reason,
    }
}

impl EndpointUrl {
    /// Parse an endpoint URL.
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let (body, group) = match url.split_once('#') {
            Some((body, fragment)) => {
                let group = fragment
                    .parse::<u8>()
                    .ok()
                    .filter(|g| *g < 16)
                    .ok_or_else(|| invalid(url, "group must be 0-15"))?;
                (body, Some(group))
            }
            None => (url, None),
        };

        if let Some(path) = body.strip_prefix("file://") {
            if path.is_empty() {
                return Err(invalid(url, "missing device path"));
            }
            return Ok(Self::Device {
                path: PathBuf::from(path),
                group,
            });
        }

        let rest = body
            .strip_prefix("udp://")
            .ok_or_else(|| invalid(url, "unsupported scheme"))?;
        let (userinfo, authority) = match rest.rsplit_once('@') {
            Some((userinfo, authority)) => (Some(userinfo), authority),
            None => (None, rest),
        };
        let credentials = match userinfo {
            None => None,
            Some("") => return Err(invalid(url, "empty user")),
            Some(info) => Some(match info.split_once(':') {
                Some((secret, "")) => Credentials::SharedSecret(secret.to_owned()),
                Some((username, password)) => Credentials::User {
                    username: username.to_owned(),
                    password: password.to_owned(),
                },
                None => Credentials::SharedSecret(info.to_owned()),
            }),
        };

        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid(url, "unterminated IPv6 address"))?;
            let port = tail
                .strip_prefix(':')
                .ok_or_else(|| invalid(url, "missing port"))?;
            (host, port)
        } else {
            authority
                .rsplit_once(':')
                .ok_or_else(|| invalid(url, "missing port"))?
        };
        if host.is_empty() {
            return Err(invalid(url, "missing host"));
        }
        let port = port.parse().map_err(|_| invalid(url, "bad port"))?;

        Ok(Self::Udp {
            host: host.to_owned(),
            port,
            credentials,
            group,
        })
    }

    /// Selected UMP group, if any
    #[must_use]
    pub const fn group(&self) -> Option<u8> {
        match self {
            Self::Udp { group, .. } | Self::Device { group, .. } => *group,
        }
    }

    /// Open a transport to this endpoint.
    ///
    /// For UDP the session is connected before returning; credentials in the
    /// URL override those in `config`.
    pub fn open(&self, mut config: ClientConfig) -> Result<Box<dyn UmpTransport>, TransportError> {
        match self {
            Self::Udp {
                host,
                port,
                credentials,
                ..
            } => {
                if credentials.is_some() {
                    config.credentials.clone_from(credentials);
                }
                let mut client = UdpClient::resolve(host, *port, config)?;
                client.connect()?;
                Ok(Box::new(client))
            }
            Self::Device { path, .. } => Ok(Box::new(DeviceTransport::open(path)?)),
        }
    }
}

impl FromStr for EndpointUrl {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp {
                host,
                port,
                credentials,
                group,
            } => {
                f.write_str("udp://")?;
                match credentials {
                    Some(Credentials::SharedSecret(secret)) => write!(f, "{secret}@")?,
                    Some(Credentials::User { username, password }) => {
                        write!(f, "{username}:{password}@")?;
                    }
                    None => {}
                }
                if host.contains(':') {
                    write!(f, "[{host}]:{port}")?;
                } else {
                    write!(f, "{host}:{port}")?;
                }
                if let Some(group) = group {
                    write!(f, "#{group}")?;
                }
                Ok(())
            }
            Self::Device { path, group } => {
                write!(f, "file://{}", path.display())?;
                if let Some(group) = group {
                    write!(f, "#{group}")?;
                }
                Ok(())
            }
        }
    }
}
