//! Client and host configuration.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use super::command::ClientCapabilities;

/// Largest datagram the client builds, keeping clear of IP fragmentation
/// on a 1500-byte Ethernet MTU.
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 1472;

/// Receive buffer size for inbound datagrams.
pub(crate) const RECV_BUFFER_SIZE: usize = 1500;

/// Credentials offered when a host challenges an invitation.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Credentials {
    /// Shared secret authentication
    SharedSecret(String),
    /// User name and password authentication
    User {
        /// User name
        username: String,
        /// Password
        password: String,
    },
}

impl Credentials {
    /// Capability flags advertised in the invitation
    #[must_use]
    pub fn capabilities(&self) -> ClientCapabilities {
        match self {
            Self::SharedSecret(_) => {
                ClientCapabilities::from_bits(ClientCapabilities::INVITATION_WITH_AUTH)
            }
            Self::User { .. } => {
                ClientCapabilities::from_bits(ClientCapabilities::INVITATION_WITH_USER_AUTH)
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SharedSecret(_) => f.write_str("SharedSecret(..)"),
            Self::User { username, .. } => f
                .debug_struct("User")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Configuration for [`UdpClient`](super::UdpClient).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// Endpoint name announced in the invitation
    pub name: String,
    /// Product instance id announced in the invitation (ASCII)
    pub product_instance_id: String,
    /// Local address to bind
    pub bind_addr: SocketAddr,
    /// Credentials for authenticated invitations
    pub credentials: Option<Credentials>,
    /// Optional read timeout for the socket
    pub read_timeout: Option<Duration>,
    /// Optional write timeout for the socket
    pub write_timeout: Option<Duration>,
    /// Largest datagram built when coalescing UMP data
    pub max_datagram_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "netmidi2".to_owned(),
            product_instance_id: String::new(),
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            credentials: None,
            read_timeout: None,
            write_timeout: None,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
        }
    }
}

impl ClientConfig {
    /// Capability flags derived from the configured credentials
    #[must_use]
    pub fn capabilities(&self) -> ClientCapabilities {
        self.credentials
            .as_ref()
            .map(Credentials::capabilities)
            .unwrap_or_default()
    }
}

/// Configuration for [`Host`](super::Host).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostConfig {
    /// Endpoint name sent when accepting invitations
    pub name: String,
    /// Product instance id sent when accepting invitations (ASCII)
    pub product_instance_id: String,
    /// Local address to bind
    pub bind_addr: SocketAddr,
    /// Optional read timeout for the socket
    pub read_timeout: Option<Duration>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: "netmidi2".to_owned(),
            product_instance_id: String::new(),
            bind_addr: SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::UNSPECIFIED,
                crate::DEFAULT_PORT,
            )),
            read_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let client = ClientConfig::default();
        assert_eq!(client.max_datagram_size, 1472);
        assert_eq!(client.bind_addr.port(), 0);
        assert_eq!(client.capabilities().bits(), 0);

        let host = HostConfig::default();
        assert_eq!(host.bind_addr.port(), 5673);
    }

    #[test]
    fn capabilities_follow_credentials() {
        let mut config = ClientConfig {
            credentials: Some(Credentials::SharedSecret("s3cret".into())),
            ..ClientConfig::default()
        };
        assert_eq!(config.capabilities().bits(), 0b01);
        config.credentials = Some(Credentials::User {
            username: "alice".into(),
            password: "pw".into(),
        });
        assert_eq!(config.capabilities().bits(), 0b10);
    }

    #[test]
    fn debug_hides_secrets() {
        let shown = format!("{:?}", Credentials::SharedSecret("s3cret".into()));
        assert!(!shown.contains("s3cret"));
    }
}
