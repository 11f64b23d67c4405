//! Network MIDI 2.0 transport: command framing, sessions and the UDP and
//! raw-device endpoints.

mod auth;
mod client;
mod command;
mod config;
mod device;
mod error;
mod host;
mod metrics;
mod session;
mod socket;
mod ump_transport;
mod url;

pub use auth::{NONCE_LEN, answer_challenge, nonce, shared_secret_digest, user_digest};
pub use client::UdpClient;
pub use command::{
    ByeReason, COMMAND_HEADER_SIZE, ClientCapabilities, CommandCode, CommandPacket, FramingError,
    MAGIC, MAX_COMMAND_PAYLOAD, MidiUdpPacket,
};
pub use config::{ClientConfig, Credentials, DEFAULT_MAX_DATAGRAM_SIZE, HostConfig};
pub use device::DeviceTransport;
pub use error::TransportError;
pub use host::Host;
pub use metrics::{MetricsSnapshot, snapshot as metrics_snapshot};
pub use session::{Dispatch, Identity, Session, SessionError, SessionState, SessionTable};
pub use socket::{SocketBinding, SocketError, resolve};
pub use ump_transport::UmpTransport;
pub use url::EndpointUrl;
