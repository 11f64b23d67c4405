//! Network MIDI 2.0 over UDP, with a complete Universal MIDI Packet codec.
//!
//! The crate has three layers:
//!
//! - [`ump`]: pure encode/decode between typed messages and 32-bit words.
//! - [`transport`]: the UDP command envelope, per-peer sessions, the
//!   blocking [`UdpClient`](transport::UdpClient) and
//!   [`Host`](transport::Host), and a raw-device transport.
//! - [`endpoint`]: function block and name discovery on top of any
//!   [`UmpTransport`](transport::UmpTransport).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use netmidi2::transport::{ClientConfig, UdpClient};
//! use netmidi2::ump::{Midi2ChannelVoice, Midi2Message};
//!
//! let mut client = UdpClient::resolve("synth.local", netmidi2::DEFAULT_PORT, ClientConfig::default())?;
//! client.connect()?;
//! let note_on = Midi2ChannelVoice::new(0, 0, Midi2Message::NoteOn {
//!     note: 60,
//!     velocity: 0xC000,
//!     attribute_type: 0,
//!     attribute_data: 0,
//! });
//! client.send(&note_on.into())?;
//! client.disconnect()?;
//! # Ok::<(), netmidi2::transport::TransportError>(())
//! ```
//!
//! All I/O is blocking and single-threaded. Nothing here spawns threads;
//! timeouts are configured on the socket through
//! [`ClientConfig`](transport::ClientConfig).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod endpoint;
pub mod transport;
pub mod ump;

pub use endpoint::{Endpoint, FunctionBlock};
pub use transport::{Host, TransportError, UdpClient, UmpTransport};
pub use ump::{CodecError, Ump};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// IANA-registered Network MIDI 2.0 port
pub const DEFAULT_PORT: u16 = 5673;
