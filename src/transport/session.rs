//! Per-peer session state and the host-side command dispatch.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use bytes::{BufMut, BytesMut};
use thiserror::Error;
use tracing::{debug, info, trace};

use super::command::{ByeReason, ClientCapabilities, CommandCode, CommandPacket, FramingError};
use super::metrics::Metrics;
use crate::ump::{CodecError, Ump};

/// Protocol-state violations and malformed session commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Command is not legal in the current session state
    #[error("{command} not allowed in state {state}")]
    IllegalCommand {
        /// Offending command
        command: CommandCode,
        /// State the session was in
        state: SessionState,
    },
    /// Command is understood but not implemented
    #[error("{command} is not supported")]
    UnsupportedCommand {
        /// Offending command
        command: CommandCode,
    },
    /// Invitation identity payload is malformed
    #[error("bad identity: {reason}")]
    BadIdentity {
        /// What is wrong with it
        reason: &'static str,
    },
    /// UMP_DATA payload did not decode
    #[error("bad UMP payload: {0}")]
    Codec(#[from] CodecError),
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session
    #[default]
    Idle,
    /// Invitation sent, waiting for the reply
    PendingInvitation,
    /// Host challenged the invitation
    AuthenticationRequired,
    /// Session open, UMP data may flow
    EstablishedSession,
    /// Session reset requested
    PendingSessionReset,
    /// BYE sent, waiting for the reply
    PendingBye,
    /// Session closed
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::PendingInvitation => "PendingInvitation",
            Self::AuthenticationRequired => "AuthenticationRequired",
            Self::EstablishedSession => "EstablishedSession",
            Self::PendingSessionReset => "PendingSessionReset",
            Self::PendingBye => "PendingBye",
            Self::Closed => "Closed",
        };
        write!(f, "{name}")
    }
}

/// Endpoint name and product instance id exchanged during the invitation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// UTF-8 endpoint name
    pub name: String,
    /// ASCII product instance id
    pub product_instance_id: String,
}

impl Identity {
    /// Create an identity
    #[must_use]
    pub fn new(name: impl Into<String>, product_instance_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            product_instance_id: product_instance_id.into(),
        }
    }

    /// Encode as an invitation or invitation reply.
    ///
    /// The auxiliary high byte holds the name length in words and the low
    /// byte the capability flags; the payload is the zero-padded name
    /// followed by the zero-padded product instance id.
    pub fn to_command(
        &self,
        command: CommandCode,
        capabilities: ClientCapabilities,
    ) -> Result<CommandPacket, FramingError> {
        let name = self.name.as_bytes();
        let piid = self.product_instance_id.as_bytes();
        let name_words = name.len().div_ceil(4);
        let piid_words = piid.len().div_ceil(4);
        let name_words_byte = u8::try_from(name_words).map_err(|_| FramingError::PayloadTooLarge {
            len: name.len(),
            max: super::command::MAX_COMMAND_PAYLOAD,
        })?;

        let mut payload = BytesMut::with_capacity((name_words + piid_words) * 4);
        payload.put_slice(name);
        payload.put_bytes(0, name_words * 4 - name.len());
        payload.put_slice(piid);
        payload.put_bytes(0, piid_words * 4 - piid.len());

        let aux = (u16::from(name_words_byte) << 8) | u16::from(capabilities.bits());
        CommandPacket::new(command, aux, payload.freeze())
    }

    /// Decode from an invitation or invitation reply.
    pub fn from_command(packet: &CommandPacket) -> Result<Self, SessionError> {
        let payload = packet.payload();
        let name_len = usize::from(packet.aux_high()) * 4;
        if name_len > payload.len() {
            return Err(SessionError::BadIdentity {
                reason: "name length exceeds payload",
            });
        }
        let name = std::str::from_utf8(strip_padding(&payload[..name_len])).map_err(|_| {
            SessionError::BadIdentity {
                reason: "name is not UTF-8",
            }
        })?;
        let piid = strip_padding(&payload[name_len..]);
        if !piid.is_ascii() {
            return Err(SessionError::BadIdentity {
                reason: "product instance id is not ASCII",
            });
        }
        Ok(Self {
            name: name.to_owned(),
            product_instance_id: String::from_utf8_lossy(piid).into_owned(),
        })
    }
}

fn strip_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    &bytes[..end]
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.product_instance_id.is_empty() {
            write!(f, "'{}'", self.name)
        } else {
            write!(f, "'{}' ({})", self.name, self.product_instance_id)
        }
    }
}

/// One peer's session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    remote: Option<Identity>,
    sequence: u16,
}

impl Session {
    /// Create an idle session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Identity announced by the peer
    #[must_use]
    pub fn remote(&self) -> Option<&Identity> {
        self.remote.as_ref()
    }

    /// Whether UMP data may flow
    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self.state, SessionState::EstablishedSession)
    }

    /// Next outbound sequence number, wrapping at 2^16
    pub fn next_sequence(&mut self) -> u16 {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        sequence
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        trace!(from = %self.state, to = %state, "session state");
        self.state = state;
    }

    pub(crate) fn establish(&mut self, remote: Option<Identity>) {
        self.set_state(SessionState::EstablishedSession);
        self.remote = remote;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of dispatching one command on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Command to send back to the peer
    pub reply: Option<CommandPacket>,
    /// UMP message delivered to the application
    pub delivered: Option<Ump>,
}

impl Dispatch {
    fn reply(packet: CommandPacket) -> Self {
        Self {
            reply: Some(packet),
            delivered: None,
        }
    }

    fn deliver(ump: Ump) -> Self {
        Self {
            reply: None,
            delivered: Some(ump),
        }
    }
}

/// Host-side session table keyed by peer address.
///
/// `dispatch` is the whole host state machine: it performs no I/O, so one
/// receive loop (or a caller-provided lock around it) owns the table.
#[derive(Debug, Clone)]
pub struct SessionTable {
    identity: Identity,
    sessions: HashMap<SocketAddr, Session>,
}

impl SessionTable {
    /// Create an empty table answering invitations with `identity`
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            sessions: HashMap::new(),
        }
    }

    /// Session for a peer, if one exists
    #[must_use]
    pub fn get(&self, peer: &SocketAddr) -> Option<&Session> {
        self.sessions.get(peer)
    }

    pub(crate) fn get_mut(&mut self, peer: &SocketAddr) -> Option<&mut Session> {
        self.sessions.get_mut(peer)
    }

    pub(crate) fn remove(&mut self, peer: &SocketAddr) -> bool {
        self.sessions.remove(peer).is_some()
    }

    /// Number of sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterate over peers and their sessions
    pub fn iter(&self) -> impl Iterator<Item = (&SocketAddr, &Session)> {
        self.sessions.iter()
    }

    fn state_of(&self, peer: &SocketAddr) -> SessionState {
        self.sessions.get(peer).map_or(SessionState::Idle, Session::state)
    }

    /// Apply one command received from `peer`.
    pub fn dispatch(
        &mut self,
        peer: SocketAddr,
        packet: &CommandPacket,
    ) -> Result<Dispatch, SessionError> {
        let command = packet.command();
        match command {
            CommandCode::Ping => Ok(Dispatch::reply(packet.with_command(CommandCode::PingReply))),

            CommandCode::Invitation => {
                let state = self.state_of(&peer);
                if !matches!(state, SessionState::Idle | SessionState::EstablishedSession) {
                    return Err(SessionError::IllegalCommand { command, state });
                }
                let remote = Identity::from_command(packet)?;
                let reply = self
                    .identity
                    .to_command(CommandCode::InvitationReplyAccepted, ClientCapabilities::default())
                    .map_err(|_| SessionError::BadIdentity {
                        reason: "host identity too long",
                    })?;
                info!(%peer, remote = %remote, "invitation accepted");
                let session = self.sessions.entry(peer).or_insert_with(|| {
                    Metrics::record_session_open();
                    Session::new()
                });
                session.establish(Some(remote));
                Ok(Dispatch::reply(reply))
            }

            CommandCode::UmpData => {
                let state = self.state_of(&peer);
                if state != SessionState::EstablishedSession {
                    return Err(SessionError::IllegalCommand { command, state });
                }
                let ump = Ump::from_be_bytes(packet.payload())?;
                trace!(%peer, sequence = packet.aux(), ?ump, "ump data");
                Metrics::record_ump_received();
                Ok(Dispatch::deliver(ump))
            }

            CommandCode::Bye => {
                let reason = ByeReason::from_u8(packet.aux_high());
                if self.sessions.remove(&peer).is_some() {
                    Metrics::record_session_close();
                    info!(%peer, ?reason, "session closed by peer");
                } else {
                    debug!(%peer, ?reason, "bye without session");
                }
                Ok(Dispatch::reply(CommandPacket::bare(CommandCode::ByeReply, 0)))
            }

            CommandCode::InvitationWithAuth | CommandCode::InvitationWithUserAuth => {
                Err(SessionError::UnsupportedCommand { command })
            }

            code if code.is_reliability() => Err(SessionError::UnsupportedCommand { command }),

            _ => {
                debug!(%peer, %command, "ignoring command");
                Ok(Dispatch::default())
            }
        }
    }
}
