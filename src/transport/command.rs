//! Command packet framing for the Network MIDI 2.0 UDP envelope.
//!
//! A datagram is the 4-byte magic `"MIDI"` followed by command packets laid
//! back to back. Each command packet is `command:u8`, `len_words:u8`,
//! `aux:u16` (big endian) and `len_words * 4` payload bytes.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Datagram magic
pub const MAGIC: [u8; 4] = *b"MIDI";
/// Command packet header length
pub const COMMAND_HEADER_SIZE: usize = 4;
/// Largest payload a command packet can describe
pub const MAX_COMMAND_PAYLOAD: usize = u8::MAX as usize * 4;

/// Errors raised while framing or unframing datagrams.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Datagram does not start with `"MIDI"`
    #[error("bad datagram magic: {found:02x?}")]
    BadMagic {
        /// First bytes of the datagram
        found: Vec<u8>,
    },
    /// Header or payload runs past the end of the buffer
    #[error("truncated command packet: need {needed} bytes, got {got}")]
    Truncated {
        /// Bytes required
        needed: usize,
        /// Bytes available
        got: usize,
    },
    /// Payload length is not a multiple of 4
    #[error("payload length {len} is not a multiple of 4")]
    UnalignedPayload {
        /// Offending length
        len: usize,
    },
    /// Payload longer than the 8-bit word count allows
    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge {
        /// Offending length
        len: usize,
        /// Maximum supported length
        max: usize,
    },
    /// Command code not defined by the protocol
    #[error("unknown command code {code:#04x}")]
    UnknownCommand {
        /// Offending code
        code: u8,
    },
}

/// Command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    /// Client invites a host to open a session
    Invitation = 0x01,
    /// Invitation answering a shared secret challenge
    InvitationWithAuth = 0x02,
    /// Invitation answering a user/password challenge
    InvitationWithUserAuth = 0x03,
    /// Host accepted the invitation
    InvitationReplyAccepted = 0x10,
    /// Host is waiting for a user decision
    InvitationReplyPending = 0x11,
    /// Host requires a shared secret
    InvitationReplyAuthRequired = 0x12,
    /// Host requires a user name and password
    InvitationReplyUserAuthRequired = 0x13,
    /// Liveness check
    Ping = 0x20,
    /// Liveness answer, echoing the ping payload
    PingReply = 0x21,
    /// Ask the peer to resend UMP data
    RetransmitRequest = 0x80,
    /// Retransmission impossible
    RetransmitError = 0x81,
    /// Reset sequence numbers
    SessionReset = 0x82,
    /// Sequence numbers were reset
    SessionResetReply = 0x83,
    /// Negative acknowledgement
    Nak = 0x8F,
    /// Close the session
    Bye = 0xF0,
    /// Session closed
    ByeReply = 0xF1,
    /// One UMP message, sequence number in the auxiliary field
    UmpData = 0xFF,
}

impl CommandCode {
    /// Convert from the wire byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Invitation),
            0x02 => Some(Self::InvitationWithAuth),
            0x03 => Some(Self::InvitationWithUserAuth),
            0x10 => Some(Self::InvitationReplyAccepted),
            0x11 => Some(Self::InvitationReplyPending),
            0x12 => Some(Self::InvitationReplyAuthRequired),
            0x13 => Some(Self::InvitationReplyUserAuthRequired),
            0x20 => Some(Self::Ping),
            0x21 => Some(Self::PingReply),
            0x80 => Some(Self::RetransmitRequest),
            0x81 => Some(Self::RetransmitError),
            0x82 => Some(Self::SessionReset),
            0x83 => Some(Self::SessionResetReply),
            0x8F => Some(Self::Nak),
            0xF0 => Some(Self::Bye),
            0xF1 => Some(Self::ByeReply),
            0xFF => Some(Self::UmpData),
            _ => None,
        }
    }

    /// Convert to the wire byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Codes of the reliability extension, framed but not acted upon
    #[must_use]
    pub const fn is_reliability(self) -> bool {
        matches!(
            self,
            Self::RetransmitRequest
                | Self::RetransmitError
                | Self::SessionReset
                | Self::SessionResetReply
                | Self::Nak
        )
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invitation => "INVITATION",
            Self::InvitationWithAuth => "INVITATION_WITH_AUTH",
            Self::InvitationWithUserAuth => "INVITATION_WITH_USER_AUTH",
            Self::InvitationReplyAccepted => "INVITATION_REPLY_ACCEPTED",
            Self::InvitationReplyPending => "INVITATION_REPLY_PENDING",
            Self::InvitationReplyAuthRequired => "INVITATION_REPLY_AUTH_REQUIRED",
            Self::InvitationReplyUserAuthRequired => "INVITATION_REPLY_USER_AUTH_REQUIRED",
            Self::Ping => "PING",
            Self::PingReply => "PING_REPLY",
            Self::RetransmitRequest => "RETRANSMIT_REQUEST",
            Self::RetransmitError => "RETRANSMIT_ERROR",
            Self::SessionReset => "SESSION_RESET",
            Self::SessionResetReply => "SESSION_RESET_REPLY",
            Self::Nak => "NAK",
            Self::Bye => "BYE",
            Self::ByeReply => "BYE_REPLY",
            Self::UmpData => "UMP_DATA",
        };
        write!(f, "{name}")
    }
}

/// Invitation capability flags (auxiliary field low byte).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClientCapabilities(u8);

impl ClientCapabilities {
    /// Client can answer a shared secret challenge
    pub const INVITATION_WITH_AUTH: u8 = 1 << 0;
    /// Client can answer a user/password challenge
    pub const INVITATION_WITH_USER_AUTH: u8 = 1 << 1;

    /// Create a capability set from raw bits
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Underlying bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether a capability is advertised
    #[must_use]
    pub const fn contains(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Advertise a capability
    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }
}

/// Reason carried in the high byte of a BYE auxiliary field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ByeReason {
    /// Unspecified
    Unknown = 0x00,
    /// The user closed the session
    UserTerminated = 0x01,
    /// Device is powering down
    PowerDown = 0x02,
    /// Too many UMP packets went missing
    TooManyMissingUmp = 0x03,
    /// Peer stopped answering
    Timeout = 0x04,
    /// Command received outside an established session
    SessionNotEstablished = 0x05,
    /// Reply to a session that was never pending
    NoPendingSession = 0x06,
    /// Peer violated the protocol
    ProtocolError = 0x07,
    /// Host has no room for another session
    TooManyOpenedSessions = 0x40,
    /// Authenticated invitation rejected
    InvitationWithAuthRejected = 0x41,
    /// User declined the invitation
    InvitationRejectedNotAccepted = 0x42,
    /// Authentication digest did not match
    InvitationRejectedAuthFailed = 0x43,
    /// Unknown user name
    InvitationRejectedUserNotFound = 0x44,
    /// No authentication method in common
    NoMatchingAuthMethod = 0x45,
    /// Client gave up before the session was established
    InvitationCanceled = 0x80,
}

impl ByeReason {
    /// Convert from the wire byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Unknown),
            0x01 => Some(Self::UserTerminated),
            0x02 => Some(Self::PowerDown),
            0x03 => Some(Self::TooManyMissingUmp),
            0x04 => Some(Self::Timeout),
            0x05 => Some(Self::SessionNotEstablished),
            0x06 => Some(Self::NoPendingSession),
            0x07 => Some(Self::ProtocolError),
            0x40 => Some(Self::TooManyOpenedSessions),
            0x41 => Some(Self::InvitationWithAuthRejected),
            0x42 => Some(Self::InvitationRejectedNotAccepted),
            0x43 => Some(Self::InvitationRejectedAuthFailed),
            0x44 => Some(Self::InvitationRejectedUserNotFound),
            0x45 => Some(Self::NoMatchingAuthMethod),
            0x80 => Some(Self::InvitationCanceled),
            _ => None,
        }
    }

    /// Convert to the wire byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One command packet.
///
/// The payload length is checked at construction, so every value can be
/// encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    command: CommandCode,
    aux: u16,
    payload: Bytes,
}

impl CommandPacket {
    /// Create a command packet, validating payload alignment and size
    pub fn new(
        command: CommandCode,
        aux: u16,
        payload: impl Into<Bytes>,
    ) -> Result<Self, FramingError> {
        let payload = payload.into();
        if payload.len() % 4 != 0 {
            return Err(FramingError::UnalignedPayload { len: payload.len() });
        }
        if payload.len() > MAX_COMMAND_PAYLOAD {
            return Err(FramingError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_COMMAND_PAYLOAD,
            });
        }
        Ok(Self {
            command,
            aux,
            payload,
        })
    }

    /// Command without payload
    #[must_use]
    pub fn bare(command: CommandCode, aux: u16) -> Self {
        Self {
            command,
            aux,
            payload: Bytes::new(),
        }
    }

    /// BYE with the reason in the auxiliary high byte
    #[must_use]
    pub fn bye(reason: ByeReason) -> Self {
        Self::bare(CommandCode::Bye, u16::from(reason.as_u8()) << 8)
    }

    /// Command code
    #[must_use]
    pub const fn command(&self) -> CommandCode {
        self.command
    }

    /// Auxiliary (command specific) field
    #[must_use]
    pub const fn aux(&self) -> u16 {
        self.aux
    }

    /// High byte of the auxiliary field
    #[must_use]
    pub const fn aux_high(&self) -> u8 {
        (self.aux >> 8) as u8
    }

    /// Low byte of the auxiliary field
    #[must_use]
    pub const fn aux_low(&self) -> u8 {
        (self.aux & 0xFF) as u8
    }

    /// Payload bytes
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Encoded length including the header
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        COMMAND_HEADER_SIZE + self.payload.len()
    }

    /// Copy of this packet with another command code and the same payload
    #[must_use]
    pub fn with_command(&self, command: CommandCode) -> Self {
        Self {
            command,
            ..self.clone()
        }
    }

    /// Append the encoded packet to `out`
    pub fn encode_into(&self, out: &mut BytesMut) {
        out.reserve(self.encoded_len());
        out.put_u8(self.command.as_u8());
        out.put_u8((self.payload.len() / 4) as u8);
        out.put_u16(self.aux);
        out.put_slice(&self.payload);
    }

    /// Encode to a fresh buffer
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out.freeze()
    }

    /// Parse one packet off the front of `buf`, returning it and the rest
    pub fn decode(buf: &[u8]) -> Result<(Self, &[u8]), FramingError> {
        if buf.len() < COMMAND_HEADER_SIZE {
            return Err(FramingError::Truncated {
                needed: COMMAND_HEADER_SIZE,
                got: buf.len(),
            });
        }
        let code = buf[0];
        let payload_len = usize::from(buf[1]) * 4;
        let aux = u16::from_be_bytes([buf[2], buf[3]]);
        let body = &buf[COMMAND_HEADER_SIZE..];
        if body.len() < payload_len {
            return Err(FramingError::Truncated {
                needed: COMMAND_HEADER_SIZE + payload_len,
                got: buf.len(),
            });
        }
        let command = CommandCode::from_u8(code).ok_or(FramingError::UnknownCommand { code })?;
        let packet = Self {
            command,
            aux,
            payload: Bytes::copy_from_slice(&body[..payload_len]),
        };
        Ok((packet, &body[payload_len..]))
    }
}

impl fmt::Display for CommandPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(aux={:#06x}, {} bytes)",
            self.command,
            self.aux,
            self.payload.len()
        )
    }
}

/// A whole datagram: magic plus command packets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiUdpPacket {
    /// Commands in wire order
    pub commands: Vec<CommandPacket>,
}

impl MidiUdpPacket {
    /// Wrap a list of commands
    #[must_use]
    pub fn new(commands: Vec<CommandPacket>) -> Self {
        Self { commands }
    }

    /// Encoded datagram length
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        MAGIC.len() + self.commands.iter().map(CommandPacket::encoded_len).sum::<usize>()
    }

    /// Encode the datagram
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.encoded_len());
        out.put_slice(&MAGIC);
        for command in &self.commands {
            command.encode_into(&mut out);
        }
        out.freeze()
    }

    /// Decode a datagram. A trailing partial packet is an error.
    pub fn decode(buf: &[u8]) -> Result<Self, FramingError> {
        if buf.len() < MAGIC.len() || buf[..MAGIC.len()] != MAGIC {
            return Err(FramingError::BadMagic {
                found: buf[..buf.len().min(MAGIC.len())].to_vec(),
            });
        }
        let mut rest = &buf[MAGIC.len()..];
        let mut commands = Vec::new();
        while !rest.is_empty() {
            let (command, tail) = CommandPacket::decode(rest)?;
            commands.push(command);
            rest = tail;
        }
        Ok(Self { commands })
    }
}
