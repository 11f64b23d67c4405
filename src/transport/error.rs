//! Transport-level error types covering socket, framing, codec and session failures.

use core::fmt;

use super::command::FramingError;
use super::session::SessionError;
use super::socket::SocketError;
use crate::ump::CodecError;

/// Unified error type for transport operations.
#[derive(Debug)]
pub enum TransportError {
    /// Underlying socket or device failure.
    Socket(SocketError),
    /// Datagram or command packet could not be framed or unframed.
    Framing(FramingError),
    /// UMP payload could not be decoded.
    Codec(CodecError),
    /// Command was not valid for the session state.
    Session(SessionError),
    /// Host asked for a shared secret and none is configured.
    SharedSecretRequired,
    /// Host asked for a user name and password and none are configured.
    UserAuthRequired,
    /// Operation needs a connected session.
    NotConnected,
    /// `connect` called on an established session.
    AlreadyConnected,
    /// Endpoint URL could not be parsed.
    InvalidUrl {
        /// URL as given
        url: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

impl TransportError {
    /// Missing or wrong credentials, as opposed to a generic failure
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::SharedSecretRequired | Self::UserAuthRequired)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(err) => write!(f, "socket error: {err}"),
            Self::Framing(err) => write!(f, "framing error: {err}"),
            Self::Codec(err) => write!(f, "codec error: {err}"),
            Self::Session(err) => write!(f, "session error: {err}"),
            Self::SharedSecretRequired => {
                write!(f, "endpoint requires shared secret authentication")
            }
            Self::UserAuthRequired => {
                write!(f, "endpoint requires user/password authentication")
            }
            Self::NotConnected => write!(f, "not connected"),
            Self::AlreadyConnected => write!(f, "already connected"),
            Self::InvalidUrl { url, reason } => write!(f, "invalid endpoint url {url:?}: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Socket(err) => Some(err),
            Self::Framing(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Session(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SocketError> for TransportError {
    fn from(err: SocketError) -> Self {
        Self::Socket(err)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Socket(SocketError::Io(err))
    }
}

impl From<FramingError> for TransportError {
    fn from(err: FramingError) -> Self {
        Self::Framing(err)
    }
}

impl From<CodecError> for TransportError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}

impl From<SessionError> for TransportError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}
