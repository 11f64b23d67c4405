//! UMP codec error types

use thiserror::Error;

use super::MessageType;

/// Errors produced while decoding or encoding a Universal MIDI Packet.
///
/// Encoding fails only with [`CodecError::InvalidField`], when a field does
/// not fit its wire width.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer words than the message family requires
    #[error("truncated UMP: need {needed} words, got {got}")]
    Truncated {
        /// Words required by the message family
        needed: usize,
        /// Words supplied
        got: usize,
    },

    /// Message type nibble does not name a known family
    #[error("unknown UMP message type: {message_type:#x}")]
    UnknownMessageType {
        /// Offending nibble
        message_type: u8,
    },

    /// Status field does not name a known message within the family
    #[error("unknown {message_type} status: {status:#x}")]
    UnknownStatus {
        /// Family the packet claimed
        message_type: MessageType,
        /// Offending status value
        status: u16,
    },

    /// Flex data status bank / status combination is unknown
    #[error("unknown flex data status {status:#04x} in bank {bank:#04x}")]
    UnknownFlexStatus {
        /// Status bank (word 0 bits 15..8)
        bank: u8,
        /// Status (word 0 bits 7..0)
        status: u8,
    },

    /// A field holds a value outside its legal range
    #[error("invalid {field}: {value}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Offending value
        value: u32,
    },
}

impl CodecError {
    /// The input ended before the packet did.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }

    /// The input was long enough but its tags or fields are not valid.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        !self.is_truncated()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CodecError>;
