//! UMP message families and the small field types shared between them

use std::fmt;

use super::{CodecError, Result};

/// UMP message type, carried in word 0 bits 31..28.
///
/// The message type alone fixes how many 32-bit words a packet occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageType {
    /// Utility messages (NOOP, jitter reduction, delta clockstamps)
    Utility = 0x0,
    /// System real time and system common messages
    SystemRealTime = 0x1,
    /// MIDI 1.0 channel voice messages
    Midi1ChannelVoice = 0x2,
    /// 64-bit data messages (SysEx7)
    Data64 = 0x3,
    /// MIDI 2.0 channel voice messages
    Midi2ChannelVoice = 0x4,
    /// 128-bit data messages (SysEx8)
    Data128 = 0x5,
    /// Flex data messages
    FlexData = 0xD,
    /// UMP stream messages
    UmpStream = 0xF,
}

impl MessageType {
    /// Convert from the 4-bit message type nibble
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Self::Utility),
            0x1 => Some(Self::SystemRealTime),
            0x2 => Some(Self::Midi1ChannelVoice),
            0x3 => Some(Self::Data64),
            0x4 => Some(Self::Midi2ChannelVoice),
            0x5 => Some(Self::Data128),
            0xD => Some(Self::FlexData),
            0xF => Some(Self::UmpStream),
            _ => None,
        }
    }

    /// Extract the message type from the first word of a packet
    #[must_use]
    pub fn of_word(word: u32) -> Option<Self> {
        Self::from_u8((word >> 28) as u8)
    }

    /// Convert to the 4-bit nibble
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Number of 32-bit words a packet of this family occupies
    #[must_use]
    pub const fn word_count(self) -> usize {
        match self {
            Self::Utility | Self::SystemRealTime | Self::Midi1ChannelVoice => 1,
            Self::Data64 | Self::Midi2ChannelVoice => 2,
            Self::Data128 | Self::FlexData | Self::UmpStream => 4,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Utility => "Utility",
            Self::SystemRealTime => "SystemRealTime",
            Self::Midi1ChannelVoice => "Midi1ChannelVoice",
            Self::Data64 => "Data64",
            Self::Midi2ChannelVoice => "Midi2ChannelVoice",
            Self::Data128 => "Data128",
            Self::FlexData => "FlexData",
            Self::UmpStream => "UmpStream",
        };
        write!(f, "{name}")
    }
}

/// Position of a packet within a multi-packet field or stream.
///
/// Used by UMP stream name notifications, flex data and (as the 4-bit
/// status) by the SysEx data families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Form {
    /// The whole field fits in this packet
    #[default]
    Complete = 0,
    /// First packet of a chunked field
    Start = 1,
    /// Middle packet of a chunked field
    Continue = 2,
    /// Last packet of a chunked field
    End = 3,
}

impl Form {
    /// Convert from a value, rejecting anything outside 0..=3
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Complete),
            1 => Some(Self::Start),
            2 => Some(Self::Continue),
            3 => Some(Self::End),
            _ => None,
        }
    }

    /// Convert from a 2-bit field; the upper bits are ignored
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::Complete,
            1 => Self::Start,
            2 => Self::Continue,
            _ => Self::End,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// A packet with this form resets any partially assembled field
    #[must_use]
    pub const fn is_starting(self) -> bool {
        matches!(self, Self::Complete | Self::Start)
    }

    /// A packet with this form completes the field
    #[must_use]
    pub const fn is_ending(self) -> bool {
        matches!(self, Self::Complete | Self::End)
    }
}

/// Extract `width` bits of `word` starting at bit `shift`.
#[inline]
pub(crate) const fn bits(word: u32, shift: u32, width: u32) -> u32 {
    (word >> shift) & ((1 << width) - 1)
}

/// Reject `value` unless it fits in a field `width` bits wide.
#[inline]
pub(crate) fn check_width(field: &'static str, value: impl Into<u32>, width: u32) -> Result<()> {
    let value = value.into();
    if value >> width == 0 {
        Ok(())
    } else {
        Err(CodecError::InvalidField { field, value })
    }
}

/// Extract a 7-bit data byte starting at bit `shift`.
#[inline]
pub(crate) const fn byte7(word: u32, shift: u32) -> u8 {
    bits(word, shift, 7) as u8
}

/// Extract a full byte starting at bit `shift`.
#[inline]
pub(crate) const fn byte8(word: u32, shift: u32) -> u8 {
    bits(word, shift, 8) as u8
}

/// Extract a single flag bit.
#[inline]
pub(crate) const fn flag(word: u32, bit: u32) -> bool {
    (word >> bit) & 1 == 1
}

/// Group and channel nibbles shared by the channel voice families.
#[inline]
pub(crate) const fn group_channel(word: u32) -> (u8, u8) {
    (bits(word, 24, 4) as u8, bits(word, 16, 4) as u8)
}
