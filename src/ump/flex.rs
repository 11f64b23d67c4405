//! Flex data messages (message type 0xD)
//!
//! Word 0 layout: group 27..24, form 23..22, address 21..20, channel 19..16,
//! status bank 15..8, status 7..0. Words 1..3 carry a 12-byte payload whose
//! meaning depends on the status; for the two text banks it is UTF-8 text
//! chunked with the form field.

use std::fmt;

use super::types::{bits, byte8, check_width};
use super::{CodecError, Form, Result, TextChunk};

const BANK_SETUP_AND_PERFORMANCE: u8 = 0x00;
const BANK_METADATA_TEXT: u8 = 0x01;
const BANK_PERFORMANCE_TEXT: u8 = 0x02;

/// What the `channel` field of a flex data message applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FlexAddress {
    /// The message targets a single channel
    #[default]
    Channel = 0,
    /// The message targets the whole group; `channel` is ignored
    Group = 1,
}

impl FlexAddress {
    /// Convert from the 2-bit address field
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Channel),
            1 => Some(Self::Group),
            _ => None,
        }
    }
}

/// Status bank 0x00: setup and performance events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SetupStatus {
    /// Set tempo
    SetTempo = 0x00,
    /// Set time signature
    SetTimeSignature = 0x01,
    /// Set metronome
    SetMetronome = 0x02,
    /// Set key signature
    SetKeySignature = 0x05,
    /// Set chord name
    SetChordName = 0x06,
    /// Text event
    TextEvent = 0x10,
}

impl SetupStatus {
    /// Convert from the status byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::SetTempo),
            0x01 => Some(Self::SetTimeSignature),
            0x02 => Some(Self::SetMetronome),
            0x05 => Some(Self::SetKeySignature),
            0x06 => Some(Self::SetChordName),
            0x10 => Some(Self::TextEvent),
            _ => None,
        }
    }
}

/// Status bank 0x01: metadata text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MetadataTextStatus {
    /// Unspecified metadata
    Unknown = 0x00,
    /// Project name
    ProjectName = 0x01,
    /// Song name
    SongName = 0x02,
    /// MIDI clip name
    MidiClipName = 0x03,
    /// Copyright notice
    CopyrightNotice = 0x04,
    /// Composer name
    ComposerName = 0x05,
    /// Lyricist name
    LyricistName = 0x06,
    /// Arranger name
    ArrangerName = 0x07,
    /// Publisher name
    PublisherName = 0x08,
    /// Primary performer name
    PrimaryPerformerName = 0x09,
    /// Accompanying performer name
    AccompanyingPerformerName = 0x0A,
    /// Recording or concert date
    RecordingDate = 0x0B,
    /// Recording or concert location
    RecordingLocation = 0x0C,
}

impl MetadataTextStatus {
    /// Convert from the status byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => Self::Unknown,
            0x01 => Self::ProjectName,
            0x02 => Self::SongName,
            0x03 => Self::MidiClipName,
            0x04 => Self::CopyrightNotice,
            0x05 => Self::ComposerName,
            0x06 => Self::LyricistName,
            0x07 => Self::ArrangerName,
            0x08 => Self::PublisherName,
            0x09 => Self::PrimaryPerformerName,
            0x0A => Self::AccompanyingPerformerName,
            0x0B => Self::RecordingDate,
            0x0C => Self::RecordingLocation,
            _ => return None,
        })
    }
}

/// Status bank 0x02: performance text events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PerformanceTextStatus {
    /// Unspecified text
    Unknown = 0x00,
    /// Lyrics
    Lyrics = 0x01,
    /// Lyrics language
    LyricsLanguage = 0x02,
    /// Ruby
    Ruby = 0x03,
    /// Ruby language
    RubyLanguage = 0x04,
}

impl PerformanceTextStatus {
    /// Convert from the status byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Unknown),
            0x01 => Some(Self::Lyrics),
            0x02 => Some(Self::LyricsLanguage),
            0x03 => Some(Self::Ruby),
            0x04 => Some(Self::RubyLanguage),
            _ => None,
        }
    }
}

/// Status bank plus status, the two-level flex data selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlexMessage {
    /// Bank 0x00
    SetupAndPerformance(SetupStatus),
    /// Bank 0x01
    MetadataText(MetadataTextStatus),
    /// Bank 0x02
    PerformanceText(PerformanceTextStatus),
}

impl FlexMessage {
    /// Status bank byte
    #[must_use]
    pub const fn bank(&self) -> u8 {
        match self {
            Self::SetupAndPerformance(_) => BANK_SETUP_AND_PERFORMANCE,
            Self::MetadataText(_) => BANK_METADATA_TEXT,
            Self::PerformanceText(_) => BANK_PERFORMANCE_TEXT,
        }
    }

    /// Status byte within the bank
    #[must_use]
    pub const fn status(&self) -> u8 {
        match *self {
            Self::SetupAndPerformance(status) => status as u8,
            Self::MetadataText(status) => status as u8,
            Self::PerformanceText(status) => status as u8,
        }
    }

    /// Whether the payload of this message is text
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            Self::MetadataText(_)
                | Self::PerformanceText(_)
                | Self::SetupAndPerformance(SetupStatus::TextEvent)
        )
    }

    fn from_bank(bank: u8, status: u8) -> Option<Self> {
        match bank {
            BANK_SETUP_AND_PERFORMANCE => SetupStatus::from_u8(status).map(Self::SetupAndPerformance),
            BANK_METADATA_TEXT => MetadataTextStatus::from_u8(status).map(Self::MetadataText),
            BANK_PERFORMANCE_TEXT => {
                PerformanceTextStatus::from_u8(status).map(Self::PerformanceText)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FlexMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetupAndPerformance(status) => write!(f, "{status:?}"),
            Self::MetadataText(status) => write!(f, "MetadataText({status:?})"),
            Self::PerformanceText(status) => write!(f, "PerformanceText({status:?})"),
        }
    }
}

/// Flex data message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlexData {
    /// UMP group (0..=15)
    pub group: u8,
    /// Position within a multi-packet text
    pub form: Form,
    /// Channel or group addressing
    pub address: FlexAddress,
    /// Channel (0..=15), meaningful with [`FlexAddress::Channel`]
    pub channel: u8,
    /// Bank and status
    pub message: FlexMessage,
    /// Words 1..=3
    pub payload: [u32; 3],
}

impl FlexData {
    /// Create a message with an empty payload
    #[must_use]
    pub const fn new(group: u8, address: FlexAddress, channel: u8, message: FlexMessage) -> Self {
        Self {
            group,
            form: Form::Complete,
            address,
            channel,
            message,
            payload: [0; 3],
        }
    }

    /// Build the packets carrying `text` for a text-bank message, splitting
    /// it into 12-byte chunks with the matching forms.
    #[must_use]
    pub fn text(
        group: u8,
        address: FlexAddress,
        channel: u8,
        message: FlexMessage,
        text: &str,
    ) -> Vec<Self> {
        TextChunk::<12>::split(text)
            .into_iter()
            .map(|(form, chunk)| {
                let mut words = [0u32; 4];
                chunk.pack(&mut words);
                Self {
                    form,
                    payload: [words[1], words[2], words[3]],
                    ..Self::new(group, address, channel, message)
                }
            })
            .collect()
    }

    /// Payload interpreted as a text chunk (trailing zeros stripped)
    #[must_use]
    pub fn text_chunk(&self) -> TextChunk<12> {
        TextChunk::unpack(&[0, self.payload[0], self.payload[1], self.payload[2]])
    }

    pub(crate) fn decode(words: &[u32; 4]) -> Result<Self> {
        let word = words[0];
        let bank = byte8(word, 8);
        let status = byte8(word, 0);
        let message =
            FlexMessage::from_bank(bank, status).ok_or(CodecError::UnknownFlexStatus { bank, status })?;
        let address_bits = bits(word, 20, 2) as u8;
        let address = FlexAddress::from_u8(address_bits).ok_or(CodecError::InvalidField {
            field: "flex address",
            value: u32::from(address_bits),
        })?;
        Ok(Self {
            group: bits(word, 24, 4) as u8,
            form: Form::from_bits(bits(word, 22, 2)),
            address,
            channel: bits(word, 16, 4) as u8,
            message,
            payload: [words[1], words[2], words[3]],
        })
    }

    /// Check the group and channel nibbles.
    pub fn validate(&self) -> Result<()> {
        check_width("group", self.group, 4)?;
        check_width("channel", self.channel, 4)
    }

    pub(crate) fn encode(&self, words: &mut [u32; 4]) {
        words[0] |= ((u32::from(self.group) & 0xF) << 24)
            | (u32::from(self.form.as_u8()) << 22)
            | (u32::from(self.address as u8) << 20)
            | ((u32::from(self.channel) & 0xF) << 16)
            | (u32::from(self.message.bank()) << 8)
            | u32::from(self.message.status());
        words[1..].copy_from_slice(&self.payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_level_dispatch() {
        let msg = FlexData::decode(&[0xD310_0102, 0, 0, 0]).unwrap();
        assert_eq!(msg.group, 3);
        assert_eq!(msg.address, FlexAddress::Group);
        assert_eq!(msg.message, FlexMessage::MetadataText(MetadataTextStatus::SongName));

        assert!(FlexData::decode(&[0xD000_0103, 0, 0, 0]).is_ok());
        let err = FlexData::decode(&[0xD000_0303, 0, 0, 0]).unwrap_err();
        assert_eq!(err, CodecError::UnknownFlexStatus { bank: 3, status: 3 });
        let err = FlexData::decode(&[0xD000_0003, 0, 0, 0]).unwrap_err();
        assert_eq!(err, CodecError::UnknownFlexStatus { bank: 0, status: 3 });
    }

    #[test]
    fn header_layout() {
        let msg = FlexData {
            form: Form::End,
            ..FlexData::new(
                1,
                FlexAddress::Channel,
                9,
                FlexMessage::PerformanceText(PerformanceTextStatus::Lyrics),
            )
        };
        let mut words = [0xD000_0000, 0, 0, 0];
        msg.encode(&mut words);
        assert_eq!(words[0], 0xD1C9_0201);
    }

    #[test]
    fn wide_group_or_channel_is_rejected() {
        let message = FlexMessage::SetupAndPerformance(SetupStatus::SetTempo);
        assert!(FlexData::new(15, FlexAddress::Channel, 15, message).validate().is_ok());
        assert!(FlexData::new(16, FlexAddress::Channel, 0, message).validate().is_err());
        let err = FlexData::new(0, FlexAddress::Channel, 0x20, message)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidField {
                field: "channel",
                value: 0x20
            }
        );
    }

    #[test]
    fn long_text_is_chunked() {
        let message = FlexMessage::MetadataText(MetadataTextStatus::ComposerName);
        let packets = FlexData::text(0, FlexAddress::Group, 0, message, "Johann Sebastian Bach");
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].form, Form::Start);
        assert_eq!(packets[1].form, Form::End);
        assert_eq!(packets[0].text_chunk().as_bytes(), b"Johann Sebas");
        assert_eq!(packets[1].text_chunk().as_bytes(), b"tian Bach");
    }
}
