//! Top-level UMP dispatch: one enum over the eight families and the
//! word/byte codecs built on it.

use super::{
    CodecError, Data64, Data128, FlexData, MessageType, Midi1ChannelVoice, Midi2ChannelVoice,
    Result, SystemRealTime, UmpStream, Utility,
};

/// Bytes per UMP word
pub const WORD_SIZE: usize = 4;

/// A decoded Universal MIDI Packet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ump {
    /// Message type 0x0
    Utility(Utility),
    /// Message type 0x1
    System(SystemRealTime),
    /// Message type 0x2
    Midi1(Midi1ChannelVoice),
    /// Message type 0x3
    Data64(Data64),
    /// Message type 0x4
    Midi2(Midi2ChannelVoice),
    /// Message type 0x5
    Data128(Data128),
    /// Message type 0xD
    FlexData(FlexData),
    /// Message type 0xF
    Stream(UmpStream),
}

impl Ump {
    /// Family of this message
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Utility(_) => MessageType::Utility,
            Self::System(_) => MessageType::SystemRealTime,
            Self::Midi1(_) => MessageType::Midi1ChannelVoice,
            Self::Data64(_) => MessageType::Data64,
            Self::Midi2(_) => MessageType::Midi2ChannelVoice,
            Self::Data128(_) => MessageType::Data128,
            Self::FlexData(_) => MessageType::FlexData,
            Self::Stream(_) => MessageType::UmpStream,
        }
    }

    /// Encoded length in 32-bit words
    #[must_use]
    pub const fn word_count(&self) -> usize {
        self.message_type().word_count()
    }

    /// Check every field against its wire width.
    ///
    /// Encoding rejects instead of masking, so a message that encodes
    /// always decodes back to itself.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Utility(msg) => msg.validate(),
            Self::System(msg) => msg.validate(),
            Self::Midi1(msg) => msg.validate(),
            Self::Data64(msg) => msg.validate(),
            Self::Midi2(msg) => msg.validate(),
            Self::Data128(msg) => msg.validate(),
            Self::FlexData(msg) => msg.validate(),
            Self::Stream(msg) => msg.validate(),
        }
    }

    /// Encode into `word_count()` words
    pub fn encode(&self) -> Result<Vec<u32>> {
        let mut words = [0u32; 4];
        self.encode_into(&mut words)?;
        Ok(words[..self.word_count()].to_vec())
    }

    /// Encode into a fixed 4-word buffer; words past `word_count()` are left zero.
    ///
    /// `words` is untouched when a field is out of range.
    pub fn encode_into(&self, words: &mut [u32; 4]) -> Result<()> {
        self.validate()?;
        *words = [u32::from(self.message_type().as_u8()) << 28, 0, 0, 0];
        match self {
            Self::Utility(msg) => msg.encode(words),
            Self::System(msg) => msg.encode(words),
            Self::Midi1(msg) => msg.encode(words),
            Self::Data64(msg) => msg.encode(words),
            Self::Midi2(msg) => msg.encode(words),
            Self::Data128(msg) => msg.encode(words),
            Self::FlexData(msg) => msg.encode(words),
            Self::Stream(msg) => msg.encode(words),
        }
        Ok(())
    }

    /// Decode one message from the front of `words`.
    ///
    /// Words beyond the family's word count are ignored; use
    /// [`decode_all`] to walk a sequence.
    pub fn decode(words: &[u32]) -> Result<Self> {
        let Some(&first) = words.first() else {
            return Err(CodecError::Truncated { needed: 1, got: 0 });
        };
        let nibble = (first >> 28) as u8;
        let message_type =
            MessageType::from_u8(nibble).ok_or(CodecError::UnknownMessageType { message_type: nibble })?;
        let needed = message_type.word_count();
        if words.len() < needed {
            return Err(CodecError::Truncated {
                needed,
                got: words.len(),
            });
        }

        let mut padded = [0u32; 4];
        padded[..needed].copy_from_slice(&words[..needed]);
        let message = match message_type {
            MessageType::Utility => Self::Utility(Utility::decode(&padded)?),
            MessageType::SystemRealTime => Self::System(SystemRealTime::decode(&padded)?),
            MessageType::Midi1ChannelVoice => Self::Midi1(Midi1ChannelVoice::decode(&padded)?),
            MessageType::Data64 => Self::Data64(Data64::decode(&padded)?),
            MessageType::Midi2ChannelVoice => Self::Midi2(Midi2ChannelVoice::decode(&padded)?),
            MessageType::Data128 => Self::Data128(Data128::decode(&padded)?),
            MessageType::FlexData => Self::FlexData(FlexData::decode(&padded)?),
            MessageType::UmpStream => Self::Stream(UmpStream::decode(&padded)?),
        };
        Ok(message)
    }

    /// Encode as big-endian bytes, the network byte order
    pub fn to_be_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.encode()?.iter().flat_map(|word| word.to_be_bytes()).collect())
    }

    /// Decode one message from big-endian bytes.
    ///
    /// A trailing partial word counts as missing.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(&words_from_be_bytes(bytes))
    }
}

/// Decode a free-standing word slice into its consecutive messages.
///
/// Each item is one message or the error for the message starting at that
/// position. An unknown message type stops the walk after yielding its
/// error because the length of the offending packet cannot be known; a
/// malformed packet of a known family is skipped by its word count.
pub fn decode_all(words: &[u32]) -> DecodeAll<'_> {
    DecodeAll {
        words,
        done: false,
    }
}

/// Iterator returned by [`decode_all`]
#[derive(Debug, Clone)]
pub struct DecodeAll<'a> {
    words: &'a [u32],
    done: bool,
}

impl Iterator for DecodeAll<'_> {
    type Item = Result<Ump>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.words.is_empty() {
            return None;
        }
        let result = Ump::decode(self.words);
        match MessageType::of_word(self.words[0]) {
            Some(message_type) if self.words.len() >= message_type.word_count() => {
                self.words = &self.words[message_type.word_count()..];
            }
            _ => self.done = true,
        }
        Some(result)
    }
}

/// Reassemble big-endian bytes into words, dropping a trailing partial word
#[must_use]
pub fn words_from_be_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(WORD_SIZE)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

impl From<Utility> for Ump {
    fn from(msg: Utility) -> Self {
        Self::Utility(msg)
    }
}

impl From<SystemRealTime> for Ump {
    fn from(msg: SystemRealTime) -> Self {
        Self::System(msg)
    }
}

impl From<Midi1ChannelVoice> for Ump {
    fn from(msg: Midi1ChannelVoice) -> Self {
        Self::Midi1(msg)
    }
}

impl From<Data64> for Ump {
    fn from(msg: Data64) -> Self {
        Self::Data64(msg)
    }
}

impl From<Midi2ChannelVoice> for Ump {
    fn from(msg: Midi2ChannelVoice) -> Self {
        Self::Midi2(msg)
    }
}

impl From<Data128> for Ump {
    fn from(msg: Data128) -> Self {
        Self::Data128(msg)
    }
}

impl From<FlexData> for Ump {
    fn from(msg: FlexData) -> Self {
        Self::FlexData(msg)
    }
}

impl From<UmpStream> for Ump {
    fn from(msg: UmpStream) -> Self {
        Self::Stream(msg)
    }
}
