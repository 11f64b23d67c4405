//! 64-bit (SysEx7, message type 0x3) and 128-bit (SysEx8, message type 0x5) data messages

use arrayvec::ArrayVec;

use super::types::{bits, byte8, check_width};
use super::{CodecError, Form, MessageType, Result};

fn decode_form(message_type: MessageType, word: u32) -> Result<Form> {
    let status = bits(word, 20, 4) as u8;
    Form::from_u8(status).ok_or(CodecError::UnknownStatus {
        message_type,
        status: u16::from(status),
    })
}

fn checked_length(word: u32, max: usize) -> Result<usize> {
    let length = bits(word, 16, 4) as usize;
    if length > max {
        return Err(CodecError::InvalidField {
            field: "data length",
            value: length as u32,
        });
    }
    Ok(length)
}

fn collect<const N: usize>(bytes: &[u8]) -> Result<ArrayVec<u8, N>> {
    ArrayVec::try_from(bytes).map_err(|_| CodecError::InvalidField {
        field: "data length",
        value: bytes.len() as u32,
    })
}

/// SysEx7 packet carrying up to 6 seven-bit bytes.
///
/// The byte count is an explicit nibble (word 0 bits 19..16); unused slots
/// are zero on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Data64 {
    /// UMP group (0..=15)
    pub group: u8,
    /// Position of this packet within the SysEx message
    pub status: Form,
    /// Payload bytes
    pub data: ArrayVec<u8, 6>,
}

impl Data64 {
    /// Maximum payload bytes per packet
    pub const MAX_BYTES: usize = 6;

    /// Create a packet, rejecting payloads longer than [`Self::MAX_BYTES`],
    /// bytes above 0x7F and groups above 15
    pub fn new(group: u8, status: Form, data: &[u8]) -> Result<Self> {
        let msg = Self {
            group,
            status,
            data: collect(data)?,
        };
        msg.validate()?;
        Ok(msg)
    }

    /// Check the group and that every payload byte is 7-bit.
    pub fn validate(&self) -> Result<()> {
        check_width("group", self.group, 4)?;
        self.data
            .iter()
            .try_for_each(|&byte| check_width("sysex7 byte", byte, 7))
    }

    pub(crate) fn decode(words: &[u32; 4]) -> Result<Self> {
        let status = decode_form(MessageType::Data64, words[0])?;
        let length = checked_length(words[0], Self::MAX_BYTES)?;
        let mut all = [0u8; 6];
        all[..2].copy_from_slice(&((words[0] & 0x7F7F) as u16).to_be_bytes());
        all[2..].copy_from_slice(&(words[1] & 0x7F7F_7F7F).to_be_bytes());
        Ok(Self {
            group: bits(words[0], 24, 4) as u8,
            status,
            data: collect(&all[..length])?,
        })
    }

    pub(crate) fn encode(&self, words: &mut [u32; 4]) {
        let mut all = [0u8; 6];
        all[..self.data.len()].copy_from_slice(&self.data);
        words[0] |= ((u32::from(self.group) & 0xF) << 24)
            | (u32::from(self.status.as_u8()) << 20)
            | ((self.data.len() as u32) << 16)
            | (u32::from(u16::from_be_bytes([all[0], all[1]])) & 0x7F7F);
        words[1] = u32::from_be_bytes([all[2], all[3], all[4], all[5]]) & 0x7F7F_7F7F;
    }
}

/// SysEx8 packet carrying up to 13 eight-bit bytes on a numbered stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Data128 {
    /// UMP group (0..=15)
    pub group: u8,
    /// Position of this packet within the SysEx message
    pub status: Form,
    /// SysEx8 stream id
    pub stream_id: u8,
    /// Payload bytes
    pub data: ArrayVec<u8, 13>,
}

impl Data128 {
    /// Maximum payload bytes per packet
    pub const MAX_BYTES: usize = 13;

    /// Create a packet, rejecting payloads longer than [`Self::MAX_BYTES`]
    /// and groups above 15
    pub fn new(group: u8, status: Form, stream_id: u8, data: &[u8]) -> Result<Self> {
        let msg = Self {
            group,
            status,
            stream_id,
            data: collect(data)?,
        };
        msg.validate()?;
        Ok(msg)
    }

    /// Check the group; SysEx8 bytes and the stream id use all eight bits.
    pub fn validate(&self) -> Result<()> {
        check_width("group", self.group, 4)
    }

    pub(crate) fn decode(words: &[u32; 4]) -> Result<Self> {
        let status = decode_form(MessageType::Data128, words[0])?;
        let length = checked_length(words[0], Self::MAX_BYTES)?;
        let mut all = [0u8; 13];
        all[0] = byte8(words[0], 0);
        for (chunk, word) in all[1..].chunks_exact_mut(4).zip(&words[1..]) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        Ok(Self {
            group: bits(words[0], 24, 4) as u8,
            status,
            stream_id: byte8(words[0], 8),
            data: collect(&all[..length])?,
        })
    }

    pub(crate) fn encode(&self, words: &mut [u32; 4]) {
        let mut all = [0u8; 13];
        all[..self.data.len()].copy_from_slice(&self.data);
        words[0] |= ((u32::from(self.group) & 0xF) << 24)
            | (u32::from(self.status.as_u8()) << 20)
            | ((self.data.len() as u32) << 16)
            | (u32::from(self.stream_id) << 8)
            | u32::from(all[0]);
        for (word, chunk) in words[1..].iter_mut().zip(all[1..].chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data64_length_nibble() {
        let msg = Data64::decode(&[0x3204_0102, 0x0304_0000, 0, 0]).unwrap();
        assert_eq!(msg.group, 2);
        assert_eq!(msg.status, Form::Complete);
        assert_eq!(msg.data.as_slice(), &[1, 2, 3, 4]);

        let mut words = [0x3000_0000, 0, 0, 0];
        msg.encode(&mut words);
        assert_eq!(&words[..2], &[0x3204_0102, 0x0304_0000]);
    }

    #[test]
    fn data64_rejects_long_payloads() {
        assert!(Data64::new(0, Form::Complete, &[0; 7]).is_err());
        let err = Data64::decode(&[0x3007_0000, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { value: 7, .. }));
    }

    #[test]
    fn data64_rejects_eight_bit_bytes() {
        let err = Data64::new(0, Form::Complete, &[0x80, 0xFF]).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidField {
                field: "sysex7 byte",
                value: 0x80
            }
        );
        assert!(Data64::new(16, Form::Complete, &[1]).is_err());

        let mut msg = Data64::new(0, Form::Complete, &[0, 0x7F]).unwrap();
        msg.data[1] = 0xFF;
        assert!(msg.validate().is_err());
    }

    #[test]
    fn data128_rejects_wide_group() {
        assert!(Data128::new(15, Form::Start, 0xFF, &[0xFF; 13]).is_ok());
        let err = Data128::new(16, Form::Start, 0, &[1]).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidField {
                field: "group",
                value: 16
            }
        );
    }

    #[test]
    fn data128_stream_id_and_bytes() {
        let msg = Data128::decode(&[0x5208_2A01, 0x0203_0405, 0x0607_0800, 0]).unwrap();
        assert_eq!(msg.stream_id, 0x2A);
        assert_eq!(msg.data.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut words = [0x5000_0000, 0, 0, 0];
        msg.encode(&mut words);
        assert_eq!(words, [0x5208_2A01, 0x0203_0405, 0x0607_0800, 0]);
    }

    #[test]
    fn data128_unknown_status() {
        let err = Data128::decode(&[0x5080_0000, 0, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnknownStatus {
                message_type: MessageType::Data128,
                status: 8
            }
        ));
    }
}
