//! Text payloads packed into the trailing bytes of 128-bit packets.
//!
//! Endpoint names and product instance ids use the last 14 bytes of a UMP
//! stream packet, function block names the last 13, and flex data text the
//! last 12. Bytes are big-endian within each word and right-padded with
//! zeros; decoding strips trailing zeros only.

use std::borrow::Cow;
use std::fmt;

use arrayvec::ArrayVec;

use super::{CodecError, Form, Result};

/// Bytes available in a 128-bit packet.
const PACKET_BYTES: usize = 16;

/// Up to `N` bytes of text occupying the last `N` bytes of a 128-bit packet.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextChunk<const N: usize>(ArrayVec<u8, N>);

impl<const N: usize> TextChunk<N> {
    /// Maximum number of bytes a single chunk carries
    pub const CAPACITY: usize = N;

    /// Build a chunk from raw bytes.
    ///
    /// Trailing zero bytes would be lost on the wire, so they are rejected
    /// along with inputs longer than [`Self::CAPACITY`].
    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > N {
            return Err(CodecError::InvalidField {
                field: "text length",
                value: bytes.len() as u32,
            });
        }
        if bytes.last() == Some(&0) {
            return Err(CodecError::InvalidField {
                field: "text trailing byte",
                value: 0,
            });
        }
        Ok(Self(bytes.iter().copied().collect()))
    }

    /// Split text of any length into consecutive chunks with their forms.
    ///
    /// A text that fits in one chunk yields a single `Complete` chunk;
    /// longer text yields `Start`, zero or more `Continue` and one `End`.
    #[must_use]
    pub fn split(text: &str) -> Vec<(Form, Self)> {
        let bytes = text.as_bytes();
        if bytes.len() <= N {
            let chunk = Self(bytes.iter().copied().collect());
            return vec![(Form::Complete, chunk)];
        }

        let pieces: Vec<&[u8]> = bytes.chunks(N).collect();
        let last = pieces.len() - 1;
        pieces
            .into_iter()
            .enumerate()
            .map(|(idx, piece)| {
                let form = match idx {
                    0 => Form::Start,
                    i if i == last => Form::End,
                    _ => Form::Continue,
                };
                (form, Self(piece.iter().copied().collect()))
            })
            .collect()
    }

    /// Borrow the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Interpret the bytes as UTF-8, replacing invalid sequences
    #[must_use]
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Number of bytes carried
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the chunk carries no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read the last `N` bytes of the packet, stripping the zero padding.
    pub(crate) fn unpack(words: &[u32; 4]) -> Self {
        let bytes = words_to_bytes(words);
        let region = &bytes[PACKET_BYTES - N..];
        let end = region.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
        Self(region[..end].iter().copied().collect())
    }

    /// Write the chunk into the last `N` bytes of the packet.
    pub(crate) fn pack(&self, words: &mut [u32; 4]) {
        let mut bytes = words_to_bytes(words);
        let region = &mut bytes[PACKET_BYTES - N..];
        region.fill(0);
        region[..self.0.len()].copy_from_slice(&self.0);
        *words = bytes_to_words(&bytes);
    }
}

impl<const N: usize> TryFrom<&str> for TextChunk<N> {
    type Error = CodecError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value.as_bytes())
    }
}

impl<const N: usize> fmt::Debug for TextChunk<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_str_lossy())
    }
}

impl<const N: usize> fmt::Display for TextChunk<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

fn words_to_bytes(words: &[u32; 4]) -> [u8; PACKET_BYTES] {
    let mut bytes = [0u8; PACKET_BYTES];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    bytes
}

fn bytes_to_words(bytes: &[u8; PACKET_BYTES]) -> [u32; 4] {
    let mut words = [0u32; 4];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_strips_trailing_zeros_only() {
        let words = [0xF003_0041, 0x0042_0000, 0, 0];
        let chunk = TextChunk::<14>::unpack(&words);
        assert_eq!(chunk.as_bytes(), b"\0A\0B");
    }

    #[test]
    fn pack_preserves_header_bytes() {
        let mut words = [0xF003_0000, 0, 0, 0];
        let chunk = TextChunk::<14>::try_from("Eurorack").unwrap();
        chunk.pack(&mut words);
        assert_eq!(words, [0xF003_4575, 0x726F_7261, 0x636B_0000, 0]);
        assert_eq!(TextChunk::<14>::unpack(&words), chunk);
    }

    #[test]
    fn function_block_name_region() {
        let mut words = [0xF012_0100, 0, 0, 0];
        TextChunk::<13>::try_from("Hello").unwrap().pack(&mut words);
        assert_eq!(words, [0xF012_0148, 0x656C_6C6F, 0, 0]);
    }

    #[test]
    fn rejects_oversized_text() {
        let err = TextChunk::<14>::try_from("fifteen bytes!!").unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { value: 15, .. }));
    }

    #[test]
    fn split_long_text_into_forms() {
        let chunks = TextChunk::<4>::split("Eurorack synth");
        let forms: Vec<Form> = chunks.iter().map(|(form, _)| *form).collect();
        assert_eq!(
            forms,
            vec![Form::Start, Form::Continue, Form::Continue, Form::End]
        );
        let joined: Vec<u8> = chunks
            .iter()
            .flat_map(|(_, chunk)| chunk.as_bytes().to_vec())
            .collect();
        assert_eq!(joined, b"Eurorack synth");
    }

    #[test]
    fn split_short_text_is_complete() {
        let chunks = TextChunk::<14>::split("Hi");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0, Form::Complete);
    }
}
