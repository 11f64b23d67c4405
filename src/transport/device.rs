//! UMP over a raw character device (or any byte stream).
//!
//! Words travel in native byte order with no framing; the message type
//! nibble of the first word tells how many more words follow.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, trace};

use super::error::TransportError;
use super::metrics::Metrics;
use super::ump_transport::UmpTransport;
use crate::ump::{Ump, WORD_SIZE};

/// Word count for every message type nibble, reserved types included, so a
/// reader stays aligned after an unknown packet.
const fn words_for_type(nibble: u32) -> usize {
    match nibble & 0xF {
        0x0..=0x2 | 0x6 | 0x7 => 1,
        0x3 | 0x4 | 0x8..=0xA => 2,
        0xB | 0xC => 3,
        _ => 4,
    }
}

/// [`UmpTransport`] over a reader/writer pair.
#[derive(Debug)]
pub struct DeviceTransport<R, W> {
    reader: R,
    writer: W,
}

impl DeviceTransport<File, File> {
    /// Open a UMP character device such as `/dev/snd/umpC0D0`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let writer = OpenOptions::new().read(true).write(true).open(path)?;
        let reader = writer.try_clone()?;
        debug!(path = %path.display(), "device opened");
        Ok(Self::new(reader, writer))
    }
}

impl<R: Read, W: Write> DeviceTransport<R, W> {
    /// Wrap an existing reader/writer pair
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Give back the underlying reader and writer
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn read_word(&mut self) -> Result<u32, TransportError> {
        let mut buf = [0u8; WORD_SIZE];
        self.reader.read_exact(&mut buf)?;
        Ok(u32::from_ne_bytes(buf))
    }
}

impl<R: Read, W: Write> UmpTransport for DeviceTransport<R, W> {
    fn send_many(&mut self, messages: &[Ump]) -> Result<(), TransportError> {
        let mut bytes = Vec::with_capacity(messages.len() * 4 * WORD_SIZE);
        for message in messages {
            for word in message.encode()? {
                bytes.extend_from_slice(&word.to_ne_bytes());
            }
        }
        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        for message in messages {
            Metrics::record_ump_sent(message.message_type());
        }
        trace!(messages = messages.len(), "device write");
        Ok(())
    }

    fn recv(&mut self) -> Result<Ump, TransportError> {
        let first = self.read_word()?;
        let mut words = [first, 0, 0, 0];
        let count = words_for_type(first >> 28);
        for slot in &mut words[1..count] {
            *slot = self.read_word()?;
        }
        match Ump::decode(&words[..count]) {
            Ok(message) => {
                Metrics::record_ump_received();
                Ok(message)
            }
            Err(err) => {
                Metrics::record_decode_error();
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ump::{CodecError, Midi1ChannelVoice, Midi1Message, UmpStream, EndpointFilter};
    use std::io::Cursor;

    fn bytes_of(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_ne_bytes()).collect()
    }

    #[test]
    fn writes_native_words() {
        let mut device = DeviceTransport::new(Cursor::new(Vec::new()), Vec::new());
        let msg: Ump = Midi1ChannelVoice::new(0, 4, Midi1Message::ProgramChange { program: 0x7F }).into();
        device.send(&msg).unwrap();
        let (_, written) = device.into_inner();
        assert_eq!(written, bytes_of(&[0x20C4_007F]));
    }

    #[test]
    fn unencodable_batch_writes_nothing() {
        let mut device = DeviceTransport::new(Cursor::new(Vec::new()), Vec::new());
        let good: Ump = Midi1ChannelVoice::new(0, 0, Midi1Message::ProgramChange { program: 1 }).into();
        let bad: Ump = Midi1ChannelVoice::new(0, 0, Midi1Message::ProgramChange { program: 0x80 }).into();
        assert!(matches!(
            device.send_many(&[good, bad]),
            Err(TransportError::Codec(CodecError::InvalidField { .. }))
        ));
        let (_, written) = device.into_inner();
        assert!(written.is_empty());
    }

    #[test]
    fn reads_each_family_length() {
        let stream: Ump = UmpStream::endpoint_discovery(EndpointFilter::ALL).into();
        let mut words = stream.encode().unwrap();
        words.push(0x20C4_007F);
        let mut device = DeviceTransport::new(Cursor::new(bytes_of(&words)), Vec::new());
        assert_eq!(device.recv().unwrap(), stream);
        assert!(matches!(device.recv().unwrap(), Ump::Midi1(_)));
        assert!(matches!(device.recv(), Err(TransportError::Socket(_))));
    }

    #[test]
    fn reserved_type_keeps_alignment() {
        // type 0x8 is reserved and two words long
        let words = [0x8000_0000, 0xDEAD_BEEF, 0x20C4_007F];
        let mut device = DeviceTransport::new(Cursor::new(bytes_of(&words)), Vec::new());
        assert!(matches!(
            device.recv(),
            Err(TransportError::Codec(CodecError::UnknownMessageType { .. }))
        ));
        assert!(matches!(device.recv().unwrap(), Ump::Midi1(_)));
    }
}
