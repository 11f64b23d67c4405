//! Universal MIDI Packet codec.
//!
//! Pure functions between typed messages and 32-bit word sequences. The
//! first word's top nibble selects the family and with it the packet length
//! (1, 2 or 4 words); each family then dispatches on fixed status bits.

pub mod channel_voice;
pub mod codec;
pub mod data;
pub mod error;
pub mod flex;
pub mod stream;
pub mod system;
pub mod text;
pub mod types;
pub mod utility;

pub use channel_voice::{Midi1ChannelVoice, Midi1Message, Midi2ChannelVoice, Midi2Message};
pub use codec::{DecodeAll, Ump, WORD_SIZE, decode_all, words_from_be_bytes};
pub use data::{Data64, Data128};
pub use error::{CodecError, Result};
pub use flex::{
    FlexAddress, FlexData, FlexMessage, MetadataTextStatus, PerformanceTextStatus, SetupStatus,
};
pub use stream::{
    DeviceIdentity, EndpointFilter, EndpointInfo, FunctionBlockFilter, FunctionBlockInfo,
    Midi1Mode, StreamConfiguration, StreamMessage, UmpStream, UmpVersion,
};
pub use system::{SystemKind, SystemRealTime, TimeCodeUnit};
pub use text::TextChunk;
pub use types::{Form, MessageType};
pub use utility::Utility;

/// Decode one message from the front of `words`
pub fn decode(words: &[u32]) -> Result<Ump> {
    Ump::decode(words)
}

/// Encode a message into its family's word count, rejecting out-of-range fields
pub fn encode(msg: &Ump) -> Result<Vec<u32>> {
    msg.encode()
}
