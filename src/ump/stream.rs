//! UMP stream messages (message type 0xF)
//!
//! Word 0 layout: form 27..26, status 25..16. These messages describe the
//! endpoint itself (identity, names, protocol configuration and function
//! blocks) rather than musical data.

use std::fmt;

use super::types::{bits, byte7, byte8, check_width, flag};
use super::{CodecError, Form, MessageType, Result, TextChunk};

mod status {
    pub const ENDPOINT_DISCOVERY: u16 = 0x00;
    pub const ENDPOINT_INFO: u16 = 0x01;
    pub const DEVICE_IDENTITY: u16 = 0x02;
    pub const ENDPOINT_NAME: u16 = 0x03;
    pub const PRODUCT_INSTANCE_ID: u16 = 0x04;
    pub const STREAM_CONFIGURATION_REQUEST: u16 = 0x05;
    pub const STREAM_CONFIGURATION_NOTIFICATION: u16 = 0x06;
    pub const FUNCTION_BLOCK_DISCOVERY: u16 = 0x10;
    pub const FUNCTION_BLOCK_INFO: u16 = 0x11;
    pub const FUNCTION_BLOCK_NAME: u16 = 0x12;
    pub const START_OF_CLIP: u16 = 0x20;
    pub const END_OF_CLIP: u16 = 0x21;
}

/// Which notifications an endpoint discovery request asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndpointFilter(u8);

impl EndpointFilter {
    /// Endpoint info notification
    pub const ENDPOINT_INFO: u8 = 1 << 0;
    /// Device identity notification
    pub const DEVICE_IDENTITY: u8 = 1 << 1;
    /// Endpoint name notification
    pub const ENDPOINT_NAME: u8 = 1 << 2;
    /// Product instance id notification
    pub const PRODUCT_INSTANCE_ID: u8 = 1 << 3;
    /// Stream configuration notification
    pub const STREAM_CONFIGURATION: u8 = 1 << 4;
    /// Every notification
    pub const ALL: Self = Self(0x1F);

    /// Create a filter from raw bits
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Underlying bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether the given notification is requested
    #[must_use]
    pub const fn contains(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Request a notification
    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }
}

/// Which notifications a function block discovery request asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionBlockFilter(u8);

impl FunctionBlockFilter {
    /// Function block info notification
    pub const INFO: u8 = 1 << 0;
    /// Function block name notification
    pub const NAME: u8 = 1 << 1;
    /// Both notifications
    pub const ALL: Self = Self(0x03);

    /// Create a filter from raw bits
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Underlying bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether the given notification is requested
    #[must_use]
    pub const fn contains(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }
}

/// UMP version as major/minor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UmpVersion {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
}

impl UmpVersion {
    /// UMP 1.1, the version this crate speaks
    pub const V1_1: Self = Self { major: 1, minor: 1 };

    fn decode(word: u32) -> Self {
        Self {
            major: byte8(word, 8),
            minor: byte8(word, 0),
        }
    }

    fn bits(self) -> u32 {
        (u32::from(self.major) << 8) | u32::from(self.minor)
    }
}

impl Default for UmpVersion {
    fn default() -> Self {
        Self::V1_1
    }
}

impl fmt::Display for UmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// MIDI 1.0 compatibility of a function block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Midi1Mode {
    /// Not a MIDI 1.0 block
    #[default]
    NotMidi1 = 0,
    /// MIDI 1.0 block, no bandwidth restriction
    Midi1 = 1,
    /// MIDI 1.0 block restricted to 31.25 kbps
    Midi1Restricted = 2,
}

impl Midi1Mode {
    /// Convert from the 2-bit field
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NotMidi1),
            1 => Some(Self::Midi1),
            2 => Some(Self::Midi1Restricted),
            _ => None,
        }
    }

    /// Whether the block speaks MIDI 1.0 at all
    #[must_use]
    pub const fn is_midi1(self) -> bool {
        matches!(self, Self::Midi1 | Self::Midi1Restricted)
    }

    /// Whether the block is limited to classic DIN bandwidth
    #[must_use]
    pub const fn is_restricted(self) -> bool {
        matches!(self, Self::Midi1Restricted)
    }
}

/// Endpoint info notification body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndpointInfo {
    /// UMP version
    pub version: UmpVersion,
    /// Function blocks never change
    pub static_blocks: bool,
    /// Number of function blocks (7 bits)
    pub function_blocks: u8,
    /// Supports the MIDI 2.0 protocol
    pub midi2: bool,
    /// Supports the MIDI 1.0 protocol
    pub midi1: bool,
    /// Can receive jitter reduction timestamps
    pub rx_jr: bool,
    /// Can transmit jitter reduction timestamps
    pub tx_jr: bool,
}

/// Device identity notification body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceIdentity {
    /// SysEx manufacturer id, three 7-bit bytes
    pub manufacturer: [u8; 3],
    /// 14-bit device family
    pub family: u16,
    /// 14-bit device family model
    pub model: u16,
    /// Software revision, four 7-bit bytes
    pub software_revision: [u8; 4],
}

/// Stream configuration request/notification body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamConfiguration {
    /// Protocol: 0x01 MIDI 1.0, 0x02 MIDI 2.0
    pub protocol: u8,
    /// Extensions (bit 7 of word 0)
    pub extensions: bool,
    /// Receive jitter reduction timestamps
    pub rx_jr: bool,
    /// Transmit jitter reduction timestamps
    pub tx_jr: bool,
}

/// Function block info notification body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionBlockInfo {
    /// Block is active
    pub active: bool,
    /// Block id (7 bits)
    pub id: u8,
    /// UI hint: block sends to the host
    pub ui_hint_sender: bool,
    /// UI hint: block receives from the host
    pub ui_hint_receiver: bool,
    /// MIDI 1.0 compatibility
    pub midi1: Midi1Mode,
    /// Block produces output
    pub is_output: bool,
    /// Block accepts input
    pub is_input: bool,
    /// First UMP group covered (0-based)
    pub first_group: u8,
    /// Number of groups covered
    pub group_count: u8,
    /// MIDI-CI version
    pub midi_ci_version: u8,
    /// Maximum SysEx8 streams
    pub max_sysex8_streams: u8,
}

/// Concrete UMP stream message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamMessage {
    /// Ask an endpoint to describe itself
    EndpointDiscovery {
        /// Highest UMP version supported by the requester
        version: UmpVersion,
        /// Requested notifications
        filter: EndpointFilter,
    },
    /// Endpoint capabilities and function block count
    EndpointInfo(EndpointInfo),
    /// Manufacturer and model
    DeviceIdentity(DeviceIdentity),
    /// One chunk of the endpoint name
    EndpointName(TextChunk<14>),
    /// One chunk of the product instance id (ASCII)
    ProductInstanceId(TextChunk<14>),
    /// Ask the endpoint to switch protocol
    StreamConfigurationRequest(StreamConfiguration),
    /// Current protocol configuration
    StreamConfigurationNotification(StreamConfiguration),
    /// Ask for a function block description
    FunctionBlockDiscovery {
        /// Block number, `0xFF` for all blocks
        block: u8,
        /// Requested notifications
        filter: FunctionBlockFilter,
    },
    /// Function block description
    FunctionBlockInfo(FunctionBlockInfo),
    /// One chunk of a function block name
    FunctionBlockName {
        /// Block id
        block: u8,
        /// Name chunk
        name: TextChunk<13>,
    },
    /// Start of clip marker
    StartOfClip,
    /// End of clip marker
    EndOfClip,
}

impl StreamMessage {
    /// Status value (10 bits)
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::EndpointDiscovery { .. } => status::ENDPOINT_DISCOVERY,
            Self::EndpointInfo(_) => status::ENDPOINT_INFO,
            Self::DeviceIdentity(_) => status::DEVICE_IDENTITY,
            Self::EndpointName(_) => status::ENDPOINT_NAME,
            Self::ProductInstanceId(_) => status::PRODUCT_INSTANCE_ID,
            Self::StreamConfigurationRequest(_) => status::STREAM_CONFIGURATION_REQUEST,
            Self::StreamConfigurationNotification(_) => status::STREAM_CONFIGURATION_NOTIFICATION,
            Self::FunctionBlockDiscovery { .. } => status::FUNCTION_BLOCK_DISCOVERY,
            Self::FunctionBlockInfo(_) => status::FUNCTION_BLOCK_INFO,
            Self::FunctionBlockName { .. } => status::FUNCTION_BLOCK_NAME,
            Self::StartOfClip => status::START_OF_CLIP,
            Self::EndOfClip => status::END_OF_CLIP,
        }
    }
}

/// UMP stream message with its form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UmpStream {
    /// Position within a chunked field; `Complete` for single-packet messages
    pub form: Form,
    /// Concrete message
    pub message: StreamMessage,
}

impl UmpStream {
    /// Wrap a single-packet message
    #[must_use]
    pub const fn new(message: StreamMessage) -> Self {
        Self {
            form: Form::Complete,
            message,
        }
    }

    /// Endpoint discovery request for the given notifications
    #[must_use]
    pub const fn endpoint_discovery(filter: EndpointFilter) -> Self {
        Self::new(StreamMessage::EndpointDiscovery {
            version: UmpVersion::V1_1,
            filter,
        })
    }

    /// Function block discovery request
    #[must_use]
    pub const fn function_block_discovery(block: u8, filter: FunctionBlockFilter) -> Self {
        Self::new(StreamMessage::FunctionBlockDiscovery { block, filter })
    }

    /// Endpoint name notifications carrying `name`, chunked as needed
    #[must_use]
    pub fn endpoint_name(name: &str) -> Vec<Self> {
        TextChunk::split(name)
            .into_iter()
            .map(|(form, chunk)| Self {
                form,
                message: StreamMessage::EndpointName(chunk),
            })
            .collect()
    }

    /// Function block name notifications carrying `name`, chunked as needed
    #[must_use]
    pub fn function_block_name(block: u8, name: &str) -> Vec<Self> {
        TextChunk::split(name)
            .into_iter()
            .map(|(form, chunk)| Self {
                form,
                message: StreamMessage::FunctionBlockName { block, name: chunk },
            })
            .collect()
    }

    pub(crate) fn decode(words: &[u32; 4]) -> Result<Self> {
        let w0 = words[0];
        let form = Form::from_bits(bits(w0, 26, 2));
        let status = bits(w0, 16, 10) as u16;
        let message = match status {
            status::ENDPOINT_DISCOVERY => StreamMessage::EndpointDiscovery {
                version: UmpVersion::decode(w0),
                filter: EndpointFilter::from_bits(byte8(words[1], 0)),
            },
            status::ENDPOINT_INFO => StreamMessage::EndpointInfo(EndpointInfo {
                version: UmpVersion::decode(w0),
                static_blocks: flag(words[1], 31),
                function_blocks: byte7(words[1], 24),
                midi2: flag(words[1], 9),
                midi1: flag(words[1], 8),
                rx_jr: flag(words[1], 1),
                tx_jr: flag(words[1], 0),
            }),
            status::DEVICE_IDENTITY => StreamMessage::DeviceIdentity(DeviceIdentity {
                manufacturer: [byte7(words[1], 16), byte7(words[1], 8), byte7(words[1], 0)],
                family: (u16::from(byte7(words[2], 16)) << 7) | u16::from(byte7(words[2], 24)),
                model: (u16::from(byte7(words[2], 0)) << 7) | u16::from(byte7(words[2], 8)),
                software_revision: [
                    byte7(words[3], 24),
                    byte7(words[3], 16),
                    byte7(words[3], 8),
                    byte7(words[3], 0),
                ],
            }),
            status::ENDPOINT_NAME => StreamMessage::EndpointName(TextChunk::unpack(words)),
            status::PRODUCT_INSTANCE_ID => {
                let id = TextChunk::<14>::unpack(words);
                if let Some(&byte) = id.as_bytes().iter().find(|b| !b.is_ascii()) {
                    return Err(CodecError::InvalidField {
                        field: "product instance id byte",
                        value: u32::from(byte),
                    });
                }
                StreamMessage::ProductInstanceId(id)
            }
            status::STREAM_CONFIGURATION_REQUEST => {
                StreamMessage::StreamConfigurationRequest(decode_configuration(w0))
            }
            status::STREAM_CONFIGURATION_NOTIFICATION => {
                StreamMessage::StreamConfigurationNotification(decode_configuration(w0))
            }
            status::FUNCTION_BLOCK_DISCOVERY => StreamMessage::FunctionBlockDiscovery {
                block: byte8(w0, 8),
                filter: FunctionBlockFilter::from_bits(byte8(w0, 0)),
            },
            status::FUNCTION_BLOCK_INFO => {
                let mode = bits(w0, 2, 2) as u8;
                let midi1 = Midi1Mode::from_u8(mode).ok_or(CodecError::InvalidField {
                    field: "function block MIDI 1.0 mode",
                    value: u32::from(mode),
                })?;
                StreamMessage::FunctionBlockInfo(FunctionBlockInfo {
                    active: flag(w0, 15),
                    id: byte7(w0, 8),
                    ui_hint_sender: flag(w0, 5),
                    ui_hint_receiver: flag(w0, 4),
                    midi1,
                    is_output: flag(w0, 1),
                    is_input: flag(w0, 0),
                    first_group: byte8(words[1], 24),
                    group_count: byte8(words[1], 16),
                    midi_ci_version: byte8(words[1], 8),
                    max_sysex8_streams: byte8(words[1], 0),
                })
            }
            status::FUNCTION_BLOCK_NAME => StreamMessage::FunctionBlockName {
                block: byte8(w0, 8),
                name: TextChunk::unpack(words),
            },
            status::START_OF_CLIP => StreamMessage::StartOfClip,
            status::END_OF_CLIP => StreamMessage::EndOfClip,
            _ => {
                return Err(CodecError::UnknownStatus {
                    message_type: MessageType::UmpStream,
                    status,
                });
            }
        };
        Ok(Self { form, message })
    }

    /// Check the 7-bit and 14-bit fields, the ASCII product instance id,
    /// and that no text chunk ends in a zero byte the wire would drop.
    pub fn validate(&self) -> Result<()> {
        match &self.message {
            StreamMessage::EndpointInfo(info) => {
                check_width("function block count", info.function_blocks, 7)
            }
            StreamMessage::DeviceIdentity(identity) => {
                identity
                    .manufacturer
                    .iter()
                    .chain(&identity.software_revision)
                    .try_for_each(|&byte| check_width("device identity byte", byte, 7))?;
                check_width("device family", identity.family, 14)?;
                check_width("device model", identity.model, 14)
            }
            StreamMessage::EndpointName(chunk) => check_text(chunk.as_bytes()),
            StreamMessage::ProductInstanceId(chunk) => {
                if let Some(&byte) = chunk.as_bytes().iter().find(|b| !b.is_ascii()) {
                    return Err(CodecError::InvalidField {
                        field: "product instance id byte",
                        value: u32::from(byte),
                    });
                }
                check_text(chunk.as_bytes())
            }
            StreamMessage::FunctionBlockInfo(info) => check_width("function block id", info.id, 7),
            StreamMessage::FunctionBlockName { name, .. } => check_text(name.as_bytes()),
            _ => Ok(()),
        }
    }

    pub(crate) fn encode(&self, words: &mut [u32; 4]) {
        words[0] |= (u32::from(self.form.as_u8()) << 26) | (u32::from(self.message.status()) << 16);
        match &self.message {
            StreamMessage::EndpointDiscovery { version, filter } => {
                words[0] |= version.bits();
                words[1] = u32::from(filter.bits());
            }
            StreamMessage::EndpointInfo(info) => {
                words[0] |= info.version.bits();
                words[1] = (u32::from(info.static_blocks) << 31)
                    | ((u32::from(info.function_blocks) & 0x7F) << 24)
                    | (u32::from(info.midi2) << 9)
                    | (u32::from(info.midi1) << 8)
                    | (u32::from(info.rx_jr) << 1)
                    | u32::from(info.tx_jr);
            }
            StreamMessage::DeviceIdentity(identity) => {
                let [m0, m1, m2] = identity.manufacturer.map(|b| b & 0x7F);
                words[1] = u32::from_be_bytes([0, m0, m1, m2]);
                words[2] = u32::from_be_bytes([
                    (identity.family & 0x7F) as u8,
                    ((identity.family >> 7) & 0x7F) as u8,
                    (identity.model & 0x7F) as u8,
                    ((identity.model >> 7) & 0x7F) as u8,
                ]);
                words[3] = u32::from_be_bytes(identity.software_revision.map(|b| b & 0x7F));
            }
            StreamMessage::EndpointName(chunk) | StreamMessage::ProductInstanceId(chunk) => {
                chunk.pack(words);
            }
            StreamMessage::StreamConfigurationRequest(config)
            | StreamMessage::StreamConfigurationNotification(config) => {
                words[0] |= (u32::from(config.protocol) << 8)
                    | (u32::from(config.extensions) << 7)
                    | (u32::from(config.rx_jr) << 1)
                    | u32::from(config.tx_jr);
            }
            StreamMessage::FunctionBlockDiscovery { block, filter } => {
                words[0] |= (u32::from(*block) << 8) | u32::from(filter.bits());
            }
            StreamMessage::FunctionBlockInfo(info) => {
                words[0] |= (u32::from(info.active) << 15)
                    | ((u32::from(info.id) & 0x7F) << 8)
                    | (u32::from(info.ui_hint_sender) << 5)
                    | (u32::from(info.ui_hint_receiver) << 4)
                    | (u32::from(info.midi1 as u8) << 2)
                    | (u32::from(info.is_output) << 1)
                    | u32::from(info.is_input);
                words[1] = u32::from_be_bytes([
                    info.first_group,
                    info.group_count,
                    info.midi_ci_version,
                    info.max_sysex8_streams,
                ]);
            }
            StreamMessage::FunctionBlockName { block, name } => {
                words[0] |= u32::from(*block) << 8;
                name.pack(words);
            }
            StreamMessage::StartOfClip | StreamMessage::EndOfClip => {}
        }
    }
}

fn check_text(bytes: &[u8]) -> Result<()> {
    match bytes.last() {
        Some(0) => Err(CodecError::InvalidField {
            field: "text trailing byte",
            value: 0,
        }),
        _ => Ok(()),
    }
}

fn decode_configuration(word: u32) -> StreamConfiguration {
    StreamConfiguration {
        protocol: byte8(word, 8),
        extensions: flag(word, 7),
        rx_jr: flag(word, 1),
        tx_jr: flag(word, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(msg: &UmpStream) -> [u32; 4] {
        let mut words = [0xF000_0000, 0, 0, 0];
        msg.encode(&mut words);
        words
    }

    #[test]
    fn endpoint_info_flags() {
        let words = [0xF001_0101, 0x9100_0303, 0, 0];
        let msg = UmpStream::decode(&words).unwrap();
        let StreamMessage::EndpointInfo(info) = msg.message else {
            panic!("expected endpoint info, got {msg:?}");
        };
        assert_eq!(info.version, UmpVersion::V1_1);
        assert!(info.static_blocks);
        assert_eq!(info.function_blocks, 17);
        assert!(info.midi1 && info.midi2 && info.rx_jr && info.tx_jr);
        assert_eq!(encode(&msg), words);
    }

    #[test]
    fn device_identity_fields() {
        let words = [0xF002_0000, 0x0000_0007, 0x0100_0200, 0x0102_0304];
        let msg = UmpStream::decode(&words).unwrap();
        assert_eq!(
            msg.message,
            StreamMessage::DeviceIdentity(DeviceIdentity {
                manufacturer: [0, 0, 7],
                family: 1,
                model: 2,
                software_revision: [1, 2, 3, 4],
            })
        );
        assert_eq!(encode(&msg), words);
    }

    #[test]
    fn utf8_endpoint_name() {
        let words = [0xF003_E282, 0xAC75_726F, 0x7261_636B, 0];
        let msg = UmpStream::decode(&words).unwrap();
        let StreamMessage::EndpointName(name) = &msg.message else {
            panic!("expected endpoint name");
        };
        assert_eq!(name.to_str_lossy(), "€urorack");
        assert_eq!(encode(&msg), words);
    }

    #[test]
    fn product_instance_id_must_be_ascii() {
        let err = UmpStream::decode(&[0xF004_E282, 0xAC00_0000, 0, 0]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { value: 0xE2, .. }));
        let ok = UmpStream::decode(&[0xF004_4177, 0x6573_6F6D, 0x6520_7072, 0x6F64_0000]);
        assert!(ok.is_ok());
    }

    #[test]
    fn function_block_info_layout() {
        let words = [0xF011_813B, 0x0102_0004, 0, 0];
        let msg = UmpStream::decode(&words).unwrap();
        let StreamMessage::FunctionBlockInfo(info) = msg.message else {
            panic!("expected function block info");
        };
        assert!(info.active);
        assert_eq!(info.id, 1);
        assert!(info.ui_hint_sender && info.ui_hint_receiver);
        assert_eq!(info.midi1, Midi1Mode::Midi1Restricted);
        assert!(info.is_output && info.is_input);
        assert_eq!((info.first_group, info.group_count), (1, 2));
        assert_eq!(info.max_sysex8_streams, 4);
        assert_eq!(encode(&msg), words);
    }

    #[test]
    fn form_bits_are_27_26() {
        let msg = UmpStream::decode(&[0xF803_4575, 0x726F_0000, 0, 0]).unwrap();
        assert_eq!(msg.form, Form::Continue);
    }

    #[test]
    fn unknown_status() {
        let err = UmpStream::decode(&[0xF0FF_0000, 0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownStatus {
                message_type: MessageType::UmpStream,
                status: 0xFF
            }
        );
    }

    #[test]
    fn long_name_forms() {
        let packets = UmpStream::endpoint_name("Eurorack Modular System");
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].form, Form::Start);
        assert_eq!(packets[1].form, Form::End);
    }

    #[test]
    fn out_of_range_stream_fields_are_rejected() {
        let info = EndpointInfo {
            version: UmpVersion::V1_1,
            static_blocks: false,
            function_blocks: 0x80,
            midi2: true,
            midi1: false,
            rx_jr: false,
            tx_jr: false,
        };
        let err = UmpStream::new(StreamMessage::EndpointInfo(info))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidField {
                field: "function block count",
                value: 0x80
            }
        );

        let identity = DeviceIdentity {
            manufacturer: [0x00, 0x21, 0x09],
            family: 0x4000,
            model: 1,
            software_revision: [1, 0, 0, 0],
        };
        assert!(UmpStream::new(StreamMessage::DeviceIdentity(identity)).validate().is_err());
        let identity = DeviceIdentity {
            family: 0x3FFF,
            ..identity
        };
        assert!(UmpStream::new(StreamMessage::DeviceIdentity(identity)).validate().is_ok());
        let identity = DeviceIdentity {
            software_revision: [0x80, 0, 0, 0],
            ..identity
        };
        assert!(UmpStream::new(StreamMessage::DeviceIdentity(identity)).validate().is_err());

        let id = TextChunk::new("caf\u{e9}".as_bytes()).unwrap();
        assert!(UmpStream::new(StreamMessage::ProductInstanceId(id)).validate().is_err());

        for msg in UmpStream::endpoint_name("nul\0") {
            assert!(msg.validate().is_err());
        }
    }
}
