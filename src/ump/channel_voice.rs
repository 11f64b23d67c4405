//! MIDI 1.0 (message type 0x2) and MIDI 2.0 (message type 0x4) channel voice messages
//!
//! Both families share the word 0 header: group in bits 27..24, status in
//! bits 23..20, channel in bits 19..16.

use super::types::{bits, byte7, byte8, check_width, flag, group_channel};
use super::{CodecError, MessageType, Result};

mod status {
    pub const REGISTERED_PER_NOTE_CONTROLLER: u8 = 0x0;
    pub const ASSIGNABLE_PER_NOTE_CONTROLLER: u8 = 0x1;
    pub const REGISTERED_CONTROLLER: u8 = 0x2;
    pub const ASSIGNABLE_CONTROLLER: u8 = 0x3;
    pub const RELATIVE_REGISTERED_CONTROLLER: u8 = 0x4;
    pub const RELATIVE_ASSIGNABLE_CONTROLLER: u8 = 0x5;
    pub const PER_NOTE_PITCH_BEND: u8 = 0x6;
    pub const NOTE_OFF: u8 = 0x8;
    pub const NOTE_ON: u8 = 0x9;
    pub const POLY_PRESSURE: u8 = 0xA;
    pub const CONTROL_CHANGE: u8 = 0xB;
    pub const PROGRAM_CHANGE: u8 = 0xC;
    pub const CHANNEL_PRESSURE: u8 = 0xD;
    pub const PITCH_BEND: u8 = 0xE;
    pub const PER_NOTE_MANAGEMENT: u8 = 0xF;
}

fn header(group: u8, status: u8, channel: u8) -> u32 {
    ((u32::from(group) & 0xF) << 24) | (u32::from(status) << 20) | ((u32::from(channel) & 0xF) << 16)
}

fn check_address(group: u8, channel: u8) -> Result<()> {
    check_width("group", group, 4)?;
    check_width("channel", channel, 4)
}

fn unknown(message_type: MessageType, status: u8) -> CodecError {
    CodecError::UnknownStatus {
        message_type,
        status: u16::from(status),
    }
}

/// MIDI 1.0 channel voice payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Midi1Message {
    /// Note off
    NoteOff {
        /// Note number (7 bits)
        note: u8,
        /// Release velocity (7 bits)
        velocity: u8,
    },
    /// Note on
    NoteOn {
        /// Note number (7 bits)
        note: u8,
        /// Velocity (7 bits)
        velocity: u8,
    },
    /// Polyphonic key pressure
    PolyPressure {
        /// Note number (7 bits)
        note: u8,
        /// Pressure (7 bits)
        pressure: u8,
    },
    /// Control change
    ControlChange {
        /// Controller number (7 bits)
        controller: u8,
        /// Controller value (7 bits)
        value: u8,
    },
    /// Program change. The program sits in word 0 bits 6..0.
    ProgramChange {
        /// Program number (7 bits)
        program: u8,
    },
    /// Channel pressure
    ChannelPressure {
        /// Pressure (7 bits)
        pressure: u8,
    },
    /// Pitch bend as a signed 14-bit value (-8192..=8191)
    PitchBend {
        /// Bend amount
        value: i16,
    },
}

impl Midi1Message {
    /// Status nibble
    #[must_use]
    pub const fn status(&self) -> u8 {
        match self {
            Self::NoteOff { .. } => status::NOTE_OFF,
            Self::NoteOn { .. } => status::NOTE_ON,
            Self::PolyPressure { .. } => status::POLY_PRESSURE,
            Self::ControlChange { .. } => status::CONTROL_CHANGE,
            Self::ProgramChange { .. } => status::PROGRAM_CHANGE,
            Self::ChannelPressure { .. } => status::CHANNEL_PRESSURE,
            Self::PitchBend { .. } => status::PITCH_BEND,
        }
    }

    /// Check every data field against its 7-bit (or signed 14-bit) range.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::NoteOff { note, velocity } | Self::NoteOn { note, velocity } => {
                check_width("note", note, 7)?;
                check_width("velocity", velocity, 7)
            }
            Self::PolyPressure { note, pressure } => {
                check_width("note", note, 7)?;
                check_width("pressure", pressure, 7)
            }
            Self::ControlChange { controller, value } => {
                check_width("controller", controller, 7)?;
                check_width("controller value", value, 7)
            }
            Self::ProgramChange { program } => check_width("program", program, 7),
            Self::ChannelPressure { pressure } => check_width("pressure", pressure, 7),
            Self::PitchBend { value } if !(-8192..=8191).contains(&value) => {
                Err(CodecError::InvalidField {
                    field: "pitch bend",
                    value: u32::from(value as u16),
                })
            }
            Self::PitchBend { .. } => Ok(()),
        }
    }

    /// The two data bytes as they appear in word 0 bits 15..0
    fn data_bytes(&self) -> (u8, u8) {
        match *self {
            Self::NoteOff { note, velocity } | Self::NoteOn { note, velocity } => (note, velocity),
            Self::PolyPressure { note, pressure } => (note, pressure),
            Self::ControlChange { controller, value } => (controller, value),
            Self::ProgramChange { program } => (0, program),
            Self::ChannelPressure { pressure } => (pressure, 0),
            Self::PitchBend { value } => {
                let raw = value as u16;
                ((raw & 0x7F) as u8, ((raw >> 7) & 0x7F) as u8)
            }
        }
    }

    fn from_data(status: u8, hi: u8, lo: u8) -> Option<Self> {
        let message = match status {
            status::NOTE_OFF => Self::NoteOff {
                note: hi,
                velocity: lo,
            },
            status::NOTE_ON => Self::NoteOn {
                note: hi,
                velocity: lo,
            },
            status::POLY_PRESSURE => Self::PolyPressure {
                note: hi,
                pressure: lo,
            },
            status::CONTROL_CHANGE => Self::ControlChange {
                controller: hi,
                value: lo,
            },
            status::PROGRAM_CHANGE => Self::ProgramChange { program: lo },
            status::CHANNEL_PRESSURE => Self::ChannelPressure { pressure: hi },
            status::PITCH_BEND => {
                let raw = (u16::from(lo) << 7) | u16::from(hi);
                // sign-extend from bit 13
                let value = ((raw << 2) as i16) >> 2;
                Self::PitchBend { value }
            }
            _ => return None,
        };
        Some(message)
    }
}

/// MIDI 1.0 channel voice message wrapped in a 32-bit UMP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Midi1ChannelVoice {
    /// UMP group (0..=15)
    pub group: u8,
    /// MIDI channel (0..=15)
    pub channel: u8,
    /// Payload
    pub message: Midi1Message,
}

impl Midi1ChannelVoice {
    /// Create a message
    #[must_use]
    pub const fn new(group: u8, channel: u8, message: Midi1Message) -> Self {
        Self {
            group,
            channel,
            message,
        }
    }

    /// Render as classic MIDI 1.0 bytes (status byte plus one or two data bytes)
    #[must_use]
    pub fn to_midi1_bytes(&self) -> Vec<u8> {
        let status_byte = (self.message.status() << 4) | (self.channel & 0xF);
        let (hi, lo) = self.message.data_bytes();
        match self.message {
            Midi1Message::ProgramChange { program } => vec![status_byte, program & 0x7F],
            Midi1Message::ChannelPressure { pressure } => vec![status_byte, pressure & 0x7F],
            _ => vec![status_byte, hi & 0x7F, lo & 0x7F],
        }
    }

    /// Lift a MIDI 1.0 channel voice byte sequence into a UMP on `group`.
    ///
    /// Running status is not supported; the first byte must be a channel
    /// voice status byte.
    pub fn from_midi1_bytes(group: u8, bytes: &[u8]) -> Result<Self> {
        let Some(&status_byte) = bytes.first() else {
            return Err(CodecError::InvalidField {
                field: "midi1 length",
                value: 0,
            });
        };
        let status = status_byte >> 4;
        if !(status::NOTE_OFF..=status::PITCH_BEND).contains(&status) {
            return Err(CodecError::InvalidField {
                field: "midi1 status",
                value: u32::from(status_byte),
            });
        }
        let needed = match status {
            status::PROGRAM_CHANGE | status::CHANNEL_PRESSURE => 2,
            _ => 3,
        };
        if bytes.len() < needed {
            return Err(CodecError::InvalidField {
                field: "midi1 length",
                value: bytes.len() as u32,
            });
        }
        let d1 = bytes[1] & 0x7F;
        let d2 = bytes.get(2).map_or(0, |b| b & 0x7F);
        let (hi, lo) = match status {
            status::PROGRAM_CHANGE => (0, d1),
            status::CHANNEL_PRESSURE => (d1, 0),
            _ => (d1, d2),
        };
        let message = Midi1Message::from_data(status, hi, lo).ok_or(CodecError::InvalidField {
            field: "midi1 status",
            value: u32::from(status_byte),
        })?;
        check_width("group", group, 4)?;
        Ok(Self::new(group, status_byte & 0xF, message))
    }

    /// Check the group, channel and data fields before encoding.
    pub fn validate(&self) -> Result<()> {
        check_address(self.group, self.channel)?;
        self.message.validate()
    }

    pub(crate) fn decode(words: &[u32; 4]) -> Result<Self> {
        let word = words[0];
        let (group, channel) = group_channel(word);
        let status = bits(word, 20, 4) as u8;
        let message = Midi1Message::from_data(status, byte7(word, 8), byte7(word, 0))
            .ok_or_else(|| unknown(MessageType::Midi1ChannelVoice, status))?;
        Ok(Self {
            group,
            channel,
            message,
        })
    }

    pub(crate) fn encode(&self, words: &mut [u32; 4]) {
        let (hi, lo) = self.message.data_bytes();
        words[0] |= header(self.group, self.message.status(), self.channel)
            | ((u32::from(hi) & 0x7F) << 8)
            | (u32::from(lo) & 0x7F);
    }
}

/// MIDI 2.0 channel voice payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Midi2Message {
    /// Registered per-note controller
    RegisteredPerNoteController {
        /// Note number (7 bits)
        note: u8,
        /// Controller index
        index: u8,
        /// 32-bit controller value
        data: u32,
    },
    /// Assignable per-note controller
    AssignablePerNoteController {
        /// Note number (7 bits)
        note: u8,
        /// Controller index
        index: u8,
        /// 32-bit controller value
        data: u32,
    },
    /// Registered controller (RPN)
    RegisteredController {
        /// Bank (7 bits)
        bank: u8,
        /// Index (7 bits)
        index: u8,
        /// 32-bit controller value
        data: u32,
    },
    /// Assignable controller (NRPN)
    AssignableController {
        /// Bank (7 bits)
        bank: u8,
        /// Index (7 bits)
        index: u8,
        /// 32-bit controller value
        data: u32,
    },
    /// Relative registered controller
    RelativeRegisteredController {
        /// Bank (7 bits)
        bank: u8,
        /// Index (7 bits)
        index: u8,
        /// Signed increment
        delta: i32,
    },
    /// Relative assignable controller
    RelativeAssignableController {
        /// Bank (7 bits)
        bank: u8,
        /// Index (7 bits)
        index: u8,
        /// Signed increment
        delta: i32,
    },
    /// Per-note pitch bend
    PerNotePitchBend {
        /// Note number (7 bits)
        note: u8,
        /// Unsigned 32-bit bend, centre at `0x8000_0000`
        value: u32,
    },
    /// Note off
    NoteOff {
        /// Note number (7 bits)
        note: u8,
        /// 16-bit release velocity
        velocity: u16,
        /// Attribute type
        attribute_type: u8,
        /// Attribute data
        attribute_data: u16,
    },
    /// Note on
    NoteOn {
        /// Note number (7 bits)
        note: u8,
        /// 16-bit velocity
        velocity: u16,
        /// Attribute type
        attribute_type: u8,
        /// Attribute data
        attribute_data: u16,
    },
    /// Polyphonic key pressure
    PolyPressure {
        /// Note number (7 bits)
        note: u8,
        /// 32-bit pressure
        data: u32,
    },
    /// Control change
    ControlChange {
        /// Controller number (7 bits)
        controller: u8,
        /// 32-bit controller value
        data: u32,
    },
    /// Program change with optional bank select
    ProgramChange {
        /// Program number (7 bits)
        program: u8,
        /// Whether `bank` should be applied
        bank_valid: bool,
        /// 14-bit bank number
        bank: u16,
    },
    /// Channel pressure
    ChannelPressure {
        /// 32-bit pressure
        data: u32,
    },
    /// Pitch bend, centre at `0x8000_0000`
    PitchBend {
        /// Unsigned 32-bit bend
        value: u32,
    },
    /// Per-note management
    PerNoteManagement {
        /// Note number (7 bits)
        note: u8,
        /// Detach per-note controllers from previously received notes
        detach: bool,
        /// Reset per-note controllers to defaults
        reset: bool,
    },
}

impl Midi2Message {
    /// Status nibble
    #[must_use]
    pub const fn status(&self) -> u8 {
        match self {
            Self::RegisteredPerNoteController { .. } => status::REGISTERED_PER_NOTE_CONTROLLER,
            Self::AssignablePerNoteController { .. } => status::ASSIGNABLE_PER_NOTE_CONTROLLER,
            Self::RegisteredController { .. } => status::REGISTERED_CONTROLLER,
            Self::AssignableController { .. } => status::ASSIGNABLE_CONTROLLER,
            Self::RelativeRegisteredController { .. } => status::RELATIVE_REGISTERED_CONTROLLER,
            Self::RelativeAssignableController { .. } => status::RELATIVE_ASSIGNABLE_CONTROLLER,
            Self::PerNotePitchBend { .. } => status::PER_NOTE_PITCH_BEND,
            Self::NoteOff { .. } => status::NOTE_OFF,
            Self::NoteOn { .. } => status::NOTE_ON,
            Self::PolyPressure { .. } => status::POLY_PRESSURE,
            Self::ControlChange { .. } => status::CONTROL_CHANGE,
            Self::ProgramChange { .. } => status::PROGRAM_CHANGE,
            Self::ChannelPressure { .. } => status::CHANNEL_PRESSURE,
            Self::PitchBend { .. } => status::PITCH_BEND,
            Self::PerNoteManagement { .. } => status::PER_NOTE_MANAGEMENT,
        }
    }

    /// Check the 7-bit note, bank, index and program fields and the 14-bit bank.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::RegisteredPerNoteController { note, .. }
            | Self::AssignablePerNoteController { note, .. }
            | Self::PerNotePitchBend { note, .. }
            | Self::NoteOff { note, .. }
            | Self::NoteOn { note, .. }
            | Self::PolyPressure { note, .. }
            | Self::PerNoteManagement { note, .. } => check_width("note", note, 7),
            Self::RegisteredController { bank, index, .. }
            | Self::AssignableController { bank, index, .. }
            | Self::RelativeRegisteredController { bank, index, .. }
            | Self::RelativeAssignableController { bank, index, .. } => {
                check_width("controller bank", bank, 7)?;
                check_width("controller index", index, 7)
            }
            Self::ControlChange { controller, .. } => check_width("controller", controller, 7),
            Self::ProgramChange { program, bank, .. } => {
                check_width("program", program, 7)?;
                check_width("program bank", bank, 14)
            }
            Self::ChannelPressure { .. } | Self::PitchBend { .. } => Ok(()),
        }
    }

    /// Word 0 bits 15..0 and word 1
    fn fields(&self) -> (u32, u32) {
        let seven = |v: u8| u32::from(v) & 0x7F;
        match *self {
            Self::RegisteredPerNoteController { note, index, data }
            | Self::AssignablePerNoteController { note, index, data } => {
                ((seven(note) << 8) | u32::from(index), data)
            }
            Self::RegisteredController { bank, index, data }
            | Self::AssignableController { bank, index, data } => {
                ((seven(bank) << 8) | seven(index), data)
            }
            Self::RelativeRegisteredController { bank, index, delta }
            | Self::RelativeAssignableController { bank, index, delta } => {
                ((seven(bank) << 8) | seven(index), delta as u32)
            }
            Self::PerNotePitchBend { note, value } => (seven(note) << 8, value),
            Self::NoteOff {
                note,
                velocity,
                attribute_type,
                attribute_data,
            }
            | Self::NoteOn {
                note,
                velocity,
                attribute_type,
                attribute_data,
            } => (
                (seven(note) << 8) | u32::from(attribute_type),
                (u32::from(velocity) << 16) | u32::from(attribute_data),
            ),
            Self::PolyPressure { note, data } => (seven(note) << 8, data),
            Self::ControlChange { controller, data } => (seven(controller) << 8, data),
            Self::ProgramChange {
                program,
                bank_valid,
                bank,
            } => {
                let bank = u32::from(bank);
                (
                    u32::from(bank_valid),
                    (seven(program) << 24) | (((bank >> 7) & 0x7F) << 8) | (bank & 0x7F),
                )
            }
            Self::ChannelPressure { data } => (0, data),
            Self::PitchBend { value } => (0, value),
            Self::PerNoteManagement {
                note,
                detach,
                reset,
            } => (
                (seven(note) << 8) | (u32::from(detach) << 1) | u32::from(reset),
                0,
            ),
        }
    }
}

/// MIDI 2.0 channel voice message in a 64-bit UMP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Midi2ChannelVoice {
    /// UMP group (0..=15)
    pub group: u8,
    /// MIDI channel (0..=15)
    pub channel: u8,
    /// Payload
    pub message: Midi2Message,
}

impl Midi2ChannelVoice {
    /// Create a message
    #[must_use]
    pub const fn new(group: u8, channel: u8, message: Midi2Message) -> Self {
        Self {
            group,
            channel,
            message,
        }
    }

    pub(crate) fn decode(words: &[u32; 4]) -> Result<Self> {
        let (w0, w1) = (words[0], words[1]);
        let (group, channel) = group_channel(w0);
        let status = bits(w0, 20, 4) as u8;
        let note = byte7(w0, 8);
        let message = match status {
            status::REGISTERED_PER_NOTE_CONTROLLER => Midi2Message::RegisteredPerNoteController {
                note,
                index: byte8(w0, 0),
                data: w1,
            },
            status::ASSIGNABLE_PER_NOTE_CONTROLLER => Midi2Message::AssignablePerNoteController {
                note,
                index: byte8(w0, 0),
                data: w1,
            },
            status::REGISTERED_CONTROLLER => Midi2Message::RegisteredController {
                bank: byte7(w0, 8),
                index: byte7(w0, 0),
                data: w1,
            },
            status::ASSIGNABLE_CONTROLLER => Midi2Message::AssignableController {
                bank: byte7(w0, 8),
                index: byte7(w0, 0),
                data: w1,
            },
            status::RELATIVE_REGISTERED_CONTROLLER => Midi2Message::RelativeRegisteredController {
                bank: byte7(w0, 8),
                index: byte7(w0, 0),
                delta: w1 as i32,
            },
            status::RELATIVE_ASSIGNABLE_CONTROLLER => Midi2Message::RelativeAssignableController {
                bank: byte7(w0, 8),
                index: byte7(w0, 0),
                delta: w1 as i32,
            },
            status::PER_NOTE_PITCH_BEND => Midi2Message::PerNotePitchBend { note, value: w1 },
            status::NOTE_OFF => Midi2Message::NoteOff {
                note,
                velocity: (w1 >> 16) as u16,
                attribute_type: byte8(w0, 0),
                attribute_data: (w1 & 0xFFFF) as u16,
            },
            status::NOTE_ON => Midi2Message::NoteOn {
                note,
                velocity: (w1 >> 16) as u16,
                attribute_type: byte8(w0, 0),
                attribute_data: (w1 & 0xFFFF) as u16,
            },
            status::POLY_PRESSURE => Midi2Message::PolyPressure { note, data: w1 },
            status::CONTROL_CHANGE => Midi2Message::ControlChange {
                controller: note,
                data: w1,
            },
            status::PROGRAM_CHANGE => Midi2Message::ProgramChange {
                program: byte7(w1, 24),
                bank_valid: flag(w0, 0),
                bank: (u16::from(byte7(w1, 8)) << 7) | u16::from(byte7(w1, 0)),
            },
            status::CHANNEL_PRESSURE => Midi2Message::ChannelPressure { data: w1 },
            status::PITCH_BEND => Midi2Message::PitchBend { value: w1 },
            status::PER_NOTE_MANAGEMENT => Midi2Message::PerNoteManagement {
                note,
                detach: flag(w0, 1),
                reset: flag(w0, 0),
            },
            _ => return Err(unknown(MessageType::Midi2ChannelVoice, status)),
        };
        Ok(Self {
            group,
            channel,
            message,
        })
    }

    /// Check the group, channel and data fields before encoding.
    pub fn validate(&self) -> Result<()> {
        check_address(self.group, self.channel)?;
        self.message.validate()
    }

    pub(crate) fn encode(&self, words: &mut [u32; 4]) {
        let (low, second) = self.message.fields();
        words[0] |= header(self.group, self.message.status(), self.channel) | low;
        words[1] = second;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midi1(word: u32) -> Midi1ChannelVoice {
        Midi1ChannelVoice::decode(&[word, 0, 0, 0]).unwrap()
    }

    fn encode1(msg: &Midi1ChannelVoice) -> u32 {
        let mut words = [0x2000_0000, 0, 0, 0];
        msg.encode(&mut words);
        words[0]
    }

    #[test]
    fn pitch_bend_sign_extension() {
        let msg = midi1(0x22E4_2849);
        assert_eq!(msg.group, 2);
        assert_eq!(msg.channel, 4);
        assert_eq!(msg.message, Midi1Message::PitchBend { value: -7000 });
        assert_eq!(encode1(&msg), 0x22E4_2849);

        let positive = Midi1ChannelVoice::new(2, 4, Midi1Message::PitchBend { value: 7000 });
        assert_eq!(encode1(&positive), 0x22E4_5836);
    }

    #[test]
    fn pitch_bend_extremes() {
        for value in [-8192, -1, 0, 1, 8191] {
            let msg = Midi1ChannelVoice::new(0, 0, Midi1Message::PitchBend { value });
            assert_eq!(midi1(encode1(&msg)), msg, "{value}");
        }
    }

    #[test]
    fn program_change_low_byte() {
        let msg = midi1(0x22C4_007F);
        assert_eq!(msg.message, Midi1Message::ProgramChange { program: 127 });
        assert_eq!(msg.to_midi1_bytes(), vec![0xC4, 0x7F]);
    }

    #[test]
    fn midi1_bytes_round_trip() {
        let note_on = midi1(0x2294_407F);
        assert_eq!(note_on.to_midi1_bytes(), vec![0x94, 0x40, 0x7F]);
        assert_eq!(
            Midi1ChannelVoice::from_midi1_bytes(2, &[0x94, 0x40, 0x7F]).unwrap(),
            note_on
        );

        let bend = midi1(0x22E4_2849);
        let bytes = bend.to_midi1_bytes();
        assert_eq!(bytes, vec![0xE4, 0x28, 0x49]);
        assert_eq!(Midi1ChannelVoice::from_midi1_bytes(2, &bytes).unwrap(), bend);
    }

    #[test]
    fn from_midi1_bytes_rejects_non_voice() {
        assert!(Midi1ChannelVoice::from_midi1_bytes(0, &[0xF8]).is_err());
        assert!(Midi1ChannelVoice::from_midi1_bytes(0, &[0x90, 0x40]).is_err());
        assert!(Midi1ChannelVoice::from_midi1_bytes(0, &[]).is_err());
    }

    #[test]
    fn midi1_reserved_status() {
        let err = Midi1ChannelVoice::decode(&[0x2270_0000, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownStatus { status: 0x7, .. }));
    }

    #[test]
    fn midi2_program_change_bank() {
        let msg = Midi2ChannelVoice::decode(&[0x42C4_0001, 0x2A00_1344, 0, 0]).unwrap();
        assert_eq!(
            msg.message,
            Midi2Message::ProgramChange {
                program: 42,
                bank_valid: true,
                bank: 2500
            }
        );
    }

    #[test]
    fn midi2_note_on_attributes() {
        let msg = Midi2ChannelVoice::decode(&[0x4294_4003, 0x09C4_1234, 0, 0]).unwrap();
        assert_eq!(
            msg.message,
            Midi2Message::NoteOn {
                note: 64,
                velocity: 2500,
                attribute_type: 3,
                attribute_data: 0x1234
            }
        );
        let mut words = [0x4000_0000, 0, 0, 0];
        msg.encode(&mut words);
        assert_eq!(&words[..2], &[0x4294_4003, 0x09C4_1234]);
    }

    #[test]
    fn midi2_relative_controller_is_signed() {
        let msg = Midi2ChannelVoice::decode(&[0x4241_0203, 0xFFFF_FFFE, 0, 0]).unwrap();
        assert_eq!(
            msg.message,
            Midi2Message::RelativeRegisteredController {
                bank: 2,
                index: 3,
                delta: -2
            }
        );
    }

    #[test]
    fn midi1_out_of_range_note_is_rejected() {
        let msg = Midi1ChannelVoice::new(0, 0, Midi1Message::NoteOn { note: 200, velocity: 1 });
        assert_eq!(
            msg.validate(),
            Err(CodecError::InvalidField {
                field: "note",
                value: 200
            })
        );
        let msg = Midi1ChannelVoice::new(0, 0, Midi1Message::NoteOn { note: 72, velocity: 1 });
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn midi1_address_and_data_ranges() {
        let cc = Midi1Message::ControlChange {
            controller: 7,
            value: 100,
        };
        assert!(Midi1ChannelVoice::new(15, 15, cc).validate().is_ok());
        assert!(Midi1ChannelVoice::new(16, 0, cc).validate().is_err());
        assert!(Midi1ChannelVoice::new(0, 16, cc).validate().is_err());
        let loud = Midi1Message::ControlChange {
            controller: 7,
            value: 0x80,
        };
        assert!(Midi1ChannelVoice::new(0, 0, loud).validate().is_err());
        for (value, ok) in [(-8192, true), (8191, true), (-8193, false), (8192, false)] {
            let bend = Midi1ChannelVoice::new(0, 0, Midi1Message::PitchBend { value });
            assert_eq!(bend.validate().is_ok(), ok, "{value}");
        }
        assert!(Midi1ChannelVoice::from_midi1_bytes(16, &[0x90, 60, 100]).is_err());
    }

    #[test]
    fn midi2_out_of_range_fields_are_rejected() {
        let note_on = Midi2Message::NoteOn {
            note: 60,
            velocity: 0xFFFF,
            attribute_type: 0,
            attribute_data: 0,
        };
        assert!(Midi2ChannelVoice::new(0, 0, note_on).validate().is_ok());
        assert!(Midi2ChannelVoice::new(0, 16, note_on).validate().is_err());

        let high_note = Midi2Message::PerNotePitchBend {
            note: 128,
            value: 0,
        };
        assert!(Midi2ChannelVoice::new(0, 0, high_note).validate().is_err());
        let program = Midi2Message::ProgramChange {
            program: 1,
            bank_valid: true,
            bank: 0x4000,
        };
        assert_eq!(
            Midi2ChannelVoice::new(0, 0, program).validate(),
            Err(CodecError::InvalidField {
                field: "program bank",
                value: 0x4000
            })
        );
        let controller = Midi2Message::AssignableController {
            bank: 1,
            index: 0x80,
            data: 0,
        };
        assert!(Midi2ChannelVoice::new(0, 0, controller).validate().is_err());
    }
}
