//! System real time and system common messages (message type 0x1)

use super::types::{bits, byte7, check_width};
use super::{CodecError, Result};

const MIDI_TIME_CODE: u8 = 0xF1;
const SONG_POSITION_POINTER: u8 = 0xF2;
const SONG_SELECT: u8 = 0xF3;
const TUNE_REQUEST: u8 = 0xF6;
const TIMING_CLOCK: u8 = 0xF8;
const START: u8 = 0xFA;
const CONTINUE: u8 = 0xFB;
const STOP: u8 = 0xFC;
const ACTIVE_SENSING: u8 = 0xFE;
const RESET: u8 = 0xFF;

const fn has_dedicated_kind(status: u8) -> bool {
    matches!(
        status,
        MIDI_TIME_CODE
            | SONG_POSITION_POINTER
            | SONG_SELECT
            | TUNE_REQUEST
            | TIMING_CLOCK
            | START
            | CONTINUE
            | STOP
            | ACTIVE_SENSING
            | RESET
    )
}

/// Piece of the time code carried by a quarter frame message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TimeCodeUnit {
    /// Frame count, low nibble
    FrameLow = 0,
    /// Frame count, high nibble
    FrameHigh = 1,
    /// Seconds, low nibble
    SecondsLow = 2,
    /// Seconds, high nibble
    SecondsHigh = 3,
    /// Minutes, low nibble
    MinutesLow = 4,
    /// Minutes, high nibble
    MinutesHigh = 5,
    /// Hours, low nibble
    HoursLow = 6,
    /// Frame rate and hours, high nibble
    RateAndHoursHigh = 7,
}

impl TimeCodeUnit {
    const fn from_bits(value: u32) -> Self {
        match value & 0x7 {
            0 => Self::FrameLow,
            1 => Self::FrameHigh,
            2 => Self::SecondsLow,
            3 => Self::SecondsHigh,
            4 => Self::MinutesLow,
            5 => Self::MinutesHigh,
            6 => Self::HoursLow,
            _ => Self::RateAndHoursHigh,
        }
    }
}

/// Concrete system message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SystemKind {
    /// MIDI time code quarter frame
    TimeCode {
        /// Which nibble of the time code this frame carries
        unit: TimeCodeUnit,
        /// Nibble value
        value: u8,
    },
    /// Song position pointer, in MIDI beats
    SongPosition {
        /// 14-bit position
        position: u16,
    },
    /// Song select
    SongSelect {
        /// 7-bit song number
        song: u8,
    },
    /// Tune request
    TuneRequest,
    /// Timing clock
    TimingClock,
    /// Start
    Start,
    /// Continue
    Continue,
    /// Stop
    Stop,
    /// Active sensing
    ActiveSensing,
    /// Reset
    Reset,
    /// Any other status, kept verbatim
    Other {
        /// Status byte
        status: u8,
        /// The two data bytes, word 0 bits 15..0
        data: [u8; 2],
    },
}

/// System message with its group.
///
/// Status lives in word 0 bits 23..16. Statuses without a dedicated kind
/// decode to [`SystemKind::Other`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemRealTime {
    /// UMP group (0..=15)
    pub group: u8,
    /// Concrete message
    pub kind: SystemKind,
}

impl SystemRealTime {
    /// Create a message on the given group
    #[must_use]
    pub const fn new(group: u8, kind: SystemKind) -> Self {
        Self { group, kind }
    }

    /// Status byte for this message
    #[must_use]
    pub const fn status(&self) -> u8 {
        match self.kind {
            SystemKind::TimeCode { .. } => MIDI_TIME_CODE,
            SystemKind::SongPosition { .. } => SONG_POSITION_POINTER,
            SystemKind::SongSelect { .. } => SONG_SELECT,
            SystemKind::TuneRequest => TUNE_REQUEST,
            SystemKind::TimingClock => TIMING_CLOCK,
            SystemKind::Start => START,
            SystemKind::Continue => CONTINUE,
            SystemKind::Stop => STOP,
            SystemKind::ActiveSensing => ACTIVE_SENSING,
            SystemKind::Reset => RESET,
            SystemKind::Other { status, .. } => status,
        }
    }

    // Infallible: unknown statuses become `Other`.
    #[allow(clippy::unnecessary_wraps)]
    pub(crate) fn decode(words: &[u32; 4]) -> Result<Self> {
        let word = words[0];
        let group = bits(word, 24, 4) as u8;
        let status = bits(word, 16, 8) as u8;
        let kind = match status {
            MIDI_TIME_CODE => SystemKind::TimeCode {
                unit: TimeCodeUnit::from_bits(bits(word, 12, 3)),
                value: bits(word, 8, 4) as u8,
            },
            SONG_POSITION_POINTER => SystemKind::SongPosition {
                position: (u16::from(byte7(word, 0)) << 7) | u16::from(byte7(word, 8)),
            },
            SONG_SELECT => SystemKind::SongSelect {
                song: byte7(word, 8),
            },
            TUNE_REQUEST => SystemKind::TuneRequest,
            TIMING_CLOCK => SystemKind::TimingClock,
            START => SystemKind::Start,
            CONTINUE => SystemKind::Continue,
            STOP => SystemKind::Stop,
            ACTIVE_SENSING => SystemKind::ActiveSensing,
            RESET => SystemKind::Reset,
            _ => SystemKind::Other {
                status,
                data: [bits(word, 8, 8) as u8, bits(word, 0, 8) as u8],
            },
        };
        Ok(Self { group, kind })
    }

    /// Check the group and the data fields against their wire widths.
    pub fn validate(&self) -> Result<()> {
        check_width("group", self.group, 4)?;
        match self.kind {
            SystemKind::TimeCode { value, .. } => check_width("time code value", value, 4),
            SystemKind::SongPosition { position } => check_width("song position", position, 14),
            SystemKind::SongSelect { song } => check_width("song", song, 7),
            SystemKind::Other { status, .. } if has_dedicated_kind(status) => {
                Err(CodecError::InvalidField {
                    field: "system status",
                    value: u32::from(status),
                })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn encode(&self, words: &mut [u32; 4]) {
        let data = match self.kind {
            SystemKind::TimeCode { unit, value } => {
                ((u32::from(unit as u8) & 0x7) << 12) | ((u32::from(value) & 0xF) << 8)
            }
            SystemKind::SongPosition { position } => {
                let position = u32::from(position);
                ((position & 0x7F) << 8) | ((position >> 7) & 0x7F)
            }
            SystemKind::SongSelect { song } => (u32::from(song) & 0x7F) << 8,
            SystemKind::Other { data, .. } => (u32::from(data[0]) << 8) | u32::from(data[1]),
            _ => 0,
        };
        words[0] |= ((u32::from(self.group) & 0xF) << 24) | (u32::from(self.status()) << 16) | data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_word(word: u32) -> SystemRealTime {
        SystemRealTime::decode(&[word, 0, 0, 0]).unwrap()
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let msg = decode_word(0x13F4_1234);
        assert_eq!(msg.group, 3);
        assert_eq!(
            msg.kind,
            SystemKind::Other {
                status: 0xF4,
                data: [0x12, 0x34]
            }
        );
        let mut words = [0x1000_0000, 0, 0, 0];
        msg.encode(&mut words);
        assert_eq!(words[0], 0x13F4_1234);
    }

    #[test]
    fn timing_clock_has_no_payload() {
        assert_eq!(decode_word(0x10F8_0000).kind, SystemKind::TimingClock);
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let ok = SystemRealTime::new(15, SystemKind::SongPosition { position: 0x3FFF });
        assert!(ok.validate().is_ok());
        assert!(SystemRealTime::new(16, SystemKind::Start).validate().is_err());
        assert!(
            SystemRealTime::new(0, SystemKind::SongPosition { position: 0x4000 })
                .validate()
                .is_err()
        );
        assert!(SystemRealTime::new(0, SystemKind::SongSelect { song: 128 }).validate().is_err());
        let frame = SystemKind::TimeCode {
            unit: TimeCodeUnit::SecondsHigh,
            value: 0x10,
        };
        assert!(SystemRealTime::new(0, frame).validate().is_err());

        let shadowed = SystemKind::Other {
            status: TIMING_CLOCK,
            data: [0, 0],
        };
        assert!(SystemRealTime::new(0, shadowed).validate().is_err());
    }
}
