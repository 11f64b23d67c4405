//! Utility messages (message type 0x0)

use super::types::{bits, check_width};
use super::{CodecError, MessageType, Result};

const NOOP: u8 = 0x0;
const JR_CLOCK: u8 = 0x1;
const JR_TIMESTAMP: u8 = 0x2;
const DELTA_CLOCKSTAMP_TPQ: u8 = 0x3;
const DELTA_CLOCKSTAMP: u8 = 0x4;

/// Mask of the 20-bit timestamp/tick fields.
const TICKS_MASK: u32 = 0x000F_FFFF;

/// Utility message. Status lives in word 0 bits 23..20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Utility {
    /// No operation
    NoOp,
    /// Jitter reduction clock
    JrClock {
        /// Sender clock time (20 bits)
        timestamp: u32,
    },
    /// Jitter reduction timestamp
    JrTimestamp {
        /// Sender clock time (20 bits)
        timestamp: u32,
    },
    /// Delta clockstamp ticks per quarter note
    DeltaClockstampTpq {
        /// Ticks per quarter note
        ticks_per_quarter: u16,
    },
    /// Ticks since the last event
    DeltaClockstamp {
        /// Tick count (20 bits)
        ticks: u32,
    },
}

impl Utility {
    /// Status nibble for this message
    #[must_use]
    pub const fn status(&self) -> u8 {
        match self {
            Self::NoOp => NOOP,
            Self::JrClock { .. } => JR_CLOCK,
            Self::JrTimestamp { .. } => JR_TIMESTAMP,
            Self::DeltaClockstampTpq { .. } => DELTA_CLOCKSTAMP_TPQ,
            Self::DeltaClockstamp { .. } => DELTA_CLOCKSTAMP,
        }
    }

    pub(crate) fn decode(words: &[u32; 4]) -> Result<Self> {
        let word = words[0];
        let status = bits(word, 20, 4) as u8;
        match status {
            NOOP => Ok(Self::NoOp),
            JR_CLOCK => Ok(Self::JrClock {
                timestamp: word & TICKS_MASK,
            }),
            JR_TIMESTAMP => Ok(Self::JrTimestamp {
                timestamp: word & TICKS_MASK,
            }),
            DELTA_CLOCKSTAMP_TPQ => Ok(Self::DeltaClockstampTpq {
                ticks_per_quarter: (word & 0xFFFF) as u16,
            }),
            DELTA_CLOCKSTAMP => Ok(Self::DeltaClockstamp {
                ticks: word & TICKS_MASK,
            }),
            _ => Err(CodecError::UnknownStatus {
                message_type: MessageType::Utility,
                status: u16::from(status),
            }),
        }
    }

    /// Check that the tick fields fit in 20 bits.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::JrClock { timestamp } | Self::JrTimestamp { timestamp } => {
                check_width("timestamp", timestamp, 20)
            }
            Self::DeltaClockstamp { ticks } => check_width("delta ticks", ticks, 20),
            Self::NoOp | Self::DeltaClockstampTpq { .. } => Ok(()),
        }
    }

    pub(crate) fn encode(&self, words: &mut [u32; 4]) {
        let payload = match *self {
            Self::NoOp => 0,
            Self::JrClock { timestamp } | Self::JrTimestamp { timestamp } => {
                timestamp & TICKS_MASK
            }
            Self::DeltaClockstampTpq { ticks_per_quarter } => u32::from(ticks_per_quarter),
            Self::DeltaClockstamp { ticks } => ticks & TICKS_MASK,
        };
        words[0] |= (u32::from(self.status()) << 20) | payload;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_fields_are_twenty_bits() {
        let msg = Utility::DeltaClockstamp { ticks: 0x000F_FFFF };
        assert!(msg.validate().is_ok());
        let mut words = [0; 4];
        msg.encode(&mut words);
        assert_eq!(Utility::decode(&words).unwrap(), msg);

        let err = Utility::JrTimestamp { timestamp: 0x0010_0000 }
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidField {
                field: "timestamp",
                value: 0x0010_0000
            }
        );
        assert!(Utility::DeltaClockstamp { ticks: u32::MAX }.validate().is_err());
    }
}
