//! Function block descriptors as seen by a discovering client.

use std::fmt;
use std::ops::Range;

use super::chunked::ChunkedField;
use crate::ump::{FunctionBlockInfo, Midi1Mode};

/// Number of UMP groups on an endpoint.
const GROUPS: u8 = 16;

/// A function block: a set of UMP groups with a common role.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionBlock {
    /// Block id
    pub id: u8,
    /// Whether the block is currently active
    pub active: bool,
    /// Accepts input
    pub is_input: bool,
    /// Produces output
    pub is_output: bool,
    /// UI hint: primarily a sender
    pub ui_hint_sender: bool,
    /// UI hint: primarily a receiver
    pub ui_hint_receiver: bool,
    /// MIDI 1.0 compatibility
    pub midi1: Midi1Mode,
    /// First group covered (0-based)
    pub first_group: u8,
    /// Number of groups covered
    pub group_count: u8,
    /// Block name, possibly still being reassembled
    pub name: ChunkedField,
}

impl FunctionBlock {
    /// Build a descriptor from an info notification; the name starts empty.
    #[must_use]
    pub fn from_info(info: &FunctionBlockInfo) -> Self {
        let mut block = Self {
            id: info.id,
            active: false,
            is_input: false,
            is_output: false,
            ui_hint_sender: false,
            ui_hint_receiver: false,
            midi1: Midi1Mode::NotMidi1,
            first_group: 0,
            group_count: 0,
            name: ChunkedField::Empty,
        };
        block.update(info);
        block
    }

    /// Refresh the structural fields, keeping the name
    pub fn update(&mut self, info: &FunctionBlockInfo) {
        self.id = info.id;
        self.active = info.active;
        self.is_input = info.is_input;
        self.is_output = info.is_output;
        self.ui_hint_sender = info.ui_hint_sender;
        self.ui_hint_receiver = info.ui_hint_receiver;
        self.midi1 = info.midi1;
        self.first_group = info.first_group;
        self.group_count = info.group_count;
    }

    /// Groups covered, clipped to the 16 groups of an endpoint
    #[must_use]
    pub fn groups(&self) -> Range<u8> {
        let start = self.first_group.min(GROUPS);
        start..self.first_group.saturating_add(self.group_count).min(GROUPS)
    }

    /// Whether `group` belongs to this block
    #[must_use]
    pub fn covers_group(&self, group: u8) -> bool {
        self.groups().contains(&group)
    }

    fn direction(&self) -> &'static str {
        match (self.is_input, self.is_output) {
            (true, true) => "io",
            (true, false) => "i-",
            (false, true) => "-o",
            (false, false) => "--",
        }
    }

    fn role(&self) -> &'static str {
        match (self.ui_hint_receiver, self.ui_hint_sender) {
            (true, true) => "Recv/Send",
            (false, true) => "     Send",
            (true, false) => "Recv     ",
            (false, false) => "---------",
        }
    }

    fn limitation(&self) -> &'static str {
        match self.midi1 {
            Midi1Mode::NotMidi1 => "[MIDI1 + MIDI2]",
            Midi1Mode::Midi1 => "[MIDI1 only]",
            Midi1Mode::Midi1Restricted => "[MIDI1 31.25kb/s]",
        }
    }
}

impl fmt::Display for FunctionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block #{} [{} : {}] ", self.id, self.direction(), self.role())?;
        match self.name.partial() {
            Some(name) => write!(f, "'{name}'")?,
            None => f.write_str("'<Function Block>'")?,
        }
        let groups = self.groups();
        if groups.is_empty() {
            f.write_str(" UMP groups none")?;
        } else {
            write!(f, " UMP groups {}..={}", groups.start, groups.end - 1)?;
        }
        write!(f, " {}", self.limitation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ump::Form;

    fn info() -> FunctionBlockInfo {
        FunctionBlockInfo {
            active: true,
            id: 1,
            ui_hint_sender: true,
            ui_hint_receiver: true,
            midi1: Midi1Mode::NotMidi1,
            is_output: true,
            is_input: true,
            first_group: 1,
            group_count: 2,
            midi_ci_version: 1,
            max_sysex8_streams: 0,
        }
    }

    #[test]
    fn summary_line() {
        let mut block = FunctionBlock::from_info(&info());
        block.name.apply(Form::Complete, b"Keys");
        assert_eq!(
            block.to_string(),
            "Block #1 [io : Recv/Send] 'Keys' UMP groups 1..=2 [MIDI1 + MIDI2]"
        );
    }

    #[test]
    fn unnamed_midi1_block() {
        let block = FunctionBlock::from_info(&FunctionBlockInfo {
            is_output: false,
            ui_hint_sender: false,
            midi1: Midi1Mode::Midi1Restricted,
            ..info()
        });
        assert_eq!(
            block.to_string(),
            "Block #1 [i- : Recv     ] '<Function Block>' UMP groups 1..=2 [MIDI1 31.25kb/s]"
        );
    }

    #[test]
    fn groups_clip_to_endpoint() {
        let block = FunctionBlock::from_info(&FunctionBlockInfo {
            first_group: 14,
            group_count: 8,
            ..info()
        });
        assert_eq!(block.groups(), 14..16);
        assert!(block.covers_group(15));
        assert!(!block.covers_group(1));
    }

    #[test]
    fn update_keeps_name() {
        let mut block = FunctionBlock::from_info(&info());
        block.name.apply(Form::Complete, b"Pads");
        block.update(&FunctionBlockInfo { active: false, ..info() });
        assert!(!block.active);
        assert_eq!(block.name.as_str(), Some("Pads"));
    }
}
