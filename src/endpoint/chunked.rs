//! Reassembly of text fields that arrive split over several packets.

use std::borrow::Cow;
use std::fmt;

use crate::ump::Form;

/// A text field assembled from form-tagged chunks.
///
/// `Complete` and `Start` chunks reset the field; `Continue` and `End`
/// append. The field only becomes [`Complete`](Self::Complete) once a
/// `Complete` or `End` chunk has been applied. Bytes are kept raw until
/// then, so a multi-byte character split between chunks survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChunkedField {
    /// Nothing received yet
    #[default]
    Empty,
    /// Chunks received but not the last one
    InProgress(Vec<u8>),
    /// Fully assembled
    Complete(String),
}

impl ChunkedField {
    /// Apply one chunk.
    ///
    /// A `Continue` or `End` chunk with no preceding `Start` is dropped.
    pub fn apply(&mut self, form: Form, chunk: &[u8]) {
        let mut buf = match std::mem::take(self) {
            _ if form.is_starting() => Vec::new(),
            Self::Empty => return,
            Self::InProgress(buf) => buf,
            Self::Complete(text) => text.into_bytes(),
        };
        buf.extend_from_slice(chunk);
        *self = if form.is_ending() {
            Self::Complete(String::from_utf8_lossy(&buf).into_owned())
        } else {
            Self::InProgress(buf)
        };
    }

    /// Whether the last chunk has been applied
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// The assembled text, only once complete
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Complete(text) => Some(text),
            _ => None,
        }
    }

    /// Whatever has been received so far, complete or not
    #[must_use]
    pub fn partial(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Empty => None,
            Self::InProgress(buf) => Some(String::from_utf8_lossy(buf)),
            Self::Complete(text) => Some(Cow::Borrowed(text)),
        }
    }
}

impl fmt::Display for ChunkedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::InProgress(buf) => write!(f, "{}...", String::from_utf8_lossy(buf)),
            Self::Complete(text) => f.write_str(text),
        }
    }
}
