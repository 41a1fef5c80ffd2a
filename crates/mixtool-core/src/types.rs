//! Common types shared between error and plan-output modules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::patch::Span;

// ============================================================================
// Location Type
// ============================================================================

/// Location in a source file.
///
/// The engine works in byte offsets (that is what the external symbol table
/// carries), so `byte_start`/`byte_end` are required. Hosts that hold file
/// content can attach 1-indexed line:column via [`Location::with_position`]
/// using the conversions in [`crate::text`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// File path (workspace-relative).
    pub file: String,
    /// Byte offset from file start (inclusive).
    pub byte_start: u64,
    /// Byte offset end (exclusive).
    pub byte_end: u64,
    /// Line number (1-indexed), when the host has file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Column number (1-indexed), when the host has file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
}

impl Location {
    /// Create a location from a file path and byte span.
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Location {
            file: file.into(),
            byte_start: span.start,
            byte_end: span.end,
            line: None,
            col: None,
        }
    }

    /// Attach 1-indexed line and column coordinates.
    pub fn with_position(mut self, line: u32, col: u32) -> Self {
        self.line = Some(line);
        self.col = Some(col);
        self
    }

    /// The byte span of this location.
    pub fn span(&self) -> Span {
        Span::new(self.byte_start, self.byte_end)
    }

    /// Comparison key for deterministic sorting: (file, byte_start, byte_end).
    fn sort_key(&self) -> (&str, u64, u64) {
        (&self.file, self.byte_start, self.byte_end)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.col) {
            (Some(line), Some(col)) => write!(f, "{}:{}:{}", self.file, line, col),
            _ => write!(f, "{}:[{}, {})", self.file, self.byte_start, self.byte_end),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
