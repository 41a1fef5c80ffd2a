//! Edit IR: spans, hash-verified edits, and conflict-checked edit sets.
//!
//! A rename plan is materialized as an [`EditSet`]: one [`Edit`] per source
//! span that changes. Edits carry a content hash of the bytes they replace,
//! so a host applying them against drifted file content fails loudly instead
//! of splicing text into the wrong place. Apply semantics are all-or-nothing
//! per file: any precondition failure leaves the content untouched.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Core Types
// ============================================================================

/// Stable file identifier within a symbol-graph snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID.
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Byte offsets into file content (snapshot-scoped).
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: u64,
    /// End byte offset (exclusive).
    pub end: u64,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Two spans overlap if they share any byte positions.
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains a byte offset.
    pub fn contains_offset(&self, offset: u64) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Edits
// ============================================================================

/// A single text replacement, anchored to an exact span with hash verification.
///
/// The edit only applies if the bytes at `span` hash to `expected_before_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// File the edit applies to.
    pub file_id: FileId,
    /// Byte range being replaced.
    pub span: Span,
    /// Replacement text.
    pub new_text: String,
    /// SHA-256 hash of the bytes in `span` before the edit.
    pub expected_before_hash: ContentHash,
}

impl Edit {
    /// Create an edit that replaces `old_text` at `span` with `new_text`.
    ///
    /// The precondition hash is computed from `old_text`; callers are
    /// expected to pass the exact bytes currently occupying `span`.
    pub fn replace(
        file_id: FileId,
        span: Span,
        old_text: &str,
        new_text: impl Into<String>,
    ) -> Self {
        Edit {
            file_id,
            span,
            new_text: new_text.into(),
            expected_before_hash: ContentHash::compute(old_text.as_bytes()),
        }
    }
}

/// A detected problem that prevents an edit set from applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conflict {
    /// Two edits have overlapping spans in the same file.
    OverlappingSpans {
        file_id: FileId,
        first: Span,
        second: Span,
    },
}

/// Errors that can occur when applying edits to content.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// An edit span extends beyond the content.
    #[error("edit span {span} out of bounds for content of {file_len} bytes")]
    SpanOutOfBounds { span: Span, file_len: u64 },

    /// The bytes at an edit span do not match the expected hash.
    #[error("content at {span} does not match expected hash (expected {expected}, got {actual})")]
    HashMismatch {
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },

    /// Two edits in the same file overlap.
    #[error("overlapping edits: {first} and {second}")]
    OverlappingEdits { first: Span, second: Span },
}

/// Result type for apply operations.
pub type ApplyResult<T> = Result<T, ApplyError>;

// ============================================================================
// Edit Sets
// ============================================================================

/// An ordered, deduplicated collection of edits forming one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    /// Create an empty edit set.
    pub fn new() -> Self {
        EditSet::default()
    }

    /// Insert an edit, folding exact duplicates.
    ///
    /// Returns `true` if the edit was added, `false` if an identical edit
    /// (same file, span, and replacement) was already present.
    pub fn insert(&mut self, edit: Edit) -> bool {
        let duplicate = self.edits.iter().any(|e| {
            e.file_id == edit.file_id && e.span == edit.span && e.new_text == edit.new_text
        });
        if duplicate {
            return false;
        }
        self.edits.push(edit);
        true
    }

    /// Number of edits in the set.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Iterate over the edits in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter()
    }

    /// Detect overlapping spans within each file.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut by_file: HashMap<FileId, Vec<&Edit>> = HashMap::new();
        for edit in &self.edits {
            by_file.entry(edit.file_id).or_default().push(edit);
        }

        let mut conflicts = Vec::new();
        let mut file_ids: Vec<FileId> = by_file.keys().copied().collect();
        file_ids.sort();
        for file_id in file_ids {
            let mut edits = by_file.remove(&file_id).unwrap_or_default();
            edits.sort_by_key(|e| (e.span.start, e.span.end));
            for pair in edits.windows(2) {
                if pair[0].span.overlaps(&pair[1].span) {
                    conflicts.push(Conflict::OverlappingSpans {
                        file_id,
                        first: pair[0].span,
                        second: pair[1].span,
                    });
                }
            }
        }
        conflicts
    }

    /// Consume the set, returning edits in deterministic order.
    ///
    /// Order is `(file_id, span.start, span.end)`, so identical inputs always
    /// produce identical plan output.
    pub fn into_sorted(mut self) -> Vec<Edit> {
        self.edits
            .sort_by(|a, b| (a.file_id, a.span.start, a.span.end).cmp(&(b.file_id, b.span.start, b.span.end)));
        self.edits
    }

    /// Apply this set's edits for one file to `content`, returning new content.
    ///
    /// All-or-nothing: every span must be in bounds, on a char boundary, and
    /// hash to its expected value, and no two spans may overlap; otherwise an
    /// error is returned and no partial result is produced.
    pub fn apply_to(&self, file_id: FileId, content: &str) -> ApplyResult<String> {
        let mut edits: Vec<&Edit> = self.edits.iter().filter(|e| e.file_id == file_id).collect();
        edits.sort_by_key(|e| (e.span.start, e.span.end));

        for pair in edits.windows(2) {
            if pair[0].span.overlaps(&pair[1].span) {
                return Err(ApplyError::OverlappingEdits {
                    first: pair[0].span,
                    second: pair[1].span,
                });
            }
        }

        // Verify all preconditions before splicing anything.
        for edit in &edits {
            let slice = content
                .get(edit.span.start as usize..edit.span.end as usize)
                .ok_or(ApplyError::SpanOutOfBounds {
                    span: edit.span,
                    file_len: content.len() as u64,
                })?;
            let actual = ContentHash::compute(slice.as_bytes());
            if actual != edit.expected_before_hash {
                return Err(ApplyError::HashMismatch {
                    span: edit.span,
                    expected: edit.expected_before_hash.clone(),
                    actual,
                });
            }
        }

        let mut result = content.to_string();
        for edit in edits.iter().rev() {
            result.replace_range(edit.span.start as usize..edit.span.end as usize, &edit.new_text);
        }
        debug!(%file_id, edits = edits.len(), "applied edit set");
        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================
