//! Text position utilities for byte offset and line:column conversions.
//!
//! The engine plans edits in byte offsets; editor hosts usually speak
//! 1-indexed line:column. These helpers convert between the two for
//! Unicode text.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Line/column values of 0 are clamped to 1

use crate::patch::Span;

/// Convert a byte offset to 1-indexed line and column (Unicode-aware).
///
/// Columns count Unicode scalar values (chars), not bytes.
///
/// # Returns
///
/// A `(line, col)` tuple where both are 1-indexed. If `offset` exceeds
/// content length, returns the position at end of content.
pub fn byte_offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    let mut current_offset = 0usize;

    for ch in content.chars() {
        if current_offset >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, col)
}

/// Convert 1-indexed line and column to byte offset (Unicode-aware).
///
/// Columns count Unicode scalar values (chars), not bytes. A column beyond
/// the end of its line clamps to the line end; a line beyond the content
/// clamps to the content length.
pub fn position_to_byte_offset(content: &str, line: u32, col: u32) -> usize {
    let line = line.max(1);
    let col = col.max(1);

    let mut current_line = 1u32;

    for (i, ch) in content.char_indices() {
        if current_line == line {
            let mut current_col = 1u32;
            for (j, c) in content[i..].char_indices() {
                if current_col == col {
                    return i + j;
                }
                if c == '\n' {
                    break;
                }
                current_col += 1;
            }
            let line_end = content[i..]
                .find('\n')
                .map(|p| i + p)
                .unwrap_or(content.len());
            return line_end;
        }
        if ch == '\n' {
            current_line += 1;
        }
    }

    content.len()
}

/// Extract the text content of a span as a string.
///
/// Returns `None` if the span extends beyond content bounds or splits a
/// UTF-8 character.
pub fn extract_span<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    content.get(span.start as usize..span.end as usize)
}

/// Get the line range spanned by a byte span.
///
/// Returns `(start_line, end_line)`, both 1-indexed.
pub fn span_to_line_range(content: &str, span: &Span) -> (u32, u32) {
    let (start_line, _) = byte_offset_to_position(content, span.start as usize);
    let last = span.end.saturating_sub(1).max(span.start);
    let (end_line, _) = byte_offset_to_position(content, last as usize);
    (start_line, end_line)
}

// ============================================================================
// Tests
// ============================================================================
