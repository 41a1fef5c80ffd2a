//! Target selection by file path and byte offset.
//!
//! Hosts hand the engine a path and a byte offset (the editor cursor);
//! lookup maps that to the declaration the rename should target. An offset
//! on a declaration's name is that declaration; an offset on a call site's
//! name is whatever the call binds to.

use thiserror::Error;
use tracing::debug;

use mixtool_core::patch::Span;

use crate::graph::{DeclId, SymbolGraph};
use crate::resolve::{resolve_call, Resolution};

/// How far (in bytes) to search for a nearby symbol when reporting a miss.
const NEAREST_SYMBOL_RADIUS: u64 = 10;

/// Errors that can occur when looking up a rename target.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The path is not in the graph's file registry.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// No declaration or call-site name span contains the offset.
    #[error("no symbol found at {file} offset {offset}")]
    SymbolNotFound {
        file: String,
        offset: u64,
        /// A symbol name and its span within `NEAREST_SYMBOL_RADIUS` bytes
        /// of the offset, if one exists.
        nearest_symbol: Option<(String, Span)>,
    },

    /// The offset names a call site whose dispatch is ambiguous.
    #[error("call to '{method}' is ambiguous, candidates: {}", candidates.join(", "))]
    AmbiguousCallSite {
        method: String,
        candidates: Vec<String>,
    },

    /// The offset names a call site that does not resolve.
    #[error("call to '{method}' at {file} offset {offset} does not resolve")]
    UnresolvedCallSite {
        method: String,
        file: String,
        offset: u64,
    },
}

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Find the declaration targeted by a file path + byte offset.
pub fn find_target_at(graph: &SymbolGraph, path: &str, offset: u64) -> LookupResult<DeclId> {
    let file = graph
        .file_by_path(path)
        .ok_or_else(|| LookupError::FileNotFound {
            path: path.to_string(),
        })?;
    let file_id = file.file_id;
    let file_path = file.path.clone();

    for decl in graph.declarations() {
        if decl.file_id == file_id && decl.name_span.contains_offset(offset) {
            debug!(decl = %decl.decl_id, "target is a declaration");
            return Ok(decl.decl_id);
        }
    }

    for call in graph.call_sites() {
        if call.file_id != file_id || !call.name_span.contains_offset(offset) {
            continue;
        }
        return match resolve_call(graph, call) {
            Resolution::Bound(decl) => {
                debug!(call = %call.call_id, decl = %decl, "target via call site");
                Ok(decl)
            }
            Resolution::Ambiguous(candidates) => Err(LookupError::AmbiguousCallSite {
                method: call.method.clone(),
                candidates: candidates
                    .iter()
                    .map(|&d| graph.qualified_name(d))
                    .collect(),
            }),
            Resolution::Unresolved => Err(LookupError::UnresolvedCallSite {
                method: call.method.clone(),
                file: file_path,
                offset,
            }),
        };
    }

    Err(LookupError::SymbolNotFound {
        file: file_path,
        offset,
        nearest_symbol: nearest_symbol(graph, file_id, offset),
    })
}

/// Find the closest symbol name span within the search radius.
fn nearest_symbol(
    graph: &SymbolGraph,
    file_id: mixtool_core::patch::FileId,
    offset: u64,
) -> Option<(String, Span)> {
    let mut best: Option<(u64, String, Span)> = None;
    let spans = graph
        .declarations()
        .filter(|d| d.file_id == file_id)
        .map(|d| (d.name.clone(), d.name_span))
        .chain(
            graph
                .call_sites()
                .filter(|c| c.file_id == file_id)
                .map(|c| (c.method.clone(), c.name_span)),
        );
    for (name, span) in spans {
        let distance = if offset < span.start {
            span.start - offset
        } else if offset >= span.end {
            offset - span.end + 1
        } else {
            0
        };
        if distance > NEAREST_SYMBOL_RADIUS {
            continue;
        }
        if best.as_ref().map(|(d, _, _)| distance < *d).unwrap_or(true) {
            best = Some((distance, name, span));
        }
    }
    best.map(|(_, name, span)| (name, span))
}
