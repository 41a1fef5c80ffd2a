//! Rename planning.
//!
//! A rename starts from one target declaration and produces a
//! [`RenamePlan`]: the set of name-span edits that keeps dispatch behavior
//! identical under the new name. The closure of a target is every
//! declaration that dispatch can conflate with it: same name, overlapping
//! arity, owner reachable through the MRO of some container that also
//! reaches the target's owner. Same-named methods in unrelated containers
//! and non-overlapping overloads stay untouched.
//!
//! The planner reads the immutable graph and never writes files; applying
//! the edits is the host's job (see `mixtool_core::patch`).

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use mixtool_core::error::MixError;
use mixtool_core::patch::{Edit, EditSet, FileId, Span};
use mixtool_core::types::Location;

use crate::graph::{Arity, DeclId, SymbolGraph};
use crate::lookup::{find_target_at, LookupError};
use crate::resolve::{resolve_call, Resolution};
use crate::validation::{validate_method_name, ValidationError};

/// Schema version for serialized plans.
pub const PLAN_SCHEMA_VERSION: u32 = 1;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while planning a rename.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The proposed name is not a valid method name.
    #[error(transparent)]
    InvalidName(#[from] ValidationError),

    /// The proposed name is the target's current name.
    #[error("new name '{name}' is the same as the current name")]
    SameName { name: String },

    /// Target lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The target declaration ID is not in the graph.
    #[error("declaration not found: {decl}")]
    DeclarationNotFound { decl: DeclId },

    /// A call on the old name could dispatch to the target or to an
    /// unrelated declaration; renaming would silently change behavior.
    #[error("rename of '{method}' is ambiguous at {location}, candidates: {}", candidates.join(", "))]
    AmbiguousRename {
        method: String,
        location: Location,
        candidates: Vec<String>,
    },

    /// Internal planner invariant violated.
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Result type for rename operations.
pub type RenameResult<T> = Result<T, RenameError>;

impl From<RenameError> for MixError {
    fn from(err: RenameError) -> Self {
        match err {
            RenameError::InvalidName(ValidationError::InvalidName { name, reason }) => {
                MixError::InvalidIdentifier { name, reason }
            }
            RenameError::SameName { name } => {
                MixError::invalid_args(format!("new name '{name}' is the same as the current name"))
            }
            RenameError::Lookup(LookupError::FileNotFound { path }) => {
                MixError::FileNotFound { path }
            }
            RenameError::Lookup(LookupError::SymbolNotFound { file, offset, .. }) => {
                MixError::symbol_not_found(file, offset)
            }
            RenameError::Lookup(LookupError::AmbiguousCallSite { method, candidates }) => {
                MixError::AmbiguousRename { method, candidates }
            }
            RenameError::Lookup(LookupError::UnresolvedCallSite { method, file, offset }) => {
                MixError::invalid_args(format!(
                    "call to '{method}' at {file} offset {offset} does not resolve to a declaration"
                ))
            }
            RenameError::AmbiguousRename {
                method, candidates, ..
            } => MixError::AmbiguousRename { method, candidates },
            RenameError::DeclarationNotFound { decl } => {
                MixError::internal(format!("declaration not found: {decl}"))
            }
            RenameError::Internal { message } => MixError::Internal { message },
        }
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// Warning codes for non-blocking rename findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenameWarningCode {
    /// W001: a call on the old name could not be resolved and is left
    /// untouched.
    #[serde(rename = "W001")]
    UnresolvedCallSite,
    /// W002: the new name already exists somewhere in a lookup chain that
    /// reaches the renamed declarations.
    #[serde(rename = "W002")]
    NameCollision,
}

impl fmt::Display for RenameWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameWarningCode::UnresolvedCallSite => write!(f, "W001"),
            RenameWarningCode::NameCollision => write!(f, "W002"),
        }
    }
}

/// A non-blocking finding attached to a plan.
#[derive(Debug, Clone, Serialize)]
pub struct RenameWarning {
    /// Warning code.
    pub code: RenameWarningCode,
    /// Human-readable message.
    pub message: String,
    /// Where the finding points, when it has a location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

// ============================================================================
// Plan Output
// ============================================================================

/// A declaration the plan renames.
#[derive(Debug, Clone, Serialize)]
pub struct DeclInfo {
    /// Declaration ID, rendered (`decl_3`).
    pub id: String,
    /// Owning container name.
    pub container: String,
    /// Current method name.
    pub name: String,
    /// Declared arity.
    pub arity: Arity,
    /// Name-span location.
    pub location: Location,
}

/// A call site the plan rewrites.
#[derive(Debug, Clone, Serialize)]
pub struct CallSiteInfo {
    /// Call site ID, rendered (`call_2`).
    pub id: String,
    /// Invoked method name.
    pub method: String,
    /// Name-span location.
    pub location: Location,
}

/// Aggregate counts for a plan.
#[derive(Debug, Clone, Serialize)]
pub struct RenameSummary {
    pub files_changed: usize,
    pub edits_count: usize,
    pub declarations_renamed: usize,
    pub call_sites_rewritten: usize,
}

/// The output of rename planning: edits plus the facts behind them.
#[derive(Debug, Clone, Serialize)]
pub struct RenamePlan {
    /// Always `"planned"`; the planner never applies.
    pub status: String,
    /// Plan schema version.
    pub schema_version: u32,
    /// Rendered target declaration (`Container#method`).
    pub target: String,
    /// The new name.
    pub new_name: String,
    /// Declarations renamed, in graph order.
    pub renamed: Vec<DeclInfo>,
    /// Call sites rewritten, in graph order.
    pub call_sites: Vec<CallSiteInfo>,
    /// Deduplicated edits in deterministic (file, span) order.
    pub edits: Vec<Edit>,
    /// Aggregate counts.
    pub summary: RenameSummary,
    /// Non-blocking findings.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RenameWarning>,
}

// ============================================================================
// Planning
// ============================================================================

/// Plan a rename of `target` to `new_name`.
pub fn plan_rename(
    graph: &SymbolGraph,
    target: DeclId,
    new_name: &str,
) -> RenameResult<RenamePlan> {
    validate_method_name(new_name)?;

    let target_decl = graph
        .declaration(target)
        .ok_or(RenameError::DeclarationNotFound { decl: target })?;
    if target_decl.name == new_name {
        return Err(RenameError::SameName {
            name: new_name.to_string(),
        });
    }

    let closure = rename_closure(graph, target);
    debug!(decl = %graph.qualified_name(target), closure = closure.len(), "computed rename closure");

    let mut edits = EditSet::new();
    let mut warnings = Vec::new();
    let mut renamed = Vec::new();
    let mut rewritten = Vec::new();

    for &decl_id in &closure {
        let decl = graph
            .declaration(decl_id)
            .ok_or(RenameError::DeclarationNotFound { decl: decl_id })?;
        edits.insert(Edit::replace(
            decl.file_id,
            decl.name_span,
            &decl.name,
            new_name,
        ));
        renamed.push(DeclInfo {
            id: decl_id.to_string(),
            container: graph
                .container(decl.owner)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            name: decl.name.clone(),
            arity: decl.arity,
            location: location_of(graph, decl.file_id, decl.name_span),
        });
    }

    let closure_set: HashSet<DeclId> = closure.iter().copied().collect();
    for call in graph.call_sites() {
        if call.method != target_decl.name {
            continue;
        }
        match resolve_call(graph, call) {
            Resolution::Bound(decl) if closure_set.contains(&decl) => {
                edits.insert(Edit::replace(
                    call.file_id,
                    call.name_span,
                    &call.method,
                    new_name,
                ));
                rewritten.push(CallSiteInfo {
                    id: call.call_id.to_string(),
                    method: call.method.clone(),
                    location: location_of(graph, call.file_id, call.name_span),
                });
            }
            // Bound to a declaration outside the closure: a different
            // dispatch target that happens to share the name.
            Resolution::Bound(_) => {}
            Resolution::Ambiguous(candidates) => {
                if candidates.iter().any(|d| closure_set.contains(d)) {
                    return Err(RenameError::AmbiguousRename {
                        method: call.method.clone(),
                        location: location_of(graph, call.file_id, call.name_span),
                        candidates: candidates
                            .iter()
                            .map(|&d| graph.qualified_name(d))
                            .collect(),
                    });
                }
            }
            Resolution::Unresolved => {
                warnings.push(RenameWarning {
                    code: RenameWarningCode::UnresolvedCallSite,
                    message: format!(
                        "call to '{}' does not resolve and is left untouched",
                        call.method
                    ),
                    location: Some(location_of(graph, call.file_id, call.name_span)),
                });
            }
        }
    }

    collect_collisions(graph, &closure, target_decl.arity, new_name, &mut warnings);

    let conflicts = edits.conflicts();
    if !conflicts.is_empty() {
        return Err(RenameError::Internal {
            message: format!("planned edits overlap: {} conflict(s)", conflicts.len()),
        });
    }

    let sorted = edits.into_sorted();
    let files_changed: HashSet<FileId> = sorted.iter().map(|e| e.file_id).collect();
    let summary = RenameSummary {
        files_changed: files_changed.len(),
        edits_count: sorted.len(),
        declarations_renamed: renamed.len(),
        call_sites_rewritten: rewritten.len(),
    };
    debug!(
        edits = summary.edits_count,
        declarations = summary.declarations_renamed,
        call_sites = summary.call_sites_rewritten,
        warnings = warnings.len(),
        "planned rename"
    );

    Ok(RenamePlan {
        status: "planned".to_string(),
        schema_version: PLAN_SCHEMA_VERSION,
        target: graph.qualified_name(target),
        new_name: new_name.to_string(),
        renamed,
        call_sites: rewritten,
        edits: sorted,
        summary,
        warnings,
    })
}

/// Plan a rename targeted by file path + byte offset.
pub fn rename_at(
    graph: &SymbolGraph,
    path: &str,
    offset: u64,
    new_name: &str,
) -> RenameResult<RenamePlan> {
    let target = find_target_at(graph, path, offset)?;
    plan_rename(graph, target, new_name)
}

/// Declarations that dispatch can conflate with the target.
///
/// A declaration joins the closure when it shares the target's name, its
/// arity overlaps the target's, and its owner sits in the MRO of some
/// container that also reaches the target's owner.
fn rename_closure(graph: &SymbolGraph, target: DeclId) -> Vec<DeclId> {
    let target_decl = match graph.declaration(target) {
        Some(d) => d,
        None => return Vec::new(),
    };

    let mut reachable_owners = HashSet::new();
    for container in graph.containers() {
        if graph.reaches(container.container_id, target_decl.owner) {
            for entry in graph.mro(container.container_id) {
                reachable_owners.insert(entry.container);
            }
        }
    }

    graph
        .decls_named(&target_decl.name)
        .iter()
        .copied()
        .filter(|&id| {
            graph
                .declaration(id)
                .map(|d| {
                    d.arity.overlaps(&target_decl.arity) && reachable_owners.contains(&d.owner)
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Emit a `NameCollision` warning for each existing declaration of the new
/// name that a renamed declaration could shadow or be shadowed by.
fn collect_collisions(
    graph: &SymbolGraph,
    closure: &[DeclId],
    target_arity: Arity,
    new_name: &str,
    warnings: &mut Vec<RenameWarning>,
) {
    let closure_owners: HashSet<_> = closure
        .iter()
        .filter_map(|&id| graph.declaration(id))
        .map(|d| d.owner)
        .collect();

    let mut reported = HashSet::new();
    for container in graph.containers() {
        if !closure_owners
            .iter()
            .any(|&owner| graph.reaches(container.container_id, owner))
        {
            continue;
        }
        for entry in graph.mro(container.container_id) {
            for &decl_id in graph.decls_of(entry.container) {
                let decl = match graph.declaration(decl_id) {
                    Some(d) => d,
                    None => continue,
                };
                if decl.name != new_name || !decl.arity.overlaps(&target_arity) {
                    continue;
                }
                if !reported.insert(decl_id) {
                    continue;
                }
                warnings.push(RenameWarning {
                    code: RenameWarningCode::NameCollision,
                    message: format!(
                        "'{}' already declares '{}'; dispatch on '{}' may change after the rename",
                        graph
                            .container(decl.owner)
                            .map(|c| c.name.as_str())
                            .unwrap_or("?"),
                        new_name,
                        container.name,
                    ),
                    location: Some(location_of(graph, decl.file_id, decl.name_span)),
                });
            }
        }
    }
}

fn location_of(graph: &SymbolGraph, file_id: FileId, span: Span) -> Location {
    let path = graph
        .file(file_id)
        .map(|f| f.path.clone())
        .unwrap_or_else(|| file_id.to_string());
    Location::new(path, span)
}
