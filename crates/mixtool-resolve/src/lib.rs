//! Method resolution and rename planning over class/mixin inclusion graphs.
//!
//! The engine consumes a symbol table produced by an external parser: files,
//! containers (classes and modules), method declarations, and call sites are
//! fed into a [`graph::GraphBuilder`] and frozen into an immutable
//! [`graph::SymbolGraph`]. On top of the graph sit:
//!
//! - [`mro`] — Ruby-style linearization of the lookup order, memoized per
//!   container;
//! - [`resolve`] — call-site resolution with arity matching and sibling-mixin
//!   ambiguity detection;
//! - [`lookup`] — rename-target selection from a file path + byte offset;
//! - [`rename`] — the planner, producing hash-anchored span edits.
//!
//! The engine never reads or writes files; plans are applied by hosts via
//! `mixtool_core::patch`.

pub mod graph;
pub mod lookup;
pub mod mro;
pub mod rename;
pub mod resolve;
pub mod validation;

pub use graph::{
    Arity, CallSite, CallSiteId, Container, ContainerId, ContainerKind, Declaration, DeclId,
    GraphBuilder, GraphError, GraphResult, Receiver, SourceFile, SymbolGraph,
};
pub use lookup::{find_target_at, LookupError, LookupResult};
pub use mro::MroEntry;
pub use rename::{
    plan_rename, rename_at, RenameError, RenamePlan, RenameResult, RenameWarning,
    RenameWarningCode, PLAN_SCHEMA_VERSION,
};
pub use resolve::{resolve_call, Resolution};
pub use validation::{validate_method_name, ValidationError, ValidationResult};
