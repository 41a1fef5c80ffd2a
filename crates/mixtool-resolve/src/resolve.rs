//! Call-site resolution over the method resolution order.
//!
//! A call binds to the first declaration along the receiver's MRO whose
//! name matches and whose arity accepts the argument count. The single
//! exception is a tie between sibling mixins: when a later match is owned
//! by a container that is MRO-unrelated to the first match's owner and both
//! entries were injected by the same inclusion host, neither has declared
//! precedence and the call is ambiguous.

use tracing::trace;

use crate::graph::{CallSite, DeclId, Receiver, SymbolGraph};

/// Outcome of resolving a single call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The call dispatches to exactly one declaration.
    Bound(DeclId),
    /// The call could dispatch to any of these declarations, with no
    /// declared precedence between them. Candidates in MRO order.
    Ambiguous(Vec<DeclId>),
    /// No declaration matches, or the receiver type is unknown.
    Unresolved,
}

/// Resolve a call site against the graph.
pub fn resolve_call(graph: &SymbolGraph, call: &CallSite) -> Resolution {
    let receiver = match call.receiver {
        Receiver::Instance(c) => c,
        Receiver::Unknown => return Resolution::Unresolved,
    };

    // Matches in MRO order, each with the host that injected its owner.
    let mut matches = Vec::new();
    for entry in graph.mro(receiver) {
        for &decl_id in graph.decls_of(entry.container) {
            let decl = match graph.declaration(decl_id) {
                Some(d) => d,
                None => continue,
            };
            if decl.name == call.method && decl.arity.accepts(call.argc) {
                matches.push((decl_id, entry.host));
            }
        }
    }

    let (&(first, first_host), rest) = match matches.split_first() {
        Some(split) => split,
        None => return Resolution::Unresolved,
    };

    let first_owner = match graph.declaration(first) {
        Some(d) => d.owner,
        None => return Resolution::Unresolved,
    };

    // Sibling mixins tie; anything MRO-related to the first match is an
    // override or shadow and loses by proximity.
    let mut tied = vec![first];
    for &(decl_id, host) in rest {
        let owner = match graph.declaration(decl_id) {
            Some(d) => d.owner,
            None => continue,
        };
        if !graph.related(first_owner, owner) && first_host.is_some() && host == first_host {
            tied.push(decl_id);
        }
    }

    if tied.len() > 1 {
        trace!(call = %call.call_id, candidates = tied.len(), "ambiguous dispatch");
        return Resolution::Ambiguous(tied);
    }

    trace!(call = %call.call_id, decl = %first, "bound");
    Resolution::Bound(first)
}
