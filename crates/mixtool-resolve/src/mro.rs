//! Method resolution order linearization.
//!
//! Lookup order for a container: the container itself, then its included
//! modules in reverse inclusion order (most recently included first), each
//! flattened through its own includes the same way, then the superclass
//! chain treated identically. A container already emitted is skipped, so
//! re-included modules keep their closest position.
//!
//! Linearizations are computed once for every container when the graph is
//! frozen (see [`crate::graph::GraphBuilder::build`]) and memoized in the
//! snapshot; queries after that are slice lookups.

use tracing::trace;

use crate::graph::{Container, ContainerId};

/// One step in a container's method resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MroEntry {
    /// The container methods are looked up on at this step.
    pub container: ContainerId,
    /// The container whose include list injected this entry, or `None` for
    /// the starting container and its superclass chain.
    ///
    /// Two entries sharing a host are sibling mixins of that host: they
    /// have no declared precedence between them, which is what the
    /// ambiguity policy keys on.
    pub host: Option<ContainerId>,
}

/// Compute the linearization for `start` over the container table.
///
/// Total for any well-formed table: the builder rejects include cycles and
/// superclass chains are acyclic by construction, and the seen-set makes
/// every container appear at most once.
pub(crate) fn linearize(containers: &[Container], start: ContainerId) -> Vec<MroEntry> {
    let mut order = Vec::new();
    let mut seen = vec![false; containers.len()];

    // Superclass chain of the starting container, nearest first.
    let mut chain = Vec::new();
    let mut current = Some(start);
    while let Some(id) = current {
        chain.push(id);
        current = containers[id.0 as usize].superclass;
    }

    for id in chain {
        emit(containers, id, None, &mut seen, &mut order);
        // A chain member's includes sit between it and its own superclass.
        for &module in containers[id.0 as usize].includes.iter().rev() {
            flatten(containers, module, id, &mut seen, &mut order);
        }
    }

    trace!(container = %start, steps = order.len(), "linearized");
    order
}

/// Emit `module` (injected by `host`) and then its own includes, most
/// recent first.
fn flatten(
    containers: &[Container],
    module: ContainerId,
    host: ContainerId,
    seen: &mut [bool],
    order: &mut Vec<MroEntry>,
) {
    if !emit(containers, module, Some(host), seen, order) {
        return;
    }
    for &inner in containers[module.0 as usize].includes.iter().rev() {
        flatten(containers, inner, module, seen, order);
    }
}

fn emit(
    containers: &[Container],
    id: ContainerId,
    host: Option<ContainerId>,
    seen: &mut [bool],
    order: &mut Vec<MroEntry>,
) -> bool {
    let idx = id.0 as usize;
    if idx >= containers.len() || seen[idx] {
        return false;
    }
    seen[idx] = true;
    order.push(MroEntry {
        container: id,
        host,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn ids(entries: &[MroEntry]) -> Vec<ContainerId> {
        entries.iter().map(|e| e.container).collect()
    }

    #[test]
    fn bare_class_is_just_itself() {
        let mut b = GraphBuilder::new();
        let c = b.add_class("C", None).unwrap();
        let graph = b.build();
        assert_eq!(
            graph.mro(c),
            &[MroEntry {
                container: c,
                host: None
            }]
        );
    }

    #[test]
    fn includes_come_in_reverse_inclusion_order() {
        let mut b = GraphBuilder::new();
        let m1 = b.add_module("M1");
        let m2 = b.add_module("M2");
        let c = b.add_class("C", None).unwrap();
        b.include(c, m1).unwrap();
        b.include(c, m2).unwrap();
        let graph = b.build();

        // M2 was included last, so it shadows M1.
        assert_eq!(ids(graph.mro(c)), vec![c, m2, m1]);
    }

    #[test]
    fn module_includes_flatten_before_host_siblings() {
        let mut b = GraphBuilder::new();
        let base = b.add_module("Base");
        let with_method = b.add_module("WithMethod");
        b.include(with_method, base).unwrap();
        let c = b.add_class("C", None).unwrap();
        b.include(c, with_method).unwrap();
        let graph = b.build();

        let mro = graph.mro(c);
        assert_eq!(ids(mro), vec![c, with_method, base]);
        assert_eq!(mro[1].host, Some(c));
        assert_eq!(mro[2].host, Some(with_method));
    }

    #[test]
    fn superclass_chain_follows_includes() {
        let mut b = GraphBuilder::new();
        let m = b.add_module("M");
        let parent = b.add_class("Parent", None).unwrap();
        let child = b.add_class("Child", Some(parent)).unwrap();
        b.include(child, m).unwrap();
        let graph = b.build();

        assert_eq!(ids(graph.mro(child)), vec![child, m, parent]);
    }

    #[test]
    fn superclass_includes_are_emitted_after_superclass() {
        let mut b = GraphBuilder::new();
        let m = b.add_module("M");
        let parent = b.add_class("Parent", None).unwrap();
        b.include(parent, m).unwrap();
        let child = b.add_class("Child", Some(parent)).unwrap();
        let graph = b.build();

        let mro = graph.mro(child);
        assert_eq!(ids(mro), vec![child, parent, m]);
        // M is injected by Parent's include list, not Child's.
        assert_eq!(mro[2].host, Some(parent));
    }

    #[test]
    fn shared_module_keeps_closest_position() {
        let mut b = GraphBuilder::new();
        let shared = b.add_module("Shared");
        let outer = b.add_module("Outer");
        b.include(outer, shared).unwrap();
        let c = b.add_class("C", None).unwrap();
        b.include(c, shared).unwrap();
        b.include(c, outer).unwrap();
        let graph = b.build();

        // Outer shadows the direct include, and Shared appears once, at
        // its first (closest) emission point.
        assert_eq!(ids(graph.mro(c)), vec![c, outer, shared]);
        assert_eq!(graph.mro(c)[2].host, Some(outer));
    }

    #[test]
    fn fixture_shaped_hierarchy() {
        // Module graph of the motivating scenario: a class including two
        // sibling modules, one of which drags in a shared base module.
        let mut b = GraphBuilder::new();
        let base = b.add_module("Base");
        let base_with_method = b.add_module("BaseWithMethod");
        b.include(base_with_method, base).unwrap();
        let other_with_method = b.add_module("OtherModuleWithMethod");
        let e = b.add_class("E", None).unwrap();
        b.include(e, base_with_method).unwrap();
        b.include(e, other_with_method).unwrap();
        let graph = b.build();

        let mro = graph.mro(e);
        assert_eq!(ids(mro), vec![e, other_with_method, base_with_method, base]);
        assert_eq!(mro[1].host, Some(e));
        assert_eq!(mro[2].host, Some(e));
        assert_eq!(mro[3].host, Some(base_with_method));
    }

    #[test]
    fn inherited_chain_through_superclass() {
        // D < C where C includes Base: D sees Base through C.
        let mut b = GraphBuilder::new();
        let base = b.add_module("Base");
        let c = b.add_class("C", None).unwrap();
        b.include(c, base).unwrap();
        let d = b.add_class("D", Some(c)).unwrap();
        let graph = b.build();

        let mro = graph.mro(d);
        assert_eq!(ids(mro), vec![d, c, base]);
        assert_eq!(mro[2].host, Some(c));
    }
}
