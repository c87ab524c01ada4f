//! The cross-subroutine reference graph.
//!
//! Every call edge recorded during lowering lands here, keyed by the
//! calling [`Reference`]. The optimizer computes liveness by reachability
//! from the [`Reference::External`] roots and uses the per-edge
//! [`CallKind`] to decide what may be inlined.

use std::collections::BTreeMap;

use crate::term::SubroutineId;

/// A node key in the reference graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reference {
    Sub(SubroutineId),
    /// An external entry point: a hook tag or an explicitly public name.
    External(String),
}

/// How a call site reaches its callee. The three kinds differ in whether
/// the callee can be folded back into a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Bare `function …` call; any callee body may be spliced in.
    Plain,
    /// Call under a single conditional-execute prefix; only a
    /// single-instruction callee can be substituted after `run`.
    Execute,
    /// Body of a scoped prefix block; never folded.
    With,
}

/// One directed call edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEdge {
    pub callee: SubroutineId,
    pub kind: CallKind,
    /// Body slot of the call instruction in the caller; `None` for edges
    /// from external roots.
    pub slot: Option<usize>,
}

/// Directed multigraph of who calls whom.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    edges: BTreeMap<Reference, Vec<CallEdge>>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call edge.
    pub fn record(&mut self, caller: Reference, edge: CallEdge) {
        self.edges.entry(caller).or_default().push(edge);
    }

    /// Outgoing edges of one caller.
    pub fn edges_from(&self, caller: &Reference) -> &[CallEdge] {
        self.edges.get(caller).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All callers in deterministic order.
    pub fn callers(&self) -> impl Iterator<Item = &Reference> {
        self.edges.keys()
    }

    /// The external roots that anchor liveness.
    pub fn roots(&self) -> impl Iterator<Item = &Reference> {
        self.edges
            .keys()
            .filter(|r| matches!(r, Reference::External(_)))
    }

    /// Iterate `(caller, edges)` pairs in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&Reference, &[CallEdge])> {
        self.edges.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Inbound edges per callee: `(caller, kind, slot)` tuples in
    /// deterministic caller order.
    pub fn inbound(&self) -> BTreeMap<SubroutineId, Vec<(Reference, CallKind, Option<usize>)>> {
        let mut map: BTreeMap<SubroutineId, Vec<_>> = BTreeMap::new();
        for (caller, edges) in &self.edges {
            for edge in edges {
                map.entry(edge.callee.clone()).or_default().push((
                    caller.clone(),
                    edge.kind,
                    edge.slot,
                ));
            }
        }
        map
    }

    /// Remove one edge matching `(caller, callee, kind, slot)` exactly.
    /// Returns whether an edge was removed.
    pub fn remove_edge(
        &mut self,
        caller: &Reference,
        callee: &SubroutineId,
        kind: CallKind,
        slot: Option<usize>,
    ) -> bool {
        if let Some(edges) = self.edges.get_mut(caller) {
            if let Some(pos) = edges
                .iter()
                .position(|e| e.callee == *callee && e.kind == kind && e.slot == slot)
            {
                edges.remove(pos);
                if edges.is_empty() {
                    self.edges.remove(caller);
                }
                return true;
            }
        }
        false
    }

    /// Detach and return every outgoing edge of one caller.
    pub fn take_edges(&mut self, caller: &Reference) -> Vec<CallEdge> {
        self.edges.remove(caller).unwrap_or_default()
    }

    /// Attach edges to a caller, preserving order.
    pub fn append_edges(&mut self, caller: Reference, edges: Vec<CallEdge>) {
        if !edges.is_empty() {
            self.edges.entry(caller).or_default().extend(edges);
        }
    }

    /// Whether an exact edge exists.
    pub fn has_edge(
        &self,
        caller: &Reference,
        callee: &SubroutineId,
        kind: CallKind,
        slot: Option<usize>,
    ) -> bool {
        self.edges_from(caller)
            .iter()
            .any(|e| e.callee == *callee && e.kind == kind && e.slot == slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(name: &str) -> SubroutineId {
        SubroutineId::new("pack", [name])
    }

    #[test]
    fn test_record_and_inbound_counts() {
        let mut graph = ReferenceGraph::new();
        graph.record(
            Reference::Sub(sub("a")),
            CallEdge {
                callee: sub("b"),
                kind: CallKind::Plain,
                slot: Some(0),
            },
        );
        graph.record(
            Reference::Sub(sub("c")),
            CallEdge {
                callee: sub("b"),
                kind: CallKind::Execute,
                slot: Some(2),
            },
        );

        let inbound = graph.inbound();
        assert_eq!(inbound[&sub("b")].len(), 2);
        assert!(!inbound.contains_key(&sub("a")));
    }

    #[test]
    fn test_roots_are_external_only() {
        let mut graph = ReferenceGraph::new();
        graph.record(
            Reference::External("minecraft:tick".into()),
            CallEdge {
                callee: sub("tick"),
                kind: CallKind::Plain,
                slot: None,
            },
        );
        graph.record(
            Reference::Sub(sub("tick")),
            CallEdge {
                callee: sub("helper"),
                kind: CallKind::Plain,
                slot: Some(0),
            },
        );
        assert_eq!(graph.roots().count(), 1);
        assert_eq!(graph.callers().count(), 2);
    }

    #[test]
    fn test_remove_edge_is_exact() {
        let mut graph = ReferenceGraph::new();
        let caller = Reference::Sub(sub("a"));
        graph.record(
            caller.clone(),
            CallEdge {
                callee: sub("b"),
                kind: CallKind::Plain,
                slot: Some(0),
            },
        );
        assert!(!graph.remove_edge(&caller, &sub("b"), CallKind::Execute, Some(0)));
        assert!(graph.remove_edge(&caller, &sub("b"), CallKind::Plain, Some(0)));
        assert!(graph.edges_from(&caller).is_empty());
    }

    #[test]
    fn test_take_and_append_edges() {
        let mut graph = ReferenceGraph::new();
        let a = Reference::Sub(sub("a"));
        let b = Reference::Sub(sub("b"));
        graph.record(
            a.clone(),
            CallEdge {
                callee: sub("x"),
                kind: CallKind::Plain,
                slot: Some(1),
            },
        );
        let taken = graph.take_edges(&a);
        assert_eq!(taken.len(), 1);
        graph.append_edges(b.clone(), taken);
        assert_eq!(graph.edges_from(&b).len(), 1);
        assert!(graph.edges_from(&a).is_empty());
    }
}
