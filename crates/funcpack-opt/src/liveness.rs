//! Reachability-based liveness.

use std::collections::{BTreeSet, VecDeque};

use funcpack_ir::{Program, Reference, SubroutineId, Usage};

/// Recompute every subroutine's liveness from scratch and return how many
/// changed.
///
/// Roots are the external hook references; keep-marked subroutines
/// additionally anchor their callees (they serialize unconditionally, so
/// their call lines must stay renderable) without counting as live
/// themselves. Recomputing rather than updating incrementally keeps the
/// pass correct when inlining has both removed and restored reachability
/// since the last run.
pub(crate) fn recompute(program: &mut Program) -> usize {
    let mut live: BTreeSet<SubroutineId> = BTreeSet::new();
    let mut queue: VecDeque<SubroutineId> = VecDeque::new();

    let roots: Vec<Reference> = program.graph.roots().cloned().collect();
    for root in &roots {
        for edge in program.graph.edges_from(root) {
            if live.insert(edge.callee.clone()) {
                queue.push_back(edge.callee.clone());
            }
        }
    }
    // A keep-marked subroutine serializes even when unreachable, so its
    // callees must stay renderable; it anchors them without becoming
    // live itself.
    let kept: Vec<SubroutineId> = program
        .iter()
        .filter(|sub| sub.keep)
        .map(|sub| sub.id.clone())
        .collect();
    queue.extend(kept);

    while let Some(id) = queue.pop_front() {
        let callees: Vec<SubroutineId> = program
            .graph
            .edges_from(&Reference::Sub(id))
            .iter()
            .map(|edge| edge.callee.clone())
            .collect();
        for callee in callees {
            if live.insert(callee.clone()) {
                queue.push_back(callee);
            }
        }
    }

    let ids: Vec<SubroutineId> = program.ids().cloned().collect();
    let mut changes = 0;
    for id in ids {
        let usage = if live.contains(&id) {
            Usage::Live
        } else {
            Usage::Dead
        };
        if let Some(sub) = program.by_id_mut(&id) {
            if sub.usage != usage {
                sub.usage = usage;
                changes += 1;
            }
        }
    }
    changes
}
