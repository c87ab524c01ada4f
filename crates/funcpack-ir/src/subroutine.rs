//! Subroutines and the program arena.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::graph::{CallEdge, CallKind, Reference, ReferenceGraph};
use crate::instruction::Instruction;
use crate::term::SubroutineId;

/// Liveness of one subroutine.
///
/// Starts `Unknown`; one optimization run settles every subroutine to
/// `Live` or `Dead`. Rendering treats `Unknown` as live so unoptimized
/// programs serialize in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    Unknown,
    Live,
    Dead,
}

/// Resolves a subroutine identity to its effective liveness.
pub trait UsageLookup {
    fn usage(&self, id: &SubroutineId) -> Usage;
}

/// Treats every subroutine as live. For rendering before optimization and
/// in tests.
pub struct AllLive;

impl UsageLookup for AllLive {
    fn usage(&self, _: &SubroutineId) -> Usage {
        Usage::Live
    }
}

/// One position in a subroutine body.
///
/// A slot holds zero or more instructions so the optimizer can remove (a
/// hole is an empty slot) or splice (a widened slot) without shifting the
/// positions that call sites and graph edges refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub instrs: Vec<Instruction>,
}

impl Slot {
    pub fn single(instr: Instruction) -> Self {
        Self {
            instrs: vec![instr],
        }
    }

    pub fn hole() -> Self {
        Self::default()
    }

    pub fn is_hole(&self) -> bool {
        self.instrs.is_empty()
    }
}

/// One named, independently invocable unit of compiled output.
#[derive(Debug, Clone)]
pub struct Subroutine {
    pub id: SubroutineId,
    pub body: Vec<Slot>,
    pub usage: Usage,
    /// Programmer override: serialize even when dead, marked `# unused`.
    pub keep: bool,
}

impl Subroutine {
    pub fn new(id: SubroutineId) -> Self {
        Self {
            id,
            body: Vec::new(),
            usage: Usage::Unknown,
            keep: false,
        }
    }

    /// Append an instruction in a fresh slot; returns the slot index.
    pub fn push(&mut self, instr: Instruction) -> usize {
        self.body.push(Slot::single(instr));
        self.body.len() - 1
    }

    /// Total instructions across all slots.
    pub fn instruction_count(&self) -> usize {
        self.body.iter().map(|s| s.instrs.len()).sum()
    }

    /// The body's only instruction, if it holds exactly one.
    pub fn single_instruction(&self) -> Option<&Instruction> {
        let mut found = None;
        for slot in &self.body {
            for instr in &slot.instrs {
                if found.is_some() {
                    return None;
                }
                found = Some(instr);
            }
        }
        found
    }

    /// All instructions in body order, holes skipped.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.body.iter().flat_map(|s| s.instrs.iter())
    }
}

/// Stable arena index of a subroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubIdx(pub u32);

/// Identity of an external hook root (e.g. a periodic-tick trigger).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HookId {
    pub namespace: String,
    pub name: String,
}

impl HookId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// The full in-memory program: a subroutine arena addressed by stable
/// indices, the hook registrations that anchor liveness, and the
/// cross-subroutine reference graph.
///
/// Subroutines are created when first touched and never physically
/// deleted — the optimizer only flips [`Usage`].
#[derive(Debug, Default)]
pub struct Program {
    subs: Vec<Subroutine>,
    index: BTreeMap<SubroutineId, SubIdx>,
    pub hooks: BTreeMap<HookId, Vec<SubroutineId>>,
    pub graph: ReferenceGraph,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the subroutine with this identity.
    pub fn declare(&mut self, id: SubroutineId) -> SubIdx {
        if let Some(idx) = self.index.get(&id) {
            return *idx;
        }
        let idx = SubIdx(self.subs.len() as u32);
        self.subs.push(Subroutine::new(id.clone()));
        self.index.insert(id, idx);
        idx
    }

    pub fn lookup(&self, id: &SubroutineId) -> Option<SubIdx> {
        self.index.get(id).copied()
    }

    pub fn get(&self, idx: SubIdx) -> &Subroutine {
        &self.subs[idx.0 as usize]
    }

    pub fn get_mut(&mut self, idx: SubIdx) -> &mut Subroutine {
        &mut self.subs[idx.0 as usize]
    }

    pub fn by_id(&self, id: &SubroutineId) -> Option<&Subroutine> {
        self.lookup(id).map(|idx| self.get(idx))
    }

    pub fn by_id_mut(&mut self, id: &SubroutineId) -> Option<&mut Subroutine> {
        self.lookup(id).map(|idx| &mut self.subs[idx.0 as usize])
    }

    /// Iterate subroutines in identity order (deterministic).
    pub fn iter(&self) -> impl Iterator<Item = &Subroutine> {
        self.index.values().map(|idx| self.get(*idx))
    }

    /// Identities in deterministic order.
    pub fn ids(&self) -> impl Iterator<Item = &SubroutineId> {
        self.index.keys()
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Register a subroutine against an external hook, anchoring it as a
    /// liveness root.
    pub fn register_hook(&mut self, hook: HookId, target: SubroutineId) {
        self.declare(target.clone());
        self.graph.record(
            Reference::External(hook.to_string()),
            CallEdge {
                callee: target.clone(),
                kind: CallKind::Plain,
                slot: None,
            },
        );
        self.hooks.entry(hook).or_default().push(target);
    }
}

impl UsageLookup for Program {
    fn usage(&self, id: &SubroutineId) -> Usage {
        match self.by_id(id) {
            Some(sub) if sub.keep => Usage::Live,
            Some(sub) => sub.usage,
            // Unknown identities are a graph warning elsewhere; rendering
            // stays conservative.
            None => Usage::Unknown,
        }
    }
}
