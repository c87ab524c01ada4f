//! The compiler session: scope stack, name allocation, and emission.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use funcpack_ir::{
    CallEdge, CallKind, ChoiceIds, HookId, Instruction, Program, Reference, StructureError,
    SubroutineId, Term, Usage,
};

use crate::error::{LowerError, LowerResult};

/// The shared scoreboard objective holding short-circuit OR flags.
pub const FLAG_OBJECTIVE: &str = "fp_flags";

/// One compilation's mutable state: the program being built, the current
/// namespace and path stack, and the deterministic counters behind
/// anonymous names, choice ids, and flag holders.
///
/// The original design kept this as process-wide global state mutated by
/// scope push/pop; here it is a single owned value passed by `&mut`, so
/// two compilations can never interleave against the same state.
pub struct Session {
    program: Program,
    namespace: String,
    path: Vec<String>,
    /// `(parent path, prefix)` → next anonymous ordinal.
    anon: BTreeMap<(String, String), u32>,
    /// Owning path → next flag ordinal.
    flags: BTreeMap<String, u32>,
    choice_ids: ChoiceIds,
}

impl Session {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            program: Program::new(),
            namespace: namespace.into(),
            path: Vec::new(),
            anon: BTreeMap::new(),
            flags: BTreeMap::new(),
            choice_ids: ChoiceIds::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// The allocator for combinatorial choice ids.
    pub fn choice_ids(&mut self) -> &mut ChoiceIds {
        &mut self.choice_ids
    }

    // ── Scoping ──────────────────────────────────────────────────────────

    /// Push a path segment. The subroutine for the new path is created on
    /// first touch.
    pub fn enter(&mut self, name: impl Into<String>) {
        self.path.push(name.into());
        self.program.declare(self.current_id_unchecked());
    }

    /// Pop the innermost path segment.
    pub fn exit(&mut self) -> Result<(), StructureError> {
        self.path
            .pop()
            .map(|_| ())
            .ok_or(StructureError::ScopeUnderflow)
    }

    /// Run `f` inside a named child scope, restoring the prior stack on
    /// every non-panic exit path, including error exits.
    pub fn scoped<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> LowerResult<T>,
    ) -> LowerResult<T> {
        self.enter(name);
        let out = f(self);
        self.exit()?;
        out
    }

    /// Define (or extend) the named child subroutine and return its
    /// identity.
    pub fn define(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> LowerResult<()>,
    ) -> LowerResult<SubroutineId> {
        self.scoped(name, |s| {
            f(s)?;
            s.current_id()
        })
    }

    /// Define a fresh anonymous child subroutine. Names come from a
    /// deterministic per-scope counter, so recompiling unchanged input
    /// yields byte-identical output.
    pub fn anonymous(
        &mut self,
        prefix: &str,
        f: impl FnOnce(&mut Self) -> LowerResult<()>,
    ) -> LowerResult<SubroutineId> {
        let key = (self.path.join("/"), prefix.to_string());
        let ordinal = self.anon.entry(key).or_insert(0);
        let name = format!("{prefix}{ordinal}");
        *ordinal += 1;
        self.define(&name, f)
    }

    /// Identity of the subroutine currently in scope.
    pub fn current_id(&self) -> LowerResult<SubroutineId> {
        if self.path.is_empty() {
            return Err(LowerError::OutsideSubroutine);
        }
        Ok(self.current_id_unchecked())
    }

    fn current_id_unchecked(&self) -> SubroutineId {
        SubroutineId::new(self.namespace.clone(), self.path.clone())
    }

    // ── Emission ─────────────────────────────────────────────────────────

    /// Append an instruction to the current subroutine; returns its slot.
    pub fn emit(&mut self, instr: Instruction) -> LowerResult<usize> {
        let id = self.current_id()?;
        let idx = self.program.declare(id);
        Ok(self.program.get_mut(idx).push(instr))
    }

    /// Append a plain-text command.
    pub fn emit_line(&mut self, text: &str) -> LowerResult<usize> {
        self.emit(Instruction::line(text))
    }

    /// Emit a plain call to `callee` and record its edge.
    pub fn call(&mut self, callee: SubroutineId) -> LowerResult<usize> {
        let slot = self.emit(Instruction::new(vec![Term::call(callee.clone())]))?;
        self.record_call(CallKind::Plain, callee, Some(slot))?;
        Ok(slot)
    }

    /// Record a call edge from the current subroutine.
    pub fn record_call(
        &mut self,
        kind: CallKind,
        callee: SubroutineId,
        slot: Option<usize>,
    ) -> LowerResult<()> {
        let caller = Reference::Sub(self.current_id()?);
        self.program
            .graph
            .record(caller, CallEdge { callee, kind, slot });
        Ok(())
    }

    /// Serialize the current subroutine even if it ends up unused.
    pub fn keep_current(&mut self) -> LowerResult<()> {
        let id = self.current_id()?;
        let idx = self.program.declare(id);
        self.program.get_mut(idx).keep = true;
        Ok(())
    }

    /// Register the current subroutine against an external hook.
    pub fn hook(&mut self, hook: HookId) -> LowerResult<()> {
        let id = self.current_id()?;
        self.program.register_hook(hook, id);
        Ok(())
    }

    /// Fold a just-created single-instruction wrapper back into the
    /// current subroutine: its outgoing edges now originate here, pointed
    /// at `slot`, and the wrapper is marked unused.
    ///
    /// The folded command sits under an execute prefix, so a plain call
    /// edge the wrapper carried now describes an execute-guarded call and
    /// is downgraded accordingly.
    pub fn absorb_wrapper(&mut self, wrapper: &SubroutineId, slot: usize) -> LowerResult<()> {
        let caller = Reference::Sub(self.current_id()?);
        let mut edges = self
            .program
            .graph
            .take_edges(&Reference::Sub(wrapper.clone()));
        for edge in &mut edges {
            edge.slot = Some(slot);
            if edge.kind == CallKind::Plain {
                edge.kind = CallKind::Execute;
            }
        }
        self.program.graph.append_edges(caller, edges);
        if let Some(sub) = self.program.by_id_mut(wrapper) {
            sub.usage = Usage::Dead;
        }
        Ok(())
    }

    /// Allocate a short-circuit flag holder owned by the current
    /// subroutine.
    ///
    /// The name is a content hash of the owning qualified name together
    /// with a per-owner ordinal, so it is deterministic and always
    /// exactly 16 characters regardless of how many flags one subroutine
    /// allocates.
    pub fn flag_holder(&mut self) -> LowerResult<String> {
        let owner = self.current_id()?.to_string();
        let ordinal = self.flags.entry(owner.clone()).or_insert(0);
        let digest = Sha256::digest(format!("{owner}#{ordinal}").as_bytes());
        *ordinal += 1;
        let mut hex = String::with_capacity(12);
        for byte in digest.iter().take(6) {
            hex.push_str(&format!("{byte:02x}"));
        }
        Ok(format!("#fp_{hex}"))
    }

    /// Finish the session, validating that every scope was exited.
    pub fn finish(self) -> Result<Program, StructureError> {
        if !self.path.is_empty() {
            return Err(StructureError::UnclosedScope {
                depth: self.path.len(),
            });
        }
        Ok(self.program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_outside_scope_fails() {
        let mut s = Session::new("pack");
        assert_eq!(
            s.emit_line("say hi"),
            Err(LowerError::OutsideSubroutine)
        );
    }

    #[test]
    fn test_exit_underflow_is_structural() {
        let mut s = Session::new("pack");
        assert_eq!(s.exit(), Err(StructureError::ScopeUnderflow));
    }

    #[test]
    fn test_scoped_restores_stack_on_error() {
        let mut s = Session::new("pack");
        let out: LowerResult<()> = s.scoped("main", |s| {
            s.emit_line("say one")?;
            Err(LowerError::Internal("boom".into()))
        });
        assert!(out.is_err());
        // The stack is back at the root: a new scope sees a clean path.
        let id = s.define("after", |_| Ok(())).unwrap();
        assert_eq!(id, SubroutineId::new("pack", ["after"]));
    }

    #[test]
    fn test_finish_rejects_unclosed_scopes() {
        let mut s = Session::new("pack");
        s.enter("main");
        assert_eq!(
            s.finish().unwrap_err(),
            StructureError::UnclosedScope { depth: 1 }
        );
    }

    #[test]
    fn test_anonymous_names_are_deterministic() {
        let build = || {
            let mut s = Session::new("pack");
            s.scoped("main", |s| {
                let a = s.anonymous("branch", |s| s.emit_line("say a").map(|_| ()))?;
                let b = s.anonymous("branch", |s| s.emit_line("say b").map(|_| ()))?;
                Ok((a, b))
            })
            .unwrap()
        };
        let (a1, b1) = build();
        let (a2, b2) = build();
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
        assert_eq!(a1, SubroutineId::new("pack", ["main", "branch0"]));
        assert_eq!(b1, SubroutineId::new("pack", ["main", "branch1"]));
    }

    #[test]
    fn test_anonymous_counters_are_per_scope() {
        let mut s = Session::new("pack");
        let first = s
            .scoped("alpha", |s| s.anonymous("branch", |_| Ok(())))
            .unwrap();
        let second = s
            .scoped("beta", |s| s.anonymous("branch", |_| Ok(())))
            .unwrap();
        assert_eq!(first.path, vec!["alpha", "branch0"]);
        assert_eq!(second.path, vec!["beta", "branch0"]);
    }

    #[test]
    fn test_flag_holder_is_deterministic_and_fixed_width() {
        let mut a = Session::new("pack");
        let mut b = Session::new("pack");
        let fa = a.scoped("main", |s| s.flag_holder()).unwrap();
        let fb = b.scoped("main", |s| s.flag_holder()).unwrap();
        assert_eq!(fa, fb);
        assert!(fa.starts_with("#fp_"));
        assert_eq!(fa.len(), 16, "holder {fa} is not fixed-width");
        // A second flag in the same scope gets a fresh ordinal.
        let fa2 = a.scoped("main", |s| s.flag_holder()).unwrap();
        assert_ne!(fa, fa2);
    }

    #[test]
    fn test_many_flags_in_one_scope_stay_within_bound() {
        let mut s = Session::new("pack");
        let holders = s
            .scoped("main", |s| {
                (0..12).map(|_| s.flag_holder()).collect::<LowerResult<Vec<_>>>()
            })
            .unwrap();
        for holder in &holders {
            assert_eq!(holder.len(), 16, "holder {holder} is not fixed-width");
        }
        let unique: std::collections::BTreeSet<_> = holders.iter().collect();
        assert_eq!(unique.len(), holders.len());
    }

    #[test]
    fn test_call_records_plain_edge() {
        let mut s = Session::new("pack");
        let callee = SubroutineId::new("pack", ["util"]);
        s.scoped("main", |s| {
            s.call(callee.clone())?;
            Ok(())
        })
        .unwrap();
        let caller = Reference::Sub(SubroutineId::new("pack", ["main"]));
        let edges = s.program().graph.edges_from(&caller);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, CallKind::Plain);
        assert_eq!(edges[0].callee, callee);
    }

    #[test]
    fn test_define_reuses_identity() {
        let mut s = Session::new("pack");
        s.define("main", |s| s.emit_line("say one").map(|_| ()))
            .unwrap();
        s.define("main", |s| s.emit_line("say two").map(|_| ()))
            .unwrap();
        let sub = s
            .program()
            .by_id(&SubroutineId::new("pack", ["main"]))
            .unwrap();
        assert_eq!(sub.instruction_count(), 2);
        assert_eq!(s.program().len(), 1);
    }
}
