use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one subroutine: a namespace plus an ordered path of names.
///
/// Renders as `namespace:seg/seg/seg`, which is also the fully qualified
/// name used inside hook-tag files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubroutineId {
    pub namespace: String,
    pub path: Vec<String>,
}

impl SubroutineId {
    /// Create an identity from a namespace and path segments.
    pub fn new<N, P, S>(namespace: N, path: P) -> Self
    where
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// The path segments joined by `/`.
    pub fn joined_path(&self) -> String {
        self.path.join("/")
    }
}

impl fmt::Display for SubroutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.joined_path())
    }
}

/// Identity of one combinatorial choice set.
///
/// Two [`ChoiceSet`] terms carrying the same id inside one instruction
/// resolve to the same chosen alternative on every rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChoiceId(pub u32);

/// Deterministic allocator for fresh [`ChoiceId`]s.
#[derive(Debug, Clone, Default)]
pub struct ChoiceIds {
    next: u32,
}

impl ChoiceIds {
    /// Create an allocator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn fresh(&mut self) -> ChoiceId {
        let id = ChoiceId(self.next);
        self.next += 1;
        id
    }
}

/// A combinatorial choice over alternative term sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    pub id: ChoiceId,
    /// Ordered alternatives; each is a sequence of terms substituted in
    /// place of the choice on one rendered line.
    pub alternatives: Vec<Vec<Term>>,
}

/// The smallest unit inside an [`crate::Instruction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Raw text emitted as-is.
    Literal(String),
    /// Text emitted quoted and escaped.
    Str(String),
    /// A bare command keyword (`execute`, `run`, `if`, `unless`, …).
    Keyword(String),
    /// A call to another subroutine; renders as `function ns:path`.
    Call(SubroutineId),
    /// A combinatorial choice set.
    Choice(ChoiceSet),
}

impl Term {
    /// Shorthand for [`Term::Literal`].
    pub fn lit(text: impl Into<String>) -> Self {
        Term::Literal(text.into())
    }

    /// Shorthand for [`Term::Str`].
    pub fn quoted(text: impl Into<String>) -> Self {
        Term::Str(text.into())
    }

    /// Shorthand for [`Term::Keyword`].
    pub fn kw(text: impl Into<String>) -> Self {
        Term::Keyword(text.into())
    }

    /// Shorthand for [`Term::Call`].
    pub fn call(id: SubroutineId) -> Self {
        Term::Call(id)
    }
}

/// Escape a string for quoted rendering.
pub(crate) fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
