//! Boolean condition algebra for funcpack.
//!
//! The target conditional syntax only expresses implicit conjunction: a
//! guarded command is a chain of same-polarity `if`/`unless` clauses. This
//! crate keeps conditions normalized so lowering never meets a shape the
//! target cannot express:
//!
//! - [`Cond::and`] / [`Cond::or`] flatten their connective and fold
//!   constants without allocating.
//! - [`Cond::negate`] applies De Morgan eagerly; there is no deferred NOT
//!   node.
//! - AND over OR distributes into disjunctive normal form, because any OR
//!   under an AND must be pushed outward before lowering.
//!
//! [`Cond::tokenize`] lowers a normalized condition into guard [`Term`]s;
//! a disjunction of compound operands is not expressible as terms and
//! reports [`CondError::NeedsFlag`] so the control-flow layer can fall
//! back to the persistent-flag protocol.
//!
//! [`Term`]: funcpack_ir::Term

mod algebra;
mod lower;

pub use algebra::Cond;
pub use lower::CondError;
