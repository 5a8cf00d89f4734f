//! Static analysis of programs written in Simple, a small procedural
//! language with procedures, assignments, calls, `if`/`else` and `while`.
//!
//! The pipeline:
//!
//! - [`lang::parse_program`] turns source text into an [`ast::Program`], an
//!   immutable arena of procedures and statements.
//! - A [`predicate::PredicateFactory`] builds the design-entity predicates
//!   (`stmt`, `assign`, `while`, `variable`, ...) that give query variables
//!   their initial domain.
//! - [`solver::make_solvers`] builds one [`solver::RelationSolver`] per
//!   relation (Parent, Parent*, Follows, Follows*, Modifies, Uses).
//! - [`query::QueryEvaluator`] narrows [`qvar::QueryVariable`]s clause by
//!   clause until nothing changes.
//!
//! [`Analysis`] bundles the pieces for one program.

pub mod analysis;
pub mod ast;
pub mod condition;
mod error;
pub mod lang;
mod params;
pub mod predicate;
pub mod query;
pub mod qvar;
pub mod solver;

#[cfg(test)]
pub(crate) mod test_utils;

pub use analysis::Analysis;
pub use error::{Error, Result};
pub use params::Params;
