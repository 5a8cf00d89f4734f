//! Design-entity predicates: suppliers of the unconstrained domain of a query
//! variable.
//!
//! A [`PredicateFactory`] builds one [`PredicateTable`] per program. Tables
//! hand out shared [`SimplePredicate`]s by entity name; a predicate computes
//! its global set at most once and only reads the program.

mod entity;

use std::{fmt::Debug, sync::Arc};

pub use entity::{EntityKind, EntityPredicate, SimplePredicateFactory, SimplePredicateTable};

use crate::{ast::Program, condition::ConditionSet, solver::SolverError};

pub trait SimplePredicate: Send + Sync + Debug {
    /// Entity name the predicate was registered under.
    fn name(&self) -> &str;

    /// Every condition of the predicate's kind in the program. Memoized.
    fn global_set(&self) -> &ConditionSet;

    /// Narrows `conditions` to members of the global set.
    fn filter_set(&self, conditions: &mut ConditionSet) {
        let global = self.global_set();
        conditions.retain(|c| global.contains(c));
    }
}

pub type PredicatePtr = Arc<dyn SimplePredicate>;

pub trait PredicateTable: Send + Sync + Debug {
    fn get_predicate(&self, name: &str) -> Result<PredicatePtr, SolverError>;
}

pub trait PredicateFactory {
    fn make_predicates(&self, ast: Arc<Program>) -> Arc<dyn PredicateTable>;
}
