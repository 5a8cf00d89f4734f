//! Query variables: the candidate cells narrowed by the clause evaluator.

use crate::{
    condition::ConditionSet,
    predicate::{PredicatePtr, SimplePredicate},
};

pub const WILDCARD_NAME: &str = "_";

/// Binding state of a named variable, as seen from outside. Once bound it
/// never becomes unbound again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding<'a> {
    Unbound,
    Bound(&'a ConditionSet),
}

#[derive(Clone, Debug)]
pub struct NamedVariable {
    name: String,
    // `None` while unbound.
    bound: Option<ConditionSet>,
    predicate: PredicatePtr,
}

impl NamedVariable {
    pub fn new(name: impl Into<String>, predicate: PredicatePtr) -> Self {
        Self {
            name: name.into(),
            bound: None,
            predicate,
        }
    }

    pub fn binding(&self) -> Binding<'_> {
        match &self.bound {
            Some(set) => Binding::Bound(set),
            None => Binding::Unbound,
        }
    }

    /// Returns the bound set, seeding it from the predicate's global set on
    /// first access.
    pub fn conditions_mut(&mut self) -> &mut ConditionSet {
        let predicate = &self.predicate;
        self.bound.get_or_insert_with(|| predicate.global_set().clone())
    }
}

/// Wildcard `_`: always ranges over the whole domain of its predicate and
/// ignores narrowing.
#[derive(Clone, Debug)]
pub struct WildcardVariable {
    predicate: PredicatePtr,
}

impl WildcardVariable {
    pub fn new(predicate: PredicatePtr) -> Self {
        Self { predicate }
    }
}

#[derive(Clone, Debug)]
pub enum QueryVariable {
    Wildcard(WildcardVariable),
    Named(NamedVariable),
}

impl QueryVariable {
    /// Creates a wildcard when `name` is `_`, a named variable otherwise.
    pub fn new(name: &str, predicate: PredicatePtr) -> Self {
        if name == WILDCARD_NAME {
            Self::wildcard(predicate)
        } else {
            Self::named(name, predicate)
        }
    }

    pub fn named(name: impl Into<String>, predicate: PredicatePtr) -> Self {
        QueryVariable::Named(NamedVariable::new(name, predicate))
    }

    pub fn wildcard(predicate: PredicatePtr) -> Self {
        QueryVariable::Wildcard(WildcardVariable::new(predicate))
    }

    pub fn get_name(&self) -> &str {
        match self {
            QueryVariable::Wildcard(_) => WILDCARD_NAME,
            QueryVariable::Named(var) => &var.name,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, QueryVariable::Wildcard(_))
    }

    pub fn is_bounded(&self) -> bool {
        match self {
            QueryVariable::Wildcard(_) => false,
            QueryVariable::Named(var) => var.bound.is_some(),
        }
    }

    /// Current candidates. Reading a named variable binds it.
    pub fn get_conditions(&mut self) -> &ConditionSet {
        match self {
            QueryVariable::Wildcard(var) => var.predicate.global_set(),
            QueryVariable::Named(var) => var.conditions_mut(),
        }
    }

    /// In-place access to a named variable's candidates. Wildcards have none.
    pub fn conditions_mut(&mut self) -> Option<&mut ConditionSet> {
        match self {
            QueryVariable::Wildcard(_) => None,
            QueryVariable::Named(var) => Some(var.conditions_mut()),
        }
    }

    /// Replaces the candidates of a named variable. No-op on wildcards.
    pub fn set_conditions(&mut self, conditions: ConditionSet) {
        if let QueryVariable::Named(var) = self {
            var.bound = Some(conditions);
        }
    }

    pub fn predicate(&self) -> &dyn SimplePredicate {
        match self {
            QueryVariable::Wildcard(var) => var.predicate.as_ref(),
            QueryVariable::Named(var) => var.predicate.as_ref(),
        }
    }

    /// Rebinds the domain supplier. An already bound set is kept as is.
    pub fn set_predicate(&mut self, predicate: PredicatePtr) {
        match self {
            QueryVariable::Wildcard(var) => var.predicate = predicate,
            QueryVariable::Named(var) => var.predicate = predicate,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        predicate::{PredicateFactory, PredicateTable, SimplePredicateFactory},
        test_utils::{classic_program, stmts},
    };

    fn table() -> Arc<dyn PredicateTable> {
        SimplePredicateFactory.make_predicates(classic_program())
    }

    #[test]
    fn test_named_variable_binds_on_first_read() {
        let program = classic_program();
        let table = table();
        let mut var = QueryVariable::new("a", table.get_predicate("assign").unwrap());
        assert!(!var.is_wildcard());
        assert!(!var.is_bounded());
        assert_eq!(var.get_name(), "a");
        if let QueryVariable::Named(named) = &var {
            assert_eq!(named.binding(), Binding::Unbound);
        }

        assert_eq!(var.get_conditions(), &stmts(&program, &[1, 5, 6, 7, 8]));
        assert!(var.is_bounded());
        if let QueryVariable::Named(named) = &var {
            assert_eq!(
                named.binding(),
                Binding::Bound(&stmts(&program, &[1, 5, 6, 7, 8]))
            );
        }

        var.conditions_mut()
            .unwrap()
            .retain(|c| c.as_statement() == program.statement_at(5).map(|s| s.id()));
        assert_eq!(var.get_conditions(), &stmts(&program, &[5]));
    }

    #[test]
    fn test_set_conditions_binds_and_sticks() {
        let program = classic_program();
        let table = table();
        let mut var = QueryVariable::named("s", table.get_predicate("stmt").unwrap());
        var.set_conditions(ConditionSet::new());
        assert!(var.is_bounded());
        assert!(var.get_conditions().is_empty());

        // A new predicate does not reseed a bound variable.
        var.set_predicate(table.get_predicate("while").unwrap());
        assert!(var.get_conditions().is_empty());
        assert_eq!(var.predicate().name(), "while");

        var.set_conditions(stmts(&program, &[2]));
        assert_eq!(var.get_conditions(), &stmts(&program, &[2]));
    }

    #[test]
    fn test_wildcard_ignores_narrowing() {
        let program = classic_program();
        let table = table();
        let mut var = QueryVariable::new("_", table.get_predicate("while").unwrap());
        assert!(var.is_wildcard());
        assert_eq!(var.get_name(), "_");

        var.set_conditions(ConditionSet::new());
        assert!(!var.is_bounded());
        assert!(var.conditions_mut().is_none());
        assert_eq!(var.get_conditions(), &stmts(&program, &[2]));

        var.set_predicate(table.get_predicate("if").unwrap());
        assert_eq!(var.get_conditions(), &stmts(&program, &[4]));
    }
}
