//! Relation arguments and sets of them.

use std::{
    collections::{hash_set, HashSet},
    fmt,
};

use itertools::Itertools;

use crate::ast::{ProcId, Program, SimpleConstant, SimpleVariable, StatementId};

/// A single relation argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    Statement(StatementId),
    Procedure(ProcId),
    Variable(SimpleVariable),
    Constant(SimpleConstant),
}

impl Condition {
    pub fn as_statement(&self) -> Option<StatementId> {
        match self {
            Condition::Statement(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_procedure(&self) -> Option<ProcId> {
        match self {
            Condition::Procedure(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&SimpleVariable> {
        match self {
            Condition::Variable(var) => Some(var),
            _ => None,
        }
    }

    /// Human readable form resolved against `program`: line numbers for
    /// statements, names for procedures.
    pub fn describe(&self, program: &Program) -> String {
        match self {
            Condition::Statement(id) => match program.statement(*id) {
                Some(stmt) => format!("line {}", stmt.line()),
                None => format!("stmt #{}", id.index()),
            },
            Condition::Procedure(id) => match program.procedure(*id) {
                Some(proc) => format!("proc {}", proc.name()),
                None => format!("proc #{}", id.index()),
            },
            Condition::Variable(var) => format!("var {}", var),
            Condition::Constant(constant) => format!("const {}", constant),
        }
    }
}

impl From<StatementId> for Condition {
    fn from(id: StatementId) -> Self {
        Condition::Statement(id)
    }
}

impl From<ProcId> for Condition {
    fn from(id: ProcId) -> Self {
        Condition::Procedure(id)
    }
}

impl From<SimpleVariable> for Condition {
    fn from(var: SimpleVariable) -> Self {
        Condition::Variable(var)
    }
}

impl From<SimpleConstant> for Condition {
    fn from(constant: SimpleConstant) -> Self {
        Condition::Constant(constant)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Statement(id) => write!(f, "stmt#{}", id.index()),
            Condition::Procedure(id) => write!(f, "proc#{}", id.index()),
            Condition::Variable(var) => write!(f, "{}", var),
            Condition::Constant(constant) => write!(f, "{}", constant),
        }
    }
}

/// Unordered set of relation arguments. Equality is set equality.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionSet(HashSet<Condition>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the condition was not present.
    pub fn insert(&mut self, condition: impl Into<Condition>) -> bool {
        self.0.insert(condition.into())
    }

    pub fn contains(&self, condition: &Condition) -> bool {
        self.0.contains(condition)
    }

    pub fn remove(&mut self, condition: &Condition) -> bool {
        self.0.remove(condition)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, Condition> {
        self.0.iter()
    }

    pub fn retain(&mut self, f: impl FnMut(&Condition) -> bool) {
        self.0.retain(f)
    }

    pub fn union_with(&mut self, other: &ConditionSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn intersect_with(&mut self, other: &ConditionSet) {
        self.0.retain(|c| other.0.contains(c));
    }

    /// Members in a deterministic order, for diagnostics and assertions.
    pub fn sorted(&self) -> Vec<Condition> {
        self.0.iter().cloned().sorted().collect()
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.sorted().iter().join(", "))
    }
}

impl FromIterator<Condition> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Condition> for ConditionSet {
    fn extend<I: IntoIterator<Item = Condition>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for ConditionSet {
    type Item = Condition;
    type IntoIter = hash_set::IntoIter<Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'s> IntoIterator for &'s ConditionSet {
    type Item = &'s Condition;
    type IntoIter = hash_set::Iter<'s, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<const N: usize> From<[Condition; N]> for ConditionSet {
    fn from(conditions: [Condition; N]) -> Self {
        Self(HashSet::from(conditions))
    }
}
