use std::{
    collections::HashMap,
    str::FromStr,
    sync::{Arc, OnceLock},
};

use log::debug;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::{PredicateFactory, PredicatePtr, PredicateTable, SimplePredicate};
use crate::{
    ast::{
        AssignmentRef, CallRef, ConditionalRef, ContainerVisitor, Program, StatementVisitor,
        WhileRef,
    },
    condition::{Condition, ConditionSet},
    solver::SolverError,
};

/// Design entities a query variable can range over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum EntityKind {
    #[strum(to_string = "stmt", serialize = "prog_line")]
    Stmt,
    #[strum(to_string = "assign")]
    Assign,
    #[strum(to_string = "call")]
    Call,
    #[strum(to_string = "while")]
    While,
    #[strum(to_string = "if")]
    If,
    #[strum(to_string = "variable")]
    Variable,
    #[strum(to_string = "procedure")]
    Procedure,
    #[strum(to_string = "constant")]
    Constant,
}

struct StatementEntity;

impl<'a> ContainerVisitor<'a> for StatementEntity {
    type Output = EntityKind;

    fn visit_conditional(&mut self, _stmt: ConditionalRef<'a>) -> EntityKind {
        EntityKind::If
    }

    fn visit_while(&mut self, _stmt: WhileRef<'a>) -> EntityKind {
        EntityKind::While
    }
}

impl<'a> StatementVisitor<'a> for StatementEntity {
    fn visit_assignment(&mut self, _stmt: AssignmentRef<'a>) -> EntityKind {
        EntityKind::Assign
    }

    fn visit_call(&mut self, _stmt: CallRef<'a>) -> EntityKind {
        EntityKind::Call
    }
}

/// Predicate over one [`EntityKind`] of a program.
#[derive(Debug)]
pub struct EntityPredicate {
    kind: EntityKind,
    name: String,
    ast: Arc<Program>,
    global: OnceLock<ConditionSet>,
}

impl EntityPredicate {
    pub fn new(kind: EntityKind, ast: Arc<Program>) -> Self {
        Self {
            kind,
            name: kind.to_string(),
            ast,
            global: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    fn compute(&self) -> ConditionSet {
        let ast = &self.ast;
        let set: ConditionSet = match self.kind {
            EntityKind::Stmt => ast.statements().map(|s| Condition::from(s.id())).collect(),
            EntityKind::Assign | EntityKind::Call | EntityKind::While | EntityKind::If => ast
                .statements()
                .filter(|s| s.accept(&mut StatementEntity) == self.kind)
                .map(|s| Condition::from(s.id()))
                .collect(),
            EntityKind::Variable => ast.variables().into_iter().map(Condition::from).collect(),
            EntityKind::Procedure => ast.procedures().map(|p| Condition::from(p.id())).collect(),
            EntityKind::Constant => ast.constants().into_iter().map(Condition::from).collect(),
        };
        debug!("Global set of '{}' has {} members", self.name, set.len());
        set
    }
}

impl SimplePredicate for EntityPredicate {
    fn name(&self) -> &str {
        &self.name
    }

    fn global_set(&self) -> &ConditionSet {
        self.global.get_or_init(|| self.compute())
    }
}

/// One [`EntityPredicate`] per entity kind, shared by every query over the
/// same program.
#[derive(Debug)]
pub struct SimplePredicateTable {
    predicates: HashMap<EntityKind, PredicatePtr>,
}

impl SimplePredicateTable {
    pub fn new(ast: Arc<Program>) -> Self {
        let predicates = EntityKind::iter()
            .map(|kind| {
                let predicate: PredicatePtr = Arc::new(EntityPredicate::new(kind, ast.clone()));
                (kind, predicate)
            })
            .collect();
        Self { predicates }
    }
}

impl PredicateTable for SimplePredicateTable {
    fn get_predicate(&self, name: &str) -> Result<PredicatePtr, SolverError> {
        EntityKind::from_str(name)
            .ok()
            .and_then(|kind| self.predicates.get(&kind))
            .cloned()
            .ok_or_else(|| SolverError::UnknownPredicate(name.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct SimplePredicateFactory;

impl PredicateFactory for SimplePredicateFactory {
    fn make_predicates(&self, ast: Arc<Program>) -> Arc<dyn PredicateTable> {
        Arc::new(SimplePredicateTable::new(ast))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        ast::{SimpleConstant, SimpleVariable},
        test_utils::{classic_program, stmts},
    };

    fn table() -> (Arc<Program>, Arc<dyn PredicateTable>) {
        let program = classic_program();
        let table = SimplePredicateFactory.make_predicates(program.clone());
        (program, table)
    }

    #[test]
    fn test_statement_entities() {
        let (program, table) = table();
        let global = |name: &str| table.get_predicate(name).unwrap().global_set().clone();

        assert_eq!(global("stmt"), stmts(&program, &[1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(global("prog_line"), global("stmt"));
        assert_eq!(global("assign"), stmts(&program, &[1, 5, 6, 7, 8]));
        assert_eq!(global("call"), stmts(&program, &[3]));
        assert_eq!(global("while"), stmts(&program, &[2]));
        assert_eq!(global("if"), stmts(&program, &[4]));
    }

    #[test]
    fn test_name_entities() {
        let (program, table) = table();
        let variables = table.get_predicate("variable").unwrap();
        assert_eq!(variables.global_set().len(), 8);
        assert!(variables
            .global_set()
            .contains(&Condition::Variable(SimpleVariable::new("z"))));

        let constants = table.get_predicate("constant").unwrap();
        assert_eq!(
            constants.global_set().sorted(),
            (1..=4)
                .map(|v| Condition::Constant(SimpleConstant::new(v)))
                .collect::<Vec<_>>()
        );

        let procedures = table.get_predicate("procedure").unwrap();
        assert_eq!(procedures.global_set().len(), program.procedure_count());
    }

    #[test]
    fn test_global_set_is_memoized() {
        let (_, table) = table();
        let predicate = table.get_predicate("assign").unwrap();
        let first: *const ConditionSet = predicate.global_set();
        let second: *const ConditionSet = predicate.global_set();
        assert!(std::ptr::eq(first, second));
        assert!(Arc::ptr_eq(
            &predicate,
            &table.get_predicate("assign").unwrap()
        ));
    }

    #[test]
    fn test_filter_set_drops_other_kinds() {
        let (program, table) = table();
        let predicate = table.get_predicate("while").unwrap();
        let mut set = stmts(&program, &[1, 2, 3]);
        set.insert(SimpleVariable::new("x"));
        predicate.filter_set(&mut set);
        assert_eq!(set, stmts(&program, &[2]));
    }

    #[test]
    fn test_unknown_predicate() {
        let (_, table) = table();
        assert_eq!(
            table.get_predicate("stmtLst").unwrap_err(),
            SolverError::UnknownPredicate("stmtLst".to_string())
        );
    }
}
