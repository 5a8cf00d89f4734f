//! Modifies and Uses.
//!
//! Both relations are answered from a table computed once per program. A
//! statement's variables are its own plus those of everything nested in it;
//! a call contributes the variables of the called procedure. Procedure sets
//! are iterated to a fixpoint, so recursive call graphs are fine.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use log::{debug, trace};
use strum_macros::Display;

use super::{body_chain, RelationHandlers, RelationKind, SolverError};
use crate::{
    ast::{
        AssignmentRef, CallRef, ConditionalRef, ContainerVisitor, ProcId, ProcRef, Program,
        SimpleVariable, StatementId, StatementRef, StatementVisitor, WhileRef,
    },
    condition::{Condition, ConditionSet},
};

type VarSet = BTreeSet<SimpleVariable>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Effect {
    Modifies,
    Uses,
}

impl Effect {
    fn relation(self) -> RelationKind {
        match self {
            Effect::Modifies => RelationKind::Modifies,
            Effect::Uses => RelationKind::Uses,
        }
    }
}

/// Variables touched by every statement and procedure of a program.
#[derive(Debug, Default)]
struct EffectTable {
    statements: HashMap<StatementId, VarSet>,
    procedures: HashMap<ProcId, VarSet>,
}

impl EffectTable {
    fn compute(
        program: &Program,
        effect: Effect,
        check_parent_links: bool,
    ) -> Result<Self, SolverError> {
        let mut procedures: HashMap<ProcId, VarSet> = HashMap::new();
        let mut statements = HashMap::new();
        let mut iteration = 0;
        loop {
            iteration += 1;
            let mut updates = Vec::new();
            for proc in program.procedures() {
                let mut collector = EffectCollector {
                    effect,
                    procedures: &procedures,
                    statements: &mut statements,
                    check_parent_links,
                };
                let vars = collector.list(proc.first_statement(), None)?;
                if procedures.get(&proc.id()) != Some(&vars) {
                    trace!("{} of {} grew to {:?}", effect, proc.name(), vars);
                    updates.push((proc.id(), vars));
                }
            }
            if updates.is_empty() {
                break;
            }
            procedures.extend(updates);
        }
        debug!("{} table reached a fixpoint after {} iterations", effect, iteration);
        Ok(Self {
            statements,
            procedures,
        })
    }
}

struct EffectCollector<'t> {
    effect: Effect,
    procedures: &'t HashMap<ProcId, VarSet>,
    statements: &'t mut HashMap<StatementId, VarSet>,
    check_parent_links: bool,
}

impl EffectCollector<'_> {
    /// Collects every statement of a list, recording each one on the way.
    fn list(
        &mut self,
        first: StatementRef<'_>,
        container: Option<StatementId>,
    ) -> Result<VarSet, SolverError> {
        let mut vars = VarSet::new();
        for stmt in body_chain(first, container, self.check_parent_links)? {
            let own = stmt.accept(self)?;
            vars.extend(own.iter().cloned());
            self.statements.insert(stmt.id(), own);
        }
        Ok(vars)
    }

    fn container(
        &mut self,
        id: StatementId,
        condition: &SimpleVariable,
        bodies: Vec<StatementRef<'_>>,
    ) -> Result<VarSet, SolverError> {
        let mut vars = VarSet::new();
        if self.effect == Effect::Uses {
            vars.insert(condition.clone());
        }
        for body in bodies {
            vars.extend(self.list(body, Some(id))?);
        }
        Ok(vars)
    }
}

impl<'a> ContainerVisitor<'a> for EffectCollector<'_> {
    type Output = Result<VarSet, SolverError>;

    fn visit_conditional(&mut self, stmt: ConditionalRef<'a>) -> Self::Output {
        self.container(
            stmt.id(),
            stmt.variable(),
            vec![stmt.then_branch(), stmt.else_branch()],
        )
    }

    fn visit_while(&mut self, stmt: WhileRef<'a>) -> Self::Output {
        self.container(stmt.id(), stmt.variable(), vec![stmt.body()])
    }
}

impl<'a> StatementVisitor<'a> for EffectCollector<'_> {
    fn visit_assignment(&mut self, stmt: AssignmentRef<'a>) -> Self::Output {
        Ok(match self.effect {
            Effect::Modifies => VarSet::from([stmt.variable().clone()]),
            Effect::Uses => stmt.expr().variables(),
        })
    }

    fn visit_call(&mut self, stmt: CallRef<'a>) -> Self::Output {
        Ok(self
            .procedures
            .get(&stmt.callee().id())
            .cloned()
            .unwrap_or_default())
    }
}

/// Modifies or Uses, depending on the [`Effect`] it was built for. Left
/// arguments are statements or procedures, right arguments are variables.
#[derive(Debug)]
pub struct EffectSolver {
    ast: Arc<Program>,
    effect: Effect,
    table: EffectTable,
}

impl EffectSolver {
    pub fn new(
        ast: Arc<Program>,
        effect: Effect,
        check_parent_links: bool,
    ) -> Result<Self, SolverError> {
        let table = EffectTable::compute(&ast, effect, check_parent_links)?;
        Ok(Self { ast, effect, table })
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    fn statement_vars(&self, id: StatementId) -> Result<&VarSet, SolverError> {
        self.table.statements.get(&id).ok_or_else(|| {
            SolverError::InconsistentAst(format!(
                "statement #{} is not reachable from any procedure",
                id.index()
            ))
        })
    }

    fn procedure_vars(&self, id: ProcId) -> Result<&VarSet, SolverError> {
        self.table.procedures.get(&id).ok_or_else(|| {
            SolverError::InconsistentAst(format!(
                "procedure #{} has no {} entry",
                id.index(),
                self.effect
            ))
        })
    }
}

fn as_conditions(vars: &VarSet) -> ConditionSet {
    vars.iter().cloned().map(Condition::from).collect()
}

fn holds(vars: &VarSet, right: &Condition) -> bool {
    right.as_variable().is_some_and(|var| vars.contains(var))
}

impl RelationHandlers for EffectSolver {
    fn relation(&self) -> RelationKind {
        self.effect.relation()
    }

    fn program(&self) -> &Program {
        &self.ast
    }

    fn solve_right_statement(&self, left: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(as_conditions(self.statement_vars(left.id())?))
    }

    fn solve_right_procedure(&self, left: ProcRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(as_conditions(self.procedure_vars(left.id())?))
    }

    fn solve_left_variable(&self, right: &SimpleVariable) -> Result<ConditionSet, SolverError> {
        let statements = self
            .table
            .statements
            .iter()
            .filter(|(_, vars)| vars.contains(right))
            .map(|(id, _)| Condition::from(*id));
        let procedures = self
            .table
            .procedures
            .iter()
            .filter(|(_, vars)| vars.contains(right))
            .map(|(id, _)| Condition::from(*id));
        Ok(statements.chain(procedures).collect())
    }

    fn validate_statement(
        &self,
        left: StatementRef<'_>,
        right: &Condition,
    ) -> Result<bool, SolverError> {
        Ok(holds(self.statement_vars(left.id())?, right))
    }

    fn validate_procedure(
        &self,
        left: ProcRef<'_>,
        right: &Condition,
    ) -> Result<bool, SolverError> {
        Ok(holds(self.procedure_vars(left.id())?, right))
    }
}
