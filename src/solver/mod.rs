//! Relation solvers.
//!
//! Every relation answers three questions over [`Condition`]s through the
//! object-safe [`RelationSolver`] trait: all right arguments for a left one,
//! all left arguments for a right one, and whether a concrete pair holds.
//!
//! Relations are not written against `RelationSolver` directly. A relation
//! implements [`RelationHandlers`], which has one method per concrete
//! argument kind with an empty default, and the blanket implementation below
//! turns it into a solver. Statement arguments reach the per-kind handlers
//! through the visitors in [`dispatch`], so relation code never inspects
//! statement kinds itself.

pub mod dispatch;
mod effects;
pub mod error;
mod follows;
mod parent;
mod transitive;

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use log::debug;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

pub use effects::{Effect, EffectSolver};
pub use error::SolverError;
pub use follows::FollowsSolver;
pub use parent::ParentSolver;
pub use transitive::{FollowsStarSolver, ParentStarSolver};

use self::dispatch::{SolveLeftVisitor, SolveRightVisitor, ValidateVisitor};
use crate::{
    ast::{
        AssignmentRef, CallRef, ConditionalRef, ProcId, ProcRef, Program, SimpleVariable,
        StatementId, StatementRef, WhileRef,
    },
    condition::{Condition, ConditionSet},
    Params,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum RelationKind {
    #[strum(to_string = "Parent")]
    Parent,
    #[strum(to_string = "Parent*")]
    ParentStar,
    #[strum(to_string = "Follows")]
    Follows,
    #[strum(to_string = "Follows*")]
    FollowsStar,
    #[strum(to_string = "Modifies")]
    Modifies,
    #[strum(to_string = "Uses")]
    Uses,
}

/// A binary relation over program entities.
///
/// No match is an empty set or `false`. `Err` is reserved for programs whose
/// structure contradicts itself.
pub trait RelationSolver: Send + Sync + Debug {
    fn relation(&self) -> RelationKind;

    /// All `x` with `relation(left, x)`.
    fn solve_right(&self, left: &Condition) -> Result<ConditionSet, SolverError>;

    /// All `x` with `relation(x, right)`.
    fn solve_left(&self, right: &Condition) -> Result<ConditionSet, SolverError>;

    fn validate(&self, left: &Condition, right: &Condition) -> Result<bool, SolverError>;
}

/// Per argument kind handlers of one relation. Only the entries where the
/// relation can hold need to be written.
///
/// The `*_statement` methods are the entry points for statement arguments.
/// By default they resolve the statement kind with a visitor and call the
/// matching per-kind method; relations that treat every statement alike
/// override them instead.
pub trait RelationHandlers: Send + Sync + Debug {
    fn relation(&self) -> RelationKind;

    fn program(&self) -> &Program;

    fn solve_right_statement(&self, left: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        left.accept(&mut SolveRightVisitor::new(self))
    }

    fn solve_right_assignment(
        &self,
        _left: AssignmentRef<'_>,
    ) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_right_call(&self, _left: CallRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_right_conditional(
        &self,
        _left: ConditionalRef<'_>,
    ) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_right_while(&self, _left: WhileRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_right_procedure(&self, _left: ProcRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_right_variable(&self, _left: &SimpleVariable) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_left_statement(&self, right: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        right.accept(&mut SolveLeftVisitor::new(self))
    }

    fn solve_left_assignment(
        &self,
        _right: AssignmentRef<'_>,
    ) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_left_call(&self, _right: CallRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_left_conditional(
        &self,
        _right: ConditionalRef<'_>,
    ) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_left_while(&self, _right: WhileRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_left_procedure(&self, _right: ProcRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn solve_left_variable(&self, _right: &SimpleVariable) -> Result<ConditionSet, SolverError> {
        Ok(ConditionSet::new())
    }

    fn validate_statement(
        &self,
        left: StatementRef<'_>,
        right: &Condition,
    ) -> Result<bool, SolverError> {
        left.accept(&mut ValidateVisitor::new(self, right))
    }

    fn validate_assignment(
        &self,
        _left: AssignmentRef<'_>,
        _right: &Condition,
    ) -> Result<bool, SolverError> {
        Ok(false)
    }

    fn validate_call(&self, _left: CallRef<'_>, _right: &Condition) -> Result<bool, SolverError> {
        Ok(false)
    }

    fn validate_conditional(
        &self,
        _left: ConditionalRef<'_>,
        _right: &Condition,
    ) -> Result<bool, SolverError> {
        Ok(false)
    }

    fn validate_while(&self, _left: WhileRef<'_>, _right: &Condition) -> Result<bool, SolverError> {
        Ok(false)
    }

    fn validate_procedure(
        &self,
        _left: ProcRef<'_>,
        _right: &Condition,
    ) -> Result<bool, SolverError> {
        Ok(false)
    }

    fn validate_variable(
        &self,
        _left: &SimpleVariable,
        _right: &Condition,
    ) -> Result<bool, SolverError> {
        Ok(false)
    }
}

impl<H: RelationHandlers> RelationSolver for H {
    fn relation(&self) -> RelationKind {
        RelationHandlers::relation(self)
    }

    fn solve_right(&self, left: &Condition) -> Result<ConditionSet, SolverError> {
        let program = self.program();
        match left {
            Condition::Statement(id) => {
                self.solve_right_statement(resolve_statement(program, *id)?)
            }
            Condition::Procedure(id) => {
                self.solve_right_procedure(resolve_procedure(program, *id)?)
            }
            Condition::Variable(var) => self.solve_right_variable(var),
            Condition::Constant(_) => Ok(ConditionSet::new()),
        }
    }

    fn solve_left(&self, right: &Condition) -> Result<ConditionSet, SolverError> {
        let program = self.program();
        match right {
            Condition::Statement(id) => {
                self.solve_left_statement(resolve_statement(program, *id)?)
            }
            Condition::Procedure(id) => {
                self.solve_left_procedure(resolve_procedure(program, *id)?)
            }
            Condition::Variable(var) => self.solve_left_variable(var),
            Condition::Constant(_) => Ok(ConditionSet::new()),
        }
    }

    fn validate(&self, left: &Condition, right: &Condition) -> Result<bool, SolverError> {
        let program = self.program();
        match left {
            Condition::Statement(id) => {
                self.validate_statement(resolve_statement(program, *id)?, right)
            }
            Condition::Procedure(id) => {
                self.validate_procedure(resolve_procedure(program, *id)?, right)
            }
            Condition::Variable(var) => self.validate_variable(var, right),
            Condition::Constant(_) => Ok(false),
        }
    }
}

pub(crate) fn resolve_statement(
    program: &Program,
    id: StatementId,
) -> Result<StatementRef<'_>, SolverError> {
    program.statement(id).ok_or_else(|| {
        SolverError::InconsistentAst(format!("statement #{} is not in the program", id.index()))
    })
}

pub(crate) fn resolve_procedure(program: &Program, id: ProcId) -> Result<ProcRef<'_>, SolverError> {
    program.procedure(id).ok_or_else(|| {
        SolverError::InconsistentAst(format!("procedure #{} is not in the program", id.index()))
    })
}

/// The statement list starting at `first`, in order.
///
/// Fails if the list is longer than the whole program (a cycle), or, when
/// `check_parent_links` is set, if a member's parent link is not `container`.
pub(crate) fn body_chain<'a>(
    first: StatementRef<'a>,
    container: Option<StatementId>,
    check_parent_links: bool,
) -> Result<Vec<StatementRef<'a>>, SolverError> {
    let limit = first.program().statement_count();
    let mut chain = Vec::new();
    let mut current = Some(first);
    while let Some(stmt) = current {
        if chain.len() >= limit {
            return Err(SolverError::InconsistentAst(format!(
                "statement list starting at line {} does not terminate",
                first.line()
            )));
        }
        if check_parent_links && stmt.parent_id() != container {
            return Err(SolverError::InconsistentAst(format!(
                "line {} is listed under {} but links to {}",
                stmt.line(),
                describe_container(stmt.program(), container),
                describe_container(stmt.program(), stmt.parent_id()),
            )));
        }
        chain.push(stmt);
        current = stmt.next();
    }
    Ok(chain)
}

fn describe_container(program: &Program, container: Option<StatementId>) -> String {
    match container.and_then(|id| program.statement(id)) {
        Some(stmt) => format!("line {}", stmt.line()),
        None => "the procedure top level".to_string(),
    }
}

pub(crate) fn chain_set(chain: &[StatementRef<'_>]) -> ConditionSet {
    chain.iter().map(|stmt| Condition::from(stmt.id())).collect()
}

/// Every relation solver of one program, by kind.
#[derive(Debug)]
pub struct SolverTable {
    solvers: HashMap<RelationKind, Box<dyn RelationSolver>>,
}

impl SolverTable {
    pub fn get(&self, kind: RelationKind) -> Result<&dyn RelationSolver, SolverError> {
        self.solvers
            .get(&kind)
            .map(|solver| solver.as_ref())
            .ok_or_else(|| SolverError::UnknownRelation(kind.to_string()))
    }

    /// Looks a solver up by its relation name, e.g. `"Parent*"`.
    pub fn get_by_name(&self, name: &str) -> Result<&dyn RelationSolver, SolverError> {
        let kind: RelationKind = name
            .parse()
            .map_err(|_| SolverError::UnknownRelation(name.to_string()))?;
        self.get(kind)
    }
}

/// Builds a solver for every [`RelationKind`]. Modifies and Uses tables are
/// computed here, once per program.
pub fn make_solvers(ast: Arc<Program>, params: &Params) -> Result<SolverTable, SolverError> {
    let check = params.check_parent_links;
    let mut solvers: HashMap<RelationKind, Box<dyn RelationSolver>> = HashMap::new();
    for kind in RelationKind::iter() {
        let solver: Box<dyn RelationSolver> = match kind {
            RelationKind::Parent => Box::new(ParentSolver::new(ast.clone(), check)),
            RelationKind::ParentStar => Box::new(ParentStarSolver::new(ast.clone(), check)),
            RelationKind::Follows => Box::new(FollowsSolver::new(ast.clone())),
            RelationKind::FollowsStar => Box::new(FollowsStarSolver::new(ast.clone())),
            RelationKind::Modifies => {
                Box::new(EffectSolver::new(ast.clone(), Effect::Modifies, check)?)
            }
            RelationKind::Uses => Box::new(EffectSolver::new(ast.clone(), Effect::Uses, check)?),
        };
        solvers.insert(kind, solver);
    }
    debug!("Built {} relation solvers", solvers.len());
    Ok(SolverTable { solvers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::SimpleConstant,
        test_utils::{classic_program, init_logger, stmt},
    };

    #[test]
    fn test_relation_names() {
        assert_eq!(RelationKind::ParentStar.to_string(), "Parent*");
        assert_eq!("Follows*".parse::<RelationKind>().unwrap(), RelationKind::FollowsStar);
        assert!("Calls".parse::<RelationKind>().is_err());
    }

    #[test]
    fn test_solver_table_lookup() {
        init_logger();
        let program = classic_program();
        let solvers = make_solvers(program.clone(), &Params::default()).unwrap();
        for kind in RelationKind::iter() {
            assert_eq!(solvers.get(kind).unwrap().relation(), kind);
        }
        let parent = solvers.get_by_name("Parent").unwrap();
        assert!(parent
            .validate(&stmt(&program, 2), &stmt(&program, 3))
            .unwrap());
        assert_eq!(
            solvers.get_by_name("Calls*").unwrap_err(),
            SolverError::UnknownRelation("Calls*".to_string())
        );
    }

    #[test]
    fn test_unknown_statement_is_inconsistent() {
        let program = classic_program();
        let solvers = make_solvers(program, &Params::default()).unwrap();
        let bogus = Condition::Statement(StatementId(99));
        for kind in RelationKind::iter() {
            let solver = solvers.get(kind).unwrap();
            assert!(matches!(
                solver.solve_right(&bogus),
                Err(SolverError::InconsistentAst(_))
            ));
        }
    }

    #[test]
    fn test_constants_relate_to_nothing() {
        let program = classic_program();
        let solvers = make_solvers(program.clone(), &Params::default()).unwrap();
        let one = Condition::Constant(SimpleConstant::new(1));
        for kind in RelationKind::iter() {
            let solver = solvers.get(kind).unwrap();
            assert!(solver.solve_right(&one).unwrap().is_empty());
            assert!(solver.solve_left(&one).unwrap().is_empty());
            assert!(!solver.validate(&one, &stmt(&program, 1)).unwrap());
        }
    }
}
