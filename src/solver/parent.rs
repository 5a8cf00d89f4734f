use std::sync::Arc;

use super::{
    body_chain, chain_set, resolve_statement, RelationHandlers, RelationKind, SolverError,
};
use crate::{
    ast::{ConditionalRef, Program, StatementId, StatementRef, WhileRef},
    condition::{Condition, ConditionSet},
};

/// `Parent(c, s)`: `s` is directly in one of the bodies of container `c`.
#[derive(Debug)]
pub struct ParentSolver {
    ast: Arc<Program>,
    check_parent_links: bool,
}

impl ParentSolver {
    pub fn new(ast: Arc<Program>, check_parent_links: bool) -> Self {
        Self {
            ast,
            check_parent_links,
        }
    }

    fn children(
        &self,
        first: StatementRef<'_>,
        container: StatementId,
    ) -> Result<ConditionSet, SolverError> {
        let chain = body_chain(first, Some(container), self.check_parent_links)?;
        Ok(chain_set(&chain))
    }

    fn is_child(&self, container: StatementId, right: &Condition) -> Result<bool, SolverError> {
        let Some(id) = right.as_statement() else {
            return Ok(false);
        };
        let stmt = resolve_statement(&self.ast, id)?;
        Ok(stmt.parent_id() == Some(container))
    }
}

impl RelationHandlers for ParentSolver {
    fn relation(&self) -> RelationKind {
        RelationKind::Parent
    }

    fn program(&self) -> &Program {
        &self.ast
    }

    fn solve_right_while(&self, left: WhileRef<'_>) -> Result<ConditionSet, SolverError> {
        self.children(left.body(), left.id())
    }

    fn solve_right_conditional(
        &self,
        left: ConditionalRef<'_>,
    ) -> Result<ConditionSet, SolverError> {
        let mut result = self.children(left.then_branch(), left.id())?;
        result.union_with(&self.children(left.else_branch(), left.id())?);
        Ok(result)
    }

    fn solve_left_statement(&self, right: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        let mut result = ConditionSet::new();
        if let Some(parent) = right.parent_id() {
            result.insert(parent);
        }
        Ok(result)
    }

    fn validate_while(&self, left: WhileRef<'_>, right: &Condition) -> Result<bool, SolverError> {
        self.is_child(left.id(), right)
    }

    fn validate_conditional(
        &self,
        left: ConditionalRef<'_>,
        right: &Condition,
    ) -> Result<bool, SolverError> {
        self.is_child(left.id(), right)
    }
}
