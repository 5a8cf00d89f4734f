//! Transitive closures of Parent and Follows.

use std::sync::Arc;

use super::{body_chain, resolve_statement, RelationHandlers, RelationKind, SolverError};
use crate::{
    ast::{ConditionalRef, ContainerRef, Program, StatementId, StatementRef, WhileRef},
    condition::{Condition, ConditionSet},
};

/// Follows `step` from `start` until it yields nothing. A statement seen
/// twice means the links loop.
fn walk<'a>(
    start: Option<StatementRef<'a>>,
    step: impl Fn(&StatementRef<'a>) -> Option<StatementRef<'a>>,
    link: &str,
) -> Result<Vec<StatementRef<'a>>, SolverError> {
    let mut seen = ConditionSet::new();
    let mut visited = Vec::new();
    let mut current = start;
    while let Some(stmt) = current {
        if !seen.insert(stmt.id()) {
            return Err(SolverError::InconsistentAst(format!(
                "{} links loop back to line {}",
                link,
                stmt.line()
            )));
        }
        current = step(&stmt);
        visited.push(stmt);
    }
    Ok(visited)
}

/// `Parent*(c, s)`: `s` is nested, at any depth, in container `c`.
#[derive(Debug)]
pub struct ParentStarSolver {
    ast: Arc<Program>,
    check_parent_links: bool,
}

impl ParentStarSolver {
    pub fn new(ast: Arc<Program>, check_parent_links: bool) -> Self {
        Self {
            ast,
            check_parent_links,
        }
    }

    fn descendants(&self, container: ContainerRef<'_>) -> Result<ConditionSet, SolverError> {
        let owner = container.statement().id();
        let mut result = ConditionSet::new();
        let mut pending: Vec<(StatementRef<'_>, StatementId)> = container
            .bodies()
            .into_iter()
            .map(|first| (first, owner))
            .collect();
        while let Some((first, owner)) = pending.pop() {
            for stmt in body_chain(first, Some(owner), self.check_parent_links)? {
                if !result.insert(stmt.id()) {
                    return Err(SolverError::InconsistentAst(format!(
                        "line {} is nested in more than one body",
                        stmt.line()
                    )));
                }
                if let Some(inner) = stmt.as_container() {
                    pending.extend(inner.bodies().into_iter().map(|first| (first, stmt.id())));
                }
            }
        }
        Ok(result)
    }

    fn is_descendant(
        &self,
        container: StatementId,
        right: &Condition,
    ) -> Result<bool, SolverError> {
        let Some(id) = right.as_statement() else {
            return Ok(false);
        };
        let stmt = resolve_statement(&self.ast, id)?;
        let ancestors = walk(stmt.parent(), |s| s.parent(), "parent")?;
        Ok(ancestors.iter().any(|ancestor| ancestor.id() == container))
    }
}

impl RelationHandlers for ParentStarSolver {
    fn relation(&self) -> RelationKind {
        RelationKind::ParentStar
    }

    fn program(&self) -> &Program {
        &self.ast
    }

    fn solve_right_while(&self, left: WhileRef<'_>) -> Result<ConditionSet, SolverError> {
        self.descendants(ContainerRef::While(left))
    }

    fn solve_right_conditional(
        &self,
        left: ConditionalRef<'_>,
    ) -> Result<ConditionSet, SolverError> {
        self.descendants(ContainerRef::Conditional(left))
    }

    fn solve_left_statement(&self, right: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        let ancestors = walk(right.parent(), |s| s.parent(), "parent")?;
        Ok(ancestors.iter().map(|s| Condition::from(s.id())).collect())
    }

    fn validate_while(&self, left: WhileRef<'_>, right: &Condition) -> Result<bool, SolverError> {
        self.is_descendant(left.id(), right)
    }

    fn validate_conditional(
        &self,
        left: ConditionalRef<'_>,
        right: &Condition,
    ) -> Result<bool, SolverError> {
        self.is_descendant(left.id(), right)
    }
}

/// `Follows*(s1, s2)`: `s2` comes after `s1`, not necessarily right after, in
/// the same statement list.
#[derive(Debug)]
pub struct FollowsStarSolver {
    ast: Arc<Program>,
}

impl FollowsStarSolver {
    pub fn new(ast: Arc<Program>) -> Self {
        Self { ast }
    }
}

impl RelationHandlers for FollowsStarSolver {
    fn relation(&self) -> RelationKind {
        RelationKind::FollowsStar
    }

    fn program(&self) -> &Program {
        &self.ast
    }

    fn solve_right_statement(&self, left: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        let after = walk(left.next(), |s| s.next(), "next")?;
        Ok(after.iter().map(|s| Condition::from(s.id())).collect())
    }

    fn solve_left_statement(&self, right: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        let before = walk(right.prev(), |s| s.prev(), "prev")?;
        Ok(before.iter().map(|s| Condition::from(s.id())).collect())
    }

    fn validate_statement(
        &self,
        left: StatementRef<'_>,
        right: &Condition,
    ) -> Result<bool, SolverError> {
        let Some(id) = right.as_statement() else {
            return Ok(false);
        };
        let after = walk(left.next(), |s| s.next(), "next")?;
        Ok(after.iter().any(|s| s.id() == id))
    }
}
