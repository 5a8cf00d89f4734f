use std::sync::Arc;

use super::{RelationHandlers, RelationKind, SolverError};
use crate::{
    ast::{Program, StatementRef},
    condition::{Condition, ConditionSet},
};

/// `Follows(s1, s2)`: `s2` comes right after `s1` in the same statement list.
#[derive(Debug)]
pub struct FollowsSolver {
    ast: Arc<Program>,
}

impl FollowsSolver {
    pub fn new(ast: Arc<Program>) -> Self {
        Self { ast }
    }
}

impl RelationHandlers for FollowsSolver {
    fn relation(&self) -> RelationKind {
        RelationKind::Follows
    }

    fn program(&self) -> &Program {
        &self.ast
    }

    fn solve_right_statement(&self, left: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(left.next_id().into_iter().map(Condition::from).collect())
    }

    fn solve_left_statement(&self, right: StatementRef<'_>) -> Result<ConditionSet, SolverError> {
        Ok(right.prev_id().into_iter().map(Condition::from).collect())
    }

    fn validate_statement(
        &self,
        left: StatementRef<'_>,
        right: &Condition,
    ) -> Result<bool, SolverError> {
        Ok(right.as_statement().is_some() && right.as_statement() == left.next_id())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        solver::RelationSolver,
        test_utils::{classic_program, stmt, stmts, var},
    };

    #[test]
    fn test_follows_across_containers() {
        let program = classic_program();
        let follows = FollowsSolver::new(program.clone());

        // a = 1 ; while ; b = 4 at the top of test1
        assert_eq!(
            follows.solve_right(&stmt(&program, 1)).unwrap(),
            stmts(&program, &[2])
        );
        assert_eq!(
            follows.solve_right(&stmt(&program, 2)).unwrap(),
            stmts(&program, &[7])
        );
        assert_eq!(
            follows.solve_left(&stmt(&program, 7)).unwrap(),
            stmts(&program, &[2])
        );
        // call ; if inside the loop body
        assert!(follows.validate(&stmt(&program, 3), &stmt(&program, 4)).unwrap());
        // then and else branches are separate lists
        assert!(!follows.validate(&stmt(&program, 5), &stmt(&program, 6)).unwrap());
        assert!(follows.solve_right(&stmt(&program, 5)).unwrap().is_empty());
        assert!(follows.solve_left(&stmt(&program, 1)).unwrap().is_empty());
        // nested statement does not follow the container
        assert!(!follows.validate(&stmt(&program, 2), &stmt(&program, 3)).unwrap());
    }

    #[test]
    fn test_follows_ignores_non_statements() {
        let program = classic_program();
        let follows = FollowsSolver::new(program.clone());
        assert!(follows.solve_right(&var("a")).unwrap().is_empty());
        assert!(!follows.validate(&stmt(&program, 7), &var("b")).unwrap());
    }
}
