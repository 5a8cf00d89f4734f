//! Visitors that route a statement argument to the matching
//! [`RelationHandlers`] entry.
//!
//! Each visitor resolves one statement kind and nothing else. The three of
//! them back the default `solve_right_statement`, `solve_left_statement` and
//! `validate_statement` handlers.

use super::{RelationHandlers, SolverError};
use crate::{
    ast::{AssignmentRef, CallRef, ConditionalRef, ContainerVisitor, StatementVisitor, WhileRef},
    condition::{Condition, ConditionSet},
};

pub struct SolveRightVisitor<'h, H: ?Sized> {
    handlers: &'h H,
}

impl<'h, H: RelationHandlers + ?Sized> SolveRightVisitor<'h, H> {
    pub fn new(handlers: &'h H) -> Self {
        Self { handlers }
    }
}

impl<'a, H: RelationHandlers + ?Sized> ContainerVisitor<'a> for SolveRightVisitor<'_, H> {
    type Output = Result<ConditionSet, SolverError>;

    fn visit_conditional(&mut self, stmt: ConditionalRef<'a>) -> Self::Output {
        self.handlers.solve_right_conditional(stmt)
    }

    fn visit_while(&mut self, stmt: WhileRef<'a>) -> Self::Output {
        self.handlers.solve_right_while(stmt)
    }
}

impl<'a, H: RelationHandlers + ?Sized> StatementVisitor<'a> for SolveRightVisitor<'_, H> {
    fn visit_assignment(&mut self, stmt: AssignmentRef<'a>) -> Self::Output {
        self.handlers.solve_right_assignment(stmt)
    }

    fn visit_call(&mut self, stmt: CallRef<'a>) -> Self::Output {
        self.handlers.solve_right_call(stmt)
    }
}

pub struct SolveLeftVisitor<'h, H: ?Sized> {
    handlers: &'h H,
}

impl<'h, H: RelationHandlers + ?Sized> SolveLeftVisitor<'h, H> {
    pub fn new(handlers: &'h H) -> Self {
        Self { handlers }
    }
}

impl<'a, H: RelationHandlers + ?Sized> ContainerVisitor<'a> for SolveLeftVisitor<'_, H> {
    type Output = Result<ConditionSet, SolverError>;

    fn visit_conditional(&mut self, stmt: ConditionalRef<'a>) -> Self::Output {
        self.handlers.solve_left_conditional(stmt)
    }

    fn visit_while(&mut self, stmt: WhileRef<'a>) -> Self::Output {
        self.handlers.solve_left_while(stmt)
    }
}

impl<'a, H: RelationHandlers + ?Sized> StatementVisitor<'a> for SolveLeftVisitor<'_, H> {
    fn visit_assignment(&mut self, stmt: AssignmentRef<'a>) -> Self::Output {
        self.handlers.solve_left_assignment(stmt)
    }

    fn visit_call(&mut self, stmt: CallRef<'a>) -> Self::Output {
        self.handlers.solve_left_call(stmt)
    }
}

/// Dispatches on the kind of the left argument; the right one is passed
/// through untouched.
pub struct ValidateVisitor<'h, 'r, H: ?Sized> {
    handlers: &'h H,
    right: &'r Condition,
}

impl<'h, 'r, H: RelationHandlers + ?Sized> ValidateVisitor<'h, 'r, H> {
    pub fn new(handlers: &'h H, right: &'r Condition) -> Self {
        Self { handlers, right }
    }
}

impl<'a, H: RelationHandlers + ?Sized> ContainerVisitor<'a> for ValidateVisitor<'_, '_, H> {
    type Output = Result<bool, SolverError>;

    fn visit_conditional(&mut self, stmt: ConditionalRef<'a>) -> Self::Output {
        self.handlers.validate_conditional(stmt, self.right)
    }

    fn visit_while(&mut self, stmt: WhileRef<'a>) -> Self::Output {
        self.handlers.validate_while(stmt, self.right)
    }
}

impl<'a, H: RelationHandlers + ?Sized> StatementVisitor<'a> for ValidateVisitor<'_, '_, H> {
    fn visit_assignment(&mut self, stmt: AssignmentRef<'a>) -> Self::Output {
        self.handlers.validate_assignment(stmt, self.right)
    }

    fn visit_call(&mut self, stmt: CallRef<'a>) -> Self::Output {
        self.handlers.validate_call(stmt, self.right)
    }
}
