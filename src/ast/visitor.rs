//! Kind resolution for statements and expressions.
//!
//! A visitor is the only place where "is this a While or a Conditional" gets
//! answered. Code that needs per-kind behaviour implements one of these
//! traits and hands itself to `StatementRef::accept`,
//! `ContainerRef::accept` or `Expr::accept`.

use super::{
    AssignmentRef, BinaryOperator, CallRef, ConditionalRef, Expr, SimpleConstant,
    SimpleVariable, WhileRef,
};

/// Handlers for the two container kinds.
pub trait ContainerVisitor<'a> {
    type Output;

    fn visit_conditional(&mut self, stmt: ConditionalRef<'a>) -> Self::Output;
    fn visit_while(&mut self, stmt: WhileRef<'a>) -> Self::Output;
}

/// Handlers for every statement kind. The container kinds come from the
/// `ContainerVisitor` supertrait, so a statement visitor can also be used
/// where only containers are dispatched.
pub trait StatementVisitor<'a>: ContainerVisitor<'a> {
    fn visit_assignment(&mut self, stmt: AssignmentRef<'a>) -> Self::Output;
    fn visit_call(&mut self, stmt: CallRef<'a>) -> Self::Output;
}

pub trait ExprVisitor<'e> {
    type Output;

    fn visit_variable(&mut self, var: &'e SimpleVariable) -> Self::Output;
    fn visit_constant(&mut self, constant: SimpleConstant) -> Self::Output;
    fn visit_binary_op(
        &mut self,
        op: BinaryOperator,
        lhs: &'e Expr,
        rhs: &'e Expr,
    ) -> Self::Output;
}
