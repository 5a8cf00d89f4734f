//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::{
    ast::{BinaryOperator, Expr, Program, ProgramBuilder, SimpleVariable, StatementRef},
    condition::{Condition, ConditionSet},
    Params,
};

/// Source of [`classic_program`]. Lines:
///
/// 1 `a = 1`, 2 `while i`, 3 `call test2`, 4 `if j`, 5 `x = (x+y)*(3+z)`,
/// 6 `y = 2`, 7 `b = 4`, 8 `c = 3`.
pub const CLASSIC_SOURCE: &str = "
proc test1 {
    a = 1;
    while i {
        call test2;
        if j then {
            x = (x + y) * (3 + z);
        } else {
            y = 2;
        }
    }
    b = 4;
}
proc test2 {
    c = 3;
}
";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// [`CLASSIC_SOURCE`], assembled with the builder so tests of the parser
/// have something independent to compare against.
pub fn classic_program() -> Arc<Program> {
    build_classic().expect("classic program is well formed")
}

fn build_classic() -> Result<Arc<Program>, crate::ast::AstError> {
    let var = |name: &str| SimpleVariable::new(name);
    let mut b = ProgramBuilder::new(&Params::default());
    let test1 = b.procedure("test1");
    let test2 = b.procedure("test2");

    let a = b.assignment(var("a"), Expr::constant(1))?;
    let loop_stmt = b.while_loop(var("i"))?;
    let call = b.call(test2)?;
    let cond = b.conditional(var("j"))?;
    let x = b.assignment(
        var("x"),
        Expr::binary(
            BinaryOperator::Times,
            Expr::binary(BinaryOperator::Plus, Expr::variable("x"), Expr::variable("y")),
            Expr::binary(BinaryOperator::Plus, Expr::constant(3), Expr::variable("z")),
        ),
    )?;
    let y = b.assignment(var("y"), Expr::constant(2))?;
    let b4 = b.assignment(var("b"), Expr::constant(4))?;
    let c = b.assignment(var("c"), Expr::constant(3))?;

    b.set_proc_body(a, test1)?;
    b.set_next(a, loop_stmt)?;
    b.set_next(loop_stmt, b4)?;
    b.set_while_body(call, loop_stmt)?;
    b.set_next(call, cond)?;
    b.set_then_branch(x, cond)?;
    b.set_else_branch(y, cond)?;
    b.set_proc_body(c, test2)?;

    Ok(Arc::new(b.finish()?))
}

/// The statement at `line`. Panics if there is none.
pub fn line(program: &Program, line: u32) -> StatementRef<'_> {
    program
        .statement_at(line)
        .unwrap_or_else(|| panic!("no statement at line {}", line))
}

pub fn stmt(program: &Program, at: u32) -> Condition {
    Condition::Statement(line(program, at).id())
}

pub fn stmts(program: &Program, lines: &[u32]) -> ConditionSet {
    lines.iter().map(|at| stmt(program, *at)).collect()
}

pub fn var(name: &str) -> Condition {
    Condition::Variable(SimpleVariable::new(name))
}

pub fn vars(names: &[&str]) -> ConditionSet {
    names.iter().map(|name| var(name)).collect()
}
