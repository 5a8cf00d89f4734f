//! Lowering of pest pairs into a [`Program`].
//!
//! Procedures are declared up front in source order, so calls may refer to
//! procedures defined later in the file. Statements are created in pre-order
//! (a container before its body), which is what gives them their line
//! numbers.

use log::{debug, trace};
use pest::iterators::Pair;

use super::{error::ParseError, parser::Rule};
use crate::{
    ast::{BinaryOperator, Expr, Program, ProgramBuilder, SimpleVariable, StatementId},
    Params,
};

fn get_span(pair: &Pair<Rule>) -> (usize, usize) {
    let span = pair.as_span();
    (span.start(), span.end())
}

fn unexpected(pair: &Pair<Rule>) -> ParseError {
    ParseError::UnexpectedRule {
        rule: pair.as_rule(),
        span: Some(get_span(pair)),
    }
}

fn missing(element: &'static str, pair: &Pair<Rule>) -> ParseError {
    ParseError::MissingElement {
        element,
        context: pair.as_str().to_string(),
        span: Some(get_span(pair)),
    }
}

/// Children of a pair with the keyword tokens dropped.
fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| {
        !matches!(
            p.as_rule(),
            Rule::kw_proc
                | Rule::kw_call
                | Rule::kw_while
                | Rule::kw_if
                | Rule::kw_then
                | Rule::kw_else
        )
    })
}

pub(super) fn lower_program(pair: Pair<'_, Rule>, params: &Params) -> Result<Program, ParseError> {
    if pair.as_rule() != Rule::program {
        return Err(unexpected(&pair));
    }
    let procedures: Vec<_> = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::procedure)
        .collect();

    let mut lowering = Lowering {
        builder: ProgramBuilder::new(params),
    };

    let mut bodies = Vec::with_capacity(procedures.len());
    for procedure in procedures {
        let span = get_span(&procedure);
        let mut inner = significant(procedure.clone());
        let name = inner.next().ok_or_else(|| missing("procedure name", &procedure))?;
        let body = inner.next().ok_or_else(|| missing("procedure body", &procedure))?;
        let id = lowering.builder.procedure(name.as_str());
        if bodies.iter().any(|(existing, _)| *existing == id) {
            return Err(ParseError::DuplicateProcedure {
                name: name.as_str().to_string(),
                span: Some(span),
            });
        }
        bodies.push((id, body));
    }
    let declared = bodies.len();

    for (id, body) in bodies {
        let first = lowering.stmt_list(body)?;
        lowering.builder.set_proc_body(first, id)?;
    }

    let program = lowering.builder.finish()?;
    debug!(
        "Lowered {} procedures into {} statements",
        declared,
        program.statement_count()
    );
    Ok(program)
}

struct Lowering {
    builder: ProgramBuilder,
}

impl Lowering {
    /// Lowers a statement list and returns its first statement.
    fn stmt_list(&mut self, pair: Pair<'_, Rule>) -> Result<StatementId, ParseError> {
        let context = pair.clone();
        let mut first = None;
        let mut prev: Option<StatementId> = None;
        for stmt in pair.into_inner() {
            let id = self.statement(stmt)?;
            match prev {
                Some(prev) => self.builder.set_next(prev, id)?,
                None => first = Some(id),
            }
            prev = Some(id);
        }
        first.ok_or_else(|| missing("statement", &context))
    }

    fn statement(&mut self, pair: Pair<'_, Rule>) -> Result<StatementId, ParseError> {
        trace!("Lowering {:?} at {:?}", pair.as_rule(), get_span(&pair));
        let context = pair.clone();
        match pair.as_rule() {
            Rule::assign_stmt => {
                let mut inner = significant(pair);
                let target = inner.next().ok_or_else(|| missing("variable", &context))?;
                let expr = inner.next().ok_or_else(|| missing("expression", &context))?;
                let expr = lower_expr(expr)?;
                Ok(self.builder.assignment(variable(&target), expr)?)
            }
            Rule::call_stmt => {
                let callee = significant(pair)
                    .next()
                    .ok_or_else(|| missing("procedure name", &context))?;
                let id = self
                    .builder
                    .lookup_procedure(callee.as_str())
                    .ok_or_else(|| ParseError::UndefinedProcedure {
                        name: callee.as_str().to_string(),
                        span: Some(get_span(&callee)),
                    })?;
                Ok(self.builder.call(id)?)
            }
            Rule::while_stmt => {
                let mut inner = significant(pair);
                let var = inner.next().ok_or_else(|| missing("variable", &context))?;
                let body = inner.next().ok_or_else(|| missing("loop body", &context))?;
                let loop_stmt = self.builder.while_loop(variable(&var))?;
                let first = self.stmt_list(body)?;
                self.builder.set_while_body(first, loop_stmt)?;
                Ok(loop_stmt)
            }
            Rule::if_stmt => {
                let mut inner = significant(pair);
                let var = inner.next().ok_or_else(|| missing("variable", &context))?;
                let then_list = inner.next().ok_or_else(|| missing("then branch", &context))?;
                let else_list = inner.next().ok_or_else(|| missing("else branch", &context))?;
                let cond = self.builder.conditional(variable(&var))?;
                let then_first = self.stmt_list(then_list)?;
                self.builder.set_then_branch(then_first, cond)?;
                let else_first = self.stmt_list(else_list)?;
                self.builder.set_else_branch(else_first, cond)?;
                Ok(cond)
            }
            _ => Err(unexpected(&pair)),
        }
    }
}

fn variable(pair: &Pair<'_, Rule>) -> SimpleVariable {
    SimpleVariable::new(pair.as_str())
}

fn lower_expr(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
    match pair.as_rule() {
        Rule::expr | Rule::term => {
            let context = pair.clone();
            let mut inner = pair.into_inner();
            let first = inner.next().ok_or_else(|| missing("operand", &context))?;
            let mut acc = lower_expr(first)?;
            while let Some(op) = inner.next() {
                let op = lower_operator(&op)?;
                let rhs = inner.next().ok_or_else(|| missing("operand", &context))?;
                acc = Expr::binary(op, acc, lower_expr(rhs)?);
            }
            Ok(acc)
        }
        Rule::name => Ok(Expr::Variable(variable(&pair))),
        Rule::integer => {
            let value = pair
                .as_str()
                .parse::<i64>()
                .map_err(|_| ParseError::InvalidInteger {
                    value: pair.as_str().to_string(),
                    span: Some(get_span(&pair)),
                })?;
            Ok(Expr::constant(value))
        }
        _ => Err(unexpected(&pair)),
    }
}

fn lower_operator(pair: &Pair<'_, Rule>) -> Result<BinaryOperator, ParseError> {
    match pair.as_rule() {
        Rule::add_op | Rule::mul_op => pair.as_str().parse().map_err(|_| unexpected(pair)),
        _ => Err(unexpected(pair)),
    }
}
