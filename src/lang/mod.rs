//! Simple front end: pest grammar and lowering into the AST arena.
//!
//! [`parse_program`] is the entrypoint. Line numbers are assigned to
//! statements in source order, containers before their bodies, starting at
//! [`Params::first_line`].

pub mod error;
mod lower;
pub mod parser;

pub use error::ParseError;
pub use parser::{parse_simple, Rule, SimpleParser};

use crate::{ast::Program, Params};

/// Parses Simple source text into a [`Program`].
pub fn parse_program(source: &str, params: &Params) -> Result<Program, ParseError> {
    let mut pairs = parse_simple(source)?;
    let Some(program) = pairs.next() else {
        return Err(ParseError::MissingElement {
            element: "program",
            context: source.to_string(),
            span: None,
        });
    };
    lower::lower_program(program, params)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        ast::{
            utils::same_program, AssignmentRef, AstError, BinaryOperator, CallRef,
            ConditionalRef, ContainerVisitor, Expr, StatementVisitor, WhileRef,
        },
        test_utils::{classic_program, init_logger, line, CLASSIC_SOURCE},
    };

    fn parse(source: &str) -> Program {
        parse_program(source, &Params::default()).unwrap()
    }

    fn assigned_expr(program: &Program, at: u32) -> Expr {
        struct ExprOf;
        impl<'a> ContainerVisitor<'a> for ExprOf {
            type Output = Option<Expr>;
            fn visit_conditional(&mut self, _: ConditionalRef<'a>) -> Option<Expr> {
                None
            }
            fn visit_while(&mut self, _: WhileRef<'a>) -> Option<Expr> {
                None
            }
        }
        impl<'a> StatementVisitor<'a> for ExprOf {
            fn visit_assignment(&mut self, stmt: AssignmentRef<'a>) -> Option<Expr> {
                Some(stmt.expr().clone())
            }
            fn visit_call(&mut self, _: CallRef<'a>) -> Option<Expr> {
                None
            }
        }
        line(program, at).accept(&mut ExprOf).unwrap()
    }

    #[test]
    fn test_classic_program_matches_builder() {
        init_logger();
        let parsed = parse(CLASSIC_SOURCE);
        assert!(same_program(&parsed, &classic_program()));
        assert_eq!(parsed.lines().collect::<Vec<_>>(), (1..=8).collect::<Vec<_>>());
        assert_eq!(line(&parsed, 3).parent(), Some(line(&parsed, 2)));
        assert_eq!(line(&parsed, 8).proc().name(), "test2");
    }

    #[test]
    fn test_operator_precedence() {
        let program = parse("proc p { a = x + y * z; b = (x + y) * z; c = a - b - c; }");
        assert_eq!(
            assigned_expr(&program, 1),
            Expr::binary(
                BinaryOperator::Plus,
                Expr::variable("x"),
                Expr::binary(BinaryOperator::Times, Expr::variable("y"), Expr::variable("z")),
            )
        );
        assert_eq!(assigned_expr(&program, 2).to_string(), "((x + y) * z)");
        assert_eq!(assigned_expr(&program, 3).to_string(), "((a - b) - c)");
    }

    #[test]
    fn test_first_line_and_forward_calls() {
        let params = Params {
            first_line: 100,
            ..Params::default()
        };
        let program = parse_program("proc a { call b; } proc b { x = 1; }", &params).unwrap();
        assert_eq!(program.lines().collect::<Vec<_>>(), vec![100, 101]);
        assert_eq!(
            program.procedures().map(|p| p.name()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_undefined_and_duplicate_procedures() {
        let err = parse_program("proc a { call nowhere; }", &Params::default()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UndefinedProcedure { ref name, span: Some(_) } if name == "nowhere"
        ));

        let err = parse_program("proc a { x = 1; } proc a { y = 2; }", &Params::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::DuplicateProcedure { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_syntax_and_literal_errors() {
        let err = parse_program("proc a { x = ; }", &Params::default()).unwrap_err();
        assert!(matches!(err, ParseError::Pest(_)));

        let err = parse_program("proc a { x = 99999999999999999999; }", &Params::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidInteger { .. }));
    }

    #[test]
    fn test_ast_error_is_wrapped() {
        let err: ParseError = AstError::DetachedStatement(3).into();
        assert_eq!(
            err.to_string(),
            "AST construction failed: Statement at line 3 does not belong to any procedure"
        );
    }

    #[test]
    fn test_line_overflow_is_an_error() {
        let params = Params {
            first_line: u32::MAX,
            ..Params::default()
        };
        let program = parse_program("proc a { x = 1; }", &params).unwrap();
        assert_eq!(program.lines().collect::<Vec<_>>(), vec![u32::MAX]);

        let err = parse_program("proc a { x = 1; y = 2; }", &params).unwrap_err();
        assert!(matches!(err, ParseError::Ast(AstError::LineOverflow)));
    }
}
