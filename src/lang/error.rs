use thiserror::Error;

use super::parser::Rule;
use crate::ast::AstError;

/// Errors produced while turning Simple source text into a `Program`.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Pest parsing error: {0}")]
    Pest(Box<pest::error::Error<Rule>>),
    #[error("Call to undefined procedure '{name}' at {span:?}")]
    UndefinedProcedure {
        name: String,
        span: Option<(usize, usize)>,
    },
    #[error("Duplicate procedure '{name}' at {span:?}")]
    DuplicateProcedure {
        name: String,
        span: Option<(usize, usize)>,
    },
    #[error("Invalid integer literal '{value}' at {span:?}")]
    InvalidInteger {
        value: String,
        span: Option<(usize, usize)>,
    },
    #[error("Unexpected rule {rule:?} at {span:?}")]
    UnexpectedRule {
        rule: Rule,
        span: Option<(usize, usize)>,
    },
    #[error("Missing element: expected {element} in '{context}' at {span:?}")]
    MissingElement {
        element: &'static str,
        context: String,
        span: Option<(usize, usize)>,
    },
    #[error("AST construction failed: {0}")]
    Ast(#[from] AstError),
}

// `?` on a raw pest error needs to land in the boxed variant.
impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        ParseError::Pest(Box::new(err))
    }
}
