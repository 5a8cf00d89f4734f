use thiserror::Error;

/// Errors raised while assembling a [`Program`](super::Program) with the
/// [`ProgramBuilder`](super::ProgramBuilder).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    #[error("Procedure '{0}' has no body")]
    MissingProcedureBody(String),
    #[error("Procedure '{0}' already has a body")]
    DuplicateProcedureBody(String),
    #[error("Container at line {line} is missing its {part}")]
    MissingBody { line: u32, part: &'static str },
    #[error("Statement at line {line} is not a {expected}")]
    WrongStatementKind { line: u32, expected: &'static str },
    #[error("Statement at line {0} is reachable twice (shared or cyclic statement list)")]
    StatementReachedTwice(u32),
    #[error("Statement at line {0} does not belong to any procedure")]
    DetachedStatement(u32),
    #[error("Unknown statement id #{0}")]
    UnknownStatement(usize),
    #[error("Unknown procedure id #{0}")]
    UnknownProcedure(usize),
    #[error("Line number overflow: too many statements after the first line")]
    LineOverflow,
}
