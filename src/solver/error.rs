use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// The program violates a structural invariant the solvers rely on, such
    /// as a statement list that never ends or a body member whose parent link
    /// points elsewhere.
    #[error("Inconsistent AST: {0}")]
    InconsistentAst(String),
    #[error("Unknown predicate '{0}'")]
    UnknownPredicate(String),
    #[error("Unknown relation '{0}'")]
    UnknownRelation(String),
    #[error("Unknown query variable '{0}'")]
    UnknownVariable(String),
}
