pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // sub-categories of errors
    #[error(transparent)]
    Parse(#[from] crate::lang::ParseError),
    #[error(transparent)]
    Ast(#[from] crate::ast::AstError),
    #[error(transparent)]
    Solver(#[from] crate::solver::SolverError),
}
