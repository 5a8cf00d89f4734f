//! One analysed program with its predicate table and relation solvers.

use std::sync::Arc;

use log::debug;

use crate::{
    ast::Program,
    lang::parse_program,
    predicate::{PredicateFactory, PredicateTable, SimplePredicateFactory},
    qvar::QueryVariable,
    query::QueryEvaluator,
    solver::{make_solvers, RelationSolver, SolverTable},
    Params, Result,
};

#[derive(Debug)]
pub struct Analysis {
    program: Arc<Program>,
    predicates: Arc<dyn PredicateTable>,
    solvers: SolverTable,
}

impl Analysis {
    pub fn new(program: Program, params: &Params) -> Result<Self> {
        Self::with_factory(program, params, &SimplePredicateFactory)
    }

    pub fn with_factory(
        program: Program,
        params: &Params,
        factory: &dyn PredicateFactory,
    ) -> Result<Self> {
        let program = Arc::new(program);
        let predicates = factory.make_predicates(program.clone());
        let solvers = make_solvers(program.clone(), params)?;
        debug!(
            "Analysis ready: {} procedures, {} statements",
            program.procedure_count(),
            program.statement_count()
        );
        Ok(Self {
            program,
            predicates,
            solvers,
        })
    }

    /// Parses `source` and prepares it for querying.
    pub fn from_source(source: &str, params: &Params) -> Result<Self> {
        let program = parse_program(source, params)?;
        Self::new(program, params)
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn predicates(&self) -> &Arc<dyn PredicateTable> {
        &self.predicates
    }

    pub fn solvers(&self) -> &SolverTable {
        &self.solvers
    }

    pub fn solver(&self, relation: &str) -> Result<&dyn RelationSolver> {
        Ok(self.solvers.get_by_name(relation)?)
    }

    /// A query variable ranging over design entity `entity` (`"stmt"`,
    /// `"assign"`, ...). `_` makes a wildcard.
    pub fn variable(&self, name: &str, entity: &str) -> Result<QueryVariable> {
        let predicate = self.predicates.get_predicate(entity)?;
        Ok(QueryVariable::new(name, predicate))
    }

    pub fn evaluator(&self) -> QueryEvaluator<'_> {
        QueryEvaluator::new(&self.solvers)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        condition::Condition,
        solver::{RelationKind, SolverError},
        test_utils::{init_logger, line, stmts, CLASSIC_SOURCE},
        Error,
    };

    #[test]
    fn test_end_to_end_query() {
        init_logger();
        let analysis = Analysis::from_source(CLASSIC_SOURCE, &Params::default()).unwrap();
        let program = analysis.program().clone();

        let mut query = analysis.evaluator();
        let s = query.declare(analysis.variable("s", "stmt").unwrap());
        let w = query.declare(analysis.variable("w", "while").unwrap());
        let any = query.declare(analysis.variable("_", "variable").unwrap());
        query.add_clause(RelationKind::Follows, s, w);
        query.add_clause(RelationKind::Uses, w, any);
        assert!(query.run().unwrap());
        assert_eq!(
            query.results(s).unwrap(),
            vec![Condition::Statement(line(&program, 1).id())]
        );
        assert_eq!(query.results(w).unwrap(), stmts(&program, &[2]).sorted());
    }

    #[test]
    fn test_errors_surface_through_crate_error() {
        let err = Analysis::from_source("proc p { call q; }", &Params::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));

        let analysis = Analysis::from_source(CLASSIC_SOURCE, &Params::default()).unwrap();
        assert!(matches!(
            analysis.variable("v", "stmtLst").unwrap_err(),
            Error::Solver(SolverError::UnknownPredicate(_))
        ));
        assert!(matches!(
            analysis.solver("Next").unwrap_err(),
            Error::Solver(SolverError::UnknownRelation(_))
        ));
        assert_eq!(analysis.solver("Uses").unwrap().relation(), RelationKind::Uses);
    }
}
