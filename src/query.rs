//! Clause evaluation over query variables.
//!
//! A clause `R(a, b)` narrows the candidates of `a` and `b` to the values
//! that take part in at least one pair satisfying `R`. The evaluator keeps
//! re-running its clauses until no variable changes any more.

use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    condition::{Condition, ConditionSet},
    qvar::{Binding, QueryVariable},
    solver::{RelationKind, RelationSolver, SolverError, SolverTable},
};

/// Handle on a variable declared in a [`QueryEvaluator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VarId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clause {
    pub relation: RelationKind,
    pub left: VarId,
    pub right: VarId,
}

/// Narrows `left` and `right` by one relation. Returns whether any pair
/// survived.
///
/// The bound side is iterated (the left one when both or neither are bound)
/// and solved toward the other side. Wildcards ignore the write back.
pub fn evaluate_clause(
    solver: &dyn RelationSolver,
    left: &mut QueryVariable,
    right: &mut QueryVariable,
) -> Result<bool, SolverError> {
    let from_right = right.is_bounded() && !left.is_bounded();
    let left_candidates = left.get_conditions().clone();
    let right_candidates = right.get_conditions().clone();

    let mut left_kept = ConditionSet::new();
    let mut right_kept = ConditionSet::new();
    if from_right {
        for candidate in &right_candidates {
            let mut matches = solver.solve_left(candidate)?;
            matches.intersect_with(&left_candidates);
            if !matches.is_empty() {
                right_kept.insert(candidate.clone());
                left_kept.union_with(&matches);
            }
        }
    } else {
        for candidate in &left_candidates {
            let mut matches = solver.solve_right(candidate)?;
            matches.intersect_with(&right_candidates);
            if !matches.is_empty() {
                left_kept.insert(candidate.clone());
                right_kept.union_with(&matches);
            }
        }
    }

    trace!(
        "{}({}, {}): {} x {} candidates narrowed to {} x {}",
        solver.relation(),
        left.get_name(),
        right.get_name(),
        left_candidates.len(),
        right_candidates.len(),
        left_kept.len(),
        right_kept.len()
    );
    let satisfied = !left_kept.is_empty();
    left.set_conditions(left_kept);
    right.set_conditions(right_kept);
    Ok(satisfied)
}

/// A clause whose two slots are the same variable: keeps the candidates `c`
/// with `relation(c, c)`.
pub fn evaluate_reflexive(
    solver: &dyn RelationSolver,
    var: &mut QueryVariable,
) -> Result<bool, SolverError> {
    let candidates = var.get_conditions().clone();
    let mut kept = ConditionSet::new();
    for candidate in candidates {
        if solver.validate(&candidate, &candidate)? {
            kept.insert(candidate);
        }
    }
    let satisfied = !kept.is_empty();
    var.set_conditions(kept);
    Ok(satisfied)
}

/// The variables and clauses of one query.
#[derive(Debug)]
pub struct QueryEvaluator<'s> {
    solvers: &'s SolverTable,
    variables: Vec<QueryVariable>,
    names: HashMap<String, VarId>,
    clauses: Vec<Clause>,
}

impl<'s> QueryEvaluator<'s> {
    pub fn new(solvers: &'s SolverTable) -> Self {
        Self {
            solvers,
            variables: Vec::new(),
            names: HashMap::new(),
            clauses: Vec::new(),
        }
    }

    /// Adds a variable. Every wildcard gets a slot of its own; a named
    /// variable declared twice keeps its first declaration.
    pub fn declare(&mut self, var: QueryVariable) -> VarId {
        if !var.is_wildcard() {
            if let Some(id) = self.names.get(var.get_name()) {
                return *id;
            }
        }
        let id = VarId(self.variables.len());
        if !var.is_wildcard() {
            self.names.insert(var.get_name().to_string(), id);
        }
        self.variables.push(var);
        id
    }

    pub fn lookup(&self, name: &str) -> Result<VarId, SolverError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| SolverError::UnknownVariable(name.to_string()))
    }

    pub fn variable(&self, id: VarId) -> Option<&QueryVariable> {
        self.variables.get(id.0)
    }

    pub fn variable_mut(&mut self, id: VarId) -> Option<&mut QueryVariable> {
        self.variables.get_mut(id.0)
    }

    pub fn add_clause(&mut self, relation: RelationKind, left: VarId, right: VarId) {
        self.clauses.push(Clause {
            relation,
            left,
            right,
        });
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Current candidates of a variable, in a stable order.
    pub fn results(&mut self, id: VarId) -> Result<Vec<Condition>, SolverError> {
        let var = self
            .variables
            .get_mut(id.0)
            .ok_or_else(|| SolverError::UnknownVariable(format!("#{}", id.0)))?;
        Ok(var.get_conditions().sorted())
    }

    /// Runs every clause until no variable changes. Returns false as soon as
    /// a clause has no satisfying pair left.
    pub fn run(&mut self) -> Result<bool, SolverError> {
        let solvers = self.solvers;
        let mut round = 0;
        loop {
            round += 1;
            let mut changed = false;
            for clause in self.clauses.clone() {
                let solver = solvers.get(clause.relation)?;
                let before = self.snapshot(&clause)?;
                let satisfied = if clause.left == clause.right {
                    evaluate_reflexive(solver, self.slot(clause.left)?)?
                } else {
                    let (left, right) = self.pair(clause.left, clause.right)?;
                    evaluate_clause(solver, left, right)?
                };
                if !satisfied {
                    debug!(
                        "Clause {} has no solution after {} rounds",
                        clause.relation, round
                    );
                    return Ok(false);
                }
                changed |= self.snapshot(&clause)? != before;
            }
            if !changed {
                debug!("Query reached a fixpoint after {} rounds", round);
                return Ok(true);
            }
        }
    }

    fn slot(&mut self, id: VarId) -> Result<&mut QueryVariable, SolverError> {
        self.variables
            .get_mut(id.0)
            .ok_or_else(|| SolverError::UnknownVariable(format!("#{}", id.0)))
    }

    fn pair(
        &mut self,
        left: VarId,
        right: VarId,
    ) -> Result<(&mut QueryVariable, &mut QueryVariable), SolverError> {
        let len = self.variables.len();
        for id in [left, right] {
            if id.0 >= len {
                return Err(SolverError::UnknownVariable(format!("#{}", id.0)));
            }
        }
        if left.0 < right.0 {
            let (head, tail) = self.variables.split_at_mut(right.0);
            Ok((&mut head[left.0], &mut tail[0]))
        } else {
            let (head, tail) = self.variables.split_at_mut(left.0);
            Ok((&mut tail[0], &mut head[right.0]))
        }
    }

    /// Binding state and size of both slots of a clause. Candidate sets only
    /// shrink, so equal snapshots mean nothing changed.
    fn snapshot(&self, clause: &Clause) -> Result<[(bool, usize); 2], SolverError> {
        let size = |id: VarId| {
            self.variables
                .get(id.0)
                .map(|var| match var {
                    QueryVariable::Named(named) => match named.binding() {
                        Binding::Bound(set) => (true, set.len()),
                        Binding::Unbound => (false, 0),
                    },
                    QueryVariable::Wildcard(_) => (false, 0),
                })
                .ok_or_else(|| SolverError::UnknownVariable(format!("#{}", id.0)))
        };
        Ok([size(clause.left)?, size(clause.right)?])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        ast::{Program, SimpleVariable},
        lang::parse_program,
        predicate::{PredicateFactory, PredicateTable, SimplePredicateFactory},
        solver::make_solvers,
        test_utils::{classic_program, init_logger, stmts},
        Params,
    };

    struct Fixture {
        program: Arc<Program>,
        predicates: Arc<dyn PredicateTable>,
        solvers: SolverTable,
    }

    fn fixture() -> Fixture {
        fixture_for(classic_program())
    }

    fn fixture_for(program: Arc<Program>) -> Fixture {
        let predicates = SimplePredicateFactory.make_predicates(program.clone());
        let solvers = make_solvers(program.clone(), &Params::default()).unwrap();
        Fixture {
            program,
            predicates,
            solvers,
        }
    }

    impl Fixture {
        fn var(&self, name: &str, entity: &str) -> QueryVariable {
            QueryVariable::new(name, self.predicates.get_predicate(entity).unwrap())
        }
    }

    #[test]
    fn test_parent_while_assign() {
        init_logger();
        let f = fixture();
        let solver = f.solvers.get(RelationKind::Parent).unwrap();
        let mut w = f.var("w", "while");
        let mut a = f.var("a", "assign");

        // The loop at line 2 only directly holds a call and an if.
        assert!(!evaluate_clause(solver, &mut w, &mut a).unwrap());
        assert!(w.get_conditions().is_empty());

        let mut c = f.var("c", "if");
        let mut a = f.var("a", "assign");
        assert!(evaluate_clause(solver, &mut c, &mut a).unwrap());
        assert_eq!(c.get_conditions(), &stmts(&f.program, &[4]));
        assert_eq!(a.get_conditions(), &stmts(&f.program, &[5, 6]));
    }

    #[test]
    fn test_parent_while_scenario() {
        let program = parse_program(
            "proc p { while i { x = 1; y = 2; } z = 3; }",
            &Params::default(),
        )
        .unwrap();
        let f = fixture_for(Arc::new(program));
        let solver = f.solvers.get(RelationKind::Parent).unwrap();
        let mut w = f.var("w", "while");
        let mut a = f.var("a", "assign");
        assert!(evaluate_clause(solver, &mut w, &mut a).unwrap());
        assert_eq!(w.get_conditions(), &stmts(&f.program, &[1]));
        assert_eq!(a.get_conditions(), &stmts(&f.program, &[2, 3]));
    }

    #[test]
    fn test_wildcards_stay_unnarrowed() {
        let f = fixture();
        let solver = f.solvers.get(RelationKind::ParentStar).unwrap();
        let mut w = f.var("w", "while");
        let mut any = f.var("_", "assign");
        assert!(evaluate_clause(solver, &mut w, &mut any).unwrap());
        assert_eq!(w.get_conditions(), &stmts(&f.program, &[2]));
        assert!(!any.is_bounded());
        assert_eq!(any.get_conditions(), &stmts(&f.program, &[1, 5, 6, 7, 8]));
    }

    #[test]
    fn test_bound_right_side_is_iterated() {
        let f = fixture();
        let solver = f.solvers.get(RelationKind::Follows).unwrap();
        let mut s1 = f.var("s1", "stmt");
        let mut s2 = f.var("s2", "stmt");
        s2.set_conditions(stmts(&f.program, &[7]));
        assert!(evaluate_clause(solver, &mut s1, &mut s2).unwrap());
        assert_eq!(s1.get_conditions(), &stmts(&f.program, &[2]));
        assert_eq!(s2.get_conditions(), &stmts(&f.program, &[7]));
    }

    #[test]
    fn test_reflexive_clause() {
        let f = fixture();
        let solver = f.solvers.get(RelationKind::Follows).unwrap();
        let mut s = f.var("s", "stmt");
        assert!(!evaluate_reflexive(solver, &mut s).unwrap());
        assert!(s.get_conditions().is_empty());
    }

    #[test]
    fn test_evaluator_reaches_fixpoint() {
        let f = fixture();
        let mut query = QueryEvaluator::new(&f.solvers);
        let w = query.declare(f.var("w", "while"));
        let s = query.declare(f.var("s", "stmt"));
        let a = query.declare(f.var("a", "assign"));
        // Parent*(w, s) and Parent(s, a): s is a container nested in a loop
        // that directly holds assignments.
        query.add_clause(RelationKind::ParentStar, w, s);
        query.add_clause(RelationKind::Parent, s, a);
        assert_eq!(
            query.clauses(),
            &[
                Clause {
                    relation: RelationKind::ParentStar,
                    left: w,
                    right: s
                },
                Clause {
                    relation: RelationKind::Parent,
                    left: s,
                    right: a
                },
            ]
        );
        assert!(query.run().unwrap());
        assert_eq!(query.results(s).unwrap(), stmts(&f.program, &[4]).sorted());
        assert_eq!(query.results(a).unwrap(), stmts(&f.program, &[5, 6]).sorted());
        assert_eq!(query.results(w).unwrap(), stmts(&f.program, &[2]).sorted());
        assert_eq!(query.lookup("s").unwrap(), s);
        assert_eq!(query.declare(f.var("s", "stmt")), s);
    }

    #[test]
    fn test_evaluator_starts_from_preset_candidates() {
        let f = fixture();
        let mut query = QueryEvaluator::new(&f.solvers);
        let s1 = query.declare(f.var("s1", "stmt"));
        let s2 = query.declare(f.var("s2", "stmt"));
        query
            .variable_mut(s2)
            .unwrap()
            .set_conditions(stmts(&f.program, &[4]));
        query.add_clause(RelationKind::Follows, s1, s2);
        assert!(query.run().unwrap());
        assert_eq!(query.results(s1).unwrap(), stmts(&f.program, &[3]).sorted());
        assert!(query.variable(s1).unwrap().is_bounded());
        assert!(query.variable_mut(VarId(9)).is_none());
    }

    #[test]
    fn test_evaluator_unsatisfiable_and_unknown() {
        let f = fixture();
        let mut query = QueryEvaluator::new(&f.solvers);
        let a = query.declare(f.var("a", "assign"));
        let w = query.declare(f.var("w", "while"));
        query.add_clause(RelationKind::Parent, a, w);
        assert!(!query.run().unwrap());
        assert_eq!(
            query.lookup("missing").unwrap_err(),
            SolverError::UnknownVariable("missing".to_string())
        );
    }

    #[test]
    fn test_modifies_through_calls() {
        let f = fixture();
        let mut query = QueryEvaluator::new(&f.solvers);
        let c = query.declare(f.var("c", "call"));
        let v = query.declare(f.var("v", "variable"));
        query.add_clause(RelationKind::Modifies, c, v);
        assert!(query.run().unwrap());
        assert_eq!(query.results(c).unwrap(), stmts(&f.program, &[3]).sorted());
        assert_eq!(
            query.results(v).unwrap(),
            vec![Condition::Variable(SimpleVariable::new("c"))]
        );
    }
}
