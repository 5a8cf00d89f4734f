use std::collections::HashMap;

use log::{debug, trace};

use super::{
    error::AstError, Expr, ProcId, ProcNode, Program, SimpleVariable, StatementId,
    StatementKind, StatementNode,
};
use crate::Params;

#[derive(Debug)]
enum PendingKind {
    Assignment {
        variable: SimpleVariable,
        expr: Expr,
    },
    Call {
        callee: ProcId,
    },
    Conditional {
        variable: SimpleVariable,
        then_branch: Option<StatementId>,
        else_branch: Option<StatementId>,
    },
    While {
        variable: SimpleVariable,
        body: Option<StatementId>,
    },
}

#[derive(Debug)]
struct PendingStatement {
    line: u32,
    next: Option<StatementId>,
    kind: PendingKind,
}

#[derive(Debug)]
struct PendingProc {
    name: String,
    body: Option<StatementId>,
}

/// Where `finish` found a statement.
#[derive(Clone, Copy, Debug)]
struct Placement {
    proc: ProcId,
    parent: Option<StatementId>,
    prev: Option<StatementId>,
}

/// Incremental construction of a [`Program`].
///
/// Statements are created detached and numbered in creation order, then
/// linked into statement lists and bodies. Only the forward links (`next`,
/// bodies) are recorded; `finish` derives each statement's owning procedure,
/// enclosing container and `prev` link by walking them.
#[derive(Debug)]
pub struct ProgramBuilder {
    procs: Vec<PendingProc>,
    proc_index: HashMap<String, ProcId>,
    statements: Vec<PendingStatement>,
    // `None` once the line counter has run past `u32::MAX`.
    next_line: Option<u32>,
}

impl ProgramBuilder {
    pub fn new(params: &Params) -> Self {
        Self {
            procs: Vec::new(),
            proc_index: HashMap::new(),
            statements: Vec::new(),
            next_line: Some(params.first_line),
        }
    }

    /// Returns the procedure called `name`, declaring it if it is new. A
    /// procedure may be referenced by a call before its body is known.
    pub fn procedure(&mut self, name: &str) -> ProcId {
        if let Some(id) = self.proc_index.get(name) {
            return *id;
        }
        let id = ProcId(self.procs.len());
        self.procs.push(PendingProc {
            name: name.to_string(),
            body: None,
        });
        self.proc_index.insert(name.to_string(), id);
        id
    }

    /// Looks a procedure up without declaring it.
    pub fn lookup_procedure(&self, name: &str) -> Option<ProcId> {
        self.proc_index.get(name).copied()
    }

    pub fn has_body(&self, proc: ProcId) -> bool {
        self.procs
            .get(proc.0)
            .is_some_and(|proc| proc.body.is_some())
    }

    pub fn assignment(
        &mut self,
        variable: SimpleVariable,
        expr: Expr,
    ) -> Result<StatementId, AstError> {
        self.push(PendingKind::Assignment { variable, expr })
    }

    pub fn call(&mut self, callee: ProcId) -> Result<StatementId, AstError> {
        if callee.0 >= self.procs.len() {
            return Err(AstError::UnknownProcedure(callee.0));
        }
        self.push(PendingKind::Call { callee })
    }

    pub fn conditional(&mut self, variable: SimpleVariable) -> Result<StatementId, AstError> {
        self.push(PendingKind::Conditional {
            variable,
            then_branch: None,
            else_branch: None,
        })
    }

    pub fn while_loop(&mut self, variable: SimpleVariable) -> Result<StatementId, AstError> {
        self.push(PendingKind::While {
            variable,
            body: None,
        })
    }

    /// Links `next` right after `prev` in the same statement list. Linking
    /// `prev` again replaces its previous successor.
    pub fn set_next(&mut self, prev: StatementId, next: StatementId) -> Result<(), AstError> {
        self.stmt_mut(next)?;
        self.stmt_mut(prev)?.next = Some(next);
        Ok(())
    }

    pub fn set_proc_body(&mut self, first: StatementId, proc: ProcId) -> Result<(), AstError> {
        self.stmt_mut(first)?;
        let pending = self
            .procs
            .get_mut(proc.0)
            .ok_or(AstError::UnknownProcedure(proc.0))?;
        if pending.body.is_some() {
            return Err(AstError::DuplicateProcedureBody(pending.name.clone()));
        }
        pending.body = Some(first);
        Ok(())
    }

    pub fn set_while_body(
        &mut self,
        first: StatementId,
        loop_stmt: StatementId,
    ) -> Result<(), AstError> {
        self.stmt_mut(first)?;
        let stmt = self.stmt_mut(loop_stmt)?;
        match &mut stmt.kind {
            PendingKind::While { body, .. } => {
                *body = Some(first);
                Ok(())
            }
            _ => Err(AstError::WrongStatementKind {
                line: stmt.line,
                expected: "while statement",
            }),
        }
    }

    pub fn set_then_branch(
        &mut self,
        first: StatementId,
        condition: StatementId,
    ) -> Result<(), AstError> {
        self.stmt_mut(first)?;
        let stmt = self.stmt_mut(condition)?;
        match &mut stmt.kind {
            PendingKind::Conditional { then_branch, .. } => {
                *then_branch = Some(first);
                Ok(())
            }
            _ => Err(AstError::WrongStatementKind {
                line: stmt.line,
                expected: "if statement",
            }),
        }
    }

    pub fn set_else_branch(
        &mut self,
        first: StatementId,
        condition: StatementId,
    ) -> Result<(), AstError> {
        self.stmt_mut(first)?;
        let stmt = self.stmt_mut(condition)?;
        match &mut stmt.kind {
            PendingKind::Conditional { else_branch, .. } => {
                *else_branch = Some(first);
                Ok(())
            }
            _ => Err(AstError::WrongStatementKind {
                line: stmt.line,
                expected: "if statement",
            }),
        }
    }

    /// Validates the links and freezes the program.
    ///
    /// Fails if a procedure or container body is missing, if a statement is
    /// reachable from two places (which includes cyclic lists), or if a
    /// statement was never linked under any procedure.
    pub fn finish(self) -> Result<Program, AstError> {
        let mut placement: Vec<Option<Placement>> = vec![None; self.statements.len()];
        for (i, proc) in self.procs.iter().enumerate() {
            let body = proc
                .body
                .ok_or_else(|| AstError::MissingProcedureBody(proc.name.clone()))?;
            self.place_list(body, ProcId(i), None, &mut placement)?;
        }

        let procs = self
            .procs
            .into_iter()
            .map(|proc| match proc.body {
                Some(body) => Ok(ProcNode {
                    name: proc.name,
                    body,
                }),
                None => Err(AstError::MissingProcedureBody(proc.name)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let statements = self
            .statements
            .into_iter()
            .zip(placement)
            .map(|(stmt, placed)| {
                let placed = placed.ok_or(AstError::DetachedStatement(stmt.line))?;
                Ok(StatementNode {
                    line: stmt.line,
                    next: stmt.next,
                    prev: placed.prev,
                    parent: placed.parent,
                    proc: placed.proc,
                    kind: freeze_kind(stmt.kind, stmt.line)?,
                })
            })
            .collect::<Result<Vec<_>, AstError>>()?;

        debug!(
            "Built program with {} procedures and {} statements",
            procs.len(),
            statements.len()
        );
        Ok(Program::from_parts(procs, statements))
    }

    fn place_list(
        &self,
        first: StatementId,
        proc: ProcId,
        parent: Option<StatementId>,
        placement: &mut [Option<Placement>],
    ) -> Result<(), AstError> {
        let mut prev = None;
        let mut current = Some(first);
        while let Some(id) = current {
            let stmt = &self.statements[id.0];
            if placement[id.0].is_some() {
                return Err(AstError::StatementReachedTwice(stmt.line));
            }
            trace!("Placing line {} under {:?} / {:?}", stmt.line, proc, parent);
            placement[id.0] = Some(Placement { proc, parent, prev });

            match &stmt.kind {
                PendingKind::Conditional {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    let then_first = then_branch.ok_or(AstError::MissingBody {
                        line: stmt.line,
                        part: "then branch",
                    })?;
                    let else_first = else_branch.ok_or(AstError::MissingBody {
                        line: stmt.line,
                        part: "else branch",
                    })?;
                    self.place_list(then_first, proc, Some(id), placement)?;
                    self.place_list(else_first, proc, Some(id), placement)?;
                }
                PendingKind::While { body, .. } => {
                    let body_first = body.ok_or(AstError::MissingBody {
                        line: stmt.line,
                        part: "loop body",
                    })?;
                    self.place_list(body_first, proc, Some(id), placement)?;
                }
                PendingKind::Assignment { .. } | PendingKind::Call { .. } => {}
            }
            prev = Some(id);
            current = stmt.next;
        }
        Ok(())
    }

    fn push(&mut self, kind: PendingKind) -> Result<StatementId, AstError> {
        let line = self.next_line.ok_or(AstError::LineOverflow)?;
        let id = StatementId(self.statements.len());
        self.statements.push(PendingStatement {
            line,
            next: None,
            kind,
        });
        self.next_line = line.checked_add(1);
        Ok(id)
    }

    fn stmt_mut(&mut self, id: StatementId) -> Result<&mut PendingStatement, AstError> {
        self.statements
            .get_mut(id.0)
            .ok_or(AstError::UnknownStatement(id.0))
    }
}

fn freeze_kind(kind: PendingKind, line: u32) -> Result<StatementKind, AstError> {
    let missing = |part| AstError::MissingBody { line, part };
    Ok(match kind {
        PendingKind::Assignment { variable, expr } => StatementKind::Assignment { variable, expr },
        PendingKind::Call { callee } => StatementKind::Call { callee },
        PendingKind::Conditional {
            variable,
            then_branch,
            else_branch,
        } => StatementKind::Conditional {
            variable,
            then_branch: then_branch.ok_or_else(|| missing("then branch"))?,
            else_branch: else_branch.ok_or_else(|| missing("else branch"))?,
        },
        PendingKind::While { variable, body } => StatementKind::While {
            variable,
            body: body.ok_or_else(|| missing("loop body"))?,
        },
    })
}
