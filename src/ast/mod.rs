//! Arena-backed syntax tree of a Simple program.
//!
//! The [`Program`] owns every procedure and statement. Links between
//! statements (next, prev, enclosing container, owning procedure, bodies)
//! are plain indices into the arena and carry no ownership, so the
//! back-references needed for navigation never form ownership cycles.
//!
//! Statements are read through borrowed handles. [`StatementRef`] exposes
//! what every statement has; the concrete kind is resolved exactly once by
//! [`StatementRef::accept`], which hands a typed handle
//! ([`AssignmentRef`], [`CallRef`], [`ConditionalRef`], [`WhileRef`]) to a
//! [`StatementVisitor`].

mod builder;
pub mod error;
mod expr;
pub mod utils;
pub mod visitor;

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

pub use builder::ProgramBuilder;
pub use error::AstError;
pub use expr::{BinaryOperator, Expr, SimpleConstant, SimpleVariable};
pub use visitor::{ContainerVisitor, ExprVisitor, StatementVisitor};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId(pub(crate) usize);

impl StatementId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcId(pub(crate) usize);

impl ProcId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StatementKind {
    Assignment {
        variable: SimpleVariable,
        expr: Expr,
    },
    Call {
        callee: ProcId,
    },
    Conditional {
        variable: SimpleVariable,
        then_branch: StatementId,
        else_branch: StatementId,
    },
    While {
        variable: SimpleVariable,
        body: StatementId,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct StatementNode {
    pub(crate) line: u32,
    pub(crate) next: Option<StatementId>,
    pub(crate) prev: Option<StatementId>,
    // Enclosing container; `None` at the top level of a procedure.
    pub(crate) parent: Option<StatementId>,
    pub(crate) proc: ProcId,
    pub(crate) kind: StatementKind,
}

#[derive(Clone, Debug)]
pub(crate) struct ProcNode {
    pub(crate) name: String,
    pub(crate) body: StatementId,
}

/// A parsed Simple program. Immutable once built; share it with `Arc`.
#[derive(Clone, Debug)]
pub struct Program {
    procs: Vec<ProcNode>,
    proc_index: HashMap<String, ProcId>,
    statements: Vec<StatementNode>,
    line_table: BTreeMap<u32, StatementId>,
}

impl Program {
    pub(crate) fn from_parts(procs: Vec<ProcNode>, statements: Vec<StatementNode>) -> Self {
        let proc_index = procs
            .iter()
            .enumerate()
            .map(|(i, proc)| (proc.name.clone(), ProcId(i)))
            .collect();
        let line_table = statements
            .iter()
            .enumerate()
            .map(|(i, node)| (node.line, StatementId(i)))
            .collect();
        Self {
            procs,
            proc_index,
            statements,
            line_table,
        }
    }

    pub fn procedures(&self) -> impl Iterator<Item = ProcRef<'_>> + '_ {
        (0..self.procs.len()).map(move |i| ProcRef {
            program: self,
            id: ProcId(i),
        })
    }

    pub fn procedure(&self, id: ProcId) -> Option<ProcRef<'_>> {
        (id.0 < self.procs.len()).then_some(ProcRef { program: self, id })
    }

    pub fn proc_by_name(&self, name: &str) -> Option<ProcRef<'_>> {
        self.proc_index.get(name).map(|id| ProcRef {
            program: self,
            id: *id,
        })
    }

    pub fn statement(&self, id: StatementId) -> Option<StatementRef<'_>> {
        (id.0 < self.statements.len()).then_some(StatementRef { program: self, id })
    }

    /// All statements in line order.
    pub fn statements(&self) -> impl Iterator<Item = StatementRef<'_>> + '_ {
        self.line_table
            .values()
            .map(move |id| StatementRef { program: self, id: *id })
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn procedure_count(&self) -> usize {
        self.procs.len()
    }

    /// Looks a statement up by its source line number.
    pub fn statement_at(&self, line: u32) -> Option<StatementRef<'_>> {
        self.line_table
            .get(&line)
            .map(|id| StatementRef { program: self, id: *id })
    }

    pub fn lines(&self) -> impl Iterator<Item = u32> + '_ {
        self.line_table.keys().copied()
    }

    /// Every variable named anywhere in the program: assignment targets,
    /// condition variables and expression operands.
    pub fn variables(&self) -> BTreeSet<SimpleVariable> {
        self.collect_names().variables
    }

    /// Every integer literal appearing in the program.
    pub fn constants(&self) -> BTreeSet<SimpleConstant> {
        self.collect_names().constants
    }

    fn collect_names(&self) -> NameCollector {
        let mut collector = NameCollector::default();
        for stmt in self.statements() {
            stmt.accept(&mut collector);
        }
        collector
    }

    fn stmt_ref(&self, id: StatementId) -> StatementRef<'_> {
        StatementRef { program: self, id }
    }
}

#[cfg(test)]
impl Program {
    pub(crate) fn set_next_unchecked(&mut self, stmt: StatementId, next: Option<StatementId>) {
        self.statements[stmt.0].next = next;
    }

    pub(crate) fn set_parent_unchecked(&mut self, stmt: StatementId, parent: Option<StatementId>) {
        self.statements[stmt.0].parent = parent;
    }
}

#[derive(Default)]
struct NameCollector {
    variables: BTreeSet<SimpleVariable>,
    constants: BTreeSet<SimpleConstant>,
}

impl<'a> ContainerVisitor<'a> for NameCollector {
    type Output = ();

    fn visit_conditional(&mut self, stmt: ConditionalRef<'a>) {
        self.variables.insert(stmt.variable().clone());
    }

    fn visit_while(&mut self, stmt: WhileRef<'a>) {
        self.variables.insert(stmt.variable().clone());
    }
}

impl<'a> StatementVisitor<'a> for NameCollector {
    fn visit_assignment(&mut self, stmt: AssignmentRef<'a>) {
        self.variables.insert(stmt.variable().clone());
        self.variables.extend(stmt.expr().variables());
        self.constants.extend(stmt.expr().constants());
    }

    fn visit_call(&mut self, _stmt: CallRef<'a>) {}
}

#[derive(Clone, Copy)]
pub struct ProcRef<'a> {
    program: &'a Program,
    id: ProcId,
}

impl<'a> ProcRef<'a> {
    pub fn id(&self) -> ProcId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.program.procs[self.id.0].name
    }

    /// First statement of the procedure body.
    pub fn first_statement(&self) -> StatementRef<'a> {
        self.program.stmt_ref(self.program.procs[self.id.0].body)
    }

    /// Every statement owned by the procedure, nested ones included, in line
    /// order.
    pub fn statements(&self) -> impl Iterator<Item = StatementRef<'a>> + 'a {
        let id = self.id;
        self.program
            .statements()
            .filter(move |stmt| stmt.node().proc == id)
    }
}

impl PartialEq for ProcRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.program, other.program) && self.id == other.id
    }
}

impl fmt::Debug for ProcRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proc {}", self.name())
    }
}

/// Borrowed handle on one statement of a [`Program`].
#[derive(Clone, Copy)]
pub struct StatementRef<'a> {
    program: &'a Program,
    id: StatementId,
}

impl<'a> StatementRef<'a> {
    fn node(&self) -> &'a StatementNode {
        &self.program.statements[self.id.0]
    }

    pub(crate) fn kind(&self) -> &'a StatementKind {
        &self.node().kind
    }

    pub fn id(&self) -> StatementId {
        self.id
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn line(&self) -> u32 {
        self.node().line
    }

    /// Next statement in the same statement list, `None` for the last one.
    pub fn next(&self) -> Option<StatementRef<'a>> {
        self.node().next.map(|id| self.program.stmt_ref(id))
    }

    /// Previous statement in the same statement list, `None` for the first one.
    pub fn prev(&self) -> Option<StatementRef<'a>> {
        self.node().prev.map(|id| self.program.stmt_ref(id))
    }

    /// The container (If or While) whose body holds this statement. Top level
    /// statements of a procedure have no parent: procedures do not count as
    /// containers.
    pub fn parent(&self) -> Option<StatementRef<'a>> {
        self.node().parent.map(|id| self.program.stmt_ref(id))
    }

    pub fn next_id(&self) -> Option<StatementId> {
        self.node().next
    }

    pub fn prev_id(&self) -> Option<StatementId> {
        self.node().prev
    }

    pub fn parent_id(&self) -> Option<StatementId> {
        self.node().parent
    }

    pub fn proc(&self) -> ProcRef<'a> {
        ProcRef {
            program: self.program,
            id: self.node().proc,
        }
    }

    /// Resolves the concrete statement kind and calls the matching visitor
    /// method.
    pub fn accept<V: StatementVisitor<'a>>(&self, visitor: &mut V) -> V::Output {
        let stmt = *self;
        match self.kind() {
            StatementKind::Assignment { variable, expr } => {
                visitor.visit_assignment(AssignmentRef {
                    stmt,
                    variable,
                    expr,
                })
            }
            StatementKind::Call { callee } => visitor.visit_call(CallRef {
                stmt,
                callee: *callee,
            }),
            StatementKind::Conditional {
                variable,
                then_branch,
                else_branch,
            } => visitor.visit_conditional(ConditionalRef {
                stmt,
                variable,
                then_branch: *then_branch,
                else_branch: *else_branch,
            }),
            StatementKind::While { variable, body } => visitor.visit_while(WhileRef {
                stmt,
                variable,
                body: *body,
            }),
        }
    }

    pub fn as_container(&self) -> Option<ContainerRef<'a>> {
        let stmt = *self;
        match self.kind() {
            StatementKind::Conditional {
                variable,
                then_branch,
                else_branch,
            } => Some(ContainerRef::Conditional(ConditionalRef {
                stmt,
                variable,
                then_branch: *then_branch,
                else_branch: *else_branch,
            })),
            StatementKind::While { variable, body } => Some(ContainerRef::While(WhileRef {
                stmt,
                variable,
                body: *body,
            })),
            StatementKind::Assignment { .. } | StatementKind::Call { .. } => None,
        }
    }

    /// First statement of every body nested directly in this statement.
    /// Empty for non-containers.
    pub fn sub_bodies(&self) -> Vec<StatementRef<'a>> {
        self.as_container()
            .map(|container| container.bodies())
            .unwrap_or_default()
    }
}

impl PartialEq for StatementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.program, other.program) && self.id == other.id
    }
}

impl fmt::Debug for StatementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stmt #{} (line {})", self.id.0, self.line())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AssignmentRef<'a> {
    stmt: StatementRef<'a>,
    variable: &'a SimpleVariable,
    expr: &'a Expr,
}

impl<'a> AssignmentRef<'a> {
    pub fn statement(&self) -> StatementRef<'a> {
        self.stmt
    }

    pub fn id(&self) -> StatementId {
        self.stmt.id
    }

    /// Variable on the left of the `=`.
    pub fn variable(&self) -> &'a SimpleVariable {
        self.variable
    }

    pub fn expr(&self) -> &'a Expr {
        self.expr
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CallRef<'a> {
    stmt: StatementRef<'a>,
    callee: ProcId,
}

impl<'a> CallRef<'a> {
    pub fn statement(&self) -> StatementRef<'a> {
        self.stmt
    }

    pub fn id(&self) -> StatementId {
        self.stmt.id
    }

    pub fn callee(&self) -> ProcRef<'a> {
        ProcRef {
            program: self.stmt.program,
            id: self.callee,
        }
    }
}

/// An `if v { .. } else { .. }` statement. The else branch is mandatory in
/// Simple, so both branches always exist.
#[derive(Clone, Copy, Debug)]
pub struct ConditionalRef<'a> {
    stmt: StatementRef<'a>,
    variable: &'a SimpleVariable,
    then_branch: StatementId,
    else_branch: StatementId,
}

impl<'a> ConditionalRef<'a> {
    pub fn statement(&self) -> StatementRef<'a> {
        self.stmt
    }

    pub fn id(&self) -> StatementId {
        self.stmt.id
    }

    pub fn variable(&self) -> &'a SimpleVariable {
        self.variable
    }

    pub fn then_branch(&self) -> StatementRef<'a> {
        self.stmt.program.stmt_ref(self.then_branch)
    }

    pub fn else_branch(&self) -> StatementRef<'a> {
        self.stmt.program.stmt_ref(self.else_branch)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WhileRef<'a> {
    stmt: StatementRef<'a>,
    variable: &'a SimpleVariable,
    body: StatementId,
}

impl<'a> WhileRef<'a> {
    pub fn statement(&self) -> StatementRef<'a> {
        self.stmt
    }

    pub fn id(&self) -> StatementId {
        self.stmt.id
    }

    pub fn variable(&self) -> &'a SimpleVariable {
        self.variable
    }

    pub fn body(&self) -> StatementRef<'a> {
        self.stmt.program.stmt_ref(self.body)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ContainerRef<'a> {
    Conditional(ConditionalRef<'a>),
    While(WhileRef<'a>),
}

impl<'a> ContainerRef<'a> {
    pub fn accept<V: ContainerVisitor<'a>>(&self, visitor: &mut V) -> V::Output {
        match *self {
            ContainerRef::Conditional(stmt) => visitor.visit_conditional(stmt),
            ContainerRef::While(stmt) => visitor.visit_while(stmt),
        }
    }

    pub fn statement(&self) -> StatementRef<'a> {
        match self {
            ContainerRef::Conditional(stmt) => stmt.statement(),
            ContainerRef::While(stmt) => stmt.statement(),
        }
    }

    /// First statement of each contained body, in source order.
    pub fn bodies(&self) -> Vec<StatementRef<'a>> {
        match self {
            ContainerRef::Conditional(stmt) => vec![stmt.then_branch(), stmt.else_branch()],
            ContainerRef::While(stmt) => vec![stmt.body()],
        }
    }
}
