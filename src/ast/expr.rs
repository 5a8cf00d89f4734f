use std::{collections::BTreeSet, fmt};

use strum_macros::{Display, EnumString};

use super::visitor::ExprVisitor;

/// A variable name. Used wherever an API expects a Simple variable rather
/// than an arbitrary string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimpleVariable(String);

impl SimpleVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SimpleVariable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for SimpleVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An integer literal. Simple only has integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimpleConstant(i64);

impl SimpleConstant {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for SimpleConstant {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SimpleConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum BinaryOperator {
    #[strum(to_string = "+")]
    Plus,
    #[strum(to_string = "-")]
    Minus,
    #[strum(to_string = "*")]
    Times,
}

/// Right hand side of an assignment. Expressions are plain values: they are
/// owned by their assignment and compared structurally.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    Variable(SimpleVariable),
    Constant(SimpleConstant),
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn variable(name: &str) -> Self {
        Expr::Variable(SimpleVariable::new(name))
    }

    pub fn constant(value: i64) -> Self {
        Expr::Constant(SimpleConstant::new(value))
    }

    pub fn binary(op: BinaryOperator, lhs: Expr, rhs: Expr) -> Self {
        Expr::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn accept<'e, V: ExprVisitor<'e>>(&'e self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Variable(var) => visitor.visit_variable(var),
            Expr::Constant(constant) => visitor.visit_constant(*constant),
            Expr::BinaryOp { op, lhs, rhs } => visitor.visit_binary_op(*op, lhs, rhs),
        }
    }

    /// Every variable referenced anywhere in the expression tree.
    pub fn variables(&self) -> BTreeSet<SimpleVariable> {
        let mut collector = LeafCollector::default();
        self.accept(&mut collector);
        collector.variables
    }

    /// Every constant appearing anywhere in the expression tree.
    pub fn constants(&self) -> BTreeSet<SimpleConstant> {
        let mut collector = LeafCollector::default();
        self.accept(&mut collector);
        collector.constants
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(var) => write!(f, "{}", var),
            Expr::Constant(constant) => write!(f, "{}", constant),
            Expr::BinaryOp { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

#[derive(Default)]
struct LeafCollector {
    variables: BTreeSet<SimpleVariable>,
    constants: BTreeSet<SimpleConstant>,
}

impl<'e> ExprVisitor<'e> for LeafCollector {
    type Output = ();

    fn visit_variable(&mut self, var: &'e SimpleVariable) {
        self.variables.insert(var.clone());
    }

    fn visit_constant(&mut self, constant: SimpleConstant) {
        self.constants.insert(constant);
    }

    fn visit_binary_op(&mut self, _op: BinaryOperator, lhs: &'e Expr, rhs: &'e Expr) {
        lhs.accept(self);
        rhs.accept(self);
    }
}
