//! Structural comparison of statements that may live in different programs.

use super::{ProcRef, Program, StatementId, StatementKind, StatementRef};

/// Compares two statements by shape: kind, variables, expressions, called
/// procedure names and nested bodies. Line numbers and arena positions are
/// ignored.
pub fn same_statement(a: StatementRef<'_>, b: StatementRef<'_>) -> bool {
    match (a.kind(), b.kind()) {
        (
            StatementKind::Assignment {
                variable: va,
                expr: ea,
            },
            StatementKind::Assignment {
                variable: vb,
                expr: eb,
            },
        ) => va == vb && ea == eb,
        (StatementKind::Call { callee: ca }, StatementKind::Call { callee: cb }) => {
            let name_a = a.program().procedure(*ca).map(|p| p.name());
            let name_b = b.program().procedure(*cb).map(|p| p.name());
            name_a.is_some() && name_a == name_b
        }
        (
            StatementKind::Conditional {
                variable: va,
                then_branch: ta,
                else_branch: xa,
            },
            StatementKind::Conditional {
                variable: vb,
                then_branch: tb,
                else_branch: xb,
            },
        ) => {
            va == vb
                && same_list_at(a.program(), *ta, b.program(), *tb)
                && same_list_at(a.program(), *xa, b.program(), *xb)
        }
        (
            StatementKind::While {
                variable: va,
                body: ba,
            },
            StatementKind::While {
                variable: vb,
                body: bb,
            },
        ) => va == vb && same_list_at(a.program(), *ba, b.program(), *bb),
        _ => false,
    }
}

/// Compares two statement lists element-wise, starting at the given first
/// statements and following `next` links.
pub fn same_statement_list(a: StatementRef<'_>, b: StatementRef<'_>) -> bool {
    let limit = a
        .program()
        .statement_count()
        .max(b.program().statement_count());
    let mut left = Some(a);
    let mut right = Some(b);
    for _ in 0..=limit {
        match (left, right) {
            (None, None) => return true,
            (Some(l), Some(r)) => {
                if !same_statement(l, r) {
                    return false;
                }
                left = l.next();
                right = r.next();
            }
            _ => return false,
        }
    }
    // Longer than either arena: a cycle.
    false
}

/// Compares two procedures by name and body.
pub fn same_procedure(a: ProcRef<'_>, b: ProcRef<'_>) -> bool {
    a.name() == b.name() && same_statement_list(a.first_statement(), b.first_statement())
}

/// Compares two programs procedure by procedure, in declaration order.
pub fn same_program(a: &Program, b: &Program) -> bool {
    a.procedure_count() == b.procedure_count()
        && a
            .procedures()
            .zip(b.procedures())
            .all(|(pa, pb)| same_procedure(pa, pb))
}

fn same_list_at(pa: &Program, a: StatementId, pb: &Program, b: StatementId) -> bool {
    match (pa.statement(a), pb.statement(b)) {
        (Some(a), Some(b)) => same_statement_list(a, b),
        _ => false,
    }
}
