// SPDX-License-Identifier: Apache-2.0

//! Statement equivalence used by the comparison engine.
//!
//! Each kind has its own named rule so the policy can be tested directly:
//! commutative binary operators tolerate swapped operands, conditionals are
//! compared in a normalized relational form, phis ignore branch order, and
//! everything else compares by its re-serialized text.

use crate::operand::Operand;
use crate::stmt::{PhiBranch, Stmt, StmtPayload};

pub fn is_commutative(op: &str) -> bool {
    matches!(op, "+" | "*" | "|" | "&" | "^")
}

/// True for the relational operators whose normal form swaps operands.
pub fn conditional_swaps_operands(op: &str) -> bool {
    matches!(op, ">" | ">=")
}

/// Maps `lhs op rhs` to its normal form: `==` and `!=` share the `!=` class,
/// `>` becomes `<=` and `>=` becomes `<`, both with operands swapped.
pub fn normalize_conditional<'a>(
    lhs: &'a Operand,
    op: &'a str,
    rhs: &'a Operand,
) -> (&'a str, &'a Operand, &'a Operand) {
    match op {
        "==" | "!=" => ("!=", lhs, rhs),
        ">" => ("<=", rhs, lhs),
        ">=" => ("<", rhs, lhs),
        _ => (op, lhs, rhs),
    }
}

pub fn assignments_equivalent(a: &Stmt, b: &Stmt) -> bool {
    let (
        StmtPayload::Assignment {
            assignee: a_assignee,
            lhs: a_lhs,
            rhs: a_rhs,
        },
        StmtPayload::Assignment {
            assignee: b_assignee,
            lhs: b_lhs,
            rhs: b_rhs,
        },
    ) = (a.payload(), b.payload())
    else {
        return false;
    };
    if a_assignee != b_assignee {
        return false;
    }
    match (a_rhs, b_rhs) {
        (None, None) => a_lhs == b_lhs,
        (Some((a_op, a_rhs)), Some((b_op, b_rhs))) => {
            if a_op != b_op {
                return false;
            }
            (a_lhs == b_lhs && a_rhs == b_rhs)
                || (is_commutative(a_op) && a_lhs == b_rhs && a_rhs == b_lhs)
        }
        _ => false,
    }
}

pub fn conditionals_equivalent(a: &Stmt, b: &Stmt) -> bool {
    let (
        StmtPayload::Conditional {
            lhs: a_lhs,
            op: a_op,
            rhs: a_rhs,
        },
        StmtPayload::Conditional {
            lhs: b_lhs,
            op: b_op,
            rhs: b_rhs,
        },
    ) = (a.payload(), b.payload())
    else {
        return false;
    };
    let (a_op, a_lhs, a_rhs) = normalize_conditional(a_lhs, a_op, a_rhs);
    let (b_op, b_lhs, b_rhs) = normalize_conditional(b_lhs, b_op, b_rhs);
    if a_op != b_op {
        return false;
    }
    (a_lhs == b_lhs && a_rhs == b_rhs) || (a_op == "!=" && a_lhs == b_rhs && a_rhs == b_lhs)
}

/// Calls match on function name, the exact ordered argument list, and the
/// assignee.
pub fn calls_equivalent(a: &Stmt, b: &Stmt) -> bool {
    match (a.payload(), b.payload()) {
        (
            StmtPayload::Call {
                assignee: a_assignee,
                func: a_func,
                args: a_args,
            },
            StmtPayload::Call {
                assignee: b_assignee,
                func: b_func,
                args: b_args,
            },
        ) => a_assignee == b_assignee && a_func == b_func && a_args == b_args,
        (
            StmtPayload::OptimizedCall {
                assignee: a_assignee,
                func: a_func,
                args: a_args,
            },
            StmtPayload::OptimizedCall {
                assignee: b_assignee,
                func: b_func,
                args: b_args,
            },
        ) => a_assignee == b_assignee && a_func == b_func && a_args == b_args,
        _ => false,
    }
}

fn sorted_branches(branches: &[PhiBranch]) -> Vec<&PhiBranch> {
    let mut sorted: Vec<&PhiBranch> = branches.iter().collect();
    sorted.sort_by_key(|b| b.pred);
    sorted
}

pub fn phis_equivalent(a: &Stmt, b: &Stmt) -> bool {
    let (
        StmtPayload::Phi {
            assignee: a_assignee,
            branches: a_branches,
        },
        StmtPayload::Phi {
            assignee: b_assignee,
            branches: b_branches,
        },
    ) = (a.payload(), b.payload())
    else {
        return false;
    };
    a_assignee == b_assignee && sorted_branches(a_branches) == sorted_branches(b_branches)
}

/// Statement equality as used for scoring. Statements of different kinds are
/// never equivalent.
pub fn stmts_equivalent(a: &Stmt, b: &Stmt) -> bool {
    match (a.payload(), b.payload()) {
        (StmtPayload::Assignment { .. }, _) => assignments_equivalent(a, b),
        (StmtPayload::Conditional { .. }, _) => conditionals_equivalent(a, b),
        (StmtPayload::Call { .. }, _) | (StmtPayload::OptimizedCall { .. }, _) => {
            calls_equivalent(a, b)
        }
        (StmtPayload::Phi { .. }, _) => phis_equivalent(a, b),
        (x, y) => x.kind() == y.kind() && x.to_string() == y.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt_parser::parse_stmt;
    use test_case::test_case;

    fn stmt(text: &str) -> Stmt {
        parse_stmt(text).unwrap().unwrap()
    }

    #[test_case("a = b + c;", "a = c + b;", true; "commutative plus")]
    #[test_case("a = b * c;", "a = c * b;", true; "commutative times")]
    #[test_case("a = b ^ c;", "a = c ^ b;", true; "commutative xor")]
    #[test_case("a = b - c;", "a = c - b;", false; "minus is ordered")]
    #[test_case("a = b + c;", "d = b + c;", false; "different assignee")]
    #[test_case("a = b + c;", "a = b * c;", false; "different operator")]
    #[test_case("a = b;", "a = b;", true; "copy")]
    #[test_case("a = b;", "a = b + 0;", false; "copy versus binary")]
    fn test_assignments(lhs: &str, rhs: &str, want: bool) {
        assert_eq!(assignments_equivalent(&stmt(lhs), &stmt(rhs)), want);
        assert_eq!(stmts_equivalent(&stmt(lhs), &stmt(rhs)), want);
    }

    #[test_case("if (a > b)", "if (b <= a)", true; "greater is swapped less equal")]
    #[test_case("if (a >= b)", "if (b < a)", true; "greater equal is swapped less")]
    #[test_case("if (a == b)", "if (b == a)", true; "equality tolerates swap")]
    #[test_case("if (a != b)", "if (b != a)", true; "inequality tolerates swap")]
    #[test_case("if (a == b)", "if (a != b)", true; "equality shares inequality class")]
    #[test_case("if (a < b)", "if (b < a)", false; "less is ordered")]
    #[test_case("if (a <= b)", "if (a < b)", false; "less equal differs from less")]
    #[test_case("if (a > b)", "if (a > b)", true; "identical")]
    fn test_conditionals(lhs: &str, rhs: &str, want: bool) {
        assert_eq!(conditionals_equivalent(&stmt(lhs), &stmt(rhs)), want);
    }

    #[test_case("foo (a, b);", "foo (a, b);", true; "same call")]
    #[test_case("foo (a, b);", "foo (b, a);", false; "argument order matters")]
    #[test_case("foo (a, b);", "bar (a, b);", false; "different callee")]
    #[test_case("x = foo (a);", "y = foo (a);", false; "different assignee")]
    #[test_case("x = MAX_EXPR <a, b>;", "x = MAX_EXPR <a, b>;", true; "same optimized call")]
    #[test_case("x = MAX_EXPR <a, b>;", "x = MAX_EXPR <b, a>;", false; "optimized argument order")]
    fn test_calls(lhs: &str, rhs: &str, want: bool) {
        assert_eq!(calls_equivalent(&stmt(lhs), &stmt(rhs)), want);
    }

    #[test]
    fn test_phi_branch_order_is_irrelevant() {
        let a = stmt("# x_1 = PHI <0(2), x_4(3)>");
        let b = stmt("# x_1 = PHI <x_4(3), 0(2)>");
        assert!(phis_equivalent(&a, &b));
        let c = stmt("# x_1 = PHI <x_4(2), 0(3)>");
        assert!(!phis_equivalent(&a, &c));
    }

    #[test]
    fn test_text_kinds_compare_by_normalized_text() {
        assert!(stmts_equivalent(
            &stmt("goto <bb 3>; [85.00%]"),
            &stmt("goto <bb 3>;")
        ));
        assert!(stmts_equivalent(&stmt("<bb 2> [15.00%]:"), &stmt("<bb 2>:")));
        assert!(!stmts_equivalent(&stmt("goto <bb 3>;"), &stmt("goto <bb 4>;")));
        assert!(stmts_equivalent(&stmt("return x_1;"), &stmt("return x_1;")));
        assert!(!stmts_equivalent(&stmt("return x_1;"), &stmt("return;")));
    }

    #[test]
    fn test_different_kinds_are_never_equivalent() {
        assert!(!stmts_equivalent(&stmt("else"), &stmt("return;")));
        assert!(!stmts_equivalent(&stmt("foo (a);"), &stmt("x = MAX_EXPR <a>;")));
        assert!(!stmts_equivalent(&stmt("a = b;"), &stmt("if (a != b)")));
    }
}
