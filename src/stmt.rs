// SPDX-License-Identifier: Apache-2.0

//! Statement representation for GIMPLE lines.
//!
//! A statement's referenced variables are always derived from its fields, so
//! renaming a field can never leave the variable list stale.

use crate::operand::Operand;
use crate::stmt_equiv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StmtKind {
    BlockHeader,
    Conditional,
    Else,
    Goto,
    Call,
    OptimizedCall,
    Phi,
    Assignment,
    Cast,
    Return,
}

impl std::fmt::Display for StmtKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StmtKind::BlockHeader => "block-header",
            StmtKind::Conditional => "conditional",
            StmtKind::Else => "else",
            StmtKind::Goto => "goto",
            StmtKind::Call => "call",
            StmtKind::OptimizedCall => "optimized-call",
            StmtKind::Phi => "phi",
            StmtKind::Assignment => "assignment",
            StmtKind::Cast => "cast",
            StmtKind::Return => "return",
        };
        write!(f, "{}", s)
    }
}

/// One `VALUE(BB)` arm of a phi.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiBranch {
    pub value: Operand,
    pub pred: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtPayload {
    BlockHeader {
        number: usize,
    },
    Conditional {
        lhs: Operand,
        op: String,
        rhs: Operand,
    },
    Else,
    Goto {
        target: usize,
    },
    Call {
        assignee: Option<Operand>,
        func: String,
        args: Vec<Operand>,
    },
    /// Tree-code style call such as `_5 = MIN_EXPR <a_2, b_3>;`.
    OptimizedCall {
        assignee: Operand,
        func: String,
        args: Vec<Operand>,
    },
    Phi {
        assignee: Operand,
        branches: Vec<PhiBranch>,
    },
    Assignment {
        assignee: Operand,
        lhs: Operand,
        rhs: Option<(String, Operand)>,
    },
    Cast {
        assignee: Operand,
        ty: String,
        address_of: bool,
        value: Operand,
    },
    Return {
        value: Option<Operand>,
    },
}

impl StmtPayload {
    pub fn kind(&self) -> StmtKind {
        match self {
            StmtPayload::BlockHeader { .. } => StmtKind::BlockHeader,
            StmtPayload::Conditional { .. } => StmtKind::Conditional,
            StmtPayload::Else => StmtKind::Else,
            StmtPayload::Goto { .. } => StmtKind::Goto,
            StmtPayload::Call { .. } => StmtKind::Call,
            StmtPayload::OptimizedCall { .. } => StmtKind::OptimizedCall,
            StmtPayload::Phi { .. } => StmtKind::Phi,
            StmtPayload::Assignment { .. } => StmtKind::Assignment,
            StmtPayload::Cast { .. } => StmtKind::Cast,
            StmtPayload::Return { .. } => StmtKind::Return,
        }
    }

    /// Operands in source order, assignee first.
    fn operands(&self) -> Vec<&Operand> {
        let mut ops: Vec<&Operand> = Vec::new();
        match self {
            StmtPayload::BlockHeader { .. }
            | StmtPayload::Else
            | StmtPayload::Goto { .. } => {}
            StmtPayload::Conditional { lhs, rhs, .. } => {
                ops.push(lhs);
                ops.push(rhs);
            }
            StmtPayload::Call { assignee, args, .. } => {
                ops.extend(assignee.iter());
                ops.extend(args.iter());
            }
            StmtPayload::OptimizedCall { assignee, args, .. } => {
                ops.push(assignee);
                ops.extend(args.iter());
            }
            StmtPayload::Phi { assignee, branches } => {
                ops.push(assignee);
                ops.extend(branches.iter().map(|b| &b.value));
            }
            StmtPayload::Assignment { assignee, lhs, rhs } => {
                ops.push(assignee);
                ops.push(lhs);
                if let Some((_, rhs)) = rhs {
                    ops.push(rhs);
                }
            }
            StmtPayload::Cast {
                assignee, value, ..
            } => {
                ops.push(assignee);
                ops.push(value);
            }
            StmtPayload::Return { value } => ops.extend(value.iter()),
        }
        ops
    }

    fn operands_mut(&mut self) -> Vec<&mut Operand> {
        let mut ops: Vec<&mut Operand> = Vec::new();
        match self {
            StmtPayload::BlockHeader { .. }
            | StmtPayload::Else
            | StmtPayload::Goto { .. } => {}
            StmtPayload::Conditional { lhs, rhs, .. } => {
                ops.push(lhs);
                ops.push(rhs);
            }
            StmtPayload::Call { assignee, args, .. } => {
                ops.extend(assignee.iter_mut());
                ops.extend(args.iter_mut());
            }
            StmtPayload::OptimizedCall { assignee, args, .. } => {
                ops.push(assignee);
                ops.extend(args.iter_mut());
            }
            StmtPayload::Phi { assignee, branches } => {
                ops.push(assignee);
                ops.extend(branches.iter_mut().map(|b| &mut b.value));
            }
            StmtPayload::Assignment { assignee, lhs, rhs } => {
                ops.push(assignee);
                ops.push(lhs);
                if let Some((_, rhs)) = rhs {
                    ops.push(rhs);
                }
            }
            StmtPayload::Cast {
                assignee, value, ..
            } => {
                ops.push(assignee);
                ops.push(value);
            }
            StmtPayload::Return { value } => ops.extend(value.iter_mut()),
        }
        ops
    }

    /// The operand written by this statement, for kinds that write one.
    pub fn assignee(&self) -> Option<&Operand> {
        match self {
            StmtPayload::Call { assignee, .. } => assignee.as_ref(),
            StmtPayload::OptimizedCall { assignee, .. }
            | StmtPayload::Phi { assignee, .. }
            | StmtPayload::Assignment { assignee, .. }
            | StmtPayload::Cast { assignee, .. } => Some(assignee),
            _ => None,
        }
    }
}

fn join_operands(ops: &[Operand]) -> String {
    ops.iter()
        .map(|op| op.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for StmtPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StmtPayload::BlockHeader { number } => write!(f, "<bb {}>:", number),
            StmtPayload::Conditional { lhs, op, rhs } => write!(f, "if ({} {} {})", lhs, op, rhs),
            StmtPayload::Else => write!(f, "else"),
            StmtPayload::Goto { target } => write!(f, "goto <bb {}>;", target),
            StmtPayload::Call {
                assignee,
                func,
                args,
            } => {
                if let Some(assignee) = assignee {
                    write!(f, "{} = ", assignee)?;
                }
                write!(f, "{} ({});", func, join_operands(args))
            }
            StmtPayload::OptimizedCall {
                assignee,
                func,
                args,
            } => write!(f, "{} = {} <{}>;", assignee, func, join_operands(args)),
            StmtPayload::Phi { assignee, branches } => {
                let branches = branches
                    .iter()
                    .map(|b| format!("{}({})", b.value, b.pred))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "# {} = PHI <{}>", assignee, branches)
            }
            StmtPayload::Assignment { assignee, lhs, rhs } => match rhs {
                Some((op, rhs)) => write!(f, "{} = {} {} {};", assignee, lhs, op, rhs),
                None => write!(f, "{} = {};", assignee, lhs),
            },
            StmtPayload::Cast {
                assignee,
                ty,
                address_of,
                value,
            } => write!(
                f,
                "{} = ({}) {}{};",
                assignee,
                ty,
                if *address_of { "&" } else { "" },
                value
            ),
            StmtPayload::Return { value } => match value {
                Some(value) => write!(f, "return {};", value),
                None => write!(f, "return;"),
            },
        }
    }
}

/// A parsed statement together with its raw text and 1-based position in its
/// block (the block header is line 1).
#[derive(Debug, Clone)]
pub struct Stmt {
    text: String,
    line: usize,
    payload: StmtPayload,
}

impl Stmt {
    pub fn new(text: &str, payload: StmtPayload) -> Self {
        Stmt {
            text: text.to_string(),
            line: 0,
            payload,
        }
    }

    /// The line as it appeared in the dump, before any renaming.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    pub fn payload(&self) -> &StmtPayload {
        &self.payload
    }

    pub fn kind(&self) -> StmtKind {
        self.payload.kind()
    }

    /// Referenced variable names: assignee first, then operands in source
    /// order. Literals are excluded; dereferences contribute their base name.
    pub fn vars(&self) -> Vec<String> {
        self.payload
            .operands()
            .into_iter()
            .filter_map(|op| op.var_name().map(str::to_string))
            .collect()
    }

    /// Like `vars`, but in the operand order of the normalized form, so that
    /// `if (a > b)` and `if (b <= a)` list their names in the same order.
    pub fn canonical_vars(&self) -> Vec<String> {
        if let StmtPayload::Conditional { lhs, op, rhs } = &self.payload {
            if stmt_equiv::conditional_swaps_operands(op) {
                return [rhs, lhs]
                    .into_iter()
                    .filter_map(|operand| operand.var_name().map(str::to_string))
                    .collect();
            }
        }
        self.vars()
    }

    /// True if the first entry of `vars()` is written by this statement.
    pub fn defines(&self) -> bool {
        match &self.payload {
            StmtPayload::Assignment { assignee, .. }
            | StmtPayload::Phi { assignee, .. }
            | StmtPayload::OptimizedCall { assignee, .. } => assignee.var_name().is_some(),
            StmtPayload::Call {
                assignee: Some(assignee),
                ..
            } => assignee.var_name().is_some(),
            _ => false,
        }
    }

    /// Name written by this statement, if it writes a variable.
    pub fn assignee_name(&self) -> Option<&str> {
        self.payload.assignee().and_then(|op| op.var_name())
    }

    pub fn rename(&mut self, old_name: &str, new_name: &str) -> bool {
        self.rename_with(&|name: &str| (name == old_name).then(|| new_name.to_string()))
    }

    /// Renames every referenced name for which `f` yields a replacement. All
    /// operands see the original names, so a swap `a <-> b` does not chain.
    pub fn rename_with<F>(&mut self, f: &F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut changed = false;
        for op in self.payload.operands_mut() {
            changed |= op.rename_with(f);
        }
        changed
    }
}

impl std::fmt::Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt_parser::parse_stmt;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn stmt(text: &str) -> Stmt {
        parse_stmt(text).unwrap().unwrap()
    }

    #[test_case("c_9 = a_5 + b_6;", &["c_9", "a_5", "b_6"]; "binary assignment")]
    #[test_case("j_10 = j_7 + 1;", &["j_10", "j_7"]; "literal operand skipped")]
    #[test_case("# a_5 = PHI <1(2), b_6(3)>", &["a_5", "b_6"]; "phi")]
    #[test_case("if (_1 != n_8(D))", &["_1", "n_8"]; "conditional")]
    #[test_case("_2 = foo (x_1, 3, &buf);", &["_2", "x_1", "buf"]; "call with assignee")]
    #[test_case("printf (\"%d\\n\", _2);", &["_2"]; "call with string literal")]
    #[test_case("_5 = MIN_EXPR <a_2, b_3>;", &["_5", "a_2", "b_3"]; "optimized call")]
    #[test_case("_1 = (long unsigned int) j_7;", &["_1", "j_7"]; "cast")]
    #[test_case("MEM[base: p_1, offset: 0B] = x_2;", &["p_1", "x_2"]; "store through mem")]
    #[test_case("return _11;", &["_11"]; "return value")]
    #[test_case("return;", &[]; "bare return")]
    #[test_case("goto <bb 4>;", &[]; "goto")]
    fn test_vars(text: &str, want: &[&str]) {
        assert_eq!(stmt(text).vars(), want);
    }

    #[test]
    fn test_canonical_vars_swap_for_greater_than() {
        assert_eq!(stmt("if (a_2(D) > b_3(D))").canonical_vars(), vec!["b_3", "a_2"]);
        assert_eq!(stmt("if (b_3(D) <= a_2(D))").canonical_vars(), vec!["b_3", "a_2"]);
        assert_eq!(stmt("if (x_1 == y_2)").canonical_vars(), vec!["x_1", "y_2"]);
    }

    #[test]
    fn test_defines() {
        assert!(stmt("c_9 = a_5 + b_6;").defines());
        assert!(stmt("# a_5 = PHI <1(2), b_6(3)>").defines());
        assert!(stmt("_5 = MIN_EXPR <a_2, b_3>;").defines());
        assert!(stmt("_2 = foo (x_1);").defines());
        assert!(!stmt("foo (x_1);").defines());
        assert!(!stmt("if (x_1 != 0)").defines());
        assert!(!stmt("return x_1;").defines());
    }

    #[test]
    fn test_rename_reserializes() {
        let mut s = stmt("# c_4 = PHI <c_3(D)(2), c_9(3)>");
        assert!(s.rename("c_9", "r_17"));
        assert_eq!(s.to_string(), "# c_4 = PHI <c_3(D)(2), r_17(3)>");
        assert_eq!(s.vars(), vec!["c_4", "c_3", "r_17"]);
        assert_eq!(s.text(), "# c_4 = PHI <c_3(D)(2), c_9(3)>");
    }

    #[test]
    fn test_rename_with_is_simultaneous() {
        let mut s = stmt("x_3 = a_1 - b_2;");
        s.rename_with(&|name: &str| match name {
            "a_1" => Some("b_2".to_string()),
            "b_2" => Some("a_1".to_string()),
            _ => None,
        });
        assert_eq!(s.to_string(), "x_3 = b_2 - a_1;");
    }

    #[test]
    fn test_rename_inside_mem_keeps_offset() {
        let mut s = stmt("_1 = MEM[base: p_4, offset: 8B];");
        s.rename("p_4", "q_9");
        assert_eq!(s.to_string(), "_1 = MEM[base: q_9, offset: 8B];");
        assert_eq!(stmt(&s.to_string()).vars(), vec!["_1", "q_9"]);
    }

    #[test]
    fn test_display_normalizes_annotations() {
        assert_eq!(stmt("<bb 3> [85.00%]:").to_string(), "<bb 3>:");
        assert_eq!(stmt("goto <bb 4>; [100.00%]").to_string(), "goto <bb 4>;");
        assert_eq!(stmt("_7 = bar (_6); [tail call]").to_string(), "_7 = bar (_6);");
    }
}
