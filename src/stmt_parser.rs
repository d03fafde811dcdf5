// SPDX-License-Identifier: Apache-2.0

//! Line-level parser for GIMPLE statements.
//!
//! Grammars are tried in a fixed order and the first full-line match wins.
//! Several grammars share the `ASSIGNEE = ...` prefix; the right-hand side
//! shape decides between assignment, optimized call, and cast.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{GimpleError, UnsupportedKind};
use crate::operand::Operand;
use crate::stmt::{PhiBranch, Stmt, StmtKind, StmtPayload};

/// A single operand token: a `MEM[...]` dereference, a string literal, or a
/// possibly prefixed name or number with an optional default-def marker.
const OPERAND: &str = r#"(?:MEM\[[^\]]*\]|"(?:[^"\\]|\\.)*"|[&~-]?[\w.]+(?:\(D\))?)"#;

fn grammar(pattern: &str) -> Regex {
    Regex::new(&pattern.replace("{OP}", OPERAND)).expect("valid statement grammar")
}

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| grammar(r"^<bb (?P<number>\d+)>(?: \[[^\]]*\])?:$"));
static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| grammar(r"^(?:<[^>\s]+>|[A-Za-z_][\w.]*)(?: \[[^\]]*\])?:$"));
static SWITCH_RE: Lazy<Regex> = Lazy::new(|| grammar(r"^switch \("));
static COND_RE: Lazy<Regex> =
    Lazy::new(|| grammar(r"^if \((?P<lhs>{OP}) (?P<op>\S+) (?P<rhs>{OP})\)$"));
static ELSE_RE: Lazy<Regex> = Lazy::new(|| grammar(r"^else$"));
static GOTO_RE: Lazy<Regex> = Lazy::new(|| {
    grammar(r"^goto <bb (?P<target>\d+)>(?: \([^)]*\))?;(?: \[[^\]]*\])?$")
});
static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    grammar(r"^(?:(?P<assignee>{OP}) = )?(?P<func>[\w.]+) \((?P<args>.*)\);(?: \[tail call\])?$")
});
static PHI_RE: Lazy<Regex> =
    Lazy::new(|| grammar(r"^# (?P<assignee>{OP}) = PHI <(?P<branches>.*)>$"));
static PHI_BRANCH_RE: Lazy<Regex> = Lazy::new(|| grammar(r"^(?P<value>.+)\((?P<pred>\d+)\)$"));
static ASSIGN_RE: Lazy<Regex> = Lazy::new(|| {
    grammar(r"^(?P<assignee>{OP}) = (?P<lhs>{OP})(?: (?P<op>\S+) (?P<rhs>{OP}))?;$")
});
static OPTIMIZED_RE: Lazy<Regex> =
    Lazy::new(|| grammar(r"^(?P<assignee>{OP}) = (?P<func>[\w.]+) ?<(?P<args>.*)>;$"));
static CAST_RE: Lazy<Regex> = Lazy::new(|| {
    grammar(r"^(?P<assignee>{OP}) = \((?P<ty>.+)\) ?(?P<addr>&)?(?P<value>{OP});$")
});
static RETURN_RE: Lazy<Regex> = Lazy::new(|| grammar(r"^return(?: (?P<value>{OP}))?;$"));

type GrammarFn = fn(&str) -> Option<StmtPayload>;

/// Candidate grammars in priority order.
const GRAMMARS: &[(StmtKind, GrammarFn)] = &[
    (StmtKind::BlockHeader, parse_block_header),
    (StmtKind::Conditional, parse_conditional),
    (StmtKind::Else, parse_else),
    (StmtKind::Goto, parse_goto),
    (StmtKind::Call, parse_call),
    (StmtKind::Phi, parse_phi),
    (StmtKind::Assignment, parse_assignment),
    (StmtKind::OptimizedCall, parse_optimized_call),
    (StmtKind::Cast, parse_cast),
    (StmtKind::Return, parse_return),
];

/// Splits on commas that are not nested inside parens, brackets, or a string
/// literal.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = s[start..].trim();
    if !last.is_empty() || !pieces.is_empty() {
        pieces.push(last);
    }
    pieces
}

fn parse_args(s: &str) -> Vec<Operand> {
    split_top_level(s).into_iter().map(Operand::parse).collect()
}

fn parse_block_header(line: &str) -> Option<StmtPayload> {
    let caps = HEADER_RE.captures(line)?;
    let number = caps["number"].parse().ok()?;
    Some(StmtPayload::BlockHeader { number })
}

fn parse_conditional(line: &str) -> Option<StmtPayload> {
    let caps = COND_RE.captures(line)?;
    Some(StmtPayload::Conditional {
        lhs: Operand::parse(&caps["lhs"]),
        op: caps["op"].to_string(),
        rhs: Operand::parse(&caps["rhs"]),
    })
}

fn parse_else(line: &str) -> Option<StmtPayload> {
    ELSE_RE.is_match(line).then_some(StmtPayload::Else)
}

fn parse_goto(line: &str) -> Option<StmtPayload> {
    let caps = GOTO_RE.captures(line)?;
    let target = caps["target"].parse().ok()?;
    Some(StmtPayload::Goto { target })
}

fn parse_call(line: &str) -> Option<StmtPayload> {
    let caps = CALL_RE.captures(line)?;
    Some(StmtPayload::Call {
        assignee: caps.name("assignee").map(|m| Operand::parse(m.as_str())),
        func: caps["func"].to_string(),
        args: parse_args(&caps["args"]),
    })
}

fn parse_phi(line: &str) -> Option<StmtPayload> {
    let caps = PHI_RE.captures(line)?;
    let mut branches = Vec::new();
    for branch in split_top_level(&caps["branches"]) {
        let b = PHI_BRANCH_RE.captures(branch)?;
        branches.push(PhiBranch {
            value: Operand::parse(&b["value"]),
            pred: b["pred"].parse().ok()?,
        });
    }
    Some(StmtPayload::Phi {
        assignee: Operand::parse(&caps["assignee"]),
        branches,
    })
}

fn parse_assignment(line: &str) -> Option<StmtPayload> {
    let caps = ASSIGN_RE.captures(line)?;
    let rhs = match (caps.name("op"), caps.name("rhs")) {
        (Some(op), Some(rhs)) => Some((op.as_str().to_string(), Operand::parse(rhs.as_str()))),
        _ => None,
    };
    Some(StmtPayload::Assignment {
        assignee: Operand::parse(&caps["assignee"]),
        lhs: Operand::parse(&caps["lhs"]),
        rhs,
    })
}

fn parse_optimized_call(line: &str) -> Option<StmtPayload> {
    let caps = OPTIMIZED_RE.captures(line)?;
    Some(StmtPayload::OptimizedCall {
        assignee: Operand::parse(&caps["assignee"]),
        func: caps["func"].to_string(),
        args: parse_args(&caps["args"]),
    })
}

fn parse_cast(line: &str) -> Option<StmtPayload> {
    let caps = CAST_RE.captures(line)?;
    Some(StmtPayload::Cast {
        assignee: Operand::parse(&caps["assignee"]),
        ty: caps["ty"].to_string(),
        address_of: caps.name("addr").is_some(),
        value: Operand::parse(&caps["value"]),
    })
}

fn parse_return(line: &str) -> Option<StmtPayload> {
    let caps = RETURN_RE.captures(line)?;
    Some(StmtPayload::Return {
        value: caps.name("value").map(|m| Operand::parse(m.as_str())),
    })
}

fn check_supported(line: &str) -> Result<(), GimpleError> {
    let kind = if LABEL_RE.is_match(line) {
        UnsupportedKind::Label
    } else if SWITCH_RE.is_match(line) {
        UnsupportedKind::Switch
    } else {
        return Ok(());
    };
    Err(GimpleError::UnsupportedStatement {
        kind,
        text: line.to_string(),
    })
}

/// Parses one line of a function body.
///
/// Returns `Ok(None)` when no grammar matches; callers drop such lines. Labels
/// and switches are an error rather than a silent drop.
pub fn parse_stmt(line: &str) -> Result<Option<Stmt>, GimpleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if HEADER_RE.is_match(line) {
        return Ok(parse_block_header(line).map(|payload| Stmt::new(line, payload)));
    }
    check_supported(line)?;
    for (kind, parse) in GRAMMARS {
        if let Some(payload) = parse(line) {
            log::trace!("parsed {} statement: {}", kind, line);
            return Ok(Some(Stmt::new(line, payload)));
        }
    }
    Ok(None)
}

/// Returns the block number if `line` is a `<bb N>:` header.
pub fn block_header_number(line: &str) -> Option<usize> {
    match parse_block_header(line.trim())? {
        StmtPayload::BlockHeader { number } => Some(number),
        _ => None,
    }
}
