// SPDX-License-Identifier: Apache-2.0

//! Basic blocks and the splitter that carves a function body into them.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::error::GimpleError;
use crate::stmt::{Stmt, StmtKind, StmtPayload};
use crate::stmt_parser::{block_header_number, parse_stmt};

#[derive(Debug, Clone)]
pub struct Block {
    number: usize,
    stmts: Vec<Stmt>,
    vars: BTreeSet<String>,
    dropped_lines: usize,
    pub(crate) out_edges: BTreeSet<usize>,
    pub(crate) in_edges: BTreeSet<usize>,
}

impl Block {
    /// Builds a block from its raw lines; the first line must be the
    /// `<bb N>:` header. Lines that match no grammar are dropped and counted.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, GimpleError> {
        let Some((header, rest)) = lines.split_first() else {
            return Err(GimpleError::EmptyBlock);
        };
        let header_text = header.as_ref().trim();
        let Some(number) = block_header_number(header_text) else {
            return Err(GimpleError::MalformedBlockHeader(header_text.to_string()));
        };

        let mut stmts = vec![Stmt::new(header_text, StmtPayload::BlockHeader { number })];
        let mut dropped_lines = 0;
        for line in rest {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            match parse_stmt(line)? {
                Some(stmt) if stmt.kind() == StmtKind::BlockHeader => {
                    return Err(GimpleError::MalformedBlockHeader(line.to_string()));
                }
                Some(stmt) => stmts.push(stmt),
                None => {
                    log::debug!("<bb {}>: dropping unrecognized line: {}", number, line);
                    dropped_lines += 1;
                }
            }
        }

        let mut block = Block {
            number,
            stmts,
            vars: BTreeSet::new(),
            dropped_lines,
            out_edges: BTreeSet::new(),
            in_edges: BTreeSet::new(),
        };
        block.sort_leading_phis();
        block.refresh_vars();
        Ok(block)
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Statements in line order; the header is line 1.
    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    /// Statement at a 1-based line number.
    pub fn stmt_at(&self, line: usize) -> Option<&Stmt> {
        self.stmts.get(line.checked_sub(1)?)
    }

    pub(crate) fn stmt_at_mut(&mut self, line: usize) -> Option<&mut Stmt> {
        self.stmts.get_mut(line.checked_sub(1)?)
    }

    /// Every distinct name referenced by a statement in this block.
    pub fn vars(&self) -> &BTreeSet<String> {
        &self.vars
    }

    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    pub fn out_edges(&self) -> &BTreeSet<usize> {
        &self.out_edges
    }

    pub fn in_edges(&self) -> &BTreeSet<usize> {
        &self.in_edges
    }

    pub(crate) fn refresh_vars(&mut self) {
        self.vars = self.stmts.iter().flat_map(|s| s.vars()).collect();
    }

    fn renumber_lines(&mut self) {
        for (i, stmt) in self.stmts.iter_mut().enumerate() {
            stmt.set_line(i + 1);
        }
    }

    /// Index range of the run of phis right after the header.
    fn phi_run(&self) -> Range<usize> {
        let start = match self.stmts.first() {
            Some(s) if s.kind() == StmtKind::BlockHeader => 1,
            _ => 0,
        };
        let run = self.stmts[start..]
            .iter()
            .take_while(|s| s.kind() == StmtKind::Phi)
            .count();
        start..start + run
    }

    /// The leading phis, in their current order.
    pub(crate) fn leading_phis(&self) -> &[Stmt] {
        &self.stmts[self.phi_run()]
    }

    /// Line under which a statement is recorded in define-use chains. Every
    /// leading phi is recorded under the first phi's line, so the chains do
    /// not depend on the order the phis happen to be listed in.
    pub(crate) fn chain_line(&self, line: usize) -> usize {
        let run = self.phi_run();
        if line > run.start && line <= run.end {
            run.start + 1
        } else {
            line
        }
    }

    /// Stable-sorts the run of phis right after the header by assignee, then
    /// renumbers. Phi emission order is not meaningful.
    pub fn sort_leading_phis(&mut self) {
        let run = self.phi_run();
        self.stmts[run].sort_by(|a, b| a.assignee_name().cmp(&b.assignee_name()));
        self.renumber_lines();
    }

    pub fn rename(&mut self, old_name: &str, new_name: &str) -> bool {
        self.rename_with(&|name: &str| (name == old_name).then(|| new_name.to_string()))
    }

    pub fn rename_with<F>(&mut self, f: &F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut changed = false;
        for stmt in self.stmts.iter_mut() {
            changed |= stmt.rename_with(f);
        }
        if changed {
            self.refresh_vars();
        }
        changed
    }

    /// Removes every statement matching `pred` and renumbers the rest.
    pub(crate) fn remove_where<P>(&mut self, pred: P) -> usize
    where
        P: Fn(&Stmt) -> bool,
    {
        let before = self.stmts.len();
        self.stmts.retain(|s| !pred(s));
        self.renumber_lines();
        self.refresh_vars();
        before - self.stmts.len()
    }

    /// Block numbers control may flow to: every goto target, plus the next
    /// block when the last statement is not a goto.
    pub fn out_edge_targets(&self) -> Vec<usize> {
        let mut targets: Vec<usize> = self
            .stmts
            .iter()
            .filter_map(|s| match s.payload() {
                StmtPayload::Goto { target } => Some(*target),
                _ => None,
            })
            .collect();
        match self.stmts.last() {
            Some(s) if s.kind() == StmtKind::Goto => {}
            _ => targets.push(self.number + 1),
        }
        targets
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for stmt in &self.stmts {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// Splits function body lines into blocks. A header starts a block, a blank
/// line ends it, and lines outside any block (declarations) are skipped.
pub fn split_blocks<S: AsRef<str>>(body: &[S]) -> Result<Vec<Block>, GimpleError> {
    let mut blocks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    for line in body {
        let line = line.as_ref().trim();
        if block_header_number(line).is_some() {
            if !pending.is_empty() {
                blocks.push(Block::from_lines(&pending)?);
            }
            pending = vec![line];
        } else if line.is_empty() {
            if !pending.is_empty() {
                blocks.push(Block::from_lines(&pending)?);
            }
            pending.clear();
        } else if !pending.is_empty() {
            pending.push(line);
        }
    }
    if !pending.is_empty() {
        blocks.push(Block::from_lines(&pending)?);
    }
    log::debug!("split body into {} blocks", blocks.len());
    Ok(blocks)
}
