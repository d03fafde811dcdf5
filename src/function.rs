// SPDX-License-Identifier: Apache-2.0

//! Function model built from one function's GIMPLE dump.
//!
//! Build pipeline: header and body extraction, declaration scan (preamble
//! and formal parameters), block construction, name resolution, cast
//! elimination, re-resolution, define-use chains, and block edges.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::{split_blocks, Block};
use crate::error::GimpleError;
use crate::operand::{is_identifier, Operand};
use crate::stmt::{Stmt, StmtKind, StmtPayload};
use crate::stmt_parser::block_header_number;
use crate::var::{DucEntry, Variable};

static FUNCTION_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^;; Function (?P<name>\S+) \((?P<asm>\S+), funcdef_no=(?P<funcdef_no>\d+), decl_uid=(?P<decl_uid>\d+), cgraph_uid=(?P<cgraph_uid>\d+), symbol_order=(?P<symbol_order>\d+)\)",
    )
    .expect("valid function header regex")
});

/// `NAME (PARAMS)`, optionally preceded by the return type as GCC 8 and
/// later print it.
static SIGNATURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:.+ )?(?P<name>[\w.]+) \((?P<params>.*)\)$")
        .expect("valid signature regex")
});

static DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ty>.+) (?P<name>[^\s;]+);$").expect("valid declaration regex")
});

const FUNCTION_HEADER_PREFIX: &str = ";; Function ";

/// Provenance numbers from the `;; Function` header. Not used for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionId {
    pub funcdef_no: usize,
    pub decl_uid: usize,
    pub cgraph_uid: usize,
    pub symbol_order: usize,
}

#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    file_name: Option<String>,
    id: FunctionId,
    /// Lines the model was built from; `reset` rebuilds from these.
    source: Vec<String>,
    blocks: Vec<Block>,
    /// Block number to position in `blocks`.
    block_index: BTreeMap<usize, usize>,
    vars: BTreeMap<String, Variable>,
    used: BTreeSet<String>,
    used_to_decl: BTreeMap<String, String>,
}

struct Extracted<'a> {
    name: String,
    id: FunctionId,
    signature: Option<&'a str>,
    body: &'a [String],
}

fn extract(source: &[String]) -> Result<Extracted<'_>, GimpleError> {
    let header_pos = source
        .iter()
        .position(|l| l.trim_start().starts_with(FUNCTION_HEADER_PREFIX))
        .ok_or(GimpleError::MissingFunctionHeader)?;
    let header = source[header_pos].trim();
    let caps = FUNCTION_HEADER_RE
        .captures(header)
        .ok_or_else(|| GimpleError::MalformedFunctionHeader(header.to_string()))?;
    let number = |field: &str| -> Result<usize, GimpleError> {
        caps[field]
            .parse()
            .map_err(|_| GimpleError::MalformedFunctionHeader(header.to_string()))
    };
    let id = FunctionId {
        funcdef_no: number("funcdef_no")?,
        decl_uid: number("decl_uid")?,
        cgraph_uid: number("cgraph_uid")?,
        symbol_order: number("symbol_order")?,
    };
    let name = caps["name"].to_string();

    let open = source[header_pos + 1..]
        .iter()
        .position(|l| l.trim() == "{")
        .map(|i| header_pos + 1 + i)
        .ok_or_else(|| GimpleError::MissingBody(name.clone()))?;
    let close = source[open + 1..]
        .iter()
        .position(|l| l.trim() == "}")
        .map(|i| open + 1 + i)
        .ok_or_else(|| GimpleError::UnterminatedBody(name.clone()))?;
    let signature = source[header_pos + 1..open]
        .iter()
        .map(|l| l.trim())
        .filter(|l| SIGNATURE_RE.is_match(l))
        .last();

    Ok(Extracted {
        name,
        id,
        signature,
        body: &source[open + 1..close],
    })
}

/// `TYPE NAME;` lines ahead of the first block header.
fn scan_declarations(body: &[String]) -> Vec<Variable> {
    body.iter()
        .map(|l| l.trim())
        .take_while(|l| block_header_number(l).is_none())
        .filter(|l| !l.is_empty())
        .filter_map(|l| {
            let Some(caps) = DECL_RE.captures(l) else {
                log::debug!("skipping unrecognized preamble line: {}", l);
                return None;
            };
            let name = &caps["name"];
            let ty = &caps["ty"];
            Some(match name.find('[') {
                Some(pos) => Variable::new(&name[..pos], &format!("{} {}", ty, &name[pos..])),
                None => Variable::new(name, ty),
            })
        })
        .collect()
}

/// Formal parameters from a `[RET] NAME (TYPE NAME, ...)` signature line.
fn scan_parameters(signature: &str) -> Vec<Variable> {
    let Some(caps) = SIGNATURE_RE.captures(signature) else {
        return Vec::new();
    };
    caps["params"]
        .split(", ")
        .filter_map(|param| {
            let (ty, name) = param.trim().rsplit_once(' ')?;
            is_identifier(name).then(|| Variable::new(name, ty))
        })
        .collect()
}

/// True if `used` is `decl` followed by an SSA version suffix `_N`.
fn is_ssa_version_of(used: &str, decl: &str) -> bool {
    used.strip_prefix(decl)
        .and_then(|rest| rest.strip_prefix('_'))
        .map_or(false, |digits| {
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        })
}

impl Function {
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, GimpleError> {
        let source = lines.iter().map(|l| l.as_ref().to_string()).collect();
        Self::build(source, None)
    }

    pub fn parse(text: &str) -> Result<Self, GimpleError> {
        Self::from_lines(&text.lines().collect::<Vec<_>>())
    }

    /// Parses every function in a dump; each `;; Function` line starts a new
    /// one.
    pub fn parse_all(text: &str) -> Result<Vec<Self>, GimpleError> {
        let mut chunks: Vec<Vec<&str>> = Vec::new();
        for line in text.lines() {
            if line.trim_start().starts_with(FUNCTION_HEADER_PREFIX) {
                chunks.push(vec![line]);
            } else if let Some(chunk) = chunks.last_mut() {
                chunk.push(line);
            }
        }
        if chunks.is_empty() {
            return Err(GimpleError::MissingFunctionHeader);
        }
        chunks.iter().map(|c| Self::from_lines(c)).collect()
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }

    fn build(source: Vec<String>, file_name: Option<String>) -> Result<Self, GimpleError> {
        let extracted = extract(&source)?;
        let mut vars: BTreeMap<String, Variable> = BTreeMap::new();
        for v in scan_declarations(extracted.body) {
            vars.insert(v.name().to_string(), v);
        }
        if let Some(signature) = extracted.signature {
            for v in scan_parameters(signature) {
                vars.entry(v.name().to_string()).or_insert(v);
            }
        }
        let blocks = split_blocks(extracted.body)?;
        let mut block_index = BTreeMap::new();
        for (i, block) in blocks.iter().enumerate() {
            if block_index.insert(block.number(), i).is_some() {
                return Err(GimpleError::DuplicateBlock(block.number()));
            }
        }
        let name = extracted.name;
        let id = extracted.id;

        let mut f = Function {
            name,
            file_name,
            id,
            source: Vec::new(),
            blocks,
            block_index,
            vars,
            used: BTreeSet::new(),
            used_to_decl: BTreeMap::new(),
        };
        f.link();
        f.eliminate_casts();
        f.refresh();
        f.build_edges();
        f.source = source;
        log::debug!(
            "built function {}: {} blocks, {} variables, {} dropped lines",
            f.name,
            f.blocks.len(),
            f.vars.len(),
            f.dropped_lines()
        );
        Ok(f)
    }

    /// Rebuilds the model from the lines it was created from, discarding any
    /// renaming.
    pub fn reset(&mut self) -> Result<(), GimpleError> {
        *self = Self::build(self.source.clone(), self.file_name.clone())?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, number: usize) -> Option<&Block> {
        self.block_index.get(&number).map(|&i| &self.blocks[i])
    }

    /// Declared and implicit variables, ordered by name.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Every name referenced by some statement.
    pub fn used_names(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// The variable a used (possibly SSA-suffixed) name belongs to.
    pub fn resolve(&self, used: &str) -> Option<&Variable> {
        self.used_to_decl.get(used).and_then(|d| self.vars.get(d))
    }

    /// All statements in block-then-line order.
    pub fn stmts(&self) -> impl Iterator<Item = &Stmt> {
        self.blocks.iter().flat_map(|b| b.stmts().iter())
    }

    pub fn stmt_count(&self) -> usize {
        self.blocks.iter().map(|b| b.stmts().len()).sum()
    }

    pub fn stmt_at(&self, entry: DucEntry) -> Option<&Stmt> {
        self.block(entry.block)?.stmt_at(entry.line)
    }

    pub(crate) fn stmt_at_mut(&mut self, entry: DucEntry) -> Option<&mut Stmt> {
        let i = *self.block_index.get(&entry.block)?;
        self.blocks[i].stmt_at_mut(entry.line)
    }

    pub fn dropped_lines(&self) -> usize {
        self.blocks.iter().map(|b| b.dropped_lines()).sum()
    }

    /// Re-serialized IR: one statement per line, blocks separated by a blank
    /// line.
    pub fn dump_ir(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renames `old_name` to `new_name` everywhere, keeping declarations and
    /// the resolution map consistent, then rebuilds the define-use chains.
    pub fn rename(&mut self, old_name: &str, new_name: &str) {
        for block in self.blocks.iter_mut() {
            block.rename(old_name, new_name);
        }
        if let Some(mut var) = self.vars.remove(old_name) {
            let target = self
                .used_to_decl
                .get(new_name)
                .cloned()
                .unwrap_or_else(|| new_name.to_string());
            if !self.vars.contains_key(&target) {
                var.set_name(&target);
                self.vars.insert(target.clone(), var);
            }
            for decl in self.used_to_decl.values_mut() {
                if decl == old_name {
                    *decl = target.clone();
                }
            }
        }
        if let Some(decl) = self.used_to_decl.remove(old_name) {
            self.used_to_decl
                .entry(new_name.to_string())
                .or_insert(decl);
        }
        self.link();
    }

    /// Re-resolves every used name from scratch after statement-level edits,
    /// dropping implicit variables, and rebuilds the define-use chains.
    pub(crate) fn refresh(&mut self) {
        for block in self.blocks.iter_mut() {
            block.refresh_vars();
        }
        self.vars.retain(|_, v| !v.is_implicit());
        self.used_to_decl.clear();
        self.link();
    }

    pub(crate) fn sort_leading_phis(&mut self) {
        for block in self.blocks.iter_mut() {
            block.sort_leading_phis();
        }
    }

    fn find_decl(&self, used: &str) -> Option<String> {
        if self.vars.contains_key(used) {
            return Some(used.to_string());
        }
        self.vars
            .keys()
            .filter(|decl| is_ssa_version_of(used, decl))
            .max_by_key(|decl| decl.len())
            .cloned()
    }

    /// Resolves any used name that has no entry yet, synthesizing implicit
    /// variables as needed, then rebuilds the chains.
    fn link(&mut self) {
        self.used = self
            .blocks
            .iter()
            .flat_map(|b| b.vars().iter().cloned())
            .collect();
        let unresolved: Vec<String> = self
            .used
            .iter()
            .filter(|u| !self.used_to_decl.contains_key(*u))
            .cloned()
            .collect();
        for used in unresolved {
            let decl = match self.find_decl(&used) {
                Some(decl) => decl,
                None => {
                    log::debug!("{}: synthesizing implicit variable for {}", self.name, used);
                    self.vars.insert(used.clone(), Variable::implicit(&used));
                    used.clone()
                }
            };
            self.used_to_decl.insert(used, decl);
        }
        for name in self.vars.keys() {
            self.used_to_decl.insert(name.clone(), name.clone());
        }
        self.used_to_decl
            .retain(|k, _| self.used.contains(k) || self.vars.contains_key(k));
        self.rebuild_ducs();
    }

    fn rebuild_ducs(&mut self) {
        for v in self.vars.values_mut() {
            v.clear_chains();
        }
        for block in &self.blocks {
            for stmt in block.stmts() {
                let (b, line) = (block.number(), block.chain_line(stmt.line()));
                let vars = stmt.vars();
                let defs = if stmt.defines() { 1 } else { 0 };
                for (i, name) in vars.iter().enumerate() {
                    let Some(v) = self
                        .used_to_decl
                        .get(name)
                        .and_then(|d| self.vars.get_mut(d))
                    else {
                        continue;
                    };
                    if i < defs {
                        v.assignments.insert(b, line);
                    } else {
                        v.references.insert(b, line);
                    }
                }
                for (slot, name) in stmt.canonical_vars().iter().enumerate() {
                    if let Some(v) = self
                        .used_to_decl
                        .get(name)
                        .and_then(|d| self.vars.get_mut(d))
                    {
                        v.occurrences.insert((b, line, slot));
                    }
                }
            }
        }
    }

    /// Replaces each `x = (T) v;` by renaming `x` to `v` everywhere, then
    /// drops every cast. Casts are processed in order so chains compose.
    fn eliminate_casts(&mut self) {
        let sites: Vec<(usize, usize)> = self
            .blocks
            .iter()
            .enumerate()
            .flat_map(|(bi, b)| {
                b.stmts()
                    .iter()
                    .filter(|s| s.kind() == StmtKind::Cast)
                    .map(move |s| (bi, s.line()))
            })
            .collect();
        for &(bi, line) in &sites {
            let Some(StmtPayload::Cast {
                assignee, value, ..
            }) = self.blocks[bi].stmt_at(line).map(Stmt::payload)
            else {
                continue;
            };
            // A store through `MEM[...]`, or an assignee an earlier cast folded
            // into a literal, has no name to substitute.
            let Operand::Var { name: from, .. } = assignee else {
                log::debug!(
                    "{}: dropping cast without substitution: {}",
                    self.name,
                    assignee
                );
                continue;
            };
            let from = from.clone();
            let to = value.substitution_text();
            log::trace!("{}: eliminating cast {} -> {}", self.name, from, to);
            for block in self.blocks.iter_mut() {
                block.rename(&from, &to);
            }
        }
        for (bi, block) in self.blocks.iter_mut().enumerate() {
            let lines: BTreeSet<usize> = sites
                .iter()
                .filter(|(b, _)| *b == bi)
                .map(|(_, l)| *l)
                .collect();
            if !lines.is_empty() {
                block.remove_where(|s| lines.contains(&s.line()));
            }
        }
        log::debug!("{}: eliminated {} casts", self.name, sites.len());
    }

    fn build_edges(&mut self) {
        let mut edges = Vec::new();
        for block in &self.blocks {
            for target in block.out_edge_targets() {
                if self.block_index.contains_key(&target) {
                    edges.push((block.number(), target));
                } else {
                    log::trace!(
                        "{}: <bb {}> targets <bb {}> outside the dump",
                        self.name,
                        block.number(),
                        target
                    );
                }
            }
        }
        for block in self.blocks.iter_mut() {
            block.out_edges.clear();
            block.in_edges.clear();
        }
        for (from, to) in edges {
            let from_i = self.block_index[&from];
            let to_i = self.block_index[&to];
            self.blocks[from_i].out_edges.insert(to);
            self.blocks[to_i].in_edges.insert(from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIB: &str = include_str!("../tests/data/fib.gimple");
    const MAX: &str = include_str!("../tests/data/max.gimple");
    const GCC12_FIB: &str = include_str!("../tests/data/gcc12_fib.gimple");

    fn duc_entries(d: &crate::var::Duc) -> Vec<(usize, usize)> {
        d.iter().map(|e| (e.block, e.line)).collect()
    }

    #[test]
    fn test_header_and_provenance() {
        let f = Function::parse(FIB).unwrap().with_file_name("fib.c");
        assert_eq!(f.name(), "fib");
        assert_eq!(f.file_name(), Some("fib.c"));
        assert_eq!(
            f.id(),
            FunctionId {
                funcdef_no: 0,
                decl_uid: 2289,
                cgraph_uid: 0,
                symbol_order: 0,
            }
        );
    }

    #[test]
    fn test_declarations_and_parameters() {
        let f = Function::parse(FIB).unwrap();
        let names: Vec<&str> = f.variables().map(|v| v.name()).collect();
        assert_eq!(names, vec!["_1", "_11", "a", "b", "c", "j", "n"]);
        assert_eq!(f.variable("n").unwrap().ty(), "long unsigned int");
        assert_eq!(f.variable("a").unwrap().ty(), "int");
        assert!(f.variables().all(|v| !v.is_implicit()));
    }

    #[test]
    fn test_parameters_after_return_type() {
        let params = |line: &str| -> Vec<String> {
            scan_parameters(line).iter().map(|v| v.to_string()).collect()
        };
        assert_eq!(params("fib (long unsigned int n)"), vec!["long unsigned int n"]);
        assert_eq!(
            params("long unsigned int fib (long unsigned int n)"),
            vec!["long unsigned int n"]
        );
        assert_eq!(
            params("static char * copy (char * dst, const char * src)"),
            vec!["char * dst", "const char * src"]
        );
        assert!(params("g ()").is_empty());
        assert!(params("Removing basic block 6").is_empty());
    }

    #[test]
    fn test_gcc12_dump_seeds_parameters() {
        let f = Function::parse(GCC12_FIB).unwrap();
        assert_eq!(f.name(), "fib");
        assert_eq!(f.id().decl_uid, 2601);
        let n = f.resolve("n_7").unwrap();
        assert_eq!(n.name(), "n");
        assert_eq!(n.ty(), "long unsigned int");
        assert!(!n.is_implicit());
        assert!(f.variables().all(|v| !v.is_implicit()));
        assert_eq!(f.dropped_lines(), 0);
    }

    #[test]
    fn test_casts_are_eliminated() {
        let _ = env_logger::builder().is_test(true).try_init();
        let f = Function::parse(FIB).unwrap();
        assert!(!f.dump_ir().contains("(long unsigned int)"));
        let bb4 = f.block(4).unwrap();
        assert_eq!(bb4.stmt_at(6).unwrap().to_string(), "if (j_7 != n_8(D))");
        assert_eq!(bb4.stmts().len(), 9);
        let bb5 = f.block(5).unwrap();
        let texts: Vec<String> = bb5.stmts().iter().map(|s| s.to_string()).collect();
        assert_eq!(texts, vec!["<bb 5>:", "return c_4;"]);
        assert_eq!(f.stmt_count(), 16);
    }

    #[test]
    fn test_cast_stored_through_mem_is_dropped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let text = "\
;; Function st (st, funcdef_no=3, decl_uid=20, cgraph_uid=3, symbol_order=3)

st (int * p, long int v)
{
  <bb 2>:
  MEM[base: p_2(D), offset: 0B] = (int) v_3(D);
  return;

}
";
        let f = Function::parse(text).unwrap();
        assert_eq!(f.dump_ir(), "<bb 2>:\nreturn;\n");
        assert_eq!(f.stmt_count(), 2);
        assert!(f.variable("p").unwrap().references().is_empty());
    }

    #[test]
    fn test_resolution() {
        let f = Function::parse(FIB).unwrap();
        assert_eq!(f.resolve("c_3").unwrap().name(), "c");
        assert_eq!(f.resolve("j_10").unwrap().name(), "j");
        assert_eq!(f.resolve("n_8").unwrap().name(), "n");
        assert_eq!(f.resolve("a").unwrap().name(), "a");
        assert!(f.resolve("_1").is_some());
        assert!(!f.used_names().contains("_1"));
    }

    #[test]
    fn test_define_use_chains() {
        let f = Function::parse(FIB).unwrap();
        let c = f.variable("c").unwrap();
        // The phis of bb4 (lines 2 to 5) are all recorded as line 2.
        assert_eq!(duc_entries(c.assignments()), vec![(3, 2), (4, 2)]);
        assert_eq!(duc_entries(c.references()), vec![(4, 2), (5, 2)]);
        let j = f.variable("j").unwrap();
        assert_eq!(duc_entries(j.assignments()), vec![(3, 3), (4, 2)]);
        assert_eq!(duc_entries(j.references()), vec![(3, 3), (4, 2), (4, 6)]);
        let n = f.variable("n").unwrap();
        assert!(n.assignments().is_empty());
        assert_eq!(duc_entries(n.references()), vec![(4, 6)]);
        let unused = f.variable("_11").unwrap();
        assert!(unused.assignments().is_empty() && unused.references().is_empty());
    }

    #[test]
    fn test_edges() {
        let f = Function::parse(FIB).unwrap();
        let edges = |n: usize| {
            let b = f.block(n).unwrap();
            (
                b.in_edges().iter().copied().collect::<Vec<_>>(),
                b.out_edges().iter().copied().collect::<Vec<_>>(),
            )
        };
        assert_eq!(edges(2), (vec![], vec![4]));
        assert_eq!(edges(3), (vec![4], vec![4]));
        assert_eq!(edges(4), (vec![2, 3], vec![3, 5]));
        assert_eq!(edges(5), (vec![4], vec![]));
    }

    #[test]
    fn test_header_only_block_falls_through() {
        let f = Function::parse(MAX).unwrap();
        let bb3 = f.block(3).unwrap();
        assert_eq!(bb3.stmts().len(), 1);
        assert_eq!(bb3.out_edges().iter().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(f.resolve("a_2").unwrap().name(), "a");
    }

    #[test]
    fn test_undeclared_name_is_implicit() {
        let text = "\
;; Function g (g, funcdef_no=1, decl_uid=10, cgraph_uid=1, symbol_order=1)

g ()
{
  <bb 2>:
  tmp_3 = counter;
  return tmp_3;

}
";
        let f = Function::parse(text).unwrap();
        let v = f.resolve("tmp_3").unwrap();
        assert!(v.is_implicit());
        assert_eq!(v.ty(), "void *");
        assert_eq!(f.resolve("counter").unwrap().name(), "counter");
    }

    #[test]
    fn test_rename_relocates_used_name() {
        let mut f = Function::parse(FIB).unwrap();
        let before = duc_entries(f.variable("c").unwrap().references());
        f.rename("c_9", "x_9");
        assert!(f.dump_ir().contains("x_9 = a_5 + b_6;"));
        assert_eq!(f.resolve("x_9").unwrap().name(), "c");
        assert!(f.resolve("c_9").is_none());
        assert_eq!(duc_entries(f.variable("c").unwrap().references()), before);
    }

    #[test]
    fn test_rename_declaration() {
        let mut f = Function::parse(FIB).unwrap();
        f.rename("n", "m");
        assert!(f.variable("n").is_none());
        let m = f.variable("m").unwrap();
        assert_eq!(m.ty(), "long unsigned int");
        assert_eq!(duc_entries(m.references()), vec![(4, 6)]);
        assert_eq!(f.resolve("n_8").unwrap().name(), "m");
    }

    #[test]
    fn test_reset_discards_renames() {
        let mut f = Function::parse(FIB).unwrap();
        let pristine = f.dump_ir();
        f.rename("a_5", "z_5");
        assert_ne!(f.dump_ir(), pristine);
        f.reset().unwrap();
        assert_eq!(f.dump_ir(), pristine);
        assert_eq!(f.resolve("a_5").unwrap().name(), "a");
    }

    #[test]
    fn test_missing_header() {
        let err = Function::parse("{\n<bb 2>:\nreturn;\n}\n").unwrap_err();
        assert_eq!(err, GimpleError::MissingFunctionHeader);
    }

    #[test]
    fn test_malformed_header() {
        let err = Function::parse(";; Function f (f)\n{\n}\n").unwrap_err();
        assert_eq!(
            err,
            GimpleError::MalformedFunctionHeader(";; Function f (f)".to_string())
        );
    }

    #[test]
    fn test_missing_and_unterminated_body() {
        let header = ";; Function f (f, funcdef_no=0, decl_uid=1, cgraph_uid=0, symbol_order=0)";
        assert_eq!(
            Function::parse(header).unwrap_err(),
            GimpleError::MissingBody("f".to_string())
        );
        let text = format!("{}\n\nf ()\n{{\n  <bb 2>:\n  return;\n", header);
        assert_eq!(
            Function::parse(&text).unwrap_err(),
            GimpleError::UnterminatedBody("f".to_string())
        );
    }

    #[test]
    fn test_duplicate_block() {
        let text = "\
;; Function f (f, funcdef_no=0, decl_uid=1, cgraph_uid=0, symbol_order=0)
{
  <bb 2>:
  return;

  <bb 2>:
  return;
}
";
        assert_eq!(Function::parse(text).unwrap_err(), GimpleError::DuplicateBlock(2));
    }

    #[test]
    fn test_dropped_lines_are_counted() {
        let text = FIB.replace("  j_10 = j_7 + 1;\n", "  j_10 = j_7 + 1;\n  # DEBUG j => j_10\n");
        let f = Function::parse(&text).unwrap();
        assert_eq!(f.dropped_lines(), 1);
        assert_eq!(f.dump_ir(), Function::parse(FIB).unwrap().dump_ir());
    }

    #[test]
    fn test_parse_all() {
        let text = format!("{}\n{}", FIB, MAX);
        let fs = Function::parse_all(&text).unwrap();
        let names: Vec<&str> = fs.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["fib", "max"]);
        assert_eq!(fs[1].stmt_count(), 9);
    }
}
