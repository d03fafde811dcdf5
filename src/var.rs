// SPDX-License-Identifier: Apache-2.0

//! Declared variables and their define-use chains (DUCs).

use std::collections::BTreeSet;

/// A `(block, line)` site in a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DucEntry {
    pub block: usize,
    pub line: usize,
}

impl std::fmt::Display for DucEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}:{}", self.block, self.line)
    }
}

/// Set of sites where a variable is written or read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Duc {
    entries: BTreeSet<DucEntry>,
}

/// Similarity reported when both chains are empty: no evidence either way.
pub const EMPTY_SIMILARITY: f64 = 0.5;

fn shifted(lines: &BTreeSet<usize>, delta: isize) -> Option<BTreeSet<usize>> {
    lines.iter().map(|l| l.checked_add_signed(delta)).collect()
}

impl Duc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: usize, line: usize) {
        self.entries.insert(DucEntry { block, line });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DucEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn union<'a>(ducs: impl IntoIterator<Item = &'a Duc>) -> Duc {
        let mut result = Duc::new();
        for duc in ducs {
            result.entries.extend(duc.entries.iter().copied());
        }
        result
    }

    fn blocks(&self) -> BTreeSet<usize> {
        self.entries.iter().map(|e| e.block).collect()
    }

    fn lines_in_block(&self, block: usize) -> BTreeSet<usize> {
        self.entries
            .range(DucEntry { block, line: 0 }..=DucEntry { block, line: usize::MAX })
            .map(|e| e.line)
            .collect()
    }

    /// Number of entries of `self` that land in `other`, after shifting each
    /// block's entries by one line in either direction when that makes the
    /// whole block land. Tolerates one inserted or removed statement.
    pub fn aligned_overlap(&self, other: &Duc) -> usize {
        let mut overlap = 0;
        for block in self.blocks() {
            let mine = self.lines_in_block(block);
            let theirs = other.lines_in_block(block);
            if mine.is_subset(&theirs) {
                overlap += mine.len();
                continue;
            }
            let aligned = [-1, 1]
                .into_iter()
                .filter_map(|delta| shifted(&mine, delta))
                .any(|s| s.is_subset(&theirs));
            overlap += if aligned {
                mine.len()
            } else {
                mine.intersection(&theirs).count()
            };
        }
        overlap
    }

    /// `|align(self) ∩ other| / (|self| + |other|)`, or [`EMPTY_SIMILARITY`]
    /// when both are empty. At most 0.5.
    pub fn similarity(&self, other: &Duc) -> f64 {
        let total = self.len() + other.len();
        if total == 0 {
            return EMPTY_SIMILARITY;
        }
        self.aligned_overlap(other) as f64 / total as f64
    }

    /// Every entry lands in `other` after block-local alignment.
    pub fn is_tolerant_subset_of(&self, other: &Duc) -> bool {
        self.aligned_overlap(other) == self.len()
    }
}

impl<'a> IntoIterator for &'a Duc {
    type Item = &'a DucEntry;
    type IntoIter = std::collections::btree_set::Iter<'a, DucEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A declared (or implicitly synthesized) variable. Variables are equal when
/// their names are.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    ty: String,
    implicit: bool,
    pub(crate) assignments: Duc,
    pub(crate) references: Duc,
    /// `(block, line, slot)` for each occurrence, slot being the position in
    /// the statement's canonical variable list.
    pub(crate) occurrences: BTreeSet<(usize, usize, usize)>,
}

impl Variable {
    pub fn new(name: &str, ty: &str) -> Self {
        Variable {
            name: name.to_string(),
            ty: ty.to_string(),
            implicit: false,
            assignments: Duc::new(),
            references: Duc::new(),
            occurrences: BTreeSet::new(),
        }
    }

    /// A variable synthesized for a used name with no declaration.
    pub fn implicit(name: &str) -> Self {
        Variable {
            implicit: true,
            ..Variable::new(name, "void *")
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    pub fn assignments(&self) -> &Duc {
        &self.assignments
    }

    pub fn references(&self) -> &Duc {
        &self.references
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn clear_chains(&mut self) {
        self.assignments.clear();
        self.references.clear();
        self.occurrences.clear();
    }

    /// Similarity of the union of `candidates`' chains to this variable's:
    /// assignment similarity plus reference similarity, in [0, 1].
    pub fn similarity_to(&self, candidates: &[&Variable]) -> f64 {
        let assignments = Duc::union(candidates.iter().map(|v| &v.assignments));
        let references = Duc::union(candidates.iter().map(|v| &v.references));
        assignments.similarity(&self.assignments) + references.similarity(&self.references)
    }

    pub fn is_tolerant_subset_of(&self, other: &Variable) -> bool {
        self.assignments.is_tolerant_subset_of(&other.assignments)
            && self.references.is_tolerant_subset_of(&other.references)
    }

    /// Count of occurrences at the same site and operand position.
    pub fn affinity(&self, other: &Variable) -> usize {
        self.occurrences.intersection(&other.occurrences).count()
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Variable {}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}
