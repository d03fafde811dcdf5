// SPDX-License-Identifier: Apache-2.0

//! Fuzzy correlation of one function's variables onto another's.
//!
//! For each target variable, candidates on the other side are ranked by
//! define-use chain similarity and accumulated greedily into a covering set
//! until the union's similarity strictly exceeds the threshold.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use crate::error::GimpleError;
use crate::function::Function;
use crate::var::Variable;

/// Left declared variable name to the set of right declared variable names it
/// corresponds to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarMapping {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl VarMapping {
    pub fn get(&self, left: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(left)
    }

    /// True if `left` maps to a set containing `right`.
    pub fn maps(&self, left: &str, right: &str) -> bool {
        self.entries.get(left).map_or(false, |set| set.contains(right))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every right variable named by some entry.
    pub fn right_names(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect()
    }
}

impl std::fmt::Display for VarMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (left, rights) in &self.entries {
            let rights: Vec<&str> = rights.iter().map(String::as_str).collect();
            writeln!(f, "{} -> {{{}}}", left, rights.join(", "))?;
        }
        Ok(())
    }
}

/// Smallest greedy covering set of `candidates` for `target`, or `None` when
/// no accumulation strictly exceeds `threshold`.
fn cover<'a>(
    target: &Variable,
    candidates: &[&'a Variable],
    threshold: f64,
) -> Option<Vec<&'a Variable>> {
    let mut ranked: Vec<(f64, usize, &'a Variable)> = candidates
        .iter()
        .map(|&c| (target.similarity_to(&[c]), target.affinity(c), c))
        .filter(|(similarity, _, _)| *similarity > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then(b.1.cmp(&a.1))
            .then_with(|| a.2.name().cmp(b.2.name()))
    });

    let mut chosen: Vec<&'a Variable> = Vec::new();
    for (similarity, affinity, candidate) in ranked {
        if !candidate.is_tolerant_subset_of(target) {
            trace!(
                "{}: {} is not a subset (similarity {:.3})",
                target.name(),
                candidate.name(),
                similarity
            );
            continue;
        }
        chosen.push(candidate);
        let combined = target.similarity_to(&chosen);
        trace!(
            "{}: + {} (similarity {:.3}, affinity {}) -> {:.3}",
            target.name(),
            candidate.name(),
            similarity,
            affinity,
            combined
        );
        if combined > threshold {
            return Some(chosen);
        }
    }
    None
}

fn one_direction(
    targets: &Function,
    candidates: &Function,
    threshold: f64,
    cancel: &AtomicBool,
) -> Result<BTreeMap<String, BTreeSet<String>>, GimpleError> {
    let pool: Vec<&Variable> = candidates.variables().collect();
    let mut result = BTreeMap::new();
    for target in targets.variables() {
        if cancel.load(Ordering::Relaxed) {
            return Err(GimpleError::Cancelled);
        }
        if let Some(set) = cover(target, &pool, threshold) {
            result.insert(
                target.name().to_string(),
                set.iter().map(|v| v.name().to_string()).collect(),
            );
        }
    }
    Ok(result)
}

/// Correlates the variables of `left` with those of `right`.
///
/// The left-to-right pass decides every entry it can; the right-to-left pass
/// only supplies entries for left variables the first pass left unmapped.
pub fn correlate(
    left: &Function,
    right: &Function,
    threshold: f64,
    cancel: &AtomicBool,
) -> Result<VarMapping, GimpleError> {
    let mut entries = one_direction(left, right, threshold, cancel)?;
    let reverse = one_direction(right, left, threshold, cancel)?;
    let mut filled: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (r, lefts) in reverse {
        for l in lefts {
            if !entries.contains_key(&l) {
                filled.entry(l).or_default().insert(r.clone());
            }
        }
    }
    entries.extend(filled);
    debug!(
        "correlated {} -> {}: {} of {} variables mapped",
        left.name(),
        right.name(),
        entries.len(),
        left.variables().count()
    );
    Ok(VarMapping { entries })
}
