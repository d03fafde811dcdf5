// SPDX-License-Identifier: Apache-2.0

//! Similarity scoring between two functions.
//!
//! The right-hand function is never modified: naming alignment happens on a
//! private copy, so one `Function` can be compared against many others, from
//! many threads, without a restore step.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use crate::block::Block;
use crate::config::CompareOptions;
use crate::error::GimpleError;
use crate::function::Function;
use crate::stmt::Stmt;
use crate::stmt_equiv::stmts_equivalent;
use crate::var::{Duc, DucEntry};
use crate::var_correlation::{correlate, VarMapping};

/// Score reported for two functions without statements.
const EMPTY_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Default)]
pub struct Comparator {
    options: CompareOptions,
}

fn check_cancel(cancel: &AtomicBool) -> Result<(), GimpleError> {
    if cancel.load(Ordering::Relaxed) {
        Err(GimpleError::Cancelled)
    } else {
        Ok(())
    }
}

/// Renames in `r_stmt` the names that correspond, under `mapping`, to names
/// of `l_stmt`. Operands are paired by position first, then by the first left
/// name of a mapped variable.
fn pair_renames(
    left: &Function,
    right: &Function,
    mapping: &VarMapping,
    l_stmt: &Stmt,
    r_stmt: &Stmt,
) -> BTreeMap<String, String> {
    let mut renames: BTreeMap<String, String> = BTreeMap::new();
    let l_vars = l_stmt.canonical_vars();
    let r_vars = r_stmt.canonical_vars();
    if l_vars.len() != r_vars.len() {
        return renames;
    }
    let corresponds = |l_used: &str, r_decl: &str| {
        decl_of(left, l_used).map_or(false, |l_decl| mapping.maps(&l_decl, r_decl))
    };
    for (i, r_used) in r_vars.iter().enumerate() {
        let Some(r_decl) = decl_of(right, r_used.as_str()) else {
            continue;
        };
        let replacement = if corresponds(l_vars[i].as_str(), &r_decl) {
            Some(&l_vars[i])
        } else {
            l_vars.iter().find(|l_used| corresponds(l_used.as_str(), &r_decl))
        };
        if let Some(l_used) = replacement {
            if l_used != r_used {
                renames
                    .entry(r_used.clone())
                    .or_insert_with(|| l_used.clone());
            }
        }
    }
    renames
}

fn decl_of(f: &Function, used: &str) -> Option<String> {
    f.resolve(used).map(|v| v.name().to_string())
}

/// Pairs each leading phi of `r_block` with the leading phi of `l_block`
/// whose assignee corresponds to its own, regardless of position.
fn phi_renames(
    left: &Function,
    right: &Function,
    mapping: &VarMapping,
    l_block: &Block,
    r_block: &Block,
) -> Vec<(DucEntry, BTreeMap<String, String>)> {
    let assignee_decl =
        |f: &Function, stmt: &Stmt| stmt.assignee_name().and_then(|a| decl_of(f, a));
    let mut taken: BTreeSet<usize> = BTreeSet::new();
    let mut result = Vec::new();
    for r_phi in r_block.leading_phis() {
        let Some(r_decl) = assignee_decl(right, r_phi) else {
            continue;
        };
        let partner = l_block.leading_phis().iter().find(|&l_phi| {
            !taken.contains(&l_phi.line())
                && assignee_decl(left, l_phi)
                    .map_or(false, |l_decl| mapping.maps(&l_decl, &r_decl))
        });
        let Some(l_phi) = partner else {
            trace!("<bb {}>: no partner for {}", r_block.number(), r_phi);
            continue;
        };
        taken.insert(l_phi.line());
        let renames = pair_renames(left, right, mapping, l_phi, r_phi);
        if !renames.is_empty() {
            let site = DucEntry {
                block: r_block.number(),
                line: r_phi.line(),
            };
            result.push((site, renames));
        }
    }
    result
}

/// Per-site rename tables that align the names of `right` with those of
/// `left`. A block's leading phis are matched as a group, since their chains
/// share one site.
fn site_renames(
    left: &Function,
    right: &Function,
    mapping: &VarMapping,
) -> Vec<(DucEntry, BTreeMap<String, String>)> {
    let mapped: Vec<&Duc> = mapping
        .right_names()
        .into_iter()
        .filter_map(|name| right.variable(name))
        .flat_map(|v| [v.assignments(), v.references()])
        .collect();
    let sites = Duc::union(mapped);

    let mut result = Vec::new();
    for &site in &sites {
        let (Some(l_block), Some(r_block)) = (left.block(site.block), right.block(site.block))
        else {
            continue;
        };
        let phi_site = r_block.leading_phis().first().map(Stmt::line) == Some(site.line);
        if phi_site {
            result.extend(phi_renames(left, right, mapping, l_block, r_block));
            continue;
        }
        let (Some(l_stmt), Some(r_stmt)) =
            (l_block.stmt_at(site.line), r_block.stmt_at(site.line))
        else {
            continue;
        };
        let renames = pair_renames(left, right, mapping, l_stmt, r_stmt);
        if !renames.is_empty() {
            result.push((site, renames));
        }
    }
    result
}

/// Flattened statement walk: `200 * matches / (len_l + len_r)`.
fn sequence_score(left: &Function, right: &Function) -> f64 {
    let len_l = left.stmt_count();
    let len_r = right.stmt_count();
    if len_l + len_r == 0 {
        return EMPTY_SCORE;
    }
    let matches = left
        .stmts()
        .zip(right.stmts())
        .filter(|(a, b)| stmts_equivalent(a, b))
        .count();
    trace!(
        "{} vs {}: {} matches over {} + {} statements",
        left.name(),
        right.name(),
        matches,
        len_l,
        len_r
    );
    200.0 * matches as f64 / (len_l + len_r) as f64
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Result<Self, GimpleError> {
        options.validate()?;
        Ok(Comparator { options })
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// A copy of `right` with its names aligned to `left` where the variable
    /// correlation supports it. This is what the score is computed on.
    pub fn aligned_copy(
        &self,
        left: &Function,
        right: &Function,
    ) -> Result<Function, GimpleError> {
        self.aligned_copy_cancellable(left, right, &AtomicBool::new(false))
    }

    pub fn aligned_copy_cancellable(
        &self,
        left: &Function,
        right: &Function,
        cancel: &AtomicBool,
    ) -> Result<Function, GimpleError> {
        let mut aligned = right.clone();
        for pass in 0..self.options.iterations {
            check_cancel(cancel)?;
            let mapping = correlate(left, &aligned, self.options.threshold, cancel)?;
            trace!("pass {} mapping:\n{}", pass, mapping);
            let renames = site_renames(left, &aligned, &mapping);
            let mut changed = false;
            for (site, table) in &renames {
                if let Some(stmt) = aligned.stmt_at_mut(*site) {
                    changed |= stmt.rename_with(&|name: &str| table.get(name).cloned());
                }
            }
            if changed {
                aligned.sort_leading_phis();
                aligned.refresh();
            }
            debug!(
                "{} vs {}: pass {} renamed at {} sites",
                left.name(),
                right.name(),
                pass,
                renames.len()
            );
            if self.options.dump_intermediate {
                debug!("{} after pass {}:\n{}", aligned.name(), pass, aligned.dump_ir());
            }
            if !changed {
                break;
            }
        }
        Ok(aligned)
    }

    /// Similarity score in [0, 100].
    pub fn compare(&self, left: &Function, right: &Function) -> Result<f64, GimpleError> {
        self.compare_cancellable(left, right, &AtomicBool::new(false))
    }

    /// Like `compare`, but gives up with `GimpleError::Cancelled` once
    /// `cancel` is raised.
    pub fn compare_cancellable(
        &self,
        left: &Function,
        right: &Function,
        cancel: &AtomicBool,
    ) -> Result<f64, GimpleError> {
        let aligned = self.aligned_copy_cancellable(left, right, cancel)?;
        check_cancel(cancel)?;
        let score = sequence_score(left, &aligned);
        debug!("{} vs {}: score {:.2}", left.name(), right.name(), score);
        Ok(score)
    }

    /// True when, after alignment, both functions have the same number of
    /// statements and every pair is equivalent.
    pub fn structurally_equal(
        &self,
        left: &Function,
        right: &Function,
    ) -> Result<bool, GimpleError> {
        let aligned = self.aligned_copy(left, right)?;
        Ok(left.stmt_count() == aligned.stmt_count()
            && left
                .stmts()
                .zip(aligned.stmts())
                .all(|(a, b)| stmts_equivalent(a, b)))
    }
}
