use serde::{Deserialize, Serialize};

use crate::error::{NaviewError, Result};

/// Pair table over 0-indexed positions.
///
/// `pairs()[i] = Some(j)` means base i is paired with base j; `None` means unpaired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairTable {
    pairs: Vec<Option<usize>>,
}

impl PairTable {
    /// Build from a partner list, rejecting asymmetric or out-of-range entries.
    pub fn from_partners(pairs: Vec<Option<usize>>) -> Result<Self> {
        let table = PairTable { pairs };
        table.validate()?;
        Ok(table)
    }

    /// Build a table of length `n` from a list of `(i, j)` pairs.
    pub fn from_pairs(n: usize, list: &[(usize, usize)]) -> Result<Self> {
        let mut pairs = vec![None; n];
        for &(i, j) in list {
            if i >= n || j >= n {
                return Err(NaviewError::InvalidPairTable(format!(
                    "pair ({i}, {j}) out of range for length {n}"
                )));
            }
            if i == j {
                return Err(NaviewError::InvalidPairTable(format!(
                    "base {i} paired with itself"
                )));
            }
            for b in [i, j] {
                if pairs[b].is_some() {
                    return Err(NaviewError::InvalidPairTable(format!(
                        "base {b} appears in more than one pair"
                    )));
                }
            }
            pairs[i] = Some(j);
            pairs[j] = Some(i);
        }
        Ok(PairTable { pairs })
    }

    pub(crate) fn new_unchecked(pairs: Vec<Option<usize>>) -> Self {
        PairTable { pairs }
    }

    pub fn pairs(&self) -> &[Option<usize>] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// All base pairs as `(i, j)` with `i < j`, ordered by `i`.
    pub fn base_pairs(&self) -> Vec<(usize, usize)> {
        self.pairs
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| p.filter(|&j| i < j).map(|j| (i, j)))
            .collect()
    }

    /// Check that every partner is in range, distinct from its base, and points back.
    pub fn validate(&self) -> Result<()> {
        let n = self.pairs.len();
        for (i, &p) in self.pairs.iter().enumerate() {
            let Some(j) = p else { continue };
            if j >= n {
                return Err(NaviewError::InvalidPairTable(format!(
                    "base {i} paired with {j}, beyond length {n}"
                )));
            }
            if j == i {
                return Err(NaviewError::InvalidPairTable(format!(
                    "base {i} paired with itself"
                )));
            }
            if self.pairs[j] != Some(i) {
                return Err(NaviewError::InvalidPairTable(format!(
                    "base {i} pairs with {j} but {j} does not pair with {i}"
                )));
            }
        }
        Ok(())
    }

    /// True when no two pairs cross. Linear in the length.
    pub fn is_nested(&self) -> bool {
        let mut open: Vec<usize> = Vec::new();
        for (i, &p) in self.pairs.iter().enumerate() {
            match p {
                Some(j) if j > i => open.push(i),
                Some(j) if j < i => {
                    if open.pop() != Some(j) {
                        return false;
                    }
                }
                _ => {}
            }
        }
        true
    }

    /// Every combination of pairs `(i, j)`, `(k, l)` with `i < k < j < l`.
    pub fn crossings(&self) -> Vec<((usize, usize), (usize, usize))> {
        let pairs = self.base_pairs();
        let mut found = Vec::new();
        for (a, &(i, j)) in pairs.iter().enumerate() {
            for &(k, l) in &pairs[a + 1..] {
                if k > j {
                    break;
                }
                if k < j && j < l {
                    found.push(((i, j), (k, l)));
                }
            }
        }
        found
    }

    /// Drop pairs until the table is nested.
    ///
    /// Pairs are kept greedily in order of their 5' base; a pair crossing
    /// any pair already kept is removed. Returns the nested table and the
    /// removed pairs.
    pub fn strip_crossings(&self) -> (PairTable, Vec<(usize, usize)>) {
        let mut kept: Vec<(usize, usize)> = Vec::new();
        let mut dropped = Vec::new();
        for (i, j) in self.base_pairs() {
            let crosses = kept
                .iter()
                .any(|&(k, l)| (k < i && i < l && l < j) || (i < k && k < j && j < l));
            if crosses {
                dropped.push((i, j));
            } else {
                kept.push((i, j));
            }
        }
        let mut pairs = vec![None; self.pairs.len()];
        for &(i, j) in &kept {
            pairs[i] = Some(j);
            pairs[j] = Some(i);
        }
        (PairTable { pairs }, dropped)
    }
}

/// Output coordinate.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Per-loop geometry reported alongside the coordinates.
#[derive(Serialize, Clone, Debug)]
pub struct LoopSummary {
    /// Creation order, starting at 1 for the loop containing the 5' end.
    pub number: usize,
    pub connections: usize,
    /// Distance to the nearest leaf loop.
    pub depth: usize,
    /// Placement radius in backbone units.
    pub radius: f64,
    /// All closing pairs formed one rigid ring that was split at its widest gap.
    pub broken: bool,
    /// Centroid of the boundary bases, in output space.
    pub x: f64,
    pub y: f64,
}

/// Result of one layout call.
#[derive(Serialize, Clone, Debug, Default)]
pub struct Layout {
    /// One point per input position, in input order.
    pub coordinates: Vec<Point>,
    pub loops: Vec<LoopSummary>,
    /// Number of the loop anchored at the origin.
    pub root: Option<usize>,
    /// Loops whose extruded segments still crossed after refitting.
    pub crossed_loops: Vec<usize>,
    /// Pseudoknot pairs removed before layout.
    pub stripped_pairs: Vec<(usize, usize)>,
}
