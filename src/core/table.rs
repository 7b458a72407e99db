// ZSleuth - core/table.rs
//
// Row-oriented record table and the rig split.
// Rows keep traversal order; nothing is deduplicated or sorted on insert.

use crate::core::model::{Rig, WellRecord};
use crate::util::constants;
use crate::util::error::GroupError;
use std::collections::HashSet;

/// Insertion-ordered collection of records from one scan pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable<R> {
    rows: Vec<R>,
}

impl<R> Default for RecordTable<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> RecordTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// Distinct keys in ascending order.
    pub fn sorted_unique<K, F>(&self, key: F) -> Vec<K>
    where
        K: Ord,
        F: Fn(&R) -> K,
    {
        let mut keys: Vec<K> = self.rows.iter().map(key).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Distinct keys in order of first appearance.
    pub fn first_seen_unique<K, F>(&self, key: F) -> Vec<K>
    where
        K: Eq + std::hash::Hash + Clone,
        F: Fn(&R) -> K,
    {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(key)
            .filter(|k| seen.insert(k.clone()))
            .collect()
    }
}

impl<R> FromIterator<R> for RecordTable<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<R> Extend<R> for RecordTable<R> {
    fn extend<I: IntoIterator<Item = R>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

impl<'a, R> IntoIterator for &'a RecordTable<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// =============================================================================
// Rig grouping
// =============================================================================

/// Rig of a plate from the parity of its rig digit (odd -> rig 1).
///
/// The digit position is a naming convention, not something the file names
/// guarantee, so a non-digit is reported rather than guessed around.
pub fn rig_for_plate(plate_name: &str) -> Result<Rig, GroupError> {
    let index = constants::RIG_MARKER_INDEX;
    let found = plate_name.chars().nth(index);
    let digit = found
        .and_then(|c| c.to_digit(10))
        .ok_or_else(|| GroupError::NonDigitRigMarker {
            plate_name: plate_name.to_string(),
            index,
            found,
        })?;
    Ok(if digit % 2 != 0 { Rig::One } else { Rig::Two })
}

/// The by-well table partitioned by rig.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RigSplit {
    pub rig1: RecordTable<WellRecord>,
    pub rig2: RecordTable<WellRecord>,
}

impl RigSplit {
    pub fn table(&self, rig: Rig) -> &RecordTable<WellRecord> {
        match rig {
            Rig::One => &self.rig1,
            Rig::Two => &self.rig2,
        }
    }
}

/// Partition a by-well table into rig 1 and rig 2 subsets.
///
/// Both subsets preserve the input order; together they hold every row
/// exactly once. Fails on the first plate without a rig digit.
pub fn split_by_rig(table: &RecordTable<WellRecord>) -> Result<RigSplit, GroupError> {
    let mut split = RigSplit::default();
    for row in table {
        match rig_for_plate(&row.plate_name)? {
            Rig::One => split.rig1.push(row.clone()),
            Rig::Two => split.rig2.push(row.clone()),
        }
    }
    tracing::debug!(
        rig1 = split.rig1.len(),
        rig2 = split.rig2.len(),
        "Split table by rig"
    );
    Ok(split)
}
