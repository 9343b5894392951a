// 🔍 Deduplication Engine - Group pasted rows by trip intent
//
// Rows with the same plate, driver and origin are the same trip request,
// even if the destination differs (a re-typed row with a fixed
// destination). Inside a group the row paying the highest commission is
// kept; the rest become duplicates.

use crate::normalize::normalize_key;
use crate::parser::RawRow;
use crate::rules::CommissionTable;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// DUPLICATE GROUP
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// normalized plate | normalized driver | normalized origin
    pub key: String,

    /// Members in the order they were pasted
    pub members: Vec<RawRow>,
}

impl DuplicateGroup {
    pub fn is_duplicate_set(&self) -> bool {
        self.members.len() > 1
    }
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

pub struct DeduplicationEngine {
    /// Joins the normalized key parts (default: '|')
    pub key_separator: char,
}

impl DeduplicationEngine {
    pub fn new() -> Self {
        DeduplicationEngine { key_separator: '|' }
    }

    /// Group key for a row. Destination is deliberately left out.
    pub fn group_key(&self, row: &RawRow) -> String {
        let separator = self.key_separator.to_string();
        [
            normalize_key(&row.plate),
            normalize_key(&row.driver_name),
            normalize_key(&row.origin),
        ]
        .join(&separator)
    }

    /// Split rows into groups, in order of first appearance
    pub fn group_rows(&self, rows: Vec<RawRow>) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let key = self.group_key(&row);

            match positions.get(&key) {
                Some(&position) => groups[position].members.push(row),
                None => {
                    positions.insert(key.clone(), groups.len());
                    groups.push(DuplicateGroup {
                        key,
                        members: vec![row],
                    });
                }
            }
        }

        groups
    }

    /// Index of the member to keep: highest lane commission (missing rule
    /// counts as 0), earliest member on ties.
    ///
    /// Driver registration plays no part here.
    pub fn select_kept(&self, group: &DuplicateGroup, rules: &CommissionTable) -> usize {
        let mut kept = 0;
        let mut best = f64::NEG_INFINITY;

        for (index, row) in group.members.iter().enumerate() {
            let value = rules
                .commission_for(&row.origin, &row.destination)
                .unwrap_or(0.0);

            if value > best {
                best = value;
                kept = index;
            }
        }

        if group.is_duplicate_set() {
            debug!(
                "Group {}: keeping line {} of {} rows (commission {:.2})",
                group.key,
                group.members[kept].row_index,
                group.members.len(),
                best
            );
        }

        kept
    }
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
