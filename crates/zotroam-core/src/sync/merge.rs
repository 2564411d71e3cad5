//! Delta merge
//!
//! Applies a batch of modified records and deleted keys to a snapshot.
//! The same merge is used for items and collections.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::Keyed;

/// Merge `modified` and `deleted` into `snapshot`
///
/// Order of operations:
/// 1. Records whose key is in `deleted` are dropped.
/// 2. Each modified record replaces the record with the same key in place,
///    or is appended when no such record exists.
///
/// With an empty (or fully deleted) snapshot the result is `modified` in
/// server order. A key that is both deleted and modified in one batch ends
/// up present: the deletion runs first, then the modified record is
/// appended.
pub fn merge<T: Keyed>(snapshot: Vec<T>, modified: Vec<T>, deleted: &[String]) -> Vec<T> {
    let mut working = if deleted.is_empty() {
        snapshot
    } else {
        let deleted: HashSet<&str> = deleted.iter().map(String::as_str).collect();
        let before = snapshot.len();
        let kept: Vec<T> = snapshot
            .into_iter()
            .filter(|record| !deleted.contains(record.key()))
            .collect();
        debug!("Removed {} deleted records", before - kept.len());
        kept
    };

    if modified.is_empty() {
        return working;
    }

    let mut positions: HashMap<String, usize> = working
        .iter()
        .enumerate()
        .map(|(i, record)| (record.key().to_string(), i))
        .collect();

    let mut replaced = 0;
    for record in modified {
        match positions.get(record.key()) {
            Some(&i) => {
                working[i] = record;
                replaced += 1;
            }
            None => {
                positions.insert(record.key().to_string(), working.len());
                working.push(record);
            }
        }
    }
    debug!("Merged delta: {} replaced, {} total", replaced, working.len());

    working
}
