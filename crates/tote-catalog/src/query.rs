//! In-memory query helpers shared by every backend.

use std::collections::BTreeMap;

use tote_core::package::ids_match;
use tote_core::{Constraint, PackageRecord, VersionOrdering};

/// Sort ascending by version, then by lower-cased id.
pub fn sort_ascending(records: &mut [PackageRecord]) {
    records.sort_by(|a, b| {
        a.version
            .cmp(&b.version)
            .then_with(|| a.id.to_lowercase().cmp(&b.id.to_lowercase()))
    });
}

/// Highest version among records satisfying `constraint`.
pub fn best_match(
    records: impl IntoIterator<Item = PackageRecord>,
    constraint: &Constraint,
) -> Option<PackageRecord> {
    best_match_with(records, constraint, VersionOrdering::default())
}

pub fn best_match_with(
    records: impl IntoIterator<Item = PackageRecord>,
    constraint: &Constraint,
    ordering: VersionOrdering,
) -> Option<PackageRecord> {
    records
        .into_iter()
        .filter(|r| ids_match(constraint.id(), &r.id) && constraint.matches_with(&r.version, ordering))
        .max_by(|a, b| a.version.compare_with(&b.version, ordering))
}

/// One record per id (case-insensitive), keeping the highest version. Sorted by id.
pub fn latest(records: impl IntoIterator<Item = PackageRecord>) -> Vec<PackageRecord> {
    let mut newest: BTreeMap<String, PackageRecord> = BTreeMap::new();
    for record in records {
        let key = record.id.to_lowercase();
        match newest.get(&key) {
            Some(current) if current.version >= record.version => {}
            _ => {
                newest.insert(key, record);
            }
        }
    }
    newest.into_values().collect()
}

/// All versions of `id`, ascending.
pub fn with_id(records: impl IntoIterator<Item = PackageRecord>, id: &str) -> Vec<PackageRecord> {
    let mut found: Vec<PackageRecord> = records.into_iter().filter(|r| ids_match(&r.id, id)).collect();
    sort_ascending(&mut found);
    found
}

/// Records satisfying every constraint, ascending by version.
pub fn matching(
    records: impl IntoIterator<Item = PackageRecord>,
    constraints: &[Constraint],
) -> Vec<PackageRecord> {
    let mut found: Vec<PackageRecord> = records
        .into_iter()
        .filter(|r| constraints.iter().all(|c| c.matches_record(r)))
        .collect();
    sort_ascending(&mut found);
    found
}
