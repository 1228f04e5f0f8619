//! Snapshot aggregation: union of evaluator output keyed by client.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::domain::matching::{
    ClientSnapshotEntry, MatchRecord, ParamTag, Snapshot, SnapshotChunk,
};

/// Merges match lists into one entry per client.
///
/// Records are processed in ascending parameter order whatever order the
/// lists arrive in. The first record seen for a client sets its display
/// fields; later records only fill fields that are still empty and add
/// their parameter tag.
pub fn aggregate<'a, I>(lists: I) -> Vec<ClientSnapshotEntry>
where
    I: IntoIterator<Item = &'a [MatchRecord]>,
{
    let mut records: Vec<&MatchRecord> = lists.into_iter().flatten().collect();
    records.sort_by_key(|record| record.param);

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<ClientSnapshotEntry> = Vec::new();

    for record in records {
        if let Some(&position) = positions.get(record.client_id.as_str()) {
            let entry = &mut entries[position];
            entry.params.insert(record.param);
            fill_missing(entry, record);
            continue;
        }

        positions.insert(record.client_id.as_str(), entries.len());
        entries.push(ClientSnapshotEntry {
            client_id: record.client_id.clone(),
            client_name: record.client_name.clone(),
            sphere: record.sphere.clone(),
            manager: record.manager.clone(),
            link: record.link.clone(),
            params: [record.param].into_iter().collect(),
        });
    }

    entries
}

fn fill_missing(entry: &mut ClientSnapshotEntry, record: &MatchRecord) {
    if entry.client_name.is_empty() {
        entry.client_name = record.client_name.clone();
    }
    if entry.sphere.is_empty() {
        entry.sphere = record.sphere.clone();
    }
    if entry.manager.is_none() {
        entry.manager = record.manager.clone();
    }
    if entry.link.is_none() {
        entry.link = record.link.clone();
    }
}

/// Builds the snapshot envelope from per-parameter evaluator output.
pub fn build_snapshot(
    task_id: Option<String>,
    generated_at: DateTime<Utc>,
    per_parameter: &BTreeMap<ParamTag, Vec<MatchRecord>>,
) -> Snapshot {
    let entries = aggregate(per_parameter.values().map(Vec::as_slice));
    let match_counts = per_parameter.iter().map(|(tag, records)| (*tag, records.len())).collect();

    Snapshot { task_id, generated_at, entries, match_counts }
}

impl Snapshot {
    /// Splits entries into chunks of at most `max_entries` (minimum one).
    ///
    /// An empty snapshot yields a single empty chunk so the collaborator
    /// still records that the evaluation happened.
    pub fn chunks(&self, max_entries: usize) -> Vec<SnapshotChunk> {
        let size = max_entries.max(1);
        if self.entries.is_empty() {
            return vec![SnapshotChunk { index: 0, total: 1, entries: Vec::new() }];
        }

        let total = self.entries.len().div_ceil(size);
        self.entries
            .chunks(size)
            .enumerate()
            .map(|(index, entries)| SnapshotChunk { index, total, entries: entries.to_vec() })
            .collect()
    }
}
