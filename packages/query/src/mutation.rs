// ABOUTME: Snapshot log for optimistic writes
// ABOUTME: Records each entry's value before patching so a failed mutation can restore it verbatim

use serde_json::Value;
use tracing::debug;

use crate::{client::QueryClient, key::QueryKey};

/// Previous value of every entry an optimistic write touched.
///
/// Scoped to one mutation; dropped once the mutation settles.
#[derive(Debug, Default)]
pub struct MutationLog {
    snapshots: Vec<(QueryKey, Value)>,
}

impl MutationLog {
    pub fn record(&mut self, key: QueryKey, previous: Value) {
        // Only the first snapshot of a key is the pre-mutation value
        if self.snapshots.iter().any(|(k, _)| *k == key) {
            return;
        }
        self.snapshots.push((key, previous));
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Put every snapshot back. Entries evicted or cleared since are left alone.
    pub fn rollback(self, client: &QueryClient) {
        let mut entries = client.lock();
        for (key, previous) in self.snapshots {
            if let Some(entry) = entries.get_mut(&key) {
                debug!("Restoring {} from snapshot", key);
                entry.set_data(previous);
            }
        }
    }
}
