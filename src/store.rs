//! The local record store (§4.8): a `data_dir`-rooted JSON snapshot standing
//! in for the black-box key-range store the distilled spec treats as
//! external. Adapted from the teacher's `Storage` (`RwLock<HashMap<..>>`),
//! generalized to range queries over record hash per `chordDb.py`.
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{ChordError, ChordResult};
use crate::identifier::Id;
use crate::record::Record;

pub struct RecordStore {
    path: PathBuf,
    records: RwLock<Vec<Record>>,
}

impl RecordStore {
    pub fn open(data_dir: &std::path::Path, own_addr: &str) -> ChordResult<Self> {
        fs::create_dir_all(data_dir)
            .map_err(|e| ChordError::LocalStore(format!("creating data dir: {e}")))?;
        let safe_name = own_addr.replace([':', '/'], "_");
        let path = data_dir.join(format!("{safe_name}.json"));

        let records = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| ChordError::LocalStore(format!("reading {}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| ChordError::LocalStore(format!("decoding {}: {e}", path.display())))?
        } else {
            Vec::new()
        };

        Ok(RecordStore { path, records: RwLock::new(records) })
    }

    fn persist(&self, records: &[Record]) -> ChordResult<()> {
        let raw = serde_json::to_string(records)
            .map_err(|e| ChordError::LocalStore(format!("encoding records: {e}")))?;
        fs::write(&self.path, raw)
            .map_err(|e| ChordError::LocalStore(format!("writing {}: {e}", self.path.display())))
    }

    /// Appends `new_records`; a no-op (not an error) on an empty batch. Rolls
    /// back the whole batch -- nothing is persisted -- on any write failure.
    pub fn store(&self, new_records: Vec<Record>) -> ChordResult<()> {
        if new_records.is_empty() {
            return Ok(());
        }
        let mut guard = self.records.write().unwrap();
        let mut merged = guard.clone();
        merged.extend(new_records);
        self.persist(&merged)?;
        *guard = merged;
        Ok(())
    }

    /// Records matching `education` exactly with `awards >= threshold`.
    pub fn fetch_by_query(&self, education: &str, awards_threshold: u32) -> Vec<Record> {
        self.records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.education == education && r.awards >= awards_threshold)
            .cloned()
            .collect()
    }

    /// `threshold = None`: every local record, leaving the store empty (used by `leave`).
    /// `threshold = Some(h)`: every record with `hash <= h` (used to answer `request_data`).
    pub fn fetch_and_delete_by_range(&self, threshold: Option<Id>) -> ChordResult<Vec<Record>> {
        let mut guard = self.records.write().unwrap();
        let (matched, remaining): (Vec<Record>, Vec<Record>) = guard.drain(..).partition(|r| match threshold {
            None => true,
            Some(h) => r.hash <= h,
        });
        self.persist(&remaining)?;
        *guard = remaining;
        Ok(matched)
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chord-store-test-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn store_then_fetch_by_range() {
        let dir = temp_dir("range");
        let store = RecordStore::open(&dir, "node-a:1").unwrap();
        store
            .store(vec![
                Record::new("Lovelace".into(), "Imperial".into(), 2, 7),
                Record::new("Turing".into(), "Cambridge".into(), 5, 7),
            ])
            .unwrap();
        assert_eq!(store.len(), 2);

        let all = store.fetch_and_delete_by_range(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.len(), 0);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn threshold_only_removes_matching_records() {
        let dir = temp_dir("threshold");
        let store = RecordStore::open(&dir, "node-b:1").unwrap();
        let low = Record { surname: "A".into(), education: "X".into(), awards: 0, hash: 2 };
        let high = Record { surname: "B".into(), education: "Y".into(), awards: 0, hash: 9 };
        store.store(vec![low.clone(), high.clone()]).unwrap();

        let moved = store.fetch_and_delete_by_range(Some(5)).unwrap();
        assert_eq!(moved, vec![low]);
        assert_eq!(store.len(), 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn fetch_by_query_filters_on_education_and_awards() {
        let dir = temp_dir("query");
        let store = RecordStore::open(&dir, "node-c:1").unwrap();
        store
            .store(vec![
                Record::new("Hopper".into(), "Yale".into(), 3, 7),
                Record::new("Lamport".into(), "Yale".into(), 1, 7),
            ])
            .unwrap();

        let found = store.fetch_by_query("Yale", 2);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].surname, "Hopper");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let dir = temp_dir("empty");
        let store = RecordStore::open(&dir, "node-d:1").unwrap();
        store.store(vec![]).unwrap();
        assert_eq!(store.len(), 0);
        fs::remove_dir_all(&dir).ok();
    }
}
