use std::io::Write;

use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};

use super::{CaseStore, StoreError};
use crate::{configuration::Signature, cycle::Cycle};

/// In-memory [`CaseStore`], safe to share between rayon tasks.
#[derive(Debug, Default)]
pub struct MemoryCaseStore {
    solved: RwLock<AHashMap<Signature, Vec<Cycle>>>,
    bad_cases: RwLock<AHashSet<Signature>>,
    locks: Mutex<AHashSet<Signature>>,
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_solved(&self) -> usize {
        self.solved.read().len()
    }

    pub fn number_of_bad_cases(&self) -> usize {
        self.bad_cases.read().len()
    }

    /// Writes every solved case as a case-file line, sorted by signature so
    /// that exports are reproducible.
    ///
    /// The case's `spi` is the canonical configuration's, fixed points included.
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), StoreError> {
        let solved = self.solved.read();
        let mut keys: Vec<&Signature> = solved.keys().collect();
        keys.sort_unstable();
        for key in keys {
            let config = crate::configuration::Configuration::of_signature(key);
            writeln!(
                writer,
                "{}",
                crate::library::case_line(config.spi(), &solved[key])
            )?;
        }
        Ok(())
    }
}

impl CaseStore for MemoryCaseStore {
    fn is_solved(&self, key: &Signature) -> Result<bool, StoreError> {
        Ok(self.solved.read().contains_key(key))
    }

    fn is_bad_case(&self, key: &Signature) -> Result<bool, StoreError> {
        Ok(self.bad_cases.read().contains(key))
    }

    fn try_lock(&self, key: &Signature) -> Result<bool, StoreError> {
        Ok(self.locks.lock().insert(key.clone()))
    }

    fn unlock(&self, key: &Signature) -> Result<(), StoreError> {
        self.locks.lock().remove(key);
        Ok(())
    }

    fn save_solution(&self, key: &Signature, moves: &[Cycle]) -> Result<(), StoreError> {
        let mut solved = self.solved.write();
        if solved.contains_key(key) {
            return Err(StoreError::Duplicate(key.clone()));
        }
        solved.insert(key.clone(), moves.to_vec());
        Ok(())
    }

    fn mark_bad_case(&self, key: &Signature) -> Result<(), StoreError> {
        if self.bad_cases.write().insert(key.clone()) {
            Ok(())
        } else {
            Err(StoreError::Duplicate(key.clone()))
        }
    }

    fn find(&self, key: &Signature) -> Result<Option<Vec<Cycle>>, StoreError> {
        Ok(self.solved.read().get(key).cloned())
    }

    fn all(&self) -> Result<Vec<(Signature, Vec<Cycle>)>, StoreError> {
        Ok(self
            .solved
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(feature = "bincode")]
mod snapshot {
    use super::*;

    /// Solved cases and bad-case markers; locks are never persisted.
    #[derive(bincode::Encode, bincode::Decode)]
    struct Snapshot {
        #[bincode(with_serde)]
        solved: Vec<(Signature, Vec<Cycle>)>,
        #[bincode(with_serde)]
        bad_cases: Vec<Signature>,
    }

    impl MemoryCaseStore {
        pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
            let snapshot = Snapshot {
                solved: self.all()?,
                bad_cases: self.bad_cases.read().iter().cloned().collect(),
            };
            bincode::encode_to_vec(snapshot, bincode::config::standard())
                .map_err(|e| StoreError::Corrupt(e.to_string()))
        }

        pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
            let (snapshot, _): (Snapshot, usize) =
                bincode::decode_from_slice(bytes, bincode::config::standard())
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            let store = MemoryCaseStore::new();
            store.solved.write().extend(snapshot.solved);
            store.bad_cases.write().extend(snapshot.bad_cases);
            Ok(store)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Signature {
        s.parse().unwrap()
    }

    #[test]
    fn first_solution_wins() {
        let store = MemoryCaseStore::new();
        let k = key("[1,2,1,2,1,2]");
        let first = vec![Cycle::new(vec![0, 2, 4])];
        let second = vec![Cycle::new(vec![1, 3, 5])];

        assert_eq!(store.find(&k).unwrap(), None);
        store.save_solution(&k, &first).unwrap();
        assert!(matches!(
            store.save_solution(&k, &second),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.find(&k).unwrap(), Some(first));
        assert!(store.is_solved(&k).unwrap());
        assert!(!store.is_bad_case(&k).unwrap());
    }

    #[test]
    fn locks_are_exclusive() {
        let store = MemoryCaseStore::new();
        let k = key("[1,1,2,1,2,2]");
        assert!(store.try_lock(&k).unwrap());
        assert!(!store.try_lock(&k).unwrap());
        store.unlock(&k).unwrap();
        assert!(store.try_lock(&k).unwrap());
    }

    #[test]
    fn bad_cases_are_marked_once() {
        let store = MemoryCaseStore::new();
        let k = key("[1,1,2,1,2,2]");
        store.mark_bad_case(&k).unwrap();
        assert!(store.mark_bad_case(&k).is_err());
        assert_eq!(store.number_of_bad_cases(), 1);
    }

    #[test]
    fn export_writes_case_lines() {
        let store = MemoryCaseStore::new();
        store
            .save_solution(&key("[1:1,1:2,1:3]"), &[Cycle::new(vec![0, 1, 2])])
            .unwrap();
        let mut out = Vec::new();
        store.export(&mut out).unwrap();
        insta::assert_snapshot!(String::from_utf8(out).unwrap().trim_end(), @"(0 1 2);[0,1,2]");
    }
}
