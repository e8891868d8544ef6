//! # Case stores
//!
//! A [`CaseStore`] remembers, per canonical signature, whether a configuration
//! is solved (with its sorting sequence), known to be a bad case, or currently
//! being worked on. Solved and bad-case markers are insert-if-absent: the first
//! write wins and later ones report [`StoreError::Duplicate`].
//!
//! Keys are canonical [`Signature`]s and the stored moves are expressed in the
//! symbols of the canonical configuration, so any configuration with the same
//! canonical form can reuse them through
//! [`Configuration::from_canonical`](crate::configuration::Configuration::from_canonical).

use thiserror::Error;

use crate::{configuration::Signature, cycle::Cycle};

mod memory;

pub use memory::MemoryCaseStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("case {0} was already recorded")]
    Duplicate(Signature),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt store: {0}")]
    Corrupt(String),
}

/// Shared state of the extend engine, keyed by canonical signature.
pub trait CaseStore: Send + Sync {
    fn is_solved(&self, key: &Signature) -> Result<bool, StoreError>;

    fn is_bad_case(&self, key: &Signature) -> Result<bool, StoreError>;

    /// Non-blocking: `false` when another task holds the key.
    fn try_lock(&self, key: &Signature) -> Result<bool, StoreError>;

    fn unlock(&self, key: &Signature) -> Result<(), StoreError>;

    fn save_solution(&self, key: &Signature, moves: &[Cycle]) -> Result<(), StoreError>;

    fn mark_bad_case(&self, key: &Signature) -> Result<(), StoreError>;

    fn find(&self, key: &Signature) -> Result<Option<Vec<Cycle>>, StoreError>;

    /// Every solved case, in no particular order.
    fn all(&self) -> Result<Vec<(Signature, Vec<Cycle>)>, StoreError>;
}
