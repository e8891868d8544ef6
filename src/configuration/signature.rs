use std::{fmt, str::FromStr};

use derive_more::Deref;
use thiserror::Error;

use crate::{
    cycle::{Cycle, Symbol},
    multicycle::MulticyclePermutation,
};

/// One position of a [`Signature`].
///
/// Entries order by label first; an unoriented entry sorts before every
/// oriented entry carrying the same label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignatureEntry {
    /// 1-based label of the cycle, in order of first occurrence along `pi`.
    pub label: u32,
    /// For oriented cycles, the 1-based index of the symbol inside its cycle.
    pub orientation_index: Option<u16>,
}

impl SignatureEntry {
    pub fn unoriented(label: u32) -> Self {
        SignatureEntry {
            label,
            orientation_index: None,
        }
    }

    pub fn oriented(label: u32, index: u16) -> Self {
        SignatureEntry {
            label,
            orientation_index: Some(index),
        }
    }

    pub fn is_oriented(&self) -> bool {
        self.orientation_index.is_some()
    }
}

/// Position-by-position description of a configuration, independent of the
/// symbols in use. Canonical signatures are the persisted case keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deref)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature(Vec<SignatureEntry>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    #[error("signature must be enclosed in brackets: '{0}'")]
    Brackets(String),
    #[error("invalid signature entry '{0}'")]
    Entry(String),
}

impl Signature {
    pub fn new(entries: Vec<SignatureEntry>) -> Self {
        Signature(entries)
    }

    /// Computes the signature of `spi` read along the arrangement `pi`.
    ///
    /// `oriented[i]` tells whether the `i`-th cycle of `spi` is oriented; it is
    /// passed in because it does not depend on where `pi` starts.
    pub(crate) fn compute(
        spi: &MulticyclePermutation,
        pi: impl Iterator<Item = Symbol>,
        oriented: &[bool],
    ) -> Self {
        let mut labels: Vec<Option<u32>> = vec![None; spi.len()];
        let mut starts: Vec<Option<Cycle>> = vec![None; spi.len()];
        let mut next_label = 0;

        let entries = pi
            .map(|symbol| {
                let Some(c) = spi.cycle_index_of(symbol) else {
                    panic!("symbol {symbol} of pi is missing from spi");
                };
                let label = *labels[c].get_or_insert_with(|| {
                    next_label += 1;
                    next_label
                });
                if !oriented[c] {
                    return SignatureEntry::unoriented(label);
                }
                let start = starts[c].get_or_insert_with(|| spi.cycles()[c].starting_by(symbol));
                let index = start.index_of(symbol).unwrap_or_default() + 1;
                SignatureEntry::oriented(label, index as u16)
            })
            .collect();
        Signature(entries)
    }

    pub fn entries(&self) -> &[SignatureEntry] {
        &self.0
    }

    /// Number of distinct labels, i.e. of cycles.
    pub fn number_of_labels(&self) -> u32 {
        self.0.iter().map(|e| e.label).max().unwrap_or(0)
    }

    pub fn is_label_oriented(&self, label: u32) -> bool {
        self.0.iter().any(|e| e.label == label && e.is_oriented())
    }

    /// Whether the gate ending at position `i` is open.
    ///
    /// An unoriented gate is open when positions `i-1` and `i` belong to the
    /// same cycle. An oriented gate is open when `i-2`, `i-1` and `i` belong to
    /// the same oriented cycle with `index(i-2) < index(i) < index(i-1)`.
    pub fn is_open_gate(&self, i: usize) -> bool {
        let n = self.0.len();
        let a = self.0[i % n];
        let b = self.0[(i + n - 1) % n];
        let c = self.0[(i + 2 * n - 2) % n];
        match (a.orientation_index, b.orientation_index, c.orientation_index) {
            (None, None, _) => a.label == b.label,
            (Some(ia), Some(ib), Some(ic)) => {
                a.label == b.label && a.label == c.label && ic < ia && ia < ib
            }
            _ => false,
        }
    }

    pub fn open_gates(&self) -> Vec<usize> {
        (0..self.0.len()).filter(|&i| self.is_open_gate(i)).collect()
    }

    /// Inserts one unoriented entry labelled `label` before each of `positions`
    /// (positions refer to the signature before insertion).
    pub fn with_inserted(&self, label: u32, positions: &[usize]) -> Self {
        let mut positions = positions.to_vec();
        positions.sort_unstable();
        let mut entries = self.0.clone();
        for (i, &p) in positions.iter().enumerate() {
            entries.insert(p + i, SignatureEntry::unoriented(label));
        }
        Signature(entries)
    }

    /// Platform independent 32-bit fold, stable across runs.
    pub fn stable_hash(&self) -> u32 {
        self.0.iter().fold(1u32, |h, e| {
            let h = h.wrapping_mul(31).wrapping_add(e.label);
            h.wrapping_mul(31)
                .wrapping_add(e.orientation_index.map_or(0, u32::from))
        })
    }
}

impl FromIterator<SignatureEntry> for Signature {
    fn from_iter<T: IntoIterator<Item = SignatureEntry>>(iter: T) -> Self {
        Signature(iter.into_iter().collect())
    }
}

/// `[1,2,1,3:2,...]`: a bare label for unoriented entries, `label:index` for oriented ones.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match e.orientation_index {
                Some(index) => write!(f, "{}:{}", e.label, index)?,
                None => write!(f, "{}", e.label)?,
            }
        }
        write!(f, "]")
    }
}

impl FromStr for Signature {
    type Err = SignatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(|| SignatureParseError::Brackets(s.to_string()))?;
        if inner.trim().is_empty() {
            return Ok(Signature(vec![]));
        }
        inner
            .split(',')
            .map(|token| {
                let token = token.trim();
                let bad = || SignatureParseError::Entry(token.to_string());
                match token.split_once(':') {
                    Some((label, index)) => Ok(SignatureEntry::oriented(
                        label.parse().map_err(|_| bad())?,
                        index.parse().map_err(|_| bad())?,
                    )),
                    None => Ok(SignatureEntry::unoriented(token.parse().map_err(|_| bad())?)),
                }
            })
            .collect()
    }
}
