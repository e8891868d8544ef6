//! Extensions of a configuration that failed to be sorted.
//!
//! All three types work on the signature: new entries are inserted and the
//! result is rebuilt with [`Configuration::of_signature`].
//!
//! - **Type 1**: a new 3-cycle with one symbol placed at an open gate.
//! - **Type 2**: a new 3-cycle anywhere, only for full configurations.
//! - **Type 3**: an existing cycle, oriented or not, grown by one symbol so
//!   that one open gate gets closed (or, when none is open, at most two open).
//!
//! [`Configuration::extensions`] drops every extension left with more than two
//! open gates.

use indexmap::IndexMap;
use itertools::Itertools;

use super::{Configuration, Signature, SignatureEntry};

impl Configuration {
    pub fn type1_extensions(&self) -> Vec<Configuration> {
        let signature = &self.signature;
        let n = signature.len();
        let label = signature.number_of_labels() + 1;

        let mut result = Vec::new();
        for a in signature.open_gates() {
            for b in 0..n {
                for c in b..n {
                    if !(a == b && b == c) {
                        result.push(Configuration::of_signature(
                            &signature.with_inserted(label, &[a, b, c]),
                        ));
                    }
                }
            }
        }
        result
    }

    pub fn type2_extensions(&self) -> Vec<Configuration> {
        if !self.is_full() {
            return vec![];
        }
        let signature = &self.signature;
        let label = signature.number_of_labels() + 1;

        (0..signature.len())
            .combinations_with_replacement(3)
            .filter(|p| !(p[0] == p[1] && p[1] == p[2]))
            .map(|p| Configuration::of_signature(&signature.with_inserted(label, &p)))
            .collect()
    }

    /// Grows one cycle by a single symbol, inserted at every position.
    ///
    /// The new symbol follows the last one of its cycle: an unoriented cycle
    /// is first spelled out with orientation indices (decreasing with the
    /// position), so that both kinds of cycle get the next index. A growth is
    /// kept when it closes exactly one open gate, or, for a full configuration,
    /// when at most two gates end up open.
    pub fn type3_extensions(&self) -> Vec<Configuration> {
        let signature = &self.signature;
        let open_gates = self.number_of_open_gates();

        let mut result = Vec::new();
        for label in 1..=signature.number_of_labels() {
            let positions: Vec<usize> = signature
                .iter()
                .positions(|e| e.label == label)
                .collect();
            let Ok(next_index) = u16::try_from(positions.len() + 1) else {
                continue;
            };
            let mut entries = signature.entries().to_vec();
            if !signature.is_label_oriented(label) {
                for (i, &p) in positions.iter().enumerate() {
                    entries[p] = SignatureEntry::oriented(label, next_index - 1 - i as u16);
                }
            }
            for a in 0..entries.len() {
                let mut grown = entries.clone();
                grown.insert(a, SignatureEntry::oriented(label, next_index));
                let extension = Configuration::of_signature(&Signature::new(grown));
                let gates = extension.number_of_open_gates();
                let closes_one = open_gates > 0 && gates + 1 == open_gates;
                if closes_one || (open_gates == 0 && gates <= 2) {
                    result.push(extension);
                }
            }
        }
        result
    }

    /// Every type 1, 2 and 3 extension with at most two open gates, one per
    /// canonical form, in generation order.
    pub fn extensions(&self) -> Vec<Configuration> {
        let mut unique: IndexMap<Signature, Configuration> = IndexMap::new();
        for extension in self
            .type1_extensions()
            .into_iter()
            .chain(self.type2_extensions())
            .chain(self.type3_extensions())
            .filter(|e| e.number_of_open_gates() <= 2)
        {
            unique
                .entry(extension.canonical().signature.clone())
                .or_insert(extension);
        }
        unique.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multicycle::MulticyclePermutation;

    fn config(spi: &str) -> Configuration {
        Configuration::with_identity_arrangement(spi.parse::<MulticyclePermutation>().unwrap())
    }

    #[test]
    fn full_configurations_only_get_type2() {
        let interleaving = config("(0 4 2)(1 5 3)");
        assert!(interleaving.is_full());
        assert!(interleaving.type1_extensions().is_empty());
        // every a <= b <= c over 6 positions, minus the 6 triples with a == b == c
        assert_eq!(interleaving.type2_extensions().len(), 56 - 6);
    }

    #[test]
    fn open_configurations_get_type1() {
        let single = config("(2 1 0)");
        assert_eq!(single.open_gates(), vec![0, 1, 2]);
        assert!(single.type2_extensions().is_empty());
        let extensions = single.type1_extensions();
        assert_eq!(extensions.len(), 3 * (6 - 1));
        assert!(extensions.iter().all(|e| e.len() == 6 && e.spi().len() == 2));
    }

    fn cycle_lengths(config: &Configuration) -> Vec<usize> {
        let mut lengths: Vec<_> = config.spi().iter().map(|c| c.len()).collect();
        lengths.sort_unstable();
        lengths
    }

    #[test]
    fn type3_closes_one_open_gate() {
        let intersecting = config("(0 3 1)(2 5 4)");
        assert_eq!(intersecting.number_of_open_gates(), 2);
        let grown = intersecting.type3_extensions();
        assert_eq!(grown.len(), 6);
        for extension in &grown {
            assert_eq!(extension.len(), 7);
            assert_eq!(extension.number_of_open_gates(), 1);
            assert_eq!(cycle_lengths(extension), vec![3, 4]);
        }
        assert!(grown.iter().any(|e| e.spi().iter().any(|c| e.is_oriented(c))));
    }

    #[test]
    fn type3_on_full_configurations_keeps_two_open_gates_at_most() {
        let grown = config("(0 4 2)(1 5 3)").type3_extensions();
        assert_eq!(grown.len(), 12);
        for extension in &grown {
            assert!(extension.number_of_open_gates() <= 2);
            assert_eq!(cycle_lengths(extension), vec![3, 4]);
        }
    }

    #[test]
    fn type3_grows_oriented_cycles() {
        let oriented = config("(0 1 2)");
        assert_eq!(oriented.signature().to_string(), "[1:1,1:2,1:3]");
        assert!(oriented.is_full());
        let grown = oriented.type3_extensions();
        let spis: Vec<String> = grown.iter().map(|e| e.spi().to_string()).collect();
        assert_eq!(spis, vec!["(0 1 2 3)", "(0 2 3 1)", "(0 1 3 2)"]);
    }

    #[test]
    fn extensions_reach_oriented_and_even_length_cycles() {
        let extensions: Vec<Configuration> = [config("(0 4 2)(1 5 3)"), config("(0 3 1)(2 5 4)")]
            .iter()
            .flat_map(Configuration::extensions)
            .collect();
        assert!(extensions.iter().all(|e| e.number_of_open_gates() <= 2));
        assert!(extensions
            .iter()
            .any(|e| e.spi().iter().any(|c| e.is_oriented(c))));
        assert!(extensions
            .iter()
            .any(|e| e.spi().iter().any(|c| c.len() % 2 == 0)));
    }

    #[test]
    fn extensions_are_unique_up_to_canonical_form() {
        let extensions = config("(0 4 2)(1 5 3)").extensions();
        let keys: ahash::AHashSet<_> = extensions
            .iter()
            .map(|e| e.canonical().signature.clone())
            .collect();
        assert_eq!(keys.len(), extensions.len());
        assert!(extensions.iter().all(|e| e.three_norm() == 3));
    }
}
