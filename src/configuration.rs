//! # Configurations
//!
//! A [`Configuration`] pairs a permutation `spi` with a cyclic arrangement `pi`
//! of the same symbols. Everything the search and the case library need is read
//! off its [`Signature`]: which positions of `pi` belong to the same cycle of
//! `spi`, and how oriented cycles are laid out.
//!
//! ## Canonical form
//!
//! Rotating `pi`, or replacing the configuration by its mirror, yields an
//! equivalent configuration: the same move sequences work up to relabelling.
//! [`Configuration::canonical`] picks the smallest signature among the `2n`
//! candidates, which makes it a stable key for memoization. Two configurations
//! compare equal, and hash alike, exactly when their canonical signatures agree.
//!
//! ## Submodules
//!
//! - [`signature`]: the [`Signature`] type and the open gate rules.
//! - [`extension`]: type 1, 2 and 3 extensions of a configuration.
//! - [`translate`]: moving sorting sequences to and from the canonical form.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::OnceLock,
};

use itertools::Itertools;

use crate::{
    cycle::{Cycle, Symbol},
    multicycle::MulticyclePermutation,
};

pub mod extension;
pub mod signature;
pub mod translate;

pub use signature::{Signature, SignatureEntry, SignatureParseError};

/// The smallest signature among all rotations of `pi` and of the mirror's `pi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm {
    pub signature: Signature,
    /// Position of `pi` (or of the mirror's `pi`) the signature starts at.
    pub rotation: usize,
    pub mirrored: bool,
}

#[derive(Debug, Clone)]
pub struct Configuration {
    spi: MulticyclePermutation,
    pi: Cycle,
    oriented: Vec<bool>,
    signature: Signature,
    canonical: OnceLock<CanonicalForm>,
}

impl Configuration {
    // --------------------------------------------------------------------------------------------
    // Constructors
    // --------------------------------------------------------------------------------------------

    /// # Panics
    ///
    /// Panics if `spi` and `pi` do not act on the same symbols.
    pub fn new(spi: MulticyclePermutation, pi: Cycle) -> Self {
        assert!(
            spi.number_of_symbols() == pi.len() && pi.symbols().iter().all(|&s| spi.contains(s)),
            "spi {spi} and pi {pi} act on different symbols"
        );
        let oriented: Vec<bool> = spi.iter().map(|c| pi.orients(c)).collect();
        let signature = Signature::compute(&spi, pi.symbols().iter().copied(), &oriented);
        Configuration {
            spi,
            pi,
            oriented,
            signature,
            canonical: OnceLock::new(),
        }
    }

    /// A configuration whose arrangement is `0 1 ... n-1`, `n` being the number of symbols of `spi`.
    pub fn with_identity_arrangement(spi: MulticyclePermutation) -> Self {
        let pi = Cycle::identity_arrangement(spi.number_of_symbols());
        Configuration::new(spi, pi)
    }

    /// Rebuilds a configuration on the arrangement `0 1 ... n-1` from a signature.
    ///
    /// Unoriented labels become cycles visiting their positions in decreasing
    /// order; oriented labels visit their positions by increasing orientation index.
    ///
    /// ```
    /// # use tdp::configuration::{Configuration, Signature};
    /// let signature: Signature = "[1,2,1,2,1,2]".parse().unwrap();
    /// let config = Configuration::of_signature(&signature);
    /// assert_eq!(config.spi().to_string(), "(0 4 2)(1 5 3)");
    /// assert_eq!(config.signature(), &signature);
    /// ```
    pub fn of_signature(signature: &Signature) -> Self {
        let labels = signature.number_of_labels() as usize;
        let mut positions: Vec<Vec<(u16, Symbol)>> = vec![Vec::new(); labels];
        for (i, entry) in signature.iter().enumerate().rev() {
            positions[entry.label as usize - 1].push((entry.orientation_index.unwrap_or(0), i));
        }
        let cycles = positions
            .into_iter()
            .filter(|p| !p.is_empty())
            .map(|mut p| {
                if p.iter().any(|&(index, _)| index > 0) {
                    p.sort_unstable();
                }
                Cycle::new(p.into_iter().map(|(_, position)| position).collect())
            })
            .collect();
        Configuration::new(
            MulticyclePermutation::new(cycles),
            Cycle::identity_arrangement(signature.len()),
        )
    }

    // --------------------------------------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------------------------------------

    pub fn spi(&self) -> &MulticyclePermutation {
        &self.spi
    }

    pub fn pi(&self) -> &Cycle {
        &self.pi
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn len(&self) -> usize {
        self.pi.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn three_norm(&self) -> usize {
        self.spi.three_norm()
    }

    pub fn is_oriented(&self, cycle: &Cycle) -> bool {
        self.pi.orients(cycle)
    }

    pub fn open_gates(&self) -> Vec<usize> {
        self.signature.open_gates()
    }

    pub fn number_of_open_gates(&self) -> usize {
        self.open_gates().len()
    }

    pub fn is_full(&self) -> bool {
        self.open_gates().is_empty()
    }

    // --------------------------------------------------------------------------------------------
    // Equivalent configurations
    // --------------------------------------------------------------------------------------------

    /// The configuration after applying the move `rho`.
    pub fn apply(&self, rho: &Cycle) -> Self {
        Configuration::new(self.spi.after_move(rho), self.pi.apply_transposition(rho))
    }

    /// `(pi⁻¹ ∘ spi⁻¹ ∘ pi, pi⁻¹)`: the arrangement read backwards.
    pub fn mirror(&self) -> Self {
        let spi = self
            .spi
            .iter()
            .map(|c| c.inverse().map_symbols(|s| self.pi.pre_image(s)))
            .collect();
        Configuration::new(spi, self.pi.inverse())
    }

    /// The same configuration with `pi` stored starting at position `k`.
    pub fn rotate(&self, k: usize) -> Self {
        Configuration::new(self.spi.clone(), self.pi.rotate(k))
    }

    pub fn canonical(&self) -> &CanonicalForm {
        self.canonical.get_or_init(|| self.compute_canonical())
    }

    fn compute_canonical(&self) -> CanonicalForm {
        let mut best = CanonicalForm {
            signature: self.signature.clone(),
            rotation: 0,
            mirrored: false,
        };
        let mirror = self.mirror();
        for (mirrored, config) in [(false, self), (true, &mirror)] {
            for rotation in 0..config.len() {
                let signature = Signature::compute(
                    &config.spi,
                    config.arrangement(rotation),
                    &config.oriented,
                );
                if signature < best.signature {
                    best = CanonicalForm {
                        signature,
                        rotation,
                        mirrored,
                    };
                }
            }
        }
        best
    }

    fn arrangement(&self, rotation: usize) -> impl Iterator<Item = Symbol> + '_ {
        let symbols = self.pi.symbols();
        symbols[rotation..]
            .iter()
            .chain(&symbols[..rotation])
            .copied()
    }

    /// Symbols of the arrangement the canonical signature was read from:
    /// canonical position `p` stands for symbol `canonical_arrangement()[p]`.
    pub(crate) fn canonical_arrangement(&self) -> Vec<Symbol> {
        let form = self.canonical();
        if form.mirrored {
            self.mirror().arrangement(form.rotation).collect()
        } else {
            self.arrangement(form.rotation).collect()
        }
    }

    /// [`Configuration::of_signature`] of the canonical signature.
    pub fn canonical_configuration(&self) -> Self {
        Configuration::of_signature(&self.canonical().signature)
    }

    /// 32-bit digest of the canonical signature, identical across runs and platforms.
    pub fn stable_hash(&self) -> u32 {
        self.canonical().signature.stable_hash()
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.canonical().signature == other.canonical().signature
    }
}

impl Eq for Configuration {}

impl Hash for Configuration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().signature.hash(state);
    }
}

/// `spi` with fixed points, then the arrangement: `(0 4 2)(1 5 3) [0,1,2,3,4,5]`.
impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.spi.iter().format(""),
            self.pi.symbols().iter().format(",")
        )
    }
}

#[cfg(test)]
mod tests;
