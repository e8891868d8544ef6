//! Moving sorting sequences between a configuration and its canonical form.
//!
//! The canonical configuration is obtained in two steps, each of which acts on
//! move sequences:
//!
//! 1. optionally mirroring: a move `rho` applied to `(spi, pi)` corresponds to
//!    `pi⁻¹ ∘ rho⁻¹ ∘ pi` on the mirror, so `(a b c)` becomes
//!    `(pred c, pred b, pred a)` with `pred` read on the current `pi`;
//! 2. relabelling: canonical position `p` stands for the `p`-th symbol of the
//!    rotated arrangement.
//!
//! The correspondence of step 1 depends on the current `pi`, so sequences are
//! translated move by move while the arrangement is updated.

use ahash::AHashMap;

use super::Configuration;
use crate::cycle::{Cycle, Symbol};

impl Configuration {
    /// Expresses a sequence of moves on `self` in the symbols of
    /// [`canonical_configuration`](Configuration::canonical_configuration).
    ///
    /// # Panics
    ///
    /// Panics if a move uses a symbol outside the configuration.
    pub fn to_canonical(&self, moves: &[Cycle]) -> Vec<Cycle> {
        let moves = if self.canonical().mirrored {
            to_mirror(&self.pi, moves)
        } else {
            moves.to_vec()
        };
        let position: AHashMap<Symbol, Symbol> = self
            .canonical_arrangement()
            .into_iter()
            .enumerate()
            .map(|(p, s)| (s, p))
            .collect();
        moves
            .iter()
            .map(|rho| rho.map_symbols(|s| position[&s]))
            .collect()
    }

    /// Inverse of [`to_canonical`](Configuration::to_canonical): turns moves
    /// found for the canonical configuration into moves on `self`.
    ///
    /// # Panics
    ///
    /// Panics if a move uses a position outside the configuration.
    pub fn from_canonical(&self, moves: &[Cycle]) -> Vec<Cycle> {
        let arrangement = self.canonical_arrangement();
        let moves: Vec<Cycle> = moves
            .iter()
            .map(|rho| rho.map_symbols(|p| arrangement[p]))
            .collect();
        if self.canonical().mirrored {
            from_mirror(&self.pi, &moves)
        } else {
            moves
        }
    }
}

fn to_mirror(pi: &Cycle, moves: &[Cycle]) -> Vec<Cycle> {
    let mut pi = pi.clone();
    moves
        .iter()
        .map(|rho| {
            let (a, b, c) = (rho.get(0), rho.get(1), rho.get(2));
            let mirrored = Cycle::new(vec![pi.pre_image(c), pi.pre_image(b), pi.pre_image(a)]);
            pi = pi.apply_transposition(rho);
            mirrored
        })
        .collect()
}

fn from_mirror(pi: &Cycle, moves: &[Cycle]) -> Vec<Cycle> {
    let mut pi = pi.clone();
    moves
        .iter()
        .map(|m| {
            let (a, b, c) = (m.get(0), m.get(1), m.get(2));
            let rho = Cycle::new(vec![pi.image(c), pi.image(b), pi.image(a)]);
            pi = pi.apply_transposition(&rho);
            rho
        })
        .collect()
}
