//! # tdp
//!
//! Sorting by transpositions with a bounded approximation ratio.
//!
//! A permutation `pi` of `0..n` is sorted by moves `(a b c)`, each exchanging
//! two adjacent blocks of `pi`. The crate works on `spi = sigma ∘ pi⁻¹`, which
//! is the identity exactly when `pi` is sorted, and counts progress in *even*
//! (odd-length) cycles of `spi`: every move changes their number by -2, 0 or 2.
//!
//! The pieces, bottom-up:
//!
//! - [`cycle`], [`multicycle`] and [`permutation`]: the cycle algebra.
//! - [`configuration`]: a pair `(spi, pi)` together with its rotation and
//!   mirror invariant canonical signature, and its extensions.
//! - [`search`]: a depth first search for move sequences within a ratio.
//! - [`store`], [`extend`]: the memoized solve-or-extend engine producing cases.
//! - [`library`]: read-only case tables and the case-file format.
//! - [`sorting`]: the 11/8 and 3/2 sorting algorithms built on a case library.

pub mod configuration;
pub mod cycle;
pub mod extend;
pub mod library;
pub mod multicycle;
pub mod permutation;
pub mod search;
pub mod settings;
pub mod sorting;
pub mod store;
