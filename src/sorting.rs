//! # Sorting algorithms
//!
//! Every algorithm implements [`SortingAlgorithm`] and shares the plumbing of
//! [`SortContext`]: case lookup and translation, move application with
//! invariant checks, and the growth of local components.
//!
//! - [`ElevenEighths`]: the 11/8-approximation. It pairs odd-length cycles,
//!   applies 2-moves from oriented cycles, and otherwise grows a component from
//!   three symbols of a cycle until an 11/8 case applies. Components that stop
//!   growing are set aside and recombined once their 3-norm reaches 8;
//!   whatever is left is finished with (3,2)-sequences.
//! - [`ThreeHalves`]: only the last part, a 3/2-approximation.
//!
//! Each accepted step strictly increases the number of even cycles of `spi`,
//! which bounds the number of iterations.

use std::fmt;

use bitvec::vec::BitVec;
use itertools::Itertools;
use thiserror::Error;

use crate::cycle::{Cycle, Symbol};

mod context;
mod eleven_eighths;
mod three_halves;

pub use context::SortContext;
pub use eleven_eighths::ElevenEighths;
pub use three_halves::ThreeHalves;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("malformed input '{0}': expected comma separated symbols")]
    Malformed(String),
    #[error("the largest symbol is {found}, expected {expected}")]
    OutOfRange { found: Symbol, expected: Symbol },
    #[error("symbol {0} appears twice")]
    Duplicate(Symbol),
}

#[derive(Error, Debug)]
pub enum SortError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("no case applies: {0}")]
    MissingCase(String),
}

/// A permutation together with the moves sorting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorting {
    pub initial: Cycle,
    pub moves: Vec<Cycle>,
}

impl Sorting {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The arrangement after each move, starting with the initial one.
    pub fn arrangements(&self) -> impl Iterator<Item = Cycle> + '_ {
        let after_each = self.moves.iter().scan(self.initial.clone(), |pi, rho| {
            *pi = pi.apply_transposition(rho);
            Some(pi.clone())
        });
        std::iter::once(self.initial.clone()).chain(after_each)
    }
}

/// `[0,2,1] (0 2 1)`: the initial arrangement and the moves.
impl fmt::Display for Sorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.initial.symbols().iter().format(","),
            self.moves.iter().format(" ")
        )
    }
}

pub trait SortingAlgorithm {
    fn name(&self) -> &'static str;

    /// Sorts `pi`, an arrangement of `0..n`.
    fn sort(&self, pi: &Cycle) -> Result<Sorting, SortError>;

    /// Parses `input` with [`parse_input`] and sorts it.
    fn sort_str(&self, input: &str) -> Result<Sorting, SortError> {
        let pi = parse_input(input)?;
        self.sort(&pi)
    }
}

/// Parses a permutation written as `^\d+(,\d+)*$` over `1..n`; the symbol `0`
/// is implicitly prepended.
///
/// ```
/// # use tdp::sorting::{parse_input, InputError};
/// assert_eq!(parse_input("2,1").unwrap().symbols(), &[0, 2, 1]);
/// assert_eq!(parse_input("2,3"), Err(InputError::OutOfRange { found: 3, expected: 2 }));
/// ```
pub fn parse_input(input: &str) -> Result<Cycle, InputError> {
    let malformed = || InputError::Malformed(input.to_string());
    let symbols = std::iter::once(Ok(0))
        .chain(input.split(',').map(|token| {
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            token.parse::<Symbol>().map_err(|_| malformed())
        }))
        .collect::<Result<Vec<_>, _>>()?;
    check_arrangement(&symbols)?;
    Ok(Cycle::new(symbols))
}

/// `symbols` must hold every symbol of `0..n` exactly once.
fn check_arrangement(symbols: &[Symbol]) -> Result<(), InputError> {
    let expected = symbols.len() - 1;
    let found = symbols.iter().copied().max().unwrap_or_default();
    if found != expected {
        return Err(InputError::OutOfRange { found, expected });
    }
    let mut seen: BitVec = BitVec::repeat(false, symbols.len());
    for &s in symbols {
        if seen.replace(s, true) {
            return Err(InputError::Duplicate(s));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
