//! # Multicycle permutations
//!
//! [`MulticyclePermutation`] is a permutation written as disjoint cycles over an
//! arbitrary set of symbols (not necessarily `0..n`). It caches the aggregates
//! every search step asks for: the number of symbols, the number of *even*
//! (odd-length) cycles, and the cycle holding each symbol.

use std::{fmt, str::FromStr};

use itertools::Itertools;

use crate::{
    cycle::{check_range, parse_symbols, Cycle, ParseError, Symbol},
    permutation::Permutation,
};

#[derive(Debug, Clone)]
pub struct MulticyclePermutation {
    cycles: Vec<Cycle>,
    index: Vec<Option<usize>>,
    symbols: usize,
    even_cycles: usize,
}

impl MulticyclePermutation {
    /// # Panics
    ///
    /// Panics if two cycles share a symbol.
    pub fn new(cycles: Vec<Cycle>) -> Self {
        let max = cycles.iter().map(Cycle::max_symbol).max();
        let mut index = vec![None; max.map_or(0, |m| m + 1)];
        for (i, cycle) in cycles.iter().enumerate() {
            for &s in cycle.symbols() {
                if index[s].replace(i).is_some() {
                    panic!("cycles are not disjoint: {s} appears twice");
                }
            }
        }
        let symbols = cycles.iter().map(Cycle::len).sum();
        let even_cycles = cycles.iter().filter(|c| c.is_even()).count();
        MulticyclePermutation {
            cycles,
            index,
            symbols,
            even_cycles,
        }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cycle> {
        self.cycles.iter()
    }

    /// Number of cycles, fixed points included.
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn number_of_symbols(&self) -> usize {
        self.symbols
    }

    pub fn number_of_even_cycles(&self) -> usize {
        self.even_cycles
    }

    /// All symbols, in increasing order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.index
            .iter()
            .enumerate()
            .filter_map(|(s, i)| i.map(|_| s))
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.cycle_index_of(symbol).is_some()
    }

    /// Position in [`cycles`](Self::cycles) of the cycle holding `symbol`.
    pub fn cycle_index_of(&self, symbol: Symbol) -> Option<usize> {
        self.index.get(symbol).copied().flatten()
    }

    pub fn cycle_of(&self, symbol: Symbol) -> Option<&Cycle> {
        self.cycle_index_of(symbol).map(|i| &self.cycles[i])
    }

    pub fn non_trivial_cycles(&self) -> impl Iterator<Item = &Cycle> + '_ {
        self.cycles.iter().filter(|c| c.len() > 1)
    }

    pub fn is_identity(&self) -> bool {
        self.cycles.iter().all(|c| c.len() == 1)
    }

    /// Sum of the cycle norms.
    pub fn norm(&self) -> usize {
        self.symbols - self.cycles.len()
    }

    /// `(symbols - even cycles) / 2`, a lower bound on the number of moves needed.
    pub fn three_norm(&self) -> usize {
        (self.symbols - self.even_cycles) / 2
    }

    pub fn inverse(&self) -> Self {
        MulticyclePermutation::new(self.cycles.iter().map(Cycle::inverse).collect())
    }

    fn dense(&self, n: usize) -> Permutation {
        let mut map: Vec<usize> = (0..n).collect();
        for cycle in self.non_trivial_cycles() {
            for &s in cycle.symbols() {
                map[s] = cycle.image(s);
            }
        }
        Permutation::from_map(map)
    }

    /// Right-to-left product of `factors`, fixed points included. The result
    /// acts on the union of the factors' symbols.
    ///
    /// ```
    /// # use tdp::multicycle::MulticyclePermutation;
    /// let sigma: MulticyclePermutation = "(0 1 2)".parse().unwrap();
    /// let pi_inverse: MulticyclePermutation = "(0 1 2)".parse().unwrap();
    /// let spi = MulticyclePermutation::product(&[&sigma, &pi_inverse]);
    /// assert_eq!(spi.to_string(), "(0 2 1)");
    /// ```
    pub fn product(factors: &[&MulticyclePermutation]) -> Self {
        let n = factors.iter().map(|f| f.index.len()).max().unwrap_or(0);
        let mut result = Permutation::id(n);
        for factor in factors.iter().rev() {
            result = factor.dense(n).compose(&result);
        }
        let support = |s: Symbol| factors.iter().any(|f| f.contains(s));
        Self::from_orbits(&result, support)
    }

    /// Right-to-left product of single, possibly overlapping, cycles.
    pub fn product_of_cycles(cycles: &[&Cycle]) -> Self {
        let n = cycles.iter().map(|c| c.max_symbol() + 1).max().unwrap_or(0);
        let raw: Vec<&[Symbol]> = cycles.iter().map(|c| c.symbols()).collect();
        let result = Permutation::from_cycles(&raw, n);
        Self::from_orbits(&result, |s| cycles.iter().any(|c| c.contains(s)))
    }

    fn from_orbits(p: &Permutation, support: impl Fn(Symbol) -> bool) -> Self {
        let cycles = p
            .find_cycles()
            .into_iter()
            .filter(|orbit| support(orbit[0]))
            .map(Cycle::new)
            .collect();
        MulticyclePermutation::new(cycles)
    }

    /// `self ∘ rho⁻¹`, the effect of applying the move `rho` on `spi`.
    pub fn after_move(&self, rho: &Cycle) -> Self {
        let rho_inverse = MulticyclePermutation::from(rho.inverse());
        Self::product(&[self, &rho_inverse])
    }

    /// `sigma ∘ pi⁻¹` for an arrangement `pi` of `0..n`, with `sigma = (0 1 ... n-1)`.
    ///
    /// ```
    /// # use tdp::{cycle::Cycle, multicycle::MulticyclePermutation};
    /// let spi = MulticyclePermutation::of_arrangement(&Cycle::new(vec![0, 2, 1]));
    /// assert_eq!(spi.to_string(), "(0 2 1)");
    /// ```
    pub fn of_arrangement(pi: &Cycle) -> Self {
        let sigma = MulticyclePermutation::from(Cycle::identity_arrangement(pi.len()));
        let pi_inverse = MulticyclePermutation::from(pi.inverse());
        Self::product(&[&sigma, &pi_inverse])
    }
}

impl From<Cycle> for MulticyclePermutation {
    fn from(cycle: Cycle) -> Self {
        MulticyclePermutation::new(vec![cycle])
    }
}

impl FromIterator<Cycle> for MulticyclePermutation {
    fn from_iter<T: IntoIterator<Item = Cycle>>(iter: T) -> Self {
        MulticyclePermutation::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MulticyclePermutation {
    type Item = &'a Cycle;
    type IntoIter = std::slice::Iter<'a, Cycle>;

    fn into_iter(self) -> Self::IntoIter {
        self.cycles.iter()
    }
}

/// Equal when both hold the same cycles, in any order.
impl PartialEq for MulticyclePermutation {
    fn eq(&self, other: &Self) -> bool {
        self.index.len() == other.index.len()
            && self.symbols == other.symbols
            && self.cycles.iter().all(|c| other.cycle_of(c.get(0)) == Some(c))
    }
}

impl Eq for MulticyclePermutation {}

/// Non-trivial cycles in the order they are stored; `()` when there are none.
impl fmt::Display for MulticyclePermutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            return write!(f, "()");
        }
        write!(f, "{}", self.non_trivial_cycles().format(""))
    }
}

impl MulticyclePermutation {
    /// Parses a permutation acting on exactly `0..n`, `n` being the number of
    /// symbols written. Symbols are range checked before any cycle is built.
    ///
    /// ```
    /// # use tdp::{cycle::ParseError, multicycle::MulticyclePermutation};
    /// assert!(MulticyclePermutation::parse_dense("(0 4 2)(1 5 3)").is_ok());
    /// assert_eq!(
    ///     MulticyclePermutation::parse_dense("(0 9)").unwrap_err(),
    ///     ParseError::OutOfRange { symbol: 9, n: 2 }
    /// );
    /// ```
    pub fn parse_dense(s: &str) -> Result<Self, ParseError> {
        let lists = parse_cycle_lists(s)?;
        let n = lists.iter().map(Vec::len).sum();
        for symbols in &lists {
            check_range(symbols, n)?;
        }
        from_cycle_lists(lists)
    }
}

fn parse_cycle_lists(s: &str) -> Result<Vec<Vec<Symbol>>, ParseError> {
    let mut lists = Vec::new();
    let mut rest = s.trim();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('(') else {
            return Err(ParseError::Unbalanced(s.to_string()));
        };
        let Some(end) = body.find(')') else {
            return Err(ParseError::Unbalanced(s.to_string()));
        };
        let symbols = parse_symbols(&body[..end])?;
        if !symbols.is_empty() {
            lists.push(symbols);
        }
        rest = body[end + 1..].trim_start();
    }
    Ok(lists)
}

fn from_cycle_lists(lists: Vec<Vec<Symbol>>) -> Result<MulticyclePermutation, ParseError> {
    let mut seen = ahash::AHashSet::new();
    for &symbol in lists.iter().flatten() {
        if !seen.insert(symbol) {
            return Err(ParseError::Repeated(symbol));
        }
    }
    let cycles = lists
        .into_iter()
        .map(Cycle::try_new)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MulticyclePermutation::new(cycles))
}

/// Parses `(0 4 2)(1 5 3)` or `(0,4,2)(1,5,3)`.
impl FromStr for MulticyclePermutation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_cycle_lists(parse_cycle_lists(s)?)
    }
}
