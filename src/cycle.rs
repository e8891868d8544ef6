//! # Cycles
//!
//! A [`Cycle`] is an ordered sequence of distinct symbols read cyclically: the
//! image of a symbol is its successor, and the last symbol maps back to the
//! first. The same type plays two roles:
//!
//! - a cycle of a [`MulticyclePermutation`](crate::multicycle::MulticyclePermutation),
//!   e.g. one cycle of `spi`;
//! - a cyclic *arrangement* of symbols, e.g. the permutation `pi` itself, where
//!   positions matter and [`Cycle::apply_transposition`] rearranges blocks.
//!
//! Equality and hashing are rotation invariant: `(0 2 1)` and `(2 1 0)` are the
//! same cycle.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use thiserror::Error;

/// Symbols are the elements being permuted, always drawn from `0..n`.
pub type Symbol = usize;

#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Symbol>", into = "Vec<Symbol>")
)]
pub struct Cycle {
    symbols: Vec<Symbol>,
    index: Vec<Option<usize>>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty cycle")]
    Empty,
    #[error("symbol {0} appears twice")]
    Repeated(Symbol),
    #[error("'{0}' is not a symbol")]
    InvalidSymbol(String),
    #[error("symbol {symbol} is outside of 0..{n}")]
    OutOfRange { symbol: Symbol, n: usize },
    #[error("unbalanced parentheses in '{0}'")]
    Unbalanced(String),
}

impl Cycle {
    // --------------------------------------------------------------------------------------------
    // Constructors
    // --------------------------------------------------------------------------------------------

    /// Creates a cycle from its symbols.
    ///
    /// # Panics
    ///
    /// Panics if `symbols` is empty or contains a repeated symbol; use
    /// [`Cycle::try_new`] for untrusted input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tdp::cycle::Cycle;
    /// let c = Cycle::new(vec![0, 2, 1]);
    /// assert_eq!(c.image(2), 1);
    /// assert_eq!(c.image(1), 0);
    /// ```
    pub fn new(symbols: Vec<Symbol>) -> Self {
        match Self::try_new(symbols) {
            Ok(cycle) => cycle,
            Err(err) => panic!("invalid cycle: {err}"),
        }
    }

    pub fn try_new(symbols: Vec<Symbol>) -> Result<Self, ParseError> {
        let Some(&max) = symbols.iter().max() else {
            return Err(ParseError::Empty);
        };
        let len = max
            .checked_add(1)
            .ok_or_else(|| ParseError::InvalidSymbol(max.to_string()))?;
        let mut index = vec![None; len];
        for (i, &s) in symbols.iter().enumerate() {
            if index[s].replace(i).is_some() {
                return Err(ParseError::Repeated(s));
            }
        }
        Ok(Cycle { symbols, index })
    }

    /// The arrangement `0 1 ... n-1`, which is both `sigma` and the implicit
    /// `pi` of every canonical configuration.
    pub fn identity_arrangement(n: usize) -> Self {
        Cycle::new((0..n).collect())
    }

    // --------------------------------------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------------------------------------

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// A cycle always holds at least one symbol.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, i: usize) -> Symbol {
        self.symbols[i % self.symbols.len()]
    }

    pub fn max_symbol(&self) -> Symbol {
        self.index.len() - 1
    }

    pub fn min_symbol(&self) -> Symbol {
        self.index
            .iter()
            .position(Option::is_some)
            .unwrap_or_default()
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.index_of(symbol).is_some()
    }

    /// Position of `symbol` in the stored sequence.
    pub fn index_of(&self, symbol: Symbol) -> Option<usize> {
        self.index.get(symbol).copied().flatten()
    }

    fn position(&self, symbol: Symbol) -> usize {
        match self.index_of(symbol) {
            Some(i) => i,
            None => panic!("symbol {symbol} is not in {self}"),
        }
    }

    /// Successor of `symbol`.
    pub fn image(&self, symbol: Symbol) -> Symbol {
        self.get(self.position(symbol) + 1)
    }

    /// Predecessor of `symbol`.
    pub fn pre_image(&self, symbol: Symbol) -> Symbol {
        self.get(self.position(symbol) + self.len() - 1)
    }

    /// `symbol` moved `k` steps along the cycle, backwards for negative `k`.
    pub fn pow(&self, symbol: Symbol, k: isize) -> Symbol {
        let n = self.len() as isize;
        self.get((self.position(symbol) as isize + k).rem_euclid(n) as usize)
    }

    /// Number of steps needed to walk from `a` to `b`.
    ///
    /// ```
    /// # use tdp::cycle::Cycle;
    /// let c = Cycle::new(vec![0, 3, 1, 4, 2]);
    /// assert_eq!(c.k_distance(3, 2), 3);
    /// assert_eq!(c.k_distance(2, 3), 2);
    /// ```
    pub fn k_distance(&self, a: Symbol, b: Symbol) -> usize {
        let n = self.len();
        (self.position(b) + n - self.position(a)) % n
    }

    /// Odd-length cycles are called *even* (they have an even norm).
    pub fn is_even(&self) -> bool {
        self.len() % 2 == 1
    }

    pub fn norm(&self) -> usize {
        self.len() - 1
    }

    // --------------------------------------------------------------------------------------------
    // Derived cycles
    // --------------------------------------------------------------------------------------------

    /// The same cycle, stored starting at `symbol`.
    pub fn starting_by(&self, symbol: Symbol) -> Self {
        let start = self.position(symbol);
        self.rotate(start)
    }

    /// The same cycle, stored starting at position `k`.
    pub fn rotate(&self, k: usize) -> Self {
        let n = self.len();
        let mut symbols = Vec::with_capacity(n);
        symbols.extend_from_slice(&self.symbols[k % n..]);
        symbols.extend_from_slice(&self.symbols[..k % n]);
        Cycle::new(symbols)
    }

    pub fn inverse(&self) -> Self {
        let mut symbols = self.symbols.clone();
        symbols.reverse();
        Cycle::new(symbols)
    }

    /// Applies `f` to every symbol, keeping the cyclic order.
    pub fn map_symbols(&self, f: impl Fn(Symbol) -> Symbol) -> Self {
        Cycle::new(self.symbols.iter().map(|&s| f(s)).collect())
    }

    /// `g ∘ self ∘ g⁻¹`, i.e. every symbol `s` replaced by `g(s)`.
    pub fn conjugate_by(&self, g: &Cycle) -> Self {
        self.map_symbols(|s| if g.contains(s) { g.image(s) } else { s })
    }

    /// The subsequence of this arrangement made of the symbols accepted by `keep`.
    pub fn restricted_to(&self, keep: impl Fn(Symbol) -> bool) -> Option<Self> {
        let symbols: Vec<_> = self.symbols.iter().copied().filter(|&s| keep(s)).collect();
        (!symbols.is_empty()).then(|| Cycle::new(symbols))
    }

    // --------------------------------------------------------------------------------------------
    // Arrangement predicates and the transposition primitive
    // --------------------------------------------------------------------------------------------

    /// Whether `symbols`, read in order, occur in this arrangement in the same
    /// cyclic order. Positions read along `symbols` may wrap around at most once.
    ///
    /// ```
    /// # use tdp::cycle::Cycle;
    /// let pi = Cycle::new(vec![0, 1, 2, 3, 4]);
    /// assert!(pi.are_symbols_in_cyclic_order(&[3, 4, 1]));
    /// assert!(!pi.are_symbols_in_cyclic_order(&[3, 1, 4]));
    /// ```
    pub fn are_symbols_in_cyclic_order(&self, symbols: &[Symbol]) -> bool {
        let positions: Vec<usize> = symbols.iter().map(|&s| self.position(s)).collect();
        let k = positions.len();
        let descents = (0..k)
            .filter(|&i| positions[(i + 1) % k] < positions[i])
            .count();
        descents <= 1
    }

    /// A move `(a b c)` applies to this arrangement when `a`, `b`, `c` occur in this cyclic order.
    pub fn is_applicable(&self, rho: &Cycle) -> bool {
        rho.len() == 3 && self.are_symbols_in_cyclic_order(rho.symbols())
    }

    /// Whether `cycle` is oriented with respect to this arrangement: its
    /// symbols are not met in cyclic order when walking the arrangement backwards.
    pub fn orients(&self, cycle: &Cycle) -> bool {
        let positions: Vec<usize> = cycle
            .symbols
            .iter()
            .map(|&s| self.len() - 1 - self.position(s))
            .collect();
        let k = positions.len();
        let descents = (0..k)
            .filter(|&i| positions[(i + 1) % k] < positions[i])
            .count();
        descents > 1
    }

    /// `rho ∘ self` for an applicable 3-cycle `rho`, computed as the exchange
    /// of the two blocks delimited by the positions of its symbols.
    ///
    /// ```
    /// # use tdp::cycle::Cycle;
    /// let pi = Cycle::new(vec![0, 2, 1]);
    /// let rho = Cycle::new(vec![0, 2, 1]);
    /// assert_eq!(pi.apply_transposition(&rho).symbols(), &[2, 0, 1]);
    /// ```
    pub fn apply_transposition(&self, rho: &Cycle) -> Self {
        let mut idx = [
            self.position(rho.get(0)),
            self.position(rho.get(1)),
            self.position(rho.get(2)),
        ];
        idx.sort_unstable();
        let [i, j, k] = idx;
        let p = &self.symbols;

        let mut result = Vec::with_capacity(p.len());
        result.extend_from_slice(&p[..i]);
        result.extend_from_slice(&p[j..k]);
        result.extend_from_slice(&p[i..j]);
        result.extend_from_slice(&p[k..]);
        Cycle::new(result)
    }

    /// The rotation starting at the smallest symbol.
    fn normalized(&self) -> impl Iterator<Item = Symbol> + '_ {
        let start = self.position(self.min_symbol());
        self.symbols[start..]
            .iter()
            .chain(&self.symbols[..start])
            .copied()
    }
}

impl PartialEq for Cycle {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.normalized().eq(other.normalized())
    }
}

impl Eq for Cycle {}

impl Hash for Cycle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for s in self.normalized() {
            s.hash(state);
        }
    }
}

impl TryFrom<Vec<Symbol>> for Cycle {
    type Error = ParseError;

    fn try_from(symbols: Vec<Symbol>) -> Result<Self, Self::Error> {
        Cycle::try_new(symbols)
    }
}

impl From<Cycle> for Vec<Symbol> {
    fn from(cycle: Cycle) -> Self {
        cycle.symbols
    }
}

/// Prints the rotation starting at the smallest symbol, e.g. `(0 2 1)`.
impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, s) in self.normalized().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{s}")?;
        }
        write!(f, ")")
    }
}

/// Rejects the first symbol of `symbols` that is not in `0..n`.
pub(crate) fn check_range(symbols: &[Symbol], n: usize) -> Result<(), ParseError> {
    match symbols.iter().find(|&&s| s >= n) {
        Some(&symbol) => Err(ParseError::OutOfRange { symbol, n }),
        None => Ok(()),
    }
}

pub(crate) fn parse_symbols(s: &str) -> Result<Vec<Symbol>, ParseError> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<Symbol>()
                .map_err(|_| ParseError::InvalidSymbol(t.to_string()))
        })
        .collect()
}

fn parse_cycle_symbols(s: &str) -> Result<Vec<Symbol>, ParseError> {
    let trimmed = s.trim();
    let inner = match (trimmed.strip_prefix('('), trimmed.strip_suffix(')')) {
        (Some(_), Some(_)) => &trimmed[1..trimmed.len() - 1],
        (None, None) => trimmed,
        _ => return Err(ParseError::Unbalanced(s.to_string())),
    };
    parse_symbols(inner)
}

impl Cycle {
    /// Parses a cycle whose symbols all lie in `0..n`, checking the range
    /// before anything is allocated for them.
    ///
    /// ```
    /// # use tdp::cycle::{Cycle, ParseError};
    /// assert!(Cycle::parse_within("0,2,1", 3).is_ok());
    /// assert_eq!(
    ///     Cycle::parse_within("0,7,1", 3),
    ///     Err(ParseError::OutOfRange { symbol: 7, n: 3 })
    /// );
    /// ```
    pub fn parse_within(s: &str, n: usize) -> Result<Self, ParseError> {
        let symbols = parse_cycle_symbols(s)?;
        check_range(&symbols, n)?;
        Cycle::try_new(symbols)
    }
}

/// Accepts `(0 2 1)`, `(0,2,1)` or the bare `0,2,1`.
impl FromStr for Cycle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cycle::try_new(parse_cycle_symbols(s)?)
    }
}
