//! Option structs shared by the search, the extend engine and the sorting
//! algorithms. Each has a [`Default`] matching the research setup and chained
//! `with_*` setters.

use num::rational::Ratio;

/// Ratios are kept exact: `11/8` must not drift to `1.3749999`.
pub type MoveRatio = Ratio<u32>;

pub fn eleven_eighths() -> MoveRatio {
    Ratio::new(11, 8)
}

pub fn three_halves() -> MoveRatio {
    Ratio::new(3, 2)
}

/// When a candidate sequence found by the search is good enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Acceptance {
    /// `2·moves / Δeven` lies in `[min_ratio, max_ratio]`.
    #[default]
    RatioWithin,
    /// The ratio holds and `spi` has become the identity.
    FullySorted,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOptions {
    pub max_ratio: MoveRatio,
    pub min_ratio: MoveRatio,
    pub acceptance: Acceptance,
    /// Configurations with more symbols are refused.
    pub max_symbols: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            max_ratio: eleven_eighths(),
            min_ratio: Ratio::from_integer(1),
            acceptance: Acceptance::RatioWithin,
            max_symbols: 32,
        }
    }
}

impl SearchOptions {
    /// Options accepting only complete sortings within `max_ratio`.
    pub fn fully_sorting(max_ratio: MoveRatio) -> Self {
        SearchOptions::default()
            .with_max_ratio(max_ratio)
            .with_acceptance(Acceptance::FullySorted)
    }

    pub fn with_max_ratio(mut self, ratio: MoveRatio) -> Self {
        self.max_ratio = ratio;
        self
    }

    pub fn with_acceptance(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_max_symbols(mut self, max_symbols: usize) -> Self {
        self.max_symbols = max_symbols;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendOptions {
    pub search: SearchOptions,
    /// Configurations whose 3-norm exceeds this bound are reported, not searched.
    pub max_norm: usize,
}

impl Default for ExtendOptions {
    fn default() -> Self {
        ExtendOptions {
            search: SearchOptions::default(),
            max_norm: 9,
        }
    }
}

impl ExtendOptions {
    pub fn with_search(mut self, search: SearchOptions) -> Self {
        self.search = search;
        self
    }

    pub fn with_max_norm(mut self, max_norm: usize) -> Self {
        self.max_norm = max_norm;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortOptions {
    /// Search the local configuration when its case is missing from the library.
    pub search_on_miss: bool,
    /// Largest remaining configuration the residual loop may search as a whole.
    pub max_search_symbols: usize,
}

impl Default for SortOptions {
    fn default() -> Self {
        SortOptions {
            search_on_miss: true,
            max_search_symbols: 10,
        }
    }
}

impl SortOptions {
    pub fn with_search_on_miss(mut self, search_on_miss: bool) -> Self {
        self.search_on_miss = search_on_miss;
        self
    }

    pub fn with_max_search_symbols(mut self, max_search_symbols: usize) -> Self {
        self.max_search_symbols = max_search_symbols;
        self
    }
}
