use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, trace};

use super::SortError;
use crate::{
    configuration::Configuration,
    cycle::{Cycle, Symbol},
    library::CaseLibrary,
    multicycle::MulticyclePermutation,
    search::{
        is_within_ratio, search, two_move_from_oriented_cycle, two_move_pairing_odd_cycles,
    },
    settings::{three_halves, MoveRatio, SearchOptions, SortOptions},
};

/// Case libraries and options shared by the sorting algorithms.
///
/// The libraries are behind [`Arc`]s so that several algorithms, or several
/// threads sorting with the same algorithm, read the same tables.
#[derive(Debug, Clone, Default)]
pub struct SortContext {
    cases_11_8: Arc<CaseLibrary>,
    cases_3_2: Arc<CaseLibrary>,
    options: SortOptions,
}

impl SortContext {
    pub fn new(cases_11_8: Arc<CaseLibrary>, cases_3_2: Arc<CaseLibrary>) -> Self {
        SortContext {
            cases_11_8,
            cases_3_2,
            options: SortOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SortOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SortOptions {
        &self.options
    }

    pub(super) fn cases_11_8(&self) -> &CaseLibrary {
        &self.cases_11_8
    }

    pub(super) fn cases_3_2(&self) -> &CaseLibrary {
        &self.cases_3_2
    }

    /// A sequence for the component `mu` that is valid on the whole state
    /// within `ratio`: looked up in `library`, or searched on the local
    /// configuration when the case is missing and searching is enabled.
    pub(super) fn sequence_for(
        &self,
        state: &SortState,
        mu: &[Cycle],
        library: &CaseLibrary,
        ratio: MoveRatio,
    ) -> Option<Vec<Cycle>> {
        let config = local_configuration(mu, &state.pi);
        let moves = match library.lookup(&config) {
            Some(moves) => {
                trace!(%config, "case hit");
                moves
            }
            None if self.options.search_on_miss => {
                let options = SearchOptions::default()
                    .with_max_ratio(ratio)
                    .with_max_symbols(self.options.max_search_symbols);
                search(config.spi(), config.pi(), &options)?
            }
            None => return None,
        };
        if is_within_ratio(&state.spi, &state.pi, &moves, ratio) {
            debug!(component = %config, moves = moves.len(), "sequence for component");
            Some(moves)
        } else {
            trace!(%config, "sequence does not hold on the whole permutation");
            None
        }
    }

    /// Pairs odd-length cycles, applies 2-moves from oriented cycles and
    /// (3,2)-sequences until the state is sorted.
    pub(super) fn finish(&self, state: &mut SortState) -> Result<(), SortError> {
        while !state.is_sorted() {
            if let Some(rho) = two_move_pairing_odd_cycles(&state.spi, &state.pi) {
                state.apply(&rho)?;
                continue;
            }
            if let Some(rho) =
                two_move_from_oriented_cycle(&state.pi, state.spi.non_trivial_cycles())
            {
                state.apply(&rho)?;
                continue;
            }
            let moves = self.three_two_sequence(state)?;
            state.apply_all(&moves)?;
        }
        Ok(())
    }

    /// Three moves gaining two even cycles.
    ///
    /// An oriented 5-cycle `(a d b e c)` without 2-move is sorted by
    /// `(a b c)(b c d)(c d e)`. Otherwise a component grown from the first
    /// non-trivial cycle is looked up in the 3/2 library. As a last resort the
    /// non-trivial part of the permutation is searched as a whole.
    pub(super) fn three_two_sequence(&self, state: &SortState) -> Result<Vec<Cycle>, SortError> {
        let ratio = three_halves();
        let oriented_five = state
            .spi
            .non_trivial_cycles()
            .find(|c| c.len() == 5 && state.pi.orients(c));
        if let Some(cycle) = oriented_five {
            let a = cycle.get(0);
            let d = cycle.image(a);
            let b = cycle.image(d);
            let e = cycle.image(b);
            let c = cycle.image(e);
            let moves = vec![
                Cycle::new(vec![a, b, c]),
                Cycle::new(vec![b, c, d]),
                Cycle::new(vec![c, d, e]),
            ];
            if is_within_ratio(&state.spi, &state.pi, &moves, ratio) {
                return Ok(moves);
            }
        }

        if let Some(first) = state.spi.non_trivial_cycles().find(|c| c.len() >= 3) {
            let mut mu = vec![Cycle::new(first.symbols()[..3].to_vec())];
            for _ in 0..2 {
                let Some(grown) = eh_extend(&mu, &state.spi, &state.pi) else {
                    break;
                };
                mu = grown;
                if let Some(moves) = self.sequence_for(state, &mu, self.cases_3_2(), ratio) {
                    return Ok(moves);
                }
            }
        }

        self.search_remaining(state, ratio)
    }

    fn search_remaining(&self, state: &SortState, ratio: MoveRatio) -> Result<Vec<Cycle>, SortError> {
        let missing = || SortError::MissingCase(format!("no (3,2)-sequence for {}", state.spi));
        let cycles: Vec<Cycle> = state.spi.non_trivial_cycles().cloned().collect();
        let symbols: usize = cycles.iter().map(Cycle::len).sum();
        if !self.options.search_on_miss || symbols > self.options.max_search_symbols {
            return Err(missing());
        }
        let config = local_configuration(&cycles, &state.pi);
        let options = SearchOptions::default()
            .with_max_ratio(ratio)
            .with_max_symbols(self.options.max_search_symbols);
        search(config.spi(), config.pi(), &options)
            .filter(|moves| is_within_ratio(&state.spi, &state.pi, moves, ratio))
            .ok_or_else(missing)
    }
}

/// The permutation being sorted, `spi = sigma ∘ pi⁻¹`, and the moves so far.
#[derive(Debug, Clone)]
pub(super) struct SortState {
    pub(super) pi: Cycle,
    pub(super) spi: MulticyclePermutation,
    pub(super) moves: Vec<Cycle>,
}

impl SortState {
    pub(super) fn new(pi: &Cycle) -> Self {
        SortState {
            pi: pi.clone(),
            spi: MulticyclePermutation::of_arrangement(pi),
            moves: Vec::new(),
        }
    }

    pub(super) fn is_sorted(&self) -> bool {
        self.spi.is_identity()
    }

    /// Applies `rho`, which must be applicable and must not lose even cycles.
    pub(super) fn apply(&mut self, rho: &Cycle) -> Result<(), SortError> {
        if rho.symbols().iter().any(|&s| !self.pi.contains(s)) || !self.pi.is_applicable(rho) {
            return Err(SortError::InvariantViolation(format!(
                "{rho} is not applicable to [{}]",
                self.pi.symbols().iter().format(",")
            )));
        }
        let spi = self.spi.after_move(rho);
        if spi.number_of_even_cycles() < self.spi.number_of_even_cycles() {
            return Err(SortError::InvariantViolation(format!(
                "{rho} loses even cycles of {}",
                self.spi
            )));
        }
        self.spi = spi;
        self.pi = self.pi.apply_transposition(rho);
        self.moves.push(rho.clone());
        Ok(())
    }

    pub(super) fn apply_all(&mut self, moves: &[Cycle]) -> Result<(), SortError> {
        let before = self.spi.number_of_even_cycles();
        for rho in moves {
            self.apply(rho)?;
        }
        if self.spi.number_of_even_cycles() <= before {
            return Err(SortError::InvariantViolation(format!(
                "sequence of {} moves gained no even cycle",
                moves.len()
            )));
        }
        Ok(())
    }
}

/// `mu` together with `pi` restricted to the symbols of `mu`.
///
/// # Panics
///
/// Panics if `mu` is empty or if two of its cycles share a symbol.
pub(super) fn local_configuration(mu: &[Cycle], pi: &Cycle) -> Configuration {
    let spi = MulticyclePermutation::new(mu.to_vec());
    let local_pi = pi
        .restricted_to(|s| spi.contains(s))
        .unwrap_or_else(|| pi.clone());
    Configuration::new(spi, local_pi)
}

pub(super) fn three_norm(mu: &[Cycle]) -> usize {
    let symbols: usize = mu.iter().map(Cycle::len).sum();
    let even = mu.iter().filter(|c| c.is_even()).count();
    (symbols - even) / 2
}

fn contains(mu: &[Cycle], symbol: Symbol) -> bool {
    mu.iter().any(|c| c.contains(symbol))
}

/// Gates of `mu` read on the symbols: the pair `(a, mu(a))` is open unless a
/// pair `(c, mu(c))` of another cycle interleaves with it in `pi⁻¹`, or a third
/// symbol of the same cycle follows `a, mu(a)` in `pi`.
pub(super) fn open_gates(mu: &[Cycle], pi: &Cycle) -> Vec<Symbol> {
    let pi_inverse = pi.inverse();
    let mut gates = Vec::new();
    for (e, epsilon) in mu.iter().enumerate().filter(|(_, c)| c.len() > 1) {
        for &a in epsilon.symbols() {
            let b = epsilon.image(a);
            let closed = mu
                .iter()
                .enumerate()
                .filter(|(_, gamma)| gamma.len() > 1)
                .any(|(g, gamma)| {
                    if g == e {
                        epsilon
                            .symbols()
                            .iter()
                            .any(|&c| c != a && c != b && pi.are_symbols_in_cyclic_order(&[a, b, c]))
                    } else {
                        gamma.symbols().iter().any(|&c| {
                            pi_inverse.are_symbols_in_cyclic_order(&[a, c, b, gamma.image(c)])
                        })
                    }
                });
            if !closed {
                gates.push(a);
            }
        }
    }
    gates
}

/// Grows `mu` by one step: [`eh_extend`], or else a type 3 extension.
pub(super) fn extend_component(
    mu: &[Cycle],
    spi: &MulticyclePermutation,
    pi: &Cycle,
) -> Option<Vec<Cycle>> {
    eh_extend(mu, spi, pi).or_else(|| type3_extend(mu, spi, pi))
}

/// Type 1 and type 2 extensions: adds three consecutive symbols of a cycle of
/// `spi` disjoint from `mu` that crosses one of its gates.
///
/// Type 1 closes an open gate. Type 2 applies only when every gate is closed
/// and picks any cycle crossing a pair of `mu`.
pub(super) fn eh_extend(
    mu: &[Cycle],
    spi: &MulticyclePermutation,
    pi: &Cycle,
) -> Option<Vec<Cycle>> {
    let pi_inverse = pi.inverse().starting_by(pi.min_symbol());
    let n = pi_inverse.len();
    let disjoint = |cycle: &Cycle| cycle.symbols().iter().all(|&s| !contains(mu, s));
    let grown = |segment: Cycle| {
        let mut extended = mu.to_vec();
        extended.push(segment);
        extended
    };

    let gates = open_gates(mu, pi);
    for &gate in &gates {
        let Some(cycle) = mu.iter().find(|c| c.contains(gate)) else {
            continue;
        };
        let a_pos = pi_inverse.index_of(gate)?;
        let b_pos = pi_inverse.index_of(cycle.image(gate))?;
        let Some(x) = crossing_symbol(a_pos, b_pos, spi, &pi_inverse) else {
            continue;
        };
        let Some(gamma) = spi.cycle_of(x) else {
            continue;
        };
        if disjoint(gamma) {
            if let Some(segment) = segment_from(gamma, x) {
                return Some(grown(segment));
            }
        }
    }

    if !gates.is_empty() {
        return None;
    }
    for cycle in mu {
        for &s in cycle.symbols() {
            let a_pos = pi_inverse.index_of(s)?;
            let b_pos = pi_inverse.index_of(cycle.image(s))?;
            let span = if a_pos < b_pos {
                b_pos - a_pos
            } else {
                n - (a_pos - b_pos)
            };
            for j in 1..span {
                let x = pi_inverse.get(a_pos + j);
                if contains(mu, x) {
                    continue;
                }
                let Some(gamma) = spi.cycle_of(x).filter(|c| c.len() > 1 && disjoint(c)) else {
                    continue;
                };
                let image_pos = pi_inverse.index_of(gamma.image(x))?;
                if is_out_of_interval(image_pos, a_pos, b_pos) {
                    if let Some(segment) = segment_from(gamma, x) {
                        return Some(grown(segment));
                    }
                }
            }
        }
    }
    None
}

/// The first symbol strictly between positions `a_pos` and `b_pos` of
/// `pi_inverse` whose image under `spi` lies outside of that interval.
fn crossing_symbol(
    a_pos: usize,
    b_pos: usize,
    spi: &MulticyclePermutation,
    pi_inverse: &Cycle,
) -> Option<Symbol> {
    let n = pi_inverse.len();
    let mut next = (a_pos + 1) % n;
    while next != b_pos {
        let x = pi_inverse.get(next);
        if let Some(gamma) = spi.cycle_of(x).filter(|c| c.len() > 1) {
            if is_out_of_interval(pi_inverse.index_of(gamma.image(x))?, a_pos, b_pos) {
                return Some(x);
            }
        }
        next = (next + 1) % n;
    }
    None
}

fn is_out_of_interval(pos: usize, a_pos: usize, b_pos: usize) -> bool {
    (a_pos < b_pos && (pos < a_pos || pos > b_pos)) || (pos < a_pos && pos > b_pos)
}

/// `(x gamma(x) gamma²(x))`, for cycles of at least three symbols.
fn segment_from(gamma: &Cycle, x: Symbol) -> Option<Cycle> {
    let b = gamma.image(x);
    Cycle::try_new(vec![x, b, gamma.image(b)]).ok()
}

/// Type 3 extension: lengthens a segment of `mu` by the next two symbols of
/// its cycle in `spi`, as long as the result keeps at most two open gates.
pub(super) fn type3_extend(
    mu: &[Cycle],
    spi: &MulticyclePermutation,
    pi: &Cycle,
) -> Option<Vec<Cycle>> {
    for (i, segment) in mu.iter().enumerate() {
        let Some(spi_cycle) = spi.cycle_of(segment.get(0)) else {
            continue;
        };
        if segment.len() >= spi_cycle.len()
            || !segment.symbols().iter().all(|&s| spi_cycle.contains(s))
        {
            continue;
        }
        let Some(start) = aligned_start(spi_cycle, segment) else {
            continue;
        };
        let mut symbols = segment.starting_by(start).symbols().to_vec();
        for _ in 0..2 {
            let Some(&last) = symbols.last() else {
                break;
            };
            let next = spi_cycle.image(last);
            if symbols.contains(&next) || contains(mu, next) {
                break;
            }
            symbols.push(next);
        }
        if symbols.len() == segment.len() {
            continue;
        }
        let mut extended = mu.to_vec();
        extended[i] = Cycle::new(symbols);
        if open_gates(&extended, pi).len() <= 2 {
            return Some(extended);
        }
    }
    None
}

/// A symbol of `segment` from which the segment is a contiguous run of `spi_cycle`.
fn aligned_start(spi_cycle: &Cycle, segment: &Cycle) -> Option<Symbol> {
    segment.symbols().iter().copied().find(|&s| {
        (1..segment.len() as isize).all(|j| segment.pow(s, j) == spi_cycle.pow(s, j))
    })
}
