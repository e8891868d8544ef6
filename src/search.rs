//! # Bounded-ratio move search
//!
//! [`search`] looks for a sequence of moves on `(spi, pi)` whose ratio
//! `2·moves / Δeven` stays within [`SearchOptions::max_ratio`]. It is a plain
//! depth first backtracking over the applicable moves of the current
//! arrangement:
//!
//! - moves touching three distinct cycles of `spi` are never tried (they lose
//!   two even cycles);
//! - moves whose even-cycle delta is negative are skipped;
//! - a branch is cut as soon as `(moves + lower_bound) / total` exceeds the
//!   ratio, where `lower_bound` is the 3-norm of the current `spi` and `total`
//!   the 3-norm of the initial one.
//!
//! The module also holds the closed-form 2-move finders used by the sorting
//! algorithms.

use itertools::Itertools;
use num::rational::Ratio;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    cycle::Cycle,
    multicycle::MulticyclePermutation,
    settings::{Acceptance, MoveRatio, SearchOptions},
};

/// Searches a bounded-ratio sequence of moves for `(spi, pi)`.
///
/// Returns `None` when no sequence within the options exists, or when the
/// configuration is larger than [`SearchOptions::max_symbols`].
///
/// ```
/// # use tdp::{cycle::Cycle, multicycle::MulticyclePermutation, search::search};
/// # use tdp::settings::{three_halves, SearchOptions};
/// let spi: MulticyclePermutation = "(0 4 2)(1 5 3)".parse().unwrap();
/// let pi = Cycle::identity_arrangement(6);
/// let options = SearchOptions::default().with_max_ratio(three_halves());
/// let moves = search(&spi, &pi, &options).unwrap();
/// assert_eq!(moves.len(), 3);
/// ```
pub fn search(
    spi: &MulticyclePermutation,
    pi: &Cycle,
    options: &SearchOptions,
) -> Option<Vec<Cycle>> {
    if spi.is_identity() {
        return sorted_already(options);
    }
    let bounds = Bounds::new(spi, pi, options)?;
    let mut moves = Vec::new();
    bounds
        .dfs(spi, pi, &mut moves)
        .then_some(moves)
}

/// Same as [`search`], with the first level of moves explored in parallel.
/// The first branch to succeed wins, so the result may differ between runs.
pub fn search_parallel(
    spi: &MulticyclePermutation,
    pi: &Cycle,
    options: &SearchOptions,
) -> Option<Vec<Cycle>> {
    if spi.is_identity() {
        return sorted_already(options);
    }
    let bounds = Bounds::new(spi, pi, options)?;
    zero_and_two_moves(spi, pi)
        .collect::<Vec<_>>()
        .into_par_iter()
        .find_map_any(|(rho, next_spi)| {
            let next_pi = pi.apply_transposition(&rho);
            let mut moves = vec![rho];
            bounds
                .step(&next_spi, &next_pi, &mut moves)
                .then_some(moves)
        })
}

/// An identity `spi` gains nothing, but it is already fully sorted.
fn sorted_already(options: &SearchOptions) -> Option<Vec<Cycle>> {
    (options.acceptance == Acceptance::FullySorted).then(Vec::new)
}

/// Applicable moves of `pi` over the non-fixed symbols of `spi` that do not
/// decrease the number of even cycles, together with the resulting `spi`.
pub fn zero_and_two_moves<'a>(
    spi: &'a MulticyclePermutation,
    pi: &'a Cycle,
) -> impl Iterator<Item = (Cycle, MulticyclePermutation)> + 'a {
    let even = spi.number_of_even_cycles();
    let positions: Vec<usize> = (0..pi.len())
        .filter(|&i| spi.cycle_of(pi.get(i)).is_some_and(|c| c.len() > 1))
        .collect();

    positions
        .into_iter()
        .tuple_combinations::<(usize, usize, usize)>()
        .filter_map(move |(i, j, k)| {
            let (a, b, c) = (pi.get(i), pi.get(j), pi.get(k));
            let cycles = [a, b, c].map(|s| spi.cycle_index_of(s));
            if cycles[0] != cycles[1] && cycles[1] != cycles[2] && cycles[0] != cycles[2] {
                return None;
            }
            let rho = Cycle::new(vec![a, b, c]);
            let next = spi.after_move(&rho);
            (next.number_of_even_cycles() >= even).then_some((rho, next))
        })
}

struct Bounds<'o> {
    options: &'o SearchOptions,
    initial_even: usize,
    total: usize,
    symbols: usize,
}

impl<'o> Bounds<'o> {
    fn new(spi: &MulticyclePermutation, pi: &Cycle, options: &'o SearchOptions) -> Option<Self> {
        let symbols = pi.len();
        if symbols > options.max_symbols {
            debug!(symbols, max = options.max_symbols, "configuration too large to search");
            return None;
        }
        let initial_even = spi.number_of_even_cycles();
        let total = (spi.number_of_symbols() - initial_even) / 2;
        if total == 0 {
            return None;
        }
        Some(Bounds {
            options,
            initial_even,
            total,
            symbols,
        })
    }

    fn accepts(&self, spi: &MulticyclePermutation, moves: usize) -> bool {
        let gained = spi.number_of_even_cycles().saturating_sub(self.initial_even);
        if gained == 0 {
            return false;
        }
        let ratio = Ratio::new(2 * moves as u32, gained as u32);
        if ratio < self.options.min_ratio || ratio > self.options.max_ratio {
            return false;
        }
        match self.options.acceptance {
            Acceptance::RatioWithin => true,
            Acceptance::FullySorted => spi.is_identity(),
        }
    }

    fn is_hopeless(&self, spi: &MulticyclePermutation, moves: usize) -> bool {
        let lower = (self.symbols - spi.number_of_even_cycles()) / 2;
        Ratio::new((moves + lower) as u32, self.total as u32) > self.options.max_ratio
    }

    /// Called right after `moves.last()` produced `(spi, pi)`.
    fn step(&self, spi: &MulticyclePermutation, pi: &Cycle, moves: &mut Vec<Cycle>) -> bool {
        if self.accepts(spi, moves.len()) {
            trace!(moves = moves.len(), "sequence accepted");
            return true;
        }
        if self.is_hopeless(spi, moves.len()) {
            return false;
        }
        self.dfs(spi, pi, moves)
    }

    fn dfs(&self, spi: &MulticyclePermutation, pi: &Cycle, moves: &mut Vec<Cycle>) -> bool {
        for (rho, next_spi) in zero_and_two_moves(spi, pi) {
            let next_pi = pi.apply_transposition(&rho);
            moves.push(rho);
            if self.step(&next_spi, &next_pi, moves) {
                return true;
            }
            moves.pop();
        }
        false
    }
}

/// A 2-move splitting one oriented cycle of `cycles` into three.
///
/// For a cycle `(... a ... b ... c ...)`, the move `(a b c)` splits it into
/// cycles whose lengths are the distances `a→b`, `b→c` and `c→a` along the
/// cycle; it is a 2-move when two more of those are odd than before, and it is
/// applicable when `a, b, c` are in cyclic order in `pi`.
pub fn two_move_from_oriented_cycle<'a>(
    pi: &Cycle,
    cycles: impl IntoIterator<Item = &'a Cycle>,
) -> Option<Cycle> {
    for cycle in cycles {
        if cycle.len() < 3 || !pi.orients(cycle) {
            continue;
        }
        let before = usize::from(cycle.is_even());
        let n = cycle.len();
        for (i, j, k) in (0..n).tuple_combinations::<(usize, usize, usize)>() {
            let (a, b, c) = (cycle.get(i), cycle.get(j), cycle.get(k));
            let after = [(a, b), (b, c), (c, a)]
                .iter()
                .filter(|&&(x, y)| cycle.k_distance(x, y) % 2 == 1)
                .count();
            if after != before + 2 {
                continue;
            }
            if pi.are_symbols_in_cyclic_order(&[a, b, c]) {
                return Some(Cycle::new(vec![a, b, c]));
            }
        }
    }
    None
}

/// A 2-move turning the first two odd-length cycles of `spi` into even ones.
///
/// With `a, b` consecutive in the first cycle and `c` in the second, either
/// `(a b c)` or `(a c b)` is applicable, and both merge the two cycles into
/// odd-length ones.
pub fn two_move_pairing_odd_cycles(spi: &MulticyclePermutation, pi: &Cycle) -> Option<Cycle> {
    let (c1, c2) = spi
        .non_trivial_cycles()
        .filter(|c| !c.is_even())
        .next_tuple::<(&Cycle, &Cycle)>()?;
    let (a, b, c) = (c1.get(0), c1.get(1), c2.get(0));
    if pi.are_symbols_in_cyclic_order(&[a, b, c]) {
        Some(Cycle::new(vec![a, b, c]))
    } else {
        Some(Cycle::new(vec![a, c, b]))
    }
}

/// Whether `moves` applies to `(spi, pi)` in turn, never loses even cycles, and
/// gains some at a ratio of at most `ratio`.
pub fn is_within_ratio(
    spi: &MulticyclePermutation,
    pi: &Cycle,
    moves: &[Cycle],
    ratio: MoveRatio,
) -> bool {
    if moves.is_empty() {
        return false;
    }
    let mut spi = spi.clone();
    let mut pi = pi.clone();
    let initial_even = spi.number_of_even_cycles();
    for rho in moves {
        if rho.symbols().iter().any(|&s| !pi.contains(s)) || !pi.is_applicable(rho) {
            return false;
        }
        let next = spi.after_move(rho);
        if next.number_of_even_cycles() < spi.number_of_even_cycles() {
            return false;
        }
        spi = next;
        pi = pi.apply_transposition(rho);
    }
    let gained = spi.number_of_even_cycles().saturating_sub(initial_even);
    gained > 0 && Ratio::new(2 * moves.len() as u32, gained as u32) <= ratio
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::settings::{eleven_eighths, three_halves};

    fn spi(s: &str) -> MulticyclePermutation {
        s.parse().unwrap()
    }

    fn apply_all(
        spi: &MulticyclePermutation,
        pi: &Cycle,
        moves: &[Cycle],
    ) -> (MulticyclePermutation, Cycle) {
        moves.iter().fold((spi.clone(), pi.clone()), |(spi, pi), rho| {
            assert!(pi.is_applicable(rho), "{rho} does not apply to {pi}");
            (spi.after_move(rho), pi.apply_transposition(rho))
        })
    }

    #[test]
    fn interleaving_pair_needs_three_halves() {
        let spi = spi("(0 4 2)(1 5 3)");
        let pi = Cycle::identity_arrangement(6);

        let moves = search(&spi, &pi, &SearchOptions::default().with_max_ratio(three_halves()))
            .unwrap();
        assert_eq!(moves.len(), 3);
        let (sorted, _) = apply_all(&spi, &pi, &moves);
        assert!(sorted.is_identity());
        assert!(is_within_ratio(&spi, &pi, &moves, three_halves()));
        assert!(!is_within_ratio(&spi, &pi, &moves, eleven_eighths()));

        assert_eq!(search(&spi, &pi, &SearchOptions::default()), None);
        let strict = SearchOptions::default().with_max_ratio(Ratio::from_integer(1));
        assert_eq!(search(&spi, &pi, &strict), None);
        assert!(search_parallel(&spi, &pi, &strict).is_none());
    }

    #[test]
    fn oversized_and_sorted_inputs_are_refused() {
        let spi = spi("(0 4 2)(1 5 3)");
        let pi = Cycle::identity_arrangement(6);
        let options = SearchOptions::fully_sorting(three_halves()).with_max_symbols(5);
        assert_eq!(search(&spi, &pi, &options), None);

        let identity = MulticyclePermutation::of_arrangement(&pi);
        assert!(identity.is_identity());
        assert_eq!(search(&identity, &pi, &SearchOptions::default()), None);
        assert_eq!(
            search(&identity, &pi, &SearchOptions::fully_sorting(three_halves())),
            Some(vec![])
        );
    }

    #[test]
    fn oriented_triangle_has_a_two_move() {
        let pi = Cycle::new(vec![0, 2, 1]);
        let spi = MulticyclePermutation::of_arrangement(&pi);
        let rho = two_move_from_oriented_cycle(&pi, spi.iter()).unwrap();
        assert_eq!(rho, Cycle::new(vec![0, 2, 1]));
        assert!(spi.after_move(&rho).is_identity());

        let moves = search(&spi, &pi, &SearchOptions::fully_sorting(Ratio::from_integer(1)))
            .unwrap();
        assert_eq!(moves, vec![rho]);
    }

    #[test]
    fn unoriented_cycles_have_no_two_move() {
        let spi = spi("(0 4 2)(1 5 3)");
        let pi = Cycle::identity_arrangement(6);
        assert_eq!(two_move_from_oriented_cycle(&pi, spi.iter()), None);
    }

    #[test]
    fn odd_cycles_are_paired() {
        let pairs = spi("(0 2)(1 3)");
        let pi = Cycle::identity_arrangement(4);
        let rho = two_move_pairing_odd_cycles(&pairs, &pi).unwrap();
        assert_eq!(rho, Cycle::new(vec![0, 1, 2]));
        assert!(pi.is_applicable(&rho));
        assert_eq!(pairs.after_move(&rho).number_of_even_cycles(), 2);

        let triangles = spi("(0 4 2)(1 5 3)");
        let pi = Cycle::identity_arrangement(6);
        assert_eq!(two_move_pairing_odd_cycles(&triangles, &pi), None);
    }

    #[test]
    fn no_move_loses_even_cycles() {
        let spi = spi("(0 3 1)(2 5 4)");
        let pi = Cycle::identity_arrangement(6);
        for (rho, next) in zero_and_two_moves(&spi, &pi) {
            assert!(pi.is_applicable(&rho));
            assert!(next.number_of_even_cycles() >= spi.number_of_even_cycles());
        }
    }

    fn arb_arrangement() -> impl Strategy<Value = Cycle> {
        (2usize..=6)
            .prop_flat_map(|n| Just((1..=n).collect::<Vec<_>>()).prop_shuffle())
            .prop_map(|rest| Cycle::new(std::iter::once(0).chain(rest).collect()))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn accepted_sequences_respect_the_ratio(pi in arb_arrangement()) {
            let spi = MulticyclePermutation::of_arrangement(&pi);
            prop_assume!(!spi.is_identity());
            let options = SearchOptions::fully_sorting(three_halves());
            if let Some(moves) = search(&spi, &pi, &options) {
                let (sorted, _) = apply_all(&spi, &pi, &moves);
                prop_assert!(sorted.is_identity());
                prop_assert!(is_within_ratio(&spi, &pi, &moves, three_halves()));
            }
            if let Some(moves) = search(&spi, &pi, &SearchOptions::default()) {
                prop_assert!(is_within_ratio(&spi, &pi, &moves, eleven_eighths()));
            }
        }

        #[test]
        fn oriented_two_moves_gain_two_even_cycles(pi in arb_arrangement()) {
            let spi = MulticyclePermutation::of_arrangement(&pi);
            if let Some(rho) = two_move_from_oriented_cycle(&pi, spi.iter()) {
                prop_assert!(pi.is_applicable(&rho));
                prop_assert_eq!(
                    spi.after_move(&rho).number_of_even_cycles(),
                    spi.number_of_even_cycles() + 2
                );
            }
        }
    }
}
