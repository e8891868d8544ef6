use bitvec::vec::BitVec;
use tracing::{debug, warn};

use super::{
    check_arrangement,
    context::{extend_component, three_norm, SortContext, SortState},
    SortError, Sorting, SortingAlgorithm,
};
use crate::{
    cycle::{Cycle, Symbol},
    search::{two_move_from_oriented_cycle, two_move_pairing_odd_cycles},
    settings::eleven_eighths,
};

/// Growth steps tried on one component before it is declared bad.
const MAX_GROWTH: usize = 8;

/// Bad small components are recombined once their 3-norm reaches this bound.
const RECOMBINATION_NORM: usize = 8;

/// The 11/8-approximation for sorting by transpositions.
///
/// ```
/// # use tdp::{cycle::Cycle, sorting::{ElevenEighths, SortingAlgorithm}};
/// let sorting = ElevenEighths::default().sort_str("4,3,2,1").unwrap();
/// let last = sorting.arrangements().last().unwrap();
/// assert_eq!(last, Cycle::identity_arrangement(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElevenEighths {
    context: SortContext,
}

enum Growth {
    Sequence(Vec<Cycle>),
    Bad(Vec<Cycle>),
}

impl ElevenEighths {
    pub fn new(context: SortContext) -> Self {
        ElevenEighths { context }
    }

    pub fn context(&self) -> &SortContext {
        &self.context
    }

    /// Applies 11/8 sequences until only components without one are left.
    fn reduce(&self, state: &mut SortState) -> Result<(), SortError> {
        let mut bad: Vec<Vec<Cycle>> = Vec::new();
        let mut deferred: BitVec = BitVec::repeat(false, state.pi.len());

        loop {
            if let Some(rho) = two_move_pairing_odd_cycles(&state.spi, &state.pi) {
                state.apply(&rho)?;
                continue;
            }
            if state.is_sorted() {
                return Ok(());
            }

            let set_aside =
                |s: Symbol| deferred[s] || bad.iter().any(|mu| mu.iter().any(|c| c.contains(s)));
            let candidates: Vec<Cycle> = state
                .spi
                .non_trivial_cycles()
                .filter(|c| c.len() >= 3 && !c.symbols().iter().any(|&s| set_aside(s)))
                .cloned()
                .collect();
            let Some(gamma) = candidates.first() else {
                return Ok(());
            };

            if let Some(rho) = two_move_from_oriented_cycle(&state.pi, &candidates) {
                state.apply(&rho)?;
                continue;
            }

            match self.grow(state, gamma) {
                Growth::Sequence(moves) => state.apply_all(&moves)?,
                Growth::Bad(mu) => {
                    debug!(norm = three_norm(&mu), "bad small component");
                    bad.push(mu);
                }
            }

            let norm = three_norm(&bad.concat());
            if norm >= RECOMBINATION_NORM {
                self.recombine(state, &mut bad, &mut deferred)?;
            }
        }
    }

    /// Grows a component from the first three symbols of `gamma` and looks up
    /// an 11/8 sequence after every step.
    fn grow(&self, state: &SortState, gamma: &Cycle) -> Growth {
        let mut mu = vec![Cycle::new(gamma.symbols()[..3].to_vec())];
        for _ in 0..MAX_GROWTH {
            let norm = three_norm(&mu);
            let Some(grown) = extend_component(&mu, &state.spi, &state.pi) else {
                return Growth::Bad(mu);
            };
            if three_norm(&grown) == norm {
                return Growth::Bad(grown);
            }
            mu = grown;
            if let Some(moves) =
                self.context
                    .sequence_for(state, &mu, self.context.cases_11_8(), eleven_eighths())
            {
                return Growth::Sequence(moves);
            }
        }
        Growth::Bad(mu)
    }

    /// Looks up the union of the bad components, dropping their first cycle
    /// after every miss. Components that never match are deferred to the
    /// (3,2)-sequences.
    fn recombine(
        &self,
        state: &mut SortState,
        bad: &mut Vec<Vec<Cycle>>,
        deferred: &mut BitVec,
    ) -> Result<(), SortError> {
        let mut cycles: Vec<Cycle> = Vec::new();
        for cycle in bad.drain(..).flatten() {
            if !cycle.symbols().iter().any(|&s| cycles.iter().any(|c| c.contains(s))) {
                cycles.push(cycle);
            }
        }
        let symbols: Vec<Symbol> = cycles.iter().flat_map(|c| c.symbols().to_vec()).collect();

        while !cycles.is_empty() {
            if let Some(moves) =
                self.context
                    .sequence_for(state, &cycles, self.context.cases_11_8(), eleven_eighths())
            {
                debug!(cycles = cycles.len(), "bad small components recombined");
                return state.apply_all(&moves);
            }
            cycles.remove(0);
        }

        warn!(
            symbols = symbols.len(),
            "no 11/8 sequence for the bad small components, deferring them"
        );
        for s in symbols {
            deferred.set(s, true);
        }
        Ok(())
    }
}

impl SortingAlgorithm for ElevenEighths {
    fn name(&self) -> &'static str {
        "11/8"
    }

    fn sort(&self, pi: &Cycle) -> Result<Sorting, SortError> {
        check_arrangement(pi.symbols())?;
        debug!(algorithm = self.name(), n = pi.len(), "sorting");
        let mut state = SortState::new(pi);
        self.reduce(&mut state)?;
        self.context.finish(&mut state)?;
        Ok(Sorting {
            initial: pi.clone(),
            moves: state.moves,
        })
    }
}
