//! # Solve or extend
//!
//! The [`Extender`] builds a case library bottom-up. Starting from a few root
//! configurations, each configuration is canonicalized and then either
//!
//! - skipped, when the store already knows it or another task holds it;
//! - solved, when the bounded search finds a sequence within the ratio; or
//! - marked as a bad case, in which case every extension is visited in turn.
//!
//! Each visit is a task of a [`rayon::scope`]; tasks only share the
//! [`CaseStore`]. Configurations whose 3-norm exceeds
//! [`ExtendOptions::max_norm`] are counted but never searched, which bounds the
//! recursion.

use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    configuration::{Configuration, Signature},
    search::search,
    settings::ExtendOptions,
    store::{CaseStore, StoreError},
};

/// What happened to the configurations visited by one [`Extender::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendReport {
    pub solved: usize,
    pub bad_cases: usize,
    /// Extensions spawned from bad cases, before deduplication by the store.
    pub extensions: usize,
    pub already_known: usize,
    pub contended: usize,
    pub beyond_bound: usize,
}

impl fmt::Display for ExtendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} solved, {} bad cases, {} extensions, {} already known, {} contended, {} beyond the norm bound",
            self.solved,
            self.bad_cases,
            self.extensions,
            self.already_known,
            self.contended,
            self.beyond_bound
        )
    }
}

#[derive(Default)]
struct Counters {
    solved: AtomicUsize,
    bad_cases: AtomicUsize,
    extensions: AtomicUsize,
    already_known: AtomicUsize,
    contended: AtomicUsize,
    beyond_bound: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ExtendReport {
        ExtendReport {
            solved: self.solved.load(Ordering::Relaxed),
            bad_cases: self.bad_cases.load(Ordering::Relaxed),
            extensions: self.extensions.load(Ordering::Relaxed),
            already_known: self.already_known.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            beyond_bound: self.beyond_bound.load(Ordering::Relaxed),
        }
    }
}

pub struct Extender<'s, S: CaseStore + ?Sized> {
    store: &'s S,
    options: ExtendOptions,
    counters: Counters,
    error: Mutex<Option<StoreError>>,
}

impl<'s, S: CaseStore + ?Sized> Extender<'s, S> {
    pub fn new(store: &'s S, options: ExtendOptions) -> Self {
        Extender {
            store,
            options,
            counters: Counters::default(),
            error: Mutex::new(None),
        }
    }

    /// Visits every root and, transitively, the extensions of every bad case.
    ///
    /// Returns the first store error other than a duplicate insert; the
    /// remaining tasks stop as soon as one is recorded.
    pub fn run(
        &self,
        roots: impl IntoIterator<Item = Configuration>,
    ) -> Result<ExtendReport, StoreError> {
        info!(
            max_ratio = %self.options.search.max_ratio,
            max_norm = self.options.max_norm,
            "extending"
        );
        let roots: Vec<Configuration> = roots.into_iter().collect();
        rayon::scope(|s| {
            for root in roots {
                s.spawn(move |s| self.visit(s, root));
            }
        });
        if let Some(err) = self.error.lock().take() {
            return Err(err);
        }
        let report = self.counters.snapshot();
        info!(%report, "extension finished");
        Ok(report)
    }

    fn visit<'a>(&'a self, scope: &rayon::Scope<'a>, config: Configuration) {
        if self.error.lock().is_some() {
            return;
        }
        if let Err(err) = self.sort_or_extend(scope, config) {
            self.error.lock().get_or_insert(err);
        }
    }

    fn sort_or_extend<'a>(
        &'a self,
        scope: &rayon::Scope<'a>,
        config: Configuration,
    ) -> Result<(), StoreError> {
        let norm = config.three_norm();
        if norm > self.options.max_norm {
            Counters::bump(&self.counters.beyond_bound);
            warn!(%config, norm, "3-norm above the bound, not searched");
            return Ok(());
        }

        let key = config.canonical().signature.clone();
        if self.is_known(&key)? {
            Counters::bump(&self.counters.already_known);
            return Ok(());
        }
        if !self.store.try_lock(&key)? {
            Counters::bump(&self.counters.contended);
            return Ok(());
        }
        // the holder of the lock may have finished between the check and the lock
        if self.is_known(&key)? {
            Counters::bump(&self.counters.already_known);
            return self.store.unlock(&key);
        }

        let result = self.solve_or_spawn(scope, &key);
        self.store.unlock(&key)?;
        result
    }

    fn is_known(&self, key: &Signature) -> Result<bool, StoreError> {
        Ok(self.store.is_solved(key)? || self.store.is_bad_case(key)?)
    }

    fn solve_or_spawn<'a>(
        &'a self,
        scope: &rayon::Scope<'a>,
        key: &Signature,
    ) -> Result<(), StoreError> {
        let canonical = Configuration::of_signature(key);

        // configurations with 2-cycles are only reached through their extensions
        let solvable = canonical.spi().iter().all(|c| c.len() != 2);
        if solvable {
            if let Some(moves) = search(canonical.spi(), canonical.pi(), &self.options.search) {
                debug!(%key, moves = moves.len(), "solved");
                absorb_duplicate(self.store.save_solution(key, &moves))?;
                Counters::bump(&self.counters.solved);
                return Ok(());
            }
        }

        debug!(%key, "bad case");
        absorb_duplicate(self.store.mark_bad_case(key))?;
        Counters::bump(&self.counters.bad_cases);
        for extension in canonical.extensions() {
            Counters::bump(&self.counters.extensions);
            scope.spawn(move |s| self.visit(s, extension));
        }
        Ok(())
    }
}

fn absorb_duplicate(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(StoreError::Duplicate(_)) => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        settings::{three_halves, SearchOptions},
        store::MemoryCaseStore,
    };

    fn config(spi: &str) -> Configuration {
        Configuration::with_identity_arrangement(spi.parse().unwrap())
    }

    fn options(ratio: num::rational::Ratio<u32>, max_norm: usize) -> ExtendOptions {
        ExtendOptions::default()
            .with_search(SearchOptions::default().with_max_ratio(ratio))
            .with_max_norm(max_norm)
    }

    #[test]
    fn interleaving_pair_is_solved_directly() {
        let store = MemoryCaseStore::new();
        let root = config("(0 4 2)(1 5 3)");
        let report = Extender::new(&store, options(three_halves(), 2))
            .run([root.clone()])
            .unwrap();
        assert_eq!(report.solved, 1);
        assert_eq!(report.bad_cases, 0);

        let key = &root.canonical().signature;
        let moves = store.find(key).unwrap().unwrap();
        let sorted = root
            .from_canonical(&moves)
            .iter()
            .fold(root.clone(), |c, rho| c.apply(rho));
        assert!(sorted.spi().is_identity());
    }

    #[test]
    fn intersecting_pair_is_extended_up_to_the_bound() {
        let store = MemoryCaseStore::new();
        let root = config("(0 3 1)(2 5 4)");
        let report = Extender::new(&store, options(three_halves(), 2))
            .run([root.clone()])
            .unwrap();
        assert_eq!(report.solved, 0);
        assert_eq!(report.bad_cases, 1);
        assert!(report.extensions > 0);
        assert_eq!(report.beyond_bound, report.extensions);
        assert!(store.is_bad_case(&root.canonical().signature).unwrap());
    }

    #[test]
    fn only_two_cycles_skip_the_search() {
        let store = MemoryCaseStore::new();
        let root = config("(0 1 2 3)(4 5 6 7)");
        let report = Extender::new(&store, options(three_halves(), 4))
            .run([root.clone()])
            .unwrap();
        assert_eq!(report.solved, 1);
        assert_eq!(report.bad_cases, 0);
        assert!(store.find(&root.canonical().signature).unwrap().is_some());

        let store = MemoryCaseStore::new();
        let root = config("(0 1)(2 3)");
        Extender::new(&store, options(three_halves(), 2))
            .run([root.clone()])
            .unwrap();
        assert!(store.is_bad_case(&root.canonical().signature).unwrap());
    }

    #[test]
    fn bad_cases_spawn_searched_extensions() {
        let store = MemoryCaseStore::new();
        let report = Extender::new(&store, options(num::rational::Ratio::from_integer(1), 3))
            .run([config("(0 4 2)(1 5 3)")])
            .unwrap();
        assert!(report.bad_cases > 1);
        assert!(report.extensions > 0);
        assert!(report.beyond_bound > 0);
        assert_eq!(store.number_of_solved(), report.solved);
    }

    #[test]
    fn second_run_only_finds_known_cases() {
        let store = MemoryCaseStore::new();
        let roots = || [config("(0 4 2)(1 5 3)"), config("(1 5 3)(0 4 2)").rotate(3)];
        let extender = Extender::new(&store, options(three_halves(), 2));
        let first = extender.run(roots()).unwrap();
        assert_eq!(first.solved, 1);
        assert_eq!(first.already_known + first.contended, 1);

        let again = Extender::new(&store, options(three_halves(), 2))
            .run(roots())
            .unwrap();
        assert_eq!(again.solved, 0);
        assert_eq!(again.already_known, 2);
        assert_eq!(store.number_of_solved(), 1);
    }
}
