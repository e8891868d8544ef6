//! # Case libraries
//!
//! A [`CaseLibrary`] is the read-only table the sorting algorithms consult: it
//! maps canonical signatures to sorting sequences expressed on the canonical
//! configuration, and hands them back translated to the configuration at hand.
//!
//! ## Case files
//!
//! Libraries are exchanged as text, one case per line:
//!
//! ```text
//! # the interleaving pair
//! (0 4 2)(1 5 3);[0,2,4]-[3,1,5]-[2,4,0]
//! ```
//!
//! The left part is `spi` in cycle notation over `0..n` (fixed points are
//! written as 1-cycles, symbols outside of `0..n` are rejected), `pi` is
//! implicitly `0 1 ... n-1`, and the right part lists the moves in the order
//! they are applied. Blank lines and lines starting with `#` are skipped.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::Path,
};

use ahash::AHashMap;
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    configuration::{Configuration, Signature},
    cycle::{check_range, parse_symbols, Cycle, ParseError},
    multicycle::MulticyclePermutation,
    store::{CaseStore, StoreError},
};

#[derive(Error, Debug)]
pub enum CaseFileError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
    #[error("line {line}: expected '<spi>;<moves>', found '{text}'")]
    Malformed { line: usize, text: String },
    #[error("line {line}: {reason}")]
    Invalid { line: usize, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct CaseLibrary {
    cases: AHashMap<Signature, Vec<Cycle>>,
}

impl CaseLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Records `moves`, a sequence for `config` itself. Returns `false`, and
    /// keeps the existing sequence, when the canonical form is already known.
    pub fn insert(&mut self, config: &Configuration, moves: &[Cycle]) -> bool {
        let key = config.canonical().signature.clone();
        if self.cases.contains_key(&key) {
            return false;
        }
        self.cases.insert(key, config.to_canonical(moves));
        true
    }

    /// The stored sequence for `config`'s canonical form, translated to `config`.
    pub fn lookup(&self, config: &Configuration) -> Option<Vec<Cycle>> {
        self.cases
            .get(&config.canonical().signature)
            .map(|moves| config.from_canonical(moves))
    }

    pub fn contains(&self, config: &Configuration) -> bool {
        self.cases.contains_key(&config.canonical().signature)
    }

    /// Every solved case of `store`. Store entries are already canonical.
    pub fn from_store(store: &dyn CaseStore) -> Result<Self, StoreError> {
        Ok(CaseLibrary {
            cases: store.all()?.into_iter().collect(),
        })
    }

    pub fn read_case_file<R: BufRead>(reader: R) -> Result<Self, CaseFileError> {
        let mut library = CaseLibrary::new();
        let mut duplicates = 0;
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let (config, moves) = parse_case(i + 1, text)?;
            if !library.insert(&config, &moves) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            debug!(duplicates, "case file repeats canonical forms; kept the first");
        }
        Ok(library)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CaseFileError> {
        let path = path.as_ref();
        let library = Self::read_case_file(BufReader::new(File::open(path)?))?;
        info!(path = %path.display(), cases = library.len(), "loaded case library");
        Ok(library)
    }

    /// Writes one line per case, on the canonical configuration, sorted by signature.
    pub fn write_case_file<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for key in self.cases.keys().sorted() {
            let config = Configuration::of_signature(key);
            writeln!(writer, "{}", case_line(config.spi(), &self.cases[key]))?;
        }
        Ok(())
    }
}

/// `(0 4 2)(1 5 3);[0,2,4]-[3,1,5]-[2,4,0]`, fixed points of `spi` included.
pub(crate) fn case_line(spi: &MulticyclePermutation, moves: &[Cycle]) -> String {
    format!(
        "{};{}",
        spi.iter().format(""),
        moves
            .iter()
            .format_with("-", |rho, f| f(&format_args!(
                "[{}]",
                rho.symbols().iter().format(",")
            )))
    )
}

fn parse_case(line: usize, text: &str) -> Result<(Configuration, Vec<Cycle>), CaseFileError> {
    let malformed = || CaseFileError::Malformed {
        line,
        text: text.to_string(),
    };
    let invalid = |reason: String| CaseFileError::Invalid { line, reason };
    let parse = |source| CaseFileError::Parse { line, source };

    let (spi, moves) = text.split_once(';').ok_or_else(malformed)?;
    let spi = MulticyclePermutation::parse_dense(spi).map_err(parse)?;
    let n = spi.number_of_symbols();

    let moves = moves
        .split('-')
        .map(|m| {
            let inner = m
                .trim()
                .strip_prefix('[')
                .and_then(|m| m.strip_suffix(']'))
                .ok_or_else(malformed)?;
            let symbols = parse_symbols(inner).map_err(parse)?;
            check_range(&symbols, n).map_err(parse)?;
            let rho = Cycle::try_new(symbols).map_err(parse)?;
            if rho.len() != 3 {
                return Err(invalid(format!("{rho} is not a move on 0..{n}")));
            }
            Ok(rho)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let config = Configuration::with_identity_arrangement(spi);
    let mut current = config.clone();
    for rho in &moves {
        if !current.pi().is_applicable(rho) {
            return Err(invalid(format!("{rho} is not applicable to {current}")));
        }
        current = current.apply(rho);
    }
    if current.spi().number_of_even_cycles() <= config.spi().number_of_even_cycles() {
        return Err(invalid(format!("the moves do not sort {config}")));
    }
    Ok((config, moves))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{search::search, settings::SearchOptions, store::MemoryCaseStore};

    const CASES: &str = "\
# base cases
(0 4 2)(1 5 3);[0,2,4]-[3,1,5]-[2,4,0]

(0 1 2);[0,1,2]
";

    #[test]
    fn reads_and_translates_cases() {
        let library = CaseLibrary::read_case_file(CASES.as_bytes()).unwrap();
        assert_eq!(library.len(), 2);

        let config = Configuration::with_identity_arrangement("(0 4 2)(1 5 3)".parse().unwrap())
            .rotate(1);
        let moves = library.lookup(&config).unwrap();
        let sorted = moves.iter().fold(config.clone(), |c, rho| {
            assert!(c.pi().is_applicable(rho));
            c.apply(rho)
        });
        assert!(sorted.spi().is_identity());
    }

    #[test]
    fn rejects_bad_lines() {
        let err = CaseLibrary::read_case_file("(0 2 1)".as_bytes()).unwrap_err();
        assert!(matches!(err, CaseFileError::Malformed { line: 1, .. }));

        let err = CaseLibrary::read_case_file("(0 2 1);[0,1,2]".as_bytes()).unwrap_err();
        assert!(matches!(err, CaseFileError::Invalid { line: 1, .. }));

        let err = CaseLibrary::read_case_file("\n(0 2 x);[0,2,1]".as_bytes()).unwrap_err();
        assert!(matches!(err, CaseFileError::Parse { line: 2, .. }));

        let err = CaseLibrary::read_case_file("(1 3 2);[1,3,2]".as_bytes()).unwrap_err();
        assert!(matches!(err, CaseFileError::Parse { line: 1, .. }));

        let err = CaseLibrary::read_case_file("(0 2 1);[0,1]".as_bytes()).unwrap_err();
        assert!(matches!(err, CaseFileError::Invalid { line: 1, .. }));
    }

    #[test]
    fn huge_symbols_are_parse_errors() {
        for line in [
            "(0 18446744073709551615);[0,1,2]",
            "(0 1000000000000);[0,1,2]",
            "(0 2 1);[0,1000000000000,2]",
            "(0 2 1);[0,2,18446744073709551615]",
        ] {
            let err = CaseLibrary::read_case_file(line.as_bytes()).unwrap_err();
            assert!(
                matches!(
                    err,
                    CaseFileError::Parse {
                        line: 1,
                        source: ParseError::OutOfRange { .. }
                    }
                ),
                "{line}: {err}"
            );
        }
    }

    #[test]
    fn written_files_read_back() {
        let library = CaseLibrary::read_case_file(CASES.as_bytes()).unwrap();
        let mut out = Vec::new();
        library.write_case_file(&mut out).unwrap();
        let reread = CaseLibrary::read_case_file(out.as_slice()).unwrap();
        assert_eq!(reread.len(), library.len());
        for key in library.cases.keys() {
            similar_asserts::assert_eq!(reread.cases[key], library.cases[key]);
        }
    }

    #[test]
    fn library_from_store() {
        let store = MemoryCaseStore::new();
        let config = Configuration::with_identity_arrangement("(0 4 2)(1 5 3)".parse().unwrap());
        let canonical = config.canonical_configuration();
        let moves = search(
            canonical.spi(),
            canonical.pi(),
            &SearchOptions::fully_sorting(crate::settings::three_halves()),
        )
        .unwrap();
        store
            .save_solution(&config.canonical().signature, &moves)
            .unwrap();

        let library = CaseLibrary::from_store(&store).unwrap();
        assert!(library.contains(&config.mirror()));
        assert!(is_sorting(&config, &library.lookup(&config).unwrap()));
    }

    fn is_sorting(config: &Configuration, moves: &[Cycle]) -> bool {
        moves
            .iter()
            .try_fold(config.clone(), |c, rho| c.pi().is_applicable(rho).then(|| c.apply(rho)))
            .is_some_and(|c| c.spi().is_identity())
    }
}
