use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use num::rational::Ratio;
use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use tdp::{
    configuration::Configuration,
    cycle::Cycle,
    extend::Extender,
    library::CaseLibrary,
    multicycle::MulticyclePermutation,
    search::{search, search_parallel},
    settings::{Acceptance, ExtendOptions, MoveRatio, SearchOptions, SortOptions},
    sorting::{ElevenEighths, SortContext, Sorting, SortingAlgorithm, ThreeHalves},
    store::MemoryCaseStore,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "tdp",
    about = "Sort permutations by transpositions within 11/8 or 3/2 of the optimum, and build the case libraries the sorting relies on."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sort permutations given as `a,b,c,...` over 1..n (0 is implicit).
    Sort {
        #[arg(value_name = "PERMUTATION")]
        permutations: Vec<String>,
        #[arg(long, value_enum, default_value_t = Algorithm::ElevenEighths)]
        algorithm: Algorithm,
        /// Case file with the 11/8 sequences.
        #[arg(long = "cases-11-8", value_name = "FILE")]
        cases_11_8: Option<PathBuf>,
        /// Case file with the (3,2)-sequences.
        #[arg(long = "cases-3-2", value_name = "FILE")]
        cases_3_2: Option<PathBuf>,
        /// Fail on missing cases instead of searching the local configuration.
        #[arg(long)]
        no_search: bool,
        /// Largest configuration searched when a case is missing.
        #[arg(long, value_name = "N")]
        max_search_symbols: Option<usize>,
        /// Also sort N random permutations of 1..=SIZE.
        #[arg(long, value_name = "N", default_value_t = 0)]
        random: usize,
        #[arg(long, value_name = "SIZE", default_value_t = 10)]
        size: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the canonical signature of a configuration.
    Canonical {
        /// `spi` in cycle notation, e.g. `(0 4 2)(1 5 3)`.
        spi: String,
        /// Arrangement as `a,b,c,...` (defaults to 0,1,...,n-1).
        #[arg(long)]
        pi: Option<String>,
    },
    /// Search a bounded-ratio sequence of moves for a configuration.
    Search {
        spi: String,
        #[arg(long)]
        pi: Option<String>,
        #[arg(long, default_value = "11/8")]
        ratio: MoveRatio,
        /// Only accept sequences ending on the identity.
        #[arg(long)]
        fully: bool,
        #[arg(long)]
        parallel: bool,
        #[arg(long, value_name = "N", default_value_t = 32)]
        max_symbols: usize,
    },
    /// Solve or extend configurations until every case within the bound is known.
    Extend {
        /// Root configurations in cycle notation, on the arrangement 0,1,...,n-1.
        #[arg(required = true)]
        roots: Vec<String>,
        #[arg(long, default_value = "11/8")]
        ratio: MoveRatio,
        #[arg(long, default_value_t = ExtendOptions::default().max_norm)]
        max_norm: usize,
        /// Case file receiving the solved cases (stdout when absent).
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    ElevenEighths,
    ThreeHalves,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Sort {
            permutations,
            algorithm,
            cases_11_8,
            cases_3_2,
            no_search,
            max_search_symbols,
            random,
            size,
            seed,
        } => {
            let mut options = SortOptions::default().with_search_on_miss(!no_search);
            if let Some(max) = max_search_symbols {
                options = options.with_max_search_symbols(max);
            }
            let context = SortContext::new(
                Arc::new(load_library(cases_11_8.as_deref())?),
                Arc::new(load_library(cases_3_2.as_deref())?),
            )
            .with_options(options);
            let algorithm: Box<dyn SortingAlgorithm> = match algorithm {
                Algorithm::ElevenEighths => Box::new(ElevenEighths::new(context)),
                Algorithm::ThreeHalves => Box::new(ThreeHalves::new(context)),
            };

            let mut inputs = permutations;
            let mut rng = SmallRng::seed_from_u64(seed);
            for _ in 0..random {
                let mut symbols: Vec<usize> = (1..=size).collect();
                symbols.shuffle(&mut rng);
                inputs.push(symbols.iter().join(","));
            }
            if inputs.is_empty() {
                bail!("nothing to sort: pass permutations or --random N");
            }

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for input in &inputs {
                let sorting = algorithm
                    .sort_str(input)
                    .with_context(|| format!("{} failed to sort {input}", algorithm.name()))?;
                print_sorting(&mut out, &sorting)?;
            }
        }
        Command::Canonical { spi, pi } => {
            let config = parse_configuration(&spi, pi.as_deref())?;
            let form = config.canonical();
            println!("{}", form.signature);
            println!(
                "rotation {} mirrored {} hash {:08x}",
                form.rotation,
                form.mirrored,
                config.stable_hash()
            );
            println!("{}", config.canonical_configuration());
        }
        Command::Search {
            spi,
            pi,
            ratio,
            fully,
            parallel,
            max_symbols,
        } => {
            let config = parse_configuration(&spi, pi.as_deref())?;
            let options = SearchOptions::default()
                .with_max_ratio(ratio)
                .with_max_symbols(max_symbols)
                .with_acceptance(if fully {
                    Acceptance::FullySorted
                } else {
                    Acceptance::RatioWithin
                });
            let found = if parallel {
                search_parallel(config.spi(), config.pi(), &options)
            } else {
                search(config.spi(), config.pi(), &options)
            };
            match found {
                Some(moves) => println!("{}", moves.iter().join(" ")),
                None => bail!("no sequence within {ratio} for {config}"),
            }
        }
        Command::Extend {
            roots,
            ratio,
            max_norm,
            out,
        } => {
            let roots = roots
                .iter()
                .map(|spi| parse_configuration(spi, None))
                .collect::<Result<Vec<_>>>()?;
            let options = ExtendOptions::default()
                .with_search(SearchOptions::default().with_max_ratio(ratio))
                .with_max_norm(max_norm);
            let store = MemoryCaseStore::new();
            let report = Extender::new(&store, options).run(roots)?;
            eprintln!("{report}");
            match out {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    let mut writer = BufWriter::new(file);
                    store.export(&mut writer)?;
                    writer.flush()?;
                }
                None => store.export(io::stdout().lock())?,
            }
        }
    }
    Ok(())
}

fn load_library(path: Option<&Path>) -> Result<CaseLibrary> {
    match path {
        Some(path) => CaseLibrary::load(path)
            .with_context(|| format!("failed to load cases from {}", path.display())),
        None => Ok(CaseLibrary::new()),
    }
}

fn parse_configuration(spi: &str, pi: Option<&str>) -> Result<Configuration> {
    let spi = MulticyclePermutation::parse_dense(spi)
        .with_context(|| format!("invalid cycle notation '{spi}'"))?;
    let pi = match pi {
        Some(pi) => Cycle::parse_within(pi, spi.number_of_symbols())
            .with_context(|| format!("invalid arrangement '{pi}'"))?,
        None => Cycle::identity_arrangement(spi.number_of_symbols()),
    };
    let same_symbols =
        spi.number_of_symbols() == pi.len() && pi.symbols().iter().all(|&s| spi.contains(s));
    if !same_symbols {
        bail!("{spi} and [{}] act on different symbols", pi.symbols().iter().join(","));
    }
    Ok(Configuration::new(spi, pi))
}

/// One line per arrangement, then the number of moves and the 3-norm lower bound.
fn print_sorting(out: &mut impl Write, sorting: &Sorting) -> Result<()> {
    for pi in sorting.arrangements() {
        writeln!(out, "{}", pi.symbols().iter().join(","))?;
    }
    let lower = MulticyclePermutation::of_arrangement(&sorting.initial).three_norm();
    let ratio = if lower == 0 {
        Ratio::from_integer(1)
    } else {
        Ratio::new(sorting.len(), lower)
    };
    writeln!(
        out,
        "{} moves, lower bound {lower}, at most {ratio} of the optimum",
        sorting.len()
    )?;
    Ok(())
}
