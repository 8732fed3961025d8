//! # impl-synth
//!
//! Synthesizes concrete implementations of abstract types by wiring every
//! abstract member to exactly one method strategy, and caches the results.
//!
//! ## Layout
//!
//! - [`types`]: the type catalog standing in for host reflection, plus generic
//!   parameter resolution.
//! - [`strategy`]: the strategy protocol and the delegate and marker strategies.
//! - [`builder`]: strict per-member resolution into a
//!   [`SynthesizedImplementation`](builder::SynthesizedImplementation).
//! - [`cache`]: the synthesis and instance caches sharing one lock.
//! - [`manifest`]: TOML catalog loading for the command-line tool.
//!
//! Set `IMPL_SYNTH_LOG` (e.g. `IMPL_SYNTH_LOG=impl_synth=debug`) to see cache
//! and resolution logging from the command-line tool.
use crate::{
    builder::StrategyBuilder,
    cache::SynthesisCache,
    error::CliError,
    manifest::{load_catalog, parse_concrete},
    strategy::{AnnotatedStrategy, DelegateStrategy, SearchBound},
};
use clap::Parser;
use std::{io::Write, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

pub mod builder;
pub mod cache;
pub mod error;
pub mod manifest;
pub mod metrics;
pub mod strategy;
pub mod types;
pub mod utils;
pub mod value;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Synthesizes implementations of abstract types from method strategies"
)]
pub struct Args {
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,
    /// Abstract types to synthesize
    #[arg(value_name = "TARGET", required = true)]
    pub targets: Vec<String>,
    /// Register a delegate strategy for this type
    #[arg(short, long, value_name = "TYPE")]
    pub delegate: Vec<String>,
    /// Search delegate superclasses up to, but excluding, this type
    #[arg(long, value_name = "TYPE")]
    pub stop_at: Option<String>,
    /// Register a marker strategy for this marker kind
    #[arg(short, long, value_name = "KIND")]
    pub marker: Vec<String>,
    /// Constructor parameter types of the synthesized implementations
    #[arg(short, long, value_name = "TYPES", value_delimiter = ',')]
    pub constructor: Vec<String>,
    /// Print the full rendered implementation instead of the wiring summary
    #[arg(short, long)]
    pub emit: bool,
    /// Print cache statistics as JSON after synthesis
    #[arg(long)]
    pub stats: bool,
}

pub fn run_cli() -> ExitCode {
    let filter =
        EnvFilter::try_from_env("IMPL_SYNTH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let stdout = std::io::stdout();
    match run(&args, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

pub fn run(args: &Args, out: &mut impl Write) -> Result<(), CliError> {
    let catalog = load_catalog(&args.manifest)?;
    let find = |name: &str| {
        catalog
            .find_type(name)
            .ok_or_else(|| CliError::UnknownType(name.to_string()))
    };

    let bound = match &args.stop_at {
        Some(stop) => SearchBound::Until(find(stop.as_str())?),
        None => SearchBound::Declared,
    };
    let mut builder = StrategyBuilder::new();
    for delegate in &args.delegate {
        let delegate = find(delegate.as_str())?;
        builder = builder.strategy(DelegateStrategy::bounded(delegate, bound.clone()));
    }
    for marker in &args.marker {
        builder = builder.strategy(AnnotatedStrategy::new(marker.clone()));
    }
    let constructor = args
        .constructor
        .iter()
        .map(|t| parse_concrete(&catalog, t))
        .collect::<Result<Vec<_>, _>>()?;
    let cache: SynthesisCache<_> = SynthesisCache::new(builder.constructor(constructor));

    for target in &args.targets {
        let implementation = cache.get(&find(target.as_str())?)?;
        if args.emit {
            writeln!(out, "{}", implementation.render())?;
        } else {
            writeln!(out, "{}:", implementation.name())?;
            for (signature, strategy) in implementation.wiring() {
                writeln!(out, "  {} <- {}", signature, strategy)?;
            }
        }
    }

    if args.stats {
        writeln!(out, "{}", serde_json::to_string_pretty(&cache.statistics())?)?;
    }
    Ok(())
}
