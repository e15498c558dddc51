//! Command-line runner for a single spindle simulation.
//!
//! Builds a [`Config`](spindle_core::Config) from a preset, an optional JSON
//! file and per-parameter flags, runs one seeded simulation and writes the
//! event records, one per line, to stdout or to `--output`.

mod cli;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use spindle_core::Simulation;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = args.build_config()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.default_log_filter(&cfg)),
    )
    .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("seed {seed}, mode {:?}", cfg.mode());

    let mut sim = Simulation::new(cfg, seed).context("invalid simulation configuration")?;
    let summary = sim.run();

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            let mut out = BufWriter::new(file);
            sim.recorder().write_to(&mut out)?;
            out.flush()?;
        }
        None => {
            let mut out = BufWriter::new(io::stdout().lock());
            sim.recorder().write_to(&mut out)?;
            out.flush()?;
        }
    }

    info!(
        "{:?} at t = {:.2}, {} surviving filaments, {} records",
        summary.termination, summary.time, summary.surviving, summary.records
    );
    Ok(())
}
