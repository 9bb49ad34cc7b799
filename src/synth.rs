// burstify: synthesizes network packet traces matching observed time- and address-space statistics
// Copyright (C) 2026 burstify contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! CLI: loads a fitted `Config`, re-ingests the same observed trace, runs
//! `TraceGenerator`, and streams emitted packets to a CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use rand::rngs::StdRng;
use rand::SeedableRng;

use burstify::config::Config;
use burstify::io::csv_io::TraceWriter;
use burstify::io::load_trace;
use burstify::time_analyzer::TimeAnalyzer;
use burstify::trace_generator::TraceGenerator;

/// Synthesize a trace matching a fitted config's time- and address-space parameters.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The same observed trace `fit` was run against (pcap or CSV).
    input: PathBuf,

    /// Config JSON written by `fit`.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Where to write the synthesized trace CSV.
    #[arg(short, long, default_value = "synth.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let logger = pretty_env_logger::formatted_builder().build();
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger)
        .try_init()
        .expect("logger installed exactly once");
    let progress = multi.add(ProgressBar::new(0));

    let args = Args::parse();

    let config =
        Config::load(&args.config).with_context(|| format!("loading config {:?}", args.config))?;

    let mut analyzer = TimeAnalyzer::new(config.burst_timeout);
    load_trace(&args.input, &mut analyzer).with_context(|| format!("ingesting {:?}", args.input))?;
    let total_packets = analyzer.packet_count();
    log::info!(
        "re-ingested {total_packets} packets across {} flows",
        analyzer.flows().len()
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut generator = TraceGenerator::new(
        &analyzer,
        &config.time,
        &config.addr,
        config.n_src,
        config.n_dst,
        &mut rng,
    );

    let mut writer = TraceWriter::create(&args.output)
        .with_context(|| format!("creating {:?}", args.output))?;

    progress.set_length(total_packets as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} packets emitted")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut emitted = 0usize;
    while let Some((key, pkt)) = generator.next_packet() {
        writer.write(key, pkt)?;
        emitted += 1;
        progress.inc(1);
    }
    progress.finish_and_clear();
    writer.flush()?;
    log::info!("emitted {emitted} synthetic packets to {:?}", args.output);
    Ok(())
}
