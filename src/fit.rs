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
//! CLI: fits time- and address-space parameters from an observed trace and writes them
//! out as a `Config` JSON for `synth` to consume.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use burstify::config::Config;
use burstify::io::load_trace;
use burstify::packet::{AddrParameters, TimeParameters};
use burstify::prefix_tree::PrefixTree;
use burstify::time_analyzer::{TimeAnalyzer, DEFAULT_BURST_TIMEOUT};

/// Fit on/off and address-space cascade parameters from an observed trace.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Observed trace: a pcap capture (optionally `.gz`), or a CSV previously dumped by
    /// `synth`'s writer.
    input: PathBuf,

    /// Where to write the fitted config.
    #[arg(short, long, default_value = "config.json")]
    output: PathBuf,

    /// Burst inactivity timeout, in seconds.
    #[arg(long, default_value_t = DEFAULT_BURST_TIMEOUT)]
    burst_timeout: f64,

    /// Target synthesis window duration, in seconds; carried into the written config
    /// for `synth` to size its generation windows.
    #[arg(long, default_value_t = 60.0)]
    total_duration: f64,

    /// PRNG seed to record in the written config.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let mut analyzer = TimeAnalyzer::new(args.burst_timeout);
    load_trace(&args.input, &mut analyzer).with_context(|| format!("ingesting {:?}", args.input))?;
    log::info!(
        "ingested {} packets across {} flows",
        analyzer.packet_count(),
        analyzer.flows().len()
    );

    let (a_on, a_off) = analyzer.pareto_fit();

    let mut src_tree = PrefixTree::new();
    let mut dst_tree = PrefixTree::new();
    for key in analyzer.flows().keys() {
        src_tree.add(key.saddr, 1.0)?;
        dst_tree.add(key.daddr, 1.0)?;
    }
    let src_sigma = src_tree.fit_logit_normal();
    let dst_sigma = dst_tree.fit_logit_normal();
    log::debug!("fitted a_on={a_on} a_off={a_off} src_sigma={src_sigma} dst_sigma={dst_sigma}");

    let config = Config {
        time: TimeParameters {
            a_on,
            m_on: args.burst_timeout,
            a_off,
            m_off: args.burst_timeout,
            total_duration: args.total_duration,
        },
        addr: AddrParameters {
            src_sigma,
            dst_sigma,
        },
        burst_timeout: args.burst_timeout,
        n_src: src_tree.n(),
        n_dst: dst_tree.n(),
        seed: args.seed,
    };

    config
        .save(&args.output)
        .with_context(|| format!("writing config to {:?}", args.output))?;
    log::info!("wrote fitted config to {:?}", args.output);
    Ok(())
}
