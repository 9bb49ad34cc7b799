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
//! Ingests observed packets into per-flow burst lists and fits the on/off Pareto
//! parameters that describe their timing.

use std::collections::HashMap;

use crate::packet::{Burst, FlowKey, Packet};

/// Default inactivity gap (seconds) used to split a flow's packets into bursts.
pub const DEFAULT_BURST_TIMEOUT: f64 = 0.01;

/// Groups packets into per-flow burst lists using an inactivity timeout, and derives
/// on/off duration samples and their Pareto shape fit.
///
/// Packets are assumed to arrive in non-decreasing time order per flow key; this is not
/// guarded against.
#[derive(Debug, Clone)]
pub struct TimeAnalyzer {
    burst_timeout: f64,
    flows: HashMap<FlowKey, Vec<Burst>>,
}

impl Default for TimeAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_BURST_TIMEOUT)
    }
}

impl TimeAnalyzer {
    pub fn new(burst_timeout: f64) -> Self {
        TimeAnalyzer {
            burst_timeout,
            flows: HashMap::new(),
        }
    }

    pub fn burst_timeout(&self) -> f64 {
        self.burst_timeout
    }

    pub fn flows(&self) -> &HashMap<FlowKey, Vec<Burst>> {
        &self.flows
    }

    /// Appends `pkt` to the flow identified by `key`, opening a new burst when the gap
    /// to the previous packet is at least `burst_timeout`.
    pub fn add(&mut self, key: FlowKey, pkt: Packet) {
        match self.flows.get_mut(&key) {
            None => {
                self.flows.insert(key, vec![Burst::open(pkt)]);
            }
            Some(bursts) => {
                let last = bursts.last_mut().expect("a flow always has >=1 burst");
                if pkt.time - last.end_time >= self.burst_timeout {
                    bursts.push(Burst::open(pkt));
                } else {
                    last.push(pkt);
                }
            }
        }
    }

    /// Total number of packets seen across all flows.
    pub fn packet_count(&self) -> usize {
        self.flows
            .values()
            .flat_map(|bursts| bursts.iter())
            .map(|b| b.packets.len())
            .sum()
    }

    /// The duration of every burst in every flow.
    pub fn on_durations(&self) -> Vec<f64> {
        self.flows
            .values()
            .flat_map(|bursts| bursts.iter())
            .map(|b| b.end_time - b.start_time)
            .collect()
    }

    /// The inter-burst gap for every consecutive pair of bursts in every flow.
    pub fn off_durations(&self) -> Vec<f64> {
        self.flows
            .values()
            .flat_map(|bursts| bursts.windows(2))
            .map(|w| w[1].start_time - w[0].end_time)
            .collect()
    }

    /// Maximum-likelihood Pareto shape fit `(alpha_on, alpha_off)`, with minimum position
    /// parameter `m = burst_timeout` for both. Returns `NaN` for a side with no eligible
    /// samples (e.g. a trace with only single-packet flows has no on-durations >=
    /// burst_timeout beyond the degenerate zero-length bursts).
    pub fn pareto_fit(&self) -> (f64, f64) {
        (
            pareto_shape(&self.on_durations(), self.burst_timeout),
            pareto_shape(&self.off_durations(), self.burst_timeout),
        )
    }
}

/// `alpha = 1 / mean(ln(x / m))` over samples `x >= m`, using a running Welford mean.
fn pareto_shape(samples: &[f64], m: f64) -> f64 {
    let mut mean = 0.0f64;
    let mut count = 0u64;
    for &x in samples {
        if x < m {
            continue;
        }
        let ratio = (x / m).ln();
        count += 1;
        mean += (ratio - mean) / count as f64;
    }
    if count == 0 || mean == 0.0 {
        return f64::NAN;
    }
    1.0 / mean
}
