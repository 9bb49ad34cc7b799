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
//! Pareto on/off renewal process: generates successive `total_duration`-long windows of
//! bursts, each window carrying exactly a requested packet budget.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_distr::Exp1;

/// One synthesized burst within a generation window: a time interval and the number of
/// packets assigned to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstTimes {
    pub start_time: f64,
    pub end_time: f64,
    pub pkts: usize,
}

/// Continuous Pareto on/off renewal process, pulled one `total_duration`-long window at
/// a time via [`BurstGenerator::next`].
#[derive(Debug, Clone)]
pub struct BurstGenerator {
    a_on: f64,
    m_on: f64,
    a_off: f64,
    m_off: f64,
    total_duration: f64,
    first_time: bool,
    start_on: bool,
    start_offset: f64,
}

impl BurstGenerator {
    /// # Panics
    /// Panics if `m_on`, `m_off`, `a_on`, `a_off` are not strictly positive, or if
    /// `m_off >= total_duration` — these are programmer errors (bad configuration), not
    /// recoverable runtime conditions.
    pub fn new(a_on: f64, m_on: f64, a_off: f64, m_off: f64, total_duration: f64) -> Self {
        assert!(m_on > 0.0, "m_on must be strictly positive");
        assert!(m_off > 0.0, "m_off must be strictly positive");
        assert!(a_on > 0.0, "a_on must be strictly positive");
        assert!(a_off > 0.0, "a_off must be strictly positive");
        assert!(
            m_off < total_duration,
            "m_off must be smaller than total_duration"
        );
        BurstGenerator {
            a_on,
            m_on,
            a_off,
            m_off,
            total_duration,
            first_time: true,
            start_on: false,
            start_offset: 0.0,
        }
    }

    /// Produces the next `total_duration`-long window of bursts, with packets summing
    /// to exactly `num_pkts`. Burst list is time-ordered; every returned burst has
    /// `pkts > 0`.
    pub fn next(&mut self, num_pkts: usize, rng: &mut impl Rng) -> Vec<BurstTimes> {
        if self.first_time {
            let off0 = pareto_sample(self.a_off, self.m_off, rng);
            self.start_offset = off0.rem_euclid(self.total_duration);
            self.first_time = false;
        }

        let mut cur = if self.start_on { 0.0 } else { self.start_offset };
        let mut pending_on = if self.start_on {
            Some(self.start_offset)
        } else {
            None
        };

        let mut bursts = Vec::new();
        loop {
            let on = pending_on
                .take()
                .unwrap_or_else(|| pareto_sample(self.a_on, self.m_on, rng));
            let off = pareto_sample(self.a_off, self.m_off, rng);

            if cur + on > self.total_duration {
                bursts.push(BurstTimes {
                    start_time: cur,
                    end_time: self.total_duration,
                    pkts: 0,
                });
                self.start_on = true;
                self.start_offset = (cur + on).rem_euclid(self.total_duration);
                log::trace!("window rollover mid-burst, carrying {:.6}s into next window", self.start_offset);
                break;
            }

            bursts.push(BurstTimes {
                start_time: cur,
                end_time: cur + on,
                pkts: 0,
            });
            cur += on + off;
            if cur >= self.total_duration {
                self.start_on = false;
                self.start_offset = cur.rem_euclid(self.total_duration);
                break;
            }
        }

        distribute_packets(&mut bursts, num_pkts, rng);
        bursts.retain(|b| b.pkts > 0);
        bursts
    }
}

/// Samples `Pareto(a, m)` as `m * exp(E / a)` where `E` is a unit-rate exponential
/// variate.
fn pareto_sample(a: f64, m: f64, rng: &mut impl Rng) -> f64 {
    let e: f64 = rng.sample(Exp1);
    m * (e / a).exp()
}

/// Distributes `num_pkts` across `bursts` by repeated weighted sampling (weight
/// proportional to burst duration), guaranteeing the total assigned equals `num_pkts`
/// exactly.
fn distribute_packets(bursts: &mut [BurstTimes], num_pkts: usize, rng: &mut impl Rng) {
    if bursts.is_empty() || num_pkts == 0 {
        return;
    }
    let weights: Vec<f64> = bursts
        .iter()
        .map(|b| (b.end_time - b.start_time).max(f64::MIN_POSITIVE))
        .collect();
    let dist = WeightedIndex::new(&weights).expect("at least one positive-duration burst");
    for _ in 0..num_pkts {
        let idx = dist.sample(rng);
        bursts[idx].pkts += 1;
    }
}
