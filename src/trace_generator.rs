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
//! Combines the address cascade and the burst process: synthesizes a full trace from an
//! observed `TimeAnalyzer` and emits `(FlowKey, Packet)` tuples in global timestamp order.

use std::cmp::Reverse;

use ordered_float::NotNan;
use priority_queue::PriorityQueue;
use rand::Rng;

use crate::addr_map::AddrMap;
use crate::burst_generator::BurstGenerator;
use crate::cascade::CascadeGenerator;
use crate::packet::{AddrParameters, FlowKey, Packet, TimeParameters};
use crate::prefix_tree::PrefixTree;
use crate::time_analyzer::TimeAnalyzer;

/// Which half of a `FlowKey` a cascade pass is operating on; a tagged variant stands in
/// for a closure-based projection so the two symmetric passes (source cascade,
/// destination cascade) stay legible side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AddrRole {
    Src,
    Dst,
}

impl AddrRole {
    fn project(self, key: &FlowKey) -> u32 {
        match self {
            AddrRole::Src => key.saddr,
            AddrRole::Dst => key.daddr,
        }
    }
}

/// A burst that has been scheduled for emission: a remapped flow key, its synthetic
/// packets (already time-ordered and address-remapped), and a cursor into them.
///
/// `PartialEq`/`Eq`/`Hash` are keyed on `id` alone so it can live inside a
/// [`PriorityQueue`], which needs its items hashable; the actual payload (the packet
/// vector) has no bearing on queue identity.
#[derive(Debug, Clone)]
struct ScheduledBurst {
    id: u64,
    key: FlowKey,
    packets: Vec<Packet>,
    cursor: usize,
}

impl PartialEq for ScheduledBurst {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for ScheduledBurst {}
impl std::hash::Hash for ScheduledBurst {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn not_nan(x: f64) -> NotNan<f64> {
    NotNan::new(x).expect("scheduler timestamps must never be NaN")
}

/// Synthesizes and schedules a full trace from an observed [`TimeAnalyzer`].
///
/// Pulled by the caller via [`TraceGenerator::next_packet`] until exhausted; single
/// threaded, no internal suspension points.
pub struct TraceGenerator {
    src_map: AddrMap,
    dst_map: AddrMap,
    // min-heap on a burst's start_time, for bursts not yet activated
    pending_bursts: PriorityQueue<ScheduledBurst, Reverse<NotNan<f64>>>,
    // min-heap on the next unemitted packet's time, for currently-active bursts
    active_bursts: PriorityQueue<ScheduledBurst, Reverse<NotNan<f64>>>,
    next_id: u64,
}

impl TraceGenerator {
    /// Builds the address cascades and burst schedules for every observed flow and
    /// queues them for emission.
    ///
    /// `n_src`/`n_dst` are the sizes of the synthetic source/destination address sets;
    /// the spec's `AddrParameters` fixes only the cascade spreads, so the target
    /// cardinalities are supplied by the caller (by convention, the host defaults these
    /// to the observed distinct counts when it has no other target in mind).
    pub fn new(
        observed: &TimeAnalyzer,
        time_params: &TimeParameters,
        addr_params: &AddrParameters,
        n_src: usize,
        n_dst: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let observed_src = Self::observed_singularities(observed, AddrRole::Src);
        let observed_dst = Self::observed_singularities(observed, AddrRole::Dst);

        let synthetic_src = CascadeGenerator::generate(addr_params.src_sigma, n_src, rng);
        let synthetic_dst = CascadeGenerator::generate(addr_params.dst_sigma, n_dst, rng);

        let src_map = AddrMap::build(&observed_src, &synthetic_src);
        let dst_map = AddrMap::build(&observed_dst, &synthetic_dst);

        let mut burst_gen = BurstGenerator::new(
            time_params.a_on,
            time_params.m_on,
            time_params.a_off,
            time_params.m_off,
            time_params.total_duration,
        );

        let mut gen = TraceGenerator {
            src_map,
            dst_map,
            pending_bursts: PriorityQueue::new(),
            active_bursts: PriorityQueue::new(),
            next_id: 0,
        };

        for (flow_key, bursts) in observed.flows() {
            gen.schedule_flow(*flow_key, bursts, &mut burst_gen, rng);
        }

        gen
    }

    /// Builds a `PrefixTree` over the distinct addresses `role` projects out of
    /// `observed`'s flow keys and returns their `(address, alpha)` singularities.
    fn observed_singularities(observed: &TimeAnalyzer, role: AddrRole) -> Vec<(u32, f64)> {
        let mut tree = PrefixTree::new();
        for key in observed.flows().keys() {
            // `add` is a no-op on repeats, so distinct-address semantics fall out for free.
            let _ = tree.add(role.project(key), 1.0);
        }
        tree.prefixify();

        tree.addresses()
            .into_iter()
            .map(|a| (a, tree.singularity(a)))
            .collect()
    }

    fn schedule_flow(
        &mut self,
        key: FlowKey,
        observed_bursts: &[crate::packet::Burst],
        burst_gen: &mut BurstGenerator,
        rng: &mut impl Rng,
    ) {
        let flat: Vec<&Packet> = observed_bursts.iter().flat_map(|b| b.packets.iter()).collect();
        let total = flat.len();
        if total == 0 {
            return;
        }

        let synth_bursts = burst_gen.next(total, rng);

        let new_saddr = self
            .src_map
            .get(key.saddr)
            .expect("every observed src address must have a synthetic image");
        let new_daddr = self
            .dst_map
            .get(key.daddr)
            .expect("every observed dst address must have a synthetic image");
        let new_key = FlowKey::new(new_saddr, new_daddr);

        let mut cursor = 0usize;
        for burst in synth_bursts {
            if burst.pkts == 0 {
                continue;
            }
            let mut packets = Vec::with_capacity(burst.pkts);
            let span = burst.end_time - burst.start_time;
            for i in 0..burst.pkts {
                let src = flat[cursor % total];
                cursor += 1;
                let time = if burst.pkts > 1 {
                    burst.start_time + (i as f64) * span / (burst.pkts as f64)
                } else {
                    burst.start_time
                };
                packets.push(Packet {
                    time,
                    sport: src.sport,
                    dport: src.dport,
                    proto: src.proto,
                    len: src.len,
                    tcpflags: src.tcpflags,
                });
            }
            let start_time = packets[0].time;
            let id = self.next_id;
            self.next_id += 1;
            self.pending_bursts.push(
                ScheduledBurst {
                    id,
                    key: new_key,
                    packets,
                    cursor: 0,
                },
                Reverse(not_nan(start_time)),
            );
        }
    }

    /// Pulls the next globally-earliest packet, or `None` once both heaps are empty.
    pub fn next_packet(&mut self) -> Option<(FlowKey, Packet)> {
        let pending_next = self.pending_bursts.peek().map(|(_, Reverse(t))| *t);
        let active_next = self.active_bursts.peek().map(|(_, Reverse(t))| *t);

        let take_pending = match (pending_next, active_next) {
            (Some(p), Some(a)) => p <= a,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return None,
        };

        let mut burst = if take_pending {
            self.pending_bursts.pop().unwrap().0
        } else {
            self.active_bursts.pop().unwrap().0
        };

        let pkt = burst.packets[burst.cursor];
        let key = burst.key;
        burst.cursor += 1;

        if burst.cursor < burst.packets.len() {
            let next_time = not_nan(burst.packets[burst.cursor].time);
            self.active_bursts.push(burst, Reverse(next_time));
        }

        Some((key, pkt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet as Pkt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn time_params() -> TimeParameters {
        TimeParameters {
            a_on: 1.5,
            m_on: 0.01,
            a_off: 1.5,
            m_off: 0.01,
            total_duration: 1.0,
        }
    }

    fn addr_params() -> AddrParameters {
        AddrParameters {
            src_sigma: 0.7,
            dst_sigma: 0.5,
        }
    }

    fn pkt(time: f64) -> Pkt {
        Pkt {
            time,
            sport: 1234,
            dport: 80,
            proto: 6,
            len: 60,
            tcpflags: 0,
        }
    }

    fn observed_two_flows() -> TimeAnalyzer {
        let mut a = TimeAnalyzer::new(0.01);
        // second flow's observed start is earlier than the first's, exercising the
        // scheduler's global ordering independent of input iteration order.
        let f1 = FlowKey::new(0x0A00_0001, 0x0B00_0001);
        let f2 = FlowKey::new(0x0A00_0002, 0x0B00_0002);
        for t in [10.0, 10.005, 10.020] {
            a.add(f1, pkt(t));
        }
        for t in [0.0, 0.003, 0.100, 0.103] {
            a.add(f2, pkt(t));
        }
        a
    }

    fn drain(gen: &mut TraceGenerator) -> Vec<(FlowKey, Pkt)> {
        let mut out = Vec::new();
        while let Some(item) = gen.next_packet() {
            out.push(item);
        }
        out
    }

    #[test]
    fn emitted_timestamps_are_non_decreasing() {
        let observed = observed_two_flows();
        let mut rng = StdRng::seed_from_u64(1);
        let mut gen = TraceGenerator::new(&observed, &time_params(), &addr_params(), 2, 2, &mut rng);
        let out = drain(&mut gen);
        for w in out.windows(2) {
            assert!(w[0].1.time <= w[1].1.time);
        }
    }

    #[test]
    fn packet_budget_matches_observed_total() {
        let observed = observed_two_flows();
        let expected: usize = observed.packet_count();
        let mut rng = StdRng::seed_from_u64(2);
        let mut gen = TraceGenerator::new(&observed, &time_params(), &addr_params(), 2, 2, &mut rng);
        let out = drain(&mut gen);
        assert_eq!(out.len(), expected);
    }

    #[test]
    fn addresses_lie_in_cascade_images() {
        let observed = observed_two_flows();
        let mut rng = StdRng::seed_from_u64(3);
        let mut gen = TraceGenerator::new(&observed, &time_params(), &addr_params(), 2, 2, &mut rng);

        let src_images: std::collections::HashSet<u32> =
            gen.src_map.get(0x0A00_0001).into_iter().chain(gen.src_map.get(0x0A00_0002)).collect();
        let dst_images: std::collections::HashSet<u32> =
            gen.dst_map.get(0x0B00_0001).into_iter().chain(gen.dst_map.get(0x0B00_0002)).collect();

        let out = drain(&mut gen);
        for (key, _) in &out {
            assert!(src_images.contains(&key.saddr));
            assert!(dst_images.contains(&key.daddr));
        }
    }

    #[test]
    fn deterministic_given_same_seed_and_input() {
        let observed = observed_two_flows();

        let mut rng1 = StdRng::seed_from_u64(42);
        let mut gen1 = TraceGenerator::new(&observed, &time_params(), &addr_params(), 2, 2, &mut rng1);
        let out1 = drain(&mut gen1);

        let mut rng2 = StdRng::seed_from_u64(42);
        let mut gen2 = TraceGenerator::new(&observed, &time_params(), &addr_params(), 2, 2, &mut rng2);
        let out2 = drain(&mut gen2);

        assert_eq!(out1.len(), out2.len());
        for (a, b) in out1.iter().zip(out2.iter()) {
            assert_eq!(a.0, b.0);
            assert_eq!(a.1.time, b.1.time);
        }
    }

    #[test]
    fn addr_role_projects_the_right_half() {
        let key = FlowKey::new(0xAAAA_AAAA, 0xBBBB_BBBB);
        assert_eq!(AddrRole::Src.project(&key), 0xAAAA_AAAA);
        assert_eq!(AddrRole::Dst.project(&key), 0xBBBB_BBBB);
    }
}
