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
//! Core value types shared across the statistical engine: the per-packet record, the
//! address-pair flow key, and the burst grouping built on top of them.

use serde::{Deserialize, Serialize};

/// Identifies a flow by its address pair only; ports are carried per-packet but are not
/// part of the key (see module docs for the non-5-tuple rationale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    pub saddr: u32,
    pub daddr: u32,
}

impl FlowKey {
    pub fn new(saddr: u32, daddr: u32) -> Self {
        FlowKey { saddr, daddr }
    }
}

/// A single packet observation. Multi-byte wire fields are expected to already be in host
/// byte order by the time a `Packet` is constructed (conversion is the ingest module's job).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub time: f64,
    pub sport: u16,
    pub dport: u16,
    pub proto: u8,
    pub len: u16,
    pub tcpflags: u8,
}

/// A maximal run of packets in a flow with consecutive gaps below `burst_timeout`.
///
/// Invariants: `start_time <= end_time`; `packets` is non-empty; `packets[0].time ==
/// start_time`; `packets.last().time == end_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Burst {
    pub start_time: f64,
    pub end_time: f64,
    pub packets: Vec<Packet>,
}

impl Burst {
    /// Opens a new burst containing exactly `pkt`.
    pub fn open(pkt: Packet) -> Self {
        Burst {
            start_time: pkt.time,
            end_time: pkt.time,
            packets: vec![pkt],
        }
    }

    /// Appends `pkt` to this burst, extending `end_time`. Callers are responsible for only
    /// calling this when `pkt` actually belongs to the burst (gap below `burst_timeout`).
    pub fn push(&mut self, pkt: Packet) {
        self.end_time = pkt.time;
        self.packets.push(pkt);
    }
}

/// Parameters of the on/off Pareto renewal process that drives burst generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeParameters {
    pub a_on: f64,
    pub m_on: f64,
    pub a_off: f64,
    pub m_off: f64,
    pub total_duration: f64,
}

/// Parameters of the address-space cascade; the spread of the symmetric logit-normal
/// generator for the source and destination address sets, respectively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddrParameters {
    pub src_sigma: f64,
    pub dst_sigma: f64,
}
