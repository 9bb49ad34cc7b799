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
//! JSON configuration bundling the fitted/target parameters a generation pass needs:
//! on/off timing, address-space spread, the burst-grouping timeout, and the PRNG seed.
//!
//! `fit` writes one of these after fitting an observed trace; `synth` loads it back to
//! drive `TraceGenerator`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::packet::{AddrParameters, TimeParameters};
use crate::time_analyzer::DEFAULT_BURST_TIMEOUT;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a generation pass needs beyond the observed trace itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub time: TimeParameters,
    pub addr: AddrParameters,
    #[serde(default = "default_burst_timeout")]
    pub burst_timeout: f64,
    /// Target synthetic source/destination address-set sizes; defaults to the observed
    /// distinct counts when a host has no other target cardinality in mind.
    pub n_src: usize,
    pub n_dst: usize,
    pub seed: u64,
}

fn default_burst_timeout() -> f64 {
    DEFAULT_BURST_TIMEOUT
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            time: TimeParameters {
                a_on: 1.5,
                m_on: 0.01,
                a_off: 1.2,
                m_off: 0.01,
                total_duration: 60.0,
            },
            addr: AddrParameters {
                src_sigma: 0.8,
                dst_sigma: 0.6,
            },
            burst_timeout: 0.01,
            n_src: 100,
            n_dst: 50,
            seed: 42,
        }
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = sample();
        let text = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn missing_burst_timeout_defaults() {
        let json = r#"{
            "time": {"a_on":1.5,"m_on":0.01,"a_off":1.2,"m_off":0.01,"total_duration":60.0},
            "addr": {"src_sigma":0.8,"dst_sigma":0.6},
            "n_src": 100,
            "n_dst": 50,
            "seed": 42
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.burst_timeout, DEFAULT_BURST_TIMEOUT);
    }
}
