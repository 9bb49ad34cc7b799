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
//! Weighted IPv4 prefix tree: the address-space half of the cascade model.
//!
//! Stored as 33 flat maps (one per prefix length 0..=32) rather than a pointer-linked
//! tree, since parent/child relationships are purely arithmetic on the address bits.
//! This keeps ownership non-cyclic and lets `prefixify` stream bottom-up in a single
//! pass per level.

use std::collections::HashMap;
use std::fmt;

use ipnet::Ipv4Net;

use crate::slope_fitter::SlopeFitter;

/// A CIDR-style IPv4 prefix, `base` zeroed in its low `32 - len` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    pub base: u32,
    pub len: u32,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Ipv4Net::new(self.base.into(), self.len as u8) {
            Ok(net) => write!(f, "{net}"),
            Err(_) => write!(f, "{}/{}", std::net::Ipv4Addr::from(self.base), self.len),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PrefixTreeError {
    #[error("cannot mutate a prefix tree after it has been prefixified")]
    Prefixified,
}

/// Mask with the top `len` bits set, used to compute the base of an address's ancestor
/// prefix of length `len`.
fn level_mask(len: u32) -> u32 {
    if len == 0 {
        0
    } else {
        (!0u32) << (32 - len)
    }
}

/// Accumulates distinct IPv4 addresses, then turns them into a 33-level weighted prefix
/// tree via [`PrefixTree::prefixify`]. Mutable (insertions) until prefixified; immutable
/// and queryable thereafter.
#[derive(Debug, Clone)]
pub struct PrefixTree {
    levels: Vec<HashMap<u32, f64>>,
    prefixified: bool,
}

impl Default for PrefixTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixTree {
    pub fn new() -> Self {
        PrefixTree {
            levels: (0..=32).map(|_| HashMap::new()).collect(),
            prefixified: false,
        }
    }

    /// Inserts `addr` at level 32 with weight `w`, only if not already present.
    /// Duplicates are silently ignored (not an error).
    pub fn add(&mut self, addr: u32, w: f64) -> Result<(), PrefixTreeError> {
        if self.prefixified {
            return Err(PrefixTreeError::Prefixified);
        }
        self.levels[32].entry(addr).or_insert(w);
        Ok(())
    }

    /// Adds 1.0 to the weight of `addr` at level 32, creating the entry if absent.
    pub fn incr(&mut self, addr: u32) -> Result<(), PrefixTreeError> {
        if self.prefixified {
            return Err(PrefixTreeError::Prefixified);
        }
        *self.levels[32].entry(addr).or_insert(0.0) += 1.0;
        Ok(())
    }

    /// Number of distinct /32 entries inserted so far.
    pub fn n(&self) -> usize {
        self.levels[32].len()
    }

    /// The distinct /32 addresses inserted so far (insertion order is not preserved).
    pub fn addresses(&self) -> Vec<u32> {
        self.levels[32].keys().copied().collect()
    }

    pub fn is_prefixified(&self) -> bool {
        self.prefixified
    }

    /// Rolls every level's weight up into its parent, level 32 down to level 1. A second
    /// call is a no-op (idempotent on the prefixified flag).
    pub fn prefixify(&mut self) {
        if self.prefixified {
            return;
        }
        log::trace!("prefixifying tree over {} distinct addresses", self.n());
        for len in (1..=32u32).rev() {
            let entries: Vec<(u32, f64)> =
                self.levels[len as usize].iter().map(|(&b, &w)| (b, w)).collect();
            let parent_mask = level_mask(len - 1);
            for (base, w) in entries {
                *self.levels[(len - 1) as usize]
                    .entry(base & parent_mask)
                    .or_insert(0.0) += w;
            }
        }
        self.prefixified = true;
    }

    fn prefixify_if_needed(&mut self) {
        if !self.prefixified {
            self.prefixify();
        }
    }

    /// Fits the spread `sigma` of a symmetric logit-normal cascade generator to this
    /// (now prefixified) tree, using internal nodes at lengths `8..=31` whose weight
    /// exceeds 1.0.
    pub fn fit_logit_normal(&mut self) -> f64 {
        self.prefixify_if_needed();

        let mut mean = 0.0f64;
        let mut m2 = 0.0f64;
        let mut count = 0u64;

        for len in 8..=31u32 {
            let shift = 31 - len;
            for (&base, &weight) in self.levels[len as usize].iter() {
                if weight <= 1.0 {
                    continue;
                }
                let right_base = base | (1u32 << shift);
                let l = *self.levels[(len + 1) as usize].get(&base).unwrap_or(&0.0);
                let r = *self.levels[(len + 1) as usize]
                    .get(&right_base)
                    .unwrap_or(&0.0);
                let sum = l + r;
                if sum <= 0.0 {
                    continue;
                }
                let mut w = l / sum;
                if w == 0.0 {
                    w = 1.0 / (2.0 * weight);
                } else if w == 1.0 {
                    w = 1.0 - 1.0 / (2.0 * weight);
                }
                let x = (w / (1.0 - w)).ln();

                count += 1;
                let delta = x - mean;
                mean += delta / count as f64;
                let delta2 = x - mean;
                m2 += delta * delta2;
            }
        }

        if count < 2 {
            return f64::NAN;
        }
        (m2 / (count - 1) as f64).sqrt()
    }

    /// Estimates the singularity exponent alpha(addr): the local scaling slope of
    /// `-log2(mass fraction)` against prefix length along the path to `addr`.
    pub fn singularity(&mut self, addr: u32) -> f64 {
        self.prefixify_if_needed();

        let n = self.n() as f64;
        let mut fitter = SlopeFitter::new();

        for len in 0..=32u32 {
            let base = addr & level_mask(len);
            let count = match self.levels[len as usize].get(&base) {
                Some(&c) if c > 1.0 => c,
                _ => break,
            };
            fitter.add_point(len as f64, -(count / n).log2());
        }

        // an address whose ancestor chain diverges from the rest of the tree within a
        // single prefix length leaves the fitter with fewer than two points; `fit()` is
        // undefined there, so report it as NaN rather than violate its precondition.
        if fitter.count() >= 2 {
            fitter.fit()
        } else {
            f64::NAN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_ignores_duplicates() {
        let mut t = PrefixTree::new();
        t.add(0x0A000001, 1.0).unwrap();
        t.add(0x0A000001, 5.0).unwrap();
        assert_eq!(t.n(), 1);
    }

    #[test]
    fn add_after_prefixify_errors() {
        let mut t = PrefixTree::new();
        t.add(1, 1.0).unwrap();
        t.prefixify();
        assert!(matches!(t.add(2, 1.0), Err(PrefixTreeError::Prefixified)));
        assert!(matches!(t.incr(2), Err(PrefixTreeError::Prefixified)));
    }

    #[test]
    fn prefixify_twice_is_noop() {
        let mut t = PrefixTree::new();
        t.add(0, 1.0).unwrap();
        t.add(0x8000_0000, 1.0).unwrap();
        t.prefixify();
        let snapshot: Vec<_> = t.levels[1].iter().map(|(&k, &v)| (k, v)).collect();
        t.prefixify();
        let snapshot2: Vec<_> = t.levels[1].iter().map(|(&k, &v)| (k, v)).collect();
        assert_eq!(snapshot.len(), snapshot2.len());
    }

    #[test]
    fn balance_scenario_from_spec() {
        // insert {0x00000000, 0x80000000}
        let mut t = PrefixTree::new();
        t.add(0x0000_0000, 1.0).unwrap();
        t.add(0x8000_0000, 1.0).unwrap();
        t.prefixify();
        assert_eq!(t.levels[0][&0], 2.0);
        assert_eq!(t.levels[1][&0x0000_0000], 1.0);
        assert_eq!(t.levels[1][&0x8000_0000], 1.0);
    }

    #[test]
    fn boundary_clamp_scenario() {
        // all four addresses of a /24 fall on the left child of some /25 ancestor,
        // so the right child at that level has weight 0.
        let mut t = PrefixTree::new();
        for host in 0..4u32 {
            t.add(0x0A00_0000 | host, 1.0).unwrap();
        }
        let sigma = t.fit_logit_normal();
        assert!(sigma.is_finite() || sigma.is_nan());
    }

    #[test]
    fn singularity_on_shallow_divergence_is_nan_not_panic() {
        // diverge at bit 0: each address's ancestor count drops to 1 after a single
        // point, which must degrade to NaN rather than violate fit()'s precondition.
        let mut t = PrefixTree::new();
        t.add(0x0000_0000, 1.0).unwrap();
        t.add(0x8000_0000, 1.0).unwrap();
        let alpha = t.singularity(0x0000_0000);
        assert!(alpha.is_nan());
    }

    #[test]
    fn n_counts_distinct_entries_only() {
        let mut t = PrefixTree::new();
        t.incr(1).unwrap();
        t.incr(1).unwrap();
        t.incr(2).unwrap();
        assert_eq!(t.n(), 2);
        assert_eq!(t.levels[32][&1], 2.0);
    }
}
