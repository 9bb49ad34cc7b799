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
//! Symmetric logit-normal conservative cascade: synthesizes /32 addresses at a target
//! spread `sigma`, each tagged with the singularity exponent implied by its position in
//! the generated tree.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::slope_fitter::SlopeFitter;

#[cfg(test)]
use crate::prefix_tree::PrefixTree;

/// Samples `n` synthetic addresses from a symmetric logit-normal(`sigma`) conservative
/// cascade over the full 32-bit address tree.
pub struct CascadeGenerator;

impl CascadeGenerator {
    pub fn generate<R: Rng + ?Sized>(sigma: f64, n: usize, rng: &mut R) -> Vec<(u32, f64)> {
        let mut out = Vec::with_capacity(n);
        if n > 0 {
            recurse(0, 0, n, sigma, n, SlopeFitter::new(), rng, &mut out);
        }
        out
    }
}

#[allow(clippy::too_many_arguments)]
fn recurse<R: Rng + ?Sized>(
    base: u32,
    len: u32,
    k: usize,
    sigma: f64,
    total_n: usize,
    mut fitter: SlopeFitter,
    rng: &mut R,
    out: &mut Vec<(u32, f64)>,
) {
    if k == 0 {
        return;
    }
    if len == 32 {
        // a leaf can be reached having accumulated fewer than two distinct prefix
        // lengths (e.g. a single even split at the root, for small n); `fit()` is
        // undefined there, so fall back to NaN rather than violate its precondition.
        let alpha = if fitter.count() >= 2 { fitter.fit() } else { f64::NAN };
        out.push((base, alpha));
        return;
    }
    if k > 1 {
        fitter.add_point(len as f64, -((k as f64 / total_n as f64).log2()));
    }

    // sigma == 0 degenerates Normal::new; treat it as "always split evenly".
    let z = if sigma > 0.0 {
        Normal::new(0.0, sigma)
            .expect("sigma must be finite and non-negative")
            .sample(rng)
    } else {
        0.0
    };
    let w = 1.0 / (1.0 + (-z).exp());

    let mut left_k = (k as f64 * w).round() as i64;
    let mut right_k = (k as f64 * (1.0 - w)).round() as i64;
    // independent roundings of w and 1-w can drift the total by one packet; pin the
    // total back to k exactly before enforcing per-child capacity.
    let drift = k as i64 - (left_k + right_k);
    right_k += drift;

    // each child subtree can hold at most 2^(32 - len - 1) distinct /32 addresses
    let capacity = 1i64 << (31 - len);
    if left_k + right_k > 2 * capacity {
        unreachable!("cascade demand exceeds total address space capacity");
    }
    if left_k > capacity {
        let excess = left_k - capacity;
        left_k = capacity;
        right_k += excess;
        log::debug!("spilling {excess} addresses right at len={len} (left over capacity)");
    } else if right_k > capacity {
        let excess = right_k - capacity;
        right_k = capacity;
        left_k += excess;
        log::debug!("spilling {excess} addresses left at len={len} (right over capacity)");
    }

    let left_k = left_k.clamp(0, capacity) as usize;
    let right_k = right_k.clamp(0, capacity) as usize;

    let right_base = base | (1u32 << (31 - len));
    recurse(base, len + 1, left_k, sigma, total_n, fitter.clone(), rng, out);
    recurse(right_base, len + 1, right_k, sigma, total_n, fitter, rng, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn produces_exactly_n_distinct_addresses() {
        let mut rng = StdRng::seed_from_u64(42);
        let addrs = CascadeGenerator::generate(1.0, 500, &mut rng);
        assert_eq!(addrs.len(), 500);
        let distinct: std::collections::HashSet<u32> = addrs.iter().map(|(a, _)| *a).collect();
        assert_eq!(distinct.len(), 500);
    }

    #[test]
    fn zero_n_yields_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let addrs = CascadeGenerator::generate(1.0, 0, &mut rng);
        assert!(addrs.is_empty());
    }

    #[test]
    fn large_sigma_never_exceeds_capacity() {
        // a very large sigma pushes the logit split to near 0 or 1, stressing the
        // balance/spill step; it must still emit exactly n distinct leaves.
        let mut rng = StdRng::seed_from_u64(7);
        let addrs = CascadeGenerator::generate(50.0, 2000, &mut rng);
        assert_eq!(addrs.len(), 2000);
        let distinct: std::collections::HashSet<u32> = addrs.iter().map(|(a, _)| *a).collect();
        assert_eq!(distinct.len(), 2000);
    }

    #[test]
    fn small_n_does_not_panic_on_degenerate_fit() {
        // n=2 can reach a leaf after a single root-level split, leaving the fitter with
        // only one accumulated point; this must degrade to NaN rather than panic.
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let addrs = CascadeGenerator::generate(0.7, 2, &mut rng);
            assert_eq!(addrs.len(), 2);
        }
    }

    #[test]
    fn refitting_a_large_cascade_recovers_its_sigma() {
        let sigma = 0.9;
        let mut rng = StdRng::seed_from_u64(2024);
        let addrs = CascadeGenerator::generate(sigma, 10_000, &mut rng);

        let mut tree = PrefixTree::new();
        for (addr, _) in &addrs {
            tree.add(*addr, 1.0).unwrap();
        }
        let fitted = tree.fit_logit_normal();

        assert!((fitted - sigma).abs() < 0.1, "fitted sigma {fitted} too far from {sigma}");
    }

    #[test]
    fn deterministic_given_seed() {
        let mut rng1 = StdRng::seed_from_u64(123);
        let mut rng2 = StdRng::seed_from_u64(123);
        let a = CascadeGenerator::generate(0.8, 100, &mut rng1);
        let b = CascadeGenerator::generate(0.8, 100, &mut rng2);
        assert_eq!(a, b);
    }
}
