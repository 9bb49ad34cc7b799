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
//! Rank-preserving bijection from observed addresses to synthetic addresses, built from
//! two `(address, alpha)` lists sorted by singularity exponent.

use std::collections::HashMap;

/// Read-only mapping from an observed /32 address to its synthetic image, built once
/// from an observed `PrefixTree`'s singularities and a `CascadeGenerator`'s output.
#[derive(Debug, Clone)]
pub struct AddrMap {
    map: HashMap<u32, u32>,
}

impl AddrMap {
    /// Builds the map from the observed list `f` and the synthetic list `t`, each a list
    /// of `(address, alpha)` pairs. Both are sorted by alpha ascending before pairing.
    pub fn build(observed: &[(u32, f64)], synthetic: &[(u32, f64)]) -> Self {
        let mut f: Vec<(u32, f64)> = observed.to_vec();
        let mut t: Vec<(u32, f64)> = synthetic.to_vec();
        Self::build_sorted(&mut f, &mut t)
    }

    fn build_sorted(f: &mut [(u32, f64)], t: &mut [(u32, f64)]) -> Self {
        f.sort_by(|a, b| a.1.total_cmp(&b.1));
        t.sort_by(|a, b| a.1.total_cmp(&b.1));

        let nf = f.len();
        let nt = t.len();
        let mut map = HashMap::with_capacity(nf);

        if nf == 0 || nt == 0 {
            return AddrMap { map };
        }

        if nf == nt {
            for i in 0..nf {
                map.insert(f[i].0, t[i].0);
            }
        } else if nf < nt {
            for (i, item) in f.iter().enumerate() {
                let j = (i * nt) / nf;
                map.insert(item.0, t[j].0);
            }
        } else {
            // nf > nt: partition F into nt contiguous, alpha-sorted blocks, one per
            // synthetic address. Block sizes are floor(nf/nt) or ceil(nf/nt), and the
            // partition is monotone in alpha since F is sorted and blocks are contiguous.
            for (j, target) in t.iter().enumerate() {
                let start = (j * nf) / nt;
                let end = ((j + 1) * nf) / nt;
                for obs in &f[start..end] {
                    map.insert(obs.0, target.0);
                }
            }
        }

        AddrMap { map }
    }

    /// Looks up the synthetic image of an observed address, if any.
    pub fn get(&self, addr: u32) -> Option<u32> {
        self.map.get(&addr).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_sizes_map_in_rank_order() {
        let observed = vec![(10, 0.5), (20, 0.1), (30, 0.9)];
        let synthetic = vec![(100, 0.2), (200, 1.0), (300, 0.05)];
        let m = AddrMap::build(&observed, &synthetic);
        // sorted by alpha: observed -> [20(0.1),10(0.5),30(0.9)]
        // synthetic -> [300(0.05),100(0.2),200(1.0)]
        assert_eq!(m.get(20), Some(300));
        assert_eq!(m.get(10), Some(100));
        assert_eq!(m.get(30), Some(200));
    }

    #[test]
    fn fewer_observed_leaves_surplus_synthetic_unmapped() {
        let observed = vec![(1, 0.0), (2, 1.0)];
        let synthetic = vec![(10, 0.0), (11, 0.3), (12, 0.6), (13, 1.0)];
        let m = AddrMap::build(&observed, &synthetic);
        assert_eq!(m.len(), 2);
        assert!(m.get(1).is_some());
        assert!(m.get(2).is_some());
    }

    #[test]
    fn more_observed_than_synthetic_covers_all_observed() {
        let observed: Vec<(u32, f64)> = (0..10).map(|i| (i, i as f64)).collect();
        let synthetic: Vec<(u32, f64)> = (100..103).map(|i| (i, (i - 100) as f64)).collect();
        let m = AddrMap::build(&observed, &synthetic);
        assert_eq!(m.len(), 10);
        for i in 0..10 {
            assert!(m.get(i).is_some());
        }
    }

    #[test]
    fn alpha_rank_is_preserved() {
        let observed = vec![(1, 0.0), (2, 0.5), (3, 1.0), (4, 1.5)];
        let synthetic = vec![(10, 0.0), (20, 1.0)];
        let m = AddrMap::build(&observed, &synthetic);
        // monotone: low-alpha observed addresses should map to low-alpha synthetic ones
        let img1 = m.get(1).unwrap();
        let img4 = m.get(4).unwrap();
        assert!(img1 <= img4);
    }
}
