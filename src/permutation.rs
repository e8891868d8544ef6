//! Dense permutations of `0..n`.
//!
//! [`MulticyclePermutation`](crate::multicycle::MulticyclePermutation) works on
//! sparse symbol sets; products are computed here instead, on the dense range
//! covering every factor, and split back into orbits with
//! [`Permutation::find_cycles`].

use bitvec::vec::BitVec;

/// `map[i]` is the image of `i`; `inv` is kept alongside for `O(1)` preimages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permutation {
    map: Vec<usize>,
    inv: Vec<usize>,
}

impl Permutation {
    pub fn id(n: usize) -> Self {
        Permutation {
            map: (0..n).collect(),
            inv: (0..n).collect(),
        }
    }

    /// # Panics
    ///
    /// Panics if `map` is not a bijection of `0..map.len()`.
    ///
    /// ```
    /// # use tdp::permutation::Permutation;
    /// let p = Permutation::from_map(vec![2, 0, 1]);
    /// assert_eq!(p.inv(), &[1, 2, 0]);
    /// ```
    pub fn from_map(map: Vec<usize>) -> Self {
        let mut inv = vec![usize::MAX; map.len()];
        for (i, &j) in map.iter().enumerate() {
            assert!(inv[j] == usize::MAX, "{j} has two preimages");
            inv[j] = i;
        }
        Permutation { map, inv }
    }

    /// Right-to-left product of possibly overlapping cycles on `0..n`: the
    /// last cycle acts first.
    ///
    /// ```
    /// # use tdp::permutation::Permutation;
    /// // (0 1 2)(1 2): 0 -> 1, 1 -> 2 -> 0, 2 -> 1 -> 2
    /// let p = Permutation::from_cycles(&[vec![0, 1, 2], vec![1, 2]], 3);
    /// assert_eq!(p.map(), &[1, 0, 2]);
    /// ```
    pub fn from_cycles<C: AsRef<[usize]>>(cycles: &[C], n: usize) -> Self {
        cycles.iter().rev().fold(Permutation::id(n), |acc, cycle| {
            let cycle = cycle.as_ref();
            let mut map: Vec<usize> = (0..n).collect();
            for (i, &s) in cycle.iter().enumerate() {
                map[s] = cycle[(i + 1) % cycle.len()];
            }
            Permutation::from_map(map).compose(&acc)
        })
    }

    pub fn map(&self) -> &[usize] {
        &self.map
    }

    pub fn inv(&self) -> &[usize] {
        &self.inv
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn inverse(&self) -> Self {
        Permutation {
            map: self.inv.clone(),
            inv: self.map.clone(),
        }
    }

    /// `self ∘ other`: `other` acts first.
    pub fn compose(&self, other: &Self) -> Self {
        Self::from_map(other.map.iter().map(|&i| self.map[i]).collect())
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(i, &m)| i == m)
    }

    /// Orbits, fixed points included, each starting at its smallest element
    /// and sorted by it.
    ///
    /// ```
    /// # use tdp::permutation::Permutation;
    /// let p = Permutation::from_map(vec![2, 0, 1, 3]);
    /// assert_eq!(p.find_cycles(), vec![vec![0, 2, 1], vec![3]]);
    /// ```
    pub fn find_cycles(&self) -> Vec<Vec<usize>> {
        let mut visited: BitVec = BitVec::repeat(false, self.map.len());
        let mut orbits = Vec::new();
        for start in 0..self.map.len() {
            if visited[start] {
                continue;
            }
            let mut orbit = Vec::new();
            let mut s = start;
            while !visited.replace(s, true) {
                orbit.push(s);
                s = self.map[s];
            }
            orbits.push(orbit);
        }
        orbits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn products_keep_untouched_points() {
        let p = Permutation::from_cycles(&[vec![0, 2]], 4);
        assert_eq!(p.find_cycles(), vec![vec![0, 2], vec![1], vec![3]]);
        assert!(Permutation::from_cycles::<Vec<usize>>(&[], 3).is_identity());
    }

    #[test]
    fn a_move_and_its_inverse_cancel() {
        let rho = vec![1, 3, 5];
        let rho_inverse = vec![5, 3, 1];
        assert!(Permutation::from_cycles(&[rho, rho_inverse], 6).is_identity());
    }

    fn arb_permutation() -> impl Strategy<Value = Permutation> {
        (1usize..12)
            .prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
            .prop_map(Permutation::from_map)
    }

    proptest! {
        #[test]
        fn inverse_cancels(p in arb_permutation()) {
            prop_assert!(p.compose(&p.inverse()).is_identity());
            prop_assert!(p.inverse().compose(&p).is_identity());
        }

        #[test]
        fn orbits_rebuild_the_permutation(p in arb_permutation()) {
            let rebuilt = Permutation::from_cycles(&p.find_cycles(), p.len());
            prop_assert_eq!(rebuilt, p);
        }
    }
}
