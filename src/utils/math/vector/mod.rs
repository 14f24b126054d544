pub mod math;
pub mod serde;

use std::fmt::Debug;

use num::Float;

use crate::utils::sort::radix_sort_u32_soa;

/// SparseVec stores only the non-zero entries of a fixed-dimension vector
/// as two parallel arrays: `inds` (column indices) and `vals`.
///
/// Indices are kept strictly ascending, which lets dot products run as a
/// single merge pass over both operands.
#[derive(Clone, PartialEq)]
pub struct SparseVec<N = f64>
where
    N: Float,
{
    dim: usize,
    inds: Vec<u32>,
    vals: Vec<N>,
}

impl<N> SparseVec<N>
where
    N: Float,
{
    /// Empty (all zero) vector of dimension `dim`
    #[inline]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            inds: Vec::new(),
            vals: Vec::new(),
        }
    }

    /// Build from entries in any order.
    /// Zero values are dropped; entries are sorted by index.
    ///
    /// # Arguments
    /// * `dim` - vector dimension
    /// * `inds` - column indices, each `< dim` and unique
    /// * `vals` - values paired with `inds`
    pub fn from_unsorted(dim: usize, mut inds: Vec<u32>, mut vals: Vec<N>) -> Self {
        debug_assert_eq!(inds.len(), vals.len());
        radix_sort_u32_soa(&mut inds, &mut vals);
        let mut vec = Self::new(dim);
        vec.inds.reserve(inds.len());
        vec.vals.reserve(vals.len());
        for (i, v) in inds.into_iter().zip(vals) {
            debug_assert!((i as usize) < dim);
            if !v.is_zero() {
                vec.inds.push(i);
                vec.vals.push(v);
            }
        }
        vec
    }

    /// dimension
    #[inline]
    pub fn len(&self) -> usize {
        self.dim
    }

    /// number of stored (non-zero) entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.inds.len()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.inds.is_empty()
    }

    /// value at `index`, zero if not stored
    pub fn get(&self, index: usize) -> N {
        match self.inds.binary_search(&(index as u32)) {
            Ok(pos) => self.vals[pos],
            Err(_) => N::zero(),
        }
    }

    /// (index, value) pairs in ascending index order
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (usize, N)> + '_ {
        self.inds
            .iter()
            .zip(self.vals.iter())
            .map(|(&i, &v)| (i as usize, v))
    }

    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.inds.shrink_to_fit();
        self.vals.shrink_to_fit();
    }

    /// indices strictly ascending and inside the dimension
    pub(crate) fn is_well_formed(&self) -> bool {
        self.inds.len() == self.vals.len()
            && self.inds.windows(2).all(|w| w[0] < w[1])
            && self.inds.last().map_or(true, |&i| (i as usize) < self.dim)
    }
}

impl<N> Debug for SparseVec<N>
where
    N: Float + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "SparseVec(dim: {}, nnz: {}) [", self.dim, self.nnz())?;
            for (i, v) in self.raw_iter() {
                writeln!(f, "    {}: {:?}", i, v)?;
            }
            write!(f, "]")
        } else {
            f.debug_map().entries(self.raw_iter()).finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_unsorted_sorts_and_drops_zeros() {
        let v = SparseVec::from_unsorted(10, vec![9, 2, 5], vec![1.0, 0.0, 3.0]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.raw_iter().collect::<Vec<_>>(), vec![(5, 3.0), (9, 1.0)]);
        assert_eq!(v.get(2), 0.0);
        assert_eq!(v.get(5), 3.0);
        assert!(v.is_well_formed());
    }

    #[test]
    fn empty_vector_is_zero() {
        let v: SparseVec<f64> = SparseVec::new(4);
        assert!(v.is_zero());
        assert_eq!(v.len(), 4);
        assert!(v.is_well_formed());
    }
}
