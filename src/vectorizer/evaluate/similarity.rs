use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::math::vector::SparseVec;

/// Dense all-pairs cosine similarity of L2-normalized rows.
/// Row-major `n * n`; entry (i, j) == (j, i).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Dot product of every row with every row.
    /// Rows must already be unit length (or zero).
    pub fn compute(rows: &[SparseVec<f64>]) -> Self {
        let n = rows.len();
        let mut values = vec![0.0; n * n];
        if n > 0 {
            values.par_chunks_mut(n).enumerate().for_each(|(i, out)| {
                let row = &rows[i];
                for (j, cell) in out.iter_mut().enumerate() {
                    *cell = row.dot(&rows[j]);
                }
            });
        }
        Self { n, values }
    }

    /// number of rows (== columns)
    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarities of row `i` to all rows, `None` past the last row
    #[inline]
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i >= self.n {
            return None;
        }
        self.values.get(i * self.n..(i + 1) * self.n)
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.n || j >= self.n {
            return None;
        }
        self.values.get(i * self.n + j).copied()
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.values.len() == self.n * self.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, inds: Vec<u32>, vals: Vec<f64>) -> SparseVec<f64> {
        let mut v = SparseVec::from_unsorted(dim, inds, vals);
        v.normalize();
        v
    }

    #[test]
    fn symmetric_with_unit_diagonal() {
        let rows = vec![
            unit(4, vec![0, 1], vec![1.0, 2.0]),
            unit(4, vec![1, 2], vec![3.0, 1.0]),
            unit(4, vec![3], vec![1.0]),
        ];
        let sim = SimilarityMatrix::compute(&rows);
        assert_eq!(sim.len(), 3);
        for i in 0..3 {
            assert!((sim.get(i, i).unwrap() - 1.0).abs() < 1e-12);
            for j in 0..3 {
                assert_eq!(sim.get(i, j), sim.get(j, i));
            }
        }
        assert_eq!(sim.get(0, 2), Some(0.0));
        assert!(sim.get(0, 1).unwrap() > 0.0);
        assert_eq!(sim.row(1).unwrap().len(), 3);
    }

    #[test]
    fn zero_row_has_zero_diagonal() {
        let rows = vec![unit(2, vec![0], vec![1.0]), SparseVec::new(2)];
        let sim = SimilarityMatrix::compute(&rows);
        assert_eq!(sim.get(1, 1), Some(0.0));
        assert_eq!(sim.get(0, 1), Some(0.0));
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let rows = vec![unit(2, vec![0], vec![1.0]), unit(2, vec![1], vec![1.0])];
        let sim = SimilarityMatrix::compute(&rows);
        assert_eq!(sim.row(2), None);
        assert_eq!(sim.get(2, 0), None);
        // (0, 2) would land inside the buffer at (1, 0)
        assert_eq!(sim.get(0, 2), None);
        assert_eq!(sim.row(1), Some(&[0.0, 1.0][..]));
        assert_eq!(SimilarityMatrix::compute(&[]).row(0), None);
    }

    #[test]
    fn empty_input() {
        let sim = SimilarityMatrix::compute(&[]);
        assert!(sim.is_empty());
        assert!(sim.is_well_formed());
    }
}
