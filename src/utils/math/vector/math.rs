use std::{cmp::Ordering, iter::Sum};

use num::Float;

use super::SparseVec;

impl<N> SparseVec<N>
where
    N: Float + Sum,
{
    /// Dot product by a merge pass over both index lists.
    /// Products are summed in ascending index order, so `a.dot(b)` and
    /// `b.dot(a)` are bit-identical.
    ///
    /// # Arguments
    /// * `other` - vector of the same dimension
    #[inline]
    pub fn dot(&self, other: &Self) -> N {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "Vectors must be of the same length to compute dot product."
        );

        let mut result = N::zero();
        let (a_inds, a_vals) = (&self.inds, &self.vals);
        let (b_inds, b_vals) = (&other.inds, &other.vals);
        let mut i = 0;
        let mut j = 0;
        while i < a_inds.len() && j < b_inds.len() {
            match a_inds[i].cmp(&b_inds[j]) {
                Ordering::Equal => {
                    result = result + a_vals[i] * b_vals[j];
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        result
    }

    #[inline]
    pub fn norm_sq(&self) -> N {
        self.vals.iter().map(|&v| v * v).sum()
    }

    /// L2 norm
    #[inline]
    pub fn norm(&self) -> N {
        self.norm_sq().sqrt()
    }

    /// Scale to unit L2 length in place.
    /// The zero vector stays zero.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > N::zero() {
            for v in self.vals.iter_mut() {
                *v = *v / norm;
            }
        }
    }

    /// Cosine similarity, 0 when either side is the zero vector
    pub fn cosine(&self, other: &Self) -> N {
        let denom = self.norm() * other.norm();
        if denom > N::zero() {
            self.dot(other) / denom
        } else {
            N::zero()
        }
    }
}
