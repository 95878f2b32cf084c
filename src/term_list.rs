//! Rank-1 terms of a singular value decomposition.
//!
//! A matrix $A\in\mathbb{R}^{n\times d}$ is written as the ordered sum
//! $A = \sum_j \sigma_j u_j v_j^T$ with $\sigma_1\geq\sigma_2\geq\dots\geq 0$,
//! unit vectors $u_j\in\mathbb{R}^n$ and $v_j\in\mathbb{R}^d$. Each summand is
//! an [`SVDTerm`], the ordered collection is a [`TermList`].

use itertools::Itertools;
use ndarray::{Array1, Array2, Axis, LinalgScalar};
use std::fmt;

#[derive(Clone, Debug)]
pub struct SVDTerm<A> {
    /// The singular value
    pub singular_value: A,
    /// Left singular vector of length n
    pub left_vector: Array1<A>,
    /// Right singular vector of length d
    pub right_vector: Array1<A>,
}

impl<A: LinalgScalar> SVDTerm<A> {
    pub fn new(singular_value: A, left_vector: Array1<A>, right_vector: Array1<A>) -> Self {
        SVDTerm {
            singular_value,
            left_vector,
            right_vector,
        }
    }

    /// Return the n x d matrix $\sigma u v^T$ associated with this term.
    pub fn expanded(&self) -> Array2<A> {
        let sigma = self.singular_value;
        let u = self.left_vector.mapv(|item| item * sigma).insert_axis(Axis(1));
        let vt = self.right_vector.view().insert_axis(Axis(0));
        u.dot(&vt)
    }
}

impl<A: fmt::Display> fmt::Display for SVDTerm<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} · [{}] · [{}]ᵀ",
            self.singular_value,
            self.left_vector.iter().map(|item| format!("{:.2}", item)).join(", "),
            self.right_vector.iter().map(|item| format!("{:.2}", item)).join(", ")
        )
    }
}

/// The ordered terms of the decomposition of one matrix.
///
/// Terms are sorted by descending singular value. The shape of the source
/// matrix is kept so that a reconstruction from zero terms is still well defined.
#[derive(Clone, Debug)]
pub struct TermList<A> {
    terms: Vec<SVDTerm<A>>,
    shape: (usize, usize),
    tolerance: f64,
}

impl<A> TermList<A> {
    pub(crate) fn from_sorted(terms: Vec<SVDTerm<A>>, shape: (usize, usize), tolerance: f64) -> Self {
        TermList {
            terms,
            shape,
            tolerance,
        }
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Shape (n, d) of the decomposed matrix.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// Singular values below this tolerance were excluded.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn terms(&self) -> &[SVDTerm<A>] {
        &self.terms
    }

    pub fn get(&self, index: usize) -> Option<&SVDTerm<A>> {
        self.terms.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SVDTerm<A>> {
        self.terms.iter()
    }
}

impl<A: Copy> TermList<A> {
    /// Return the singular values in descending order.
    pub fn singular_values(&self) -> Array1<A> {
        self.terms.iter().map(|term| term.singular_value).collect()
    }
}

impl<'a, A> IntoIterator for &'a TermList<A> {
    type Item = &'a SVDTerm<A>;
    type IntoIter = std::slice::Iter<'a, SVDTerm<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_expanded_is_scaled_outer_product() {
        let term = SVDTerm::new(2.0, array![1.0, 0.0, 0.0], array![0.0, 1.0]);

        let expected = array![[0.0, 2.0], [0.0, 0.0], [0.0, 0.0]];
        assert_eq!(term.expanded(), expected);
    }

    #[test]
    fn test_display_rounds_to_two_decimals() {
        let term = SVDTerm::new(5.4772, array![0.1826, 0.3651], array![1.0]);

        assert_eq!(format!("{}", term), "5.48 · [0.18, 0.37] · [1.00]ᵀ");
    }

    #[test]
    fn test_empty_term_list_keeps_shape() {
        let terms: TermList<f64> = TermList::from_sorted(Vec::new(), (4, 3), 1E-6);

        assert!(terms.is_empty());
        assert_eq!(terms.shape(), (4, 3));
        assert_eq!(terms.singular_values().len(), 0);
    }
}
