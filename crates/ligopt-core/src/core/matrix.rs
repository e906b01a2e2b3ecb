/// Read/write access to a symmetric matrix, independent of how it is stored.
pub trait SymmetricMatrix {
    fn dim(&self) -> usize;

    /// Element `(i, j)`; argument order does not matter.
    fn get(&self, i: usize, j: usize) -> f64;

    /// Mutable element in the upper triangle. Callers must pass `i <= j`.
    fn upper_mut(&mut self, i: usize, j: usize) -> &mut f64;
}

/// Packed upper-triangular storage of a symmetric `dim x dim` matrix.
///
/// Column `j` holds rows `0..=j` contiguously, so `(i, j)` with `i <= j` lives at `i + j(j+1)/2`.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangularMatrix {
    data: Vec<f64>,
    dim: usize,
}

impl TriangularMatrix {
    pub fn new(dim: usize, fill: f64) -> Self {
        Self {
            data: vec![fill; dim * (dim + 1) / 2],
            dim,
        }
    }

    pub fn identity(dim: usize) -> Self {
        let mut m = Self::new(dim, 0.0);
        m.set_diagonal(1.0);
        m
    }

    pub fn set_diagonal(&mut self, value: f64) {
        for i in 0..self.dim {
            let idx = self.index(i, i);
            self.data[idx] = value;
        }
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        assert!(j < self.dim, "column {j} out of bounds for dimension {}", self.dim);
        assert!(i <= j, "index ({i}, {j}) is below the diagonal");
        i + j * (j + 1) / 2
    }

    #[inline]
    pub fn index_permissive(&self, i: usize, j: usize) -> usize {
        if i < j { self.index(i, j) } else { self.index(j, i) }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl SymmetricMatrix for TriangularMatrix {
    fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.index_permissive(i, j)]
    }

    #[inline]
    fn upper_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        let idx = self.index(i, j);
        &mut self.data[idx]
    }
}
