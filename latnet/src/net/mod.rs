//! Digital nets in base 2 and their equidistribution (t-value) machinery.

pub mod composition;
pub mod gauss;
pub mod scheduler;
pub mod schmid;
pub mod search;
pub mod sobol;
pub mod tvalue;

pub use composition::CompositionMaker;
pub use gauss::GaussReducer;
pub use scheduler::TValueScheduler;
pub use schmid::tvalue_schmid;
pub use search::{EvalNet, RandomNetSearch};
pub use sobol::{nth_primitive_polynomial, SobolNet};
pub use tvalue::tvalue_gauss;

use latnet_gf2::BitMatrix;
use rand::Rng;

use crate::types::Integer;

/// A point set whose coordinates are produced by GF(2)-linear maps of the
/// binary digits of the point index.
pub trait DigitalNet {
    fn dimension(&self) -> usize;

    /// Number of rows and columns of every generating matrix.
    fn num_columns(&self) -> usize;

    fn num_points(&self) -> Integer {
        1 << self.num_columns()
    }

    /// The generating matrix of coordinate `coord` (0-based).
    fn generating_matrix(&self, coord: usize) -> BitMatrix;

    fn generating_matrices(&self) -> Vec<BitMatrix> {
        (0..self.dimension())
            .map(|c| self.generating_matrix(c))
            .collect()
    }
}

/// A net given by explicit generating matrices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplicitNet {
    m: usize,
    matrices: Vec<BitMatrix>,
}

impl ExplicitNet {
    pub fn new(matrices: Vec<BitMatrix>) -> Self {
        let m = matrices.first().map_or(0, BitMatrix::n_cols);
        assert!(
            matrices.iter().all(|g| g.n_cols() == m && g.n_rows() == m),
            "all generating matrices must share the same square shape"
        );
        ExplicitNet { m, matrices }
    }

    /// A random candidate: upper-triangular matrices with unit diagonals,
    /// so every coordinate projection is one-dimensionally equidistributed.
    pub fn random(rng: &mut impl Rng, dimension: usize, m: usize) -> Self {
        let matrices = (0..dimension)
            .map(|_| {
                let mut g = BitMatrix::new(m, m);
                for i in 0..m {
                    g.set(i, i, true);
                    for j in i + 1..m {
                        g.set(i, j, rng.gen());
                    }
                }
                g
            })
            .collect();
        ExplicitNet { m, matrices }
    }
}

impl DigitalNet for ExplicitNet {
    fn dimension(&self) -> usize {
        self.matrices.len()
    }

    fn num_columns(&self) -> usize {
        self.m
    }

    fn generating_matrix(&self, coord: usize) -> BitMatrix {
        self.matrices[coord].clone()
    }
}
