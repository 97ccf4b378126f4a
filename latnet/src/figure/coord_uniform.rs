//! The coordinate-uniform figure of merit: a kernel whose tensor products
//! express the weighted figure as per-coordinate vector updates.

use crate::kernel::Kernel;
use crate::storage::Compress;
use crate::types::Real;
use crate::weights::Weights;

/// Binds a kernel to projection weights. The CBC engines consume this to
/// run the O(n) per-candidate (or O(n log n) all-candidates) update rule
/// instead of enumerating projections.
#[derive(Clone, Debug)]
pub struct CoordUniformFigureOfMerit<K: Kernel> {
    kernel: K,
    weights: Weights,
    weights_power: Real,
}

impl<K: Kernel> CoordUniformFigureOfMerit<K> {
    pub fn new(kernel: K, weights: Weights, weights_power: Real) -> Self {
        CoordUniformFigureOfMerit {
            kernel,
            weights,
            weights_power,
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn weights_power(&self) -> Real {
        self.weights_power
    }

    pub fn suggested_compression(&self) -> Compress {
        self.kernel.suggested_compression()
    }

    pub fn name(&self) -> String {
        format!("CU:{}", self.kernel.name())
    }
}
