//! One-dimensional kernels whose tensor products define coordinate-uniform
//! figures of merit.

pub mod interlaced;
pub mod palpha;
pub mod plr;
pub mod ralpha;

pub use interlaced::{InterlacedA, InterlacedB, InterlacedC};
pub use palpha::PAlpha;
pub use plr::PAlphaPlr;
pub use ralpha::RAlpha;

use anyhow::{ensure, Result};

use crate::storage::{Compress, Storage};
use crate::types::{Integer, LatticeRules, Real};

/// A one-dimensional kernel `omega(x, n)` evaluated on the canonical grid.
pub trait Kernel {
    fn eval(&self, x: Real, n: Integer) -> Real;

    /// Whether `omega(x) == omega(1 - x)`; symmetric compression is only
    /// sound for symmetric kernels.
    fn symmetric(&self) -> bool;

    /// The compression this kernel benefits from.
    fn suggested_compression(&self) -> Compress {
        if self.symmetric() {
            Compress::Symmetric
        } else {
            Compress::None
        }
    }

    fn name(&self) -> String;
}

/// The vector of kernel values over a storage: slot `unpermute(i)` holds
/// `omega(to_kernel_index(i) / n)` for every natural index `i`.
pub fn values_vector<L: LatticeRules, K: Kernel + ?Sized>(
    kernel: &K,
    storage: &Storage<L>,
) -> Result<Vec<Real>> {
    ensure!(
        !storage.symmetric() || kernel.symmetric(),
        "symmetric compression requested for the non-symmetric kernel {}",
        kernel.name()
    );
    let n = storage.virtual_size() as Integer;
    let modulus = storage.size_param().modulus();
    Ok((0..storage.size())
        .map(|slot| {
            let i = storage.natural_index(slot);
            let x = L::to_kernel_index(i, &modulus) as Real / n as Real;
            kernel.eval(x, n)
        })
        .collect())
}
