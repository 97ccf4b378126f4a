//! The P_alpha kernel for polynomial lattice rules (Walsh series, base 2).

use anyhow::{ensure, Result};

use crate::kernel::Kernel;
use crate::storage::Compress;
use crate::types::{Integer, Real};

/// Closed form of `sum_{k>=1} 2^(-alpha (floor(log2 k) + 1)) wal_k(x)`:
/// the dyadic analogue of the P_alpha weight. With `beta = 2^(1-alpha)` and
/// `t = floor(log2 x)`,
///
/// ```text
/// omega(0) = beta / (2 (1 - beta))
/// omega(x) = beta / (1 - beta) * (1/2 - beta^(-t-1) (1 - beta/2))
/// ```
#[derive(Clone, Debug)]
pub struct PAlphaPlr {
    alpha: u32,
    beta: Real,
}

impl PAlphaPlr {
    pub fn new(alpha: u32) -> Result<Self> {
        ensure!(alpha >= 2, "P_alpha for polynomial lattices requires alpha >= 2");
        Ok(PAlphaPlr {
            alpha,
            beta: (2.0 as Real).powi(1 - alpha as i32),
        })
    }

    pub fn alpha(&self) -> u32 {
        self.alpha
    }
}

impl Kernel for PAlphaPlr {
    fn eval(&self, x: Real, _n: Integer) -> Real {
        let beta = self.beta;
        if x < Real::EPSILON {
            return beta / (2.0 * (1.0 - beta));
        }
        let t = x.log2().floor();
        beta / (1.0 - beta) * (0.5 - beta.powf(-t - 1.0) * (1.0 - beta / 2.0))
    }

    fn symmetric(&self) -> bool {
        false
    }

    fn suggested_compression(&self) -> Compress {
        Compress::None
    }

    fn name(&self) -> String {
        format!("P{}-PLR", self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_at_zero() {
        // alpha = 2: beta = 1/2, omega(0) = 1/2.
        let k = PAlphaPlr::new(2).unwrap();
        assert!((k.eval(0.0, 0) - 0.5).abs() < 1e-15);
        assert!((k.eval(0.5, 0) + 0.25).abs() < 1e-15);
    }

    #[test]
    fn grid_mean_matches_walsh_tail() {
        // Summing wal_k over the dyadic grid of size n keeps only the
        // frequencies divisible by n, whence mean = omega(0) / n^alpha.
        for alpha in [2u32, 3, 4] {
            let k = PAlphaPlr::new(alpha).unwrap();
            for m in 1..6u32 {
                let n = 1u64 << m;
                let mean: Real = (0..n)
                    .map(|i| k.eval(i as Real / n as Real, n))
                    .sum::<Real>()
                    / n as Real;
                let expected = k.eval(0.0, n) / (n as Real).powi(alpha as i32);
                assert!(
                    (mean - expected).abs() < 1e-12,
                    "alpha={alpha} n={n}: {mean} vs {expected}"
                );
            }
        }
    }

    #[test]
    fn piecewise_constant_on_dyadic_blocks() {
        let k = PAlphaPlr::new(2).unwrap();
        assert_eq!(k.eval(0.5, 0), k.eval(0.75, 0));
        assert_eq!(k.eval(0.25, 0), k.eval(0.375, 0));
        assert_ne!(k.eval(0.25, 0), k.eval(0.5, 0));
    }
}
