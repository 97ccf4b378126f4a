//! The R_alpha kernel: a truncated Fourier series with `|h|^-alpha` decay.

use anyhow::{ensure, Result};

use crate::kernel::Kernel;
use crate::types::{Integer, Real};

/// `omega(i/n, n) = sum over 0 < |h| <= n/2 of |h|^-alpha e^(2 pi i h x)`,
/// the per-coordinate factor of the R_alpha criterion. The frequency window
/// depends on `n`, so unlike P_alpha this kernel is not a fixed function of
/// `x` alone.
#[derive(Clone, Debug)]
pub struct RAlpha {
    alpha: Real,
}

impl RAlpha {
    pub fn new(alpha: Real) -> Result<Self> {
        ensure!(alpha >= 0.0, "R_alpha requires alpha >= 0, got {alpha}");
        Ok(RAlpha { alpha })
    }

    pub fn alpha(&self) -> Real {
        self.alpha
    }
}

impl Kernel for RAlpha {
    fn eval(&self, x: Real, n: Integer) -> Real {
        assert!(n >= 1, "R_alpha needs the number of points");
        let two_pi_x = 2.0 * core::f64::consts::PI * x;
        let half = (n - 1) / 2;
        let mut sum = 0.0;
        for h in 1..=half {
            sum += 2.0 * (two_pi_x * h as Real).cos() / (h as Real).powf(self.alpha);
        }
        if n % 2 == 0 {
            let h = n / 2;
            sum += (two_pi_x * h as Real).cos() / (h as Real).powf(self.alpha);
        }
        sum
    }

    fn symmetric(&self) -> bool {
        true
    }

    fn name(&self) -> String {
        format!("R{}", self.alpha)
    }
}
