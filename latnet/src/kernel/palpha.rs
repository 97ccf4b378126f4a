//! The P_alpha kernel, built on Bernoulli polynomials.

use anyhow::{ensure, Result};

use crate::kernel::Kernel;
use crate::types::{Integer, Real};

/// Bernoulli polynomial of even degree up to 8, in Horner form.
pub fn bernoulli(degree: u32, x: Real) -> Real {
    match degree {
        0 => 1.0,
        1 => x - 0.5,
        2 => x * (x - 1.0) + 1.0 / 6.0,
        3 => ((2.0 * x - 3.0) * x + 1.0) * x * 0.5,
        4 => ((x - 2.0) * x + 1.0) * x * x - 1.0 / 30.0,
        5 => (((x - 2.5) * x + 5.0 / 3.0) * x * x - 1.0 / 6.0) * x,
        6 => (((x - 3.0) * x + 2.5) * x * x - 0.5) * x * x + 1.0 / 42.0,
        7 => ((((x - 3.5) * x + 3.5) * x * x - 7.0 / 6.0) * x * x + 1.0 / 6.0) * x,
        8 => {
            ((((x - 4.0) * x + 14.0 / 3.0) * x * x - 7.0 / 3.0) * x * x + 2.0 / 3.0) * x * x
                - 1.0 / 30.0
        }
        _ => panic!("Bernoulli polynomials are only implemented up to degree 8"),
    }
}

/// `omega(x) = -(-4 pi^2)^(alpha/2) / alpha! * B_alpha(x)` for even alpha:
/// the one-dimensional weight of the P_alpha discrepancy.
#[derive(Clone, Debug)]
pub struct PAlpha {
    alpha: u32,
    scaling: Real,
}

impl PAlpha {
    pub fn new(alpha: u32) -> Result<Self> {
        ensure!(
            matches!(alpha, 2 | 4 | 6 | 8),
            "P_alpha requires alpha in {{2, 4, 6, 8}}, got {alpha}"
        );
        let sign = if (alpha / 2) % 2 == 0 { 1.0 } else { -1.0 };
        let factorial: Real = (1..=alpha).map(|k| k as Real).product();
        let scaling = -sign * (2.0 * core::f64::consts::PI).powi(alpha as i32) / factorial;
        Ok(PAlpha { alpha, scaling })
    }

    pub fn alpha(&self) -> u32 {
        self.alpha
    }
}

impl Kernel for PAlpha {
    fn eval(&self, x: Real, _n: Integer) -> Real {
        self.scaling * bernoulli(self.alpha, x)
    }

    fn symmetric(&self) -> bool {
        true
    }

    fn name(&self) -> String {
        format!("P{}", self.alpha)
    }
}
