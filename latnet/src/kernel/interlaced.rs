//! Kernels for interlaced digital constructions in base 2.
//!
//! All three share the dyadic shape `c1 - c2 * 2^(k floor(log2 x))` with
//! constants depending on the interlacing factor `d` and, where applicable,
//! the smoothness `alpha`.

use anyhow::{ensure, Result};

use crate::kernel::Kernel;
use crate::types::{Integer, Real};

fn exp2(e: i64) -> Real {
    (2.0 as Real).powi(e as i32)
}

fn floor_log2(x: Real) -> i64 {
    x.log2().floor() as i64
}

/// Weight of the interlaced B criterion with interlacing factor `d >= 2`.
#[derive(Clone, Debug)]
pub struct InterlacedB {
    d: u32,
    factor: Real,
}

impl InterlacedB {
    pub fn new(d: u32) -> Result<Self> {
        ensure!(d >= 2, "interlaced B kernel requires an interlacing factor > 1");
        let factor = exp2(d as i64 - 1) / (exp2(d as i64 - 1) - 1.0);
        Ok(InterlacedB { d, factor })
    }

    pub fn interlacing_factor(&self) -> u32 {
        self.d
    }
}

impl Kernel for InterlacedB {
    fn eval(&self, x: Real, _n: Integer) -> Real {
        if x < Real::EPSILON {
            return self.factor;
        }
        let t = floor_log2(x);
        self.factor * (1.0 - (exp2(self.d as i64) - 1.0) * exp2((self.d as i64 - 1) * t))
    }

    fn symmetric(&self) -> bool {
        false
    }

    fn name(&self) -> String {
        format!("IB-d{}", self.d)
    }
}

/// Weight of the interlaced C_alpha criterion, `min(alpha, d) > 1`.
#[derive(Clone, Debug)]
pub struct InterlacedC {
    alpha: u32,
    d: u32,
    min: i64,
    denom: Real,
}

impl InterlacedC {
    pub fn new(alpha: u32, d: u32) -> Result<Self> {
        ensure!(d >= 2, "interlaced C kernel requires an interlacing factor > 1");
        ensure!(alpha >= 1, "interlaced C kernel requires alpha >= 1");
        let min = alpha.min(d) as i64;
        let denom = exp2(alpha as i64) * (exp2(min) - 1.0);
        Ok(InterlacedC {
            alpha,
            d,
            min,
            denom,
        })
    }

    pub fn alpha(&self) -> u32 {
        self.alpha
    }

    pub fn interlacing_factor(&self) -> u32 {
        self.d
    }
}

impl Kernel for InterlacedC {
    fn eval(&self, x: Real, _n: Integer) -> Real {
        if x < Real::EPSILON {
            return 1.0 / self.denom;
        }
        let t = floor_log2(x);
        (1.0 - (exp2(2 * self.min + 1) - 1.0) * exp2(2 * self.min * t)) / self.denom
    }

    fn symmetric(&self) -> bool {
        false
    }

    fn name(&self) -> String {
        format!("IC-a{}-d{}", self.alpha, self.d)
    }
}

/// Weight of the interlaced A criterion for interlaced digital nets.
#[derive(Clone, Debug)]
pub struct InterlacedA {
    alpha: u32,
    d: u32,
    min: i64,
    denom: Real,
}

impl InterlacedA {
    pub fn new(alpha: u32, d: u32) -> Result<Self> {
        ensure!(
            alpha.min(d) >= 2,
            "interlaced A kernel requires min(alpha, d) > 1"
        );
        let min = alpha.min(d) as i64;
        let denom = exp2(alpha as i64 + 2).sqrt() * (exp2(min - 1) - 1.0);
        Ok(InterlacedA {
            alpha,
            d,
            min,
            denom,
        })
    }

    pub fn alpha(&self) -> u32 {
        self.alpha
    }

    pub fn interlacing_factor(&self) -> u32 {
        self.d
    }
}

impl Kernel for InterlacedA {
    fn eval(&self, x: Real, _n: Integer) -> Real {
        if x < Real::EPSILON {
            return 1.0 / self.denom;
        }
        let t = floor_log2(x);
        (1.0 - (exp2(self.min) - 1.0) * exp2((self.min - 1) * t)) / self.denom
    }

    fn symmetric(&self) -> bool {
        false
    }

    fn name(&self) -> String {
        format!("A-IDN{}-d{}", self.alpha, self.d)
    }
}
