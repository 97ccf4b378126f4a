//! Merit filters: normalization, low-pass rejection, and the per-level
//! combiner for embedded lattices.

use std::cell::RefCell;

use log::debug;

use crate::lat_def::LatDef;
use crate::types::{LatticeRules, Level, MeritValue, Real};
use crate::weights::ProductWeights;

/// Vote of a filter rejecting a candidate. Handled locally by the filter
/// pipeline, never surfaced to callers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LatticeRejected;

pub trait MeritFilter<L: LatticeRules> {
    fn apply(&self, merit: Real, lat: &LatDef<L>) -> Result<Real, LatticeRejected>;
    fn name(&self) -> String;
}

pub trait MultilevelFilter<L: LatticeRules> {
    fn apply(&self, merit: Vec<Real>, lat: &LatDef<L>) -> Result<Vec<Real>, LatticeRejected>;
    fn name(&self) -> String;
}

/// Reduces per-level merits to a single value.
#[derive(Clone, Debug, PartialEq)]
pub enum Combiner {
    Sum,
    Max,
    /// Keep one level only.
    SelectLevel(Level),
}

impl Combiner {
    pub fn combine(&self, merit: &[Real]) -> Real {
        match self {
            Combiner::Sum => merit.iter().sum(),
            Combiner::Max => merit.iter().copied().fold(Real::NEG_INFINITY, Real::max),
            Combiner::SelectLevel(k) => merit[*k],
        }
    }

    pub fn name(&self) -> String {
        match self {
            Combiner::Sum => "sum".into(),
            Combiner::Max => "max".into(),
            Combiner::SelectLevel(k) => format!("level:{k}"),
        }
    }
}

/// The compound filter pipeline: multilevel filters, then the combiner,
/// then scalar filters. A rejection anywhere yields positive infinity so
/// the candidate can never win.
pub struct MeritFilterList<L: LatticeRules> {
    multilevel: Vec<Box<dyn MultilevelFilter<L>>>,
    combiner: Combiner,
    unilevel: Vec<Box<dyn MeritFilter<L>>>,
    on_reject: RefCell<Vec<Box<dyn FnMut(&LatDef<L>)>>>,
}

impl<L: LatticeRules> MeritFilterList<L> {
    pub fn new() -> Self {
        MeritFilterList {
            multilevel: Vec::new(),
            combiner: Combiner::Sum,
            unilevel: Vec::new(),
            on_reject: RefCell::new(Vec::new()),
        }
    }

    pub fn with_combiner(combiner: Combiner) -> Self {
        let mut list = Self::new();
        list.combiner = combiner;
        list
    }

    pub fn add(&mut self, filter: Box<dyn MeritFilter<L>>) {
        self.unilevel.push(filter);
    }

    pub fn add_multilevel(&mut self, filter: Box<dyn MultilevelFilter<L>>) {
        self.multilevel.push(filter);
    }

    pub fn combiner(&self) -> &Combiner {
        &self.combiner
    }

    pub fn on_reject(&self, slot: impl FnMut(&LatDef<L>) + 'static) {
        self.on_reject.borrow_mut().push(Box::new(slot));
    }

    pub fn apply(&self, merit: MeritValue, lat: &LatDef<L>) -> Real {
        match self.try_apply(merit, lat) {
            Ok(value) => value,
            Err(LatticeRejected) => {
                debug!("lattice {lat} rejected by a filter");
                for slot in self.on_reject.borrow_mut().iter_mut() {
                    slot(lat);
                }
                Real::INFINITY
            }
        }
    }

    fn try_apply(&self, merit: MeritValue, lat: &LatDef<L>) -> Result<Real, LatticeRejected> {
        let mut scalar = match merit {
            MeritValue::Scalar(x) => x,
            MeritValue::PerLevel(mut v) => {
                for filter in &self.multilevel {
                    v = filter.apply(v, lat)?;
                }
                self.combiner.combine(&v)
            }
        };
        for filter in &self.unilevel {
            scalar = filter.apply(scalar, lat)?;
        }
        Ok(scalar)
    }
}

impl<L: LatticeRules> Default for MeritFilterList<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects candidates whose merit exceeds a threshold.
#[derive(Clone, Debug)]
pub struct LowPass {
    threshold: Real,
}

impl LowPass {
    pub fn new(threshold: Real) -> Self {
        LowPass { threshold }
    }
}

impl<L: LatticeRules> MeritFilter<L> for LowPass {
    fn apply(&self, merit: Real, _lat: &LatDef<L>) -> Result<Real, LatticeRejected> {
        if merit > self.threshold {
            Err(LatticeRejected)
        } else {
            Ok(merit)
        }
    }

    fn name(&self) -> String {
        format!("low-pass:{}", self.threshold)
    }
}

/// Per-level low-pass: any level over the threshold rejects.
#[derive(Clone, Debug)]
pub struct MultilevelLowPass {
    threshold: Real,
}

impl MultilevelLowPass {
    pub fn new(threshold: Real) -> Self {
        MultilevelLowPass { threshold }
    }
}

impl<L: LatticeRules> MultilevelFilter<L> for MultilevelLowPass {
    fn apply(&self, merit: Vec<Real>, _lat: &LatDef<L>) -> Result<Vec<Real>, LatticeRejected> {
        if merit.iter().any(|&x| x > self.threshold) {
            Err(LatticeRejected)
        } else {
            Ok(merit)
        }
    }

    fn name(&self) -> String {
        format!("low-pass:{}", self.threshold)
    }
}

/// Riemann zeta at the even integers used by the P_alpha bounds.
pub fn zeta_even(alpha: u32) -> Real {
    use core::f64::consts::PI;
    match alpha {
        2 => PI.powi(2) / 6.0,
        4 => PI.powi(4) / 90.0,
        6 => PI.powi(6) / 945.0,
        8 => PI.powi(8) / 9450.0,
        _ => panic!("zeta is tabulated for alpha in {{2, 4, 6, 8}}"),
    }
}

/// The product-weight existence bound for P_alpha,
/// `(prod_j (1 + 2 zeta(alpha) gamma_j) - 1) / n`; dividing merits by it
/// rescales them to a size-free range.
#[derive(Clone, Debug)]
pub struct PAlphaNorm {
    alpha: u32,
    weights: ProductWeights,
}

impl PAlphaNorm {
    pub fn new(alpha: u32, weights: ProductWeights) -> Self {
        PAlphaNorm { alpha, weights }
    }

    pub fn bound(&self, num_points: u64, dimension: usize) -> Real {
        let z = 2.0 * zeta_even(self.alpha);
        let product: Real = (0..dimension)
            .map(|j| 1.0 + z * self.weights.coordinate_weight(j))
            .product();
        (product - 1.0) / num_points as Real
    }
}

impl<L: LatticeRules> MeritFilter<L> for PAlphaNorm {
    fn apply(&self, merit: Real, lat: &LatDef<L>) -> Result<Real, LatticeRejected> {
        let bound = self.bound(lat.size_param().num_points(), lat.dimension());
        Ok(merit / bound)
    }

    fn name(&self) -> String {
        format!("norm:P{}", self.alpha)
    }
}

/// Multilevel normalizer: each level divided by its own bound scaled by a
/// per-level weight with `sum c_k <= 1`. Level 0 (a single point) is left
/// untouched.
#[derive(Clone, Debug)]
pub struct MultilevelPAlphaNorm {
    norm: PAlphaNorm,
    level_weights: Vec<Real>,
}

impl MultilevelPAlphaNorm {
    pub fn new(alpha: u32, weights: ProductWeights, level_weights: Vec<Real>) -> Self {
        let total: Real = level_weights.iter().sum();
        assert!(total <= 1.0 + 1e-12, "per-level weights must sum to at most 1");
        MultilevelPAlphaNorm {
            norm: PAlphaNorm::new(alpha, weights),
            level_weights,
        }
    }

    /// Uniform weights over levels `1..=max_level`.
    pub fn uniform(alpha: u32, weights: ProductWeights, max_level: Level) -> Self {
        let mut level_weights = vec![1.0 / max_level.max(1) as Real; max_level + 1];
        level_weights[0] = 0.0;
        Self::new(alpha, weights, level_weights)
    }
}

impl<L: LatticeRules> MultilevelFilter<L> for MultilevelPAlphaNorm {
    fn apply(&self, mut merit: Vec<Real>, lat: &LatDef<L>) -> Result<Vec<Real>, LatticeRejected> {
        for (level, value) in merit.iter_mut().enumerate().skip(1) {
            let c = self.level_weights.get(level).copied().unwrap_or(0.0);
            if c == 0.0 {
                continue;
            }
            let n_level = lat.size_param().num_points_at_level(level);
            let bound = self.norm.bound(n_level, lat.dimension());
            *value /= c * bound;
        }
        Ok(merit)
    }

    fn name(&self) -> String {
        format!("embedded-{}", MeritFilter::<L>::name(&self.norm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_param::SizeParam;
    use crate::types::OrdinaryLattice;

    fn lat(n: u64, gen: &[u64]) -> LatDef<OrdinaryLattice> {
        LatDef::with_gen(SizeParam::unilevel(n).unwrap(), gen.to_vec())
    }

    #[test]
    fn low_pass_rejects_to_infinity() {
        let mut list = MeritFilterList::<OrdinaryLattice>::new();
        list.add(Box::new(LowPass::new(1.0)));
        let l = lat(8, &[1]);
        assert_eq!(list.apply(MeritValue::Scalar(0.5), &l), 0.5);
        assert!(list.apply(MeritValue::Scalar(1.5), &l).is_infinite());
    }

    #[test]
    fn reject_signal_fires() {
        use std::cell::Cell;
        use std::rc::Rc;
        let count = Rc::new(Cell::new(0));
        let mut list = MeritFilterList::<OrdinaryLattice>::new();
        list.add(Box::new(LowPass::new(0.0)));
        let c = Rc::clone(&count);
        list.on_reject(move |_| c.set(c.get() + 1));
        list.apply(MeritValue::Scalar(1.0), &lat(8, &[1]));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn combiner_reduces_levels() {
        assert_eq!(Combiner::Sum.combine(&[1.0, 2.0, 3.0]), 6.0);
        assert_eq!(Combiner::Max.combine(&[1.0, 5.0, 3.0]), 5.0);
        assert_eq!(Combiner::SelectLevel(1).combine(&[1.0, 5.0, 3.0]), 5.0);
    }

    #[test]
    fn pipeline_combines_then_filters() {
        let mut list = MeritFilterList::<OrdinaryLattice>::with_combiner(Combiner::Max);
        list.add(Box::new(LowPass::new(2.0)));
        let sp = SizeParam::<OrdinaryLattice>::multilevel(2, 2).unwrap();
        let l = LatDef::with_gen(sp, vec![1]);
        assert_eq!(list.apply(MeritValue::PerLevel(vec![0.5, 1.5, 1.0]), &l), 1.5);
        assert!(list
            .apply(MeritValue::PerLevel(vec![0.5, 3.0, 1.0]), &l)
            .is_infinite());
    }

    #[test]
    fn palpha_bound_scales_with_size() {
        let norm = PAlphaNorm::new(2, ProductWeights::uniform(0.5));
        let b1 = norm.bound(100, 3);
        let b2 = norm.bound(200, 3);
        assert!((b1 / b2 - 2.0).abs() < 1e-12);
        assert!(b1 > 0.0);
    }
}
