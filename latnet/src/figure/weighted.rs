//! The generic weighted figure of merit
//! `F(gen) = ACC_u gamma_u * D_u(gen)^q` over non-empty projections `u`.

use itertools::Itertools;
use log::trace;

use crate::figure::{AccOp, Accumulator, NormType};
use crate::kernel::{Kernel, PAlpha, RAlpha};
use crate::size_param::SizeParam;
use crate::types::{LatticeRules, Real};
use crate::weights::{Coordinates, Weights};

/// A projection-dependent square discrepancy `D^2_u(gen)`.
pub trait ProjDepMerit {
    fn name(&self) -> String;

    fn evaluate<L: LatticeRules>(
        &self,
        size_param: &SizeParam<L>,
        gen: &[L::GenValue],
        projection: &Coordinates,
    ) -> Real;
}

/// Evaluates a kernel product over one projection of the lattice points.
fn kernel_proj_merit<L: LatticeRules, K: Kernel>(
    kernel: &K,
    size_param: &SizeParam<L>,
    gen: &[L::GenValue],
    projection: &Coordinates,
) -> Real {
    let n = size_param.num_points();
    let modulus = size_param.modulus();
    let mut sum = 0.0;
    for i in 0..n {
        let mut prod = 1.0;
        for j in projection.iter() {
            let idx = L::stride_index(&gen[j], i, &modulus);
            let x = L::to_kernel_index(idx, &modulus) as Real / n as Real;
            prod *= kernel.eval(x, n);
        }
        sum += prod;
    }
    sum / n as Real
}

/// `D^2_u` of the P_alpha criterion, by direct summation over the points.
#[derive(Clone, Debug)]
pub struct PAlphaProjMerit {
    kernel: PAlpha,
}

impl PAlphaProjMerit {
    pub fn new(alpha: u32) -> anyhow::Result<Self> {
        Ok(PAlphaProjMerit {
            kernel: PAlpha::new(alpha)?,
        })
    }
}

impl ProjDepMerit for PAlphaProjMerit {
    fn name(&self) -> String {
        self.kernel.name()
    }

    fn evaluate<L: LatticeRules>(
        &self,
        size_param: &SizeParam<L>,
        gen: &[L::GenValue],
        projection: &Coordinates,
    ) -> Real {
        kernel_proj_merit(&self.kernel, size_param, gen, projection)
    }
}

/// `D^2_u` of the R_alpha criterion.
#[derive(Clone, Debug)]
pub struct RAlphaProjMerit {
    kernel: RAlpha,
}

impl RAlphaProjMerit {
    pub fn new(alpha: Real) -> anyhow::Result<Self> {
        Ok(RAlphaProjMerit {
            kernel: RAlpha::new(alpha)?,
        })
    }
}

impl ProjDepMerit for RAlphaProjMerit {
    fn name(&self) -> String {
        self.kernel.name()
    }

    fn evaluate<L: LatticeRules>(
        &self,
        size_param: &SizeParam<L>,
        gen: &[L::GenValue],
        projection: &Coordinates,
    ) -> Real {
        kernel_proj_merit(&self.kernel, size_param, gen, projection)
    }
}

/// A weighted sum (or maximum) of projection-dependent merits.
#[derive(Clone, Debug)]
pub struct WeightedFigureOfMerit<M: ProjDepMerit> {
    merit: M,
    weights: Weights,
    weights_power: Real,
    norm: NormType,
}

impl<M: ProjDepMerit> WeightedFigureOfMerit<M> {
    pub fn new(merit: M, weights: Weights, weights_power: Real, norm: NormType) -> Self {
        WeightedFigureOfMerit {
            merit,
            weights,
            weights_power,
            norm,
        }
    }

    pub fn name(&self) -> String {
        format!("weighted {}", self.merit.name())
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn acc_op(&self) -> AccOp {
        self.norm.acc_op()
    }

    /// The value of a dimension-0 evaluation.
    pub fn neutral(&self) -> Real {
        self.acc_op().neutral()
    }

    pub fn evaluator(&self) -> WeightedFigureEvaluator<'_, M> {
        WeightedFigureEvaluator {
            figure: self,
            on_progress: Vec::new(),
        }
    }
}

/// Stateful evaluator carrying the registered progress slots.
///
/// After each projection contribution every slot votes on whether to
/// continue; one false vote aborts the evaluation, which then reports
/// positive infinity so the candidate can never be selected.
pub struct WeightedFigureEvaluator<'a, M: ProjDepMerit> {
    figure: &'a WeightedFigureOfMerit<M>,
    on_progress: Vec<Box<dyn FnMut(Real) -> bool + 'a>>,
}

impl<'a, M: ProjDepMerit> WeightedFigureEvaluator<'a, M> {
    pub fn on_progress(&mut self, slot: impl FnMut(Real) -> bool + 'a) {
        self.on_progress.push(Box::new(slot));
    }

    pub fn figure(&self) -> &WeightedFigureOfMerit<M> {
        self.figure
    }

    /// Adds to `initial` the contributions of all projections that contain
    /// the newest coordinate of `gen`.
    ///
    /// Projections are visited by increasing cardinality and, within one
    /// cardinality, by non-increasing weight, so that an abort bound is hit
    /// as early as possible.
    pub fn evaluate_extension<L: LatticeRules>(
        &mut self,
        size_param: &SizeParam<L>,
        gen: &[L::GenValue],
        initial: Real,
    ) -> Real {
        let figure = self.figure;
        if gen.is_empty() {
            return initial;
        }
        let newest = gen.len() - 1;
        let mut acc = Accumulator::with_value(figure.acc_op(), initial);
        let power = figure.norm.exponent();

        for order in 1..=gen.len() {
            let mut projections: Vec<(Coordinates, Real)> = (0..newest)
                .combinations(order - 1)
                .map(|rest| {
                    let proj = Coordinates::from_slice(&rest).with(newest);
                    let weight = figure.weights.weight(&proj).powf(figure.weights_power);
                    (proj, weight)
                })
                .collect();
            projections
                .sort_by(|a, b| b.1.partial_cmp(&a.1).expect("weights are not NaN"));

            for (proj, weight) in projections {
                if weight == 0.0 {
                    continue;
                }
                let value = figure.merit.evaluate(size_param, gen, &proj);
                acc.accumulate(weight, value, power);
                trace!("projection {proj}: merit {value:.6e}, running {:.6e}", acc.value());
                if !self.vote(acc.value()) {
                    acc.accumulate(Real::INFINITY, 1.0, 1.0);
                    return acc.value();
                }
            }
        }
        acc.value()
    }

    /// Evaluates the whole figure of a generating vector from scratch.
    pub fn evaluate<L: LatticeRules>(
        &mut self,
        size_param: &SizeParam<L>,
        gen: &[L::GenValue],
    ) -> Real {
        let mut value = self.figure.neutral();
        for dim in 1..=gen.len() {
            value = self.evaluate_extension(size_param, &gen[..dim], value);
            if value.is_infinite() && value > 0.0 {
                break;
            }
        }
        value
    }

    fn vote(&mut self, value: Real) -> bool {
        self.on_progress.iter_mut().all(|slot| slot(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel;
    use crate::types::OrdinaryLattice;
    use crate::weights::ProductWeights;

    fn p2_figure(gamma: Real) -> WeightedFigureOfMerit<PAlphaProjMerit> {
        WeightedFigureOfMerit::new(
            PAlphaProjMerit::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(gamma)),
            1.0,
            NormType::Q(1.0),
        )
    }

    /// For product weights, summing `gamma^|u| D_u` over all non-empty `u`
    /// telescopes into a single product over coordinates.
    fn product_weight_reference(n: u64, gen: &[u64], gamma: Real) -> Real {
        let kernel = kernel::PAlpha::new(2).unwrap();
        let mut total = 0.0;
        for i in 0..n {
            let mut prod = 1.0;
            for &a in gen {
                let x = (i * a % n) as Real / n as Real;
                prod *= 1.0 + gamma * kernel.eval(x, n);
            }
            total += prod - 1.0;
        }
        total / n as Real
    }

    #[test]
    fn matches_product_weight_closed_form() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(31).unwrap();
        let gen = [1u64, 12, 3];
        let figure = p2_figure(0.7);
        let mut eval = figure.evaluator();
        let value = eval.evaluate(&sp, &gen);
        let reference = product_weight_reference(31, &gen, 0.7);
        assert!(
            (value - reference).abs() <= 1e-12 * reference.abs().max(1.0),
            "{value} vs {reference}"
        );
    }

    #[test]
    fn dimension_zero_is_neutral() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(8).unwrap();
        let figure = p2_figure(1.0);
        assert_eq!(figure.evaluator().evaluate(&sp, &[]), 0.0);

        let max_figure = WeightedFigureOfMerit::new(
            PAlphaProjMerit::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(1.0)),
            1.0,
            NormType::Inf,
        );
        assert_eq!(max_figure.neutral(), Real::NEG_INFINITY);
    }

    #[test]
    fn abort_reports_infinity() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(31).unwrap();
        let figure = p2_figure(0.7);
        let mut eval = figure.evaluator();
        eval.on_progress(|_| false);
        let value = eval.evaluate(&sp, &[1, 12]);
        assert!(value.is_infinite() && value > 0.0);
    }

    #[test]
    fn progress_sees_running_value() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(31).unwrap();
        let figure = p2_figure(0.7);
        let mut seen = Vec::new();
        let mut eval = figure.evaluator();
        eval.on_progress(|v| {
            seen.push(v);
            true
        });
        let value = eval.evaluate(&sp, &[1, 12, 3]);
        drop(eval);
        // The newest coordinate appears in 1 + 2 + 4 projections across the
        // three extensions: {1}; {2},{1,2}; {3},{1,3},{2,3},{1,2,3}.
        assert_eq!(seen.len(), 7);
        assert!((seen.last().unwrap() - value).abs() < 1e-15);
    }
}
