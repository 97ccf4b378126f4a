//! CBC merit-sequence engines.
//!
//! An engine owns the base lattice built so far and, given candidate
//! generator values for the next coordinate, lazily yields their merits.
//! `select` commits a candidate and advances the base lattice.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use log::debug;

use crate::figure::weighted::{ProjDepMerit, WeightedFigureOfMerit};
use crate::figure::CoordUniformFigureOfMerit;
use crate::kernel::{values_vector, Kernel};
use crate::lat_def::LatDef;
use crate::merit_seq::states::{create_states, weighted_state, CoordUniformState};
use crate::size_param::SizeParam;
use crate::storage::Storage;
use crate::types::{LatticeRules, MeritValue, Real};

/// The engine interface the search drivers consume.
pub trait CbcEngine<L: LatticeRules> {
    fn reset(&mut self);

    fn base_lat(&self) -> &LatDef<L>;

    fn base_merit(&self) -> &MeritValue;

    /// Lazily yields `(candidate, merit)` for every candidate, in order.
    fn merit_seq<'s>(
        &'s mut self,
        candidates: &'s [L::GenValue],
    ) -> Box<dyn Iterator<Item = (L::GenValue, MeritValue)> + 's>;

    /// Commits a candidate for the next coordinate.
    fn select(&mut self, a: L::GenValue, merit: MeritValue);
}

/// Coordinate-uniform CBC: per-weight states updated by strided kernel
/// values, with the standard elementwise inner product per candidate.
pub struct CoordUniformCbc<L: LatticeRules> {
    storage: Storage<L>,
    kernel_values: Vec<Real>,
    states: Vec<Box<dyn CoordUniformState>>,
    base_lat: LatDef<L>,
    base_merit: MeritValue,
}

impl<L: LatticeRules> CoordUniformCbc<L> {
    pub fn new<K: Kernel>(
        storage: Storage<L>,
        figure: &CoordUniformFigureOfMerit<K>,
    ) -> Result<Self> {
        let kernel_values = values_vector(figure.kernel(), &storage)?;
        let states = create_states(figure.weights(), figure.weights_power(), storage.size());
        let base_lat = LatDef::new(*storage.size_param());
        let base_merit = storage.create_merit_value(0.0);
        Ok(CoordUniformCbc {
            storage,
            kernel_values,
            states,
            base_lat,
            base_merit,
        })
    }

    pub fn storage(&self) -> &Storage<L> {
        &self.storage
    }

    pub fn kernel_values(&self) -> &[Real] {
        &self.kernel_values
    }

    /// The weighted sum of all per-weight states.
    pub fn weighted_state(&self) -> Vec<Real> {
        weighted_state(&self.states, self.storage.size())
    }

    fn candidate_merit(&self, w: &[Real], a: &L::GenValue) -> MeritValue {
        let strided = self.storage.stride_permuted(&self.kernel_values, a);
        let prod: Vec<Real> = w.iter().zip(&strided).map(|(&x, &y)| x * y).collect();
        let mut increment = self.storage.compressed_sum(&prod);
        self.storage.size_param().normalize(&mut increment);
        let mut merit = self.base_merit.clone();
        merit.add_assign(&increment);
        merit
    }
}

impl<L: LatticeRules> CbcEngine<L> for CoordUniformCbc<L> {
    fn reset(&mut self) {
        self.base_lat = LatDef::new(*self.storage.size_param());
        self.base_merit = self.storage.create_merit_value(0.0);
        for state in &mut self.states {
            state.reset();
        }
    }

    fn base_lat(&self) -> &LatDef<L> {
        &self.base_lat
    }

    fn base_merit(&self) -> &MeritValue {
        &self.base_merit
    }

    fn merit_seq<'s>(
        &'s mut self,
        candidates: &'s [L::GenValue],
    ) -> Box<dyn Iterator<Item = (L::GenValue, MeritValue)> + 's> {
        let w = self.weighted_state();
        Box::new(
            candidates
                .iter()
                .map(move |a| (*a, self.candidate_merit(&w, a))),
        )
    }

    fn select(&mut self, a: L::GenValue, merit: MeritValue) {
        let strided = self.storage.stride_permuted(&self.kernel_values, &a);
        for state in &mut self.states {
            state.update(&strided);
        }
        debug!(
            "selected generator {a} for coordinate {}: merit {merit}",
            self.base_lat.dimension() + 1
        );
        self.base_lat.push(a);
        self.base_merit = merit;
    }
}

/// CBC over a generic weighted figure of merit: each candidate merit is the
/// base merit plus the contributions of the projections that contain the
/// new coordinate, with early truncation against the best merit seen so
/// far in the current scan.
pub struct WeightedCbc<L: LatticeRules, M: ProjDepMerit> {
    size_param: SizeParam<L>,
    figure: WeightedFigureOfMerit<M>,
    truncation_bound: Rc<Cell<Real>>,
    base_lat: LatDef<L>,
    base_merit: MeritValue,
}

impl<L: LatticeRules, M: ProjDepMerit> WeightedCbc<L, M> {
    pub fn new(size_param: SizeParam<L>, figure: WeightedFigureOfMerit<M>) -> Result<Self> {
        anyhow::ensure!(
            size_param.max_level() == 0,
            "the projection-sum evaluator works on unilevel lattices"
        );
        let base_merit = MeritValue::Scalar(figure.neutral());
        Ok(WeightedCbc {
            size_param,
            figure,
            truncation_bound: Rc::new(Cell::new(Real::INFINITY)),
            base_lat: LatDef::new(size_param),
            base_merit,
        })
    }

    pub fn figure(&self) -> &WeightedFigureOfMerit<M> {
        &self.figure
    }

    /// The best raw merit observed in the current scan; evaluations whose
    /// partial figure reaches it abort with infinity. Exposed so outer
    /// observers can tighten it further.
    pub fn truncation_bound(&self) -> Rc<Cell<Real>> {
        Rc::clone(&self.truncation_bound)
    }
}

impl<L: LatticeRules, M: ProjDepMerit> CbcEngine<L> for WeightedCbc<L, M> {
    fn reset(&mut self) {
        self.base_lat = LatDef::new(self.size_param);
        self.base_merit = MeritValue::Scalar(self.figure.neutral());
        self.truncation_bound.set(Real::INFINITY);
    }

    fn base_lat(&self) -> &LatDef<L> {
        &self.base_lat
    }

    fn base_merit(&self) -> &MeritValue {
        &self.base_merit
    }

    fn merit_seq<'s>(
        &'s mut self,
        candidates: &'s [L::GenValue],
    ) -> Box<dyn Iterator<Item = (L::GenValue, MeritValue)> + 's> {
        self.truncation_bound.set(Real::INFINITY);
        let base = match self.base_merit {
            MeritValue::Scalar(x) => x,
            MeritValue::PerLevel(_) => unreachable!("weighted CBC is unilevel"),
        };
        let size_param = self.size_param;
        let figure = &self.figure;
        let bound = Rc::clone(&self.truncation_bound);
        let base_gen = self.base_lat.gen().to_vec();
        Box::new(candidates.iter().map(move |a| {
            let mut gen = base_gen.clone();
            gen.push(*a);
            let mut evaluator = figure.evaluator();
            let progress_bound = Rc::clone(&bound);
            evaluator.on_progress(move |value| value < progress_bound.get());
            let value = evaluator.evaluate_extension(&size_param, &gen, base);
            if value < bound.get() {
                bound.set(value);
            }
            (*a, MeritValue::Scalar(value))
        }))
    }

    fn select(&mut self, a: L::GenValue, merit: MeritValue) {
        debug!(
            "selected generator {a} for coordinate {}: merit {merit}",
            self.base_lat.dimension() + 1
        );
        self.base_lat.push(a);
        self.base_merit = merit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::weighted::PAlphaProjMerit;
    use crate::figure::NormType;
    use crate::genseq::{CoprimeIntegers, IndexedSequence};
    use crate::kernel::PAlpha;
    use crate::storage::Compress;
    use crate::types::OrdinaryLattice;
    use crate::weights::{ProductWeights, Weights};

    fn run_cbc<E: CbcEngine<OrdinaryLattice>>(
        engine: &mut E,
        n: u64,
        dimension: usize,
    ) -> (Vec<u64>, Real) {
        let candidates = CoprimeIntegers::new(n, Compress::None).to_vec();
        let mut last = 0.0;
        for _ in 0..dimension {
            let (best_a, best_m) = engine
                .merit_seq(&candidates)
                .min_by(|a, b| {
                    a.1.clone()
                        .scalar()
                        .partial_cmp(&b.1.clone().scalar())
                        .unwrap()
                })
                .unwrap();
            last = best_m.clone().scalar();
            engine.select(best_a, best_m);
        }
        (engine.base_lat().gen().to_vec(), last)
    }

    /// The coordinate-uniform update rule and the projection-sum evaluator
    /// compute the same figure.
    #[test]
    fn coord_uniform_agrees_with_weighted() {
        let n = 31u64;
        let sp = SizeParam::<OrdinaryLattice>::unilevel(n).unwrap();
        let weights = Weights::Product(ProductWeights::uniform(0.7));

        let cu_figure =
            CoordUniformFigureOfMerit::new(PAlpha::new(2).unwrap(), weights.clone(), 1.0);
        let storage = Storage::new(sp, Compress::Symmetric).unwrap();
        let mut cu = CoordUniformCbc::new(storage, &cu_figure).unwrap();

        let w_figure = WeightedFigureOfMerit::new(
            PAlphaProjMerit::new(2).unwrap(),
            weights,
            1.0,
            NormType::Q(1.0),
        );
        let mut weighted = WeightedCbc::new(sp, w_figure).unwrap();

        let (gen_cu, merit_cu) = run_cbc(&mut cu, n, 3);
        let (gen_w, merit_w) = run_cbc(&mut weighted, n, 3);

        // The kernel is symmetric, so a and n - a are interchangeable; the
        // searches must agree on the folded classes and on the merit.
        let folded = |gen: &[u64]| -> Vec<u64> { gen.iter().map(|&a| a.min(n - a)).collect() };
        assert_eq!(folded(&gen_cu), folded(&gen_w));
        assert!(
            (merit_cu - merit_w).abs() <= 1e-10 * merit_w.abs(),
            "{merit_cu} vs {merit_w}"
        );
        assert_eq!(gen_cu[0], 1);
    }

    #[test]
    fn reset_returns_to_dimension_zero() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(16).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlpha::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(1.0)),
            1.0,
        );
        let storage = Storage::new(sp, Compress::Symmetric).unwrap();
        let mut cbc = CoordUniformCbc::new(storage, &figure).unwrap();
        run_cbc(&mut cbc, 16, 2);
        assert_eq!(cbc.base_lat().dimension(), 2);
        cbc.reset();
        assert_eq!(cbc.base_lat().dimension(), 0);
        assert_eq!(cbc.base_merit(), &MeritValue::Scalar(0.0));
    }

    /// Candidate merits only depend on the candidate through the folded
    /// class: a and n - a give the same merit for a symmetric kernel.
    #[test]
    fn merit_is_reflection_invariant() {
        let n = 32u64;
        let sp = SizeParam::<OrdinaryLattice>::unilevel(n).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlpha::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(0.3)),
            1.0,
        );
        let storage = Storage::new(sp, Compress::None).unwrap();
        let mut cbc = CoordUniformCbc::new(storage, &figure).unwrap();
        cbc.select(1, MeritValue::Scalar(0.0));
        let candidates: Vec<u64> = vec![3, 29, 5, 27];
        let merits: Vec<Real> = cbc
            .merit_seq(&candidates)
            .map(|(_, m)| m.scalar())
            .collect();
        assert!((merits[0] - merits[1]).abs() < 1e-12);
        assert!((merits[2] - merits[3]).abs() < 1e-12);
    }
}
