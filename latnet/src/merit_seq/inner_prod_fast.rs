//! FFT block-circulant inner product for cyclic candidate groups.
//!
//! When the candidates run over the unit group in inverse-generator order
//! and the storage slots run over the same group in direct order, striding
//! the kernel values by candidate `t` rotates each level block by `t`. The
//! merits of all candidates at once are then one cyclic convolution per
//! level: FFT of the weighted state, pointwise product with the cached FFT
//! of the circulant-transposed kernel values, inverse FFT.

use anyhow::{ensure, Result};
use log::debug;

use crate::fft::{cyclic_convolution, fft_real, Complex};
use crate::figure::CoordUniformFigureOfMerit;
use crate::kernel::{values_vector, Kernel};
use crate::lat_def::LatDef;
use crate::merit_seq::cbc::CbcEngine;
use crate::merit_seq::states::{create_states, weighted_state, CoordUniformState};
use crate::storage::{Layout, Storage};
use crate::types::{LatticeRules, MeritValue, Real};

pub struct CoordUniformFastCbc<L: LatticeRules> {
    storage: Storage<L>,
    kernel_values: Vec<Real>,
    /// Per level: FFT of the circulant transpose of the kernel values,
    /// pre-scaled by the level compression ratio.
    circulant_fft: Vec<Vec<Complex>>,
    states: Vec<Box<dyn CoordUniformState>>,
    /// Unit-group candidates in inverse-generator order, aligned with the
    /// rotation index of the convolution output.
    candidates: Vec<L::GenValue>,
    base_lat: LatDef<L>,
    base_merit: MeritValue,
}

impl<L: LatticeRules> CoordUniformFastCbc<L> {
    pub fn new<K: Kernel>(
        storage: Storage<L>,
        candidates: Vec<L::GenValue>,
        figure: &CoordUniformFigureOfMerit<K>,
    ) -> Result<Self> {
        ensure!(
            storage.layout() == Layout::Cyclic,
            "the fast inner product needs cyclic storage"
        );
        let top_len = storage.level_ranges().last().map_or(0, |r| r.len());
        ensure!(
            candidates.len() == top_len,
            "candidate count {} does not match the top level block of {}",
            candidates.len(),
            top_len
        );
        if let Some(base) = storage.base_num_points() {
            ensure!(
                base != 2 || storage.symmetric(),
                "not implemented for non-symmetric vectors in base 2"
            );
        }
        let kernel_values = values_vector(figure.kernel(), &storage)?;
        let circulant_fft = compute_circulant_fft(&storage, &kernel_values);
        let states = create_states(figure.weights(), figure.weights_power(), storage.size());
        let base_lat = LatDef::new(*storage.size_param());
        let base_merit = storage.create_merit_value(0.0);
        Ok(CoordUniformFastCbc {
            storage,
            kernel_values,
            circulant_fft,
            states,
            candidates,
            base_lat,
            base_merit,
        })
    }

    pub fn storage(&self) -> &Storage<L> {
        &self.storage
    }

    pub fn candidates(&self) -> &[L::GenValue] {
        &self.candidates
    }

    pub fn weighted_state(&self) -> Vec<Real> {
        weighted_state(&self.states, self.storage.size())
    }

    /// Per-level convolution outputs; entry `[level][t]` is the (cumulative
    /// over levels, unnormalized) merit increment of candidate `t` on that
    /// level.
    fn prod_values(&self, w: &[Real]) -> Vec<Vec<Real>> {
        let ranges = self.storage.level_ranges();
        let mut out: Vec<Vec<Real>> = Vec::with_capacity(ranges.len());
        for (level, range) in ranges.iter().enumerate() {
            let mut conv = cyclic_convolution(&w[range.clone()], &self.circulant_fft[level]);
            if let Some(prev) = out.last() {
                for (i, c) in conv.iter_mut().enumerate() {
                    *c += prev[i % prev.len()];
                }
            }
            out.push(conv);
        }
        out
    }

    /// The merits of all candidates, by one FFT pass per level.
    pub fn all_merits(&self) -> Vec<MeritValue> {
        let w = self.weighted_state();
        let per_level = self.prod_values(&w);
        let size_param = self.storage.size_param();
        (0..self.candidates.len())
            .map(|t| {
                let levels: Vec<Real> = per_level
                    .iter()
                    .map(|lvl| lvl[t % lvl.len()])
                    .collect();
                let mut increment = match self.storage.create_merit_value(0.0) {
                    MeritValue::Scalar(_) => MeritValue::Scalar(*levels.last().unwrap()),
                    MeritValue::PerLevel(_) => MeritValue::PerLevel(levels),
                };
                size_param.normalize(&mut increment);
                let mut merit = self.base_merit.clone();
                merit.add_assign(&increment);
                merit
            })
            .collect()
    }
}

fn compute_circulant_fft<L: LatticeRules>(
    storage: &Storage<L>,
    kernel_values: &[Real],
) -> Vec<Vec<Complex>> {
    storage
        .level_ranges()
        .iter()
        .enumerate()
        .map(|(level, range)| {
            let block = &kernel_values[range.clone()];
            let len = block.len();
            // Circulant transpose: index 0 stays, the rest reverses.
            let transposed: Vec<Real> = (0..len)
                .map(|i| if i == 0 { block[0] } else { block[len - i] })
                .collect();
            let ratio = storage
                .base_num_points()
                .map_or(1, |b| storage.compress().level_compression_ratio(b, level));
            let mut fft = fft_real(&transposed);
            for x in &mut fft {
                *x *= ratio as Real;
            }
            fft
        })
        .collect()
}

impl<L: LatticeRules> CbcEngine<L> for CoordUniformFastCbc<L> {
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

    /// The candidate slice is ignored: the candidate order is fixed by the
    /// group structure. Callers pass `self.candidates()`.
    fn merit_seq<'s>(
        &'s mut self,
        candidates: &'s [L::GenValue],
    ) -> Box<dyn Iterator<Item = (L::GenValue, MeritValue)> + 's> {
        assert_eq!(
            candidates.len(),
            self.candidates.len(),
            "the fast CBC candidate sequence is fixed by the group"
        );
        let merits = self.all_merits();
        Box::new(self.candidates.iter().copied().zip(merits))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genseq::{CyclicGroup, GroupOrder, IndexedSequence, PolyCyclicGroup};
    use crate::kernel::{PAlpha, PAlphaPlr};
    use crate::merit_seq::cbc::CoordUniformCbc;
    use crate::size_param::SizeParam;
    use crate::storage::Compress;
    use crate::types::{OrdinaryLattice, PolynomialLattice};
    use crate::weights::{OrderDependentWeights, ProductWeights, Weights};
    use latnet_gf2::Gf2Poly;

    fn assert_fast_matches_naive(
        fast: &CoordUniformFastCbc<OrdinaryLattice>,
        naive: &mut CoordUniformCbc<OrdinaryLattice>,
    ) {
        let candidates = fast.candidates().to_vec();
        let fast_merits = fast.all_merits();
        let naive_merits: Vec<MeritValue> =
            naive.merit_seq(&candidates).map(|(_, m)| m).collect();
        for (t, (f, n)) in fast_merits.iter().zip(&naive_merits).enumerate() {
            match (f, n) {
                (MeritValue::Scalar(x), MeritValue::Scalar(y)) => {
                    assert!(
                        (x - y).abs() <= 1e-10 * y.abs().max(1e-30),
                        "candidate {t} ({}): {x} vs {y}",
                        candidates[t]
                    );
                }
                (MeritValue::PerLevel(xs), MeritValue::PerLevel(ys)) => {
                    for (k, (x, y)) in xs.iter().zip(ys).enumerate() {
                        assert!(
                            (x - y).abs() <= 1e-10 * y.abs().max(1e-30),
                            "candidate {t} level {k}: {x} vs {y}"
                        );
                    }
                }
                _ => panic!("merit shapes diverge"),
            }
        }
    }

    fn group_candidates(base: u64, power: usize, compress: Compress) -> Vec<u64> {
        CyclicGroup::new(base, power, compress, GroupOrder::Inverse)
            .unwrap()
            .to_vec()
    }

    #[test]
    fn fast_matches_naive_base2_symmetric_unilevel() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(64).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlpha::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(0.7)),
            1.0,
        );
        let cyclic = Storage::cyclic(sp, Compress::Symmetric).unwrap();
        let flat = Storage::new(sp, Compress::Symmetric).unwrap();
        let candidates = group_candidates(2, 6, Compress::Symmetric);
        let mut fast = CoordUniformFastCbc::new(cyclic, candidates, &figure).unwrap();
        let mut naive = CoordUniformCbc::new(flat, &figure).unwrap();

        for _ in 0..3 {
            assert_fast_matches_naive(&fast, &mut naive);
            // Commit the same candidate on both engines and check again one
            // dimension deeper.
            let cands = fast.candidates().to_vec();
            let (a, m) = fast.merit_seq(&cands).next().unwrap();
            let (_, m_naive) = naive.merit_seq(&[a]).next().unwrap();
            fast.select(a, m);
            naive.select(a, m_naive);
        }
    }

    #[test]
    fn fast_matches_naive_base3_multilevel() {
        let sp = SizeParam::<OrdinaryLattice>::multilevel(3, 4).unwrap();
        for compress in [Compress::None, Compress::Symmetric] {
            let figure = CoordUniformFigureOfMerit::new(
                PAlpha::new(4).unwrap(),
                Weights::OrderDependent(OrderDependentWeights::new(vec![1.0, 0.5, 0.1], 0.05)),
                1.0,
            );
            let cyclic = Storage::cyclic(sp, compress).unwrap();
            let flat = Storage::new(sp, compress).unwrap();
            let candidates = group_candidates(3, 4, compress);
            let mut fast = CoordUniformFastCbc::new(cyclic, candidates, &figure).unwrap();
            let mut naive = CoordUniformCbc::new(flat, &figure).unwrap();

            for _ in 0..2 {
                assert_fast_matches_naive(&fast, &mut naive);
                let cands = fast.candidates().to_vec();
                let (a, m) = fast.merit_seq(&cands).nth(2).unwrap();
                let (_, m_naive) = naive.merit_seq(&[a]).next().unwrap();
                fast.select(a, m);
                naive.select(a, m_naive);
            }
        }
    }

    #[test]
    fn fast_matches_naive_polynomial() {
        let p = Gf2Poly(0b100101); // z^5 + z^2 + 1, irreducible
        let sp = SizeParam::<PolynomialLattice>::unilevel(p).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlphaPlr::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(0.9)),
            1.0,
        );
        let cyclic = Storage::cyclic(sp, Compress::None).unwrap();
        let flat = Storage::new(sp, Compress::None).unwrap();
        let candidates: Vec<Gf2Poly> = PolyCyclicGroup::new(p, GroupOrder::Inverse)
            .unwrap()
            .to_vec();
        let mut fast = CoordUniformFastCbc::new(cyclic, candidates.clone(), &figure).unwrap();
        let mut naive = CoordUniformCbc::new(flat, &figure).unwrap();

        for step in 0..2 {
            let fast_merits = fast.all_merits();
            let naive_merits: Vec<MeritValue> =
                naive.merit_seq(&candidates).map(|(_, m)| m).collect();
            for (t, (f, n)) in fast_merits.iter().zip(&naive_merits).enumerate() {
                let (x, y) = (f.clone().scalar(), n.clone().scalar());
                assert!(
                    (x - y).abs() <= 1e-10 * y.abs().max(1e-30),
                    "step {step} candidate {t}: {x} vs {y}"
                );
            }
            let a = candidates[1];
            let m = fast_merits[1].clone();
            fast.select(a, m.clone());
            naive.select(a, m);
        }
    }

    #[test]
    fn base2_without_symmetry_is_rejected() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(32).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlpha::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(1.0)),
            1.0,
        );
        let cyclic = Storage::cyclic(sp, Compress::None).unwrap();
        let candidates = group_candidates(2, 5, Compress::None);
        assert!(CoordUniformFastCbc::new(cyclic, candidates, &figure).is_err());
    }
}
