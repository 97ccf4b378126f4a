//! Merit evaluation of one explicit generating vector.

use anyhow::{ensure, Result};

use crate::filters::MeritFilterList;
use crate::lat_def::LatDef;
use crate::merit_seq::{CbcEngine, LatSeqOverCbc};
use crate::size_param::SizeParam;
use crate::types::{LatticeRules, Real};

/// No search: runs the CBC machinery once over the given vector and applies
/// the filter pipeline.
pub struct Eval<L: LatticeRules, E: CbcEngine<L>> {
    seq_over_cbc: LatSeqOverCbc<L, E>,
    filters: MeritFilterList<L>,
}

impl<L: LatticeRules, E: CbcEngine<L>> Eval<L, E> {
    pub fn new(engine: E, filters: MeritFilterList<L>) -> Self {
        Eval {
            seq_over_cbc: LatSeqOverCbc::new(engine),
            filters,
        }
    }

    pub fn execute(
        &mut self,
        size_param: SizeParam<L>,
        gen: Vec<L::GenValue>,
    ) -> Result<(LatDef<L>, Real)> {
        let modulus = size_param.modulus();
        ensure!(!gen.is_empty(), "evaluation needs a non-empty generating vector");
        for (j, a) in gen.iter().enumerate() {
            ensure!(
                L::is_valid_gen(a, &modulus),
                "generator {a} at coordinate {} is not admissible modulo {modulus}",
                j + 1
            );
        }
        let lat = LatDef::with_gen(size_param, gen);
        let merit = self.seq_over_cbc.merit_of(&lat);
        let filtered = self.filters.apply(merit, &lat);
        Ok((lat, filtered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::CoordUniformFigureOfMerit;
    use crate::kernel::{PAlpha, Kernel};
    use crate::merit_seq::CoordUniformCbc;
    use crate::storage::{Compress, Storage};
    use crate::types::{OrdinaryLattice, Real};
    use crate::weights::{ProductWeights, Weights};

    /// The P2 product-weight figure telescopes into a closed form; the
    /// evaluation of a fixed vector must match it to near machine accuracy.
    #[test]
    fn matches_independent_reference() {
        let n = 31u64;
        let gamma = 0.7;
        let gen = vec![1u64, 12, 3];
        let sp = SizeParam::<OrdinaryLattice>::unilevel(n).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlpha::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(gamma)),
            1.0,
        );
        let storage = Storage::new(sp, Compress::Symmetric).unwrap();
        let mut eval = Eval::new(
            CoordUniformCbc::new(storage, &figure).unwrap(),
            MeritFilterList::new(),
        );
        let (lat, merit) = eval.execute(sp, gen.clone()).unwrap();
        assert_eq!(lat.dimension(), 3);

        let kernel = PAlpha::new(2).unwrap();
        let mut reference = 0.0;
        for i in 0..n {
            let mut prod = 1.0;
            for &a in &gen {
                prod *= 1.0 + gamma * kernel.eval((i * a % n) as Real / n as Real, n);
            }
            reference += prod - 1.0;
        }
        reference /= n as Real;

        assert!(
            (merit - reference).abs() <= 1e-12 * reference.abs().max(1.0),
            "{merit} vs {reference}"
        );
    }

    #[test]
    fn rejects_inadmissible_generators() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(12).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlpha::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(1.0)),
            1.0,
        );
        let storage = Storage::new(sp, Compress::Symmetric).unwrap();
        let mut eval = Eval::new(
            CoordUniformCbc::new(storage, &figure).unwrap(),
            MeritFilterList::new(),
        );
        assert!(eval.execute(sp, vec![1, 6]).is_err());
        assert!(eval.execute(sp, vec![]).is_err());
    }
}
