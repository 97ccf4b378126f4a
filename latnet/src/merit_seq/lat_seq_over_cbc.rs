//! Total merit of full candidate lattices through a CBC engine.

use crate::lat_def::LatDef;
use crate::merit_seq::cbc::CbcEngine;
use crate::types::{LatticeRules, MeritValue};

/// Wraps a CBC engine to score complete generating vectors: the engine is
/// reset and run through every coordinate of each candidate, yielding the
/// full-dimension merit. Used by the exhaustive, Korobov and random
/// searches.
pub struct LatSeqOverCbc<L: LatticeRules, E: CbcEngine<L>> {
    engine: E,
    _marker: core::marker::PhantomData<L>,
}

impl<L: LatticeRules, E: CbcEngine<L>> LatSeqOverCbc<L, E> {
    pub fn new(engine: E) -> Self {
        LatSeqOverCbc {
            engine,
            _marker: core::marker::PhantomData,
        }
    }

    pub fn cbc(&self) -> &E {
        &self.engine
    }

    /// The total merit of one generating vector.
    pub fn merit_of(&mut self, lat: &LatDef<L>) -> MeritValue {
        self.engine.reset();
        for &a in lat.gen() {
            let single = [a];
            let merit = self
                .engine
                .merit_seq(&single)
                .next()
                .expect("one candidate in, one merit out")
                .1;
            self.engine.select(a, merit);
        }
        self.engine.base_merit().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::CoordUniformFigureOfMerit;
    use crate::kernel::PAlpha;
    use crate::merit_seq::cbc::CoordUniformCbc;
    use crate::size_param::SizeParam;
    use crate::storage::{Compress, Storage};
    use crate::types::OrdinaryLattice;
    use crate::weights::{ProductWeights, Weights};

    #[test]
    fn scores_whole_vectors() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(31).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlpha::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(0.7)),
            1.0,
        );
        let storage = Storage::new(sp, Compress::Symmetric).unwrap();
        let mut seq = LatSeqOverCbc::new(CoordUniformCbc::new(storage, &figure).unwrap());

        let good = LatDef::with_gen(sp, vec![1, 12, 3]);
        let merit_good = seq.merit_of(&good).scalar();
        let merit_again = seq.merit_of(&good).scalar();
        assert!((merit_good - merit_again).abs() < 1e-15, "reset is clean");

        let other = LatDef::with_gen(sp, vec![1, 1, 1]);
        let merit_other = seq.merit_of(&other).scalar();
        assert!(merit_other > merit_good, "the rank-1 lattice (1,1,1) is bad");
    }
}
