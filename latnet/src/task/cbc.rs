//! Dimension-by-dimension CBC search drivers.

use anyhow::Result;

use crate::figure::weighted::{ProjDepMerit, WeightedFigureOfMerit};
use crate::figure::CoordUniformFigureOfMerit;
use crate::filters::MeritFilterList;
use crate::genseq::Traversal;
use crate::kernel::Kernel;
use crate::lat_def::LatDef;
use crate::lfsr258::Lfsr258;
use crate::merit_seq::{CbcEngine, CoordUniformCbc, CoordUniformFastCbc, WeightedCbc};
use crate::size_param::SizeParam;
use crate::storage::{Compress, CyclicLattice, Storage};
use crate::task::search::SearchState;
use crate::task::CandidateRules;
use crate::types::{Dimension, LatticeRules, Real};

/// Where each coordinate's candidate generator values come from.
pub enum CandidatesSpec<L: LatticeRules> {
    /// The same full list for every coordinate.
    PerCoordinate(Vec<L::GenValue>),
    /// A fresh random traversal of the pool per coordinate, moved to an
    /// independent substream each time.
    Random {
        pool: Vec<L::GenValue>,
        traversal: Traversal,
    },
}

impl<L: LatticeRules> CandidatesSpec<L> {
    fn draw(&mut self) -> Vec<L::GenValue> {
        match self {
            CandidatesSpec::PerCoordinate(v) => v.clone(),
            CandidatesSpec::Random { pool, traversal } => {
                let picks = traversal.select(pool);
                traversal.jump();
                picks
            }
        }
    }
}

/// The CBC search driver, generic over the merit-sequence engine.
pub struct CbcSearch<L: LatticeRules, E: CbcEngine<L>> {
    state: SearchState<L>,
    filters: MeritFilterList<L>,
    engine: E,
    candidates: CandidatesSpec<L>,
}

impl<L: LatticeRules, E: CbcEngine<L>> CbcSearch<L, E> {
    pub fn new(
        dimension: Dimension,
        engine: E,
        candidates: CandidatesSpec<L>,
        filters: MeritFilterList<L>,
    ) -> Self {
        CbcSearch {
            state: SearchState::new(dimension),
            filters,
            engine,
            candidates,
        }
    }

    pub fn state(&mut self) -> &mut SearchState<L> {
        &mut self.state
    }

    pub fn filters(&mut self) -> &mut MeritFilterList<L> {
        &mut self.filters
    }

    pub fn cbc(&self) -> &E {
        &self.engine
    }

    pub fn best_lattice(&self) -> Option<&LatDef<L>> {
        self.state.best_lattice()
    }

    pub fn best_merit_value(&self) -> Option<Real> {
        self.state.best_merit_value()
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.state.reset();
    }

    pub fn execute(&mut self) -> Result<()> {
        self.engine.reset();
        self.state.reset();
        for _ in 0..self.state.dimension() {
            let cands = self.candidates.draw();
            let total = cands.len();
            let base = self.engine.base_lat().clone();

            let Self {
                state,
                filters,
                engine,
                ..
            } = self;
            let filters = &*filters;
            let items = engine.merit_seq(&cands).map(|(a, merit)| {
                let lat = base.extended(a);
                let filtered = filters.apply(merit.clone(), &lat);
                ((a, merit), filtered)
            });
            let best = state.scan(items, total);

            match best {
                Some(((a, merit), filtered)) => {
                    self.engine.select(a, merit);
                    let lat = self.engine.base_lat().clone();
                    self.state.select_best_lattice(lat, filtered);
                }
                None => return self.state.fail(),
            }
        }
        Ok(())
    }
}

/// Plain CBC over the coordinate-uniform figure, exhausting the admissible
/// generator values of the modulus every coordinate.
pub fn cbc_search<L: CandidateRules, K: Kernel>(
    size_param: SizeParam<L>,
    dimension: Dimension,
    figure: &CoordUniformFigureOfMerit<K>,
    filters: MeritFilterList<L>,
) -> Result<CbcSearch<L, CoordUniformCbc<L>>> {
    let compress = figure.suggested_compression();
    let storage = Storage::new(size_param, compress)?;
    let engine = CoordUniformCbc::new(storage, figure)?;
    let candidates = L::coprime_candidates(&size_param, compress);
    Ok(CbcSearch::new(
        dimension,
        engine,
        CandidatesSpec::PerCoordinate(candidates),
        filters,
    ))
}

/// CBC over a generic weighted figure of merit; each candidate evaluation
/// is truncated against the best candidate of the current coordinate.
pub fn weighted_cbc_search<L: CandidateRules, M: ProjDepMerit>(
    size_param: SizeParam<L>,
    dimension: Dimension,
    figure: WeightedFigureOfMerit<M>,
    filters: MeritFilterList<L>,
) -> Result<CbcSearch<L, WeightedCbc<L, M>>> {
    let engine = WeightedCbc::new(size_param, figure)?;
    let candidates = L::coprime_candidates(&size_param, Compress::None);
    Ok(CbcSearch::new(
        dimension,
        engine,
        CandidatesSpec::PerCoordinate(candidates),
        filters,
    ))
}

/// CBC with the FFT inner product; candidates run over the unit group of
/// the (base-power) modulus.
pub fn fast_cbc_search<L: CandidateRules + CyclicLattice, K: Kernel>(
    size_param: SizeParam<L>,
    dimension: Dimension,
    figure: &CoordUniformFigureOfMerit<K>,
    filters: MeritFilterList<L>,
) -> Result<CbcSearch<L, CoordUniformFastCbc<L>>> {
    let compress = figure.suggested_compression();
    let storage = Storage::cyclic(size_param, compress)?;
    let candidates = L::inverse_group_candidates(&size_param, compress)?;
    let engine = CoordUniformFastCbc::new(storage, candidates.clone(), figure)?;
    Ok(CbcSearch::new(
        dimension,
        engine,
        CandidatesSpec::PerCoordinate(candidates),
        filters,
    ))
}

/// CBC visiting a bounded random sample of candidates per coordinate.
pub fn random_cbc_search<L: CandidateRules, K: Kernel>(
    size_param: SizeParam<L>,
    dimension: Dimension,
    figure: &CoordUniformFigureOfMerit<K>,
    filters: MeritFilterList<L>,
    n_random: usize,
    rng: Lfsr258,
) -> Result<CbcSearch<L, CoordUniformCbc<L>>> {
    let compress = figure.suggested_compression();
    let storage = Storage::new(size_param, compress)?;
    let engine = CoordUniformCbc::new(storage, figure)?;
    let pool = L::coprime_candidates(&size_param, compress);
    let mut search = CbcSearch::new(
        dimension,
        engine,
        CandidatesSpec::Random {
            pool,
            traversal: Traversal::random(n_random, rng),
        },
        filters,
    );
    search.state().min_element().set_max_accepted_count(n_random);
    Ok(search)
}
