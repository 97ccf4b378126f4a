//! Searches over sequences of complete candidate lattices: exhaustive,
//! Korobov, their random-sampled variants, and modulus extension.

use anyhow::{ensure, Result};

use crate::filters::MeritFilterList;
use crate::lat_def::LatDef;
use crate::lfsr258::Lfsr258;
use crate::merit_seq::{CbcEngine, LatSeqOverCbc};
use crate::size_param::SizeParam;
use crate::task::search::SearchState;
use crate::task::CandidateRules;
use crate::types::{Dimension, Integer, LatticeRules, Real};

/// Lazily enumerates candidate generating vectors.
pub enum LatSeq<L: LatticeRules> {
    /// Explicit list (evaluation tasks).
    Explicit {
        size: SizeParam<L>,
        vectors: Vec<Vec<L::GenValue>>,
    },
    /// Cartesian product of per-coordinate candidate lists.
    Exhaustive {
        size: SizeParam<L>,
        per_coord: Vec<Vec<L::GenValue>>,
    },
    /// `(1, a, a^2, ...)` for each candidate `a`.
    Korobov {
        size: SizeParam<L>,
        candidates: Vec<L::GenValue>,
        dimension: Dimension,
    },
    /// Random vectors from the cartesian product.
    Random {
        size: SizeParam<L>,
        per_coord: Vec<Vec<L::GenValue>>,
        count: usize,
        rng: Lfsr258,
    },
    /// Random Korobov parameters.
    RandomKorobov {
        size: SizeParam<L>,
        candidates: Vec<L::GenValue>,
        dimension: Dimension,
        count: usize,
        rng: Lfsr258,
    },
}

impl<L: CandidateRules> LatSeq<L> {
    pub fn count(&self) -> usize {
        match self {
            LatSeq::Explicit { vectors, .. } => vectors.len(),
            LatSeq::Exhaustive { per_coord, .. } => {
                per_coord.iter().map(Vec::len).product()
            }
            LatSeq::Korobov { candidates, .. } => candidates.len(),
            LatSeq::Random { count, .. } | LatSeq::RandomKorobov { count, .. } => *count,
        }
    }

    /// A lazy iterator over the candidate lattices.
    fn iter(&mut self) -> Box<dyn Iterator<Item = LatDef<L>> + '_> {
        match self {
            LatSeq::Explicit { size, vectors } => {
                let size = *size;
                Box::new(
                    vectors
                        .clone()
                        .into_iter()
                        .map(move |v| LatDef::with_gen(size, v)),
                )
            }
            LatSeq::Exhaustive { size, per_coord } => {
                let size = *size;
                let per_coord = per_coord.clone();
                let mut digits = vec![0usize; per_coord.len()];
                let mut done = per_coord.iter().any(Vec::is_empty);
                Box::new(std::iter::from_fn(move || {
                    if done {
                        return None;
                    }
                    let gen: Vec<L::GenValue> = digits
                        .iter()
                        .enumerate()
                        .map(|(j, &d)| per_coord[j][d])
                        .collect();
                    // Odometer step, last coordinate fastest.
                    let mut j = per_coord.len();
                    loop {
                        if j == 0 {
                            done = true;
                            break;
                        }
                        j -= 1;
                        digits[j] += 1;
                        if digits[j] < per_coord[j].len() {
                            break;
                        }
                        digits[j] = 0;
                    }
                    Some(LatDef::with_gen(size, gen))
                }))
            }
            LatSeq::Korobov {
                size,
                candidates,
                dimension,
            } => {
                let size = *size;
                let dimension = *dimension;
                let modulus = size.modulus();
                Box::new(candidates.clone().into_iter().map(move |a| {
                    LatDef::with_gen(size, L::korobov_vector(&a, dimension, &modulus))
                }))
            }
            LatSeq::Random {
                size,
                per_coord,
                count,
                rng,
            } => {
                let size = *size;
                let per_coord = per_coord.clone();
                let count = *count;
                let mut drawn = 0usize;
                Box::new(std::iter::from_fn(move || {
                    if drawn >= count {
                        return None;
                    }
                    drawn += 1;
                    let gen: Vec<L::GenValue> = per_coord
                        .iter()
                        .map(|pool| pool[rng.next_index(pool.len())])
                        .collect();
                    rng.jump();
                    Some(LatDef::with_gen(size, gen))
                }))
            }
            LatSeq::RandomKorobov {
                size,
                candidates,
                dimension,
                count,
                rng,
            } => {
                let size = *size;
                let dimension = *dimension;
                let modulus = size.modulus();
                let candidates = candidates.clone();
                let count = *count;
                let mut drawn = 0usize;
                Box::new(std::iter::from_fn(move || {
                    if drawn >= count {
                        return None;
                    }
                    drawn += 1;
                    let a = candidates[rng.next_index(candidates.len())];
                    rng.jump();
                    Some(LatDef::with_gen(
                        size,
                        L::korobov_vector(&a, dimension, &modulus),
                    ))
                }))
            }
        }
    }
}

/// Search over a lattice sequence: every candidate's full merit comes from
/// a fresh CBC pass, and a single best lattice is selected at the end.
pub struct LatSeqSearch<L: LatticeRules, E: CbcEngine<L>> {
    state: SearchState<L>,
    filters: MeritFilterList<L>,
    seq_over_cbc: LatSeqOverCbc<L, E>,
    lat_seq: LatSeq<L>,
}

impl<L: CandidateRules, E: CbcEngine<L>> LatSeqSearch<L, E> {
    pub fn new(
        dimension: Dimension,
        engine: E,
        lat_seq: LatSeq<L>,
        filters: MeritFilterList<L>,
    ) -> Self {
        LatSeqSearch {
            state: SearchState::new(dimension),
            filters,
            seq_over_cbc: LatSeqOverCbc::new(engine),
            lat_seq,
        }
    }

    pub fn state(&mut self) -> &mut SearchState<L> {
        &mut self.state
    }

    pub fn filters(&mut self) -> &mut MeritFilterList<L> {
        &mut self.filters
    }

    pub fn best_lattice(&self) -> Option<&LatDef<L>> {
        self.state.best_lattice()
    }

    pub fn best_merit_value(&self) -> Option<Real> {
        self.state.best_merit_value()
    }

    pub fn execute(&mut self) -> Result<()> {
        self.state.reset();
        let total = self.lat_seq.count();

        let Self {
            state,
            filters,
            seq_over_cbc,
            lat_seq,
        } = self;
        let filters = &*filters;

        let items = lat_seq.iter().map(|lat| {
            let merit = seq_over_cbc.merit_of(&lat);
            let filtered = filters.apply(merit, &lat);
            (lat, filtered)
        });
        let best = state.scan(items, total);

        match best {
            Some((lat, merit)) => {
                self.state.select_best_lattice(lat, merit);
                Ok(())
            }
            None => self.state.fail(),
        }
    }
}

/// Per-coordinate candidate lists for exhaustive-style searches: the first
/// coordinate is frozen to 1, the others run over the admissible values.
pub fn exhaustive_per_coord<L: CandidateRules>(
    size: &SizeParam<L>,
    dimension: Dimension,
) -> Vec<Vec<L::GenValue>> {
    let all = L::coprime_candidates(size, crate::storage::Compress::None);
    let mut per_coord = vec![vec![L::gen_one()]];
    per_coord.extend(std::iter::repeat(all).take(dimension.saturating_sub(1)));
    per_coord
}

/// Candidate lists for the extension of a base lattice: coordinate `j`
/// runs over the values congruent to the base generator modulo the base
/// size, filtered for admissibility at the extended size.
pub fn extend_per_coord(
    extended_modulus: Integer,
    base_modulus: Integer,
    base_gen: &[Integer],
) -> Result<Vec<Vec<Integer>>> {
    ensure!(
        base_modulus >= 1 && extended_modulus % base_modulus == 0,
        "the base size {base_modulus} must divide the extended size {extended_modulus}"
    );
    use crate::genseq::IndexedSequence;
    Ok(base_gen
        .iter()
        .map(|&low| {
            crate::genseq::ExtendSeq::new(extended_modulus, base_modulus, low % base_modulus)
                .iter()
                .filter(|&v| latnet_util::is_coprime(v, extended_modulus))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::CoordUniformFigureOfMerit;
    use crate::kernel::PAlpha;
    use crate::merit_seq::CoordUniformCbc;
    use crate::storage::{Compress, Storage};
    use crate::types::OrdinaryLattice;
    use crate::weights::{ProductWeights, Weights};

    fn engine(n: u64) -> CoordUniformCbc<OrdinaryLattice> {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(n).unwrap();
        let figure = CoordUniformFigureOfMerit::new(
            PAlpha::new(2).unwrap(),
            Weights::Product(ProductWeights::uniform(0.7)),
            1.0,
        );
        let storage = Storage::new(sp, Compress::Symmetric).unwrap();
        CoordUniformCbc::new(storage, &figure).unwrap()
    }

    #[test]
    fn korobov_search_beats_most_candidates() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(31).unwrap();
        let candidates = OrdinaryLattice::coprime_candidates(&sp, Compress::None);
        let seq = LatSeq::Korobov {
            size: sp,
            candidates,
            dimension: 3,
        };
        let mut search = LatSeqSearch::new(3, engine(31), seq, MeritFilterList::new());
        search.execute().unwrap();
        let best = search.best_lattice().unwrap();
        assert_eq!(best.dimension(), 3);
        assert_eq!(best.gen()[0], 1);
        // The best Korobov merit is no worse than the a = 1 vector.
        let merit_ones = {
            let mut seq = LatSeqOverCbc::new(engine(31));
            seq.merit_of(&LatDef::with_gen(sp, vec![1, 1, 1])).scalar()
        };
        assert!(search.best_merit_value().unwrap() <= merit_ones + 1e-15);
    }

    #[test]
    fn exhaustive_search_small_space() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(8).unwrap();
        let per_coord = exhaustive_per_coord(&sp, 2);
        assert_eq!(per_coord[0], vec![1]);
        assert_eq!(per_coord[1].len(), 4);
        let seq = LatSeq::Exhaustive {
            size: sp,
            per_coord,
        };
        assert_eq!(seq.count(), 4);
        let mut search = LatSeqSearch::new(2, engine(8), seq, MeritFilterList::new());
        search.execute().unwrap();
        // The global optimum over 4 candidates: exhaustive must find the
        // minimum of all their merits.
        let mut seq_ref = LatSeqOverCbc::new(engine(8));
        let min_ref = [1u64, 3, 5, 7]
            .iter()
            .map(|&a| seq_ref.merit_of(&LatDef::with_gen(sp, vec![1, a])).scalar())
            .fold(Real::INFINITY, Real::min);
        let got = search.best_merit_value().unwrap();
        assert!((got - min_ref).abs() <= 1e-12 * min_ref.abs());
    }

    #[test]
    fn random_korobov_draws_count_vectors() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(101).unwrap();
        let candidates = OrdinaryLattice::coprime_candidates(&sp, Compress::None);
        let seq = LatSeq::RandomKorobov {
            size: sp,
            candidates,
            dimension: 4,
            count: 7,
            rng: Lfsr258::default(),
        };
        let mut search = LatSeqSearch::new(4, engine(101), seq, MeritFilterList::new());
        search.execute().unwrap();
        assert!(search.best_merit_value().unwrap().is_finite());
    }

    #[test]
    fn extend_candidates_restrict_to_base() {
        let per_coord = extend_per_coord(32, 8, &[1, 5]).unwrap();
        for (j, pool) in per_coord.iter().enumerate() {
            assert!(!pool.is_empty());
            for &v in pool {
                assert_eq!(v % 8, [1, 5][j]);
                assert!(latnet_util::is_coprime(v, 32));
            }
        }
    }
}
