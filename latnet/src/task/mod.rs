//! Search drivers: exhaustive, Korobov, random variants, CBC and fast CBC,
//! extension, evaluation.

pub mod cbc;
pub mod eval;
pub mod lat_seq;
pub mod min_element;
pub mod result;
pub mod search;

pub use cbc::{
    cbc_search, fast_cbc_search, random_cbc_search, weighted_cbc_search, CandidatesSpec,
    CbcSearch,
};
pub use eval::Eval;
pub use lat_seq::{exhaustive_per_coord, extend_per_coord, LatSeq, LatSeqSearch};
pub use min_element::MinElement;
pub use result::SearchResult;
pub use search::SearchState;

use anyhow::Result;
use latnet_gf2::Gf2Poly;
use latnet_util::pow_mod;

use crate::genseq::{
    CoprimeIntegers, CoprimePolynomials, CyclicGroup, GroupOrder, IndexedSequence,
    PolyCyclicGroup,
};
use crate::size_param::SizeParam;
use crate::storage::{as_multilevel, Compress};
use crate::types::{Integer, LatticeRules, OrdinaryLattice, PolynomialLattice};

/// How a lattice family enumerates its candidate generator values; the
/// driver constructors are generic over this.
pub trait CandidateRules: LatticeRules {
    /// All admissible generator values for the modulus, in canonical order
    /// (folded under symmetric compression).
    fn coprime_candidates(size: &SizeParam<Self>, compress: Compress) -> Vec<Self::GenValue>;

    /// The unit group in inverse-generator order: the candidate order the
    /// FFT inner product produces merits in.
    fn inverse_group_candidates(
        size: &SizeParam<Self>,
        compress: Compress,
    ) -> Result<Vec<Self::GenValue>>;

    /// The Korobov vector `(1, a, a^2, ...)`.
    fn korobov_vector(
        a: &Self::GenValue,
        dimension: usize,
        modulus: &Self::Modulus,
    ) -> Vec<Self::GenValue>;
}

impl CandidateRules for OrdinaryLattice {
    fn coprime_candidates(size: &SizeParam<Self>, compress: Compress) -> Vec<Integer> {
        CoprimeIntegers::new(size.modulus(), compress).to_vec()
    }

    fn inverse_group_candidates(
        size: &SizeParam<Self>,
        compress: Compress,
    ) -> Result<Vec<Integer>> {
        let (base, max_level) = match as_multilevel(size)? {
            SizeParam::Multilevel { base, max_level } => (base, max_level),
            SizeParam::Unilevel { .. } => unreachable!(),
        };
        let group = CyclicGroup::new(base, max_level, compress, GroupOrder::Inverse)?;
        Ok(group.to_vec())
    }

    fn korobov_vector(a: &Integer, dimension: usize, modulus: &Integer) -> Vec<Integer> {
        (0..dimension as u64).map(|j| pow_mod(*a, j, *modulus)).collect()
    }
}

impl CandidateRules for PolynomialLattice {
    fn coprime_candidates(size: &SizeParam<Self>, _compress: Compress) -> Vec<Gf2Poly> {
        CoprimePolynomials::new(size.modulus()).to_vec()
    }

    fn inverse_group_candidates(
        size: &SizeParam<Self>,
        _compress: Compress,
    ) -> Result<Vec<Gf2Poly>> {
        anyhow::ensure!(
            size.max_level() <= 1,
            "embedded polynomial lattices have no cyclic unit group"
        );
        let group = PolyCyclicGroup::new(size.modulus(), GroupOrder::Inverse)?;
        Ok(group.to_vec())
    }

    fn korobov_vector(a: &Gf2Poly, dimension: usize, modulus: &Gf2Poly) -> Vec<Gf2Poly> {
        (0..dimension as u64).map(|j| a.pow_mod(j, *modulus)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korobov_vectors_start_at_one() {
        let v = OrdinaryLattice::korobov_vector(&5, 4, &31);
        assert_eq!(v, vec![1, 5, 25, 125 % 31]);

        let p = Gf2Poly(0b1011);
        let v = PolynomialLattice::korobov_vector(&Gf2Poly(0b10), 3, &p);
        assert_eq!(v[0], Gf2Poly::ONE);
        assert_eq!(v[1], Gf2Poly(0b10));
        assert_eq!(v[2], Gf2Poly(0b100));
    }

    #[test]
    fn inverse_candidates_cover_the_units() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(27).unwrap();
        let cands = OrdinaryLattice::inverse_group_candidates(&sp, Compress::None).unwrap();
        assert_eq!(cands.len(), 18);
        let mut sorted = cands.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 18);
    }
}
