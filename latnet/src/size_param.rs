use core::fmt;

use anyhow::{ensure, Result};

use crate::types::{Integer, LatticeRules, Level, MeritValue, Real};

/// Whether a point set is a single lattice or a nested (embedded) family.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Embedding {
    Unilevel,
    Multilevel,
}

/// The size of a point set: a plain modulus, or a base with a maximum level
/// for embedded families with `num_points(k) = num_points(base)^k`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum SizeParam<L: LatticeRules> {
    Unilevel { modulus: L::Modulus },
    Multilevel { base: L::Modulus, max_level: Level },
}

impl<L: LatticeRules> SizeParam<L> {
    pub fn unilevel(modulus: L::Modulus) -> Result<Self> {
        ensure!(
            L::num_points(&modulus) >= 1,
            "invalid modulus {modulus}: must describe at least one point"
        );
        Ok(SizeParam::Unilevel { modulus })
    }

    pub fn multilevel(base: L::Modulus, max_level: Level) -> Result<Self> {
        ensure!(
            L::num_points(&base) >= 2,
            "invalid embedding base {base}: must describe at least two points"
        );
        ensure!(
            L::is_valid_base(&base),
            "invalid embedding base {base} for {} lattices",
            L::NAME
        );
        Ok(SizeParam::Multilevel { base, max_level })
    }

    pub fn embedding(&self) -> Embedding {
        match self {
            SizeParam::Unilevel { .. } => Embedding::Unilevel,
            SizeParam::Multilevel { .. } => Embedding::Multilevel,
        }
    }

    /// The modulus of the full point set (`base^max_level` for embedded
    /// families).
    pub fn modulus(&self) -> L::Modulus {
        match self {
            SizeParam::Unilevel { modulus } => *modulus,
            SizeParam::Multilevel { base, max_level } => L::modulus_pow(base, *max_level),
        }
    }

    pub fn num_points(&self) -> Integer {
        L::num_points(&self.modulus())
    }

    pub fn num_points_at_level(&self, level: Level) -> Integer {
        match self {
            SizeParam::Unilevel { .. } => {
                assert_eq!(level, 0, "unilevel lattices have a single level");
                self.num_points()
            }
            SizeParam::Multilevel { base, max_level } => {
                assert!(level <= *max_level, "level {level} exceeds {max_level}");
                L::num_points(&L::modulus_pow(base, level))
            }
        }
    }

    pub fn max_level(&self) -> Level {
        match self {
            SizeParam::Unilevel { .. } => 0,
            SizeParam::Multilevel { max_level, .. } => *max_level,
        }
    }

    /// The number of admissible generator values for the full modulus.
    pub fn totient(&self) -> Integer {
        let m = self.modulus();
        if L::num_points(&m) == 1 {
            1
        } else {
            L::totient(&m)
        }
    }

    /// Divides `merit` by the number of points; for embedded families each
    /// entry is divided by its per-level count.
    pub fn normalize(&self, merit: &mut MeritValue) {
        match (self, merit) {
            (SizeParam::Unilevel { .. }, MeritValue::Scalar(x)) => {
                *x /= self.num_points() as Real;
            }
            (SizeParam::Multilevel { .. }, MeritValue::PerLevel(v)) => {
                assert_eq!(v.len(), self.max_level() + 1, "level count mismatch");
                for (k, x) in v.iter_mut().enumerate() {
                    *x /= self.num_points_at_level(k) as Real;
                }
            }
            _ => panic!("merit value shape does not match the size parameter"),
        }
    }
}

impl<L: LatticeRules> fmt::Display for SizeParam<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeParam::Unilevel { modulus } => write!(f, "{modulus}"),
            SizeParam::Multilevel { base, max_level } => write!(f, "{base}^{max_level}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use latnet_gf2::Gf2Poly;

    use super::*;
    use crate::types::{OrdinaryLattice, PolynomialLattice};

    #[test]
    fn ordinary_multilevel_sizes() {
        let sp = SizeParam::<OrdinaryLattice>::multilevel(2, 8).unwrap();
        assert_eq!(sp.num_points(), 256);
        assert_eq!(sp.num_points_at_level(0), 1);
        assert_eq!(sp.num_points_at_level(3), 8);
        assert_eq!(sp.totient(), 128);
    }

    #[test]
    fn multilevel_base_must_be_prime() {
        assert!(SizeParam::<OrdinaryLattice>::multilevel(6, 3).is_err());
        assert!(SizeParam::<OrdinaryLattice>::multilevel(3, 4).is_ok());
    }

    #[test]
    fn polynomial_base_must_be_irreducible() {
        assert!(SizeParam::<PolynomialLattice>::multilevel(Gf2Poly(0b101), 2).is_err());
        let sp = SizeParam::<PolynomialLattice>::multilevel(Gf2Poly(0b111), 2).unwrap();
        assert_eq!(sp.num_points(), 16);
    }

    #[test]
    fn normalize_divides_per_level() {
        let sp = SizeParam::<OrdinaryLattice>::multilevel(2, 2).unwrap();
        let mut merit = MeritValue::PerLevel(vec![1.0, 1.0, 1.0]);
        sp.normalize(&mut merit);
        assert_eq!(merit, MeritValue::PerLevel(vec![1.0, 0.5, 0.25]));

        let sp = SizeParam::<OrdinaryLattice>::unilevel(10).unwrap();
        let mut merit = MeritValue::Scalar(5.0);
        sp.normalize(&mut merit);
        assert_eq!(merit, MeritValue::Scalar(0.5));
    }

    #[test]
    fn single_point_lattice() {
        let sp = SizeParam::<OrdinaryLattice>::unilevel(1).unwrap();
        assert_eq!(sp.num_points(), 1);
        assert_eq!(sp.totient(), 1);
    }
}
