use core::fmt::{Debug, Display};
use core::hash::Hash;
use core::ops::Range;

use latnet_gf2::Gf2Poly;
use latnet_util::{euler_totient, is_coprime, is_prime, mul_mod};

/// Scalar type of merit values and kernel values.
pub type Real = f64;

/// Index and modulus type for ordinary lattices.
pub type Integer = u64;

/// Level index of an embedded (multilevel) lattice.
pub type Level = usize;

/// Number of coordinates of a point set.
pub type Dimension = usize;

/// Contiguous index interval of one embedding level inside a storage vector.
pub type LevelRange = Range<usize>;

/// The arithmetic rules of a lattice family: how generating values combine
/// with point indices, and how point indices map onto the kernel grid.
///
/// Two implementations exist, [`OrdinaryLattice`] (integers modulo `n`) and
/// [`PolynomialLattice`] (polynomials over GF(2) modulo `P(z)`). All engine
/// components are generic over this trait; the closed set of implementations
/// plays the role the per-family specializations play in comparable engines.
pub trait LatticeRules:
    Copy + Clone + Eq + Ord + Hash + Debug + Default + 'static
{
    type GenValue: Copy + Clone + PartialEq + Eq + PartialOrd + Ord + Hash + Debug + Display + 'static;
    type Modulus: Copy + Clone + PartialEq + Eq + PartialOrd + Ord + Hash + Debug + Display + 'static;

    const NAME: &'static str;

    /// Whether the `x -> 1 - x` symmetric fold is defined for this family.
    const SUPPORTS_SYMMETRIC: bool;

    /// Number of points of the rank-1 lattice with this modulus.
    fn num_points(modulus: &Self::Modulus) -> Integer;

    /// Writes `modulus` as `base^level` with `base` a valid embedding base,
    /// if it has that shape.
    fn factor_prime_power(modulus: &Self::Modulus) -> Option<(Self::Modulus, Level)>;

    /// `base^exp`, the modulus of level `exp` of an embedded lattice.
    fn modulus_pow(base: &Self::Modulus, exp: Level) -> Self::Modulus;

    /// Whether `base` is acceptable as the base of an embedded lattice
    /// (prime integer, or irreducible polynomial).
    fn is_valid_base(base: &Self::Modulus) -> bool;

    /// The order of the group of units modulo `modulus`.
    fn totient(modulus: &Self::Modulus) -> Integer;

    /// The bit-coefficient map from generating values to indices.
    fn gen_to_index(a: &Self::GenValue) -> Integer;

    /// Inverse of [`LatticeRules::gen_to_index`].
    fn index_to_gen(i: Integer) -> Self::GenValue;

    fn gen_one() -> Self::GenValue;

    /// The index of `a * i mod modulus`, where `i` is read as a generating
    /// value through the bit-coefficient map.
    fn stride_index(a: &Self::GenValue, i: Integer, modulus: &Self::Modulus) -> Integer;

    /// The index of `i * factor`, where `factor` divides `modulus` exactly;
    /// used to embed level-`k` units into the full index range.
    fn scale_index(i: Integer, factor: &Self::Modulus, modulus: &Self::Modulus) -> Integer;

    /// The index of `-i mod modulus`; the reflection underlying symmetric
    /// compression. The identity in characteristic 2.
    fn reflect_index(i: Integer, modulus: &Self::Modulus) -> Integer;

    /// Maps the storage index `i` to the index of its kernel grid point.
    ///
    /// Ordinary lattices sample the kernel at `i / n` directly. Polynomial
    /// lattices sample it at the `m`-term truncated Laurent expansion of
    /// `i(z) / P(z)`, rendered back to an integer.
    fn to_kernel_index(i: Integer, modulus: &Self::Modulus) -> Integer;

    /// Whether `a` generates a full-period coordinate for this modulus.
    fn is_valid_gen(a: &Self::GenValue, modulus: &Self::Modulus) -> bool;
}

/// Rank-1 lattices over the integers modulo `n`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct OrdinaryLattice;

impl LatticeRules for OrdinaryLattice {
    type GenValue = Integer;
    type Modulus = Integer;

    const NAME: &'static str = "ordinary";
    const SUPPORTS_SYMMETRIC: bool = true;

    fn num_points(modulus: &Integer) -> Integer {
        *modulus
    }

    fn factor_prime_power(modulus: &Integer) -> Option<(Integer, Level)> {
        let factors = latnet_util::prime_factorization(*modulus);
        match factors.as_slice() {
            [(p, e)] => Some((*p, *e as Level)),
            _ => None,
        }
    }

    fn modulus_pow(base: &Integer, exp: Level) -> Integer {
        latnet_util::checked_pow(*base, exp as u32)
    }

    fn is_valid_base(base: &Integer) -> bool {
        is_prime(*base)
    }

    fn totient(modulus: &Integer) -> Integer {
        euler_totient(*modulus)
    }

    fn gen_to_index(a: &Integer) -> Integer {
        *a
    }

    fn index_to_gen(i: Integer) -> Integer {
        i
    }

    fn gen_one() -> Integer {
        1
    }

    fn stride_index(a: &Integer, i: Integer, modulus: &Integer) -> Integer {
        mul_mod(*a, i, *modulus)
    }

    fn scale_index(i: Integer, factor: &Integer, modulus: &Integer) -> Integer {
        mul_mod(i, *factor, *modulus)
    }

    fn reflect_index(i: Integer, modulus: &Integer) -> Integer {
        if i == 0 {
            0
        } else {
            *modulus - i
        }
    }

    fn to_kernel_index(i: Integer, _modulus: &Integer) -> Integer {
        i
    }

    fn is_valid_gen(a: &Integer, modulus: &Integer) -> bool {
        *modulus == 1 || (*a < *modulus && is_coprime(*a, *modulus))
    }
}

/// Rank-1 polynomial lattices over GF(2)[z] modulo `P(z)`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct PolynomialLattice;

impl LatticeRules for PolynomialLattice {
    type GenValue = Gf2Poly;
    type Modulus = Gf2Poly;

    const NAME: &'static str = "polynomial";
    const SUPPORTS_SYMMETRIC: bool = false;

    fn num_points(modulus: &Gf2Poly) -> Integer {
        1u64 << modulus.degree().expect("zero polynomial modulus")
    }

    fn factor_prime_power(modulus: &Gf2Poly) -> Option<(Gf2Poly, Level)> {
        modulus.is_irreducible().then_some((*modulus, 1))
    }

    fn modulus_pow(base: &Gf2Poly, exp: Level) -> Gf2Poly {
        let mut acc = Gf2Poly::ONE;
        for _ in 0..exp {
            acc = acc.mul(*base);
        }
        acc
    }

    fn is_valid_base(base: &Gf2Poly) -> bool {
        base.is_irreducible()
    }

    fn totient(modulus: &Gf2Poly) -> Integer {
        let d = modulus.degree().expect("zero polynomial modulus");
        if modulus.is_irreducible() {
            return (1u64 << d) - 1;
        }
        // Composite moduli: count the units directly.
        assert!(d <= 24, "unit count of a degree-{d} composite modulus");
        (1u64..1 << d)
            .filter(|&i| Gf2Poly(i).gcd(*modulus).degree() == Some(0))
            .count() as Integer
    }

    fn gen_to_index(a: &Gf2Poly) -> Integer {
        a.coeff_bits()
    }

    fn index_to_gen(i: Integer) -> Gf2Poly {
        Gf2Poly::from_coeff_bits(i)
    }

    fn gen_one() -> Gf2Poly {
        Gf2Poly::ONE
    }

    fn stride_index(a: &Gf2Poly, i: Integer, modulus: &Gf2Poly) -> Integer {
        Gf2Poly::from_coeff_bits(i).mul_mod(*a, *modulus).coeff_bits()
    }

    fn scale_index(i: Integer, factor: &Gf2Poly, modulus: &Gf2Poly) -> Integer {
        Gf2Poly::from_coeff_bits(i).mul_mod(*factor, *modulus).coeff_bits()
    }

    fn reflect_index(i: Integer, _modulus: &Gf2Poly) -> Integer {
        i
    }

    fn to_kernel_index(i: Integer, modulus: &Gf2Poly) -> Integer {
        let m = modulus.degree().expect("zero polynomial modulus");
        assert!(m <= 31);
        // The first m Laurent coefficients of i(z)/P(z) are the bits of
        // floor(i(z) z^m / P(z)), most significant first.
        let shifted = Gf2Poly::from_coeff_bits(i << m);
        shifted.div_rem(*modulus).0.coeff_bits()
    }

    fn is_valid_gen(a: &Gf2Poly, modulus: &Gf2Poly) -> bool {
        !a.is_zero() && a.gcd(*modulus).degree() == Some(0)
    }
}

/// A merit value: a scalar for unilevel point sets, one value per embedding
/// level for multilevel ones.
#[derive(Clone, Debug, PartialEq)]
pub enum MeritValue {
    Scalar(Real),
    PerLevel(Vec<Real>),
}

impl MeritValue {
    pub fn scalar(self) -> Real {
        match self {
            MeritValue::Scalar(x) => x,
            MeritValue::PerLevel(v) => *v.last().expect("empty multilevel merit"),
        }
    }

    pub fn add_assign(&mut self, rhs: &MeritValue) {
        match (self, rhs) {
            (MeritValue::Scalar(a), MeritValue::Scalar(b)) => *a += b,
            (MeritValue::PerLevel(a), MeritValue::PerLevel(b)) => {
                assert_eq!(a.len(), b.len(), "level count mismatch");
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
            }
            _ => panic!("cannot mix scalar and multilevel merit values"),
        }
    }

    /// Overwrites every entry with `value`.
    pub fn fill(&mut self, value: Real) {
        match self {
            MeritValue::Scalar(x) => *x = value,
            MeritValue::PerLevel(v) => v.fill(value),
        }
    }
}

impl Display for MeritValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MeritValue::Scalar(x) => write!(f, "{x}"),
            MeritValue::PerLevel(v) => {
                write!(f, "[")?;
                for (k, x) in v.iter().enumerate() {
                    if k > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_stride_wraps() {
        let n = 31u64;
        assert_eq!(OrdinaryLattice::stride_index(&12, 3, &n), 5);
        assert_eq!(OrdinaryLattice::stride_index(&30, 30, &n), 900 % 31);
    }

    #[test]
    fn ordinary_gen_validity() {
        assert!(OrdinaryLattice::is_valid_gen(&5, &12));
        assert!(!OrdinaryLattice::is_valid_gen(&6, &12));
        assert!(!OrdinaryLattice::is_valid_gen(&13, &12));
    }

    #[test]
    fn polynomial_kernel_index_expands_laurent() {
        // P = z^3 + z + 1. 1/P = z^-3 + z^-4 + ..., so the first 3 Laurent
        // coefficients of 1(z)/P(z) are (0, 0, 1) -> index 1.
        let p = Gf2Poly(0b1011);
        assert_eq!(PolynomialLattice::to_kernel_index(1, &p), 1);
        // z^2 / P = z^-1 + ... : leading coefficient 1 -> index >= 4.
        assert!(PolynomialLattice::to_kernel_index(0b100, &p) >= 4);
        // 0 maps to 0.
        assert_eq!(PolynomialLattice::to_kernel_index(0, &p), 0);
    }

    #[test]
    fn polynomial_kernel_index_is_a_permutation() {
        let p = Gf2Poly(0b10011); // z^4 + z + 1
        let mut seen: Vec<Integer> =
            (0..16).map(|i| PolynomialLattice::to_kernel_index(i, &p)).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn polynomial_totient_of_irreducible() {
        assert_eq!(PolynomialLattice::totient(&Gf2Poly(0b1011)), 7);
        // (z^2+z+1)^2 has 2^4 - 2^2 units... counted directly.
        let sq = Gf2Poly(0b111).mul(Gf2Poly(0b111));
        assert_eq!(
            PolynomialLattice::totient(&sq),
            (1u64..16).filter(|&i| Gf2Poly(i).gcd(sq).degree() == Some(0)).count() as u64
        );
    }

    #[test]
    fn merit_value_addition() {
        let mut a = MeritValue::PerLevel(vec![1.0, 2.0]);
        a.add_assign(&MeritValue::PerLevel(vec![0.5, 0.25]));
        assert_eq!(a, MeritValue::PerLevel(vec![1.5, 2.25]));
        assert_eq!(a.scalar(), 2.25);
    }
}
