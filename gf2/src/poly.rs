use core::fmt;
use core::ops::{Add, AddAssign, BitXor, BitXorAssign};

use latnet_util::prime_factorization;
use serde::{Deserialize, Serialize};

/// A polynomial over GF(2) in dense bit representation.
///
/// Bit `k` of the backing word is the coefficient of `z^k`, so the integer
/// value of the word is `sum a_k 2^k`, the usual bit-coefficient map between
/// polynomials and indices. Degrees are limited to 63.
#[derive(
    Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Gf2Poly(pub u64);

impl Gf2Poly {
    pub const ZERO: Self = Gf2Poly(0);
    pub const ONE: Self = Gf2Poly(1);

    /// The monomial `z`.
    pub const Z: Self = Gf2Poly(2);

    pub const fn from_coeff_bits(bits: u64) -> Self {
        Gf2Poly(bits)
    }

    pub const fn coeff_bits(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The degree of the polynomial. The zero polynomial has no degree.
    pub fn degree(self) -> Option<usize> {
        if self.is_zero() {
            None
        } else {
            Some(63 - self.0.leading_zeros() as usize)
        }
    }

    pub fn coeff(self, k: usize) -> bool {
        k < 64 && (self.0 >> k) & 1 == 1
    }

    /// Carry-less product. The degrees must sum below 64; use
    /// [`Gf2Poly::mul_mod`] otherwise.
    pub fn mul(self, rhs: Self) -> Self {
        if let (Some(da), Some(db)) = (self.degree(), rhs.degree()) {
            assert!(da + db < 64, "product degree {} overflows", da + db);
        }
        Gf2Poly(clmul(self.0, rhs.0) as u64)
    }

    /// Euclidean division, returning `(quotient, remainder)`.
    ///
    /// Panics if `rhs` is zero.
    pub fn div_rem(self, rhs: Self) -> (Self, Self) {
        let dm = rhs.degree().expect("division by the zero polynomial");
        let mut rem = self.0;
        let mut quot = 0u64;
        while let Some(dr) = Gf2Poly(rem).degree() {
            if dr < dm {
                break;
            }
            let shift = dr - dm;
            quot |= 1 << shift;
            rem ^= rhs.0 << shift;
        }
        (Gf2Poly(quot), Gf2Poly(rem))
    }

    pub fn rem(self, rhs: Self) -> Self {
        self.div_rem(rhs).1
    }

    /// `self * rhs mod modulus`, with a 128-bit intermediate product.
    pub fn mul_mod(self, rhs: Self, modulus: Self) -> Self {
        let dm = modulus.degree().expect("zero modulus") as u32;
        let mut prod = clmul(self.0, rhs.0);
        while prod != 0 {
            let dp = 127 - prod.leading_zeros();
            if dp < dm {
                break;
            }
            prod ^= (modulus.0 as u128) << (dp - dm);
        }
        Gf2Poly(prod as u64)
    }

    pub fn pow_mod(self, mut exp: u64, modulus: Self) -> Self {
        let mut result = Gf2Poly::ONE.rem(modulus);
        let mut base = self.rem(modulus);
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.mul_mod(base, modulus);
            }
            base = base.mul_mod(base, modulus);
            exp >>= 1;
        }
        result
    }

    pub fn gcd(self, rhs: Self) -> Self {
        let (mut a, mut b) = (self, rhs);
        while !b.is_zero() {
            let r = a.rem(b);
            a = b;
            b = r;
        }
        a
    }

    /// Rabin's irreducibility test: `f` of degree `d` is irreducible iff
    /// `z^(2^d) = z (mod f)` and `gcd(z^(2^(d/q)) - z, f) = 1` for every
    /// prime `q` dividing `d`.
    pub fn is_irreducible(self) -> bool {
        let d = match self.degree() {
            None | Some(0) => return false,
            Some(d) => d,
        };
        if d == 1 {
            return true;
        }
        // z^(2^k) mod f by k successive squarings.
        let frobenius = |k: usize| -> Gf2Poly {
            let mut x = Gf2Poly::Z.rem(self);
            for _ in 0..k {
                x = x.mul_mod(x, self);
            }
            x
        };
        if frobenius(d) != Gf2Poly::Z.rem(self) {
            return false;
        }
        for (q, _) in prime_factorization(d as u64) {
            let h = frobenius(d / q as usize) + Gf2Poly::Z.rem(self);
            if self.gcd(h).degree() != Some(0) {
                return false;
            }
        }
        true
    }
}

fn clmul(a: u64, b: u64) -> u128 {
    let mut prod = 0u128;
    let mut b = b;
    let mut shift = 0;
    while b != 0 {
        let k = b.trailing_zeros();
        shift += k;
        prod ^= (a as u128) << shift;
        b >>= k + 1;
        shift += 1;
    }
    prod
}

impl Add for Gf2Poly {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Gf2Poly(self.0 ^ rhs.0)
    }
}

impl AddAssign for Gf2Poly {
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl BitXor for Gf2Poly {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Gf2Poly(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for Gf2Poly {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl fmt::Display for Gf2Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for k in (0..64).rev() {
            if self.coeff(k) {
                if !first {
                    write!(f, "+")?;
                }
                match k {
                    0 => write!(f, "1")?,
                    1 => write!(f, "z")?,
                    _ => write!(f, "z^{k}")?,
                }
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Gf2Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gf2Poly({:#b})", self.0)
    }
}
