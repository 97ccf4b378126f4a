//! Integers (and polynomials) coprime with a modulus, in CRT order.

use latnet_gf2::Gf2Poly;
use latnet_util::{checked_pow, inverse_mod, prime_factorization};

use crate::genseq::IndexedSequence;
use crate::storage::Compress;
use crate::types::Integer;

/// One prime-power factor of the modulus, with the data needed to rebuild an
/// element from its mixed-radix digit.
#[derive(Clone, Debug)]
struct FactorBasis {
    prime: Integer,
    /// Number of residues coprime with this factor.
    totient: Integer,
    /// Number of digit values actually enumerated (halved on the factor that
    /// carries the symmetric restriction).
    range: Integer,
    /// CRT basis element: `(n / n_j) * ((n / n_j)^-1 mod n_j)`.
    crt_unit: Integer,
}

/// The integers `k` in `1..n` with `gcd(k, n) = 1`, ordered through the CRT
/// isomorphism with the product of the per-prime unit groups.
///
/// Writing `n = prod n_j` with `n_j = p_j^{e_j}` and primes sorted in
/// decreasing order, element `i` is obtained by expanding `i` in the mixed
/// radix of the per-factor totients (first factor fastest) and mapping each
/// digit to the corresponding coprime residue. Element 0 is always 1.
///
/// Under symmetric compression only the first `floor(phi(n)/2)` elements are
/// enumerated and each is folded to `min(k, n - k)`; `k` and `n - k` never
/// both occur because the fold negates every CRT coordinate.
#[derive(Clone, Debug)]
pub struct CoprimeIntegers {
    modulus: Integer,
    compress: Compress,
    size: usize,
    factors: Vec<FactorBasis>,
}

impl CoprimeIntegers {
    pub fn new(modulus: Integer, compress: Compress) -> Self {
        assert!(modulus >= 1);
        let mut factors: Vec<FactorBasis> = prime_factorization(modulus)
            .into_iter()
            .rev() // decreasing primes
            .map(|(p, e)| {
                let nj = checked_pow(p, e);
                let totient = nj - nj / p;
                let rest = modulus / nj;
                let crt_unit = if rest == 1 {
                    1 % modulus
                } else {
                    latnet_util::mul_mod(rest, inverse_mod(rest % nj, nj), modulus)
                };
                FactorBasis {
                    prime: p,
                    totient,
                    range: totient,
                    crt_unit,
                }
            })
            .collect();

        if compress.symmetric() {
            // Halve the slowest non-trivial digit; all slower digits have
            // totient 1 (only the factor 2 can), so the result is exactly
            // the first half of the full enumeration.
            if let Some(f) = factors.iter_mut().rev().find(|f| f.totient >= 2) {
                f.range = f.totient / 2;
            }
        }

        let size = if compress.symmetric() && factors.iter().all(|f| f.totient < 2) {
            // floor(phi(n) / 2) = 0: nothing survives the fold.
            0
        } else {
            factors.iter().map(|f| f.range).product::<Integer>() as usize
        };
        CoprimeIntegers {
            modulus,
            compress,
            size,
            factors,
        }
    }

    pub fn modulus(&self) -> Integer {
        self.modulus
    }
}

impl IndexedSequence for CoprimeIntegers {
    type Value = Integer;

    fn size(&self) -> usize {
        self.size
    }

    fn element(&self, i: usize) -> Integer {
        assert!(i < self.size, "index {i} past the end of the sequence");
        if self.modulus == 1 {
            return 0;
        }
        let mut rem = i as Integer;
        let mut k = 0;
        for f in &self.factors {
            let digit = rem % f.range;
            rem /= f.range;
            // The digit-th residue coprime with p: skip multiples of p.
            let residue = digit + 1 + digit / (f.prime - 1);
            k = (k + latnet_util::mul_mod(residue, f.crt_unit, self.modulus)) % self.modulus;
        }
        self.compress.compress_index(k, self.modulus)
    }
}

/// The polynomials coprime with a GF(2) modulus, by increasing index.
#[derive(Clone, Debug)]
pub struct CoprimePolynomials {
    modulus: Gf2Poly,
    units: Vec<Gf2Poly>,
}

impl CoprimePolynomials {
    pub fn new(modulus: Gf2Poly) -> Self {
        let d = modulus.degree().expect("zero polynomial modulus");
        assert!(d <= 24, "unit enumeration of a degree-{d} modulus");
        let units = (1u64..1 << d)
            .map(Gf2Poly::from_coeff_bits)
            .filter(|q| q.gcd(modulus).degree() == Some(0))
            .collect();
        CoprimePolynomials { modulus, units }
    }

    pub fn modulus(&self) -> Gf2Poly {
        self.modulus
    }
}

impl IndexedSequence for CoprimePolynomials {
    type Value = Gf2Poly;

    fn size(&self) -> usize {
        self.units.len()
    }

    fn element(&self, i: usize) -> Gf2Poly {
        self.units[i]
    }
}

#[cfg(test)]
mod tests {
    use latnet_util::{euler_totient, is_coprime};

    use super::*;

    #[test]
    fn order_for_modulus_12() {
        let seq = CoprimeIntegers::new(12, Compress::None);
        assert_eq!(seq.size(), 4);
        assert_eq!(seq.to_vec(), vec![1, 5, 7, 11]);

        let sym = CoprimeIntegers::new(12, Compress::Symmetric);
        assert_eq!(sym.size(), 2);
        assert_eq!(sym.to_vec(), vec![1, 5]);
    }

    #[test]
    fn first_element_is_one() {
        for n in [2u64, 7, 12, 30, 31, 256] {
            assert_eq!(CoprimeIntegers::new(n, Compress::None).element(0), 1, "n={n}");
        }
    }

    #[test]
    fn elements_are_coprime_and_exhaustive() {
        for n in [2u64, 9, 12, 30, 31, 64, 100] {
            let seq = CoprimeIntegers::new(n, Compress::None);
            assert_eq!(seq.size() as u64, euler_totient(n), "n={n}");
            let mut got = seq.to_vec();
            for &k in &got {
                assert!(k >= 1 && k < n && is_coprime(k, n), "n={n} k={k}");
            }
            got.sort_unstable();
            got.dedup();
            assert_eq!(got.len() as u64, euler_totient(n), "duplicates for n={n}");
        }
    }

    #[test]
    fn symmetric_yields_folded_half() {
        for n in [7u64, 12, 30, 31, 64] {
            let seq = CoprimeIntegers::new(n, Compress::Symmetric);
            assert_eq!(seq.size() as u64, euler_totient(n) / 2, "n={n}");
            let mut got = seq.to_vec();
            for &k in &got {
                assert!(2 * k <= n, "n={n} k={k} not folded");
                assert!(is_coprime(k, n));
            }
            got.sort_unstable();
            got.dedup();
            assert_eq!(got.len() as u64, euler_totient(n) / 2, "duplicates for n={n}");
        }
    }

    #[test]
    fn trivial_moduli() {
        let one = CoprimeIntegers::new(1, Compress::None);
        assert_eq!(one.to_vec(), vec![0]);
        let two = CoprimeIntegers::new(2, Compress::None);
        assert_eq!(two.to_vec(), vec![1]);
        assert_eq!(CoprimeIntegers::new(2, Compress::Symmetric).size(), 0);
    }

    #[test]
    fn polynomial_units() {
        let p = Gf2Poly(0b1011); // irreducible: every nonzero residue is a unit
        let seq = CoprimePolynomials::new(p);
        assert_eq!(seq.size(), 7);
        assert_eq!(seq.element(0), Gf2Poly::ONE);

        let sq = Gf2Poly(0b111).mul(Gf2Poly(0b111));
        let seq = CoprimePolynomials::new(sq);
        assert!(seq.to_vec().iter().all(|q| q.gcd(sq).degree() == Some(0)));
    }
}
