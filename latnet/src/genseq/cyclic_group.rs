//! Cyclic enumeration of the unit groups (Z/b^m)* and (GF(2)[z]/P(z))*.

use anyhow::{ensure, Result};
use latnet_gf2::Gf2Poly;
use latnet_util::{checked_pow, inverse_mod, is_prime, pow_mod, prime_factorization};

use crate::genseq::IndexedSequence;
use crate::storage::{Compress, CyclicLattice};
use crate::types::{Integer, Level, OrdinaryLattice, PolynomialLattice};

/// Group enumeration direction: by powers of the generator or of its inverse.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GroupOrder {
    Direct,
    Inverse,
}

impl GroupOrder {
    pub fn flipped(self) -> Self {
        match self {
            GroupOrder::Direct => GroupOrder::Inverse,
            GroupOrder::Inverse => GroupOrder::Direct,
        }
    }
}

/// The unit group of `b^m`, `b` prime, enumerated by generator powers.
///
/// For `b = 2` and `m >= 3` the units are not a single cycle but the union
/// `<3> ∪ -<3>`; the enumeration visits the cycle of 3 first and then, once
/// the value returns to 1, continues from `b^m - 1` through the mirrored
/// cycle. Under symmetric compression the two halves fold onto each other
/// and the enumeration is a plain cycle again.
#[derive(Clone, Debug)]
pub struct CyclicGroup {
    base: Integer,
    power: Level,
    modulus: Integer,
    gen: Integer,
    compress: Compress,
    order: GroupOrder,
}

impl CyclicGroup {
    pub fn new(
        base: Integer,
        power: Level,
        compress: Compress,
        order: GroupOrder,
    ) -> Result<Self> {
        ensure!(is_prime(base), "cyclic group base {base} is not prime");
        let modulus = checked_pow(base, power as u32);
        let gen = Self::smallest_generator(base, power);
        Ok(CyclicGroup {
            base,
            power,
            modulus,
            gen,
            compress,
            order,
        })
    }

    /// The smallest generator of the units of `b^m`. For odd primes this is
    /// the smallest primitive root; for `b = 2` it is 3, which generates
    /// half of the units (see the type-level comment).
    pub fn smallest_generator(base: Integer, power: Level) -> Integer {
        assert!(is_prime(base), "base {base} is not prime");
        let modulus = checked_pow(base, power as u32);
        if modulus <= 2 {
            return 1;
        }
        if base == 2 {
            return 3;
        }
        let totient = modulus - modulus / base;
        let prime_divisors: Vec<Integer> = prime_factorization(totient)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        (2..modulus)
            .filter(|g| g % base != 0)
            .find(|&g| {
                prime_divisors
                    .iter()
                    .all(|q| pow_mod(g, totient / q, modulus) != 1)
            })
            .expect("no primitive root found; the base is not prime")
    }

    pub fn base(&self) -> Integer {
        self.base
    }

    pub fn power(&self) -> Level {
        self.power
    }

    pub fn modulus(&self) -> Integer {
        self.modulus
    }

    pub fn generator(&self) -> Integer {
        self.gen
    }

    /// Cardinality of the whole unit group.
    pub fn full_size(&self) -> usize {
        ((self.base - 1) * self.modulus / self.base) as usize
    }

    /// The group generated by the inverse generator.
    pub fn inverse(&self) -> CyclicGroup {
        let mut g = self.clone();
        g.order = g.order.flipped();
        g
    }

    /// The analogous group one level down from `level`.
    pub fn subgroup(&self, level: Level) -> CyclicGroup {
        assert!(level <= self.power);
        let modulus = checked_pow(self.base, level as u32);
        CyclicGroup {
            base: self.base,
            power: level,
            modulus,
            gen: if modulus <= 2 { 1 } else { self.gen % modulus },
            compress: self.compress,
            order: self.order,
        }
    }

    /// The enumeration before compression folding.
    fn raw_element(&self, i: usize) -> Integer {
        let n = self.modulus;
        if n == 1 {
            return 0;
        }
        let g = match self.order {
            GroupOrder::Direct => self.gen,
            GroupOrder::Inverse => inverse_mod(self.gen, n),
        };
        if self.base == 2 && self.power >= 3 {
            let half = self.full_size() / 2;
            if i < half {
                pow_mod(g, i as u64, n)
            } else {
                latnet_util::mul_mod(n - 1, pow_mod(g, (i - half) as u64, n), n)
            }
        } else {
            pow_mod(g, i as u64, n)
        }
    }
}

impl IndexedSequence for CyclicGroup {
    type Value = Integer;

    fn size(&self) -> usize {
        if self.modulus == 1 {
            1
        } else {
            self.compress.size(self.modulus) - self.compress.size(self.modulus / self.base)
        }
    }

    fn element(&self, i: usize) -> Integer {
        assert!(i < self.size(), "index {i} past the end of the group");
        let v = self.raw_element(i);
        self.compress.compress_index(v, self.modulus)
    }
}

impl CyclicLattice for OrdinaryLattice {
    fn unit_cycle(base: &Integer, level: Level) -> Vec<Integer> {
        let group = CyclicGroup::new(*base, level, Compress::None, GroupOrder::Direct)
            .expect("embedding bases are prime");
        (0..group.full_size()).map(|i| group.raw_element(i)).collect()
    }
}

/// The multiplicative group of the residues modulo an irreducible `P(z)`,
/// enumerated by powers of its smallest generator.
#[derive(Clone, Debug)]
pub struct PolyCyclicGroup {
    modulus: Gf2Poly,
    gen: Gf2Poly,
    order: GroupOrder,
}

impl PolyCyclicGroup {
    pub fn new(modulus: Gf2Poly, order: GroupOrder) -> Result<Self> {
        ensure!(
            modulus.is_irreducible(),
            "cyclic polynomial group needs an irreducible modulus, got {modulus}"
        );
        let gen = Self::smallest_generator(modulus);
        Ok(PolyCyclicGroup {
            modulus,
            gen,
            order,
        })
    }

    pub fn smallest_generator(modulus: Gf2Poly) -> Gf2Poly {
        let d = modulus.degree().expect("zero modulus");
        let group_order = (1u64 << d) - 1;
        let prime_divisors: Vec<u64> = prime_factorization(group_order)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        (2..1u64 << d)
            .map(Gf2Poly::from_coeff_bits)
            .find(|g| {
                prime_divisors
                    .iter()
                    .all(|q| g.pow_mod(group_order / q, modulus) != Gf2Poly::ONE)
            })
            .expect("the unit group of an irreducible modulus is cyclic")
    }

    pub fn modulus(&self) -> Gf2Poly {
        self.modulus
    }

    pub fn generator(&self) -> Gf2Poly {
        self.gen
    }

    pub fn inverse(&self) -> PolyCyclicGroup {
        let mut g = self.clone();
        g.order = g.order.flipped();
        g
    }
}

impl IndexedSequence for PolyCyclicGroup {
    type Value = Gf2Poly;

    fn size(&self) -> usize {
        (1usize << self.modulus.degree().unwrap()) - 1
    }

    fn element(&self, i: usize) -> Gf2Poly {
        assert!(i < self.size());
        let g = match self.order {
            GroupOrder::Direct => self.gen,
            GroupOrder::Inverse => {
                let order = self.size() as u64;
                self.gen.pow_mod(order - 1, self.modulus)
            }
        };
        g.pow_mod(i as u64, self.modulus)
    }
}

impl CyclicLattice for PolynomialLattice {
    fn unit_cycle(base: &Gf2Poly, level: Level) -> Vec<Integer> {
        assert!(
            level <= 1,
            "the units of {base}^{level} do not form a cyclic group"
        );
        let group = PolyCyclicGroup::new(*base, GroupOrder::Direct)
            .expect("embedding bases are irreducible");
        (0..group.size())
            .map(|i| group.element(i).coeff_bits())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use latnet_util::is_coprime;

    use super::*;

    #[test]
    fn odd_base_enumerates_all_units() {
        for (b, m) in [(3u64, 2usize), (5, 1), (7, 2), (31, 1)] {
            let g = CyclicGroup::new(b, m, Compress::None, GroupOrder::Direct).unwrap();
            let n = g.modulus();
            assert_eq!(g.size(), g.full_size());
            let mut seen = g.to_vec();
            for &v in &seen {
                assert!(v >= 1 && v < n && is_coprime(v, n));
            }
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), g.full_size(), "b={b} m={m}");
        }
    }

    #[test]
    fn indexing_matches_generator_powers() {
        let g = CyclicGroup::new(7, 2, Compress::None, GroupOrder::Direct).unwrap();
        for i in 0..g.size() {
            assert_eq!(g.element(i), pow_mod(g.generator(), i as u64, g.modulus()));
        }
    }

    #[test]
    fn base_two_covers_both_cosets() {
        let g = CyclicGroup::new(2, 5, Compress::None, GroupOrder::Direct).unwrap();
        assert_eq!(g.size(), 16);
        let mut seen = g.to_vec();
        assert_eq!(seen[0], 1);
        assert!(seen.contains(&31)); // the -1 coset is reached
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn base_two_symmetric_folds_to_single_cycle() {
        let g = CyclicGroup::new(2, 5, Compress::Symmetric, GroupOrder::Direct).unwrap();
        assert_eq!(g.size(), 8); // 2^(m-2)
        let mut seen = g.to_vec();
        for &v in &seen {
            assert!(2 * v <= 32 && v % 2 == 1);
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn inverse_group_is_elementwise_inverse() {
        let g = CyclicGroup::new(5, 2, Compress::None, GroupOrder::Direct).unwrap();
        let inv = g.inverse();
        let n = g.modulus();
        for i in 0..g.size() {
            assert_eq!(g.element(i) * inv.element(i) % n, 1);
        }
    }

    #[test]
    fn inverse_of_base_two_group() {
        let g = CyclicGroup::new(2, 5, Compress::None, GroupOrder::Direct).unwrap();
        let inv = g.inverse();
        let n = g.modulus();
        for i in 0..g.size() {
            assert_eq!(g.element(i) * inv.element(i) % n, 1, "i={i}");
        }
    }

    #[test]
    fn subgroup_reduces_the_level() {
        let g = CyclicGroup::new(3, 3, Compress::None, GroupOrder::Direct).unwrap();
        let s = g.subgroup(2);
        assert_eq!(s.modulus(), 9);
        assert_eq!(s.size(), 6);
    }

    #[test]
    fn poly_group_covers_nonzero_residues() {
        let p = Gf2Poly(0b10011); // z^4 + z + 1, primitive
        let g = PolyCyclicGroup::new(p, GroupOrder::Direct).unwrap();
        assert_eq!(g.size(), 15);
        let mut seen: Vec<u64> = g.to_vec().iter().map(|q| q.coeff_bits()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..16).collect::<Vec<_>>());

        let inv = g.inverse();
        for i in 0..g.size() {
            assert_eq!(g.element(i).mul_mod(inv.element(i), p), Gf2Poly::ONE);
        }
    }

    #[test]
    fn rejects_composite_base() {
        assert!(CyclicGroup::new(6, 2, Compress::None, GroupOrder::Direct).is_err());
        assert!(PolyCyclicGroup::new(Gf2Poly(0b101), GroupOrder::Direct).is_err());
    }
}
