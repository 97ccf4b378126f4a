//! Storage: the mapping between natural point indices and the slots of the
//! kernel-value and state vectors, with optional symmetric compression and,
//! for embedded lattices, a per-level block structure.

use anyhow::{bail, ensure, Result};

use crate::size_param::{Embedding, SizeParam};
use crate::types::{Integer, LatticeRules, Level, LevelRange, MeritValue, Real};

/// Index compression policy.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Compress {
    None,
    /// Exploits the `x -> 1 - x` symmetry of the kernel: indices `i` and
    /// `n - i` share a slot, so only the first half of the values is stored.
    Symmetric,
}

impl Compress {
    pub fn symmetric(self) -> bool {
        self == Compress::Symmetric
    }

    /// Number of slots needed for `n` natural indices.
    pub fn size(self, n: Integer) -> usize {
        match self {
            Compress::None => n as usize,
            Compress::Symmetric => {
                if n == 0 {
                    0
                } else {
                    (n / 2 + 1) as usize
                }
            }
        }
    }

    /// Representative of natural index `i` among `n`.
    pub fn compress_index(self, i: Integer, n: Integer) -> Integer {
        match self {
            Compress::None => i,
            Compress::Symmetric => i.min(n - i),
        }
    }

    /// How many natural indices share the slot of index `i`: the first slot
    /// is never shared, the last one only when `n` is odd.
    pub fn index_compression_ratio(self, i: Integer, n: Integer) -> u32 {
        match self {
            Compress::None => 1,
            Compress::Symmetric => {
                if i == 0 || (i == n - 1 && n % 2 == 0) {
                    1
                } else {
                    2
                }
            }
        }
    }

    /// The sharing factor of every slot on an embedding level. In base 2,
    /// levels 0 and 1 hold the self-symmetric points 0 and 1/2.
    pub fn level_compression_ratio(self, base_num_points: Integer, level: Level) -> u32 {
        match self {
            Compress::None => 1,
            Compress::Symmetric => {
                let first_compressed = if base_num_points == 2 { 2 } else { 1 };
                if level >= first_compressed {
                    2
                } else {
                    1
                }
            }
        }
    }
}

/// Order of the slots within each level.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Layout {
    /// Natural index order; the layout of plain CBC state vectors.
    Flat,
    /// Unit-group cyclic order per level; the layout required by the
    /// FFT-based inner product.
    Cyclic,
}

/// Enumeration of the unit group of `base^level` in a cyclic order, together
/// with the structural data the cyclic storage layout needs.
///
/// Implemented by the generator-sequence module for both lattice families.
pub trait CyclicLattice: LatticeRules {
    /// The unit values of `base^level` (as indices), enumerated so that
    /// multiplication by a unit acts as a rotation once symmetric folding is
    /// applied (for base 2) or directly (odd bases).
    fn unit_cycle(base: &Self::Modulus, level: Level) -> Vec<Integer>;
}

#[derive(Clone, Debug)]
pub struct Storage<L: LatticeRules> {
    size_param: SizeParam<L>,
    compress: Compress,
    layout: Layout,
    /// Number of points of one embedding base, when levels exist.
    base_num_points: Option<Integer>,
    slot_to_natural: Vec<Integer>,
    natural_to_slot: Vec<usize>,
    level_ranges: Vec<LevelRange>,
}

impl<L: LatticeRules> Storage<L> {
    /// Flat storage for the given size and compression.
    pub fn new(size_param: SizeParam<L>, compress: Compress) -> Result<Self> {
        check_compress::<L>(compress)?;
        let n = size_param.num_points();
        match size_param.embedding() {
            Embedding::Unilevel => {
                let size = compress.size(n);
                let slot_to_natural = (0..size as Integer).collect();
                let natural_to_slot = (0..n)
                    .map(|i| compress.compress_index(i, n) as usize)
                    .collect();
                Ok(Storage {
                    size_param,
                    compress,
                    layout: Layout::Flat,
                    base_num_points: None,
                    slot_to_natural,
                    natural_to_slot,
                    level_ranges: vec![0..size],
                })
            }
            Embedding::Multilevel => {
                Self::leveled(size_param, compress, Layout::Flat, |base, level| {
                    let modulus = L::modulus_pow(base, level);
                    let nk = L::num_points(&modulus);
                    (1..nk)
                        .map(L::index_to_gen)
                        .filter(|a| L::is_valid_gen(a, &modulus))
                        .map(|a| L::gen_to_index(&a))
                        .collect()
                })
            }
        }
    }

    /// Builds the per-level tables from a per-level unit enumeration. The
    /// fold partner of a unit is its reflection within its own level.
    fn leveled(
        size_param: SizeParam<L>,
        compress: Compress,
        layout: Layout,
        units_of_level: impl Fn(&L::Modulus, Level) -> Vec<Integer>,
    ) -> Result<Self> {
        let (base, max_level) = match size_param {
            SizeParam::Multilevel { base, max_level } => (base, max_level),
            SizeParam::Unilevel { .. } => unreachable!("leveled() needs an embedded size"),
        };
        let modulus = size_param.modulus();
        let n = size_param.num_points();
        let base_points = L::num_points(&base);

        let mut slot_to_natural = Vec::with_capacity(compress.size(n));
        let mut natural_to_slot = vec![usize::MAX; n as usize];
        let mut level_ranges = Vec::with_capacity(max_level + 1);

        // Level 0 holds the origin.
        slot_to_natural.push(0);
        natural_to_slot[0] = 0;
        level_ranges.push(0..1);

        for level in 1..=max_level {
            let start = slot_to_natural.len();
            let level_modulus = L::modulus_pow(&base, level);
            let level_points = L::num_points(&level_modulus);
            let embed = L::modulus_pow(&base, max_level - level);
            let units = units_of_level(&base, level);
            ensure!(
                units.len() as Integer == L::totient(&level_modulus),
                "unit enumeration of level {level} has the wrong cardinality"
            );
            let level_size =
                compress.size(level_points) - compress.size(L::num_points(&L::modulus_pow(&base, level - 1)));
            for &u in units.iter().take(level_size) {
                let slot = slot_to_natural.len();
                let natural = L::scale_index(u, &embed, &modulus);
                slot_to_natural.push(natural);
                natural_to_slot[natural as usize] = slot;
                if compress.symmetric() {
                    let partner = L::reflect_index(u, &level_modulus);
                    let partner_natural = L::scale_index(partner, &embed, &modulus);
                    natural_to_slot[partner_natural as usize] = slot;
                }
            }
            level_ranges.push(start..slot_to_natural.len());
        }

        assert!(
            natural_to_slot.iter().all(|&s| s != usize::MAX),
            "storage layout left natural indices unmapped"
        );
        assert_eq!(slot_to_natural.len(), compress.size(n));

        Ok(Storage {
            size_param,
            compress,
            layout,
            base_num_points: Some(base_points),
            slot_to_natural,
            natural_to_slot,
            level_ranges,
        })
    }

    pub fn size_param(&self) -> &SizeParam<L> {
        &self.size_param
    }

    pub fn compress(&self) -> Compress {
        self.compress
    }

    pub fn symmetric(&self) -> bool {
        self.compress.symmetric()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Uncompressed element count.
    pub fn virtual_size(&self) -> usize {
        self.size_param.num_points() as usize
    }

    /// Compressed element count: the length of kernel-value and state
    /// vectors.
    pub fn size(&self) -> usize {
        self.slot_to_natural.len()
    }

    pub fn level_ranges(&self) -> &[LevelRange] {
        &self.level_ranges
    }

    /// Number of points of one embedding base, when a level structure
    /// exists.
    pub fn base_num_points(&self) -> Option<Integer> {
        self.base_num_points
    }

    /// The slot holding natural index `i`.
    pub fn unpermute(&self, i: Integer) -> usize {
        self.natural_to_slot[i as usize]
    }

    /// The natural index represented by slot `j`.
    pub fn natural_index(&self, j: usize) -> Integer {
        self.slot_to_natural[j]
    }

    pub fn create_merit_value(&self, value: Real) -> MeritValue {
        match self.size_param.embedding() {
            Embedding::Unilevel => MeritValue::Scalar(value),
            Embedding::Multilevel => {
                MeritValue::PerLevel(vec![value; self.size_param.max_level() + 1])
            }
        }
    }

    /// Views `v` as if it had been permuted by multiplication of the natural
    /// indices by the generating value `a`.
    pub fn stride_permuted(&self, v: &[Real], a: &L::GenValue) -> Vec<Real> {
        assert_eq!(v.len(), self.size());
        let modulus = self.size_param.modulus();
        self.slot_to_natural
            .iter()
            .map(|&i| v[self.natural_to_slot[L::stride_index(a, i, &modulus) as usize]])
            .collect()
    }

    /// Sum of all natural elements of the compressed vector `v`, undoing the
    /// sharing of slots; per-level cumulative sums for embedded storage.
    pub fn compressed_sum(&self, v: &[Real]) -> MeritValue {
        assert_eq!(v.len(), self.size());
        let per_level: Vec<Real> = if self.level_ranges.len() == 1 {
            let n = self.size_param.num_points();
            let mut sum: Real = v.iter().sum();
            if self.symmetric() {
                sum *= 2.0;
                sum -= v[0];
                if n % 2 == 0 {
                    sum -= v[v.len() - 1];
                }
            }
            vec![sum]
        } else {
            let base_points = self.base_num_points.expect("leveled storage has a base");
            let mut cumulative = 0.0;
            self.level_ranges
                .iter()
                .enumerate()
                .map(|(level, range)| {
                    let sum: Real = v[range.clone()].iter().sum();
                    let ratio = self.compress.level_compression_ratio(base_points, level);
                    cumulative += sum * ratio as Real;
                    cumulative
                })
                .collect()
        };
        match self.size_param.embedding() {
            Embedding::Unilevel => MeritValue::Scalar(*per_level.last().unwrap()),
            Embedding::Multilevel => MeritValue::PerLevel(per_level),
        }
    }
}

impl<L: CyclicLattice> Storage<L> {
    /// Cyclic storage: slots ordered by the unit-group cycle within each
    /// level. Requires an embedded size parameter, or a unilevel one whose
    /// modulus is a base power; both yield the same level structure.
    pub fn cyclic(size_param: SizeParam<L>, compress: Compress) -> Result<Self> {
        check_compress::<L>(compress)?;
        let leveled_param = match size_param {
            SizeParam::Multilevel { .. } => size_param,
            SizeParam::Unilevel { .. } => as_multilevel(&size_param)?,
        };
        let mut storage =
            Self::leveled(leveled_param, compress, Layout::Cyclic, |base, level| {
                L::unit_cycle(base, level)
            })?;
        // Restore the requested embedding so merit values keep their shape.
        storage.size_param = size_param;
        Ok(storage)
    }
}

/// Rewrites a unilevel size whose modulus is a base power as the equivalent
/// embedded size.
pub fn as_multilevel<L: LatticeRules>(size_param: &SizeParam<L>) -> Result<SizeParam<L>> {
    match size_param {
        SizeParam::Multilevel { .. } => Ok(*size_param),
        SizeParam::Unilevel { modulus } => match L::factor_prime_power(modulus) {
            Some((base, max_level)) => SizeParam::multilevel(base, max_level),
            None => bail!(
                "modulus {modulus} is not a base power; the cyclic layout needs one"
            ),
        },
    }
}

fn check_compress<L: LatticeRules>(compress: Compress) -> Result<()> {
    ensure!(
        !compress.symmetric() || L::SUPPORTS_SYMMETRIC,
        "symmetric compression is not defined for {} lattices",
        L::NAME
    );
    Ok(())
}
