use core::cmp::Ordering;
use core::fmt;

use crate::size_param::SizeParam;
use crate::types::{Dimension, LatticeRules};

/// Definition of a rank-1 lattice: its size and its generating vector.
///
/// Definitions are ordered lexicographically, by size first and generating
/// vector second, so candidate sets can be kept sorted and deduplicated.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LatDef<L: LatticeRules> {
    size_param: SizeParam<L>,
    gen: Vec<L::GenValue>,
}

impl<L: LatticeRules> LatDef<L> {
    /// An empty (dimension-0) definition to be extended coordinate by
    /// coordinate.
    pub fn new(size_param: SizeParam<L>) -> Self {
        LatDef {
            size_param,
            gen: Vec::new(),
        }
    }

    pub fn with_gen(size_param: SizeParam<L>, gen: Vec<L::GenValue>) -> Self {
        debug_assert!(
            gen.iter().all(|a| L::is_valid_gen(a, &size_param.modulus())),
            "generating vector contains values not coprime with the modulus"
        );
        LatDef { size_param, gen }
    }

    pub fn size_param(&self) -> &SizeParam<L> {
        &self.size_param
    }

    pub fn gen(&self) -> &[L::GenValue] {
        &self.gen
    }

    pub fn dimension(&self) -> Dimension {
        self.gen.len()
    }

    /// A copy of this definition with one more generating value.
    pub fn extended(&self, a: L::GenValue) -> Self {
        let mut gen = Vec::with_capacity(self.gen.len() + 1);
        gen.extend_from_slice(&self.gen);
        gen.push(a);
        LatDef {
            size_param: self.size_param,
            gen,
        }
    }

    pub fn push(&mut self, a: L::GenValue) {
        self.gen.push(a);
    }

    pub fn clear_gen(&mut self) {
        self.gen.clear();
    }
}

impl<L: LatticeRules> PartialOrd for LatDef<L> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<L: LatticeRules> Ord for LatDef<L> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size_param
            .cmp(&other.size_param)
            .then_with(|| self.gen.cmp(&other.gen))
    }
}

impl<L: LatticeRules> fmt::Display for LatDef<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, [", self.size_param, self.dimension())?;
        for (j, a) in self.gen.iter().enumerate() {
            if j > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{a}")?;
        }
        write!(f, "])")
    }
}
