//! Element-wise powers of a base sequence.

use latnet_util::pow_mod;

use crate::genseq::IndexedSequence;
use crate::types::Integer;

/// Wraps an integer sequence and yields `x^r`, or `x^r mod m` when a modulus
/// is given.
#[derive(Clone, Debug)]
pub struct PowerSeq<S> {
    base: S,
    exponent: u64,
    modulus: Option<Integer>,
}

impl<S: IndexedSequence<Value = Integer>> PowerSeq<S> {
    pub fn new(base: S, exponent: u64, modulus: Option<Integer>) -> Self {
        PowerSeq {
            base,
            exponent,
            modulus,
        }
    }

    pub fn base(&self) -> &S {
        &self.base
    }
}

impl<S: IndexedSequence<Value = Integer>> IndexedSequence for PowerSeq<S> {
    type Value = Integer;

    fn size(&self) -> usize {
        self.base.size()
    }

    fn element(&self, i: usize) -> Integer {
        let x = self.base.element(i);
        match self.modulus {
            Some(m) => pow_mod(x, self.exponent, m),
            None => x.checked_pow(self.exponent as u32).expect("power overflow"),
        }
    }
}
