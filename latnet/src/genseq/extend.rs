//! Integers extending a fixed residue by higher-order digits.

use crate::genseq::IndexedSequence;
use crate::types::Integer;

/// Given `low < grain`, the sequence `i * grain + low` below `modulus`: the
/// generator values of an extended lattice that restrict to `low` modulo the
/// base lattice size.
#[derive(Clone, Debug)]
pub struct ExtendSeq {
    modulus: Integer,
    grain: Integer,
    low: Integer,
}

impl ExtendSeq {
    pub fn new(modulus: Integer, grain: Integer, low: Integer) -> Self {
        assert!(grain >= 1 && modulus % grain == 0, "grain must divide the modulus");
        assert!(low < grain, "low digits must be smaller than the grain");
        ExtendSeq {
            modulus,
            grain,
            low,
        }
    }
}

impl IndexedSequence for ExtendSeq {
    type Value = Integer;

    fn size(&self) -> usize {
        (self.modulus / self.grain) as usize
    }

    fn element(&self, i: usize) -> Integer {
        let v = i as Integer * self.grain + self.low;
        assert!(v < self.modulus);
        v
    }
}
