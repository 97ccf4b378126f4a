//! Indexed sequences of candidate generator values, with forward and random
//! traversals.

pub mod coprime;
pub mod cyclic_group;
pub mod extend;
pub mod power_seq;

pub use coprime::{CoprimeIntegers, CoprimePolynomials};
pub use cyclic_group::{CyclicGroup, GroupOrder, PolyCyclicGroup};
pub use extend::ExtendSeq;
pub use power_seq::PowerSeq;

use crate::lfsr258::Lfsr258;

/// A lazily indexable sequence: elements are computed on demand from their
/// index, never materialized by the sequence itself.
pub trait IndexedSequence {
    type Value: Clone;

    fn size(&self) -> usize;

    fn element(&self, i: usize) -> Self::Value;

    fn iter(&self) -> Elements<'_, Self>
    where
        Self: Sized,
    {
        Elements { seq: self, index: 0 }
    }

    fn to_vec(&self) -> Vec<Self::Value>
    where
        Self: Sized,
    {
        self.iter().collect()
    }
}

impl<T: Clone> IndexedSequence for Vec<T> {
    type Value = T;

    fn size(&self) -> usize {
        self.len()
    }

    fn element(&self, i: usize) -> T {
        self[i].clone()
    }
}

/// Forward iterator over an indexed sequence.
pub struct Elements<'a, S: IndexedSequence> {
    seq: &'a S,
    index: usize,
}

impl<S: IndexedSequence> Iterator for Elements<'_, S> {
    type Item = S::Value;

    fn next(&mut self) -> Option<S::Value> {
        if self.index < self.seq.size() {
            let v = self.seq.element(self.index);
            self.index += 1;
            Some(v)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.seq.size() - self.index;
        (rem, Some(rem))
    }
}

/// Traversal policy: the order in which a search visits a sequence.
#[derive(Clone, Debug)]
pub enum Traversal {
    /// A contiguous index window.
    Forward { offset: usize, size: usize },
    /// `count` indices drawn uniformly from the bound generator.
    Random { count: usize, rng: Lfsr258 },
}

impl Traversal {
    pub fn forward() -> Self {
        Traversal::Forward {
            offset: 0,
            size: usize::MAX,
        }
    }

    pub fn random(count: usize, rng: Lfsr258) -> Self {
        Traversal::Random { count, rng }
    }

    /// Materializes the visited candidate values in traversal order.
    pub fn select<S: IndexedSequence>(&mut self, seq: &S) -> Vec<S::Value> {
        match self {
            Traversal::Forward { offset, size } => {
                let end = offset.saturating_add(*size).min(seq.size());
                (*offset..end).map(|i| seq.element(i)).collect()
            }
            Traversal::Random { count, rng } => {
                assert!(seq.size() > 0, "random traversal over an empty sequence");
                (0..*count)
                    .map(|_| seq.element(rng.next_index(seq.size())))
                    .collect()
            }
        }
    }

    /// Moves a random traversal to an independent substream; subsequent
    /// selections draw fresh indices. No effect on forward traversals.
    pub fn jump(&mut self) {
        if let Traversal::Random { rng, .. } = self {
            rng.jump();
        }
    }
}
