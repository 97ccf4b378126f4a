//! Minimal-change enumeration of the compositions of `n` into `k` positive
//! parts: consecutive compositions move a single unit between two parts, so
//! a row-replacement is enough to go from one stacked matrix to the next.

/// Enumerates compositions in a reflected (Gray) order: recursing on the
/// last part and alternating the direction of the remainder guarantees the
/// single-unit-move property at every step.
pub struct CompositionMaker {
    compositions: Vec<Vec<u32>>,
    position: usize,
}

fn weak_compositions(total: u32, parts: usize, reverse: bool, out: &mut Vec<Vec<u32>>) {
    let start = out.len();
    if parts == 1 {
        out.push(vec![total]);
    } else {
        for last in 0..=total {
            let block_start = out.len();
            // Alternate direction so block boundaries stay single-unit moves.
            weak_compositions(total - last, parts - 1, last % 2 == 1, out);
            for c in &mut out[block_start..] {
                c.push(last);
            }
        }
    }
    if reverse {
        out[start..].reverse();
    }
}

impl CompositionMaker {
    /// Compositions of `n` into `k` parts, each at least 1. Requires
    /// `n >= k >= 1`.
    pub fn new(n: u32, k: usize) -> Self {
        assert!(k >= 1 && n as usize >= k, "no composition of {n} into {k} parts");
        let mut weak = Vec::new();
        weak_compositions(n - k as u32, k, false, &mut weak);
        let compositions = weak
            .into_iter()
            .map(|c| c.into_iter().map(|p| p + 1).collect())
            .collect();
        CompositionMaker {
            compositions,
            position: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.compositions.len()
    }

    pub fn current_composition(&self) -> &[u32] {
        &self.compositions[self.position]
    }

    /// Advances to the next composition; false once exhausted.
    pub fn go_to_next_composition(&mut self) -> bool {
        if self.position + 1 < self.compositions.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// The unit move from the previous composition:
    /// `((decreased_part, new_count), (increased_part, new_count))`,
    /// parts 0-based.
    pub fn change_from_previous(&self) -> ((usize, u32), (usize, u32)) {
        assert!(self.position > 0, "no previous composition");
        let prev = &self.compositions[self.position - 1];
        let cur = &self.compositions[self.position];
        let mut decreased = None;
        let mut increased = None;
        for (i, (&p, &c)) in prev.iter().zip(cur).enumerate() {
            if c + 1 == p {
                decreased = Some((i, c));
            } else if c == p + 1 {
                increased = Some((i, c));
            } else {
                assert!(c == p, "non-minimal change at part {i}");
            }
        }
        (
            decreased.expect("one part decreased"),
            increased.expect("one part increased"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binomial(n: usize, k: usize) -> usize {
        if k > n {
            return 0;
        }
        let mut acc = 1usize;
        for i in 0..k {
            acc = acc * (n - i) / (i + 1);
        }
        acc
    }

    #[test]
    fn enumerates_all_compositions_once() {
        for (n, k) in [(4u32, 2usize), (6, 3), (7, 4), (9, 3), (5, 5), (6, 1)] {
            let mut maker = CompositionMaker::new(n, k);
            let mut seen = vec![maker.current_composition().to_vec()];
            while maker.go_to_next_composition() {
                seen.push(maker.current_composition().to_vec());
            }
            assert_eq!(seen.len(), binomial(n as usize - 1, k - 1), "count for {n},{k}");
            for c in &seen {
                assert_eq!(c.iter().sum::<u32>(), n);
                assert!(c.iter().all(|&p| p >= 1));
            }
            let mut sorted = seen.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), seen.len(), "duplicates for {n},{k}");
        }
    }

    #[test]
    fn consecutive_compositions_move_one_unit() {
        for (n, k) in [(6u32, 3usize), (8, 4), (10, 2), (7, 5)] {
            let mut maker = CompositionMaker::new(n, k);
            let mut prev = maker.current_composition().to_vec();
            while maker.go_to_next_composition() {
                let cur = maker.current_composition().to_vec();
                let diff: u32 = prev
                    .iter()
                    .zip(&cur)
                    .map(|(&p, &c)| p.abs_diff(c))
                    .sum();
                assert_eq!(diff, 2, "{prev:?} -> {cur:?}");
                let ((di, dc), (ii, ic)) = maker.change_from_previous();
                assert_eq!(cur[di], dc);
                assert_eq!(cur[ii], ic);
                prev = cur;
            }
        }
    }

    #[test]
    fn single_part() {
        let mut maker = CompositionMaker::new(5, 1);
        assert_eq!(maker.current_composition(), &[5]);
        assert!(!maker.go_to_next_composition());
    }
}
