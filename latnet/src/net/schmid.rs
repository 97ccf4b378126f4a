//! Reference t-value computation by exhaustive Gray-code sweeps.
//!
//! For each composition of `k` rows across the coordinates, every non-empty
//! XOR combination of the stacked rows is visited in Gray order; hitting
//! zero means the stack is rank-deficient. Slow but simple, this is the
//! oracle the incremental Gauss path is tested against.

use latnet_gf2::BitMatrix;

use crate::net::composition::CompositionMaker;

/// Whether the stacked rows are linearly independent over GF(2).
fn full_rank_by_sweep(rows: &[u64]) -> bool {
    let k = rows.len();
    assert!(k < 64, "sweep over 2^k combinations needs k < 64");
    let mut v = 0u64;
    for r in 0..(1u64 << k) - 1 {
        let flip = (r + 1).trailing_zeros() as usize;
        v ^= rows[flip];
        if v == 0 {
            return false;
        }
    }
    true
}

fn stack_rows(matrices: &[&BitMatrix], composition: &[u32]) -> Vec<u64> {
    let mut rows = Vec::new();
    for (mat, &count) in matrices.iter().zip(composition) {
        for j in 0..count as usize {
            rows.push(mat.row(j));
        }
    }
    rows
}

/// The t-value of the projection whose generating matrices are given,
/// starting the search from the lower bound `max_sub_proj` inherited from
/// subprojections. Row counts `k` are tried downwards from
/// `m - max_sub_proj`; the t-value is `m - k` for the largest `k` whose
/// every composition yields full rank.
pub fn tvalue_schmid(matrices: &[&BitMatrix], max_sub_proj: usize) -> usize {
    let s = matrices.len();
    assert!(s >= 1);
    let m = matrices[0].n_cols();
    assert!(matrices.iter().all(|g| g.n_cols() == m && g.n_rows() == m));
    if s == 1 {
        return 0;
    }

    let mut k = m.saturating_sub(max_sub_proj);
    while k >= s {
        let mut maker = CompositionMaker::new(k as u32, s);
        let mut all_full = full_rank_by_sweep(&stack_rows(matrices, maker.current_composition()));
        while all_full && maker.go_to_next_composition() {
            all_full = full_rank_by_sweep(&stack_rows(matrices, maker.current_composition()));
        }
        if all_full {
            return m - k;
        }
        k -= 1;
    }
    // Even k = s rows are dependent (or the bound leaves no admissible k):
    // the descent exits with k = s - 1 and reports m - (k + 1).
    m.saturating_sub(s).max(max_sub_proj)
}

#[cfg(test)]
mod tests {
    use latnet_gf2::BitMatrix;

    use super::*;

    fn identity(m: usize) -> BitMatrix {
        BitMatrix::identity(m)
    }

    /// Reversed identity: row i has a 1 in column m - 1 - i.
    fn reversed_identity(m: usize) -> BitMatrix {
        let mut g = BitMatrix::new(m, m);
        for i in 0..m {
            g.set(i, m - 1 - i, true);
        }
        g
    }

    #[test]
    fn sweep_detects_dependence() {
        assert!(full_rank_by_sweep(&[0b001, 0b010, 0b100]));
        assert!(!full_rank_by_sweep(&[0b001, 0b010, 0b011]));
        assert!(!full_rank_by_sweep(&[0b101, 0b101]));
    }

    #[test]
    fn sobol_first_pair_is_perfect() {
        // The identity and the reversed identity form a (0, m, 2)-net.
        for m in 2..7 {
            let g1 = identity(m);
            let g2 = reversed_identity(m);
            assert_eq!(tvalue_schmid(&[&g1, &g2], 0), 0, "m={m}");
        }
    }

    #[test]
    fn identical_matrices_are_worst() {
        let m = 5;
        let g = identity(m);
        // The stacked rows repeat, so every k down to k = s = 2 fails and
        // the descent bottoms out at m - s.
        assert_eq!(tvalue_schmid(&[&g, &g], 0), m - 2);
    }

    #[test]
    fn lower_bound_is_respected() {
        let m = 6;
        let g1 = identity(m);
        let g2 = reversed_identity(m);
        assert_eq!(tvalue_schmid(&[&g1, &g2], 3), 3);
    }

    #[test]
    fn single_coordinate_has_tvalue_zero() {
        let g = reversed_identity(8);
        assert_eq!(tvalue_schmid(&[&g], 0), 0);
    }
}
