//! Incremental Gauss reduction over GF(2) with row-operation tracking.
//!
//! The reducer maintains, for a growing/mutating stack of rows,
//!
//!   reduced = row_ops * base,    row_ops invertible,
//!
//! together with a pivot bimap such that every pivot column has exactly one
//! 1-bit, located in its pivot row. Supported mutations re-pivot just enough
//! to restore the invariant, so replacing one row between two almost-equal
//! row stacks costs far less than a fresh elimination.

use std::collections::{BTreeMap, BTreeSet};

use latnet_gf2::BitMatrix;

pub struct GaussReducer {
    n_cols: usize,
    n_rows: usize,
    red: BitMatrix,
    base: BitMatrix,
    row_ops: BitMatrix,
    cols_without_pivot: BTreeSet<usize>,
    rows_without_pivot: BTreeSet<usize>,
    pivot_col_row: BTreeMap<usize, usize>,
    pivot_row_col: BTreeMap<usize, usize>,
    smallest_full_rank: usize,
}

impl GaussReducer {
    pub fn new(n_cols: usize) -> Self {
        let mut r = GaussReducer {
            n_cols: 0,
            n_rows: 0,
            red: BitMatrix::new(0, 0),
            base: BitMatrix::new(0, 0),
            row_ops: BitMatrix::new(0, 0),
            cols_without_pivot: BTreeSet::new(),
            rows_without_pivot: BTreeSet::new(),
            pivot_col_row: BTreeMap::new(),
            pivot_row_col: BTreeMap::new(),
            smallest_full_rank: 0,
        };
        r.reset(n_cols);
        r
    }

    pub fn reset(&mut self, n_cols: usize) {
        self.n_cols = n_cols;
        self.n_rows = 0;
        self.red = BitMatrix::new(0, n_cols);
        self.base = BitMatrix::new(0, n_cols);
        self.row_ops = BitMatrix::new(0, 0);
        self.cols_without_pivot = (0..n_cols).collect();
        self.rows_without_pivot.clear();
        self.pivot_col_row.clear();
        self.pivot_row_col.clear();
        self.smallest_full_rank = n_cols;
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// The rank of the current row stack.
    pub fn compute_rank(&self) -> usize {
        self.pivot_col_row.len()
    }

    /// Cumulative ranks after each of the `num_cols` columns starting at
    /// `first_col`: entry `c` is the rank of the submatrix formed by all
    /// columns up to and including `first_col + c`.
    pub fn compute_ranks(&self, first_col: usize, num_cols: usize) -> Vec<usize> {
        let mut ranks = vec![0; num_cols];
        let mut rank = 0;
        let mut last_col = first_col;
        for (&col, _) in &self.pivot_col_row {
            if col >= first_col + num_cols {
                break;
            }
            for c in last_col..col {
                ranks[c - first_col] = rank;
            }
            rank += 1;
            if col >= first_col {
                last_col = col;
            }
        }
        for c in last_col..first_col + num_cols {
            ranks[c - first_col] = rank;
        }
        ranks
    }

    /// One past the last column needed for the rows to reach full rank, or
    /// `n_cols + 1` when they do not.
    pub fn smallest_full_rank(&self) -> usize {
        self.smallest_full_rank
    }

    /// Reduces `row` against the existing pivots, then pivots it on the
    /// first free column it hits. Returns the new pivot column, or `n_cols`
    /// if the row reduced to a linear combination of the others.
    fn pivot_row_and_find_new_pivot(&mut self, row: usize) -> usize {
        let pivots: Vec<(usize, usize)> =
            self.pivot_col_row.iter().map(|(&c, &r)| (c, r)).collect();
        for (col, prow) in pivots {
            if self.red.get(row, col) {
                self.red.xor_row_into(prow, row);
                self.row_ops.xor_row_into(prow, row);
            }
        }

        let new_pivot = self
            .cols_without_pivot
            .iter()
            .copied()
            .find(|&c| self.red.get(row, c));

        match new_pivot {
            Some(col) => {
                self.cols_without_pivot.remove(&col);
                self.pivot_col_row.insert(col, row);
                self.pivot_row_col.insert(row, col);
                for i in 0..self.n_rows {
                    if i != row && self.red.get(i, col) {
                        self.red.xor_row_into(row, i);
                        self.row_ops.xor_row_into(row, i);
                    }
                }
                col
            }
            None => {
                self.rows_without_pivot.insert(row);
                self.n_cols
            }
        }
    }

    pub fn add_row(&mut self, bits: u64) {
        let row = self.n_rows;
        self.n_rows += 1;
        self.row_ops.resize(self.n_rows, self.n_rows);
        self.row_ops.set(row, row, true);
        self.red.stack_below(bits);
        self.base.stack_below(bits);

        self.pivot_row_and_find_new_pivot(row);

        self.smallest_full_rank = if self.pivot_col_row.len() < self.n_rows {
            self.n_cols + 1
        } else {
            self.pivot_col_row.keys().next_back().map_or(0, |&c| c + 1)
        };
    }

    /// Appends a column on the right; bit `i` of `col` is row `i`'s entry.
    pub fn add_column(&mut self, col: u64) {
        let transformed = self.row_ops.mul_col(col);
        self.red.stack_right(transformed);
        self.base.stack_right(col);
        let j = self.n_cols;
        self.n_cols += 1;

        let pivot_row = self
            .rows_without_pivot
            .iter()
            .copied()
            .find(|&r| self.red.get(r, j));
        match pivot_row {
            Some(r) => {
                self.rows_without_pivot.remove(&r);
                self.pivot_col_row.insert(j, r);
                self.pivot_row_col.insert(r, j);
                for i in 0..self.n_rows {
                    if i != r && self.red.get(i, j) {
                        self.red.xor_row_into(r, i);
                        self.row_ops.xor_row_into(r, i);
                    }
                }
            }
            None => {
                self.cols_without_pivot.insert(j);
            }
        }
    }

    /// Replaces base row `row` with `bits` and restores the invariant.
    pub fn replace_row(&mut self, row: usize, bits: u64) {
        assert!(row < self.n_rows);

        // Step 1: make the reducer row `row` the unique owner of base row
        // `row`. Some row with a row_ops bit in column `row` exists because
        // row_ops is invertible.
        if !self.row_ops.get(row, row) {
            let tmp = (0..self.n_rows)
                .find(|&r| self.row_ops.get(r, row))
                .expect("row_ops must be invertible");
            self.red.swap_rows(tmp, row);
            self.row_ops.swap_rows(tmp, row);
            self.swap_row_bookkeeping(tmp, row);
        }

        // Step 2: free this row's pivot; the pivot column becomes ordinary.
        if let Some(col) = self.pivot_row_col.remove(&row) {
            self.pivot_col_row.remove(&col);
            self.cols_without_pivot.insert(col);
        }
        self.rows_without_pivot.remove(&row);

        // Step 3: eliminate every other row's dependency on base row `row`.
        // Pivot columns of other rows carry a zero in this row, so these
        // xors cannot break the pivot structure.
        for i in 0..self.n_rows {
            if i != row && self.row_ops.get(i, row) {
                self.red.xor_row_into(row, i);
                self.row_ops.xor_row_into(row, i);
            }
        }

        // Step 4: swap in the new row; row_ops row becomes a unit vector.
        self.red.set_row(row, bits);
        self.base.set_row(row, bits);
        self.row_ops.clear_row(row);
        self.row_ops.set(row, row, true);

        let new_pivot = self.pivot_row_and_find_new_pivot(row);
        self.smallest_full_rank = self.smallest_full_rank.max(new_pivot + 1);

        // Step 5: rows that depended on the old base row may have become
        // independent; re-reduce pivotless rows until they are all zero.
        loop {
            let stale: Vec<usize> = self
                .rows_without_pivot
                .iter()
                .copied()
                .filter(|&r| self.red.row(r) != 0)
                .collect();
            if stale.is_empty() {
                break;
            }
            for r in stale {
                self.rows_without_pivot.remove(&r);
                self.pivot_row_and_find_new_pivot(r);
            }
        }
    }

    /// Replaces base column `col` with `bits` and restores the invariant.
    pub fn replace_column(&mut self, col: usize, bits: u64) {
        assert!(col < self.n_cols);

        if let Some(row) = self.pivot_col_row.remove(&col) {
            self.pivot_row_col.remove(&row);
            self.rows_without_pivot.insert(row);
        }
        self.cols_without_pivot.remove(&col);

        let transformed = self.row_ops.mul_col(bits);
        for i in 0..self.n_rows {
            self.red.set(i, col, (transformed >> i) & 1 == 1);
            self.base.set(i, col, (bits >> i) & 1 == 1);
        }

        let pivot_row = self
            .rows_without_pivot
            .iter()
            .copied()
            .find(|&r| self.red.get(r, col));
        match pivot_row {
            Some(r) => {
                self.rows_without_pivot.remove(&r);
                self.pivot_col_row.insert(col, r);
                self.pivot_row_col.insert(r, col);
                for i in 0..self.n_rows {
                    if i != r && self.red.get(i, col) {
                        self.red.xor_row_into(r, i);
                        self.row_ops.xor_row_into(r, i);
                    }
                }
            }
            None => {
                self.cols_without_pivot.insert(col);
            }
        }
    }

    fn swap_row_bookkeeping(&mut self, a: usize, b: usize) {
        let pa = self.pivot_row_col.remove(&a);
        let pb = self.pivot_row_col.remove(&b);
        if let Some(c) = pa {
            self.pivot_row_col.insert(b, c);
            self.pivot_col_row.insert(c, b);
        }
        if let Some(c) = pb {
            self.pivot_row_col.insert(a, c);
            self.pivot_col_row.insert(c, a);
        }
        let wa = self.rows_without_pivot.remove(&a);
        let wb = self.rows_without_pivot.remove(&b);
        if wa {
            self.rows_without_pivot.insert(b);
        }
        if wb {
            self.rows_without_pivot.insert(a);
        }
    }

    /// Validates every structural invariant; used by the tests after each
    /// mutation.
    pub fn check(&self) {
        assert!(
            self.row_ops.is_invertible(),
            "row operations matrix is not invertible"
        );
        let product = self.row_ops.mul(&self.base);
        assert!(
            product == self.red,
            "row_ops * base does not match the reduced matrix"
        );
        for (&col, &row) in &self.pivot_col_row {
            for i in 0..self.n_rows {
                assert!(
                    self.red.get(i, col) == (i == row),
                    "pivot column {col} is not reduced"
                );
            }
            assert_eq!(self.pivot_row_col.get(&row), Some(&col), "bimaps disagree");
        }
        assert_eq!(self.pivot_col_row.len(), self.pivot_row_col.len());
        for r in 0..self.n_rows {
            let has_pivot = self.pivot_row_col.contains_key(&r);
            let listed_free = self.rows_without_pivot.contains(&r);
            assert!(has_pivot != listed_free, "row {r} bookkeeping inconsistent");
            if listed_free {
                assert_eq!(self.red.row(r), 0, "pivotless row {r} is not reduced to zero");
            }
        }
        for c in 0..self.n_cols {
            let has_pivot = self.pivot_col_row.contains_key(&c);
            let listed_free = self.cols_without_pivot.contains(&c);
            assert!(has_pivot != listed_free, "column {c} bookkeeping inconsistent");
        }
    }
}
