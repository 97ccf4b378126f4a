//! Sobol nets: generating matrices from primitive polynomials and direction
//! numbers.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{bail, ensure, Context, Result};
use latnet_gf2::BitMatrix;

use crate::net::DigitalNet;

/// A primitive polynomial over GF(2) in the Sobol convention: its degree
/// and the bits of the interior coefficients `a_1..a_{degree-1}` (most
/// significant first); the leading and constant coefficients are 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PrimitivePolynomial {
    pub degree: u32,
    pub representation: u64,
}

static EMBEDDED_TABLE: OnceLock<Vec<PrimitivePolynomial>> = OnceLock::new();

fn parse_table(content: &str) -> Result<Vec<PrimitivePolynomial>> {
    let mut table = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (deg, rep) = line
            .split_once(',')
            .with_context(|| format!("malformed table line {}", lineno + 1))?;
        table.push(PrimitivePolynomial {
            degree: deg.trim().parse()?,
            representation: rep.trim().parse()?,
        });
    }
    Ok(table)
}

fn embedded_table() -> &'static [PrimitivePolynomial] {
    EMBEDDED_TABLE.get_or_init(|| {
        parse_table(include_str!("../../data/primitive_polynomials.csv"))
            .expect("the embedded polynomial table parses")
    })
}

/// The `n`-th primitive polynomial (1-based rank). Ranks beyond the
/// embedded table require [`load_primitive_polynomials`].
pub fn nth_primitive_polynomial(n: usize) -> Result<PrimitivePolynomial> {
    let table = embedded_table();
    ensure!(
        n >= 1 && n <= table.len(),
        "primitive polynomial rank {n} outside the available table (1..={})",
        table.len()
    );
    Ok(table[n - 1])
}

/// Reads a full `(degree, representation)` table, one pair per line, from
/// the given path (the distributed tables carry 21200 ranks).
pub fn load_primitive_polynomials(path: &Path) -> Result<Vec<PrimitivePolynomial>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading primitive polynomials from {}", path.display()))?;
    parse_table(&content)
}

/// Parses Joe-Kuo style direction numbers: one line per coordinate starting
/// from coordinate 2, integers separated by `;` or `,`.
pub fn parse_direction_numbers(content: &str, dimension: usize) -> Result<Vec<Vec<u64>>> {
    let mut result = vec![Vec::new()];
    for line in content.lines() {
        if result.len() >= dimension {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let numbers: Result<Vec<u64>> = line
            .split(|c| c == ';' || c == ',')
            .map(|tok| tok.trim().parse::<u64>().map_err(Into::into))
            .collect();
        result.push(numbers?);
    }
    ensure!(
        result.len() == dimension,
        "direction number table has {} coordinates, {dimension} requested",
        result.len()
    );
    Ok(result)
}

pub fn load_direction_numbers(path: &Path, dimension: usize) -> Result<Vec<Vec<u64>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading direction numbers from {}", path.display()))?;
    parse_direction_numbers(&content, dimension)
}

/// A Sobol net in base 2: `dimension` coordinates with `m`-bit output.
///
/// Coordinate 1 uses the identity matrix; coordinate `j >= 2` derives its
/// matrix from the `(j-1)`-th primitive polynomial and the supplied initial
/// direction numbers via the standard recurrence.
#[derive(Clone, Debug)]
pub struct SobolNet {
    dimension: usize,
    m: usize,
    direction_numbers: Vec<Vec<u64>>,
}

impl SobolNet {
    pub fn new(dimension: usize, m: usize, direction_numbers: Vec<Vec<u64>>) -> Result<Self> {
        ensure!(dimension >= 1, "a net needs at least one coordinate");
        ensure!(m >= 1 && m <= 63, "matrix size {m} out of range");
        ensure!(
            direction_numbers.len() == dimension,
            "need direction numbers for {dimension} coordinates, got {}",
            direction_numbers.len()
        );
        for (coord, numbers) in direction_numbers.iter().enumerate().skip(1) {
            let poly = nth_primitive_polynomial(coord)?;
            let needed = (poly.degree as usize).min(m);
            ensure!(
                numbers.len() >= needed,
                "coordinate {} needs {needed} direction numbers, got {}",
                coord + 1,
                numbers.len()
            );
            for (k, &mk) in numbers.iter().enumerate() {
                if mk % 2 == 0 || mk >= 2 << k {
                    bail!(
                        "direction number m_{} = {mk} of coordinate {} must be odd and < {}",
                        k + 1,
                        coord + 1,
                        2u64 << k
                    );
                }
            }
        }
        Ok(SobolNet {
            dimension,
            m,
            direction_numbers,
        })
    }

    /// The full sequence `m_1..m_m` of direction numbers of a coordinate:
    /// the supplied initial values continued by the recurrence
    /// `m_k = 2 a_1 m_{k-1} ^ ... ^ 2^{s-1} a_{s-1} m_{k-s+1}
    ///        ^ 2^s m_{k-s} ^ m_{k-s}`.
    fn m_values(&self, coord: usize) -> Vec<u64> {
        assert!(coord >= 1, "coordinate 1 has no recurrence");
        let poly = nth_primitive_polynomial(coord).expect("validated at construction");
        let s = poly.degree as usize;
        let supplied = &self.direction_numbers[coord];

        let mut m_values = Vec::with_capacity(self.m);
        for k in 0..self.m.min(s) {
            m_values.push(supplied[k]);
        }
        for k in s..self.m {
            let mut next = (1u64 << s) * m_values[k - s] ^ m_values[k - s];
            for i in 1..s {
                let a_i = poly.representation >> (s - 1 - i) & 1;
                if a_i == 1 {
                    next ^= (1u64 << i) * m_values[k - i];
                }
            }
            m_values.push(next);
        }
        m_values
    }
}

impl DigitalNet for SobolNet {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn num_columns(&self) -> usize {
        self.m
    }

    /// Entry `(r, c)` of the matrix is bit `c - r` of `m_{c+1}`; the
    /// matrices are upper triangular with a unit diagonal because the
    /// direction numbers are odd.
    fn generating_matrix(&self, coord: usize) -> BitMatrix {
        assert!(coord < self.dimension);
        if coord == 0 {
            return BitMatrix::identity(self.m);
        }
        let m_values = self.m_values(coord);
        let mut g = BitMatrix::new(self.m, self.m);
        for c in 0..self.m {
            for r in 0..=c {
                if m_values[c] >> (c - r) & 1 == 1 {
                    g.set(r, c, true);
                }
            }
        }
        g
    }
}
