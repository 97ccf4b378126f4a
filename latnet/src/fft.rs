//! Complex FFTs used by the fast CBC inner product.
//!
//! Power-of-two lengths run through an iterative radix-2 transform with a
//! precomputed root table; other lengths (the unit-group orders of odd prime
//! bases and of polynomial moduli are not powers of two) go through
//! Bluestein's chirp-z reduction to a power-of-two convolution.

use latnet_util::{log2_ceil, log2_strict, reverse_index_bits_in_place};
use num::complex::Complex64;

use crate::types::Real;

pub type Complex = Complex64;

pub type FftRootTable = Vec<Vec<Complex>>;

pub fn fft_root_table(n: usize) -> FftRootTable {
    let lg_n = log2_strict(n);
    let mut root_table = Vec::with_capacity(lg_n);
    for lg_m in 1..=lg_n {
        let half_m = 1 << (lg_m - 1);
        let base = -core::f64::consts::PI / half_m as Real;
        let root_row = (0..half_m)
            .map(|j| Complex::from_polar(1.0, base * j as Real))
            .collect();
        root_table.push(root_row);
    }
    root_table
}

fn fft_classic(values: &mut [Complex], root_table: &FftRootTable) {
    reverse_index_bits_in_place(values);

    let n = values.len();
    let lg_n = log2_strict(n);
    if root_table.len() != lg_n {
        panic!(
            "Expected root table of length {}, but it was {}.",
            lg_n,
            root_table.len()
        );
    }

    for lg_half_m in 0..lg_n {
        let half_m = 1 << lg_half_m;
        let m = half_m * 2;
        for k in (0..n).step_by(m) {
            for j in 0..half_m {
                let omega = root_table[lg_half_m][j];
                let t = omega * values[k + half_m + j];
                let u = values[k + j];
                values[k + j] = u + t;
                values[k + half_m + j] = u - t;
            }
        }
    }
}

fn fft_pow2(values: &mut [Complex]) {
    let table = fft_root_table(values.len());
    fft_classic(values, &table);
}

/// Discrete Fourier transform, any length.
pub fn fft(input: &[Complex]) -> Vec<Complex> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    if n.is_power_of_two() {
        let mut buf = input.to_vec();
        fft_pow2(&mut buf);
        buf
    } else {
        bluestein(input)
    }
}

/// Inverse transform with 1/n normalization; `ifft(fft(v)) == v`.
pub fn ifft(input: &[Complex]) -> Vec<Complex> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    let conj: Vec<Complex> = input.iter().map(Complex::conj).collect();
    let mut out = fft(&conj);
    let scale = 1.0 / n as Real;
    for x in &mut out {
        *x = x.conj() * scale;
    }
    out
}

pub fn fft_real(input: &[Real]) -> Vec<Complex> {
    let buf: Vec<Complex> = input.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft(&buf)
}

/// Bluestein's algorithm: an arbitrary-length DFT as a cyclic convolution of
/// chirped sequences, evaluated at the next power of two >= 2n - 1.
fn bluestein(input: &[Complex]) -> Vec<Complex> {
    let n = input.len();
    let m = 1 << log2_ceil(2 * n - 1);

    // chirp[k] = exp(-pi i k^2 / n); k^2 is reduced mod 2n to keep the
    // angle argument small.
    let chirp: Vec<Complex> = (0..n)
        .map(|k| {
            let k2 = (k as u128 * k as u128 % (2 * n as u128)) as Real;
            Complex::from_polar(1.0, -core::f64::consts::PI * k2 / n as Real)
        })
        .collect();

    let mut a = vec![Complex::new(0.0, 0.0); m];
    for k in 0..n {
        a[k] = input[k] * chirp[k];
    }

    let mut b = vec![Complex::new(0.0, 0.0); m];
    b[0] = chirp[0].conj();
    for k in 1..n {
        b[k] = chirp[k].conj();
        b[m - k] = chirp[k].conj();
    }

    fft_pow2(&mut a);
    fft_pow2(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x *= y;
    }
    let c = ifft(&a);

    (0..n).map(|k| c[k] * chirp[k]).collect()
}

/// Cyclic convolution `out[t] = sum_j lhs[j] * rhs[(t - j) mod n]`.
pub fn cyclic_convolution(lhs: &[Real], rhs_fft: &[Complex]) -> Vec<Real> {
    assert_eq!(
        lhs.len(),
        rhs_fft.len(),
        "FFT size inconsistency in cyclic convolution"
    );
    let mut a = fft_real(lhs);
    for (x, y) in a.iter_mut().zip(rhs_fft) {
        *x *= y;
    }
    ifft(&a).into_iter().map(|x| x.re).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dft(input: &[Complex]) -> Vec<Complex> {
        let n = input.len();
        (0..n)
            .map(|k| {
                (0..n)
                    .map(|j| {
                        let angle =
                            -2.0 * core::f64::consts::PI * (j * k % n) as Real / n as Real;
                        input[j] * Complex::from_polar(1.0, angle)
                    })
                    .sum()
            })
            .collect()
    }

    fn ramp(n: usize) -> Vec<Complex> {
        (0..n)
            .map(|i| Complex::new((i * 7 % 23) as Real, (i * 3 % 11) as Real))
            .collect()
    }

    #[test]
    fn fft_matches_naive_dft() {
        for n in [1usize, 2, 4, 8, 16, 3, 5, 6, 12, 31, 100] {
            let input = ramp(n);
            let fast = fft(&input);
            let slow = naive_dft(&input);
            for (a, b) in fast.iter().zip(&slow) {
                assert!((a - b).norm() < 1e-9 * (n as Real), "length {n}");
            }
        }
    }

    #[test]
    fn ifft_inverts_fft() {
        for n in [2usize, 16, 31, 255, 1 << 12, 1 << 20] {
            let input = ramp(n);
            let back = ifft(&fft(&input));
            for (a, b) in input.iter().zip(&back) {
                assert!((a - b).norm() < 1e-12 * (n as Real).max(1.0), "length {n}");
            }
        }
    }

    #[test]
    fn convolution_matches_naive() {
        for n in [4usize, 7, 12] {
            let lhs: Vec<Real> = (0..n).map(|i| (i as Real).sin()).collect();
            let rhs: Vec<Real> = (0..n).map(|i| 1.0 / (1 + i) as Real).collect();
            let rhs_fft = fft_real(&rhs);
            let fast = cyclic_convolution(&lhs, &rhs_fft);
            for t in 0..n {
                let slow: Real =
                    (0..n).map(|j| lhs[j] * rhs[(t + n - j) % n]).sum();
                assert!((fast[t] - slow).abs() < 1e-10, "length {n} index {t}");
            }
        }
    }

    #[test]
    #[should_panic]
    fn convolution_rejects_mismatched_lengths() {
        let rhs_fft = fft_real(&[1.0, 2.0, 3.0]);
        cyclic_convolution(&[1.0, 2.0], &rhs_fft);
    }
}
