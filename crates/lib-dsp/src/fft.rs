//! FFT operations.
//!
//! Two transforms live here:
//! - [`radix2_fft`]: an in-place, iterative, bit-reversal-permuted radix-2
//!   Cooley-Tukey transform used by the FIR stage evaluation, where the
//!   table size is fixed and small.
//! - [`FftEngine`]: a cached real-FFT planner (realfft) used for waveform
//!   transforms of arbitrary power-of-two length.

use crate::error::{DspError, DspResult};
use num_complex::Complex64;
use realfft::RealFftPlanner;
use std::f64::consts::PI;

/// Transform direction; the sign of the twiddle exponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FftDirection {
    /// `exp(-i 2 pi k n / N)`, unnormalized.
    Forward,
    /// `exp(+i 2 pi k n / N)`, normalized by `1 / N`.
    Inverse,
}

impl FftDirection {
    #[inline]
    fn sign(self) -> f64 {
        match self {
            FftDirection::Forward => -1.0,
            FftDirection::Inverse => 1.0,
        }
    }
}

/// Smallest power of two strictly greater than `n`, and at least 2.
///
/// `next2(513) == 1024`, `next2(1024) == 2048`.
pub fn next2(n: usize) -> usize {
    let mut p = 2;
    while p <= n {
        p <<= 1;
    }
    p
}

/// Reorder `data` so that element `i` moves to the bit-reversed index of `i`.
fn bit_reverse_permute(data: &mut [Complex64]) {
    let n = data.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            data.swap(i, j);
        }
    }
}

/// In-place radix-2 FFT.
///
/// After bit-reversal, each stage combines pairs `span` apart. The butterfly
/// loop runs over columns (offset inside a group, which fixes the twiddle)
/// and rows (group starts, stepping by `2 * span`).
pub fn radix2_fft(data: &mut [Complex64], direction: FftDirection) -> DspResult<()> {
    let n = data.len();
    if n == 0 || !n.is_power_of_two() {
        return Err(DspError::InvalidFftSize(n));
    }

    bit_reverse_permute(data);

    let sign = direction.sign();
    let mut span = 1;
    while span < n {
        let theta = sign * PI / span as f64;
        for column in 0..span {
            let w = Complex64::from_polar(1.0, theta * column as f64);
            let mut row = column;
            while row < n {
                let partner = row + span;
                let t = w * data[partner];
                data[partner] = data[row] - t;
                data[row] += t;
                row += 2 * span;
            }
        }
        span <<= 1;
    }

    if direction == FftDirection::Inverse {
        let scale = 1.0 / n as f64;
        for x in data.iter_mut() {
            *x *= scale;
        }
    }
    Ok(())
}

/// Real-FFT engine with a cached planner.
pub struct FftEngine {
    planner: RealFftPlanner<f64>,
}

impl FftEngine {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
        }
    }

    /// Forward real-to-complex FFT.
    ///
    /// Input: N real samples
    /// Output: N/2 + 1 complex samples
    pub fn rfft(&mut self, data: &[f64]) -> DspResult<Vec<Complex64>> {
        let len = data.len();
        if !len.is_power_of_two() {
            return Err(DspError::InvalidFftSize(len));
        }

        let r2c = self.planner.plan_fft_forward(len);
        let mut input = data.to_vec();
        let mut output = r2c.make_output_vec();

        r2c.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        Ok(output)
    }

    /// Inverse complex-to-real FFT, normalized by `1 / output_len`.
    ///
    /// The imaginary parts of the DC and Nyquist bins are discarded, as a
    /// real signal cannot carry them.
    pub fn irfft(&mut self, data: &[Complex64], output_len: usize) -> DspResult<Vec<f64>> {
        if !output_len.is_power_of_two() {
            return Err(DspError::InvalidFftSize(output_len));
        }

        let expected_input_len = output_len / 2 + 1;
        if data.len() != expected_input_len {
            return Err(DspError::LengthMismatch {
                expected: expected_input_len,
                actual: data.len(),
            });
        }

        let c2r = self.planner.plan_fft_inverse(output_len);
        let mut input = data.to_vec();
        input[0].im = 0.0;
        input[expected_input_len - 1].im = 0.0;
        let mut output = c2r.make_output_vec();

        c2r.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        let scale = 1.0 / output_len as f64;
        for x in output.iter_mut() {
            *x *= scale;
        }

        Ok(output)
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}
