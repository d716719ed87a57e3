//! Zero-phase Butterworth kernels and full convolution.
//!
//! Filters are designed from the analog Butterworth prototype, moved to the
//! requested band, and discretized with the bilinear transform. The result is
//! kept as cascaded second-order sections. A [`ZeroPhaseKernel`] is the
//! response of such a filter run forward and backward over a centered unit
//! impulse, so applying it by convolution filters without phase distortion at
//! the cost of a fixed delay of half the kernel length.

use crate::error::{Error, Result};
use realfft::RealFftPlanner;
use realfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Below this many taps (on the shorter operand) convolution is done directly.
const DIRECT_CONVOLUTION_LIMIT: usize = 64;

/// Roots with an imaginary part below this are treated as real.
const IMAG_TOLERANCE: f64 = 1e-10;

/// Frequency band of a Butterworth design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterBand {
    /// Low-pass with the given cutoff in Hz.
    LowPass {
        /// Cutoff frequency in Hz.
        cutoff_hz: f64,
    },
    /// Band-pass between two cutoffs in Hz.
    BandPass {
        /// Lower cutoff in Hz.
        low_hz: f64,
        /// Upper cutoff in Hz.
        high_hz: f64,
    },
}

/// Second-order IIR section with `a[0] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Biquad {
    b: [f64; 3],
    a: [f64; 3],
}

impl Biquad {
    /// Filter `samples` in place (direct form II transposed, zero initial state).
    fn run(&self, samples: &mut [f64]) {
        let mut w1 = 0.0;
        let mut w2 = 0.0;
        for sample in samples.iter_mut() {
            let x = *sample;
            let y = self.b[0].mul_add(x, w1);
            w1 = self.b[1].mul_add(x, -self.a[1] * y) + w2;
            w2 = self.b[2].mul_add(x, -self.a[2] * y);
            *sample = y;
        }
    }
}

/// Digital Butterworth filter as cascaded second-order sections.
///
/// `order` follows the half-order convention: a band-pass of order `N`
/// has `2N` poles, a low-pass of order `N` has `N`.
#[derive(Debug, Clone, PartialEq)]
pub struct Butterworth {
    sections: Vec<Biquad>,
}

impl Butterworth {
    /// Design a filter for `band` at `sample_rate`.
    pub fn design(band: FilterBand, sample_rate: u32, order: usize) -> Result<Self> {
        if order == 0 {
            return Err(Error::FilterDesign {
                reason: "order must be at least 1".to_string(),
            });
        }
        let fs = f64::from(sample_rate);
        let nyquist = fs / 2.0;
        // Pre-warped analog frequency for a bilinear transform at fs = 2.
        let warp = |hz: f64| 4.0 * (PI * hz / fs).tan();

        #[allow(clippy::cast_precision_loss)]
        let n = order as f64;
        let prototype: Vec<Complex64> = (0..order)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let m = 2.0f64.mul_add(i as f64, 1.0 - n);
                -Complex64::from_polar(1.0, PI * m / (2.0 * n))
            })
            .collect();

        let (zeros, poles, gain) = match band {
            FilterBand::LowPass { cutoff_hz } => {
                if !(cutoff_hz > 0.0 && cutoff_hz < nyquist) {
                    return Err(Error::FilterDesign {
                        reason: format!(
                            "low-pass cutoff {cutoff_hz} Hz must lie in (0, {nyquist}) Hz"
                        ),
                    });
                }
                let wo = warp(cutoff_hz);
                let poles: Vec<Complex64> = prototype.iter().map(|&p| p * wo).collect();
                (Vec::new(), poles, wo.powf(n))
            }
            FilterBand::BandPass { low_hz, high_hz } => {
                if !(low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
                    return Err(Error::FilterDesign {
                        reason: format!(
                            "band-pass cutoffs {low_hz}-{high_hz} Hz must satisfy 0 < low < high < {nyquist} Hz"
                        ),
                    });
                }
                let (wl, wh) = (warp(low_hz), warp(high_hz));
                let bw = wh - wl;
                let wo2 = wl * wh;
                let shifted: Vec<Complex64> = prototype.iter().map(|&p| p * (bw / 2.0)).collect();
                let mut poles = Vec::with_capacity(2 * order);
                poles.extend(shifted.iter().map(|&p| p + (p * p - wo2).sqrt()));
                poles.extend(shifted.iter().map(|&p| p - (p * p - wo2).sqrt()));
                (vec![Complex64::new(0.0, 0.0); order], poles, bw.powf(n))
            }
        };

        let (zeros, poles, gain) = bilinear(&zeros, &poles, gain);
        Ok(Self {
            sections: into_sections(&zeros, &poles, gain),
        })
    }

    /// Run the filter forward over `samples` in place.
    pub fn filter_in_place(&self, samples: &mut [f64]) {
        for section in &self.sections {
            section.run(samples);
        }
    }

    /// Run the filter forward, then backward, over `samples` in place.
    pub fn filtfilt_in_place(&self, samples: &mut [f64]) {
        self.filter_in_place(samples);
        samples.reverse();
        self.filter_in_place(samples);
        samples.reverse();
    }
}

/// Bilinear transform at fs = 2 of an analog zero/pole/gain description.
fn bilinear(
    zeros: &[Complex64],
    poles: &[Complex64],
    gain: f64,
) -> (Vec<Complex64>, Vec<Complex64>, f64) {
    let fs2 = Complex64::new(4.0, 0.0);
    let mut digital_zeros: Vec<Complex64> = zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    digital_zeros.resize(poles.len(), Complex64::new(-1.0, 0.0));
    let digital_poles = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    let num: Complex64 = zeros.iter().map(|&z| fs2 - z).product();
    let den: Complex64 = poles.iter().map(|&p| fs2 - p).product();
    (digital_zeros, digital_poles, gain * (num / den).re)
}

/// Group roots into real polynomials of degree two (or one for a leftover
/// real root, always placed last).
fn root_polynomials(roots: &[Complex64]) -> Vec<[f64; 3]> {
    let mut polys = Vec::new();
    let mut reals = Vec::new();
    for root in roots {
        if root.im > IMAG_TOLERANCE {
            polys.push([1.0, -2.0 * root.re, root.norm_sqr()]);
        } else if root.im.abs() <= IMAG_TOLERANCE {
            reals.push(root.re);
        }
    }
    reals.sort_by(f64::total_cmp);

    let (mut lo, mut hi) = (0, reals.len());
    while hi - lo >= 2 {
        let (a, b) = (reals[lo], reals[hi - 1]);
        polys.push([1.0, -(a + b), a * b]);
        lo += 1;
        hi -= 1;
    }
    if hi - lo == 1 {
        polys.push([1.0, -reals[lo], 0.0]);
    }
    polys
}

fn into_sections(zeros: &[Complex64], poles: &[Complex64], gain: f64) -> Vec<Biquad> {
    let numerators = root_polynomials(zeros);
    let mut sections: Vec<Biquad> = root_polynomials(poles)
        .into_iter()
        .enumerate()
        .map(|(i, a)| Biquad {
            b: numerators.get(i).copied().unwrap_or([1.0, 0.0, 0.0]),
            a,
        })
        .collect();
    if let Some(first) = sections.first_mut() {
        first.b.iter_mut().for_each(|c| *c *= gain);
    }
    sections
}

/// Symmetric FIR kernel equal to a Butterworth filter applied forward and
/// backward to a centered unit impulse.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroPhaseKernel {
    taps: Vec<f64>,
}

impl ZeroPhaseKernel {
    /// Design a kernel of `kernel_size / 2` zeros on each side of the impulse
    /// (`kernel_size + 1` taps for even sizes).
    pub fn design(
        band: FilterBand,
        sample_rate: u32,
        order: usize,
        kernel_size: usize,
    ) -> Result<Self> {
        let filter = Butterworth::design(band, sample_rate, order)?;
        let half = kernel_size / 2;
        let mut taps = vec![0.0; 2 * half + 1];
        taps[half] = 1.0;
        filter.filtfilt_in_place(&mut taps);
        Ok(Self { taps })
    }

    /// Kernel coefficients.
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Number of taps.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Whether the kernel has no taps.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Delay in samples introduced by full convolution with this kernel.
    pub fn delay(&self) -> usize {
        self.taps.len() / 2
    }

    /// Full convolution of `signal` with the kernel.
    pub fn apply(&self, signal: &[f64]) -> Result<Vec<f64>> {
        convolve(signal, &self.taps)
    }
}

/// Full linear convolution; the output has `signal.len() + kernel.len() - 1`
/// samples (empty if either input is empty).
pub fn convolve(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>> {
    if signal.is_empty() || kernel.is_empty() {
        return Ok(Vec::new());
    }
    if signal.len().min(kernel.len()) <= DIRECT_CONVOLUTION_LIMIT {
        return Ok(convolve_direct(signal, kernel));
    }
    convolve_fft(signal, kernel)
}

fn convolve_direct(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let mut output = vec![0.0; signal.len() + kernel.len() - 1];
    for (i, &s) in signal.iter().enumerate() {
        for (out, &k) in output[i..].iter_mut().zip(kernel) {
            *out = s.mul_add(k, *out);
        }
    }
    output
}

fn convolve_fft(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>> {
    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = out_len.next_power_of_two();

    let mut planner = RealFftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut buffer = forward.make_input_vec();
    buffer[..signal.len()].copy_from_slice(signal);
    let mut spectrum = forward.make_output_vec();
    forward
        .process(&mut buffer, &mut spectrum)
        .map_err(fft_error)?;

    // process() scrambles its input, so the buffer is cleared before reuse.
    buffer.fill(0.0);
    buffer[..kernel.len()].copy_from_slice(kernel);
    let mut kernel_spectrum = forward.make_output_vec();
    forward
        .process(&mut buffer, &mut kernel_spectrum)
        .map_err(fft_error)?;

    for (s, k) in spectrum.iter_mut().zip(&kernel_spectrum) {
        *s *= *k;
    }

    let mut output = inverse.make_output_vec();
    inverse
        .process(&mut spectrum, &mut output)
        .map_err(fft_error)?;

    #[allow(clippy::cast_precision_loss)]
    let scale = 1.0 / fft_len as f64;
    output.truncate(out_len);
    output.iter_mut().for_each(|v| *v *= scale);
    Ok(output)
}

fn fft_error(e: realfft::FftError) -> Error {
    Error::Fft {
        reason: e.to_string(),
    }
}
