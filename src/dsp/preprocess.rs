//! Band-pass filtering, decimation and amplitude normalization.

use super::{FilterBand, Signal, ZeroPhaseKernel};
use crate::config::BandpassConfig;
use crate::error::{Error, Result};
use tracing::debug;

/// How [`normalize`] scales a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Divide by the largest absolute sample.
    Max,
    /// Divide by the sample standard deviation (N-1 divisor).
    StdDev,
}

/// Scale `x` so that its peak magnitude or standard deviation is one.
///
/// Fails with [`Error::SilentSignal`] when the scale is zero (or not finite).
pub fn normalize(x: &[f64], mode: Normalization) -> Result<Vec<f64>> {
    let scale = match mode {
        Normalization::Max => x.iter().fold(0.0f64, |m, v| m.max(v.abs())),
        Normalization::StdDev => sample_std_dev(x),
    };
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::SilentSignal { len: x.len() });
    }
    Ok(x.iter().map(|v| v / scale).collect())
}

fn sample_std_dev(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let sum_sq: f64 = x.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (n - 1.0)).sqrt()
}

/// Integer factor between `original` and `target` rates.
pub fn decimation_factor(original: u32, target: u32) -> Result<usize> {
    if original == 0 || target == 0 || original % target != 0 {
        return Err(Error::SampleRateRatio { original, target });
    }
    Ok((original / target) as usize)
}

/// Keep every M-th sample, where `M = original / target` must be an integer.
pub fn downsample(x: &[f64], original: u32, target: u32) -> Result<(Vec<f64>, usize)> {
    let factor = decimation_factor(original, target)?;
    Ok((x.iter().step_by(factor).copied().collect(), factor))
}

/// Output of the preprocessing stage.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Band-passed, decimated, peak-normalized signal at the processing rate.
    pub signal: Signal,
    /// Decimation factor M.
    pub decimation: usize,
    /// Delay in original-rate samples introduced by the band-pass convolution.
    pub bandpass_delay: usize,
}

/// Band-pass, decimate and normalize raw recordings.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    bandpass: BandpassConfig,
    target_rate: u32,
}

impl Preprocessor {
    /// Create a preprocessor for the given band-pass settings and processing rate.
    pub fn new(bandpass: &BandpassConfig, target_rate: u32) -> Self {
        Self {
            bandpass: bandpass.clone(),
            target_rate,
        }
    }

    /// Processing sample rate in Hz.
    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Design the band-pass kernel for recordings at `sample_rate`.
    pub fn kernel_for(&self, sample_rate: u32) -> Result<ZeroPhaseKernel> {
        ZeroPhaseKernel::design(
            FilterBand::BandPass {
                low_hz: self.bandpass.low_hz,
                high_hz: self.bandpass.high_hz,
            },
            sample_rate,
            self.bandpass.order,
            self.bandpass.kernel_size,
        )
    }

    /// Run the preprocessing stage on a raw recording.
    pub fn run(&self, raw: &Signal) -> Result<Preprocessed> {
        // Reject the rate before paying for the convolution.
        let decimation = decimation_factor(raw.sample_rate, self.target_rate)?;
        let kernel = self.kernel_for(raw.sample_rate)?;
        debug!(
            "Band-pass {}-{} Hz, {} taps, decimation {}",
            self.bandpass.low_hz,
            self.bandpass.high_hz,
            kernel.len(),
            decimation
        );

        let filtered = kernel.apply(&raw.samples)?;
        let (decimated, _) = downsample(&filtered, raw.sample_rate, self.target_rate)?;
        let normalized = normalize(&decimated, Normalization::Max)?;

        Ok(Preprocessed {
            signal: Signal::new(normalized, self.target_rate),
            decimation,
            bandpass_delay: kernel.delay(),
        })
    }
}
