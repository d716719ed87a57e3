//! Shannon energy envelope.

use super::{FilterBand, Normalization, Signal, ZeroPhaseKernel, normalize};
use crate::config::EnvelopeConfig;
use crate::constants::envelope::ENERGY_FLOOR;
use crate::error::Result;

/// Shannon energy `-x^2 * log10(x^2)` of a peak-normalized signal.
///
/// `x^2` is clamped to `[1e-4, 1]` inside the logarithm, so near-silent
/// samples stay finite and samples beyond full scale contribute no energy.
/// The result is never negative.
pub fn shannon_energy(x: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&v| {
            let sq = v * v;
            -sq * sq.clamp(ENERGY_FLOOR, 1.0).log10()
        })
        .collect()
}

/// Detection envelope at the processing rate.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Envelope values, unit sample standard deviation.
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Delay in samples of the envelope relative to the preprocessed signal.
    pub delay: usize,
}

impl Envelope {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the envelope has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in minutes.
    pub fn duration_minutes(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let len = self.samples.len() as f64;
        len / f64::from(self.sample_rate) / 60.0
    }
}

/// Computes the Shannon energy envelope of preprocessed signals.
#[derive(Debug, Clone)]
pub struct EnvelopeExtractor {
    kernel: ZeroPhaseKernel,
    sample_rate: u32,
}

impl EnvelopeExtractor {
    /// Design the envelope low-pass for signals at `sample_rate`.
    pub fn new(config: &EnvelopeConfig, sample_rate: u32) -> Result<Self> {
        let kernel = ZeroPhaseKernel::design(
            FilterBand::LowPass {
                cutoff_hz: config.cutoff_hz,
            },
            sample_rate,
            config.order,
            config.kernel_size,
        )?;
        Ok(Self {
            kernel,
            sample_rate,
        })
    }

    /// Low-pass kernel used for smoothing.
    pub fn kernel(&self) -> &ZeroPhaseKernel {
        &self.kernel
    }

    /// Energy, low-pass, then standard-deviation normalization.
    pub fn extract(&self, signal: &Signal) -> Result<Envelope> {
        let energy = shannon_energy(&signal.samples);
        let smoothed = self.kernel.apply(&energy)?;
        let samples = normalize(&smoothed, Normalization::StdDev)?;
        Ok(Envelope {
            samples,
            sample_rate: self.sample_rate,
            delay: self.kernel.delay(),
        })
    }
}
