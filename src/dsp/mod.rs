//! Signal processing stages that turn a recording into a detection envelope.

mod envelope;
mod filter;
mod peaks;
mod preprocess;

pub use envelope::{Envelope, EnvelopeExtractor, shannon_energy};
pub use filter::{Butterworth, FilterBand, ZeroPhaseKernel, convolve};
pub use peaks::find_peaks;
pub use preprocess::{
    Normalization, Preprocessed, Preprocessor, decimation_factor, downsample, normalize,
};

use crate::audio::DecodedAudio;

/// Samples at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Sample values.
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Signal {
    /// Create a signal from samples and a rate.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the signal has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let len = self.samples.len() as f64;
        if self.sample_rate == 0 {
            0.0
        } else {
            len / f64::from(self.sample_rate)
        }
    }
}

impl From<DecodedAudio> for Signal {
    fn from(audio: DecodedAudio) -> Self {
        Self {
            samples: audio.samples.into_iter().map(f64::from).collect(),
            sample_rate: audio.sample_rate,
        }
    }
}
