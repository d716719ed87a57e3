//! Configuration type definitions.

use crate::constants::{DEFAULT_TARGET_RATE, bandpass, envelope, output, segmentation};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Band-pass pre-filter applied at the original sample rate.
    pub bandpass: BandpassConfig,

    /// Decimation settings.
    pub downsampling: DownsamplingConfig,

    /// Shannon energy envelope settings.
    pub envelope: EnvelopeConfig,

    /// Peak detection, classification and repair settings.
    pub segmentation: SegmentationConfig,

    /// Output settings.
    pub output: OutputConfig,
}

/// Band-pass pre-filter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BandpassConfig {
    /// Lower cutoff frequency in Hz.
    pub low_hz: f64,
    /// Upper cutoff frequency in Hz.
    pub high_hz: f64,
    /// Butterworth half-order.
    pub order: usize,
    /// Zero-phase kernel length minus one.
    pub kernel_size: usize,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        Self {
            low_hz: bandpass::DEFAULT_LOW_HZ,
            high_hz: bandpass::DEFAULT_HIGH_HZ,
            order: bandpass::DEFAULT_ORDER,
            kernel_size: bandpass::DEFAULT_KERNEL_SIZE,
        }
    }
}

/// Decimation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownsamplingConfig {
    /// Processing sample rate in Hz. Must divide every input rate.
    pub target_rate: u32,
}

impl Default for DownsamplingConfig {
    fn default() -> Self {
        Self {
            target_rate: DEFAULT_TARGET_RATE,
        }
    }
}

/// Envelope low-pass settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Butterworth order.
    pub order: usize,
    /// Cutoff frequency in Hz.
    pub cutoff_hz: f64,
    /// Zero-phase kernel length minus one.
    pub kernel_size: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            order: envelope::DEFAULT_ORDER,
            cutoff_hz: envelope::DEFAULT_CUTOFF_HZ,
            kernel_size: envelope::DEFAULT_KERNEL_SIZE,
        }
    }
}

/// Peak detection, classification and repair settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Initial peak height threshold.
    pub min_height: f64,
    /// Minimum distance between peaks in seconds.
    pub min_dist_secs: f64,
    /// Envelope level delimiting S1/S2 domains.
    pub envelope_threshold: f64,
    /// Half-width of the missing-peak search window in seconds.
    pub repair_window_secs: f64,
    /// Uncertain peaks tolerated per minute before the threshold is raised.
    pub max_uncertain_per_min: f64,
    /// Highest threshold the adaptive search may reach.
    pub max_comp_height: f64,
    /// Number of threshold steps of the adaptive search.
    pub max_comp_iter: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_height: segmentation::DEFAULT_MIN_HEIGHT,
            min_dist_secs: segmentation::DEFAULT_MIN_DIST_SECS,
            envelope_threshold: segmentation::DEFAULT_ENVELOPE_THRESHOLD,
            repair_window_secs: segmentation::DEFAULT_REPAIR_WINDOW_SECS,
            max_uncertain_per_min: segmentation::DEFAULT_MAX_UNCERTAIN_PER_MIN,
            max_comp_height: segmentation::DEFAULT_MAX_COMP_HEIGHT,
            max_comp_iter: segmentation::DEFAULT_MAX_COMP_ITER,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Base directory for segmented audio.
    pub dir: PathBuf,
    /// Directory name for concatenated signals.
    pub concat_dir: String,
    /// Directory name for masked signals.
    pub segmented_dir: String,
    /// Write processing-rate signals.
    pub write_processed: bool,
    /// Write original-rate signals.
    pub write_raw: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(output::DEFAULT_DIR),
            concat_dir: output::DEFAULT_CONCAT_DIR.to_string(),
            segmented_dir: output::DEFAULT_SEGMENTED_DIR.to_string(),
            write_processed: true,
            write_raw: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_values() {
        let config = Config::default();
        assert_eq!(config.bandpass.low_hz, 10.0);
        assert_eq!(config.bandpass.high_hz, 800.0);
        assert_eq!(config.bandpass.kernel_size, 5000);
        assert_eq!(config.downsampling.target_rate, 4000);
        assert_eq!(config.envelope.cutoff_hz, 7.0);
        assert_eq!(config.segmentation.min_dist_secs, 0.23);
        assert_eq!(config.segmentation.max_comp_iter, 100);
        assert_eq!(config.output.concat_dir, "without zeros");
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let parsed: Config = toml::from_str("[segmentation]\nmin_height = 0.5\n").unwrap();
        assert_eq!(parsed.segmentation.min_height, 0.5);
        assert_eq!(parsed.segmentation.max_comp_height, 1.0);
        assert_eq!(parsed.bandpass, BandpassConfig::default());
    }
}
