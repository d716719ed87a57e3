//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "heartseg";

/// Band-pass pre-filter defaults.
pub mod bandpass {
    /// Lower cutoff in Hz.
    pub const DEFAULT_LOW_HZ: f64 = 10.0;
    /// Upper cutoff in Hz.
    pub const DEFAULT_HIGH_HZ: f64 = 800.0;
    /// Butterworth half-order (a band-pass of order N has 2N poles).
    pub const DEFAULT_ORDER: usize = 2;
    /// Zero-phase kernel length minus one.
    pub const DEFAULT_KERNEL_SIZE: usize = 5000;
}

/// Default processing sample rate in Hz.
pub const DEFAULT_TARGET_RATE: u32 = 4000;

/// Shannon energy envelope defaults.
pub mod envelope {
    /// Butterworth order of the envelope low-pass.
    pub const DEFAULT_ORDER: usize = 2;
    /// Envelope low-pass cutoff in Hz.
    pub const DEFAULT_CUTOFF_HZ: f64 = 7.0;
    /// Zero-phase kernel length minus one.
    pub const DEFAULT_KERNEL_SIZE: usize = 1000;
    /// Floor applied to `x^2` before taking the logarithm.
    pub const ENERGY_FLOOR: f64 = 1e-4;
}

/// Peak classification and segmentation defaults.
pub mod segmentation {
    /// Initial peak height threshold, in envelope standard deviations.
    pub const DEFAULT_MIN_HEIGHT: f64 = 0.3;
    /// Minimum distance between peaks in seconds.
    pub const DEFAULT_MIN_DIST_SECS: f64 = 0.23;
    /// Envelope level that opens and closes a domain.
    pub const DEFAULT_ENVELOPE_THRESHOLD: f64 = 0.1;
    /// Half-width of the missing-peak search window in seconds.
    pub const DEFAULT_REPAIR_WINDOW_SECS: f64 = 2.0;
    /// Tolerated uncertain peaks per minute of envelope.
    pub const DEFAULT_MAX_UNCERTAIN_PER_MIN: f64 = 20.0;
    /// Highest peak threshold tried by the adaptive search.
    pub const DEFAULT_MAX_COMP_HEIGHT: f64 = 1.0;
    /// Number of steps of the adaptive search.
    pub const DEFAULT_MAX_COMP_ITER: usize = 100;
    /// Shortest plausible systole in processing-rate samples.
    ///
    /// Intervals below this inside an uncertain group point at a spurious
    /// extra peak rather than a missing one.
    pub const MIN_SYSTOLE_SAMPLES: usize = 700;
}

/// Output layout constants.
pub mod output {
    /// Default base directory for segmented audio.
    pub const DEFAULT_DIR: &str = "generated/segmentation";
    /// Default directory name for concatenated (zero-free) signals.
    pub const DEFAULT_CONCAT_DIR: &str = "without zeros";
    /// Default directory name for masked (zero-filled) signals.
    pub const DEFAULT_SEGMENTED_DIR: &str = "with zeros";
    /// Directory and filename tag for original-rate signals.
    pub const RAW_TAG: &str = "raw";
    /// Directory and filename tag for processing-rate signals.
    pub const PROCESSED_TAG: &str = "processed";
    /// Filename prefix of every segmented file.
    pub const FILE_PREFIX: &str = "segmented";
    /// Subfolder used when the input has no named parent directory.
    pub const FALLBACK_SUBFOLDER: &str = "recordings";
}

/// Supported audio file extensions for input collection.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3"];
