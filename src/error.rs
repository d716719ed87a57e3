//! Error types for heartseg.

/// Result type alias for heartseg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for heartseg.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// No valid audio files found.
    #[error("no valid audio files found in the provided paths")]
    NoValidAudioFiles,

    /// Failed to open audio file.
    #[error("failed to open audio file '{path}'")]
    AudioOpen {
        /// Path to the audio file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to decode audio.
    #[error("failed to decode audio from '{path}'")]
    AudioDecode {
        /// Path to the audio file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No audio tracks found.
    #[error("no audio tracks found in '{path}'")]
    NoAudioTracks {
        /// Path to the audio file.
        path: std::path::PathBuf,
    },

    /// The original sample rate is not an integer multiple of the processing rate.
    #[error(
        "sample rate {original} Hz is not an integer multiple of the processing rate {target} Hz"
    )]
    SampleRateRatio {
        /// Sample rate of the recording.
        original: u32,
        /// Configured processing rate.
        target: u32,
    },

    /// Butterworth design rejected the requested band or order.
    #[error("invalid filter design: {reason}")]
    FilterDesign {
        /// Description of the rejected parameters.
        reason: String,
    },

    /// Signal is all zeros and cannot be normalized.
    #[error("signal is silent ({len} samples, all zero) and cannot be normalized")]
    SilentSignal {
        /// Number of samples in the signal.
        len: usize,
    },

    /// The S1/S2 classifier could not separate systolic from diastolic intervals.
    #[error("no classification line found: {reason}")]
    NoThresholdLine {
        /// Why the interval extrema could not be split.
        reason: String,
    },

    /// FFT convolution failed.
    #[error("FFT convolution failed: {reason}")]
    Fft {
        /// Description of the FFT failure.
        reason: String,
    },

    /// Failed to write WAV file.
    #[error("failed to write WAV file '{path}'")]
    WavWriteFailed {
        /// Path to the WAV file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: hound::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write JSON summary file.
    #[error("failed to write JSON summary file '{path}'")]
    JsonWrite {
        /// Path to the JSON file.
        path: std::path::PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}
