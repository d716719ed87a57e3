//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_filters(config)?;
    validate_segmentation(config)?;
    validate_output(config)?;
    Ok(())
}

fn invalid(message: String) -> Error {
    Error::ConfigValidation { message }
}

/// Validate filter and rate settings that do not depend on the input file.
fn validate_filters(config: &Config) -> Result<()> {
    let bandpass = &config.bandpass;
    if !(bandpass.low_hz > 0.0 && bandpass.low_hz < bandpass.high_hz) {
        return Err(invalid(format!(
            "bandpass cutoffs must satisfy 0 < low_hz < high_hz, got {} and {}",
            bandpass.low_hz, bandpass.high_hz
        )));
    }
    if bandpass.order == 0 || config.envelope.order == 0 {
        return Err(invalid("filter orders must be at least 1".to_string()));
    }
    if bandpass.kernel_size < 2 || config.envelope.kernel_size < 2 {
        return Err(invalid("kernel sizes must be at least 2".to_string()));
    }

    let target_rate = config.downsampling.target_rate;
    if target_rate == 0 {
        return Err(invalid("target_rate must be positive".to_string()));
    }

    let nyquist = f64::from(target_rate) / 2.0;
    let cutoff = config.envelope.cutoff_hz;
    if !(cutoff > 0.0 && cutoff < nyquist) {
        return Err(invalid(format!(
            "envelope cutoff_hz must be between 0 and {nyquist}, got {cutoff}"
        )));
    }

    Ok(())
}

/// Validate peak detection and adaptive search settings.
fn validate_segmentation(config: &Config) -> Result<()> {
    let seg = &config.segmentation;
    if seg.min_dist_secs <= 0.0 {
        return Err(invalid(format!(
            "min_dist_secs must be positive, got {}",
            seg.min_dist_secs
        )));
    }
    if !seg.min_height.is_finite() || !seg.envelope_threshold.is_finite() {
        return Err(invalid(
            "min_height and envelope_threshold must be finite".to_string(),
        ));
    }
    if seg.repair_window_secs < 0.0 {
        return Err(invalid(format!(
            "repair_window_secs must be non-negative, got {}",
            seg.repair_window_secs
        )));
    }
    if seg.max_uncertain_per_min < 0.0 {
        return Err(invalid(format!(
            "max_uncertain_per_min must be non-negative, got {}",
            seg.max_uncertain_per_min
        )));
    }
    if seg.max_comp_iter == 0 {
        return Err(invalid("max_comp_iter must be at least 1".to_string()));
    }
    if !seg.max_comp_height.is_finite() {
        return Err(invalid("max_comp_height must be finite".to_string()));
    }
    Ok(())
}

fn validate_output(config: &Config) -> Result<()> {
    let output = &config.output;
    if output.concat_dir.is_empty() || output.segmented_dir.is_empty() {
        return Err(invalid("output directory names must not be empty".to_string()));
    }
    if output.concat_dir == output.segmented_dir {
        return Err(invalid(format!(
            "concat_dir and segmented_dir must differ, both are '{}'",
            output.concat_dir
        )));
    }
    Ok(())
}
