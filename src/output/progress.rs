//! Progress bar for batch segmentation.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for processing multiple files.
pub fn create_file_progress(total_files: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total_files == 0 {
        return None;
    }

    let pb = ProgressBar::new(total_files as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} recordings {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    Some(pb)
}

/// Show the file currently being segmented.
pub fn set_progress_file(pb: Option<&ProgressBar>, file_name: &str) {
    if let Some(pb) = pb {
        pb.set_message(file_name.to_string());
    }
}

/// Finish a progress bar with a message.
pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(message.to_string());
    }
}

/// Increment a progress bar.
pub fn inc_progress(pb: Option<&ProgressBar>) {
    if let Some(pb) = pb {
        pb.inc(1);
    }
}

/// Format a duration in seconds as `1h 2m 3s`, `2m 3s` or `3.4s`.
pub fn format_duration(secs: f32) -> String {
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else {
        format!("{m}m {s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_progress_is_none() {
        assert!(create_file_progress(10, false).is_none());
        assert!(create_file_progress(0, true).is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12.34), "12.3s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3723.0), "1h 2m 3s");
    }
}
