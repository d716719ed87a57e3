//! Single file processing pipeline.

use crate::audio::decode_audio_file;
use crate::dsp::Signal;
use crate::error::Result;
use crate::output::{SegmentWriter, progress};
use crate::pipeline::{ProcessOptions, Processor, stem_of, subfolder_for};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Decode, segment and write one recording.
pub fn process_file(
    input_path: &Path,
    processor: &Processor,
    options: &ProcessOptions,
) -> Result<ProcessResult> {
    let start_time = Instant::now();

    info!("Processing: {}", input_path.display());

    let decoded = decode_audio_file(input_path)?;
    let audio_duration_secs = decoded.duration_secs;
    info!(
        "Decoded {} of audio at {} Hz",
        progress::format_duration(audio_duration_secs),
        decoded.sample_rate
    );

    let raw = Signal::from(decoded);
    let output = processor.run(&raw)?;

    let files_written = if options.no_write {
        Vec::new()
    } else {
        let subfolder = subfolder_for(input_path, options.subfolder.as_deref());
        let writer = SegmentWriter::new(&processor.config().output, &subfolder);
        writer.write_all(&output, &stem_of(input_path))?
    };

    let duration_secs = start_time.elapsed().as_secs_f64();
    let realtime_factor = if duration_secs > 0.0 {
        f64::from(audio_duration_secs) / duration_secs
    } else {
        0.0
    };
    info!(
        "Segmented in {:.2}s ({:.1}x realtime), wrote {} files",
        duration_secs,
        realtime_factor,
        files_written.len()
    );

    let classified = &output.classified;
    Ok(ProcessResult {
        file: input_path.to_path_buf(),
        sample_rate: output.original_rate,
        audio_duration_secs,
        peaks: classified.peaks.len(),
        s1_peaks: classified.s1.len(),
        s2_peaks: classified.s2.len(),
        uncertain_peaks: classified.uncertain.len(),
        y_line: classified.y_line,
        min_height: classified.min_height,
        partial_resolution: classified.partial_resolution,
        repaired_groups: classified.repaired_groups,
        unresolved_groups: classified.unresolved_groups,
        files_written,
        duration_secs,
    })
}

/// Result of processing a single file.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    /// Input path.
    pub file: PathBuf,
    /// Sample rate of the recording.
    pub sample_rate: u32,
    /// Audio duration in seconds.
    pub audio_duration_secs: f32,
    /// Peaks in the final peak set.
    pub peaks: usize,
    /// Peaks labeled S1.
    pub s1_peaks: usize,
    /// Peaks labeled S2.
    pub s2_peaks: usize,
    /// Peaks left uncertain.
    pub uncertain_peaks: usize,
    /// Systole/diastole threshold line in samples.
    pub y_line: f64,
    /// Peak height threshold the final peak set was detected with.
    pub min_height: f64,
    /// The uncertain budget could not be met.
    pub partial_resolution: bool,
    /// Uncertain groups resolved by local repair.
    pub repaired_groups: usize,
    /// Uncertain groups left unresolved.
    pub unresolved_groups: usize,
    /// Segment files written.
    pub files_written: Vec<PathBuf>,
    /// Processing duration in seconds.
    pub duration_secs: f64,
}
