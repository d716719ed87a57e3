//! WAV writing of segmented heart sounds.
//!
//! Files are laid out as
//! `{dir}/{subfolder}/{framing}/{raw|processed}/segmented-{s1|s2}-{raw|processed}-{stem}.wav`
//! where the framing directory is the configured name for concatenated or
//! masked signals.

use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::debug;

use crate::Error;
use crate::config::OutputConfig;
use crate::constants::output::{FILE_PREFIX, PROCESSED_TAG, RAW_TAG};
use crate::pipeline::PipelineOutput;
use crate::segmentation::{Label, SegmentedSignal};

/// How a segmented signal is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// In-domain samples only.
    Concatenated,
    /// Full length with zeros outside the domains.
    Masked,
}

/// Which signal the segments were cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Raw recording at the original rate.
    Raw,
    /// Preprocessed signal at the processing rate.
    Processed,
}

impl SignalKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Raw => RAW_TAG,
            Self::Processed => PROCESSED_TAG,
        }
    }
}

/// Writes the segmented signals of one recording.
#[derive(Debug, Clone)]
pub struct SegmentWriter {
    root: PathBuf,
    concat_dir: String,
    segmented_dir: String,
    write_processed: bool,
    write_raw: bool,
}

impl SegmentWriter {
    /// Writer rooted at `{output.dir}/{subfolder}`.
    pub fn new(output: &OutputConfig, subfolder: &str) -> Self {
        Self {
            root: output.dir.join(sanitize_component(subfolder)),
            concat_dir: output.concat_dir.clone(),
            segmented_dir: output.segmented_dir.clone(),
            write_processed: output.write_processed,
            write_raw: output.write_raw,
        }
    }

    /// Destination of one segmented signal.
    pub fn path_for(
        &self,
        label: Label,
        framing: Framing,
        kind: SignalKind,
        stem: &str,
    ) -> PathBuf {
        let framing_dir = match framing {
            Framing::Concatenated => &self.concat_dir,
            Framing::Masked => &self.segmented_dir,
        };
        let tag = kind.tag();
        self.root
            .join(framing_dir)
            .join(tag)
            .join(format!("{FILE_PREFIX}-{label}-{tag}-{stem}.wav"))
    }

    /// Write every enabled S1/S2 signal of `output` and return the paths.
    pub fn write_all(&self, output: &PipelineOutput, stem: &str) -> Result<Vec<PathBuf>, Error> {
        let mut kinds = Vec::with_capacity(2);
        if self.write_processed {
            kinds.push((SignalKind::Processed, output.preprocessed.signal.sample_rate));
        }
        if self.write_raw {
            kinds.push((SignalKind::Raw, output.original_rate));
        }

        let mut written = Vec::new();
        for label in [Label::S1, Label::S2] {
            let Some(sound) = output.segmentation.sound(label) else {
                continue;
            };
            for &(kind, sample_rate) in &kinds {
                let signal: &SegmentedSignal = match kind {
                    SignalKind::Processed => &sound.processed,
                    SignalKind::Raw => &sound.raw,
                };
                for (framing, samples) in [
                    (Framing::Concatenated, &signal.concatenated),
                    (Framing::Masked, &signal.masked),
                ] {
                    let path = self.path_for(label, framing, kind, stem);
                    write_wav_file(&path, samples, sample_rate)?;
                    written.push(path);
                }
            }
        }
        debug!(
            "Wrote {} segment files under {}",
            written.len(),
            self.root.display()
        );
        Ok(written)
    }
}

/// Replace characters that are invalid in directory names and path traversal.
fn sanitize_component(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();
    sanitized.replace("..", "__")
}

/// Write samples as 16-bit mono PCM, clamped to [-1, 1].
pub fn write_wav_file(path: &Path, samples: &[f64], sample_rate: u32) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let wav_error = |e| Error::WavWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let sample_i16 = (sample.clamp(-1.0, 1.0) * f64::from(i16::MAX)) as i16;
        writer.write_sample(sample_i16).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(())
}
