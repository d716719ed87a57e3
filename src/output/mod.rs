//! Segmented audio files, progress display and run summaries.

pub mod progress;
mod summary;
mod wav;

pub use summary::{BatchSummary, FailedFile};
pub use wav::{Framing, SegmentWriter, SignalKind, write_wav_file};
