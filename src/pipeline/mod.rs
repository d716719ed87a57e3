//! Processing pipeline components.

mod coordinator;
mod orchestrator;
mod processor;

pub use coordinator::{ProcessOptions, collect_input_files, stem_of, subfolder_for};
pub use orchestrator::{PipelineOutput, Processor, Segmentation, SoundSegments};
pub use processor::{ProcessResult, process_file};
