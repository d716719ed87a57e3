//! Audio file input.

mod decode;

pub use decode::{DecodedAudio, decode_audio_file};
