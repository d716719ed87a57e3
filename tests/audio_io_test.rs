//! Integration tests for audio decoding and WAV writing.

use heartseg::Error;
use heartseg::audio::decode_audio_file;
use heartseg::output::write_wav_file;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tempfile::TempDir;

fn write_pcm16(path: &Path, channels: u16, sample_rate: u32, frames: &[Vec<i16>]) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for frame in frames {
        for &s in frame {
            writer.write_sample(s).unwrap();
        }
    }
    writer.finalize().unwrap();
}

#[test]
fn test_decode_mono_wav() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mono.wav");
    let frames: Vec<Vec<i16>> = (0..8000).map(|i| vec![((i % 100) * 100) as i16]).collect();
    write_pcm16(&path, 1, 8000, &frames);

    let audio = decode_audio_file(&path).unwrap();
    assert_eq!(audio.sample_rate, 8000);
    assert_eq!(audio.samples.len(), 8000);
    assert!((audio.duration_secs - 1.0).abs() < 1e-6);
    assert!(audio.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
}

#[test]
fn test_decode_stereo_wav_averages_channels() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    let frames: Vec<Vec<i16>> = (0..4000).map(|_| vec![16384, -16384]).collect();
    write_pcm16(&path, 2, 4000, &frames);

    let audio = decode_audio_file(&path).unwrap();
    assert_eq!(audio.sample_rate, 4000);
    assert_eq!(audio.samples.len(), 4000);
    assert!(audio.samples.iter().all(|s| s.abs() < 1e-4));
}

#[test]
fn test_decode_garbage_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noise.wav");
    std::fs::write(&path, b"this is not audio at all").unwrap();

    let result = decode_audio_file(&path);
    assert!(matches!(result, Err(Error::AudioOpen { .. })));
}

#[test]
fn test_write_wav_file_creates_parents_and_clamps() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a").join("b").join("out.wav");

    write_wav_file(&path, &[0.0, 0.5, 2.0, -3.0], 4000).unwrap();

    let mut reader = WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 4000);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples, vec![0, 16383, i16::MAX, -i16::MAX]);
}

#[test]
fn test_written_wav_decodes_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roundtrip.wav");
    let samples: Vec<f64> = (0..2000).map(|i| if i % 2 == 0 { 0.25 } else { -0.25 }).collect();

    write_wav_file(&path, &samples, 2000).unwrap();
    let audio = decode_audio_file(&path).unwrap();

    assert_eq!(audio.sample_rate, 2000);
    assert_eq!(audio.samples.len(), samples.len());
    assert!((audio.samples[0] - 0.25).abs() < 1e-3);
    assert!((audio.samples[1] + 0.25).abs() < 1e-3);
}
