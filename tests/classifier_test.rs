//! Integration tests for S1/S2 peak classification.

use heartseg::Error;
use heartseg::segmentation::{Label, classify_peaks};

/// Peak train with `cycles` heartbeats at 4000 Hz: a 1200-sample systole
/// and a 2800-sample diastole, each jittered by a few samples.
fn heartbeat_peaks(cycles: usize) -> Vec<usize> {
    let mut peaks = Vec::with_capacity(2 * cycles);
    let mut t = 500;
    for k in 0..cycles {
        peaks.push(t);
        t += 1200 + (k * 37) % 50;
        peaks.push(t);
        t += 2800 + (k * 53) % 80;
    }
    peaks
}

#[test]
fn test_jittered_heartbeat_alternates_s1_s2() {
    let peaks = heartbeat_peaks(20);
    let classification = classify_peaks(&peaks).unwrap();

    assert_eq!(classification.uncertain_count(), 0);
    assert!(classification.y_line > 1250.0 && classification.y_line < 2800.0);

    let labels: Vec<Label> = classification.records.iter().map(|r| r.label).collect();
    assert_eq!(labels.len(), peaks.len() - 2);
    for (i, label) in labels.iter().enumerate() {
        let expected = if i % 2 == 0 { Label::S1 } else { Label::S2 };
        assert_eq!(*label, expected, "peak {i}");
    }
}

#[test]
fn test_s1_and_s2_never_share_a_peak() {
    let peaks = heartbeat_peaks(12);
    let classification = classify_peaks(&peaks).unwrap();
    let s1 = classification.s1();
    let s2 = classification.s2();

    assert!(s1.iter().all(|p| !s2.contains(p)));
    assert_eq!(s1.len() + s2.len(), peaks.len() - 2);
}

#[test]
fn test_trailing_peaks_are_unlabeled() {
    let peaks = heartbeat_peaks(6);
    let classification = classify_peaks(&peaks).unwrap();
    let labels = classification.labels();

    for &p in &peaks[peaks.len() - 2..] {
        assert!(!labels.contains_key(&p));
        assert!(classification.label_of(p).is_none());
    }
}

#[test]
fn test_missing_s2_is_reported_uncertain() {
    let mut peaks = heartbeat_peaks(10);
    // Drop the S2 of the fifth beat: one long interval spans systole and diastole.
    peaks.remove(9);
    let classification = classify_peaks(&peaks).unwrap();

    assert!(classification.uncertain_count() > 0);
    assert!(classification.s1().len() >= 4);
}

#[test]
fn test_constant_rate_has_no_threshold_line() {
    let peaks: Vec<usize> = (0..12).map(|k| k * 3000).collect();
    assert!(matches!(
        classify_peaks(&peaks),
        Err(Error::NoThresholdLine { .. })
    ));
}

#[test]
fn test_too_few_peaks_fail() {
    assert!(classify_peaks(&[]).is_err());
    assert!(classify_peaks(&[100, 1300, 4100]).is_err());
}
