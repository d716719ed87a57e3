//! Integration tests for domain detection, masking and peak repair.

use heartseg::config::Config;
use heartseg::dsp::Envelope;
use heartseg::pipeline::Processor;
use heartseg::segmentation::{
    Domain, IndexMap, Label, RepairContext, classify_peaks, detect_peak_domains, segment,
    solve_uncertains,
};

/// Triangular bump of half-width `w` centred on `c`.
fn triangle(i: usize, c: usize, w: usize, height: f64) -> f64 {
    let d = i.abs_diff(c);
    if d >= w {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let frac = 1.0 - d as f64 / w as f64;
        height * frac
    }
}

#[test]
fn test_every_domain_holds_a_peak() {
    let envelope: Vec<f64> = (0..3000)
        .map(|i| {
            triangle(i, 500, 100, 2.0) + triangle(i, 1500, 100, 0.8) + triangle(i, 2500, 100, 1.0)
        })
        .collect();
    let peaks = [500, 2500];
    let domains = detect_peak_domains(&peaks, &envelope, 0.1);

    assert_eq!(domains.len(), 2);
    for domain in &domains {
        assert!(peaks.iter().any(|&p| domain.contains(p)));
        assert!(domain.len() < 200);
    }
    assert!(!domains.iter().any(|d| d.contains(1500)));
}

#[test]
fn test_domain_open_at_end_is_closed_at_signal_length() {
    let envelope: Vec<f64> = (0..1000).map(|i| if i >= 900 { 1.0 } else { 0.0 }).collect();
    let domains = detect_peak_domains(&[950], &envelope, 0.1);
    assert_eq!(domains, vec![Domain { start: 900, end: 1000 }]);
}

#[test]
fn test_segment_lengths() {
    let signal: Vec<f64> = (0..2000_i32).map(|i| f64::from(i % 7) - 3.0).collect();
    let domains = [
        Domain { start: 100, end: 250 },
        Domain { start: 900, end: 1000 },
    ];
    let out = segment(&signal, &domains, &IndexMap::processed(0));

    assert_eq!(out.masked.len(), signal.len());
    assert_eq!(out.concatenated.len(), 250);
    assert_eq!(out.masked[..100].iter().filter(|&&v| v != 0.0).count(), 0);
    assert_eq!(&out.masked[100..250], &signal[100..250]);
    assert_eq!(&out.concatenated[150..], &signal[900..1000]);
}

#[test]
fn test_raw_mapping_scales_and_removes_delays() {
    let map = IndexMap::raw(50, 4, 30);
    assert_eq!(map.apply(150), 370);
    assert_eq!(map.apply(10), 0);

    let raw: Vec<f64> = vec![1.0; 1000];
    let out = segment(&raw, &[Domain { start: 100, end: 400 }], &map);
    // [100, 400) maps to [170, 1170), clamped to the signal.
    assert_eq!(out.concatenated.len(), 1000 - 170);
    assert_eq!(out.masked.len(), 1000);
}

/// Gaussian bump envelope over `centers` with the given heights.
fn bumps(len: usize, centers: &[(usize, f64)]) -> Vec<f64> {
    (0..len)
        .map(|i| {
            centers
                .iter()
                .map(|&(c, h)| {
                    #[allow(clippy::cast_precision_loss)]
                    let d = (i as f64 - c as f64) / 80.0;
                    h * (-0.5 * d * d).exp()
                })
                .sum()
        })
        .collect()
}

#[test]
fn test_classify_repairs_a_missed_s2() {
    // S1 every 4000 samples, S2 1200 later; the S2 at 10200 is below the
    // detection height but above the candidate height.
    let mut centers = Vec::new();
    for k in 0..6 {
        let s1 = 1000 + k * 4000;
        centers.push((s1, 3.0));
        centers.push((s1 + 1200, if k == 2 { 0.2 } else { 2.0 }));
    }
    let envelope = Envelope {
        samples: bumps(26_000, &centers),
        sample_rate: 4000,
        delay: 0,
    };

    let processor = Processor::new(Config::default()).unwrap();
    let classified = processor.classify(&envelope).unwrap();

    assert!(classified.peaks.contains(&10_200));
    assert!(classified.s1.contains(&9000));
    assert!(classified.s2.contains(&10_200));
    assert!(classified.s1.contains(&13_000));
    assert!(classified.uncertain.is_empty());
    assert_eq!(classified.repaired_groups, 1);
    assert_eq!(classified.unresolved_groups, 0);
    assert!(!classified.partial_resolution);
}

#[test]
fn test_solve_uncertains_leaves_confident_peaks_alone() {
    let peaks: Vec<usize> = (0..6).flat_map(|k| [1000 + k * 4000, 2200 + k * 4000]).collect();
    let centers: Vec<(usize, f64)> = peaks.iter().map(|&p| (p, 2.0)).collect();
    let envelope = bumps(26_000, &centers);
    let classification = classify_peaks(&peaks).unwrap();

    let ctx = RepairContext {
        envelope: &envelope,
        min_dist: 920,
        candidate_height: 0.1,
        window: 8000,
    };
    let outcome = solve_uncertains(&peaks, &classification, &ctx);

    assert_eq!(outcome.peaks, peaks);
    assert_eq!(outcome.labels, classification.labels());
    assert_eq!(outcome.repaired, 0);
    assert_eq!(outcome.unresolved, 0);
    assert!(outcome.labels.values().all(|l| *l != Label::Uncertain));
}
