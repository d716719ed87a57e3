//! Interval-based S1/S2 classification of a peak set.

use super::{Classification, Label, LabeledRecord, PeakRecord};
use crate::error::{Error, Result};

/// Role of a record in the interval sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    /// Interval longer than the previous one and followed by a shorter one.
    Maximum,
    /// Interval shorter than the previous one and followed by a longer one.
    Minimum,
    /// Neither, or no previous interval to compare against.
    Neither,
}

/// Which label the alternation allows next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    Unconstrained,
    ExpectS1,
    ExpectS2,
}

fn signed(v: usize) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Build one record per peak except the last two.
///
/// `peaks` must be strictly increasing.
pub fn peak_records(peaks: &[usize]) -> Vec<PeakRecord> {
    let intervals: Vec<usize> = peaks.windows(2).map(|w| w[1].saturating_sub(w[0])).collect();
    intervals
        .windows(2)
        .zip(peaks)
        .map(|(d, &index)| PeakRecord {
            index,
            interval: d[0],
            curvature: signed(d[1]) - signed(d[0]),
        })
        .collect()
}

/// Mark local maxima and minima of the interval sequence.
pub fn find_extrema(records: &[PeakRecord]) -> Vec<Extremum> {
    let mut extrema = Vec::with_capacity(records.len());
    let mut prev: Option<usize> = None;
    for record in records {
        let kind = match prev {
            Some(p) if record.interval > p && record.curvature < 0 => Extremum::Maximum,
            Some(p) if record.interval < p && record.curvature > 0 => Extremum::Minimum,
            _ => Extremum::Neither,
        };
        extrema.push(kind);
        prev = Some(record.interval);
    }
    extrema
}

/// Interval separating short (systolic) from long (diastolic) intervals.
///
/// The largest remaining minimum and the smallest remaining maximum are
/// discarded in pairs until a discarded minimum lies strictly below its
/// maximum. The line is the midpoint of the extrema left after that pair.
pub fn threshold_line(records: &[PeakRecord], extrema: &[Extremum]) -> Result<f64> {
    let pick = |wanted: Extremum| -> Vec<usize> {
        records
            .iter()
            .zip(extrema)
            .filter(|&(_, &kind)| kind == wanted)
            .map(|(r, _)| r.interval)
            .collect()
    };
    let mut minima = pick(Extremum::Minimum);
    let mut maxima = pick(Extremum::Maximum);
    if minima.is_empty() || maxima.is_empty() {
        return Err(Error::NoThresholdLine {
            reason: format!(
                "{} interval minima and {} maxima among {} peaks",
                minima.len(),
                maxima.len(),
                records.len() + 2
            ),
        });
    }
    minima.sort_unstable();
    maxima.sort_unstable_by(|a, b| b.cmp(a));

    while let (Some(low), Some(high)) = (minima.pop(), maxima.pop()) {
        if low < high {
            return match (minima.last(), maxima.last()) {
                #[allow(clippy::cast_precision_loss)]
                (Some(&low), Some(&high)) => Ok(0.5 * (low + high) as f64),
                _ => Err(Error::NoThresholdLine {
                    reason: "no interval extrema left after the separating pair".to_string(),
                }),
            };
        }
    }
    Err(Error::NoThresholdLine {
        reason: "interval minima and maxima overlap completely".to_string(),
    })
}

/// Label every peak but the last two as S1, S2 or uncertain.
///
/// Fails with [`Error::NoThresholdLine`] when the intervals show no
/// systole/diastole structure, including peak sets too short to have any.
pub fn classify_peaks(peaks: &[usize]) -> Result<Classification> {
    let records = peak_records(peaks);
    let extrema = find_extrema(&records);
    let y_line = threshold_line(&records, &extrema)?;

    let mut state = Expectation::Unconstrained;
    let mut labels: Vec<Label> = records
        .iter()
        .map(|record| {
            #[allow(clippy::cast_precision_loss)]
            let short = record.interval as f64 <= y_line;
            if short && state != Expectation::ExpectS2 {
                state = Expectation::ExpectS2;
                Label::S1
            } else if !short && state != Expectation::ExpectS1 {
                state = Expectation::ExpectS1;
                Label::S2
            } else {
                Label::Uncertain
            }
        })
        .collect();

    // Only records that failed the alternation themselves taint their successor.
    let failed: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|&(_, &label)| label == Label::Uncertain)
        .map(|(i, _)| i)
        .collect();
    for i in failed {
        if let Some(next) = labels.get_mut(i + 1) {
            *next = Label::Uncertain;
        }
    }

    Ok(Classification {
        y_line,
        records: records
            .into_iter()
            .zip(labels)
            .map(|(record, label)| LabeledRecord { record, label })
            .collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    const ALTERNATING: [usize; 8] = [0, 300, 1100, 1400, 2200, 2500, 3300, 3600];

    #[test]
    fn test_records_drop_last_two_peaks() {
        let records = peak_records(&ALTERNATING);
        assert_eq!(records.len(), ALTERNATING.len() - 2);
        assert_eq!(records[0].interval, 300);
        assert_eq!(records[0].curvature, 500);
        assert_eq!(records[1].curvature, -500);
        assert_eq!(records.last().unwrap().index, 2500);
        assert!(peak_records(&[10, 20]).is_empty());
    }

    #[test]
    fn test_extrema_of_alternating_intervals() {
        let records = peak_records(&ALTERNATING);
        let extrema = find_extrema(&records);
        assert_eq!(
            extrema,
            vec![
                Extremum::Neither,
                Extremum::Maximum,
                Extremum::Minimum,
                Extremum::Maximum,
                Extremum::Minimum,
                Extremum::Maximum,
            ]
        );
    }

    #[test]
    fn test_alternating_peaks_classify_cleanly() {
        let c = classify_peaks(&ALTERNATING).unwrap();
        assert_eq!(c.y_line, 550.0);
        assert_eq!(c.s1(), vec![0, 1100, 2200]);
        assert_eq!(c.s2(), vec![300, 1400, 2500]);
        assert!(c.uncertain().is_empty());
        assert_eq!(c.label_of(3300), None);
        assert_eq!(c.label_of(3600), None);
    }

    #[test]
    fn test_uniform_intervals_fail() {
        let result = classify_peaks(&[0, 1000, 2000, 3000, 4000]);
        assert!(matches!(result, Err(Error::NoThresholdLine { .. })));
    }

    #[test]
    fn test_too_few_peaks_fail() {
        assert!(classify_peaks(&[]).is_err());
        assert!(classify_peaks(&[5]).is_err());
        assert!(classify_peaks(&[5, 900, 1200]).is_err());
    }

    #[test]
    fn test_last_two_peaks_never_labeled() {
        let sets: [&[usize]; 3] = [
            &ALTERNATING,
            &[0, 1200, 4000, 5200, 8000, 9200, 12_000, 13_200, 16_000],
            &[0, 300, 1100, 1400, 2200, 3000, 3300, 4100, 4400, 5200, 5500],
        ];
        for peaks in sets {
            let c = classify_peaks(peaks).unwrap();
            assert_eq!(c.records.len(), peaks.len() - 2);
            for &tail in &peaks[peaks.len() - 2..] {
                assert_eq!(c.label_of(tail), None);
            }
        }
    }

    #[test]
    fn test_broken_alternation_marks_peak_and_successor() {
        // Two long intervals in a row: the second long one breaks the rhythm.
        let peaks = [0, 300, 1100, 1400, 2200, 3000, 3300, 4100, 4400, 5200, 5500];
        let c = classify_peaks(&peaks).unwrap();
        assert_eq!(c.y_line, 550.0);
        assert_eq!(c.uncertain(), vec![2200, 3000]);
        assert_eq!(c.s1(), vec![0, 1100, 4100]);
        assert_eq!(c.s2(), vec![300, 1400, 3300, 4400]);
        assert_eq!(c.uncertain_count(), 2);
    }

    fn interval_records(intervals: &[usize]) -> Vec<PeakRecord> {
        intervals
            .iter()
            .enumerate()
            .map(|(index, &interval)| PeakRecord {
                index,
                interval,
                curvature: 0,
            })
            .collect()
    }

    #[test]
    fn test_threshold_line_uses_extrema_left_after_pair() {
        let records = interval_records(&[300, 400, 700, 900]);
        let extrema = [
            Extremum::Minimum,
            Extremum::Minimum,
            Extremum::Maximum,
            Extremum::Maximum,
        ];
        // 400 and 700 separate and are discarded; 300 and 900 remain.
        assert_eq!(threshold_line(&records, &extrema).unwrap(), 600.0);
    }

    #[test]
    fn test_threshold_line_skips_overlapping_outliers() {
        // 900 overlaps 800 and is discarded with it; 350 and 950 separate.
        let records = interval_records(&[300, 350, 900, 800, 950, 1000]);
        let extrema = [
            Extremum::Minimum,
            Extremum::Minimum,
            Extremum::Minimum,
            Extremum::Maximum,
            Extremum::Maximum,
            Extremum::Maximum,
        ];
        assert_eq!(threshold_line(&records, &extrema).unwrap(), 650.0);
    }

    #[test]
    fn test_threshold_line_single_pair_fails() {
        let records = interval_records(&[300, 900]);
        let extrema = [Extremum::Minimum, Extremum::Maximum];
        assert!(matches!(
            threshold_line(&records, &extrema),
            Err(Error::NoThresholdLine { .. })
        ));
    }
}
