//! S1/S2 labeling of envelope peaks and extraction of the labeled sounds.
//!
//! Peaks are labeled from the rhythm of their intervals: systole (S1 to S2)
//! is shorter than diastole (S2 to the next S1). A threshold line between the
//! two interval populations drives an alternating classification; peaks that
//! break the alternation are marked uncertain and may be repaired locally.

mod classifier;
mod domains;
mod repair;

pub use classifier::{Extremum, classify_peaks, find_extrema, peak_records, threshold_line};
pub use domains::{Domain, IndexMap, SegmentedSignal, detect_peak_domains, segment};
pub use repair::{RepairContext, RepairOutcome, solve_uncertains};

use serde::Serialize;
use std::collections::BTreeMap;

/// Label assigned to a peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// First heart sound.
    S1,
    /// Second heart sound.
    S2,
    /// Could not be placed in the S1/S2 alternation.
    Uncertain,
}

impl Label {
    /// Whether the label is S1 or S2.
    pub fn is_confident(self) -> bool {
        !matches!(self, Self::Uncertain)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::S1 => write!(f, "s1"),
            Self::S2 => write!(f, "s2"),
            Self::Uncertain => write!(f, "uncertain"),
        }
    }
}

/// A peak with the interval to the next peak and the change of that interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakRecord {
    /// Peak index into the envelope.
    pub index: usize,
    /// Samples to the next peak.
    pub interval: usize,
    /// Next interval minus this interval.
    pub curvature: i64,
}

/// A record and the label it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledRecord {
    /// The classified peak.
    pub record: PeakRecord,
    /// Its label.
    pub label: Label,
}

/// Result of one classification pass over a peak set.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Interval separating systole from diastole, in samples.
    pub y_line: f64,
    /// One entry per classified peak; the last two peaks have none.
    pub records: Vec<LabeledRecord>,
}

impl Classification {
    fn indices_with(&self, label: Label) -> Vec<usize> {
        self.records
            .iter()
            .filter(|r| r.label == label)
            .map(|r| r.record.index)
            .collect()
    }

    /// Peaks labeled S1.
    pub fn s1(&self) -> Vec<usize> {
        self.indices_with(Label::S1)
    }

    /// Peaks labeled S2.
    pub fn s2(&self) -> Vec<usize> {
        self.indices_with(Label::S2)
    }

    /// Peaks labeled uncertain.
    pub fn uncertain(&self) -> Vec<usize> {
        self.indices_with(Label::Uncertain)
    }

    /// Number of uncertain records.
    pub fn uncertain_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.label == Label::Uncertain)
            .count()
    }

    /// Label of the peak at `index`, if it was classified.
    pub fn label_of(&self, index: usize) -> Option<Label> {
        self.records
            .iter()
            .find(|r| r.record.index == index)
            .map(|r| r.label)
    }

    /// Labels keyed by peak index.
    pub fn labels(&self) -> BTreeMap<usize, Label> {
        self.records
            .iter()
            .map(|r| (r.record.index, r.label))
            .collect()
    }
}

/// Final labeling of a recording after threshold adaptation and repair.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPeaks {
    /// Every peak in use, ascending, including the unlabeled trailing two.
    pub peaks: Vec<usize>,
    /// S1 peaks, ascending.
    pub s1: Vec<usize>,
    /// S2 peaks, ascending.
    pub s2: Vec<usize>,
    /// Peaks left uncertain, ascending.
    pub uncertain: Vec<usize>,
    /// Threshold line of the accepted classification.
    pub y_line: f64,
    /// Peak height threshold the accepted peak set was detected with.
    pub min_height: f64,
    /// The uncertain budget could not be met by raising the threshold.
    pub partial_resolution: bool,
    /// Uncertain groups resolved by local repair.
    pub repaired_groups: usize,
    /// Uncertain groups left unresolved.
    pub unresolved_groups: usize,
}

impl ClassifiedPeaks {
    /// Build from a label map; peaks absent from the map stay unlabeled.
    pub(crate) fn from_labels(
        peaks: Vec<usize>,
        labels: &BTreeMap<usize, Label>,
        y_line: f64,
        min_height: f64,
    ) -> Self {
        let with = |wanted: Label| -> Vec<usize> {
            labels
                .iter()
                .filter(|&(_, &label)| label == wanted)
                .map(|(&index, _)| index)
                .collect()
        };
        Self {
            s1: with(Label::S1),
            s2: with(Label::S2),
            uncertain: with(Label::Uncertain),
            peaks,
            y_line,
            min_height,
            partial_resolution: false,
            repaired_groups: 0,
            unresolved_groups: 0,
        }
    }
}
