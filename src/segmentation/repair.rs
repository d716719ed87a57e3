//! Local repair of uncertain peak groups.
//!
//! A run of uncertain records usually has one of two causes: a spurious peak
//! (murmur, split sound, noise) squeezed into a cycle, or a heart sound too
//! weak to pass the detection threshold. The first is repaired by removing the
//! weakest members of the run, the second by adding envelope maxima found near
//! it. Each group is repaired on its own against the same base peak set.

use super::{Classification, Label, classify_peaks};
use crate::constants::segmentation::MIN_SYSTOLE_SAMPLES;
use crate::dsp::find_peaks;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Envelope and parameters shared by every group repair of one recording.
#[derive(Debug, Clone, Copy)]
pub struct RepairContext<'a> {
    /// Detection envelope the peaks were found in.
    pub envelope: &'a [f64],
    /// Minimum distance between peaks, in samples.
    pub min_dist: usize,
    /// Height a candidate maximum must reach to be added.
    pub candidate_height: f64,
    /// Search margin on each side of a group, in samples.
    pub window: usize,
}

/// Peaks and labels after repairing every uncertain group.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    /// Peak set with removals and additions applied, ascending.
    pub peaks: Vec<usize>,
    /// Label per classified peak.
    pub labels: BTreeMap<usize, Label>,
    /// Groups fully resolved.
    pub repaired: usize,
    /// Groups left uncertain.
    pub unresolved: usize,
}

#[derive(Debug)]
struct GroupFix {
    removed: Vec<usize>,
    added: Vec<usize>,
    labels: Vec<(usize, Label)>,
}

/// Runs of consecutive uncertain records, as record positions.
fn uncertain_groups(classification: &Classification) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut last: Option<usize> = None;
    for (pos, labeled) in classification.records.iter().enumerate() {
        if labeled.label != Label::Uncertain {
            continue;
        }
        match groups.last_mut() {
            Some(group) if last.is_some_and(|l| l + 1 == pos) => group.push(pos),
            _ => groups.push(vec![pos]),
        }
        last = Some(pos);
    }
    groups
}

/// Try to resolve every uncertain group of `classification`, which must be
/// the classification of `peaks`.
pub fn solve_uncertains(
    peaks: &[usize],
    classification: &Classification,
    ctx: &RepairContext<'_>,
) -> RepairOutcome {
    let mut labels = classification.labels();
    let mut removed: Vec<usize> = Vec::new();
    let mut added: Vec<usize> = Vec::new();
    let mut repaired = 0;
    let mut unresolved = 0;

    for group in uncertain_groups(classification) {
        let members: Vec<usize> = group
            .iter()
            .map(|&pos| classification.records[pos].record.index)
            .collect();
        let too_short = group
            .iter()
            .any(|&pos| classification.records[pos].record.interval < MIN_SYSTOLE_SAMPLES);
        #[allow(clippy::cast_precision_loss)]
        let first_short =
            (classification.records[group[0]].record.interval as f64) < classification.y_line;

        let fix = if too_short || first_short {
            remove_extra_peaks(peaks, &members, ctx)
        } else {
            add_missing_peaks(peaks, &members, ctx)
        };

        match fix {
            Some(fix) => {
                debug!(
                    "Resolved {} uncertain peaks at {}: removed {:?}, added {:?}",
                    members.len(),
                    members[0],
                    fix.removed,
                    fix.added
                );
                for index in &fix.removed {
                    labels.remove(index);
                }
                labels.extend(fix.labels);
                removed.extend(fix.removed);
                added.extend(fix.added);
                repaired += 1;
            }
            None => {
                warn!(
                    "Could not resolve {} uncertain peaks starting at sample {}",
                    members.len(),
                    members[0]
                );
                unresolved += 1;
            }
        }
    }

    let mut peaks: Vec<usize> = peaks
        .iter()
        .copied()
        .filter(|p| !removed.contains(p))
        .chain(added)
        .collect();
    peaks.sort_unstable();
    peaks.dedup();

    RepairOutcome {
        peaks,
        labels,
        repaired,
        unresolved,
    }
}

/// Labels for `indices` if every one of them is S1 or S2 in `classification`.
fn confident_labels(
    classification: &Classification,
    indices: &[usize],
) -> Option<Vec<(usize, Label)>> {
    indices
        .iter()
        .map(|&i| {
            classification
                .label_of(i)
                .filter(|label| label.is_confident())
                .map(|label| (i, label))
        })
        .collect()
}

/// Remove group members weakest first until the rest classify confidently.
fn remove_extra_peaks(
    peaks: &[usize],
    members: &[usize],
    ctx: &RepairContext<'_>,
) -> Option<GroupFix> {
    let height = |i: usize| ctx.envelope.get(i).copied().unwrap_or(0.0);
    let mut order = members.to_vec();
    order.sort_by(|&a, &b| height(a).total_cmp(&height(b)));

    let mut current = peaks.to_vec();
    let mut removed = Vec::with_capacity(order.len());
    for victim in order {
        current.retain(|&p| p != victim);
        removed.push(victim);
        let remaining: Vec<usize> = members
            .iter()
            .copied()
            .filter(|m| !removed.contains(m))
            .collect();
        if remaining.is_empty() {
            break;
        }
        let Ok(classification) = classify_peaks(&current) else {
            continue;
        };
        if let Some(labels) = confident_labels(&classification, &remaining) {
            return Some(GroupFix {
                removed,
                added: Vec::new(),
                labels,
            });
        }
    }
    None
}

/// Add undetected envelope maxima near the group, highest first, until no
/// record inside the search window is uncertain.
fn add_missing_peaks(
    peaks: &[usize],
    members: &[usize],
    ctx: &RepairContext<'_>,
) -> Option<GroupFix> {
    let (&first, &last) = (members.first()?, members.last()?);
    let lo = first.saturating_sub(ctx.window);
    let hi = last.saturating_add(ctx.window).min(ctx.envelope.len());
    if lo >= hi {
        return None;
    }

    let mut candidates: Vec<usize> =
        find_peaks(&ctx.envelope[lo..hi], ctx.candidate_height, ctx.min_dist)
            .into_iter()
            .map(|i| i + lo)
            .filter(|&c| peaks.iter().all(|&p| p.abs_diff(c) >= ctx.min_dist))
            .collect();
    candidates.sort_by(|&a, &b| ctx.envelope[b].total_cmp(&ctx.envelope[a]));

    let mut current = peaks.to_vec();
    let mut added = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if let Err(pos) = current.binary_search(&candidate) {
            current.insert(pos, candidate);
        }
        added.push(candidate);
        let Ok(classification) = classify_peaks(&current) else {
            continue;
        };
        let window_settled = classification
            .records
            .iter()
            .filter(|r| (lo..hi).contains(&r.record.index))
            .all(|r| r.label.is_confident());
        if !window_settled {
            continue;
        }
        let involved: Vec<usize> = members.iter().chain(&added).copied().collect();
        if let Some(labels) = confident_labels(&classification, &involved) {
            return Some(GroupFix {
                removed: Vec::new(),
                added,
                labels,
            });
        }
    }
    None
}
