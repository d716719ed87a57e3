//! Envelope domains around labeled peaks and masking of signals by domain.

use serde::Serialize;

/// Half-open range `[start, end)` of envelope samples above the domain threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Domain {
    /// First sample inside the domain.
    pub start: usize,
    /// One past the last sample inside the domain.
    pub end: usize,
}

impl Domain {
    /// Number of samples covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the domain covers no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `index` lies inside the domain.
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// Scan `envelope` once for runs above `threshold` and keep those holding a
/// peak from `peaks` (ascending).
pub fn detect_peak_domains(peaks: &[usize], envelope: &[f64], threshold: f64) -> Vec<Domain> {
    let mut domains = Vec::new();
    let mut open: Option<usize> = None;
    let close = |start: usize, end: usize, domains: &mut Vec<Domain>| {
        let domain = Domain { start, end };
        let first = peaks.partition_point(|&p| p < start);
        if peaks.get(first).is_some_and(|&p| domain.contains(p)) {
            domains.push(domain);
        }
    };

    for (i, &value) in envelope.iter().enumerate() {
        match open {
            None if value > threshold => open = Some(i),
            Some(start) if value <= threshold => {
                close(start, i, &mut domains);
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        close(start, envelope.len(), &mut domains);
    }
    domains
}

/// Maps envelope indices onto another signal.
///
/// An envelope index `i` maps to `(i - shift) * factor - delay`, saturating
/// at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMap {
    /// Envelope filter delay, in processing-rate samples.
    pub shift: usize,
    /// Rate ratio between the target signal and the envelope.
    pub factor: usize,
    /// Delay of the target signal's own filtering, in its samples.
    pub delay: usize,
}

impl IndexMap {
    /// Onto the preprocessed signal at the processing rate.
    pub fn processed(envelope_delay: usize) -> Self {
        Self {
            shift: envelope_delay,
            factor: 1,
            delay: 0,
        }
    }

    /// Onto the raw recording at the original rate.
    pub fn raw(envelope_delay: usize, decimation: usize, bandpass_delay: usize) -> Self {
        Self {
            shift: envelope_delay,
            factor: decimation,
            delay: bandpass_delay,
        }
    }

    /// Map a single index.
    pub fn apply(&self, index: usize) -> usize {
        index
            .saturating_sub(self.shift)
            .saturating_mul(self.factor)
            .saturating_sub(self.delay)
    }

    /// Map a domain and clamp it to a signal of `len` samples.
    pub fn map_domain(&self, domain: Domain, len: usize) -> Domain {
        Domain {
            start: self.apply(domain.start).min(len),
            end: self.apply(domain.end).min(len),
        }
    }
}

/// A signal restricted to a set of domains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentedSignal {
    /// Input length, zero outside the domains.
    pub masked: Vec<f64>,
    /// In-domain samples only, in order.
    pub concatenated: Vec<f64>,
}

/// Keep the samples of `signal` that fall inside the mapped `domains`.
pub fn segment(signal: &[f64], domains: &[Domain], map: &IndexMap) -> SegmentedSignal {
    let mut masked = vec![0.0; signal.len()];
    let mut concatenated = Vec::new();
    for &domain in domains {
        let Domain { start, end } = map.map_domain(domain, signal.len());
        if start >= end {
            continue;
        }
        masked[start..end].copy_from_slice(&signal[start..end]);
        concatenated.extend_from_slice(&signal[start..end]);
    }
    SegmentedSignal {
        masked,
        concatenated,
    }
}
