//! Segmentation of one recording, stage by stage.
//!
//! Every stage takes the result of the previous one and returns a new value,
//! so stages can be run on their own (for tests, or to inspect intermediate
//! signals) as well as through [`Processor::run`].

use crate::config::{Config, SegmentationConfig, validate_config};
use crate::dsp::{Envelope, EnvelopeExtractor, Preprocessed, Preprocessor, Signal, find_peaks};
use crate::error::{Error, Result};
use crate::segmentation::{
    Classification, ClassifiedPeaks, Domain, IndexMap, Label, RepairContext, SegmentedSignal,
    classify_peaks, detect_peak_domains, segment, solve_uncertains,
};
use tracing::{debug, info, warn};

/// Domains of one heart sound and the signals cut out by them.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSegments {
    /// Envelope domains holding at least one peak of this sound.
    pub domains: Vec<Domain>,
    /// Preprocessed signal at the processing rate.
    pub processed: SegmentedSignal,
    /// Raw recording at the original rate.
    pub raw: SegmentedSignal,
}

/// S1 and S2 segments of a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// First heart sound.
    pub s1: SoundSegments,
    /// Second heart sound.
    pub s2: SoundSegments,
}

impl Segmentation {
    /// Segments of the given sound; `None` for [`Label::Uncertain`].
    pub fn sound(&self, label: Label) -> Option<&SoundSegments> {
        match label {
            Label::S1 => Some(&self.s1),
            Label::S2 => Some(&self.s2),
            Label::Uncertain => None,
        }
    }
}

/// Everything [`Processor::run`] produces for one recording.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Sample rate of the raw recording.
    pub original_rate: u32,
    /// Preprocessing result.
    pub preprocessed: Preprocessed,
    /// Detection envelope.
    pub envelope: Envelope,
    /// Final peak labels.
    pub classified: ClassifiedPeaks,
    /// Extracted S1/S2 signals.
    pub segmentation: Segmentation,
}

/// Runs the segmentation stages with one configuration.
#[derive(Debug, Clone)]
pub struct Processor {
    config: Config,
    preprocessor: Preprocessor,
    extractor: EnvelopeExtractor,
}

impl Processor {
    /// Validate `config` and design the rate-independent filters.
    pub fn new(config: Config) -> Result<Self> {
        validate_config(&config)?;
        let target_rate = config.downsampling.target_rate;
        let preprocessor = Preprocessor::new(&config.bandpass, target_rate);
        let extractor = EnvelopeExtractor::new(&config.envelope, target_rate)?;
        Ok(Self {
            config,
            preprocessor,
            extractor,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn seg(&self) -> &SegmentationConfig {
        &self.config.segmentation
    }

    /// Band-pass, decimate and normalize a raw recording.
    pub fn preprocess(&self, raw: &Signal) -> Result<Preprocessed> {
        self.preprocessor.run(raw)
    }

    /// Shannon energy envelope of the preprocessed signal.
    pub fn extract_envelope(&self, preprocessed: &Preprocessed) -> Result<Envelope> {
        self.extractor.extract(&preprocessed.signal)
    }

    /// Minimum peak distance in samples at `sample_rate`.
    pub fn min_dist_samples(&self, sample_rate: u32) -> usize {
        let samples = (self.seg().min_dist_secs * f64::from(sample_rate)).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let samples = samples as usize;
        samples.max(1)
    }

    /// Peaks of the envelope at least `min_height` high.
    pub fn detect_peaks(&self, envelope: &Envelope, min_height: f64) -> Vec<usize> {
        find_peaks(
            &envelope.samples,
            min_height,
            self.min_dist_samples(envelope.sample_rate),
        )
    }

    /// Label the envelope peaks, raising the height threshold while too many
    /// stay uncertain, then repair the uncertain groups that remain.
    ///
    /// Fails only when the initial peak set has no usable rhythm.
    pub fn classify(&self, envelope: &Envelope) -> Result<ClassifiedPeaks> {
        let seg = self.seg();
        let budget = seg.max_uncertain_per_min * envelope.duration_minutes();

        let peaks = self.detect_peaks(envelope, seg.min_height);
        let initial = classify_peaks(&peaks)?;
        debug!(
            "{} peaks at height {}, {} uncertain (budget {:.1})",
            peaks.len(),
            seg.min_height,
            initial.uncertain_count(),
            budget
        );

        let mut partial_resolution = false;
        let (peaks, classification, min_height) = if within_budget(&initial, budget) {
            (peaks, initial, seg.min_height)
        } else if let Some(adapted) = self.adapt_threshold(envelope, budget) {
            adapted
        } else {
            warn!(
                "Uncertain peaks stay above {:.1} after {} threshold steps; keeping height {}",
                budget, seg.max_comp_iter, seg.min_height
            );
            partial_resolution = true;
            (peaks, initial, seg.min_height)
        };

        let mut classified = if classification.uncertain_count() == 0 {
            ClassifiedPeaks::from_labels(
                peaks,
                &classification.labels(),
                classification.y_line,
                min_height,
            )
        } else {
            let rate = f64::from(envelope.sample_rate);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let window = (seg.repair_window_secs * rate).round() as usize;
            let ctx = RepairContext {
                envelope: &envelope.samples,
                min_dist: self.min_dist_samples(envelope.sample_rate),
                candidate_height: seg.envelope_threshold,
                window,
            };
            let outcome = solve_uncertains(&peaks, &classification, &ctx);
            let mut classified = ClassifiedPeaks::from_labels(
                outcome.peaks,
                &outcome.labels,
                classification.y_line,
                min_height,
            );
            classified.repaired_groups = outcome.repaired;
            classified.unresolved_groups = outcome.unresolved;
            classified
        };
        classified.partial_resolution = partial_resolution;
        Ok(classified)
    }

    /// Raise the height threshold step by step until the uncertain count fits
    /// the budget.
    fn adapt_threshold(
        &self,
        envelope: &Envelope,
        budget: f64,
    ) -> Option<(Vec<usize>, Classification, f64)> {
        let seg = self.seg();
        #[allow(clippy::cast_precision_loss)]
        let step = (seg.max_comp_height - seg.min_height) / seg.max_comp_iter as f64;
        if step.is_nan() || step <= 0.0 {
            return None;
        }

        let mut failed: Option<(usize, f64, Error)> = None;
        let mut adapted = None;
        for i in 1..=seg.max_comp_iter {
            #[allow(clippy::cast_precision_loss)]
            let height = step.mul_add(i as f64, seg.min_height);
            let peaks = self.detect_peaks(envelope, height);
            match classify_peaks(&peaks) {
                Ok(classification) if within_budget(&classification, budget) => {
                    debug!(
                        "Height {height:.3}: {} peaks, {} uncertain",
                        peaks.len(),
                        classification.uncertain_count()
                    );
                    adapted = Some((peaks, classification, height));
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Height {height:.3}: {e}");
                    let count = failed.as_ref().map_or(0, |(n, _, _)| *n);
                    failed = Some((count + 1, height, e));
                }
            }
        }

        if let Some((count, height, e)) = failed {
            warn!("{count} raised height(s) could not be classified, last at {height:.3}: {e}");
        }
        adapted
    }

    /// Cut the S1 and S2 domains out of the preprocessed and raw signals.
    pub fn segment(
        &self,
        raw: &Signal,
        preprocessed: &Preprocessed,
        envelope: &Envelope,
        classified: &ClassifiedPeaks,
    ) -> Segmentation {
        let threshold = self.seg().envelope_threshold;
        let processed_map = IndexMap::processed(envelope.delay);
        let raw_map = IndexMap::raw(
            envelope.delay,
            preprocessed.decimation,
            preprocessed.bandpass_delay,
        );
        let cut = |peaks: &[usize]| {
            let domains = detect_peak_domains(peaks, &envelope.samples, threshold);
            SoundSegments {
                processed: segment(&preprocessed.signal.samples, &domains, &processed_map),
                raw: segment(&raw.samples, &domains, &raw_map),
                domains,
            }
        };
        Segmentation {
            s1: cut(&classified.s1),
            s2: cut(&classified.s2),
        }
    }

    /// Run every stage on a raw recording.
    pub fn run(&self, raw: &Signal) -> Result<PipelineOutput> {
        let preprocessed = self.preprocess(raw)?;
        let envelope = self.extract_envelope(&preprocessed)?;
        let classified = self.classify(&envelope)?;
        let segmentation = self.segment(raw, &preprocessed, &envelope, &classified);
        info!(
            "{} S1, {} S2, {} uncertain ({} groups repaired, {} unresolved)",
            classified.s1.len(),
            classified.s2.len(),
            classified.uncertain.len(),
            classified.repaired_groups,
            classified.unresolved_groups
        );
        Ok(PipelineOutput {
            original_rate: raw.sample_rate,
            preprocessed,
            envelope,
            classified,
            segmentation,
        })
    }
}

fn within_budget(classification: &Classification, budget: f64) -> bool {
    #[allow(clippy::cast_precision_loss)]
    let count = classification.uncertain_count() as f64;
    count <= budget
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    /// Gaussian bump of width 80 samples.
    fn bump(i: usize, center: usize, height: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let d = (i as f64 - center as f64) / 80.0;
        height * (-0.5 * d * d).exp()
    }

    /// Envelope with `cycles` S1/S2 pairs: S1 every 4000 samples at height
    /// 3.0, S2 1200 samples later at height 2.0.
    fn rhythmic_envelope(cycles: usize) -> Envelope {
        let len = cycles * 4000 + 2000;
        let samples = (0..len)
            .map(|i| {
                (0..cycles)
                    .map(|k| {
                        let s1 = 1000 + k * 4000;
                        bump(i, s1, 3.0) + bump(i, s1 + 1200, 2.0)
                    })
                    .sum()
            })
            .collect();
        Envelope {
            samples,
            sample_rate: 4000,
            delay: 0,
        }
    }

    fn processor() -> Processor {
        Processor::new(Config::default()).unwrap()
    }

    #[test]
    fn test_min_dist_samples() {
        let p = processor();
        assert_eq!(p.min_dist_samples(4000), 920);
        assert_eq!(p.min_dist_samples(0), 1);
    }

    #[test]
    fn test_rhythmic_envelope_classifies_without_uncertain() {
        let n = 8;
        let envelope = rhythmic_envelope(n);
        let classified = processor().classify(&envelope).unwrap();

        assert_eq!(classified.peaks.len(), 2 * n);
        assert_eq!(classified.s1.len(), n - 1);
        assert_eq!(classified.s2.len(), n - 1);
        assert!(classified.uncertain.is_empty());
        assert!(!classified.partial_resolution);
        assert_eq!(classified.s1[0], 1000);
        assert_eq!(classified.s2[0], 2200);
        assert_eq!(classified.y_line, 2000.0);
    }

    /// Envelope with `cycles` S1 peaks at height 3.0 every 4000 samples and
    /// two more peaks per cycle, given as (offset from S1, height).
    fn three_peak_envelope(
        cycles: usize,
        s2: (usize, f64),
        extra: (usize, f64),
    ) -> Envelope {
        let len = cycles * 4000 + 2000;
        let samples = (0..len)
            .map(|i| {
                (0..cycles)
                    .map(|k| {
                        let s1 = 1000 + k * 4000;
                        bump(i, s1, 3.0) + bump(i, s1 + s2.0, s2.1) + bump(i, s1 + extra.0, extra.1)
                    })
                    .sum()
            })
            .collect();
        Envelope {
            samples,
            sample_rate: 4000,
            delay: 0,
        }
    }

    fn processor_with(adjust: impl FnOnce(&mut SegmentationConfig)) -> Processor {
        let mut config = Config::default();
        adjust(&mut config.segmentation);
        Processor::new(config).unwrap()
    }

    #[test]
    fn test_raised_height_drops_weak_extra_peaks() {
        // A 0.5 peak 2200 samples after every S1 breaks the alternation until
        // the height passes it at the 29th step of 0.007.
        let n = 8;
        let envelope = three_peak_envelope(n, (1200, 2.0), (2200, 0.5));
        let p = processor();
        let initial = classify_peaks(&p.detect_peaks(&envelope, 0.3)).unwrap();
        assert!(initial.uncertain_count() > 3);

        let classified = p.classify(&envelope).unwrap();
        assert!((classified.min_height - 0.503).abs() < 1e-9);
        assert!(!classified.partial_resolution);
        assert!(classified.uncertain.is_empty());
        assert_eq!(classified.peaks.len(), 2 * n);
        assert_eq!(classified.y_line, 2000.0);
    }

    #[test]
    fn test_exhausted_heights_keep_initial_peaks() {
        let envelope = three_peak_envelope(8, (1200, 2.0), (2200, 0.5));
        let p = processor_with(|seg| {
            seg.max_comp_height = 0.4;
            seg.max_uncertain_per_min = 0.0;
        });
        let classified = p.classify(&envelope).unwrap();

        assert!(classified.partial_resolution);
        assert_eq!(classified.min_height, 0.3);
        assert!(classified.repaired_groups >= 1);
    }

    #[test]
    fn test_unclassifiable_raised_heights_are_skipped() {
        // Above 0.35 only S1 and the extra peak remain, 2000 samples apart,
        // so every raised height past the S2 has no threshold line.
        let envelope = three_peak_envelope(8, (950, 0.35), (2000, 0.5));
        let p = processor_with(|seg| seg.max_comp_height = 0.45);
        let at = |height| classify_peaks(&p.detect_peaks(&envelope, height));
        assert!(at(0.3).is_ok());
        assert!(matches!(at(0.4), Err(Error::NoThresholdLine { .. })));

        let classified = p.classify(&envelope).unwrap();
        assert!(classified.partial_resolution);
        assert_eq!(classified.min_height, 0.3);
        assert!(classified.y_line > 1000.0 && classified.y_line < 2000.0);
    }

    #[test]
    fn test_uniform_peaks_fail() {
        let samples = (0..20_000)
            .map(|i| (0..5).map(|k| bump(i, 2000 + k * 4000, 2.0)).sum())
            .collect();
        let envelope = Envelope {
            samples,
            sample_rate: 4000,
            delay: 0,
        };
        assert!(processor().classify(&envelope).is_err());
    }

    #[test]
    fn test_segment_domains_hold_their_peaks() {
        let p = processor();
        let envelope = rhythmic_envelope(6);
        let classified = p.classify(&envelope).unwrap();
        let preprocessed = Preprocessed {
            signal: Signal::new(vec![0.5; envelope.len()], 4000),
            decimation: 2,
            bandpass_delay: 0,
        };
        let raw = Signal::new(vec![0.25; envelope.len() * 2], 8000);
        let segmentation = p.segment(&raw, &preprocessed, &envelope, &classified);

        assert_eq!(segmentation.s1.domains.len(), classified.s1.len());
        assert_eq!(segmentation.s2.domains.len(), classified.s2.len());
        for domain in &segmentation.s1.domains {
            assert!(classified.s1.iter().any(|&p| domain.contains(p)));
        }
        let width: usize = segmentation.s1.domains.iter().map(Domain::len).sum();
        assert_eq!(segmentation.s1.processed.concatenated.len(), width);
        assert_eq!(segmentation.s1.raw.concatenated.len(), 2 * width);
        assert_eq!(segmentation.s1.raw.masked.len(), raw.len());
        assert!(segmentation.sound(Label::Uncertain).is_none());
    }
}
