//! Positional enrichment of kmers around thresholded crosslink sites.
//!
//! Counts around thresholded sites and around reference sites (sites outside
//! peaks) are both expressed relative to the distal occurrence of each kmer
//! around thresholded sites. The enrichment of a kmer is the ratio of the two
//! averaged over its relevant positions, and its significance is estimated by
//! bootstrapping the reference sequences.
use std::ops::RangeInclusive;

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rayon::prelude::*;
use statrs::function::erf::erfc;

use crate::kmer::{Alphabet, KmerProfile, decode_kmer, shift};

/// Positions either side of the site searched for the count maximum.
pub const PEAK_WINDOW: i32 = 15;
/// Positions either side of the site excluded from the distal background.
pub const DISTAL_MASK: i32 = 100;
/// Positions either side of `mtxn` reported as the local peak shape.
pub const SUBCOUNT_EXTENSION: i32 = 5;

///
/// Parameters of the scoring step.
///
#[derive(Debug, Clone)]
pub struct ScoringParams {
    pub k: usize,
    pub window: u32,
    pub window_distal: u32,
    pub min_relative_occurrence: f64,
    pub bootstrap_draws: usize,
    pub seed: Option<u64>,
}

/// Scores of one kmer.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRecord {
    pub kmer: String,
    /// Position of the maximal count near the site.
    pub mtxn: i32,
    /// Positions the averages are taken over.
    pub prtxn: Vec<i32>,
    pub artxn: f64,
    pub aroxn: f64,
    pub etxn: Option<f64>,
    pub z_score: Option<f64>,
    pub p_value: Option<f64>,
    /// Occurrences per 100 thresholded sites, over the distal window.
    pub occurrence_curve: Vec<f64>,
    /// Counts around `mtxn`.
    pub subcounts: Vec<(i32, f64)>,
}

/// Records of every kmer, in lexicographic kmer order.
#[derive(Debug, Clone)]
pub struct EnrichmentTable {
    pub records: Vec<EnrichmentRecord>,
    first_pos: i32,
}

impl EnrichmentTable {
    /// Occurrence curves of `records` start at `first_pos`.
    pub fn from_records(records: Vec<EnrichmentRecord>, first_pos: i32) -> Self {
        EnrichmentTable { records, first_pos }
    }

    /// Positions covered by the occurrence curves.
    pub fn positions(&self) -> RangeInclusive<i32> {
        let len = self.records.first().map_or(0, |r| r.occurrence_curve.len()) as i32;
        self.first_pos..=self.first_pos + len - 1
    }

    /// Occurrence of record `idx` at `pos`, zero outside the curve.
    pub fn occurrence(&self, idx: usize, pos: i32) -> f64 {
        let offset = pos - self.first_pos;
        if offset < 0 {
            return 0.0;
        }
        self.records[idx]
            .occurrence_curve
            .get(offset as usize)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Upper tail probability of the standard normal distribution.
pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / std::f64::consts::SQRT_2)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// First position holding the maximal value within `[-PEAK_WINDOW, PEAK_WINDOW]`.
pub fn max_position(profile: &KmerProfile, code: usize) -> i32 {
    let mut best = (-PEAK_WINDOW, profile.get(code, -PEAK_WINDOW));
    for pos in -PEAK_WINDOW + 1..=PEAK_WINDOW {
        let value = profile.get(code, pos);
        if value > best.1 {
            best = (pos, value);
        }
    }
    best.0
}

///
/// Values of `code` in the `2 * SUBCOUNT_EXTENSION + 1` positions around
/// `max_pos`, moved inwards when `max_pos` is too close to the profile edge.
///
pub fn subcounts(profile: &KmerProfile, code: usize, max_pos: i32) -> Vec<(i32, f64)> {
    let positions = profile.positions();
    let (lo, hi) = (*positions.start(), *positions.end());
    let range = if max_pos < lo + SUBCOUNT_EXTENSION {
        lo..=lo + 2 * SUBCOUNT_EXTENSION
    } else if max_pos > hi - SUBCOUNT_EXTENSION {
        hi - 2 * SUBCOUNT_EXTENSION..=hi
    } else {
        max_pos - SUBCOUNT_EXTENSION..=max_pos + SUBCOUNT_EXTENSION
    };
    range
        .filter(|pos| profile.column(*pos).is_some())
        .map(|pos| (pos, profile.get(code, pos)))
        .collect()
}

///
/// Mean value of each kmer over the positions outside
/// `[-DISTAL_MASK + shift, DISTAL_MASK + shift)`. Zero when no position is
/// left.
///
pub fn average_distal(profile: &KmerProfile) -> Vec<f64> {
    let shift = shift(profile.k());
    let masked = (-DISTAL_MASK + shift)..(DISTAL_MASK + shift);
    let distal: Vec<i32> = profile
        .positions()
        .filter(|pos| !masked.contains(pos))
        .collect();

    (0..profile.n_kmers())
        .map(|code| mean(distal.iter().map(|pos| profile.get(code, *pos))).unwrap_or(0.0))
        .collect()
}

/// Count relative to the distal average, the count itself when the average
/// is zero.
#[inline]
fn relative(count: f64, avg_distal: f64) -> f64 {
    if avg_distal == 0.0 {
        count
    } else {
        count / avg_distal
    }
}

///
/// Positions in `[-window + shift, window + shift]` where a kmer is relevant:
/// always inside the inner third of the window, elsewhere only when the
/// relative occurrence exceeds `min_relative_occurrence`.
///
pub fn relevant_positions(
    rtxn: &KmerProfile,
    code: usize,
    window: u32,
    min_relative_occurrence: f64,
) -> Vec<i32> {
    let shift = shift(rtxn.k());
    let window = window as i32;
    let inner = window / 3;
    let inner_band = (-inner + shift)..=(inner + shift);

    ((-window + shift)..=(window + shift))
        .filter(|pos| inner_band.contains(pos) || rtxn.get(code, *pos) > min_relative_occurrence)
        .collect()
}

///
/// Computes the enrichment table of a region.
///
pub struct EnrichmentScorer {
    params: ScoringParams,
    progress: bool,
}

impl EnrichmentScorer {
    pub fn new(params: ScoringParams) -> Self {
        EnrichmentScorer {
            params,
            progress: false,
        }
    }

    /// Report bootstrap progress on the terminal.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    ///
    /// Score every kmer.
    ///
    /// `thresholded` is counted with `window_distal`, `reference` with
    /// `window`; `ntxn` and `noxn` are the number of thresholded and
    /// reference sites.
    pub fn score(
        &self,
        thresholded: &KmerProfile,
        reference: &KmerProfile,
        reference_sequences: &[String],
        ntxn: usize,
        noxn: usize,
    ) -> EnrichmentTable {
        let p = &self.params;
        let n_kmers = thresholded.n_kmers();
        let avg_distal = average_distal(thresholded);

        let rtxn = thresholded.map(|code, _, count| relative(count, avg_distal[code]));
        let roxn = reference.map(|code, _, count| {
            let scale = ntxn as f64 / noxn.max(1) as f64;
            relative(count, avg_distal[code]) * scale
        });

        let prtxn: Vec<Vec<i32>> = (0..n_kmers)
            .map(|code| relevant_positions(&rtxn, code, p.window, p.min_relative_occurrence))
            .collect();

        let bootstrap = self.bootstrap(reference_sequences, ntxn, &avg_distal, &prtxn);
        let missing = bootstrap.iter().filter(|b| b.is_none()).count();
        if missing > 0 {
            log::warn!("{} of {} kmers missing from the bootstrap, no z-scores for them", missing, n_kmers);
        }

        let records = (0..n_kmers)
            .map(|code| {
                let kmer = decode_kmer(code, p.k, Alphabet::Rna);
                let positions = &prtxn[code];

                let artxn = mean(positions.iter().map(|pos| rtxn.get(code, *pos))).unwrap_or(0.0);
                let aroxn = mean(positions.iter().map(|pos| roxn.get(code, *pos))).unwrap_or(0.0);

                let etxn = (artxn > 0.0 && aroxn > 0.0)
                    .then(|| (artxn / aroxn).log2())
                    .filter(|e| e.is_finite());

                let z_score = match &bootstrap[code] {
                    Some((avg, std)) if *std > 0.0 => Some((artxn - avg) / std),
                    _ => None,
                }
                .filter(|z| z.is_finite());
                let p_value = z_score.map(normal_sf);

                let mtxn = max_position(thresholded, code);
                let occurrence_curve = thresholded
                    .row(code)
                    .iter()
                    .map(|count| count * 100.0 / ntxn.max(1) as f64)
                    .collect();

                EnrichmentRecord {
                    subcounts: subcounts(thresholded, code, mtxn),
                    kmer,
                    mtxn,
                    prtxn: positions.clone(),
                    artxn,
                    aroxn,
                    etxn,
                    z_score,
                    p_value,
                    occurrence_curve,
                }
            })
            .collect();

        EnrichmentTable {
            records,
            first_pos: *thresholded.positions().start(),
        }
    }

    ///
    /// Mean and population standard deviation, per kmer, of the relative
    /// occurrence averaged over `prtxn` in random reference samples of
    /// `ntxn` sequences.
    ///
    fn bootstrap(
        &self,
        reference_sequences: &[String],
        ntxn: usize,
        avg_distal: &[f64],
        prtxn: &[Vec<i32>],
    ) -> Vec<Option<(f64, f64)>> {
        let p = &self.params;
        let n_kmers = avg_distal.len();
        if p.bootstrap_draws == 0 {
            return vec![None; n_kmers];
        }

        let amount = ntxn.min(reference_sequences.len());
        if amount < ntxn {
            log::warn!(
                "Only {} reference sequences for {} thresholded sites, bootstrap samples are capped",
                reference_sequences.len(),
                ntxn
            );
        }

        let mut rng = match p.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        // draws come from one rng in order; only the counting is parallel
        let draws: Vec<Vec<usize>> = (0..p.bootstrap_draws)
            .map(|_| sample(&mut rng, reference_sequences.len(), amount).into_vec())
            .collect();

        let pb = if self.progress {
            let pb = ProgressBar::new(draws.len() as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
            ) {
                pb.set_style(style);
            }
            pb.set_message("bootstrap");
            pb
        } else {
            ProgressBar::hidden()
        };

        let samples: Vec<Vec<f64>> = draws
            .par_iter()
            .map(|draw| {
                let mut profile = KmerProfile::zeros(p.k, p.window);
                for idx in draw {
                    profile.add_sequence(reference_sequences[*idx].as_bytes());
                }
                let aroxn_sample = (0..n_kmers)
                    .map(|code| {
                        mean(
                            prtxn[code]
                                .iter()
                                .map(|pos| relative(profile.get(code, *pos), avg_distal[code])),
                        )
                        .unwrap_or(0.0)
                    })
                    .collect();
                pb.inc(1);
                aroxn_sample
            })
            .collect();
        pb.finish_and_clear();

        let n = samples.len() as f64;
        (0..n_kmers)
            .map(|code| {
                let avg = samples.iter().map(|s| s[code]).sum::<f64>() / n;
                let var = samples.iter().map(|s| (s[code] - avg).powi(2)).sum::<f64>() / n;
                Some((avg, var.sqrt()))
            })
            .collect()
    }
}
