//! Strand-aware interval set algebra for crosslink analysis.
//!
//! Provides the bedtools-style operations the pipeline needs: merge
//! (`reduce`), genome complement, window extension (`slop`) and overlap
//! filtering against an index. All operations use 0-based half-open
//! coordinates and never mix strands.
use std::collections::BTreeMap;

use xlmotif_core::models::{ChromSizes, GenomicInterval, IntervalSet, Strand};

use crate::stranded_index::StrandedIndex;

/// Interval set algebra operations on stranded interval sets.
///
/// All functions return new `IntervalSet` instances. Operations that merge
/// or synthesize intervals (`reduce`, `complement`) emit records named `.`
/// with a zero score.
pub trait IntervalRanges {
    /// Merge overlapping and book-ended intervals per chromosome and strand.
    ///
    /// # Example
    /// ```text
    /// Input:  chr1 0–10 +, chr1 10–20 +, chr1 5–8 -
    /// Output: chr1 0–20 +, chr1 5–8 -
    /// ```
    fn reduce(&self) -> IntervalSet;

    /// Gaps between the intervals of each strand, over every chromosome of
    /// `chrom_sizes`. A chromosome with no interval on a strand is returned
    /// whole for that strand. The result is sorted by chromosome, start and
    /// strand.
    fn complement(&self, chrom_sizes: &ChromSizes) -> IntervalSet;

    /// Extend every interval `left` bases towards lower coordinates and
    /// `right` bases towards higher coordinates, clamped to `[0, chrom_len]`.
    /// Intervals on chromosomes missing from `chrom_sizes` are dropped.
    fn slop(&self, left: u32, right: u32, chrom_sizes: &ChromSizes) -> IntervalSet;

    /// Keep the intervals that overlap at least one same-strand interval of
    /// `index`. Each kept interval is reported once.
    fn intersect<T: Clone + Send + Sync>(&self, index: &StrandedIndex<T>) -> IntervalSet;
}

impl IntervalRanges for IntervalSet {
    fn reduce(&self) -> IntervalSet {
        let mut by_key: BTreeMap<(&str, Strand), Vec<(u32, u32)>> = BTreeMap::new();
        for iv in &self.intervals {
            by_key
                .entry((iv.chrom.as_str(), iv.strand))
                .or_default()
                .push((iv.start, iv.end));
        }

        let mut merged: Vec<GenomicInterval> = Vec::new();
        for ((chrom, strand), mut spans) in by_key {
            spans.sort_unstable();
            let mut current = spans[0];
            for &(start, end) in &spans[1..] {
                if start <= current.1 {
                    // overlapping or adjacent, extend
                    current.1 = current.1.max(end);
                } else {
                    merged.push(GenomicInterval::new(chrom, current.0, current.1, strand));
                    current = (start, end);
                }
            }
            merged.push(GenomicInterval::new(chrom, current.0, current.1, strand));
        }

        let mut result = IntervalSet::from(merged);
        result.sort();
        result
    }

    fn complement(&self, chrom_sizes: &ChromSizes) -> IntervalSet {
        let reduced = self.reduce();

        let mut by_key: BTreeMap<(&str, Strand), Vec<&GenomicInterval>> = BTreeMap::new();
        for iv in &reduced.intervals {
            by_key.entry((iv.chrom.as_str(), iv.strand)).or_default().push(iv);
        }

        let mut gaps: Vec<GenomicInterval> = Vec::new();
        for strand in [Strand::Plus, Strand::Minus] {
            for (chrom, chrom_len) in chrom_sizes.iter() {
                let mut pos = 0u32;
                if let Some(covered) = by_key.get(&(chrom, strand)) {
                    for iv in covered {
                        let start = iv.start.min(chrom_len);
                        if start > pos {
                            gaps.push(GenomicInterval::new(chrom, pos, start, strand));
                        }
                        pos = pos.max(iv.end.min(chrom_len));
                    }
                }
                if pos < chrom_len {
                    gaps.push(GenomicInterval::new(chrom, pos, chrom_len, strand));
                }
            }
        }

        let mut result = IntervalSet::from(gaps);
        result.sort();
        result
    }

    fn slop(&self, left: u32, right: u32, chrom_sizes: &ChromSizes) -> IntervalSet {
        let intervals: Vec<_> = self
            .intervals
            .iter()
            .filter_map(|iv| {
                let chrom_len = chrom_sizes.get(&iv.chrom)?;
                let mut extended = iv.clone();
                extended.start = iv.start.saturating_sub(left).min(chrom_len);
                extended.end = iv.end.saturating_add(right).min(chrom_len);
                Some(extended)
            })
            .collect();
        IntervalSet::from(intervals)
    }

    fn intersect<T: Clone + Send + Sync>(&self, index: &StrandedIndex<T>) -> IntervalSet {
        let intervals: Vec<_> = self
            .intervals
            .iter()
            .filter(|iv| index.has_overlap(&iv.chrom, iv.strand, iv.start, iv.end))
            .cloned()
            .collect();
        IntervalSet::from(intervals)
    }
}
