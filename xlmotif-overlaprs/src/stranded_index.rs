//! Genome-wide, strand-aware interval indexing.
//!
//! [`StrandedIndex`] keeps one [`AIList`] per `(chromosome, strand)` pair so
//! that every query only ever sees intervals on the same strand as the
//! query, which is how crosslink sites are matched to annotation and peaks.
//!
//! ```
//! use xlmotif_core::models::{GenomicInterval, IntervalSet, Strand};
//! use xlmotif_overlaprs::stranded_index::IntoStrandedIndex;
//!
//! let peaks = IntervalSet::from(vec![
//!     GenomicInterval::new("chr1", 100, 200, Strand::Plus),
//!     GenomicInterval::new("chr1", 100, 200, Strand::Minus),
//! ]);
//! let index = peaks.into_stranded_index();
//!
//! assert_eq!(index.find("chr1", Strand::Plus, 150, 151).len(), 1);
//! assert!(index.find("chr1", Strand::Plus, 250, 251).is_empty());
//! ```
use fxhash::FxHashMap;

use xlmotif_core::models::{GenomicInterval, Interval, IntervalSet, Strand};

use crate::{AIList, Overlapper};

/// A genome-wide index with a separate overlap structure per chromosome strand.
pub struct StrandedIndex<T>
where
    T: Clone + Send + Sync,
{
    index_maps: FxHashMap<(String, Strand), AIList<u32, T>>,
}

impl<T> StrandedIndex<T>
where
    T: Clone + Send + Sync,
{
    /// Build the index from `(chrom, strand, interval)` triples.
    pub fn build<It>(items: It) -> Self
    where
        It: IntoIterator<Item = (String, Strand, Interval<u32, T>)>,
    {
        let mut grouped: FxHashMap<(String, Strand), Vec<Interval<u32, T>>> =
            FxHashMap::default();
        for (chrom, strand, interval) in items {
            grouped.entry((chrom, strand)).or_default().push(interval);
        }

        let index_maps = grouped
            .into_iter()
            .map(|(key, intervals)| (key, AIList::build(intervals)))
            .collect();

        StrandedIndex { index_maps }
    }

    /// All intervals on `chrom`/`strand` overlapping `[start, end)`.
    pub fn find(&self, chrom: &str, strand: Strand, start: u32, end: u32) -> Vec<&Interval<u32, T>> {
        match self.index_maps.get(&(chrom.to_string(), strand)) {
            Some(lapper) => lapper.find_iter(start, end).collect(),
            None => vec![],
        }
    }

    pub fn has_overlap(&self, chrom: &str, strand: Strand, start: u32, end: u32) -> bool {
        self.index_maps
            .get(&(chrom.to_string(), strand))
            .is_some_and(|lapper| lapper.any_overlap(start, end))
    }

    ///
    /// The interval containing `pos` (closed left, open right). When several
    /// intervals contain the position the narrowest wins, then the one with
    /// the lower start.
    pub fn containing(&self, chrom: &str, strand: Strand, pos: u32) -> Option<&Interval<u32, T>> {
        self.index_maps
            .get(&(chrom.to_string(), strand))
            .and_then(|lapper| lapper.containing(pos))
    }

    pub fn len(&self) -> usize {
        self.index_maps.values().map(|lapper| lapper.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert a collection of stranded records into a [`StrandedIndex`].
pub trait IntoStrandedIndex<T>
where
    T: Clone + Send + Sync,
{
    fn into_stranded_index(self) -> StrandedIndex<T>;
}

impl IntoStrandedIndex<GenomicInterval> for IntervalSet {
    fn into_stranded_index(self) -> StrandedIndex<GenomicInterval> {
        StrandedIndex::build(self.intervals.into_iter().map(|record| {
            (
                record.chrom.clone(),
                record.strand,
                Interval {
                    start: record.start,
                    end: record.end,
                    val: record,
                },
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn index() -> StrandedIndex<&'static str> {
        StrandedIndex::build(vec![
            ("chr1".to_string(), Strand::Plus, Interval { start: 100u32, end: 300, val: "wide" }),
            ("chr1".to_string(), Strand::Plus, Interval { start: 150, end: 200, val: "narrow" }),
            ("chr1".to_string(), Strand::Minus, Interval { start: 100, end: 300, val: "minus" }),
            ("chr2".to_string(), Strand::Plus, Interval { start: 0, end: 10, val: "chr2" }),
        ])
    }

    #[rstest]
    fn test_find_is_strand_aware(index: StrandedIndex<&'static str>) {
        let mut plus: Vec<&str> = index
            .find("chr1", Strand::Plus, 160, 161)
            .iter()
            .map(|iv| iv.val)
            .collect();
        plus.sort();
        assert_eq!(plus, vec!["narrow", "wide"]);

        let minus: Vec<&str> = index
            .find("chr1", Strand::Minus, 160, 161)
            .iter()
            .map(|iv| iv.val)
            .collect();
        assert_eq!(minus, vec!["minus"]);
    }

    #[rstest]
    fn test_unknown_chrom_has_no_hits(index: StrandedIndex<&'static str>) {
        assert!(index.find("chr3", Strand::Plus, 0, 1000).is_empty());
        assert!(!index.has_overlap("chr2", Strand::Minus, 0, 5));
        assert!(index.has_overlap("chr2", Strand::Plus, 0, 5));
    }

    #[rstest]
    #[case(160, Some("narrow"))]
    #[case(149, Some("wide"))]
    #[case(200, Some("wide"))]
    #[case(100, Some("wide"))]
    #[case(299, Some("wide"))]
    #[case(300, None)]
    #[case(99, None)]
    fn test_containing(
        index: StrandedIndex<&'static str>,
        #[case] pos: u32,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            index.containing("chr1", Strand::Plus, pos).map(|iv| iv.val),
            expected
        );
    }

    #[rstest]
    fn test_len(index: StrandedIndex<&'static str>) {
        assert_eq!(index.len(), 4);
        assert!(!index.is_empty());
    }

    #[rstest]
    fn test_from_interval_set() {
        let set = IntervalSet::from(vec![
            GenomicInterval::new("chr1", 10, 20, Strand::Minus),
            GenomicInterval::new("chr1", 30, 40, Strand::Minus),
        ]);
        let index = set.into_stranded_index();
        let hits = index.find("chr1", Strand::Minus, 15, 35);
        assert_eq!(hits.len(), 2);
        assert!(index.find("chr1", Strand::Plus, 15, 35).is_empty());
    }
}
