use num_traits::{PrimInt, Unsigned};

use super::Overlapper;
use xlmotif_core::models::Interval;

/// Number of following intervals an interval must cover before it is moved
/// out of a component into the next one.
const MIN_COVERAGE: usize = 10;

/// An Augmented Interval List for overlap queries on one chromosome strand.
///
/// From the following article: <https://academic.oup.com/bioinformatics/article/35/23/4907/5509521>
///
/// Intervals are split into components. Each component is sorted by start
/// and carries a running maximum of end coordinates, which lets a query stop
/// walking backwards as soon as no earlier interval can reach it. Long
/// intervals that would cover many of their successors are pushed into later
/// components, which keeps that early stop effective on dense annotations.
///
/// ```
/// use xlmotif_overlaprs::{AIList, Overlapper, Interval};
///
/// let introns = vec![
///     Interval { start: 1000u32, end: 2000, val: "intron1" },
///     Interval { start: 1500, end: 2500, val: "intron2" },
///     Interval { start: 5000, end: 6000, val: "intron3" },
/// ];
///
/// let ailist = AIList::build(introns);
/// assert_eq!(ailist.find(1800, 2200).len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    components: Vec<Component<I, T>>,
}

#[derive(Debug, Clone)]
struct Component<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    starts: Vec<I>,
    max_ends: Vec<I>,
    intervals: Vec<Interval<I, T>>,
}

impl<I, T> Component<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    fn from_sorted(intervals: Vec<Interval<I, T>>) -> Self {
        let starts = intervals.iter().map(|iv| iv.start).collect();
        let max_ends = intervals
            .iter()
            .scan(I::zero(), |max, iv| {
                *max = (*max).max(iv.end);
                Some(*max)
            })
            .collect();
        Component {
            starts,
            max_ends,
            intervals,
        }
    }

    /// Walk backwards from the last interval starting before `end` and yield
    /// every interval whose end lies past `start`.
    fn query(&self, start: I, end: I) -> impl Iterator<Item = &Interval<I, T>> {
        let last = self.starts.partition_point(|&s| s < end);
        (0..last)
            .rev()
            .take_while(move |&i| self.max_ends[i] > start)
            .filter(move |&i| self.intervals[i].end > start)
            .map(move |i| &self.intervals[i])
    }
}

impl<I, T> AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    /// Split sorted intervals into the ones kept in the current component
    /// and the ones covering at least [`MIN_COVERAGE`] of their successors.
    fn decompose(intervals: Vec<Interval<I, T>>) -> (Vec<Interval<I, T>>, Vec<Interval<I, T>>) {
        let covered: Vec<bool> = intervals
            .iter()
            .enumerate()
            .map(|(index, interval)| {
                intervals
                    .iter()
                    .skip(index + 1)
                    .take(MIN_COVERAGE * 2 - 1)
                    .filter(|next| interval.end > next.end)
                    .count()
                    >= MIN_COVERAGE
            })
            .collect();

        let mut kept = Vec::with_capacity(intervals.len());
        let mut moved = Vec::new();
        for (interval, is_covering) in intervals.into_iter().zip(covered) {
            if is_covering {
                moved.push(interval);
            } else {
                kept.push(interval);
            }
        }
        (kept, moved)
    }

    /// Returns the number of intervals in the AIList.
    pub fn len(&self) -> usize {
        self.components.iter().map(|c| c.intervals.len()).sum()
    }

    /// Returns `true` if the AIList contains no intervals.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<I, T> Overlapper<I, T> for AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized,
    {
        let mut remaining = intervals;
        remaining.sort_by_key(|iv| iv.start);

        let mut components = Vec::new();
        while !remaining.is_empty() {
            let (kept, moved) = Self::decompose(remaining);
            // a component that keeps nothing would loop forever
            if kept.is_empty() {
                components.push(Component::from_sorted(moved));
                break;
            }
            components.push(Component::from_sorted(kept));
            remaining = moved;
        }

        AIList { components }
    }

    fn find(&self, start: I, end: I) -> Vec<Interval<I, T>> {
        self.find_iter(start, end).cloned().collect()
    }

    fn find_iter<'a>(
        &'a self,
        start: I,
        end: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a> {
        Box::new(
            self.components
                .iter()
                .flat_map(move |component| component.query(start, end)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn intervals() -> Vec<Interval<u32, &'static str>> {
        vec![
            Interval { start: 1, end: 5, val: "a" },
            Interval { start: 3, end: 7, val: "b" },
            Interval { start: 6, end: 10, val: "c" },
            Interval { start: 8, end: 12, val: "d" },
        ]
    }

    fn sorted_vals(results: Vec<Interval<u32, &'static str>>) -> Vec<&'static str> {
        let mut vals: Vec<&str> = results.iter().map(|i| i.val).collect();
        vals.sort();
        vals
    }

    #[rstest]
    fn test_build_and_len(intervals: Vec<Interval<u32, &'static str>>) {
        let ailist = AIList::build(intervals.clone());
        assert_eq!(ailist.len(), intervals.len());
        assert!(!ailist.is_empty());
    }

    #[rstest]
    #[case(2, 4, vec!["a", "b"])]
    #[case(9, 11, vec!["c", "d"])]
    #[case(5, 6, vec!["b"])]
    #[case(0, 15, vec!["a", "b", "c", "d"])]
    #[case(12, 15, vec![])]
    #[case(0, 1, vec![])]
    fn test_find(
        intervals: Vec<Interval<u32, &'static str>>,
        #[case] start: u32,
        #[case] end: u32,
        #[case] expected: Vec<&str>,
    ) {
        let ailist = AIList::build(intervals);
        assert_eq!(sorted_vals(ailist.find(start, end)), expected);
    }

    #[rstest]
    fn test_empty_ailist() {
        let ailist: AIList<u32, &str> = AIList::build(vec![]);
        assert!(ailist.is_empty());
        assert!(ailist.find(1, 2).is_empty());
        assert_eq!(ailist.find_iter(1, 2).count(), 0);
    }

    #[rstest]
    fn test_long_intervals_are_decomposed() {
        // one interval spanning many short ones ends up in its own component
        let mut intervals = vec![Interval { start: 0u32, end: 1000, val: 0usize }];
        for i in 0..30 {
            intervals.push(Interval {
                start: 10 + i * 20,
                end: 15 + i * 20,
                val: i as usize + 1,
            });
        }
        let ailist = AIList::build(intervals);
        assert_eq!(ailist.components.len(), 2);
        assert_eq!(ailist.len(), 31);

        // a query between short intervals still sees the long one
        let hits = ailist.find(16, 18);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].val, 0);

        let hits = ailist.find(590, 600);
        assert_eq!(hits.len(), 2);
    }

    #[rstest]
    fn test_find_iter_matches_find(intervals: Vec<Interval<u32, &'static str>>) {
        let ailist = AIList::build(intervals);
        for (start, end) in [(2, 4), (5, 8), (9, 11), (0, 15), (7, 9)] {
            let found = ailist.find(start, end);
            let iterated: Vec<&Interval<u32, &str>> = ailist.find_iter(start, end).collect();
            assert_eq!(found.len(), iterated.len());
            for interval in &found {
                assert!(iterated.contains(&interval));
            }
        }
    }

    #[rstest]
    #[case(4, Some("a"))]
    #[case(6, Some("b"))]
    #[case(10, Some("d"))]
    #[case(0, None)]
    #[case(12, None)]
    fn test_containing_tie_takes_lower_start(
        intervals: Vec<Interval<u32, &'static str>>,
        #[case] pos: u32,
        #[case] expected: Option<&str>,
    ) {
        let ailist = AIList::build(intervals);
        assert_eq!(ailist.containing(pos).map(|i| i.val), expected);
    }

    #[rstest]
    fn test_any_overlap(intervals: Vec<Interval<u32, &'static str>>) {
        let ailist = AIList::build(intervals);
        assert!(ailist.any_overlap(11, 12));
        assert!(!ailist.any_overlap(12, 15));
        assert!(!ailist.any_overlap(0, 1));
    }

    #[rstest]
    fn test_containing_prefers_narrowest() {
        let ailist = AIList::build(vec![
            Interval { start: 0u32, end: 100, val: "outer" },
            Interval { start: 40, end: 60, val: "inner" },
            Interval { start: 45, end: 90, val: "late" },
        ]);
        assert_eq!(ailist.containing(50).map(|i| i.val), Some("inner"));
        assert_eq!(ailist.containing(70).map(|i| i.val), Some("late"));
        assert_eq!(ailist.containing(95).map(|i| i.val), Some("outer"));
    }
}
