// https://github.com/sstadick/rust-lapper/blob/7e3904daed85181f1faa39b15f51935f13945976/src/lib.rs#L92
use num_traits::{PrimInt, Unsigned};
use std::cmp::Ordering;

/// Represent a range from [start, end) carrying a payload.
///
/// This is the element type stored in the overlap indexes. Ordering and
/// equality only look at the coordinates.
#[derive(Debug, Clone)]
pub struct Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    pub start: I,
    pub end: I,
    pub val: T,
}

impl<I, T> Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    /// Check if the interval overlaps [start, end)
    #[inline]
    pub fn overlap(&self, start: I, end: I) -> bool {
        self.start < end && self.end > start
    }

    /// Closed-left, open-right containment of a single position.
    #[inline]
    pub fn contains(&self, pos: I) -> bool {
        self.start <= pos && pos < self.end
    }
}

impl<I, T> Ord for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl<I, T> PartialOrd for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I, T> PartialEq for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl<I, T> Eq for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    #[case(10, true)]
    #[case(19, true)]
    #[case(20, false)]
    #[case(9, false)]
    fn test_contains_is_closed_left(#[case] pos: u32, #[case] expected: bool) {
        let iv = Interval { start: 10u32, end: 20, val: () };
        assert_eq!(iv.contains(pos), expected);
    }

    #[rstest]
    fn test_overlap_excludes_touching_ends() {
        let iv = Interval { start: 10u32, end: 20, val: () };
        assert!(iv.overlap(19, 25));
        assert!(!iv.overlap(20, 25));
        assert!(!iv.overlap(0, 10));
    }

    #[rstest]
    fn test_ordering_by_start_then_end() {
        let mut ivs = vec![
            Interval { start: 5u32, end: 9, val: 'a' },
            Interval { start: 1, end: 4, val: 'b' },
            Interval { start: 5, end: 7, val: 'c' },
        ];
        ivs.sort();
        let vals: Vec<char> = ivs.iter().map(|iv| iv.val).collect();
        assert_eq!(vals, vec!['b', 'c', 'a']);
    }
}
