use num_traits::{PrimInt, Unsigned};

pub use xlmotif_core::models::Interval;

///
/// Overlap queries on the intervals of a single chromosome strand.
/// Coordinates are 0-based half-open.
///
pub trait Overlapper<I, T>: Send + Sync
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized;

    fn find(&self, start: I, end: I) -> Vec<Interval<I, T>>;

    fn find_iter<'a>(
        &'a self,
        start: I,
        end: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a>;

    fn any_overlap(&self, start: I, end: I) -> bool {
        self.find_iter(start, end).next().is_some()
    }

    /// Narrowest interval holding `pos`; ties go to the lower start.
    fn containing(&self, pos: I) -> Option<&Interval<I, T>> {
        self.find_iter(pos, pos.saturating_add(I::one()))
            .filter(|interval| interval.contains(pos))
            .min_by_key(|interval| (interval.end - interval.start, interval.start))
    }
}
