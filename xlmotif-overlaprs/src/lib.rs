//! Strand-aware genomic interval overlap operations for xlmotif.
//!
//! All overlap computation lives here: the augmented interval list, the
//! genome-wide index that keeps one list per chromosome strand, and the
//! interval algebra (merge, complement, slop, intersect) the pipeline builds
//! on. Higher-level crates wrap this functionality but do not reimplement
//! overlap algorithms.
//!
//! ## Quick Start
//!
//! ```rust
//! use xlmotif_overlaprs::{AIList, Overlapper, Interval};
//!
//! let intervals = vec![
//!     Interval { start: 100u32, end: 200, val: "intron1" },
//!     Interval { start: 150, end: 300, val: "intron2" },
//!     Interval { start: 400, end: 500, val: "intron3" },
//! ];
//!
//! let ailist = AIList::build(intervals);
//! assert_eq!(ailist.find(180, 250).len(), 2);
//! ```

/// Augmented Interval List implementation.
///
/// See [`AIList`] for details.
pub mod ailist;

/// Strand-aware set algebra on interval sets.
pub mod interval_ranges;

/// Genome-wide, per-strand interval indexing.
pub mod stranded_index;

/// Core traits for overlap operations.
///
/// See [`Overlapper`] for the main trait.
pub mod traits;

// re-exports
pub use self::ailist::AIList;
pub use self::interval_ranges::IntervalRanges;
pub use self::stranded_index::{IntoStrandedIndex, StrandedIndex};
pub use self::traits::{Interval, Overlapper};
