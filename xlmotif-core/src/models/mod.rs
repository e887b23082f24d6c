pub mod chrom_sizes;
pub mod genomic_interval;
pub mod interval;
pub mod interval_set;
pub mod region_kind;
pub mod strand;

// re-export for cleaner imports
pub use self::chrom_sizes::ChromSizes;
pub use self::genomic_interval::GenomicInterval;
pub use self::interval::Interval;
pub use self::interval_set::IntervalSet;
pub use self::region_kind::RegionKind;
pub use self::strand::Strand;
