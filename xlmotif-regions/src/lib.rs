//! Genome segmentation, crosslink thresholding and sequence extraction.
//!
//! This crate turns the raw inputs of a run into the per-region site sets and
//! sequences the kmer analysis consumes:
//!
//! - [`region_index`]: parse a segmentation annotation and split it into the
//!   `intron`, `intergenic` and `cds_utr_ncrna` partitions
//! - [`workspace`]: the [`RunContext`] holding partitions, chromosome sizes
//!   and the scratch directory of a run
//! - [`threshold`]: per sub-region percentile thresholding of crosslink sites
//!   and reporting-region selection
//! - [`sequence`]: strand-aware window extraction from a FASTA backed store
//!
//! ```rust
//! use xlmotif_core::models::{ChromSizes, GenomicInterval, IntervalSet, RegionKind, Strand};
//! use xlmotif_regions::region_index::{Region, RegionIndex};
//! use xlmotif_regions::threshold::{ReportingRegion, ThresholdEngine};
//! use xlmotif_regions::workspace::RunContext;
//!
//! let intergenic = Region {
//!     chrom: "chr1".to_string(),
//!     source: ".".to_string(),
//!     kind: RegionKind::Intergenic,
//!     start: 0,
//!     end: 1000,
//!     strand: Strand::Plus,
//!     attributes: String::new(),
//!     trimmed: false,
//! };
//! let ctx = RunContext::new(
//!     RegionIndex::from_regions(vec![intergenic]),
//!     ChromSizes::from(vec![("chr1".to_string(), 1000)]),
//! )
//! .unwrap();
//!
//! let sites = IntervalSet::from(vec![
//!     GenomicInterval::new("chr1", 10, 11, Strand::Plus).with_score(1.0),
//!     GenomicInterval::new("chr1", 20, 21, Strand::Plus).with_score(9.0),
//! ]);
//! let result = ThresholdEngine::new(&ctx, 0.7).run(&sites);
//! assert_eq!(result.select(ReportingRegion::Intergenic).thresholded.len(), 1);
//! ```
pub mod errors;
pub mod region_index;
pub mod sequence;
pub mod threshold;
pub mod workspace;

// re-exports
pub use self::errors::{RegionError, Result};
pub use self::region_index::{PartitionName, RegionIndex};
pub use self::sequence::{GenomeAssembly, IndexedGenome, SequenceExtractor, SequenceStore};
pub use self::threshold::{ReportingRegion, ThresholdEngine, ThresholdedSites};
pub use self::workspace::RunContext;
