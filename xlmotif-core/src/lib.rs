//! Core models and IO helpers shared by every xlmotif crate.
//!
//! This crate holds the genomic interval representation used throughout the
//! pipeline, the strand and region-kind vocabularies, chromosome size tables
//! and readers that transparently handle gzipped inputs.
//!
//! ```rust
//! use xlmotif_core::models::{GenomicInterval, Strand};
//!
//! let site = GenomicInterval::new("chr1", 100, 101, Strand::Minus);
//! assert_eq!(site.width(), 1);
//! assert_eq!(site.to_bed_line(), "chr1\t100\t101\t.\t0\t-");
//! ```
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{Result, XlMotifError};
