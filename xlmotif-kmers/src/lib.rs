//! Positional kmer enrichment around thresholded crosslink sites.
//!
//! For every reporting region the analysis counts kmers by position around
//! thresholded and reference sites, scores their enrichment with a bootstrap
//! z-score, clusters the most enriched kmers by the shape of their
//! distribution and names each cluster by a consensus motif.
//!
//! - [`kmer`]: kmer encoding and the fixed-shape [`KmerProfile`]
//! - [`enrichment`]: distal normalisation, enrichment and bootstrap scoring
//! - [`clustering`]: smoothing, PCA and k-means of the top kmers
//! - [`consensus`]: cluster labels from aligned member kmers
//! - [`report`]: result tables and plot inputs
//! - [`pipeline`]: the whole run over a set of input files
//!
//! ```rust
//! use xlmotif_kmers::kmer::{encode_kmer, pos_count_kmer};
//!
//! let sequences = ["AACCGG", "AACCTT", "AACCGG", "GGCCAA"];
//! let profile = pos_count_kmer(&sequences, 2, 2).unwrap();
//! assert_eq!(profile.n_kmers(), 16);
//! let cc = encode_kmer(b"CC").unwrap();
//! assert_eq!(profile.get(cc, -1), 4.0);
//! ```
pub mod clustering;
pub mod config;
pub mod consensus;
pub mod enrichment;
pub mod errors;
pub mod kmer;
pub mod pipeline;
pub mod report;

// re-exports
pub use self::clustering::{ClusterResult, KmerClusterer};
pub use self::config::KmerConfig;
pub use self::enrichment::{EnrichmentScorer, EnrichmentTable};
pub use self::errors::{KmerError, Result};
pub use self::kmer::KmerProfile;
pub use self::pipeline::{RegionOutcome, RunInputs, RunSummary, run};
pub use self::report::{JsonPlotSink, PlotSink, ReportEmitter};
