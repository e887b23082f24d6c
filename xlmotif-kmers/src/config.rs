use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use xlmotif_regions::ReportingRegion;

pub const DEFAULT_WINDOW: u32 = 40;
pub const DEFAULT_WINDOW_DISTAL: u32 = 150;
pub const DEFAULT_KMER_LENGTH: usize = 4;
pub const DEFAULT_TOP_N: usize = 20;
pub const DEFAULT_PERCENTILE: f64 = 0.7;
pub const DEFAULT_MIN_RELATIVE_OCCURRENCE: f64 = 2.0;
pub const DEFAULT_CLUSTERS: usize = 5;
pub const DEFAULT_SMOOTHING: usize = 6;
pub const DEFAULT_BOOTSTRAP_DRAWS: usize = 100;

/// Kmer lengths the analysis accepts.
pub const KMER_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 3..=7;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

fn default_window() -> u32 {
    DEFAULT_WINDOW
}
fn default_window_distal() -> u32 {
    DEFAULT_WINDOW_DISTAL
}
fn default_kmer_length() -> usize {
    DEFAULT_KMER_LENGTH
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_percentile() -> f64 {
    DEFAULT_PERCENTILE
}
fn default_min_relative_occurrence() -> f64 {
    DEFAULT_MIN_RELATIVE_OCCURRENCE
}
fn default_clusters() -> usize {
    DEFAULT_CLUSTERS
}
fn default_smoothing() -> usize {
    DEFAULT_SMOOTHING
}
fn default_bootstrap_draws() -> usize {
    DEFAULT_BOOTSTRAP_DRAWS
}
fn default_regions() -> Vec<String> {
    ReportingRegion::ALL
        .iter()
        .map(|region| region.as_str().to_string())
        .collect()
}

///
/// Parameters of a kmer enrichment run. Every field has a default, so a TOML
/// file only needs the values it changes.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct KmerConfig {
    /// Half-width of the window kmers are scored in.
    #[serde(default = "default_window")]
    pub window: u32,
    /// Half-width of the window used for the distal background.
    #[serde(default = "default_window_distal")]
    pub window_distal: u32,
    #[serde(default = "default_kmer_length")]
    pub kmer_length: usize,
    /// Kmers (by z-score) passed on to clustering.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Per sub-region score percentile used for thresholding.
    #[serde(default = "default_percentile")]
    pub percentile: f64,
    #[serde(default = "default_min_relative_occurrence")]
    pub min_relative_occurrence: f64,
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: usize,
    /// Also write the thresholded and reference site BED files.
    #[serde(default)]
    pub all_outputs: bool,
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
    #[serde(default = "default_bootstrap_draws")]
    pub bootstrap_draws: usize,
    /// Bootstrap seed; entropy seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Merge overlapping reference windows before extraction.
    #[serde(default)]
    pub merge_reference_overlaps: bool,
}

impl Default for KmerConfig {
    fn default() -> Self {
        KmerConfig {
            window: DEFAULT_WINDOW,
            window_distal: DEFAULT_WINDOW_DISTAL,
            kmer_length: DEFAULT_KMER_LENGTH,
            top_n: DEFAULT_TOP_N,
            percentile: DEFAULT_PERCENTILE,
            min_relative_occurrence: DEFAULT_MIN_RELATIVE_OCCURRENCE,
            clusters: DEFAULT_CLUSTERS,
            smoothing: DEFAULT_SMOOTHING,
            all_outputs: false,
            regions: default_regions(),
            bootstrap_draws: DEFAULT_BOOTSTRAP_DRAWS,
            seed: None,
            merge_reference_overlaps: false,
        }
    }
}

impl TryFrom<&Path> for KmerConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}

impl KmerConfig {
    /// The configured reporting regions, in configuration order.
    pub fn reporting_regions(&self) -> ConfigResult<Vec<ReportingRegion>> {
        self.regions
            .iter()
            .map(|name| {
                name.parse::<ReportingRegion>()
                    .map_err(|e| ConfigError::Invalid(e.to_string()))
            })
            .collect()
    }

    ///
    /// Check every parameter range before a run starts.
    ///
    pub fn validate(&self) -> ConfigResult<()> {
        if !KMER_LENGTH_RANGE.contains(&self.kmer_length) {
            return Err(ConfigError::Invalid(format!(
                "kmer_length must be between {} and {}, got {}",
                KMER_LENGTH_RANGE.start(),
                KMER_LENGTH_RANGE.end(),
                self.kmer_length
            )));
        }
        if !(0.0..=1.0).contains(&self.percentile) {
            return Err(ConfigError::Invalid(format!(
                "percentile must be within [0, 1], got {}",
                self.percentile
            )));
        }
        if self.clusters == 0 {
            return Err(ConfigError::Invalid("clusters must be at least 1".to_string()));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".to_string()));
        }
        if self.smoothing == 0 {
            return Err(ConfigError::Invalid("smoothing must be at least 1".to_string()));
        }
        if self.window == 0 || self.window > self.window_distal {
            return Err(ConfigError::Invalid(format!(
                "window must be positive and not larger than window_distal ({} > {})",
                self.window, self.window_distal
            )));
        }
        if self.bootstrap_draws == 0 {
            return Err(ConfigError::Invalid(
                "bootstrap_draws must be at least 1".to_string(),
            ));
        }
        if self.regions.is_empty() {
            return Err(ConfigError::Invalid("no region selected".to_string()));
        }
        self.reporting_regions()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use std::path::PathBuf;

    #[rstest]
    fn test_defaults_are_valid() {
        let config = KmerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reporting_regions().unwrap(), ReportingRegion::ALL.to_vec());
    }

    #[rstest]
    fn test_try_from_toml() {
        let path = PathBuf::from("../tests/data/config/kmers.toml");
        let config = KmerConfig::try_from(path.as_path()).unwrap();

        assert_eq!(config.kmer_length, 5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.regions, vec!["genome", "intron"]);
        // untouched fields keep their defaults
        assert_eq!(config.window, DEFAULT_WINDOW);
        assert_eq!(config.percentile, DEFAULT_PERCENTILE);
    }

    #[rstest]
    fn test_missing_file() {
        let path = PathBuf::from("../tests/data/config/missing.toml");
        assert!(matches!(
            KmerConfig::try_from(path.as_path()),
            Err(ConfigError::Io(_))
        ));
    }

    #[rstest]
    fn test_bad_toml() {
        let err = toml::from_str::<KmerConfig>("kmer_length = \"four\"").err();
        assert!(err.is_some());
    }

    #[rstest]
    #[case(KmerConfig { kmer_length: 2, ..Default::default() })]
    #[case(KmerConfig { kmer_length: 8, ..Default::default() })]
    #[case(KmerConfig { percentile: 1.5, ..Default::default() })]
    #[case(KmerConfig { clusters: 0, ..Default::default() })]
    #[case(KmerConfig { window: 200, ..Default::default() })]
    #[case(KmerConfig { regions: vec!["exon".to_string()], ..Default::default() })]
    fn test_invalid_config(#[case] config: KmerConfig) {
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
