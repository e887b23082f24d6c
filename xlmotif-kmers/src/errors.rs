use thiserror::Error;

use xlmotif_core::XlMotifError;
use xlmotif_regions::RegionError;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum KmerError {
    #[error(transparent)]
    Input(#[from] XlMotifError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Kmer length must be at least 1")]
    InvalidKmerLength,

    #[error("Can't write report: {0}")]
    Report(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KmerError>;
