use thiserror::Error;

use xlmotif_core::XlMotifError;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error(transparent)]
    Input(#[from] XlMotifError),

    #[error("Malformed annotation in {path} at line {line}: {reason}")]
    MalformedAnnotation {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Can't read genome: {0}")]
    GenomeReadError(String),

    #[error("Invalid range: start={start}, end={end} for chromosome {chrom}")]
    InvalidRange { chrom: String, start: u32, end: u32 },

    #[error("Unknown chromosome found in site set: {0}")]
    UnknownChrom(String),

    #[error("Unknown reporting region: {0}")]
    UnknownRegion(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RegionError>;
