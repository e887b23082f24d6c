use thiserror::Error;

#[derive(Error, Debug)]
pub enum XlMotifError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Malformed record in {path} at line {line}: {reason}")]
    MalformedRecord {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid strand '{0}', expected '+' or '-'")]
    InvalidStrand(String),

    #[error("Corrupted file. 0 records found in the file: {0}")]
    EmptyFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, XlMotifError>;
