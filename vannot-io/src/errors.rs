use std::path::PathBuf;

use thiserror::Error;

use vannot_core::AnnotationError;
use vannot_liftover::ChainError;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Invalid dataset metadata in {path}: {msg}")]
    Metadata { path: PathBuf, msg: String },

    #[error("Invalid score table row at line {line}: {msg}")]
    ScoreTable { line: usize, msg: String },

    #[error("Column '{column}' holds a value that does not match its type")]
    CellType { column: String },

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Read(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
