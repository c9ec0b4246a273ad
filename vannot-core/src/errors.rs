use std::path::PathBuf;

use thiserror::Error;

/// Fatal, run-level failures.
///
/// Record-level anomalies (a locus that does not lift over, a variant with no
/// external score) are never represented here; they surface as absent fields on
/// the annotated record.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Schema violation: {count} record(s) are not biallelic (first at line {first_line})")]
    NotBiallelic { count: usize, first_line: usize },

    #[error("Populations missing from dataset metadata: {}", .0.join(", "))]
    UnknownPopulation(Vec<String>),

    #[error("Output already exists (pass --overwrite to replace it): {}", .0.display())]
    OutputAlreadyExists(PathBuf),

    #[error("0 variants passed {stage} stage ({total} variants entered it)")]
    NoVariantsPassed { stage: String, total: usize },

    #[error("Invalid genome build: {0}")]
    InvalidBuild(String),

    #[error("Invalid locus: {0}")]
    InvalidLocus(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnnotationError>;
