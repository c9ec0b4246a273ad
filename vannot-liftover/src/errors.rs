use thiserror::Error;

use vannot_core::GenomeBuild;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Invalid chain file at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("Chain file contains no alignment blocks")]
    Empty,

    #[error("Locus is on {found} but the chain maps from {expected}")]
    BuildMismatch {
        expected: GenomeBuild,
        found: GenomeBuild,
    },

    #[error("Source and target build are both {0}")]
    SameBuild(GenomeBuild),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Read(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;
