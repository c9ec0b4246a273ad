use rayon::prelude::*;

use vannot_core::models::{GenomeBuild, Locus, normalize_contig};

use crate::chain::{AlignedBlock, ChainMap};
use crate::errors::{ChainError, Result};
use crate::index::ChainIndex;

/// Outcome of lifting a single locus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiftoverResult {
    /// The locus in the target build, contig without `chr` prefix.
    Mapped(Locus),
    /// No block covers the locus (gap, unaligned contig or rearranged region).
    Unmapped,
}

impl LiftoverResult {
    pub fn is_mapped(&self) -> bool {
        matches!(self, LiftoverResult::Mapped(_))
    }

    pub fn locus(&self) -> Option<&Locus> {
        match self {
            LiftoverResult::Mapped(locus) => Some(locus),
            LiftoverResult::Unmapped => None,
        }
    }

    pub fn into_locus(self) -> Option<Locus> {
        match self {
            LiftoverResult::Mapped(locus) => Some(locus),
            LiftoverResult::Unmapped => None,
        }
    }
}

///
/// Translates loci from the chain's source build into its target build.
///
/// The chain data is read-only once built, so a single `Liftover` can be
/// shared across worker threads.
///
#[derive(Debug, Clone)]
pub struct Liftover {
    chain: ChainMap,
    index: ChainIndex,
}

impl Liftover {
    pub fn new(chain: ChainMap) -> Self {
        let index = ChainIndex::build(chain.blocks());
        Liftover { chain, index }
    }

    pub fn source_build(&self) -> GenomeBuild {
        self.chain.source_build()
    }

    pub fn target_build(&self) -> GenomeBuild {
        self.chain.target_build()
    }

    /// A translator for the opposite direction over the same alignment.
    pub fn inverse(&self) -> Liftover {
        Liftover::new(self.chain.invert())
    }

    /// Pick one block when several chains cover the same position.
    fn primary_block(&self, ids: Vec<usize>) -> Option<&AlignedBlock> {
        let blocks = self.chain.blocks();
        ids.into_iter().map(|id| &blocks[id]).max_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then_with(|| b.chain_id.cmp(&a.chain_id))
                .then_with(|| b.source_start.cmp(&a.source_start))
        })
    }

    ///
    /// Lift a locus into the target build.
    ///
    /// # Arguments
    /// - locus: a locus on the chain's source build
    ///
    /// # Returns
    /// - `Mapped` with the target locus, or `Unmapped` when the chain has no
    ///   block covering the position. Only a locus on the wrong build is an error.
    pub fn lift(&self, locus: &Locus) -> Result<LiftoverResult> {
        if locus.build() != self.source_build() {
            return Err(ChainError::BuildMismatch {
                expected: self.source_build(),
                found: locus.build(),
            });
        }

        let pos = locus.zero_based();
        let hits = self.index.find(locus.contig(), pos);

        let mapped = self
            .primary_block(hits)
            .and_then(|block| block.map(pos).map(|target| (block, target)));

        match mapped {
            Some((block, target)) => {
                let lifted = Locus::new(
                    normalize_contig(&block.target_contig),
                    target + 1,
                    self.target_build(),
                )
                .map_err(|e| ChainError::Parse {
                    line: 0,
                    msg: format!("block of chain {} produced {e}", block.chain_id),
                })?;
                Ok(LiftoverResult::Mapped(lifted))
            }
            None => Ok(LiftoverResult::Unmapped),
        }
    }

    ///
    /// Lift a batch of loci in parallel, preserving input order.
    ///
    pub fn lift_all(&self, loci: &[Locus]) -> Result<Vec<LiftoverResult>> {
        loci.par_iter().map(|locus| self.lift(locus)).collect()
    }
}
