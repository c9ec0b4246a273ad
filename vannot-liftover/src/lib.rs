//! Coordinate liftover between genome builds using UCSC chain files.
//!
//! A chain file describes how contiguous, gap-free blocks of one assembly (the
//! *reference* side, here always the source build) line up with blocks of
//! another (the *query* side, the target build). This crate:
//!
//! - parses chain files into forward-coordinate [`AlignedBlock`]s ([`ChainMap`])
//! - indexes those blocks per contig for point lookups ([`ChainIndex`])
//! - translates a [`Locus`](vannot_core::Locus) into the target build, or reports
//!   that no mapping exists ([`Liftover`], [`LiftoverResult`])
//!
//! ## Quick Start
//!
//! ```rust
//! use vannot_core::models::{GenomeBuild, Locus};
//! use vannot_liftover::{ChainMap, Liftover, LiftoverResult};
//!
//! // chr1:0-100 of GRCh37 maps onto chr1:1000-1100 of GRCh38
//! let data = "chain 100 chr1 5000 + 0 100 chr1 6000 + 1000 1100 1\n100\n";
//! let chain = ChainMap::parse(data.as_bytes(), GenomeBuild::GRCh37, GenomeBuild::GRCh38).unwrap();
//! let liftover = Liftover::new(chain);
//!
//! let locus = Locus::new("1", 10, GenomeBuild::GRCh37).unwrap();
//! match liftover.lift(&locus).unwrap() {
//!     LiftoverResult::Mapped(lifted) => assert_eq!(lifted.to_string(), "1:1010"),
//!     LiftoverResult::Unmapped => unreachable!(),
//! }
//! ```

pub mod chain;
pub mod errors;
pub mod index;
pub mod lift;

// re-exports
pub use self::chain::{AlignedBlock, ChainMap, Strand};
pub use self::errors::{ChainError, Result};
pub use self::index::ChainIndex;
pub use self::lift::{Liftover, LiftoverResult};
