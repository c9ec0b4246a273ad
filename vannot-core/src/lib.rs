//! Core data model for the vannot variant annotation engine.
//!
//! This crate holds the pieces every other vannot crate agrees on:
//!
//! - [`GenomeBuild`] and [`Locus`]: a position on a specific reference assembly
//! - [`Variant`]: a biallelic variant, the unit every pipeline stage operates on
//! - [`VariantKey`]: the join key used to match variants against side tables
//! - [`RawRecord`] / [`SourceRecord`]: one row of the upstream variant catalog,
//!   before and after shape validation
//! - [`AnnotationError`]: the fatal error taxonomy of a run
//!
//! ## Quick Start
//!
//! ```rust
//! use vannot_core::models::{GenomeBuild, Locus, Variant};
//!
//! let locus = Locus::new("chr1", 12345, GenomeBuild::GRCh38).unwrap();
//! let variant = Variant::try_new(locus, vec!["A".to_string(), "G".to_string()]).unwrap();
//!
//! assert_eq!(variant.reference(), "A");
//! assert_eq!(variant.locus().normalized_contig(), "1");
//! ```
pub mod errors;
pub mod models;
pub mod utils;

// re-exports
pub use errors::{AnnotationError, Result};
pub use models::{FrequencyEntry, GenomeBuild, Locus, RawRecord, SourceRecord, Variant, VariantKey};
