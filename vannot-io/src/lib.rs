//! # Readers and writers around the annotation engine
//!
//! The engine in `vannot-annotate` never touches a file. This crate provides
//! the adapters it is fed from and writes to:
//!
//! - [`VariantSource`]: JSON-lines variant catalog plus its [`DatasetMetadata`]
//! - [`read_score_table`]: tab-delimited external scores (CADD layout)
//! - [`ParquetSink`]: partitioned Parquet output directory
//! - [`SiteListSink`]: gzipped, tab-delimited site list
//! - [`OutputGuard`]: refuses to clobber an existing output
//!
//! [`run_annotation`] wires all of them together for a complete run.
pub mod columnar;
pub mod errors;
pub mod guard;
pub mod metadata;
pub mod run;
pub mod scores;
pub mod sitelist;
pub mod source;

// re-exports
pub use columnar::ParquetSink;
pub use errors::{DataError, Result};
pub use guard::OutputGuard;
pub use metadata::DatasetMetadata;
pub use run::run_annotation;
pub use scores::read_score_table;
pub use sitelist::SiteListSink;
pub use source::VariantSource;
