//! # Variant annotation engine
//!
//! Turns validated source rows ([`SourceRecord`](vannot_core::SourceRecord)) into
//! [`AnnotatedVariant`]s and then into a fixed output table. The stages are:
//!
//! - [`quality`](filter::QualityFilter): drop variants carrying any QC flag
//! - [`frequency`](frequency::FrequencyExtractor): derive per-population AF/MAF,
//!   then keep variants where at least one population reaches the MAF threshold
//! - `liftover`: translate the locus into the other build (absence on failure)
//! - [`scores`](scores::ScoreJoiner): left-join an external score table
//!
//! Stage order is configurable ([`StagePlan`]); every stage is a pure function
//! over one record, so batches are processed in parallel with rayon.
//! [`Reshaper`](reshape::Reshaper) then projects the annotated records onto an
//! explicit column allow-list.

pub mod config;
pub mod consequence;
pub mod filter;
pub mod frequency;
pub mod models;
pub mod pipeline;
pub mod population;
pub mod reshape;
pub mod scores;

// re-exports
pub use config::{ConfigError, RunConfig};
pub use frequency::{FrequencyExtractor, af_to_maf};
pub use models::AnnotatedVariant;
pub use pipeline::{Pipeline, RunSummary, Stage, StagePlan};
pub use population::{Population, PopulationIndex, discover_population_keys};
pub use reshape::{OutputColumn, OutputTable, Reshaper};
pub use scores::{ExternalScore, ScoreJoiner, ScoreTable};
