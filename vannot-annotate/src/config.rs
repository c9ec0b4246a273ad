use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vannot_core::{AnnotationError, GenomeBuild};

use crate::consequence::ConsequencePolicy;
use crate::filter::{DEFAULT_MAF_THRESHOLD, FrequencyFilter};
use crate::pipeline::{Stage, StagePlan};
use crate::population::Population;
use crate::reshape::{DEFAULT_SCORE_COLUMN, Reshaper, default_columns, default_site_list_columns};

pub const DEFAULT_PARTITIONS: usize = 256;
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug)]
pub enum ConfigFileType {
    Toml,
    Yaml,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing or invalid file extension in run config file. It must be `toml`, `yaml` or `yml`")]
    InvalidFileType,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl ConfigFileType {
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("toml") => Ok(ConfigFileType::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFileType::Yaml),
            _ => Err(ConfigError::InvalidFileType),
        }
    }
}

///
/// Everything one annotation run needs to know.
///
/// Every field has a default so a config file only lists what it changes;
/// the command line can override any field afterwards.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// JSON-lines variant source, optionally gzipped.
    pub source: Option<PathBuf>,
    /// Dataset metadata holding the population -> index mapping.
    pub globals: Option<PathBuf>,
    /// UCSC chain file from `source_build` to `target_build`.
    pub chain: Option<PathBuf>,
    /// Tab-delimited external score table.
    pub scores: Option<PathBuf>,
    /// Output directory for the Parquet partitions.
    pub output: Option<PathBuf>,
    /// Gzipped site list; derived from `output` when absent.
    pub site_list: Option<PathBuf>,
    pub maf_threshold: f64,
    pub populations: Vec<Population>,
    pub source_build: GenomeBuild,
    pub target_build: GenomeBuild,
    /// Build the score table's coordinates are on; defaults to `source_build`.
    pub score_build: Option<GenomeBuild>,
    pub stages: StagePlan,
    /// Output column allow-list; defaults to [`default_columns`].
    pub columns: Option<Vec<String>>,
    pub site_list_columns: Vec<String>,
    pub score_column: String,
    pub consequences: ConsequencePolicy,
    pub partitions: usize,
    pub batch_size: usize,
    /// Keep only the first N source rows (for test runs).
    pub limit: Option<usize>,
    pub overwrite: bool,
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            source: None,
            globals: None,
            chain: None,
            scores: None,
            output: None,
            site_list: None,
            maf_threshold: DEFAULT_MAF_THRESHOLD,
            populations: Population::genome_defaults(),
            source_build: GenomeBuild::GRCh37,
            target_build: GenomeBuild::GRCh38,
            score_build: None,
            stages: StagePlan::default(),
            columns: None,
            site_list_columns: default_site_list_columns(),
            score_column: DEFAULT_SCORE_COLUMN.to_string(),
            consequences: ConsequencePolicy::default(),
            partitions: DEFAULT_PARTITIONS,
            batch_size: DEFAULT_BATCH_SIZE,
            limit: None,
            overwrite: false,
            progress: false,
        }
    }
}

impl TryFrom<&Path> for RunConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let file_type = ConfigFileType::from_path(path)?;
        let raw = read_to_string(path)?;
        let config = match file_type {
            ConfigFileType::Toml => toml::from_str(&raw)?,
            ConfigFileType::Yaml => serde_yaml::from_str(&raw)?,
        };
        Ok(config)
    }
}

fn required<'a>(field: &str, value: &'a Option<PathBuf>) -> vannot_core::Result<&'a Path> {
    value
        .as_deref()
        .ok_or_else(|| AnnotationError::InvalidConfig(format!("`{field}` is required")))
}

impl RunConfig {
    pub fn defaults() -> Self {
        RunConfig::default()
    }

    pub fn output_columns(&self) -> Vec<String> {
        self.columns
            .clone()
            .unwrap_or_else(|| default_columns(self.source_build, self.target_build))
    }

    pub fn score_build(&self) -> GenomeBuild {
        self.score_build.unwrap_or(self.source_build)
    }

    pub fn source_path(&self) -> vannot_core::Result<&Path> {
        required("source", &self.source)
    }

    pub fn globals_path(&self) -> vannot_core::Result<&Path> {
        required("globals", &self.globals)
    }

    pub fn output_path(&self) -> vannot_core::Result<&Path> {
        required("output", &self.output)
    }

    /// Site list location: the configured one, or next to the output directory.
    pub fn site_list_path(&self) -> vannot_core::Result<PathBuf> {
        match &self.site_list {
            Some(path) => Ok(path.clone()),
            None => Ok(self.output_path()?.with_extension("sitelist.tsv.gz")),
        }
    }

    pub fn frequency_filter(&self) -> vannot_core::Result<FrequencyFilter> {
        FrequencyFilter::new(self.maf_threshold)
    }

    pub fn reshaper(&self) -> vannot_core::Result<Reshaper> {
        Reshaper::new(&self.output_columns(), &self.score_column, &self.populations)
    }

    ///
    /// Check the whole configuration before any input is opened.
    ///
    pub fn validate(&self) -> vannot_core::Result<()> {
        self.source_path()?;
        self.globals_path()?;
        self.output_path()?;

        self.frequency_filter()?;

        if self.source_build == self.target_build {
            return Err(AnnotationError::InvalidConfig(format!(
                "source and target build are both {}",
                self.source_build
            )));
        }
        if self.populations.is_empty() {
            return Err(AnnotationError::InvalidConfig(
                "at least one population of interest is required".to_string(),
            ));
        }
        if self.partitions == 0 {
            return Err(AnnotationError::InvalidConfig("`partitions` must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(AnnotationError::InvalidConfig("`batch_size` must be > 0".to_string()));
        }
        if self.stages.contains(Stage::Liftover) {
            required("chain", &self.chain)?;
        }
        if self.stages.contains(Stage::Scores) {
            required("scores", &self.scores)?;
            let lifted_first = matches!(
                (self.stages.position(Stage::Liftover), self.stages.position(Stage::Scores)),
                (Some(lift_idx), Some(score_idx)) if lift_idx < score_idx
            );
            if self.score_build() != self.source_build && !lifted_first {
                return Err(AnnotationError::InvalidConfig(format!(
                    "score table is on {} so the liftover stage must run before scores",
                    self.score_build()
                )));
            }
        }

        let reshaper = self.reshaper()?;
        reshaper.validate_site_list(&self.site_list_columns)?;

        if self.site_list_path()? == self.output_path()? {
            return Err(AnnotationError::InvalidConfig(
                "site list and output must be different paths".to_string(),
            ));
        }

        Ok(())
    }
}
