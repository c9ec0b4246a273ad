use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use vannot_core::utils::{get_dynamic_reader, numbered_lines};
use vannot_core::{AnnotationError, GenomeBuild, RawRecord, SourceRecord};

use crate::errors::Result;
use crate::metadata::DatasetMetadata;

type NumberedLines = Box<dyn Iterator<Item = (usize, std::io::Result<String>)>>;

///
/// Lazily parsed rows of a variant source, with their line numbers.
///
pub struct RawRecords {
    lines: NumberedLines,
    remaining: Option<usize>,
}

impl Iterator for RawRecords {
    type Item = Result<(usize, RawRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        let (line_no, line) = self.lines.next()?;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        let parsed = line.map_err(Into::into).and_then(|line| {
            serde_json::from_str::<RawRecord>(&line).map_err(|e| {
                AnnotationError::SchemaViolation(format!("line {line_no}: {e}")).into()
            })
        });
        Some(parsed.map(|raw| (line_no, raw)))
    }
}

///
/// A JSON-lines variant catalog together with its dataset metadata.
///
/// Records are read lazily, so the source can be streamed more than once
/// (a cheap schema pass, then the annotation pass) without holding it in memory.
///
#[derive(Debug, Clone)]
pub struct VariantSource {
    path: PathBuf,
    metadata: DatasetMetadata,
    build: GenomeBuild,
    limit: Option<usize>,
}

impl VariantSource {
    ///
    /// Open a variant source.
    ///
    /// # Arguments
    /// - path: JSON-lines file, optionally gzipped
    /// - globals: dataset metadata JSON
    /// - build: assembly the source coordinates are on
    pub fn open(path: &Path, globals: &Path, build: GenomeBuild) -> Result<Self> {
        // fail on a missing source now rather than after the metadata checks
        get_dynamic_reader(path)?;
        let metadata = DatasetMetadata::from_path(globals)?;

        Ok(VariantSource {
            path: path.to_path_buf(),
            metadata,
            build,
            limit: None,
        })
    }

    /// Only ever read the first `limit` rows.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn build(&self) -> GenomeBuild {
        self.build
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn raw_records(&self) -> Result<RawRecords> {
        let reader = get_dynamic_reader(&self.path)?;
        Ok(RawRecords {
            lines: Box::new(numbered_lines(reader)),
            remaining: self.limit,
        })
    }

    /// Shape-validated records; the first invalid row ends iteration with an error.
    pub fn records(&self) -> Result<impl Iterator<Item = Result<SourceRecord>> + use<>> {
        let build = self.build;
        Ok(self.raw_records()?.map(move |parsed| -> Result<SourceRecord> {
            let (line, raw) = parsed?;
            Ok(SourceRecord::from_raw(raw, build, line)?)
        }))
    }

    ///
    /// Stream the source once and check every row's shape.
    ///
    /// Rows that are not biallelic are counted over the whole source so the
    /// error reports how many there are; any other shape problem fails at once.
    ///
    /// # Returns
    /// - the number of rows read
    pub fn check_schema(&self) -> Result<usize> {
        let mut total = 0;
        let mut not_biallelic = 0;
        let mut first_line = None;

        for parsed in self.raw_records()? {
            let (line, raw) = parsed?;
            total += 1;
            if raw.alleles.len() != 2 {
                not_biallelic += 1;
                first_line.get_or_insert(line);
                continue;
            }
            SourceRecord::from_raw(raw, self.build, line)?;
        }

        if let Some(first_line) = first_line {
            return Err(AnnotationError::NotBiallelic {
                count: not_biallelic,
                first_line,
            }
            .into());
        }

        info!("Schema check passed for {total} records in {:?}", self.path);
        Ok(total)
    }

    /// The first `n` rows exactly as stored, for inspection.
    pub fn head(&self, n: usize) -> Result<Vec<Value>> {
        let reader = get_dynamic_reader(&self.path)?;
        numbered_lines(reader)
            .take(n)
            .map(|(line_no, line)| -> Result<Value> {
                let line = line?;
                serde_json::from_str(&line).map_err(|e| {
                    AnnotationError::SchemaViolation(format!("line {line_no}: {e}")).into()
                })
            })
            .collect()
    }
}
