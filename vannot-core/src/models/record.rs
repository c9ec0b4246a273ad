use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AnnotationError, Result};
use crate::models::locus::{GenomeBuild, Locus};
use crate::models::variant::Variant;

/// One entry of a record's per-population frequency array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    #[serde(rename = "AF", default)]
    pub af: Option<f64>,
    #[serde(rename = "AC", default)]
    pub ac: Option<i64>,
    #[serde(rename = "AN", default)]
    pub an: Option<i64>,
    #[serde(default)]
    pub homozygote_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLocus {
    pub contig: String,
    pub position: u32,
}

///
/// One row of the upstream variant catalog exactly as the source delivers it.
///
/// Fields not listed here are ignored on read, so new upstream columns never
/// reach the output.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub locus: RawLocus,
    pub alleles: Vec<String>,
    #[serde(default)]
    pub freq: Vec<FrequencyEntry>,
    #[serde(default)]
    pub filters: Option<Vec<String>>,
    #[serde(default)]
    pub rsid: Option<String>,
    #[serde(default)]
    pub allele_type: Option<String>,
    #[serde(default)]
    pub vep: Option<Value>,
}

///
/// A shape-validated source row: locus and alleles have been lifted into a
/// [`Variant`], everything else is carried forward untouched.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub variant: Variant,
    pub freq: Vec<FrequencyEntry>,
    pub filters: Option<Vec<String>>,
    pub rsid: Option<String>,
    pub allele_type: Option<String>,
    pub vep: Option<Value>,
}

impl SourceRecord {
    ///
    /// Validate a raw row against the expected shape.
    ///
    /// # Arguments
    /// - raw: the row as read from the source
    /// - build: assembly the source coordinates are on
    /// - line: 1-based line number, used in error messages
    pub fn from_raw(raw: RawRecord, build: GenomeBuild, line: usize) -> Result<Self> {
        let locus = Locus::new(raw.locus.contig, raw.locus.position, build).map_err(|e| {
            AnnotationError::SchemaViolation(format!("line {line}: {e}"))
        })?;
        let variant = Variant::try_new(locus, raw.alleles)
            .map_err(|e| AnnotationError::SchemaViolation(format!("line {line}: {e}")))?;

        Ok(SourceRecord {
            variant,
            freq: raw.freq,
            filters: raw.filters,
            rsid: raw.rsid,
            allele_type: raw.allele_type,
            vep: raw.vep,
        })
    }
}
