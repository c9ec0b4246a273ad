use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde_json::Value;

use vannot_core::{AnnotationError, GenomeBuild, Result};

use crate::models::AnnotatedVariant;
use crate::population::Population;
use crate::scores::ExternalScore;

/// Name of the external score column when none is configured.
pub const DEFAULT_SCORE_COLUMN: &str = "cadd";

///
/// One column of the output table.
///
/// Columns are selected by name through an explicit allow-list; nothing from
/// the upstream record reaches the output unless it has a variant here.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputColumn {
    /// `locus_GRCh38`: struct of contig and position on that build.
    Locus(GenomeBuild),
    /// `chrom_b37`
    Chrom(GenomeBuild),
    /// `pos_b37`
    Pos(GenomeBuild),
    Ref,
    Alt,
    AlleleType,
    /// `vep`: the reduced consequence structure.
    Consequences,
    Rsid,
    /// `af`: struct with one field per population of interest.
    Af,
    Maf,
    MafMax,
    VariantId,
    /// The external score struct, named after the configured score column.
    Score,
}

impl OutputColumn {
    pub fn name(&self, score_column: &str) -> String {
        match self {
            OutputColumn::Locus(build) => format!("locus_{}", build.as_str()),
            OutputColumn::Chrom(build) => format!("chrom_{}", build.short_code()),
            OutputColumn::Pos(build) => format!("pos_{}", build.short_code()),
            OutputColumn::Ref => "ref".to_string(),
            OutputColumn::Alt => "alt".to_string(),
            OutputColumn::AlleleType => "allele_type".to_string(),
            OutputColumn::Consequences => "vep".to_string(),
            OutputColumn::Rsid => "rsid".to_string(),
            OutputColumn::Af => "af".to_string(),
            OutputColumn::Maf => "maf".to_string(),
            OutputColumn::MafMax => "maf_max".to_string(),
            OutputColumn::VariantId => "variant_id".to_string(),
            OutputColumn::Score => score_column.to_string(),
        }
    }

    fn kind(&self, populations: &[Population]) -> ColumnKind {
        match self {
            OutputColumn::Locus(_) => ColumnKind::Locus,
            OutputColumn::Pos(_) => ColumnKind::Position,
            OutputColumn::Af | OutputColumn::Maf => {
                ColumnKind::Populations(populations.iter().map(|p| p.label()).collect())
            }
            OutputColumn::MafMax => ColumnKind::Number,
            OutputColumn::Consequences => ColumnKind::Json,
            OutputColumn::Score => ColumnKind::Score,
            _ => ColumnKind::Text,
        }
    }
}

impl FromStr for OutputColumn {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self> {
        let column = match s {
            "ref" => OutputColumn::Ref,
            "alt" => OutputColumn::Alt,
            "allele_type" => OutputColumn::AlleleType,
            "vep" => OutputColumn::Consequences,
            "rsid" => OutputColumn::Rsid,
            "af" => OutputColumn::Af,
            "maf" => OutputColumn::Maf,
            "maf_max" => OutputColumn::MafMax,
            "variant_id" => OutputColumn::VariantId,
            DEFAULT_SCORE_COLUMN => OutputColumn::Score,
            other => {
                let (prefix, build) = other.split_once('_').ok_or_else(|| unknown_column(other))?;
                let build: GenomeBuild = build.parse().map_err(|_| unknown_column(other))?;
                let column = match prefix {
                    "locus" => OutputColumn::Locus(build),
                    "chrom" => OutputColumn::Chrom(build),
                    "pos" => OutputColumn::Pos(build),
                    _ => return Err(unknown_column(other)),
                };
                // only the spelling the column is written under
                if column.name(DEFAULT_SCORE_COLUMN) != other {
                    return Err(unknown_column(other));
                }
                column
            }
        };
        Ok(column)
    }
}

fn unknown_column(name: &str) -> AnnotationError {
    AnnotationError::InvalidConfig(format!("unknown output column '{name}'"))
}

///
/// Physical type of an output column, as the writers need to know it.
///
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    Text,
    Position,
    Number,
    /// Struct `{contig, position}`.
    Locus,
    /// Struct of nullable floats, one field per population label.
    Populations(Vec<String>),
    /// Struct `{raw, phred}`.
    Score,
    /// Nested structure, serialized as JSON text.
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// One value of the output table; every variant can hold a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(Option<String>),
    Position(Option<u32>),
    Number(Option<f64>),
    Locus(Option<(String, u32)>),
    Populations(Vec<Option<f64>>),
    Score(Option<ExternalScore>),
    Json(Option<Value>),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Text(v) => v.is_none(),
            Cell::Position(v) => v.is_none(),
            Cell::Number(v) => v.is_none(),
            Cell::Locus(v) => v.is_none(),
            Cell::Populations(v) => v.iter().all(Option::is_none),
            Cell::Score(v) => v.is_none(),
            Cell::Json(v) => v.is_none(),
        }
    }
}

impl Display for Cell {
    /// Flat text rendering; missing values render as `NA`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn number(v: &Option<f64>) -> String {
            v.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string())
        }

        match self {
            Cell::Text(Some(v)) => write!(f, "{v}"),
            Cell::Position(Some(v)) => write!(f, "{v}"),
            Cell::Number(Some(v)) => write!(f, "{v}"),
            Cell::Locus(Some((contig, pos))) => write!(f, "{contig}:{pos}"),
            Cell::Populations(values) if !self.is_missing() => {
                let values: Vec<String> = values.iter().map(number).collect();
                write!(f, "{}", values.join(","))
            }
            Cell::Score(Some(score)) => write!(f, "{},{}", score.raw, score.phred),
            Cell::Json(Some(v)) => write!(f, "{v}"),
            _ => write!(f, "NA"),
        }
    }
}

///
/// The final, fixed-schema table: column specs plus row-major cells.
///
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Cell>>,
}

impl OutputTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    ///
    /// Project onto a subset of columns, in the given order. Every row is kept.
    ///
    pub fn select(&self, names: &[String]) -> Result<OutputTable> {
        let positions = names
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| &c.name == name)
                    .ok_or_else(|| {
                        AnnotationError::InvalidConfig(format!(
                            "site list column '{name}' is not an output column"
                        ))
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        let columns = positions.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(OutputTable { columns, rows })
    }

    /// Split rows into at most `partitions` contiguous, similarly sized chunks.
    /// The chunks borrow the table's rows.
    pub fn partition(&self, partitions: usize) -> Vec<&[Vec<Cell>]> {
        if self.rows.is_empty() || partitions == 0 {
            return vec![];
        }
        let chunk_size = self.rows.len().div_ceil(partitions);
        self.rows.chunks(chunk_size).collect()
    }
}

/// Default output columns for a run from `source` to `target`.
pub fn default_columns(source: GenomeBuild, target: GenomeBuild) -> Vec<String> {
    let mut columns = vec![OutputColumn::Locus(target)];
    for build in [GenomeBuild::GRCh37, GenomeBuild::GRCh38] {
        if build == source || build == target {
            columns.push(OutputColumn::Chrom(build));
            columns.push(OutputColumn::Pos(build));
        }
    }
    columns.extend([
        OutputColumn::Ref,
        OutputColumn::Alt,
        OutputColumn::AlleleType,
        OutputColumn::Consequences,
        OutputColumn::Rsid,
        OutputColumn::Af,
        OutputColumn::Score,
    ]);
    columns
        .iter()
        .map(|c| c.name(DEFAULT_SCORE_COLUMN))
        .collect()
}

/// Default site list columns: flat coordinates in both builds plus alleles and rsid.
pub fn default_site_list_columns() -> Vec<String> {
    ["chrom_b37", "pos_b37", "chrom_b38", "pos_b38", "ref", "alt", "rsid"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Ordering of annotated variants by their source-build key, with natural contig order.
pub fn compare_variants(a: &AnnotatedVariant, b: &AnnotatedVariant) -> Ordering {
    let (la, lb) = (a.variant.locus(), b.variant.locus());
    contig_rank(la.normalized_contig())
        .cmp(&contig_rank(lb.normalized_contig()))
        .then_with(|| la.position().cmp(&lb.position()))
        .then_with(|| a.variant.alleles().cmp(b.variant.alleles()))
}

fn contig_rank(contig: &str) -> (u32, &str) {
    match contig {
        "X" => (23, ""),
        "Y" => (24, ""),
        "M" | "MT" => (25, ""),
        other => match other.parse::<u32>() {
            Ok(n) => (n, ""),
            Err(_) => (u32::MAX, other),
        },
    }
}

///
/// Projects annotated variants onto the configured column allow-list.
///
#[derive(Debug, Clone)]
pub struct Reshaper {
    columns: Vec<OutputColumn>,
    score_column: String,
    populations: Vec<Population>,
}

impl Reshaper {
    ///
    /// # Arguments
    /// - columns: output column names, in output order
    /// - score_column: name given to the external score column
    /// - populations: populations of interest, in struct field order
    pub fn new(columns: &[String], score_column: &str, populations: &[Population]) -> Result<Self> {
        if columns.is_empty() {
            return Err(AnnotationError::InvalidConfig(
                "at least one output column is required".to_string(),
            ));
        }

        let mut parsed = Vec::with_capacity(columns.len());
        for name in columns {
            let column = if name == score_column {
                OutputColumn::Score
            } else {
                match name.parse::<OutputColumn>()? {
                    // the default score name is only valid when it is the configured one
                    OutputColumn::Score => return Err(unknown_column(name)),
                    column => column,
                }
            };
            if parsed.contains(&column) {
                return Err(AnnotationError::InvalidConfig(format!(
                    "output column '{name}' is listed twice"
                )));
            }
            parsed.push(column);
        }

        let mut populations = populations.to_vec();
        populations.sort_unstable();

        Ok(Reshaper {
            columns: parsed,
            score_column: score_column.to_string(),
            populations,
        })
    }

    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        self.columns
            .iter()
            .map(|c| ColumnSpec {
                name: c.name(&self.score_column),
                kind: c.kind(&self.populations),
            })
            .collect()
    }

    fn cell(&self, column: &OutputColumn, record: &AnnotatedVariant) -> Cell {
        let variant = &record.variant;
        match column {
            OutputColumn::Locus(build) => Cell::Locus(
                record
                    .locus_on(*build)
                    .map(|l| (l.normalized_contig().to_string(), l.position())),
            ),
            OutputColumn::Chrom(build) => Cell::Text(
                record
                    .locus_on(*build)
                    .map(|l| l.normalized_contig().to_string()),
            ),
            OutputColumn::Pos(build) => Cell::Position(record.locus_on(*build).map(|l| l.position())),
            OutputColumn::Ref => Cell::Text(Some(variant.reference().to_string())),
            OutputColumn::Alt => Cell::Text(Some(variant.alternate().to_string())),
            OutputColumn::AlleleType => Cell::Text(record.allele_type.clone()),
            OutputColumn::Consequences => Cell::Json(record.consequences.clone()),
            OutputColumn::Rsid => Cell::Text(record.rsid.clone()),
            OutputColumn::Af => Cell::Populations(
                self.populations
                    .iter()
                    .map(|p| record.frequencies.af.get(p).copied().flatten())
                    .collect(),
            ),
            OutputColumn::Maf => Cell::Populations(
                self.populations
                    .iter()
                    .map(|p| record.frequencies.maf.get(p).copied().flatten())
                    .collect(),
            ),
            OutputColumn::MafMax => Cell::Number(record.frequencies.max_maf()),
            OutputColumn::VariantId => Cell::Text(Some(variant.variant_id())),
            OutputColumn::Score => Cell::Score(record.external_score),
        }
    }

    /// Build the output table, one row per annotated variant, in input order.
    pub fn project(&self, records: &[AnnotatedVariant]) -> OutputTable {
        let rows = records
            .iter()
            .map(|record| self.columns.iter().map(|c| self.cell(c, record)).collect())
            .collect();

        OutputTable {
            columns: self.column_specs(),
            rows,
        }
    }

    ///
    /// The site list view of an output table: same rows, subset of columns.
    ///
    pub fn site_list(&self, table: &OutputTable, columns: &[String]) -> Result<OutputTable> {
        table.select(columns)
    }

    /// Check a site list column list against this reshaper's columns without data.
    pub fn validate_site_list(&self, columns: &[String]) -> Result<()> {
        let empty = OutputTable {
            columns: self.column_specs(),
            rows: vec![],
        };
        empty.select(columns).map(|_| ())
    }
}
