use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, StructArray, UInt32Array};
use arrow::buffer::NullBuffer;
use arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::info;

use vannot_annotate::reshape::{Cell, ColumnKind, ColumnSpec, OutputTable};

use crate::errors::{DataError, Result};

fn locus_fields() -> Fields {
    Fields::from(vec![
        Field::new("contig", DataType::Utf8, true),
        Field::new("position", DataType::UInt32, true),
    ])
}

fn score_fields() -> Fields {
    Fields::from(vec![
        Field::new("raw", DataType::Float64, true),
        Field::new("phred", DataType::Float64, true),
    ])
}

fn population_fields(labels: &[String]) -> Fields {
    labels
        .iter()
        .map(|label| Field::new(label, DataType::Float64, true))
        .collect()
}

fn data_type(kind: &ColumnKind) -> DataType {
    match kind {
        ColumnKind::Text | ColumnKind::Json => DataType::Utf8,
        ColumnKind::Position => DataType::UInt32,
        ColumnKind::Number => DataType::Float64,
        ColumnKind::Locus => DataType::Struct(locus_fields()),
        ColumnKind::Populations(labels) => DataType::Struct(population_fields(labels)),
        ColumnKind::Score => DataType::Struct(score_fields()),
    }
}

/// Arrow schema of an output table; every column is nullable.
pub fn arrow_schema(columns: &[ColumnSpec]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|c| Field::new(&c.name, data_type(&c.kind), true))
        .collect();
    Arc::new(Schema::new(fields))
}

///
/// Build one Arrow array from a column of cells.
///
fn column_array(spec: &ColumnSpec, cells: &[&Cell]) -> Result<ArrayRef> {
    let mismatch = || DataError::CellType {
        column: spec.name.clone(),
    };

    let array: ArrayRef = match &spec.kind {
        ColumnKind::Text => {
            let values = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Text(v) => Ok(v.clone()),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<Option<String>>>>()?;
            Arc::new(StringArray::from(values))
        }
        ColumnKind::Json => {
            let values = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Json(v) => Ok(v.as_ref().map(|v| v.to_string())),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<Option<String>>>>()?;
            Arc::new(StringArray::from(values))
        }
        ColumnKind::Position => {
            let values = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Position(v) => Ok(*v),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<Option<u32>>>>()?;
            Arc::new(UInt32Array::from(values))
        }
        ColumnKind::Number => {
            let values = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Number(v) => Ok(*v),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<Option<f64>>>>()?;
            Arc::new(Float64Array::from(values))
        }
        ColumnKind::Locus => {
            let loci = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Locus(v) => Ok(v.clone()),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<Option<(String, u32)>>>>()?;

            let validity: Vec<bool> = loci.iter().map(Option::is_some).collect();
            let contigs: Vec<Option<String>> =
                loci.iter().map(|l| l.as_ref().map(|(c, _)| c.clone())).collect();
            let positions: Vec<Option<u32>> = loci.iter().map(|l| l.as_ref().map(|(_, p)| *p)).collect();

            Arc::new(StructArray::try_new(
                locus_fields(),
                vec![
                    Arc::new(StringArray::from(contigs)) as ArrayRef,
                    Arc::new(UInt32Array::from(positions)) as ArrayRef,
                ],
                Some(NullBuffer::from(validity)),
            )?)
        }
        ColumnKind::Score => {
            let scores = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Score(v) => Ok(*v),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>>>()?;

            let validity: Vec<bool> = scores.iter().map(Option::is_some).collect();
            let raw: Vec<Option<f64>> = scores.iter().map(|s| s.map(|s| s.raw)).collect();
            let phred: Vec<Option<f64>> = scores.iter().map(|s| s.map(|s| s.phred)).collect();

            Arc::new(StructArray::try_new(
                score_fields(),
                vec![
                    Arc::new(Float64Array::from(raw)) as ArrayRef,
                    Arc::new(Float64Array::from(phred)) as ArrayRef,
                ],
                Some(NullBuffer::from(validity)),
            )?)
        }
        ColumnKind::Populations(labels) => {
            let rows = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Populations(v) if v.len() == labels.len() => Ok(v),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<&Vec<Option<f64>>>>>()?;

            let children: Vec<ArrayRef> = (0..labels.len())
                .map(|i| {
                    let values: Vec<Option<f64>> = rows.iter().map(|row| row[i]).collect();
                    Arc::new(Float64Array::from(values)) as ArrayRef
                })
                .collect();

            Arc::new(StructArray::try_new(population_fields(labels), children, None)?)
        }
    };

    Ok(array)
}

/// Convert an output table into a single Arrow record batch.
pub fn to_record_batch(table: &OutputTable) -> Result<RecordBatch> {
    rows_to_record_batch(&table.columns, &table.rows)
}

/// Convert a run of rows, laid out as `columns`, into an Arrow record batch.
pub fn rows_to_record_batch(columns: &[ColumnSpec], rows: &[Vec<Cell>]) -> Result<RecordBatch> {
    let schema = arrow_schema(columns);
    let arrays = columns
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let cells: Vec<&Cell> = rows.iter().map(|row| &row[i]).collect();
            column_array(spec, &cells)
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    Ok(RecordBatch::try_new(schema, arrays)?)
}

///
/// Writes an output table as a directory of Parquet partitions.
///
/// Rows keep their order and are split into at most `partitions` contiguous
/// files named `part-00000.parquet`, `part-00001.parquet`, ...
///
#[derive(Debug, Clone)]
pub struct ParquetSink {
    dir: PathBuf,
    partitions: usize,
}

impl ParquetSink {
    pub fn new(dir: &Path, partitions: usize) -> Self {
        ParquetSink {
            dir: dir.to_path_buf(),
            partitions,
        }
    }

    pub fn partition_path(&self, idx: usize) -> PathBuf {
        self.dir.join(format!("part-{idx:05}.parquet"))
    }

    ///
    /// Write the table.
    ///
    /// # Returns
    /// - the paths of the written partition files, in row order
    pub fn write(&self, table: &OutputTable) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut written = Vec::new();
        for (idx, rows) in table.partition(self.partitions).into_iter().enumerate() {
            let batch = rows_to_record_batch(&table.columns, rows)?;
            let path = self.partition_path(idx);

            let file = File::create(&path)?;
            let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props.clone()))?;
            writer.write(&batch)?;
            writer.close()?;

            written.push(path);
        }

        info!(
            "Wrote {} rows to {} partition(s) in {:?}",
            table.num_rows(),
            written.len(),
            self.dir
        );
        Ok(written)
    }
}
