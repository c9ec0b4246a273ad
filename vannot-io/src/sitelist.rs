use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;

use vannot_annotate::OutputTable;

use crate::errors::Result;

///
/// Writes the site list: a gzipped, tab-delimited text table with a header row.
///
/// Missing values are written as `NA`.
///
#[derive(Debug, Clone)]
pub struct SiteListSink {
    path: PathBuf,
}

impl SiteListSink {
    pub fn new(path: &Path) -> Self {
        SiteListSink {
            path: path.to_path_buf(),
        }
    }

    pub fn write(&self, table: &OutputTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

        writeln!(encoder, "{}", table.column_names().join("\t"))?;
        for row in &table.rows {
            let line: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            writeln!(encoder, "{}", line.join("\t"))?;
        }

        encoder.finish()?.flush()?;

        info!("Wrote {} sites to {:?}", table.num_rows(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    use flate2::read::MultiGzDecoder;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;
    use vannot_annotate::reshape::{Cell, ColumnKind, ColumnSpec};

    #[rstest]
    fn test_write_site_list() {
        let table = OutputTable {
            columns: vec![
                ColumnSpec {
                    name: "chrom_b38".to_string(),
                    kind: ColumnKind::Text,
                },
                ColumnSpec {
                    name: "pos_b38".to_string(),
                    kind: ColumnKind::Position,
                },
                ColumnSpec {
                    name: "rsid".to_string(),
                    kind: ColumnKind::Text,
                },
            ],
            rows: vec![
                vec![
                    Cell::Text(Some("1".to_string())),
                    Cell::Position(Some(1100)),
                    Cell::Text(Some("rs1".to_string())),
                ],
                vec![Cell::Text(None), Cell::Position(None), Cell::Text(None)],
            ],
        };

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/sites.tsv.gz");
        SiteListSink::new(&path).write(&table).unwrap();

        let mut content = String::new();
        MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "chrom_b38\tpos_b38\trsid\n1\t1100\trs1\nNA\tNA\tNA\n");
    }
}
