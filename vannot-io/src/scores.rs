use std::path::Path;

use tracing::info;

use vannot_annotate::{ExternalScore, ScoreTable};
use vannot_core::utils::{get_dynamic_reader, numbered_lines};
use vannot_core::{GenomeBuild, VariantKey};

use crate::errors::{DataError, Result};

const COMMENT_PREFIX: char = '#';

fn parse_row(line: &str, line_no: usize, build: GenomeBuild) -> Result<(VariantKey, ExternalScore)> {
    let err = |msg: String| DataError::ScoreTable { line: line_no, msg };

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return Err(err(format!("expected 6 tab-delimited fields, found {}", fields.len())));
    }

    let position: u32 = fields[1]
        .parse()
        .map_err(|_| err(format!("invalid position '{}'", fields[1])))?;
    let raw: f64 = fields[4]
        .parse()
        .map_err(|_| err(format!("invalid raw score '{}'", fields[4])))?;
    let phred: f64 = fields[5]
        .parse()
        .map_err(|_| err(format!("invalid phred score '{}'", fields[5])))?;

    if fields[0].is_empty() || fields[2].is_empty() || fields[3].is_empty() {
        return Err(err("empty contig or allele".to_string()));
    }

    Ok((
        VariantKey::new(build, fields[0], position, fields[2], fields[3]),
        ExternalScore { raw, phred },
    ))
}

///
/// Read an external score table.
///
/// The file is tab-delimited (optionally gzipped) with the columns
/// `chrom pos ref alt raw phred`; extra trailing columns are ignored and
/// `#` lines are comments.
///
/// # Arguments
/// - path: the score table
/// - build: assembly the table's coordinates are on
pub fn read_score_table(path: &Path, build: GenomeBuild) -> Result<ScoreTable> {
    let reader = get_dynamic_reader(path)?;

    let mut rows = Vec::new();
    for (line_no, line) in numbered_lines(reader) {
        let line = line?;
        if line.starts_with(COMMENT_PREFIX) {
            continue;
        }
        rows.push(parse_row(line.trim_end_matches('\r'), line_no, build)?);
    }

    let table = ScoreTable::from_rows(build, rows);
    info!("Loaded {} external scores from {:?}", table.len(), path);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    fn table_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[rstest]
    fn test_read_score_table() {
        let file = table_file(
            "## CADD GRCh37-v1.6\n#Chrom\tPos\tRef\tAlt\tRawScore\tPHRED\n\
             1\t10001\tT\tA\t0.702541\t8.478\n\
             1\t10001\tT\tC\t0.750954\t8.921\n\
             1\t10001\tT\tA\t9.9\t99.9\n",
        );
        let table = read_score_table(file.path(), GenomeBuild::GRCh37).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicates(), 1);

        let key = VariantKey::new(GenomeBuild::GRCh37, "chr1", 10001, "T", "A");
        assert_eq!(
            table.get(&key),
            Some(&ExternalScore {
                raw: 0.702541,
                phred: 8.478
            })
        );
    }

    #[rstest]
    #[case("1\t10001\tT\tA\t0.7\n", 1)]
    #[case("#header\n1\tabc\tT\tA\t0.7\t8.4\n", 2)]
    #[case("1\t10001\tT\tA\t0.7\t8.4\n1\t10002\tT\tA\tNaN?\t8.4\n", 2)]
    fn test_malformed_rows(#[case] content: &str, #[case] expected_line: usize) {
        let file = table_file(content);
        match read_score_table(file.path(), GenomeBuild::GRCh37) {
            Err(DataError::ScoreTable { line, .. }) => assert_eq!(line, expected_line),
            other => panic!("expected ScoreTable error, got {other:?}"),
        }
    }
}
