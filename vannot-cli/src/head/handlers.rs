use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use vannot_core::GenomeBuild;
use vannot_io::VariantSource;

use super::cli::DEFAULT_HEAD_ROWS;

pub fn run_head(matches: &ArgMatches) -> Result<()> {
    let source = matches
        .get_one::<String>("source")
        .context("A path to the variant source is required.")?;
    let globals = matches
        .get_one::<String>("globals")
        .context("A path to the dataset metadata is required.")?;
    let rows = matches
        .get_one::<usize>("rows")
        .copied()
        .unwrap_or(DEFAULT_HEAD_ROWS);

    // the build only matters for validated records, not for raw rows
    let source = VariantSource::open(Path::new(source), Path::new(globals), GenomeBuild::GRCh37)
        .with_context(|| format!("Failed to open variant source {source}"))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(source.metadata())?)?;
    for row in source.head(rows)? {
        writeln!(stdout, "{row}")?;
    }

    Ok(())
}
