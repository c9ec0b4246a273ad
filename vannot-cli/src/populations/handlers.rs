use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use vannot_io::DatasetMetadata;

pub fn run_populations(matches: &ArgMatches) -> Result<()> {
    let globals = matches
        .get_one::<String>("globals")
        .context("A path to the dataset metadata is required.")?;

    let metadata = DatasetMetadata::from_path(Path::new(globals))
        .with_context(|| format!("Failed to read dataset metadata from {globals}"))?;

    let mut stdout = std::io::stdout().lock();
    for key in metadata.population_keys() {
        writeln!(stdout, "{key}")?;
    }

    Ok(())
}
