use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use tracing::info;

use vannot_annotate::{Population, RunConfig};
use vannot_core::GenomeBuild;
use vannot_io::run_annotation;

///
/// Build the run configuration: the config file if given, else defaults,
/// then every flag present on the command line on top.
///
pub fn config_from_matches(matches: &ArgMatches) -> Result<RunConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => RunConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load run config {path}"))?,
        None => RunConfig::defaults(),
    };

    let path = |id: &str| matches.get_one::<String>(id).map(PathBuf::from);

    if let Some(source) = path("source") {
        config.source = Some(source);
    }
    if let Some(globals) = path("globals") {
        config.globals = Some(globals);
    }
    if let Some(chain) = path("chain") {
        config.chain = Some(chain);
    }
    if let Some(scores) = path("scores") {
        config.scores = Some(scores);
    }
    if let Some(output) = path("output") {
        config.output = Some(output);
    }
    if let Some(site_list) = path("site-list") {
        config.site_list = Some(site_list);
    }
    if let Some(threshold) = matches.get_one::<f64>("maf-threshold") {
        config.maf_threshold = *threshold;
    }
    if let Some(populations) = matches.get_many::<String>("populations") {
        config.populations = populations
            .map(|p| p.trim().parse::<Population>())
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(build) = matches.get_one::<String>("source-build") {
        config.source_build = build.parse::<GenomeBuild>()?;
    }
    if let Some(build) = matches.get_one::<String>("target-build") {
        config.target_build = build.parse::<GenomeBuild>()?;
    }
    if let Some(partitions) = matches.get_one::<usize>("partitions") {
        config.partitions = *partitions;
    }
    if let Some(limit) = matches.get_one::<usize>("limit") {
        config.limit = Some(*limit);
    }
    if matches.get_flag("overwrite") {
        config.overwrite = true;
    }
    if matches.get_flag("progress") {
        config.progress = true;
    }

    Ok(config)
}

pub fn run_annotate(matches: &ArgMatches) -> Result<()> {
    let config = config_from_matches(matches)?;

    let summary = run_annotation(&config).context("Annotation run failed")?;
    info!(
        "Done: {} of {} variants written",
        summary.output_rows, summary.total_records
    );

    Ok(())
}
