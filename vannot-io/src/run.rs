use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

use vannot_annotate::pipeline::Stage;
use vannot_annotate::reshape::compare_variants;
use vannot_annotate::{FrequencyExtractor, Pipeline, RunConfig, RunSummary};
use vannot_liftover::{ChainMap, Liftover};

use crate::columnar::ParquetSink;
use crate::errors::Result;
use crate::guard::OutputGuard;
use crate::scores::read_score_table;
use crate::sitelist::SiteListSink;
use crate::source::VariantSource;

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} variants)")
    {
        pb.set_style(style);
    }
    pb
}

///
/// Run a complete annotation.
///
/// Cheap checks come first so a bad run fails before any expensive work:
/// configuration, output guard, dataset metadata and populations, then a
/// schema pass over the source. Only after that are the chain and score
/// tables loaded, the records annotated in batches, and the output written.
///
/// # Arguments
/// - config: the run configuration
///
/// # Returns
/// - the record counts of the run
pub fn run_annotation(config: &RunConfig) -> Result<RunSummary> {
    config.validate()?;

    let output = config.output_path()?;
    let site_list = config.site_list_path()?;
    let guard = OutputGuard::new(vec![output.to_path_buf(), site_list.clone()], config.overwrite);
    guard.check()?;

    let source = VariantSource::open(config.source_path()?, config.globals_path()?, config.source_build)?
        .with_limit(config.limit);
    let populations = source.metadata().resolve(&config.populations)?;
    info!("Resolved {} populations of interest", populations.len());

    let reshaper = config.reshaper()?;
    source.check_schema()?;

    // side tables are fully loaded before any record is annotated
    let liftover = match (&config.chain, config.stages.contains(Stage::Liftover)) {
        (Some(chain), true) => {
            let chain = ChainMap::from_path(chain, config.source_build, config.target_build)?;
            info!("Loaded {} chains from {:?}", chain.chain_count(), config.chain);
            Some(Liftover::new(chain))
        }
        _ => None,
    };
    let scores = match (&config.scores, config.stages.contains(Stage::Scores)) {
        (Some(path), true) => Some(read_score_table(path, config.score_build())?),
        _ => None,
    };

    let mut pipeline = Pipeline::new(
        config.stages.clone(),
        config.source_build,
        FrequencyExtractor::new(populations),
        config.frequency_filter()?,
        config.consequences.clone(),
    );
    if let Some(liftover) = &liftover {
        pipeline = pipeline.with_liftover(liftover);
    }
    if let Some(scores) = &scores {
        pipeline = pipeline.with_scores(scores);
    }
    pipeline.validate()?;

    let pb = progress_bar(config.progress);
    pb.set_message(format!("Annotating {:?}", source.path().file_name().unwrap_or_default()));

    let mut summary = RunSummary::default();
    let mut annotated = Vec::new();
    let mut batch = Vec::with_capacity(config.batch_size);

    for record in source.records()? {
        batch.push(record?);
        if batch.len() == config.batch_size {
            pb.inc(batch.len() as u64);
            annotated.extend(pipeline.run_records(std::mem::take(&mut batch), &mut summary)?);
        }
    }
    if !batch.is_empty() {
        pb.inc(batch.len() as u64);
        annotated.extend(pipeline.run_records(batch, &mut summary)?);
    }
    pb.finish_and_clear();

    summary.log();
    summary.ensure_output()?;

    annotated.par_sort_by(compare_variants);
    let table = reshaper.project(&annotated);
    drop(annotated);
    let sites = reshaper.site_list(&table, &config.site_list_columns)?;

    guard.clear()?;
    ParquetSink::new(output, config.partitions).write(&table)?;
    SiteListSink::new(&site_list).write(&sites)?;

    info!("Output rows: {}", summary.output_rows);
    Ok(summary)
}
