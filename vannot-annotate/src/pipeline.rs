use std::fmt::{self, Display};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vannot_core::{AnnotationError, GenomeBuild, Result, SourceRecord};
use vannot_liftover::{Liftover, LiftoverResult};

use crate::consequence::ConsequencePolicy;
use crate::filter::{FrequencyFilter, QualityFilter};
use crate::frequency::{Frequencies, FrequencyExtractor};
use crate::models::AnnotatedVariant;
use crate::scores::{ExternalScore, ScoreJoiner, ScoreTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Quality,
    Frequency,
    Liftover,
    Scores,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Quality => "quality",
            Stage::Frequency => "frequency",
            Stage::Liftover => "liftover",
            Stage::Scores => "scores",
        }
    }

    /// Filtering stages drop records; the others only annotate.
    pub fn is_filter(&self) -> bool {
        matches!(self, Stage::Quality | Stage::Frequency)
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// The order stages run in.
///
/// Each stage appears at most once. The frequency stage is mandatory because
/// every output row carries frequencies; liftover and scores can be left out.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct StagePlan {
    stages: Vec<Stage>,
}

impl StagePlan {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn position(&self, stage: Stage) -> Option<usize> {
        self.stages.iter().position(|s| *s == stage)
    }
}

impl Default for StagePlan {
    fn default() -> Self {
        StagePlan {
            stages: vec![Stage::Quality, Stage::Frequency, Stage::Liftover, Stage::Scores],
        }
    }
}

impl TryFrom<Vec<Stage>> for StagePlan {
    type Error = AnnotationError;

    fn try_from(stages: Vec<Stage>) -> Result<Self> {
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].contains(stage) {
                return Err(AnnotationError::InvalidConfig(format!(
                    "stage '{stage}' is listed more than once"
                )));
            }
        }
        if !stages.contains(&Stage::Frequency) {
            return Err(AnnotationError::InvalidConfig(
                "the frequency stage is required".to_string(),
            ));
        }
        Ok(StagePlan { stages })
    }
}

impl From<StagePlan> for Vec<Stage> {
    fn from(plan: StagePlan) -> Self {
        plan.stages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCount {
    pub stage: Stage,
    pub entered: usize,
    pub passed: usize,
}

///
/// Record counts of a run, accumulated across batches.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_records: usize,
    pub stages: Vec<StageCount>,
    pub lifted: usize,
    pub unmapped: usize,
    pub score_hits: usize,
    pub score_misses: usize,
    pub output_rows: usize,
}

impl RunSummary {
    fn record_stage(&mut self, stage: Stage, entered: usize, passed: usize) {
        match self.stages.iter_mut().find(|c| c.stage == stage) {
            Some(count) => {
                count.entered += entered;
                count.passed += passed;
            }
            None => self.stages.push(StageCount {
                stage,
                entered,
                passed,
            }),
        }
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageCount> {
        self.stages.iter().find(|c| c.stage == stage)
    }

    ///
    /// Fail loudly when the run produced nothing.
    ///
    /// An empty source, or a filter stage that received records and let none
    /// through, is a [`AnnotationError::NoVariantsPassed`] naming that stage.
    ///
    pub fn ensure_output(&self) -> Result<()> {
        if self.total_records == 0 {
            return Err(AnnotationError::NoVariantsPassed {
                stage: "source".to_string(),
                total: 0,
            });
        }
        for count in &self.stages {
            if count.entered > 0 && count.passed == 0 {
                return Err(AnnotationError::NoVariantsPassed {
                    stage: count.stage.to_string(),
                    total: count.entered,
                });
            }
        }
        Ok(())
    }

    pub fn log(&self) {
        info!("Variants read from source: {}", self.total_records);
        for count in &self.stages {
            if count.stage.is_filter() {
                info!("Variants post-{} filter: {}", count.stage, count.passed);
            }
        }
        if self.stage(Stage::Liftover).is_some() {
            info!("Lifted over: {} (unmapped: {})", self.lifted, self.unmapped);
        }
        if self.stage(Stage::Scores).is_some() {
            info!("External score hits: {} (misses: {})", self.score_hits, self.score_misses);
        }
    }
}

/// A record in flight: annotations are filled in as stages run.
#[derive(Debug)]
struct WorkingVariant {
    source: SourceRecord,
    frequencies: Option<Frequencies>,
    lifted: Option<LiftoverResult>,
    score: Option<ExternalScore>,
}

///
/// Runs the configured stages over batches of source records.
///
/// Side tables (chain, scores) are borrowed: they are loaded once before the
/// first batch and never change during a run.
///
#[derive(Debug, Clone)]
pub struct Pipeline<'a> {
    plan: StagePlan,
    source_build: GenomeBuild,
    quality: QualityFilter,
    extractor: FrequencyExtractor,
    frequency: FrequencyFilter,
    consequences: ConsequencePolicy,
    liftover: Option<&'a Liftover>,
    scores: Option<ScoreJoiner<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        plan: StagePlan,
        source_build: GenomeBuild,
        extractor: FrequencyExtractor,
        frequency: FrequencyFilter,
        consequences: ConsequencePolicy,
    ) -> Self {
        Pipeline {
            plan,
            source_build,
            quality: QualityFilter,
            extractor,
            frequency,
            consequences,
            liftover: None,
            scores: None,
        }
    }

    pub fn with_liftover(mut self, liftover: &'a Liftover) -> Self {
        self.liftover = Some(liftover);
        self
    }

    pub fn with_scores(mut self, table: &'a ScoreTable) -> Self {
        self.scores = Some(ScoreJoiner::new(table));
        self
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    ///
    /// Check that every planned stage has what it needs, before any record is read.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.plan.contains(Stage::Liftover) && self.liftover.is_none() {
            return Err(AnnotationError::InvalidConfig(
                "liftover stage is planned but no chain was loaded".to_string(),
            ));
        }
        if let Some(stage_idx) = self.plan.position(Stage::Scores) {
            let joiner = self.scores.as_ref().ok_or_else(|| {
                AnnotationError::InvalidConfig(
                    "scores stage is planned but no score table was loaded".to_string(),
                )
            })?;

            // a table on the other build can only be joined on lifted coordinates
            let lifted_first = self
                .plan
                .position(Stage::Liftover)
                .is_some_and(|lift_idx| lift_idx < stage_idx);
            if joiner.build() != self.source_build && !lifted_first {
                return Err(AnnotationError::InvalidConfig(format!(
                    "score table is on {} so the liftover stage must run before scores",
                    joiner.build()
                )));
            }
        }
        Ok(())
    }

    fn run_stage(
        &self,
        stage: Stage,
        batch: Vec<WorkingVariant>,
        summary: &mut RunSummary,
    ) -> Result<Vec<WorkingVariant>> {
        let entered = batch.len();

        let out: Vec<WorkingVariant> = match stage {
            Stage::Quality => batch
                .into_par_iter()
                .filter(|w| self.quality.passes(w.source.filters.as_deref()))
                .collect(),
            Stage::Frequency => batch
                .into_par_iter()
                .map(|mut w| -> Result<Option<WorkingVariant>> {
                    let frequencies = self.extractor.extract(&w.source.freq)?;
                    let keep = self.frequency.passes(&frequencies);
                    w.frequencies = Some(frequencies);
                    Ok(keep.then_some(w))
                })
                .collect::<Result<Vec<Option<WorkingVariant>>>>()?
                .into_iter()
                .flatten()
                .collect(),
            Stage::Liftover => {
                let liftover = self.liftover.ok_or_else(|| {
                    AnnotationError::InvalidConfig("no chain loaded".to_string())
                })?;
                let out = batch
                    .into_par_iter()
                    .map(|mut w| -> Result<WorkingVariant> {
                        let lifted = liftover
                            .lift(w.source.variant.locus())
                            .map_err(|e| AnnotationError::InvalidConfig(e.to_string()))?;
                        w.lifted = Some(lifted);
                        Ok(w)
                    })
                    .collect::<Result<Vec<WorkingVariant>>>()?;
                let lifted = out
                    .iter()
                    .filter(|w| w.lifted.as_ref().is_some_and(LiftoverResult::is_mapped))
                    .count();
                summary.lifted += lifted;
                summary.unmapped += out.len() - lifted;
                out
            }
            Stage::Scores => {
                let joiner = self.scores.as_ref().ok_or_else(|| {
                    AnnotationError::InvalidConfig("no score table loaded".to_string())
                })?;
                let out: Vec<WorkingVariant> = batch
                    .into_par_iter()
                    .map(|mut w| {
                        let lifted = w.lifted.as_ref().and_then(LiftoverResult::locus);
                        w.score = joiner.join(&w.source.variant, lifted);
                        w
                    })
                    .collect();
                let hits = out.iter().filter(|w| w.score.is_some()).count();
                summary.score_hits += hits;
                summary.score_misses += out.len() - hits;
                out
            }
        };

        debug!("{stage}: {} of {entered} variants kept", out.len());
        summary.record_stage(stage, entered, out.len());
        Ok(out)
    }

    fn finish(&self, w: WorkingVariant) -> Result<AnnotatedVariant> {
        let consequences = self.consequences.reduce(w.source.vep.as_ref())?;
        Ok(AnnotatedVariant {
            variant: w.source.variant,
            locus_other_build: w.lifted.and_then(LiftoverResult::into_locus),
            frequencies: w.frequencies.unwrap_or_default(),
            external_score: w.score,
            consequences,
            rsid: w.source.rsid,
            allele_type: w.source.allele_type,
        })
    }

    ///
    /// Run every planned stage over one batch of records.
    ///
    /// # Arguments
    /// - records: validated source records
    /// - summary: counts of this batch are added here
    ///
    /// # Returns
    /// - the surviving records, annotated, in input order
    pub fn run_records(
        &self,
        records: Vec<SourceRecord>,
        summary: &mut RunSummary,
    ) -> Result<Vec<AnnotatedVariant>> {
        summary.total_records += records.len();

        let mut batch: Vec<WorkingVariant> = records
            .into_iter()
            .map(|source| WorkingVariant {
                source,
                frequencies: None,
                lifted: None,
                score: None,
            })
            .collect();

        for stage in self.plan.stages() {
            batch = self.run_stage(*stage, batch, summary)?;
        }

        let annotated = batch
            .into_par_iter()
            .map(|w| self.finish(w))
            .collect::<Result<Vec<AnnotatedVariant>>>()?;

        summary.output_rows += annotated.len();
        Ok(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use vannot_core::{FrequencyEntry, Locus, Variant, VariantKey};
    use vannot_liftover::ChainMap;

    use crate::population::{Population, PopulationIndex};

    const CHAIN: &str = "chain 1000 chr1 100000 + 0 20000 chr1 100000 + 1000 21000 1\n20000\n";

    fn record(pos: u32, afs: [Option<f64>; 2], filters: Option<Vec<&str>>) -> SourceRecord {
        SourceRecord {
            variant: Variant::try_new(
                Locus::new("1", pos, GenomeBuild::GRCh37).unwrap(),
                vec!["A".to_string(), "G".to_string()],
            )
            .unwrap(),
            freq: afs
                .iter()
                .map(|af| FrequencyEntry {
                    af: *af,
                    ..Default::default()
                })
                .collect(),
            filters: filters.map(|f| f.into_iter().map(String::from).collect()),
            rsid: Some(format!("rs{pos}")),
            allele_type: Some("snv".to_string()),
            vep: Some(json!({"most_severe_consequence": "intron_variant", "input": "x"})),
        }
    }

    #[fixture]
    fn extractor() -> FrequencyExtractor {
        let freq_index: BTreeMap<String, usize> = [("gnomad_afr", 0), ("gnomad_nfe", 1)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        FrequencyExtractor::new(
            PopulationIndex::resolve(&[Population::Afr, Population::Nfe], &freq_index).unwrap(),
        )
    }

    #[fixture]
    fn liftover() -> Liftover {
        let chain =
            ChainMap::parse(Cursor::new(CHAIN), GenomeBuild::GRCh37, GenomeBuild::GRCh38).unwrap();
        Liftover::new(chain)
    }

    #[fixture]
    fn scores() -> ScoreTable {
        ScoreTable::from_rows(
            GenomeBuild::GRCh38,
            vec![(
                VariantKey::new(GenomeBuild::GRCh38, "1", 1500, "A", "G"),
                ExternalScore {
                    raw: 0.5,
                    phred: 7.1,
                },
            )],
        )
    }

    fn four_variants() -> Vec<SourceRecord> {
        vec![
            record(100, [Some(0.3), Some(0.3)], Some(vec!["AC0"])),
            record(200, [Some(0.0005), Some(0.0005)], Some(vec![])),
            record(500, [Some(0.0005), Some(0.002)], Some(vec![])),
            record(50000, [Some(0.01), None], Some(vec![])),
        ]
    }

    #[rstest]
    fn test_four_variant_scenario(
        extractor: FrequencyExtractor,
        liftover: Liftover,
        scores: ScoreTable,
    ) {
        let pipeline = Pipeline::new(
            StagePlan::default(),
            GenomeBuild::GRCh37,
            extractor,
            FrequencyFilter::new(0.001).unwrap(),
            ConsequencePolicy::default(),
        )
        .with_liftover(&liftover)
        .with_scores(&scores);
        pipeline.validate().unwrap();

        let mut summary = RunSummary::default();
        let out = pipeline.run_records(four_variants(), &mut summary).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].variant.locus().position(), 500);
        assert_eq!(
            out[0].locus_other_build,
            Some(Locus::new("1", 1500, GenomeBuild::GRCh38).unwrap())
        );
        assert_eq!(out[0].external_score.map(|s| s.phred), Some(7.1));
        assert_eq!(
            out[0].consequences,
            Some(json!({"most_severe_consequence": "intron_variant"}))
        );

        assert_eq!(out[1].variant.locus().position(), 50000);
        assert_eq!(out[1].locus_other_build, None);
        assert_eq!(out[1].external_score, None);

        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.stage(Stage::Quality).unwrap().passed, 3);
        assert_eq!(summary.stage(Stage::Frequency).unwrap().passed, 2);
        assert_eq!((summary.lifted, summary.unmapped), (1, 1));
        assert_eq!((summary.score_hits, summary.score_misses), (1, 1));
        assert_eq!(summary.output_rows, 2);
        summary.ensure_output().unwrap();
    }

    #[rstest]
    fn test_stage_order_does_not_change_result(
        extractor: FrequencyExtractor,
        liftover: Liftover,
    ) {
        let plan = StagePlan::try_from(vec![Stage::Liftover, Stage::Frequency, Stage::Quality])
            .unwrap();
        let pipeline = Pipeline::new(
            plan,
            GenomeBuild::GRCh37,
            extractor,
            FrequencyFilter::default(),
            ConsequencePolicy::default(),
        )
        .with_liftover(&liftover);

        let mut summary = RunSummary::default();
        let out = pipeline.run_records(four_variants(), &mut summary).unwrap();
        let positions: Vec<u32> = out.iter().map(|v| v.variant.locus().position()).collect();
        assert_eq!(positions, vec![500, 50000]);
        assert_eq!(summary.stage(Stage::Liftover).unwrap().entered, 4);
    }

    #[rstest]
    fn test_no_variants_passed(extractor: FrequencyExtractor) {
        let plan = StagePlan::try_from(vec![Stage::Quality, Stage::Frequency]).unwrap();
        let pipeline = Pipeline::new(
            plan,
            GenomeBuild::GRCh37,
            extractor,
            FrequencyFilter::default(),
            ConsequencePolicy::default(),
        );

        let mut summary = RunSummary::default();
        let records = vec![record(100, [Some(0.3), Some(0.3)], Some(vec!["RF"]))];
        let out = pipeline.run_records(records, &mut summary).unwrap();
        assert!(out.is_empty());

        match summary.ensure_output() {
            Err(AnnotationError::NoVariantsPassed { stage, total }) => {
                assert_eq!(stage, "quality");
                assert_eq!(total, 1);
            }
            other => panic!("expected NoVariantsPassed, got {other:?}"),
        }
    }

    #[rstest]
    fn test_empty_source_fails() {
        assert!(matches!(
            RunSummary::default().ensure_output(),
            Err(AnnotationError::NoVariantsPassed { .. })
        ));
    }

    #[rstest]
    fn test_validate_requires_side_tables(extractor: FrequencyExtractor) {
        let pipeline = Pipeline::new(
            StagePlan::default(),
            GenomeBuild::GRCh37,
            extractor,
            FrequencyFilter::default(),
            ConsequencePolicy::default(),
        );
        assert!(pipeline.validate().is_err());
    }

    #[rstest]
    fn test_validate_scores_need_lifted_coordinates(
        extractor: FrequencyExtractor,
        liftover: Liftover,
        scores: ScoreTable,
    ) {
        let plan = StagePlan::try_from(vec![Stage::Frequency, Stage::Scores, Stage::Liftover])
            .unwrap();
        let pipeline = Pipeline::new(
            plan,
            GenomeBuild::GRCh37,
            extractor,
            FrequencyFilter::default(),
            ConsequencePolicy::default(),
        )
        .with_liftover(&liftover)
        .with_scores(&scores);
        assert!(pipeline.validate().is_err());
    }

    #[rstest]
    fn test_validate_scores_on_other_build_need_liftover_stage(
        extractor: FrequencyExtractor,
        scores: ScoreTable,
    ) {
        let plan = StagePlan::try_from(vec![Stage::Frequency, Stage::Scores]).unwrap();
        let pipeline = Pipeline::new(
            plan,
            GenomeBuild::GRCh37,
            extractor,
            FrequencyFilter::default(),
            ConsequencePolicy::default(),
        )
        .with_scores(&scores);
        assert!(matches!(
            pipeline.validate(),
            Err(AnnotationError::InvalidConfig(_))
        ));
    }

    #[rstest]
    fn test_validate_scores_on_source_build_without_liftover(extractor: FrequencyExtractor) {
        let table = ScoreTable::from_rows(GenomeBuild::GRCh37, vec![]);
        let plan = StagePlan::try_from(vec![Stage::Frequency, Stage::Scores]).unwrap();
        let pipeline = Pipeline::new(
            plan,
            GenomeBuild::GRCh37,
            extractor,
            FrequencyFilter::default(),
            ConsequencePolicy::default(),
        )
        .with_scores(&table);
        pipeline.validate().unwrap();
    }

    #[rstest]
    #[case(vec![Stage::Quality, Stage::Quality, Stage::Frequency])]
    #[case(vec![Stage::Quality, Stage::Liftover])]
    fn test_invalid_stage_plan(#[case] stages: Vec<Stage>) {
        assert!(StagePlan::try_from(stages).is_err());
    }

    #[rstest]
    fn test_summaries_accumulate_across_batches(extractor: FrequencyExtractor) {
        let plan = StagePlan::try_from(vec![Stage::Frequency]).unwrap();
        let pipeline = Pipeline::new(
            plan,
            GenomeBuild::GRCh37,
            extractor,
            FrequencyFilter::default(),
            ConsequencePolicy::default(),
        );
        let mut summary = RunSummary::default();
        for batch in four_variants().chunks(2) {
            pipeline.run_records(batch.to_vec(), &mut summary).unwrap();
        }
        let frequency = summary.stage(Stage::Frequency).unwrap();
        assert_eq!((frequency.entered, frequency.passed), (4, 3));
        assert_eq!(summary.output_rows, 3);
    }
}
