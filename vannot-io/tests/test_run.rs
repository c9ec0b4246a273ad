use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use vannot_annotate::pipeline::{Stage, StagePlan};
use vannot_annotate::{Population, RunConfig};
use vannot_core::{AnnotationError, GenomeBuild};
use vannot_io::{DataError, run_annotation};

const GLOBALS: &str = r#"{"freq_index_dict": {"gnomad": 0, "gnomad_afr": 1, "gnomad_nfe": 2, "gnomad_raw": 3}}"#;

const CHAIN: &str = "chain 1000 chr1 249250621 + 0 20000 chr1 248956422 + 1000 21000 1\n20000\n";

const CADD: &str = "## CADD GRCh37-v1.6\n\
#Chrom\tPos\tRef\tAlt\tRawScore\tPHRED\n\
1\t500\tA\tG\t0.512\t7.12\n\
1\t50000\tC\tT\t2.3\t21.4\n";

fn row(pos: u32, alleles: &str, afr: f64, nfe: f64, filters: &str) -> String {
    format!(
        r#"{{"locus":{{"contig":"1","position":{pos}}},"alleles":{alleles},"freq":[{{"AF":0.5}},{{"AF":{afr}}},{{"AF":{nfe}}},{{"AF":0.5}}],"filters":{filters},"rsid":"rs{pos}","allele_type":"snv","vep":{{"most_severe_consequence":"intron_variant","input":"raw"}},"qual":99.0}}"#
    )
}

fn four_variants() -> Vec<String> {
    vec![
        row(100, r#"["A","G"]"#, 0.3, 0.3, r#"["AC0"]"#),
        row(200, r#"["A","G"]"#, 0.0005, 0.0005, "[]"),
        row(500, r#"["A","G"]"#, 0.0005, 0.002, "[]"),
        row(50000, r#"["C","T"]"#, 0.01, 0.99, "[]"),
    ]
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn config(&self, rows: &[String]) -> RunConfig {
        RunConfig {
            source: Some(self.write("gnomad.jsonl", &format!("{}\n", rows.join("\n")))),
            globals: Some(self.write("globals.json", GLOBALS)),
            chain: Some(self.write("b37_to_b38.chain", CHAIN)),
            scores: Some(self.write("cadd.tsv", CADD)),
            output: Some(self.path("out/gnomad_b38")),
            populations: vec![Population::Afr, Population::Nfe],
            ..RunConfig::defaults()
        }
    }
}

#[fixture]
fn workspace() -> Workspace {
    Workspace {
        dir: TempDir::new().unwrap(),
    }
}

fn parquet_rows(dir: &Path) -> usize {
    let mut rows = 0;
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    paths.sort();
    for path in paths {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        for batch in reader {
            rows += batch.unwrap().num_rows();
        }
    }
    rows
}

fn read_gz(path: &Path) -> String {
    let mut content = String::new();
    MultiGzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[rstest]
fn test_four_variant_scenario(workspace: Workspace) {
    let config = workspace.config(&four_variants());
    let summary = run_annotation(&config).unwrap();

    assert_eq!(summary.total_records, 4);
    assert_eq!(summary.stage(Stage::Quality).unwrap().passed, 3);
    assert_eq!(summary.stage(Stage::Frequency).unwrap().passed, 2);
    assert_eq!((summary.lifted, summary.unmapped), (1, 1));
    assert_eq!((summary.score_hits, summary.score_misses), (2, 0));
    assert_eq!(summary.output_rows, 2);

    assert_eq!(parquet_rows(&workspace.path("out/gnomad_b38")), 2);

    let sites = read_gz(&workspace.path("out/gnomad_b38.sitelist.tsv.gz"));
    assert_eq!(
        sites,
        "chrom_b37\tpos_b37\tchrom_b38\tpos_b38\tref\talt\trsid\n\
         1\t500\t1\t1500\tA\tG\trs500\n\
         1\t50000\tNA\tNA\tC\tT\trs50000\n"
    );
}

#[rstest]
fn test_rerun_is_refused_then_deterministic(workspace: Workspace) {
    let config = workspace.config(&four_variants());
    run_annotation(&config).unwrap();

    let part = workspace.path("out/gnomad_b38/part-00000.parquet");
    let first_table = std::fs::read(&part).unwrap();
    let first_sites = std::fs::read(workspace.path("out/gnomad_b38.sitelist.tsv.gz")).unwrap();

    match run_annotation(&config) {
        Err(DataError::Annotation(AnnotationError::OutputAlreadyExists(_))) => {}
        other => panic!("expected OutputAlreadyExists, got {other:?}"),
    }

    let config = RunConfig {
        overwrite: true,
        ..config
    };
    run_annotation(&config).unwrap();
    assert_eq!(std::fs::read(&part).unwrap(), first_table);
    assert_eq!(
        std::fs::read(workspace.path("out/gnomad_b38.sitelist.tsv.gz")).unwrap(),
        first_sites
    );
}

#[rstest]
fn test_multiallelic_record_aborts_run(workspace: Workspace) {
    let mut rows = four_variants();
    rows.push(row(600, r#"["A","G","T"]"#, 0.1, 0.1, "[]"));
    let config = workspace.config(&rows);

    match run_annotation(&config) {
        Err(DataError::Annotation(AnnotationError::NotBiallelic { count, first_line })) => {
            assert_eq!((count, first_line), (1, 5));
        }
        other => panic!("expected NotBiallelic, got {other:?}"),
    }
    assert!(!workspace.path("out/gnomad_b38").exists());
}

#[rstest]
fn test_unknown_population_fails_fast(workspace: Workspace) {
    let config = RunConfig {
        populations: vec![Population::Afr, Population::Sas],
        ..workspace.config(&four_variants())
    };
    match run_annotation(&config) {
        Err(DataError::Annotation(AnnotationError::UnknownPopulation(missing))) => {
            assert_eq!(missing, vec!["gnomad_sas".to_string()]);
        }
        other => panic!("expected UnknownPopulation, got {other:?}"),
    }
}

#[rstest]
fn test_nothing_passes(workspace: Workspace) {
    let rows = vec![row(100, r#"["A","G"]"#, 0.3, 0.3, r#"["RF"]"#)];
    let config = workspace.config(&rows);
    match run_annotation(&config) {
        Err(DataError::Annotation(AnnotationError::NoVariantsPassed { stage, total })) => {
            assert_eq!((stage.as_str(), total), ("quality", 1));
        }
        other => panic!("expected NoVariantsPassed, got {other:?}"),
    }
    assert!(!workspace.path("out/gnomad_b38").exists());
}

#[rstest]
fn test_join_keeps_every_filtered_variant(workspace: Workspace) {
    let rows: Vec<String> = (1..=30)
        .map(|i| row(i * 1000, r#"["A","G"]"#, 0.01, 0.01, "[]"))
        .collect();
    let config = RunConfig {
        batch_size: 7,
        partitions: 4,
        ..workspace.config(&rows)
    };
    let summary = run_annotation(&config).unwrap();

    assert_eq!(summary.stage(Stage::Frequency).unwrap().passed, 30);
    assert_eq!(summary.score_misses, 30);
    assert_eq!(summary.output_rows, 30);
    assert_eq!(parquet_rows(&workspace.path("out/gnomad_b38")), 30);
    assert_eq!(std::fs::read_dir(workspace.path("out/gnomad_b38")).unwrap().count(), 4);
}

#[rstest]
fn test_limit_truncates_source(workspace: Workspace) {
    let config = RunConfig {
        limit: Some(3),
        ..workspace.config(&four_variants())
    };
    let summary = run_annotation(&config).unwrap();
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.output_rows, 1);
}

#[rstest]
fn test_scores_on_target_build_without_liftover_fail_fast(workspace: Workspace) {
    let config = RunConfig {
        score_build: Some(GenomeBuild::GRCh38),
        stages: StagePlan::try_from(vec![Stage::Frequency, Stage::Scores]).unwrap(),
        ..workspace.config(&four_variants())
    };
    assert!(matches!(
        run_annotation(&config),
        Err(DataError::Annotation(AnnotationError::InvalidConfig(_)))
    ));
    assert!(!workspace.path("out/gnomad_b38").exists());
}
