//! Load chain files from disk, plain and gzipped, and lift through them.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use rstest::*;
use tempfile::{TempDir, tempdir};

use vannot_core::models::{GenomeBuild, Locus};
use vannot_liftover::{ChainMap, Liftover, LiftoverResult};

const CHAIN: &str = "chain 4900 chr1 249250621 + 10000 10300 chr1 248956422 + 10000 10300 2\n\
                     150\t0\t0\n\
                     150\n\n";

fn write_chain(dir: &Path, name: &str, gzip: bool) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(CHAIN.as_bytes()).unwrap();
        encoder.finish().unwrap();
    } else {
        let mut file = file;
        file.write_all(CHAIN.as_bytes()).unwrap();
    }
    path
}

#[fixture]
fn workdir() -> TempDir {
    tempdir().unwrap()
}

#[rstest]
#[case("hg19ToHg38.over.chain", false)]
#[case("hg19ToHg38.over.chain.gz", true)]
fn test_load_and_lift(workdir: TempDir, #[case] name: &str, #[case] gzip: bool) {
    let path = write_chain(workdir.path(), name, gzip);
    let chain = ChainMap::from_path(&path, GenomeBuild::GRCh37, GenomeBuild::GRCh38).unwrap();

    assert_eq!(chain.chain_count(), 1);
    assert_eq!(chain.blocks().len(), 2);

    let liftover = Liftover::new(chain);
    let locus = Locus::new("1", 10177, GenomeBuild::GRCh37).unwrap();
    let lifted = liftover.lift(&locus).unwrap();

    assert_eq!(
        lifted,
        LiftoverResult::Mapped(Locus::new("1", 10177, GenomeBuild::GRCh38).unwrap())
    );
}

#[rstest]
fn test_missing_chain_file(workdir: TempDir) {
    let result = ChainMap::from_path(
        workdir.path().join("absent.chain"),
        GenomeBuild::GRCh37,
        GenomeBuild::GRCh38,
    );
    assert!(result.is_err());
}
