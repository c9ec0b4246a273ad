use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use vannot_core::{GenomeBuild, Locus, Variant, VariantKey};

/// One external pathogenicity score (CADD style: raw plus phred-scaled).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExternalScore {
    pub raw: f64,
    pub phred: f64,
}

///
/// External scores keyed by variant, for one genome build.
///
/// Keys are unique; when the input repeats a key the first row wins and the
/// repeat is counted in [`ScoreTable::duplicates`].
///
#[derive(Debug, Clone)]
pub struct ScoreTable {
    build: GenomeBuild,
    scores: FxHashMap<VariantKey, ExternalScore>,
    duplicates: usize,
}

impl ScoreTable {
    pub fn from_rows<I>(build: GenomeBuild, rows: I) -> Self
    where
        I: IntoIterator<Item = (VariantKey, ExternalScore)>,
    {
        let mut scores: FxHashMap<VariantKey, ExternalScore> = FxHashMap::default();
        let mut duplicates = 0;

        for (key, score) in rows {
            if key.build != build {
                warn!("Skipping score for {}:{} on {}", key.contig, key.position, key.build);
                continue;
            }
            if scores.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            scores.insert(key, score);
        }

        if duplicates > 0 {
            warn!("Score table repeats {duplicates} key(s); keeping the first row of each");
        }

        ScoreTable {
            build,
            scores,
            duplicates,
        }
    }

    pub fn build(&self) -> GenomeBuild {
        self.build
    }

    pub fn get(&self, key: &VariantKey) -> Option<&ExternalScore> {
        self.scores.get(key)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

///
/// Left-joins variants against a [`ScoreTable`].
///
/// A variant without a score is kept; its score is simply absent.
///
#[derive(Debug, Clone)]
pub struct ScoreJoiner<'a> {
    table: &'a ScoreTable,
}

impl<'a> ScoreJoiner<'a> {
    pub fn new(table: &'a ScoreTable) -> Self {
        ScoreJoiner { table }
    }

    pub fn build(&self) -> GenomeBuild {
        self.table.build()
    }

    ///
    /// Look up the score for a variant.
    ///
    /// # Arguments
    /// - variant: the variant as it sits on the source build
    /// - lifted: the variant's locus on the other build, if liftover succeeded
    ///
    /// The lookup key is built on the table's build: the source coordinates
    /// when the builds agree, the lifted coordinates otherwise. Without
    /// coordinates on the table's build there is nothing to join on.
    pub fn join(
        &self,
        variant: &Variant,
        lifted: Option<&Locus>,
    ) -> Option<ExternalScore> {
        let locus = if variant.locus().build() == self.table.build() {
            variant.locus()
        } else {
            lifted.filter(|l| l.build() == self.table.build())?
        };

        let key = VariantKey::new(
            locus.build(),
            locus.contig(),
            locus.position(),
            variant.reference(),
            variant.alternate(),
        );
        self.table.get(&key).copied()
    }
}
