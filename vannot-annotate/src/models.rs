use serde_json::Value;

use vannot_core::{GenomeBuild, Locus, Variant};

use crate::frequency::Frequencies;
use crate::scores::ExternalScore;

///
/// A variant that made it through the pipeline, with every annotation attached.
///
/// Absent fields are not errors: `locus_other_build` is `None` when liftover
/// failed (or did not run), `external_score` when the score table has no row
/// for the variant.
///
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedVariant {
    pub variant: Variant,
    pub locus_other_build: Option<Locus>,
    pub frequencies: Frequencies,
    pub external_score: Option<ExternalScore>,
    pub consequences: Option<Value>,
    pub rsid: Option<String>,
    pub allele_type: Option<String>,
}

impl AnnotatedVariant {
    /// Coordinates of this variant on `build`, if known.
    pub fn locus_on(&self, build: GenomeBuild) -> Option<&Locus> {
        if self.variant.locus().build() == build {
            Some(self.variant.locus())
        } else {
            self.locus_other_build.as_ref().filter(|l| l.build() == build)
        }
    }
}
