use std::fmt::{self, Display};

use crate::errors::{AnnotationError, Result};
use crate::models::locus::{GenomeBuild, Locus, normalize_contig};

///
/// A biallelic variant: a locus plus its `[reference, alternate]` alleles.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    locus: Locus,
    alleles: [String; 2],
}

///
/// Key used to join variants against side tables.
///
/// Equality covers contig, position, build and both alleles. The contig is
/// stored normalized, so `chr1` and `1` produce the same key.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub build: GenomeBuild,
    pub contig: String,
    pub position: u32,
    pub reference: String,
    pub alternate: String,
}

impl VariantKey {
    pub fn new(
        build: GenomeBuild,
        contig: &str,
        position: u32,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        VariantKey {
            build,
            contig: normalize_contig(contig).to_string(),
            position,
            reference: reference.into(),
            alternate: alternate.into(),
        }
    }
}

impl Variant {
    ///
    /// Create a variant, enforcing the biallelic invariant.
    ///
    /// Anything other than exactly two alleles means an upstream assumption
    /// (split multiallelics) was broken, so this is a [`AnnotationError::SchemaViolation`]
    /// rather than something callers should skip over.
    ///
    pub fn try_new(locus: Locus, alleles: Vec<String>) -> Result<Self> {
        let n_alleles = alleles.len();
        let alleles: [String; 2] = alleles.try_into().map_err(|_| {
            AnnotationError::SchemaViolation(format!(
                "variant at {locus} has {n_alleles} alleles, expected 2"
            ))
        })?;
        Ok(Variant { locus, alleles })
    }

    pub fn locus(&self) -> &Locus {
        &self.locus
    }

    pub fn alleles(&self) -> &[String; 2] {
        &self.alleles
    }

    pub fn reference(&self) -> &str {
        &self.alleles[0]
    }

    pub fn alternate(&self) -> &str {
        &self.alleles[1]
    }

    pub fn key(&self) -> VariantKey {
        VariantKey::new(
            self.locus.build(),
            self.locus.contig(),
            self.locus.position(),
            self.reference(),
            self.alternate(),
        )
    }

    /// `chrom_pos_ref_alt` identifier on the variant's own build.
    pub fn variant_id(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.locus.normalized_contig(),
            self.locus.position(),
            self.reference(),
            self.alternate()
        )
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}>{}", self.locus, self.reference(), self.alternate())
    }
}
