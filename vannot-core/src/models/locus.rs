use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{AnnotationError, Result};

/// Prefix some assemblies (UCSC style) put in front of contig names.
pub const CONTIG_PREFIX: &str = "chr";

///
/// Reference genome assembly a coordinate belongs to.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum GenomeBuild {
    GRCh37,
    GRCh38,
}

impl GenomeBuild {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenomeBuild::GRCh37 => "GRCh37",
            GenomeBuild::GRCh38 => "GRCh38",
        }
    }

    /// Short code used in flat column names, e.g. `chrom_b37`.
    pub fn short_code(&self) -> &'static str {
        match self {
            GenomeBuild::GRCh37 => "b37",
            GenomeBuild::GRCh38 => "b38",
        }
    }
}

impl FromStr for GenomeBuild {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "grch37" | "b37" | "37" | "hg19" => Ok(GenomeBuild::GRCh37),
            "grch38" | "b38" | "38" | "hg38" => Ok(GenomeBuild::GRCh38),
            _ => Err(AnnotationError::InvalidBuild(s.to_string())),
        }
    }
}

impl TryFrom<String> for GenomeBuild {
    type Error = AnnotationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Display for GenomeBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// Strip the `chr` prefix from a contig name, if present.
///
/// `chr1` and `1` both normalize to `1`.
///
pub fn normalize_contig(contig: &str) -> &str {
    contig.strip_prefix(CONTIG_PREFIX).unwrap_or(contig)
}

///
/// A 1-based genomic position on a specific build.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locus {
    contig: String,
    position: u32,
    build: GenomeBuild,
}

impl Locus {
    ///
    /// Create a new locus.
    ///
    /// # Arguments
    /// - contig: contig name as written by the data source (`1`, `chr1`, `X`, ...)
    /// - position: 1-based coordinate, must be positive
    /// - build: assembly the coordinate refers to
    pub fn new(contig: impl Into<String>, position: u32, build: GenomeBuild) -> Result<Self> {
        let contig = contig.into();
        if contig.is_empty() {
            return Err(AnnotationError::InvalidLocus(format!(
                "empty contig at position {position}"
            )));
        }
        if position == 0 {
            return Err(AnnotationError::InvalidLocus(format!(
                "{contig}:0 is not a 1-based position"
            )));
        }
        Ok(Locus {
            contig,
            position,
            build,
        })
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn build(&self) -> GenomeBuild {
        self.build
    }

    /// Contig name without the `chr` prefix.
    pub fn normalized_contig(&self) -> &str {
        normalize_contig(&self.contig)
    }

    /// 0-based coordinate, as used by chain files.
    pub fn zero_based(&self) -> u32 {
        self.position - 1
    }
}

impl Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contig, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("GRCh37", GenomeBuild::GRCh37)]
    #[case("grch38", GenomeBuild::GRCh38)]
    #[case("hg19", GenomeBuild::GRCh37)]
    #[case("b38", GenomeBuild::GRCh38)]
    fn test_parse_build(#[case] input: &str, #[case] expected: GenomeBuild) {
        assert_eq!(input.parse::<GenomeBuild>().unwrap(), expected);
    }

    #[rstest]
    fn test_parse_invalid_build() {
        assert!(matches!(
            "GRCh36".parse::<GenomeBuild>(),
            Err(AnnotationError::InvalidBuild(_))
        ));
    }

    #[rstest]
    #[case("chr1", "1")]
    #[case("1", "1")]
    #[case("chrX", "X")]
    #[case("MT", "MT")]
    fn test_normalize_contig(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_contig(input), expected);
    }

    #[rstest]
    fn test_locus_rejects_zero_position() {
        let locus = Locus::new("1", 0, GenomeBuild::GRCh37);
        assert!(matches!(locus, Err(AnnotationError::InvalidLocus(_))));
    }

    #[rstest]
    fn test_locus_rejects_empty_contig() {
        assert!(Locus::new("", 10, GenomeBuild::GRCh37).is_err());
    }

    #[rstest]
    fn test_locus_accessors() {
        let locus = Locus::new("chr7", 117559590, GenomeBuild::GRCh38).unwrap();
        assert_eq!(locus.contig(), "chr7");
        assert_eq!(locus.normalized_contig(), "7");
        assert_eq!(locus.zero_based(), 117559589);
        assert_eq!(locus.to_string(), "chr7:117559590");
    }
}
