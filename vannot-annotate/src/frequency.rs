use std::collections::BTreeMap;

use vannot_core::{AnnotationError, FrequencyEntry, Result};

use crate::population::{Population, PopulationIndex};

///
/// Minor allele frequency of a biallelic site given its alternate allele frequency.
///
/// `af <= 0.5` returns `af`, otherwise `1 - af`.
///
pub fn af_to_maf(af: f64) -> f64 {
    if af <= 0.5 { af } else { 1.0 - af }
}

///
/// Per-population allele frequencies of one variant.
///
/// Both maps hold one entry for every population of interest; `None` means
/// the dataset has no AF for that population on this variant.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frequencies {
    pub af: BTreeMap<Population, Option<f64>>,
    pub maf: BTreeMap<Population, Option<f64>>,
}

impl Frequencies {
    /// Largest MAF across populations, ignoring missing values.
    pub fn max_maf(&self) -> Option<f64> {
        self.maf
            .values()
            .flatten()
            .copied()
            .fold(None, |acc: Option<f64>, maf| match acc {
                Some(best) if best >= maf => Some(best),
                _ => Some(maf),
            })
    }
}

///
/// Pulls the AF of each population of interest out of a record's frequency
/// array and derives the MAF.
///
#[derive(Debug, Clone)]
pub struct FrequencyExtractor {
    index: PopulationIndex,
}

impl FrequencyExtractor {
    pub fn new(index: PopulationIndex) -> Self {
        FrequencyExtractor { index }
    }

    pub fn populations(&self) -> Vec<Population> {
        self.index.populations()
    }

    ///
    /// Extract AF and MAF for every population of interest.
    ///
    /// # Arguments
    /// - freq: the record's frequency array, positions given by the dataset metadata
    ///
    /// # Returns
    /// - the frequencies, or a [`AnnotationError::SchemaViolation`] if the array
    ///   is shorter than the metadata promises or holds an AF outside `[0, 1]`
    pub fn extract(&self, freq: &[FrequencyEntry]) -> Result<Frequencies> {
        let mut frequencies = Frequencies::default();

        for (population, idx) in self.index.iter() {
            let entry = freq.get(*idx).ok_or_else(|| {
                AnnotationError::SchemaViolation(format!(
                    "frequency array has {} entries but {} is at index {idx}",
                    freq.len(),
                    population.label()
                ))
            })?;

            let af = match entry.af {
                Some(af) if af.is_nan() => None,
                Some(af) if !(0.0..=1.0).contains(&af) => {
                    return Err(AnnotationError::SchemaViolation(format!(
                        "allele frequency {af} for {} is outside [0, 1]",
                        population.label()
                    )));
                }
                other => other,
            };

            frequencies.af.insert(*population, af);
            frequencies.maf.insert(*population, af.map(af_to_maf));
        }

        Ok(frequencies)
    }
}
