use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use vannot_core::{AnnotationError, Result};

/// Prefix of dataset-level population keys in the frequency index.
pub const POPULATION_KEY_PREFIX: &str = "gnomad_";

/// Suffixes of sub-stat keys that are never populations of interest.
const EXCLUDED_KEY_SUFFIXES: [&str; 3] = ["_raw", "_male", "_female"];

///
/// Closed set of gnomAD v2.1 population codes (genomes and exomes).
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Population {
    Afr,
    Amr,
    Asj,
    Eas,
    EasJpn,
    EasKor,
    EasOea,
    Fin,
    Nfe,
    NfeBgr,
    NfeEst,
    NfeNwe,
    NfeOnf,
    NfeSeu,
    NfeSwe,
    Oth,
    Sas,
}

impl Population {
    pub const ALL: [Population; 17] = [
        Population::Afr,
        Population::Amr,
        Population::Asj,
        Population::Eas,
        Population::EasJpn,
        Population::EasKor,
        Population::EasOea,
        Population::Fin,
        Population::Nfe,
        Population::NfeBgr,
        Population::NfeEst,
        Population::NfeNwe,
        Population::NfeOnf,
        Population::NfeSeu,
        Population::NfeSwe,
        Population::Oth,
        Population::Sas,
    ];

    /// The populations reported by gnomAD v2.1 genomes.
    pub fn genome_defaults() -> Vec<Population> {
        vec![
            Population::Afr,
            Population::Amr,
            Population::Asj,
            Population::Eas,
            Population::Fin,
            Population::Nfe,
            Population::NfeEst,
            Population::NfeNwe,
            Population::NfeOnf,
            Population::NfeSeu,
            Population::Oth,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Population::Afr => "afr",
            Population::Amr => "amr",
            Population::Asj => "asj",
            Population::Eas => "eas",
            Population::EasJpn => "eas_jpn",
            Population::EasKor => "eas_kor",
            Population::EasOea => "eas_oea",
            Population::Fin => "fin",
            Population::Nfe => "nfe",
            Population::NfeBgr => "nfe_bgr",
            Population::NfeEst => "nfe_est",
            Population::NfeNwe => "nfe_nwe",
            Population::NfeOnf => "nfe_onf",
            Population::NfeSeu => "nfe_seu",
            Population::NfeSwe => "nfe_swe",
            Population::Oth => "oth",
            Population::Sas => "sas",
        }
    }

    /// Key of this population in the dataset metadata, e.g. `gnomad_afr`.
    pub fn label(&self) -> String {
        format!("{POPULATION_KEY_PREFIX}{}", self.code())
    }
}

impl FromStr for Population {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.strip_prefix(POPULATION_KEY_PREFIX).unwrap_or(s);
        Population::ALL
            .iter()
            .find(|p| p.code() == code)
            .copied()
            .ok_or_else(|| AnnotationError::InvalidConfig(format!("unknown population code '{s}'")))
    }
}

impl TryFrom<String> for Population {
    type Error = AnnotationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Population> for String {
    fn from(value: Population) -> Self {
        value.label()
    }
}

impl Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

///
/// Positions of the populations of interest inside each record's frequency array.
///
/// Resolved once per dataset from its metadata, so record processing never
/// probes keys.
///
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationIndex {
    entries: Vec<(Population, usize)>,
}

impl PopulationIndex {
    ///
    /// Look up every population of interest in the dataset's frequency index.
    ///
    /// # Arguments
    /// - populations: populations of interest
    /// - freq_index: population key -> array index, from the dataset metadata
    ///
    /// # Returns
    /// - the resolved index, or [`AnnotationError::UnknownPopulation`] naming every
    ///   population the dataset does not provide
    pub fn resolve(
        populations: &[Population],
        freq_index: &BTreeMap<String, usize>,
    ) -> Result<Self> {
        if populations.is_empty() {
            return Err(AnnotationError::InvalidConfig(
                "at least one population of interest is required".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(populations.len());
        let mut missing = Vec::new();

        for population in populations {
            match freq_index.get(&population.label()) {
                Some(idx) => entries.push((*population, *idx)),
                None => missing.push(population.label()),
            }
        }

        if !missing.is_empty() {
            return Err(AnnotationError::UnknownPopulation(missing));
        }

        entries.sort_unstable();
        entries.dedup();

        Ok(PopulationIndex { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Population, usize)> {
        self.entries.iter()
    }

    pub fn populations(&self) -> Vec<Population> {
        self.entries.iter().map(|(p, _)| *p).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

///
/// Filter the keys of a frequency index down to usable populations.
///
/// Keeps `gnomad_*` keys and drops the `_raw` (pre sample-QC), `_male` and
/// `_female` sub-stats. The result is sorted.
///
pub fn discover_population_keys<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut populations: Vec<String> = keys
        .into_iter()
        .filter(|key| key.starts_with(POPULATION_KEY_PREFIX))
        .filter(|key| !EXCLUDED_KEY_SUFFIXES.iter().any(|suffix| key.ends_with(suffix)))
        .cloned()
        .collect();
    populations.sort();
    populations
}
