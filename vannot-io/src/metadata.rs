use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use vannot_annotate::{Population, PopulationIndex, discover_population_keys};
use vannot_core::utils::get_dynamic_reader;

use crate::errors::{DataError, Result};

///
/// Dataset-level metadata delivered once alongside the variant source.
///
/// Only the frequency index is read; other global fields are ignored.
///
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub freq_index_dict: BTreeMap<String, usize>,
}

impl DatasetMetadata {
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        serde_json::from_reader(reader).map_err(|e| DataError::Metadata {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })
    }

    /// Population keys an operator can put in the run configuration.
    pub fn population_keys(&self) -> Vec<String> {
        discover_population_keys(self.freq_index_dict.keys())
    }

    pub fn resolve(&self, populations: &[Population]) -> Result<PopulationIndex> {
        Ok(PopulationIndex::resolve(populations, &self.freq_index_dict)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    #[rstest]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"freq_index_dict": {{"gnomad": 0, "gnomad_raw": 1, "gnomad_afr": 2, "gnomad_afr_female": 3}},
               "popmax_index_dict": {{"gnomad": 0}}}}"#
        )
        .unwrap();

        let metadata = DatasetMetadata::from_path(file.path()).unwrap();
        assert_eq!(metadata.freq_index_dict.len(), 4);
        assert_eq!(metadata.population_keys(), vec!["gnomad_afr".to_string()]);

        let index = metadata.resolve(&[Population::Afr]).unwrap();
        assert_eq!(index.len(), 1);
        assert!(metadata.resolve(&[Population::Sas]).is_err());
    }

    #[rstest]
    fn test_missing_frequency_index() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"popmax_index_dict": {{}}}}"#).unwrap();
        assert!(matches!(
            DatasetMetadata::from_path(file.path()),
            Err(DataError::Metadata { .. })
        ));
    }
}
