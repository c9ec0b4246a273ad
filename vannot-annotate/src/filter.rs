use vannot_core::{AnnotationError, Result};

use crate::frequency::Frequencies;

/// MAF threshold used when none is configured.
pub const DEFAULT_MAF_THRESHOLD: f64 = 0.001;

///
/// Keeps variants that carry no QC failure flags.
///
/// An empty filter set passes. A record with no filter field at all fails:
/// absence of QC information is not treated as a pass.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityFilter;

impl QualityFilter {
    pub fn passes(&self, filters: Option<&[String]>) -> bool {
        matches!(filters, Some(flags) if flags.is_empty())
    }
}

///
/// Keeps variants that are at or above the MAF threshold in at least one
/// population of interest.
///
#[derive(Debug, Clone, Copy)]
pub struct FrequencyFilter {
    threshold: f64,
}

impl FrequencyFilter {
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || !(0.0..=0.5).contains(&threshold) {
            return Err(AnnotationError::InvalidConfig(format!(
                "maf threshold must be within [0, 0.5], got {threshold}"
            )));
        }
        Ok(FrequencyFilter { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Missing MAFs are ignored; a variant with no MAF at all fails.
    pub fn passes(&self, frequencies: &Frequencies) -> bool {
        frequencies
            .maf
            .values()
            .flatten()
            .any(|maf| *maf >= self.threshold)
    }
}

impl Default for FrequencyFilter {
    fn default() -> Self {
        FrequencyFilter {
            threshold: DEFAULT_MAF_THRESHOLD,
        }
    }
}
