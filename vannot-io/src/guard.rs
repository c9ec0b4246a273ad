use std::path::{Path, PathBuf};

use tracing::warn;

use vannot_core::AnnotationError;

use crate::errors::Result;

///
/// Protects existing output artifacts from accidental reruns.
///
/// [`OutputGuard::check`] runs before any input is read; [`OutputGuard::clear`]
/// removes old artifacts only right before the new ones are written.
///
#[derive(Debug, Clone)]
pub struct OutputGuard {
    targets: Vec<PathBuf>,
    overwrite: bool,
}

impl OutputGuard {
    pub fn new(targets: Vec<PathBuf>, overwrite: bool) -> Self {
        OutputGuard { targets, overwrite }
    }

    fn existing(&self) -> impl Iterator<Item = &Path> {
        self.targets
            .iter()
            .map(PathBuf::as_path)
            .filter(|path| path.exists())
    }

    /// Fail with [`AnnotationError::OutputAlreadyExists`] unless overwriting is allowed.
    pub fn check(&self) -> Result<()> {
        if self.overwrite {
            return Ok(());
        }
        match self.existing().next() {
            Some(path) => Err(AnnotationError::OutputAlreadyExists(path.to_path_buf()).into()),
            None => Ok(()),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.check()?;
        for path in self.existing() {
            warn!("Overwriting existing output {:?}", path);
            if path.is_dir() {
                std::fs::remove_dir_all(path)?;
            } else {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
