use std::path::Path;
use tempfile::TempDir;
use crate::error::Result;

/// Process-lifetime staging area for extracted archives.
///
/// Holds a temporary root directory with an `unzipped` directory inside it. Everything is removed
/// when the area is dropped.
#[derive(Debug)]
pub struct ScratchArea {
    // dropped before `root`
    unzipped: TempDir,
    root: TempDir,
}

impl ScratchArea {
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new().prefix("opencv-installer").tempdir()?;
        let unzipped = tempfile::Builder::new().prefix("unzipped").tempdir_in(root.path())?;
        Ok(Self { unzipped, root })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Directory that extracted and staged artifacts are written under.
    pub fn unzipped_dir(&self) -> &Path {
        self.unzipped.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_and_cleanup() {
        let scratch = ScratchArea::new().unwrap();
        let root = scratch.root().to_path_buf();
        assert!(scratch.unzipped_dir().starts_with(&root));
        assert!(scratch.unzipped_dir().is_dir());

        drop(scratch);
        assert!(!root.exists());
    }
}
