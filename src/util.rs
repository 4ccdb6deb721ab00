use std::fs;
use std::path::{Component, Path, PathBuf};
use semver::Version;
use tracing::debug;
use walkdir::WalkDir;
use crate::error::{InstallerError, Result};

/// Counts of what a [`merge_copy`] did to the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Files that did not exist at the destination.
    pub copied: usize,
    /// Existing files that were deleted and replaced.
    pub replaced: usize,
    /// Existing files left untouched.
    pub skipped: usize,
}

/// Recursively copies the contents of `src` into `dst`, creating directories as needed.
///
/// Existing directories are merged rather than replaced. An existing file is deleted and replaced
/// when `overwrite` is set and left untouched otherwise.
pub fn merge_copy(src: &Path, dst: &Path, overwrite: bool) -> Result<MergeStats> {
    debug!("Copying all files from {} into {}", src.display(), dst.display());
    let mut stats = MergeStats::default();
    fs::create_dir_all(dst).map_err(|e| InstallerError::copy(src, dst, e))?;

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            InstallerError::copy(path, dst, e.into())
        })?;
        let from = entry.path();
        let relative = from.strip_prefix(src).unwrap_or(from);
        let to = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&to).map_err(|e| InstallerError::copy(from, &to, e))?;
            continue;
        }
        if to.is_dir() {
            let collision = std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} is a directory, cannot replace it with file {}", to.display(), relative.display()),
            );
            return Err(InstallerError::copy(from, &to, collision));
        }
        if to.exists() {
            if !overwrite {
                debug!("  Keeping existing {}", to.display());
                stats.skipped += 1;
                continue;
            }
            debug!("  Destination file {} already exists, overwriting", to.display());
            fs::remove_file(&to).map_err(|e| InstallerError::copy(from, &to, e))?;
            stats.replaced += 1;
        } else {
            stats.copied += 1;
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallerError::copy(from, &to, e))?;
        }
        fs::copy(from, &to).map_err(|e| InstallerError::copy(from, &to, e))?;
    }
    Ok(stats)
}

/// Makes `path` absolute against the current directory.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Maps an absolute install location below `staging_dir`, e.g. `/usr/local/lib` becomes
/// `<staging_dir>/usr/local/lib`.
pub fn staged_location(staging_dir: &Path, location: &Path) -> PathBuf {
    let mut staged = staging_dir.to_path_buf();
    for component in location.components() {
        match component {
            Component::Normal(part) => staged.push(part),
            Component::ParentDir => staged.push(".."),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }
    staged
}

/// Validates whether a version string is a valid SemVer version.
/// Ignores a trailing `-suffix`, so `3.1.0-1` is accepted.
pub fn is_valid_version(version: &str) -> bool {
    let version = version.split('-').next().unwrap_or(version);
    Version::parse(version).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_merge_copy_into_empty_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        write(&src.join("lib/libopencv.so"), "so");
        write(&src.join("README"), "readme");

        let stats = merge_copy(&src, &dst, false).unwrap();

        assert_eq!(stats, MergeStats { copied: 2, replaced: 0, skipped: 0 });
        assert_eq!(fs::read_to_string(dst.join("lib/libopencv.so")).unwrap(), "so");
        assert_eq!(fs::read_to_string(dst.join("README")).unwrap(), "readme");
    }

    #[test]
    fn test_merge_copy_keeps_existing_files() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        write(&src.join("include/opencv.hpp"), "new");
        write(&src.join("include/core.hpp"), "core");
        write(&dst.join("include/opencv.hpp"), "user edited");
        write(&dst.join("include/unrelated.h"), "mine");

        let stats = merge_copy(&src, &dst, false).unwrap();

        assert_eq!(stats, MergeStats { copied: 1, replaced: 0, skipped: 1 });
        assert_eq!(fs::read_to_string(dst.join("include/opencv.hpp")).unwrap(), "user edited");
        assert_eq!(fs::read_to_string(dst.join("include/core.hpp")).unwrap(), "core");
        assert_eq!(fs::read_to_string(dst.join("include/unrelated.h")).unwrap(), "mine");
    }

    #[test]
    fn test_merge_copy_overwrites() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        write(&src.join("include/opencv.hpp"), "new");
        write(&dst.join("include/opencv.hpp"), "stale");
        write(&dst.join("include/unrelated.h"), "mine");

        let stats = merge_copy(&src, &dst, true).unwrap();

        assert_eq!(stats, MergeStats { copied: 0, replaced: 1, skipped: 0 });
        assert_eq!(fs::read_to_string(dst.join("include/opencv.hpp")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst.join("include/unrelated.h")).unwrap(), "mine");
    }

    #[test]
    fn test_merge_copy_names_directory_in_the_way() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        write(&src.join("lib/libopencv.so"), "so");
        fs::create_dir_all(dst.join("lib/libopencv.so")).unwrap();

        for overwrite in [false, true] {
            let err = merge_copy(&src, &dst, overwrite).unwrap_err();
            assert!(matches!(err, InstallerError::Copy { .. }));
            assert!(err.to_string().contains("is a directory"));
            assert!(dst.join("lib/libopencv.so").is_dir());
        }
    }

    #[test]
    fn test_merge_copy_missing_source() {
        let dir = tempdir().unwrap();
        let result = merge_copy(&dir.path().join("missing"), &dir.path().join("dst"), false);
        assert!(matches!(result, Err(InstallerError::Copy { .. })));
    }

    #[test]
    fn test_staged_location() {
        assert_eq!(
            staged_location(Path::new("install"), Path::new("/usr/local/lib")),
            PathBuf::from("install/usr/local/lib")
        );
    }

    #[test]
    fn test_absolutize_keeps_absolute_paths() {
        let dir = tempdir().unwrap();
        assert_eq!(absolutize(dir.path()).unwrap(), dir.path());
        assert!(absolutize(Path::new("relative")).unwrap().is_absolute());
    }

    #[test]
    fn test_is_valid_version_valid() {
        assert!(is_valid_version("4.5.0"));
        assert!(is_valid_version("3.1.0-1")); // suffix is ignored
    }

    #[test]
    fn test_is_valid_version_invalid() {
        assert!(!is_valid_version("4.5")); // incomplete semver
        assert!(!is_valid_version("latest"));
    }
}
