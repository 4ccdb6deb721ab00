//! Unpacking downloaded archives into the scratch area.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use crate::artifact::ArtifactCoordinate;
use crate::error::{InstallerError, Result};

/// Archive entries under this directory are jar metadata and never installed.
pub const METADATA_DIR: &str = "META-INF";

/// Unzips `archive` into `<unzipped_dir>/<archive stem>/` and returns that directory.
///
/// Metadata entries and entries whose path would escape the destination are skipped. Files that
/// already exist at a destination path are replaced.
pub fn extract(archive: &Path, unzipped_dir: &Path) -> Result<PathBuf> {
    let stem = archive
        .file_stem()
        .ok_or_else(|| InstallerError::extraction(archive, io::Error::new(io::ErrorKind::InvalidInput, "archive has no file name")))?;
    let dest_dir = unzipped_dir.join(stem);
    debug!("Unzipping {} into {}", archive.display(), dest_dir.display());

    unzip_into(archive, &dest_dir).map_err(|e| InstallerError::extraction(archive, e))?;
    Ok(dest_dir)
}

fn unzip_into(archive: &Path, dest_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dest_dir)?;
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => path,
            None => {
                warn!("Skipping unsafe path in {}: {}", archive.display(), entry.name());
                continue;
            }
        };
        if is_metadata(&entry_path) {
            continue;
        }

        let dst = dest_dir.join(&entry_path);
        if entry.is_dir() {
            fs::create_dir_all(&dst)?;
            continue;
        }
        debug!("  File: {} -> {}", entry_path.display(), dst.display());
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        if dst.is_dir() {
            return Err(directory_in_the_way(&dst, &entry_path));
        }
        if dst.exists() {
            fs::remove_file(&dst)?;
        }
        let mut out = File::create(&dst)?;
        io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}

fn directory_in_the_way(dst: &Path, entry: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} is a directory, cannot unpack file entry {}", dst.display(), entry.display()),
    )
}

fn is_metadata(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == METADATA_DIR))
}

/// Copies a jar that is installed as-is into `<unzipped_dir>/<artifact>-<version>/` and returns
/// that directory.
pub fn stage_jar(archive: &Path, coord: &ArtifactCoordinate, unzipped_dir: &Path) -> Result<PathBuf> {
    let base = format!("{}-{}", coord.artifact_id, coord.version);
    let dest_dir = unzipped_dir.join(&base);
    let dst = dest_dir.join(format!("{}.jar", base));

    let stage = || -> io::Result<()> {
        fs::create_dir_all(&dest_dir)?;
        if dst.is_dir() {
            return Err(directory_in_the_way(&dst, Path::new(&format!("{}.jar", base))));
        }
        if dst.exists() {
            fs::remove_file(&dst)?;
        }
        fs::copy(archive, &dst)?;
        Ok(())
    };
    stage().map_err(|e| InstallerError::extraction(archive, e))?;
    debug!("Staged {} at {}", archive.display(), dst.display());
    Ok(dest_dir)
}
