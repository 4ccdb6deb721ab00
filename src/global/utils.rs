use std::path::PathBuf;
use directories::{BaseDirs, ProjectDirs};
use crate::error::{InstallerError, Result};

pub fn get_global_config_dir() -> Result<PathBuf> {
    let (config_dir, _) = get_global_dirs()?;
    Ok(config_dir)
}

pub fn get_global_data_dir() -> Result<PathBuf> {
    let (_, data_dir) = get_global_dirs()?;
    Ok(data_dir)
}

pub fn get_global_dirs() -> Result<(PathBuf, PathBuf)> {
    let proj_dirs = ProjectDirs::from("org", "opencv", "opencv-installer")
        .ok_or_else(|| InstallerError::Config("Could not get project directories".to_string()))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    let data_dir = proj_dirs.data_dir().to_path_buf();

    Ok((config_dir, data_dir))
}

pub fn get_home_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| InstallerError::Config("Could not determine the home directory".to_string()))?;
    Ok(base_dirs.home_dir().to_path_buf())
}

/// The local maven repository, `~/.m2/repository`.
pub fn get_maven_local_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".m2").join("repository"))
}
