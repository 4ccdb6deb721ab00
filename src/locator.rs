use std::path::PathBuf;
use reqwest::Url;
use crate::artifact::{ArtifactCoordinate, ArtifactKind, GROUP_ID};
use crate::error::{InstallerError, Result};
use crate::platform::Platform;

/// Maps artifacts to their location in the remote repository and in the local cache.
///
/// Both sides share the maven layout
/// `<group>/<artifact>/<version>/<artifact>-<version>[-<classifier>].jar`.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    repository_url: String,
    local_root: PathBuf,
}

impl ArtifactLocator {
    pub fn new(repository_url: impl Into<String>, local_root: impl Into<PathBuf>) -> Self {
        let repository_url = repository_url.into().trim_end_matches('/').to_string();
        Self {
            repository_url,
            local_root: local_root.into(),
        }
    }

    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    pub fn local_root(&self) -> &PathBuf {
        &self.local_root
    }

    /// Computes the coordinate of `kind` for `version`.
    ///
    /// Bindings and native libraries get the platform name as classifier; the other kinds are
    /// platform independent.
    pub fn resolve(&self, kind: ArtifactKind, version: &str, platform: Platform) -> ArtifactCoordinate {
        ArtifactCoordinate {
            group_id: GROUP_ID.to_string(),
            artifact_id: kind.artifact_id().to_string(),
            version: version.to_string(),
            classifier: kind
                .is_platform_specific()
                .then(|| platform.name().to_string()),
        }
    }

    pub fn local_dir(&self, coord: &ArtifactCoordinate) -> PathBuf {
        let mut path = self.local_root.clone();
        path.extend(coord.relative_dir().split('/'));
        path
    }

    pub fn local_path(&self, coord: &ArtifactCoordinate) -> PathBuf {
        self.local_dir(coord).join(coord.jar_name())
    }

    pub fn local_pom_path(&self, coord: &ArtifactCoordinate) -> PathBuf {
        self.local_dir(coord).join(coord.pom_name())
    }

    pub fn remote_url(&self, coord: &ArtifactCoordinate) -> Result<Url> {
        self.remote(&coord.relative_jar_path())
    }

    pub fn remote_pom_url(&self, coord: &ArtifactCoordinate) -> Result<Url> {
        self.remote(&coord.relative_pom_path())
    }

    fn remote(&self, relative: &str) -> Result<Url> {
        let url = format!("{}/{}", self.repository_url, relative);
        Url::parse(&url).map_err(|e| InstallerError::Config(format!("Invalid repository URL {}: {}", url, e)))
    }
}
