use std::path::{Path, PathBuf};
use std::time::Duration;
use reqwest::Url;
use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use crate::artifact::ArtifactCoordinate;
use crate::error::{InstallerError, Result};
use crate::locator::ArtifactLocator;

/// Produces a local copy of an archive, downloading it into the local repository when it is not
/// cached yet.
pub struct ArchiveFetcher {
    locator: ArtifactLocator,
    client: Client,
}

impl ArchiveFetcher {
    /// Only connecting to the repository is bounded by `connect_timeout`. A transfer in progress
    /// runs until it completes unless `transfer_timeout` is set.
    pub fn new(
        locator: ArtifactLocator,
        connect_timeout: Duration,
        transfer_timeout: Option<Duration>,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(transfer_timeout)
            .user_agent(concat!("opencv-installer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InstallerError::Config(format!("Could not build HTTP client: {}", e)))?;
        Ok(Self { locator, client })
    }

    pub fn locator(&self) -> &ArtifactLocator {
        &self.locator
    }

    /// Returns the cached archive for `coord`, fetching the jar and its pom first when needed.
    ///
    /// A repository that cannot be reached or does not have the artifact results in
    /// [`InstallerError::ArtifactNotFound`]. Failures after the artifact was found remotely are
    /// returned as they are.
    pub fn fetch(&self, coord: &ArtifactCoordinate) -> Result<PathBuf> {
        let local = self.locator.local_path(coord);
        let remote = self.locator.remote_url(coord)?;
        debug!("Local = {}", local.display());

        if !local.exists() {
            if self.url_exists(&remote) {
                self.copy_to_local_repository(coord, &remote)?;
            } else {
                debug!("{} is not available", remote);
            }
        }
        if local.exists() {
            info!("Using local file at {}", local.display());
            Ok(local)
        } else {
            Err(InstallerError::ArtifactNotFound {
                remote: remote.to_string(),
                local,
            })
        }
    }

    /// Probes `url` with a HEAD request.
    fn url_exists(&self, url: &Url) -> bool {
        match self.client.head(url.clone()).send() {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Could not reach {}: {}", url, e);
                false
            }
        }
    }

    /// Downloads the jar and its pom. Nothing lands in the local repository unless both
    /// transfers complete, and the pom is moved into place before the jar.
    fn copy_to_local_repository(&self, coord: &ArtifactCoordinate, jar_url: &Url) -> Result<()> {
        let local_dir = self.locator.local_dir(coord);
        std::fs::create_dir_all(&local_dir)?;

        info!("Copying {} to the local maven repository", jar_url);
        let jar = self.download(jar_url, &local_dir)?;
        let pom_url = self.locator.remote_pom_url(coord)?;
        let pom = self.download(&pom_url, &local_dir)?;

        pom.persist(self.locator.local_pom_path(coord)).map_err(|e| e.error)?;
        jar.persist(self.locator.local_path(coord)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Streams `url` into a temporary file inside `dir`. The file is removed again when the
    /// returned handle is dropped without being persisted.
    fn download(&self, url: &Url, dir: &Path) -> Result<NamedTempFile> {
        let download_err = |source: reqwest::Error| InstallerError::Download {
            url: url.to_string(),
            source,
        };
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(download_err)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        let written = response.copy_to(tmp.as_file_mut()).map_err(download_err)?;
        tmp.as_file().sync_all()?;
        debug!("Downloaded {} bytes from {}", written, url);
        Ok(tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use crate::platform::Platform;
    use mockito::{Server, ServerGuard};
    use std::io::Write;
    use std::thread;
    use tempfile::tempdir;

    fn fetcher(root: &Path) -> ArchiveFetcher {
        // port 9 (discard) refuses connections on any machine running the tests
        let locator = ArtifactLocator::new("http://127.0.0.1:9/maven", root);
        ArchiveFetcher::new(locator, Duration::from_secs(1), None).unwrap()
    }

    fn remote_fetcher(server: &ServerGuard, root: &Path, transfer_timeout: Option<Duration>) -> ArchiveFetcher {
        let locator = ArtifactLocator::new(&format!("{}/maven", server.url()), root);
        ArchiveFetcher::new(locator, Duration::from_secs(1), transfer_timeout).unwrap()
    }

    fn headers(fetcher: &ArchiveFetcher) -> ArtifactCoordinate {
        fetcher
            .locator()
            .resolve(ArtifactKind::Headers, "4.5.0", Platform::Linux64)
    }

    fn leftover_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[test]
    fn test_cached_archive_is_used() {
        let dir = tempdir().unwrap();
        let fetcher = fetcher(dir.path());
        let coord = fetcher
            .locator()
            .resolve(ArtifactKind::Headers, "4.5.0", Platform::Linux64);
        let local = fetcher.locator().local_path(&coord);
        std::fs::create_dir_all(local.parent().unwrap()).unwrap();
        std::fs::write(&local, b"cached").unwrap();

        assert_eq!(fetcher.fetch(&coord).unwrap(), local);
    }

    #[test]
    fn test_unreachable_repository_is_not_found() {
        let dir = tempdir().unwrap();
        let fetcher = fetcher(dir.path());
        let coord = fetcher
            .locator()
            .resolve(ArtifactKind::Library, "4.5.0", Platform::Linux64);

        match fetcher.fetch(&coord) {
            Err(InstallerError::ArtifactNotFound { remote, local }) => {
                assert!(remote.ends_with("org/opencv/opencv-java/4.5.0/opencv-java-4.5.0.jar"));
                assert_eq!(local, fetcher.locator().local_path(&coord));
            }
            other => panic!("expected ArtifactNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_remote_artifact_is_not_found() {
        let dir = tempdir().unwrap();
        let mut server = Server::new();
        let fetcher = remote_fetcher(&server, dir.path(), None);
        let coord = headers(&fetcher);
        let jar = format!("/maven/{}", coord.relative_jar_path());
        let head = server.mock("HEAD", jar.as_str()).with_status(404).expect(1).create();
        let get = server.mock("GET", jar.as_str()).expect(0).create();

        match fetcher.fetch(&coord) {
            Err(InstallerError::ArtifactNotFound { remote, local }) => {
                assert_eq!(remote, fetcher.locator().remote_url(&coord).unwrap().to_string());
                assert_eq!(local, fetcher.locator().local_path(&coord));
            }
            other => panic!("expected ArtifactNotFound, got {:?}", other),
        }
        head.assert();
        get.assert();
    }

    #[test]
    fn test_failed_transfer_is_download_error() {
        let dir = tempdir().unwrap();
        let mut server = Server::new();
        let fetcher = remote_fetcher(&server, dir.path(), None);
        let coord = headers(&fetcher);
        let jar = format!("/maven/{}", coord.relative_jar_path());
        server.mock("HEAD", jar.as_str()).with_status(200).create();
        server.mock("GET", jar.as_str()).with_status(500).create();

        match fetcher.fetch(&coord) {
            Err(InstallerError::Download { url, .. }) => assert!(url.ends_with(".jar")),
            other => panic!("expected Download, got {:?}", other),
        }
        assert!(!fetcher.locator().local_path(&coord).exists());
        assert_eq!(leftover_files(&fetcher.locator().local_dir(&coord)), 0);
    }

    #[test]
    fn test_missing_pom_caches_nothing() {
        let dir = tempdir().unwrap();
        let mut server = Server::new();
        let fetcher = remote_fetcher(&server, dir.path(), None);
        let coord = headers(&fetcher);
        let jar = format!("/maven/{}", coord.relative_jar_path());
        let pom = format!("/maven/{}", coord.relative_pom_path());
        server.mock("HEAD", jar.as_str()).with_status(200).create();
        server.mock("GET", jar.as_str()).with_status(200).with_body("jar bytes").create();
        server.mock("GET", pom.as_str()).with_status(404).create();

        match fetcher.fetch(&coord) {
            Err(InstallerError::Download { url, .. }) => assert!(url.ends_with(".pom")),
            other => panic!("expected Download, got {:?}", other),
        }
        // the next run must not find a jar without its pom
        assert!(!fetcher.locator().local_path(&coord).exists());
        assert!(!fetcher.locator().local_pom_path(&coord).exists());
        assert_eq!(leftover_files(&fetcher.locator().local_dir(&coord)), 0);
    }

    #[test]
    fn test_slow_transfer_outlives_connect_timeout() {
        let dir = tempdir().unwrap();
        let mut server = Server::new();
        let fetcher = remote_fetcher(&server, dir.path(), None);
        let coord = headers(&fetcher);
        let jar = format!("/maven/{}", coord.relative_jar_path());
        let pom = format!("/maven/{}", coord.relative_pom_path());
        server.mock("HEAD", jar.as_str()).with_status(200).create();
        server
            .mock("GET", jar.as_str())
            .with_status(200)
            .with_chunked_body(|w| {
                for byte in b"slow" {
                    w.write_all(&[*byte])?;
                    thread::sleep(Duration::from_millis(600));
                }
                Ok(())
            })
            .create();
        server.mock("GET", pom.as_str()).with_status(200).with_body("<project/>").create();

        let local = fetcher.fetch(&coord).unwrap();
        assert_eq!(std::fs::read(&local).unwrap(), b"slow");
        assert_eq!(std::fs::read(fetcher.locator().local_pom_path(&coord)).unwrap(), b"<project/>");
    }

    #[test]
    fn test_transfer_timeout_bounds_download() {
        let dir = tempdir().unwrap();
        let mut server = Server::new();
        let fetcher = remote_fetcher(&server, dir.path(), Some(Duration::from_millis(500)));
        let coord = headers(&fetcher);
        let jar = format!("/maven/{}", coord.relative_jar_path());
        server.mock("HEAD", jar.as_str()).with_status(200).create();
        server
            .mock("GET", jar.as_str())
            .with_status(200)
            .with_chunked_body(|w| {
                for byte in b"slow" {
                    w.write_all(&[*byte])?;
                    thread::sleep(Duration::from_millis(600));
                }
                Ok(())
            })
            .create();

        assert!(matches!(fetcher.fetch(&coord), Err(InstallerError::Download { .. })));
        assert!(!fetcher.locator().local_path(&coord).exists());
    }
}
