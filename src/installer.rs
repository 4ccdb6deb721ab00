//! The install pipeline: check, resolve, fetch, extract, merge and record, once per artifact.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};
use crate::artifact::ArtifactKind;
use crate::config::Config;
use crate::error::{InstallerError, Result};
use crate::extractor::{extract, stage_jar};
use crate::fetcher::ArchiveFetcher;
use crate::locator::ArtifactLocator;
use crate::platform::Platform;
use crate::scratch::ScratchArea;
use crate::state::{InstallStateStore, JsonStateStore};
use crate::util::{absolutize, merge_copy, staged_location, MergeStats};

/// Stages of a single install, in order. Any stage may end in [`InstallStage::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStage {
    NotStarted,
    Checked,
    Resolved,
    Fetched,
    Extracted,
    Merged,
    Recorded,
    Failed,
}

impl InstallStage {
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::Checked),
            Self::Checked => Some(Self::Resolved),
            Self::Resolved => Some(Self::Fetched),
            Self::Fetched => Some(Self::Extracted),
            Self::Extracted => Some(Self::Merged),
            Self::Merged => Some(Self::Recorded),
            Self::Recorded | Self::Failed => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Recorded | Self::Failed)
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Checked => "checking install state",
            Self::Resolved => "resolving artifact",
            Self::Fetched => "fetching archive",
            Self::Extracted => "extracting archive",
            Self::Merged => "copying files",
            Self::Recorded => "recording install",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One artifact to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub kind: ArtifactKind,
    /// Target directory. `None` uses the platform default for `kind`.
    pub location: Option<PathBuf>,
    pub overwrite: bool,
}

impl InstallRequest {
    pub fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            location: None,
            overwrite: false,
        }
    }

    pub fn location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Files were copied into `location`.
    Installed { location: PathBuf, stats: MergeStats },
    /// A previous install was recorded and overwriting was not requested.
    Skipped { location: PathBuf },
}

/// An install that stopped before completing.
#[derive(Debug)]
pub struct InstallFailure {
    pub kind: ArtifactKind,
    /// The stage that was being attempted.
    pub stage: InstallStage,
    pub error: InstallerError,
}

impl fmt::Display for InstallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed while {}: {}", self.kind, self.stage, self.error)
    }
}

impl std::error::Error for InstallFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[derive(Debug)]
pub struct InstallReport {
    pub kind: ArtifactKind,
    pub result: std::result::Result<InstallOutcome, InstallFailure>,
}

/// Tracks the stage of one install.
struct InstallRun {
    kind: ArtifactKind,
    stage: InstallStage,
}

impl InstallRun {
    fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            stage: InstallStage::NotStarted,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            debug!("{}: {} -> {}", self.kind, self.stage, next);
            self.stage = next;
        }
    }

    fn fail(self, error: InstallerError) -> InstallFailure {
        let attempted = self.stage.next().unwrap_or(self.stage);
        debug!("{}: {} -> {}", self.kind, self.stage, InstallStage::Failed);
        InstallFailure {
            kind: self.kind,
            stage: attempted,
            error,
        }
    }
}

/// Installs OpenCV artifacts of one version for one platform.
///
/// When the platform was chosen explicitly with [`Installer::with_platform`] the installer runs in
/// override mode: artifacts go below the staging directory instead of system locations, and the
/// install state is neither consulted nor updated.
pub struct Installer {
    version: String,
    platform: Platform,
    platform_override: bool,
    overwrite: bool,
    staging_dir: PathBuf,
    fetcher: ArchiveFetcher,
    scratch: ScratchArea,
    state: Box<dyn InstallStateStore>,
}

impl Installer {
    pub fn new(
        version: impl Into<String>,
        platform: Platform,
        fetcher: ArchiveFetcher,
        state: Box<dyn InstallStateStore>,
    ) -> Result<Self> {
        Ok(Self {
            version: version.into(),
            platform,
            platform_override: false,
            overwrite: false,
            staging_dir: PathBuf::from("install"),
            fetcher,
            scratch: ScratchArea::new()?,
            state,
        })
    }

    /// Builds an installer for `platform` from the user's configuration.
    pub fn from_config(config: &Config, platform: Platform, version: impl Into<String>) -> Result<Self> {
        let locator = ArtifactLocator::new(&config.repository_url, &config.local_repository);
        let fetcher = ArchiveFetcher::new(
            locator,
            Duration::from_secs(config.connect_timeout_secs),
            config.transfer_timeout_secs.map(Duration::from_secs),
        )?;
        let state = JsonStateStore::open(&config.state_file)?;
        Ok(Self::new(version, platform, fetcher, Box::new(state))?.staging_dir(&config.staging_dir))
    }

    /// Installs artifacts for `platform` instead of the detected one.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self.platform_override = true;
        self
    }

    pub fn staging_dir(mut self, staging_dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    /// Overwrites existing files for every request.
    pub fn overwrite_existing_files(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_platform_override(&self) -> bool {
        self.platform_override
    }

    /// Where `kind` goes when the caller does not name a location.
    pub fn default_location(&self, kind: ArtifactKind) -> PathBuf {
        self.platform.default_location(kind)
    }

    pub fn is_installed(&self, kind: ArtifactKind, location: Option<&Path>) -> Result<bool> {
        self.state.is_installed(kind, &self.version, location)
    }

    pub fn install_library(&mut self, location: Option<PathBuf>) -> std::result::Result<InstallOutcome, InstallFailure> {
        self.install_kind(ArtifactKind::Library, location)
    }

    pub fn install_bindings(&mut self, location: Option<PathBuf>) -> std::result::Result<InstallOutcome, InstallFailure> {
        self.install_kind(ArtifactKind::Bindings, location)
    }

    pub fn install_headers(&mut self, location: Option<PathBuf>) -> std::result::Result<InstallOutcome, InstallFailure> {
        self.install_kind(ArtifactKind::Headers, location)
    }

    pub fn install_natives(&mut self, location: Option<PathBuf>) -> std::result::Result<InstallOutcome, InstallFailure> {
        self.install_kind(ArtifactKind::NativeLibraries, location)
    }

    /// Installs `kind` again, replacing every file it previously placed.
    pub fn reinstall(&mut self, kind: ArtifactKind, location: Option<PathBuf>) -> std::result::Result<InstallOutcome, InstallFailure> {
        let request = InstallRequest {
            kind,
            location,
            overwrite: true,
        };
        self.install(&request)
    }

    fn install_kind(&mut self, kind: ArtifactKind, location: Option<PathBuf>) -> std::result::Result<InstallOutcome, InstallFailure> {
        let request = InstallRequest {
            kind,
            location,
            overwrite: self.overwrite,
        };
        self.install(&request)
    }

    /// Runs every request in order. A failed request is logged and the rest still run, unless the
    /// error is fatal, in which case it is returned.
    pub fn install_all(&mut self, requests: &[InstallRequest]) -> Result<Vec<InstallReport>> {
        let mut reports = Vec::with_capacity(requests.len());
        for request in requests {
            match self.install(request) {
                Err(failure) if failure.error.is_fatal() => return Err(failure.error),
                result => reports.push(InstallReport {
                    kind: request.kind,
                    result,
                }),
            }
        }
        Ok(reports)
    }

    pub fn install(&mut self, request: &InstallRequest) -> std::result::Result<InstallOutcome, InstallFailure> {
        let mut run = InstallRun::new(request.kind);
        match self.run(request, &mut run) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let failure = run.fail(err);
                error!("{}", failure);
                Err(failure)
            }
        }
    }

    fn run(&mut self, request: &InstallRequest, run: &mut InstallRun) -> Result<InstallOutcome> {
        let kind = request.kind;
        let overwrite = request.overwrite || self.overwrite;
        let location = match &request.location {
            Some(location) => absolutize(location)?,
            None => absolutize(&self.default_location(kind))?,
        };
        info!("Installing {} to {}", kind, location.display());

        if !self.platform_override && self.state.is_installed(kind, &self.version, Some(&location))? {
            info!(
                "Artifacts for the version {} {} have already been installed!",
                self.version, kind
            );
            if !overwrite {
                run.advance();
                return Ok(InstallOutcome::Skipped { location });
            }
        }
        run.advance();

        let install_location = if self.platform_override {
            staged_location(&self.staging_dir, &location)
        } else {
            location.clone()
        };
        let coord = self.fetcher.locator().resolve(kind, &self.version, self.platform);
        debug!("Resolved {} to {}", kind, coord);
        run.advance();

        let archive = self.fetcher.fetch(&coord)?;
        run.advance();

        let unzipped = if kind.needs_extraction() {
            extract(&archive, self.scratch.unzipped_dir())?
        } else {
            stage_jar(&archive, &coord, self.scratch.unzipped_dir())?
        };
        run.advance();

        let stats = merge_copy(&unzipped, &install_location, overwrite)?;
        info!(
            "Copied {} new and {} replaced file(s) into {} ({} kept)",
            stats.copied,
            stats.replaced,
            install_location.display(),
            stats.skipped
        );
        run.advance();

        if !self.platform_override {
            self.state.record_success(kind, &self.version, Some(&location))?;
        }
        run.advance();

        Ok(InstallOutcome::Installed {
            location: install_location,
            stats,
        })
    }
}
