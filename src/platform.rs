//! Platform identification and the default install locations of every supported platform.
//!
//! A [`Platform`] is the `<os>-<arch>` pair OpenCV artifacts are built for. Its canonical name is
//! used both to look it up and as the maven classifier of platform-specific artifacts.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use crate::artifact::ArtifactKind;
use crate::error::{InstallerError, Result};
use crate::global::utils::get_home_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Linux,
    Osx,
    Windows,
}

/// The closed set of platforms OpenCV artifacts are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux32,
    Linux64,
    /// ARM Linux, soft float ABI.
    LinuxArm,
    /// ARM Linux, hard float ABI.
    LinuxArmHf,
    Osx64,
    Windows32,
    Windows64,
}

impl Platform {
    pub const fn all() -> &'static [Platform] {
        &[
            Platform::Linux32,
            Platform::Linux64,
            Platform::LinuxArm,
            Platform::LinuxArmHf,
            Platform::Osx64,
            Platform::Windows32,
            Platform::Windows64,
        ]
    }

    /// Canonical `<os>-<arch>` name. Doubles as the repository classifier.
    pub const fn name(self) -> &'static str {
        match self {
            Platform::Linux32 => "linux-x86",
            Platform::Linux64 => "linux-x86_64",
            Platform::LinuxArm => "linux-arm",
            Platform::LinuxArmHf => "linux-armhf",
            Platform::Osx64 => "osx-x86_64",
            Platform::Windows32 => "windows-x86",
            Platform::Windows64 => "windows-x86_64",
        }
    }

    pub const fn family(self) -> OsFamily {
        match self {
            Platform::Linux32 | Platform::Linux64 | Platform::LinuxArm | Platform::LinuxArmHf => {
                OsFamily::Linux
            }
            Platform::Osx64 => OsFamily::Osx,
            Platform::Windows32 | Platform::Windows64 => OsFamily::Windows,
        }
    }

    /// Default install location for `kind`, resolving `~` against the current user's home.
    pub fn default_location(self, kind: ArtifactKind) -> PathBuf {
        let home = get_home_dir().unwrap_or_else(|_| PathBuf::from("."));
        self.default_location_in(kind, &home)
    }

    /// Default install location for `kind` with an explicit home directory.
    ///
    /// Linux and OS X install the Java jar into the working directory.
    pub fn default_location_in(self, kind: ArtifactKind, home: &Path) -> PathBuf {
        match (self.family(), kind) {
            (OsFamily::Linux | OsFamily::Osx, ArtifactKind::Library) => PathBuf::from("."),
            (OsFamily::Linux, ArtifactKind::Bindings) => PathBuf::from("/usr/local/lib"),
            (OsFamily::Osx, ArtifactKind::Bindings) => home.join("Library").join("Java").join("Extensions"),
            (OsFamily::Linux | OsFamily::Osx, ArtifactKind::Headers) => PathBuf::from("/usr/local/include"),
            (OsFamily::Linux | OsFamily::Osx, ArtifactKind::NativeLibraries) => PathBuf::from("/usr/local/lib"),
            (OsFamily::Windows, kind) => {
                let dir = match kind {
                    ArtifactKind::Library => "java",
                    ArtifactKind::Bindings => "jni",
                    ArtifactKind::Headers => "include",
                    ArtifactKind::NativeLibraries => "lib",
                };
                home.join("OpenCV").join(dir)
            }
        }
    }
}

pub fn is_linux(platform: Platform) -> bool {
    platform.family() == OsFamily::Linux
}

pub fn is_osx(platform: Platform) -> bool {
    platform.family() == OsFamily::Osx
}

pub fn is_windows(platform: Platform) -> bool {
    platform.family() == OsFamily::Windows
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        Platform::all()
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| InstallerError::UnsupportedPlatform(format!("Unknown or unsupported platform: {}", s)))
    }
}

/// Maps an OS name to one of `windows`, `osx` or `linux`.
pub fn classify_os(os_name: &str) -> Result<&'static str> {
    let os_name = os_name.to_lowercase();
    if os_name.contains("windows") {
        Ok("windows")
    } else if os_name.contains("mac") {
        Ok("osx")
    } else if os_name.contains("linux") {
        Ok("linux")
    } else {
        Err(InstallerError::UnsupportedPlatform(format!("Unsupported OS: {}", os_name)))
    }
}

/// Maps an architecture name to one of `x86`, `x86_64`, `arm` or `armhf`.
pub fn classify_arch(arch: &str) -> Result<&'static str> {
    match arch {
        "i386" | "x86" => Ok("x86"),
        "x86_64" | "amd64" => Ok("x86_64"),
        "arm" => Ok("arm"),
        "armhf" => Ok("armhf"),
        _ => Err(InstallerError::UnsupportedPlatform(format!("Unsupported architecture: {}", arch))),
    }
}

/// Resolves an (OS name, architecture) pair to a supported platform.
pub fn classify(os_name: &str, arch: &str) -> Result<Platform> {
    let name = format!("{}-{}", classify_os(os_name)?, classify_arch(arch)?);
    name.parse()
}

fn host_os_name() -> &'static str {
    std::env::consts::OS
}

fn host_arch() -> &'static str {
    if cfg!(all(target_arch = "arm", target_abi = "eabihf")) {
        "armhf"
    } else {
        std::env::consts::ARCH
    }
}

/// Detects the platform the installer runs on.
///
/// The result is computed on the first call to [`PlatformDetector::detect`] and reused afterwards.
/// Construct one detector at startup and pass it to whatever needs it.
#[derive(Debug)]
pub struct PlatformDetector {
    os_name: String,
    arch: String,
    platform: OnceCell<Platform>,
}

impl Default for PlatformDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformDetector {
    /// A detector for the host this binary was built for.
    pub fn new() -> Self {
        Self::for_host(host_os_name(), host_arch())
    }

    /// A detector that classifies the given OS name and architecture instead of the host's.
    pub fn for_host(os_name: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os_name: os_name.into(),
            arch: arch.into(),
            platform: OnceCell::new(),
        }
    }

    pub fn detect(&self) -> Result<Platform> {
        if let Some(platform) = self.platform.get() {
            return Ok(*platform);
        }
        let platform = classify(&self.os_name, &self.arch)?;
        debug!("Detected platform {} (os: {}, arch: {})", platform, self.os_name, self.arch);
        Ok(*self.platform.get_or_init(|| platform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Platform::all().iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Platform::all().len());
    }

    #[test]
    fn test_parse_round_trip() {
        for platform in Platform::all() {
            assert_eq!(platform.name().parse::<Platform>().unwrap(), *platform);
        }
    }

    #[test]
    fn test_parse_unknown_platform() {
        assert!(matches!(
            "linux-aarch64".parse::<Platform>(),
            Err(InstallerError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn test_classify_known_pairs() {
        assert_eq!(classify("Linux", "amd64").unwrap(), Platform::Linux64);
        assert_eq!(classify("Linux", "i386").unwrap(), Platform::Linux32);
        assert_eq!(classify("linux", "arm").unwrap(), Platform::LinuxArm);
        assert_eq!(classify("linux", "armhf").unwrap(), Platform::LinuxArmHf);
        assert_eq!(classify("Mac OS X", "x86_64").unwrap(), Platform::Osx64);
        assert_eq!(classify("macos", "x86_64").unwrap(), Platform::Osx64);
        assert_eq!(classify("Windows 10", "x86").unwrap(), Platform::Windows32);
        assert_eq!(classify("windows", "amd64").unwrap(), Platform::Windows64);
    }

    #[test]
    fn test_classify_unsupported() {
        assert!(classify("SunOS", "x86_64").is_err());
        assert!(classify("linux", "aarch64").is_err());
        // no 32-bit OS X build exists
        assert!(classify("Mac OS X", "x86").is_err());
    }

    #[test]
    fn test_detector_memoizes() {
        let detector = PlatformDetector::for_host("linux", "x86_64");
        assert_eq!(detector.detect().unwrap(), Platform::Linux64);
        assert_eq!(detector.detect().unwrap(), Platform::Linux64);
    }

    #[test]
    fn test_detector_reports_unsupported() {
        let detector = PlatformDetector::for_host("plan9", "mips");
        assert!(detector.detect().is_err());
    }

    #[test]
    fn test_family_queries() {
        assert!(is_linux(Platform::LinuxArmHf));
        assert!(is_osx(Platform::Osx64));
        assert!(is_windows(Platform::Windows32));
        assert!(!is_windows(Platform::Linux64));
    }

    #[test]
    fn test_default_locations() {
        let home = Path::new("/home/dev");
        assert_eq!(
            Platform::Linux64.default_location_in(ArtifactKind::NativeLibraries, home),
            PathBuf::from("/usr/local/lib")
        );
        assert_eq!(
            Platform::Osx64.default_location_in(ArtifactKind::Bindings, home),
            PathBuf::from("/home/dev/Library/Java/Extensions")
        );
        assert_eq!(
            Platform::Windows64.default_location_in(ArtifactKind::Headers, home),
            home.join("OpenCV").join("include")
        );
        assert_eq!(
            Platform::LinuxArm.default_location_in(ArtifactKind::Library, home),
            PathBuf::from(".")
        );
    }
}
