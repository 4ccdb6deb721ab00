use std::path::PathBuf;
use clap::Parser;
use opencv_installer::{is_valid_version, ArtifactKind, Platform};

#[derive(Debug, Parser, Clone)]
#[clap(name = "opencv-installer", about, long_about = None, disable_version_flag = true)]
pub struct CLI {
    /// Install the OpenCV Java library
    #[clap(short = 'j', long = "java", value_name = "INSTALL_PATH", num_args = 0..=1)]
    pub(crate) java: Option<Option<PathBuf>>,
    /// Install the OpenCV JNI bindings
    #[clap(short = 'i', long = "jni", value_name = "INSTALL_PATH", num_args = 0..=1)]
    pub(crate) jni: Option<Option<PathBuf>>,
    /// Install the OpenCV C++ headers
    #[clap(short = 's', long = "headers", value_name = "INSTALL_PATH", num_args = 0..=1)]
    pub(crate) headers: Option<Option<PathBuf>>,
    /// Install the OpenCV native libraries
    #[clap(short = 'n', long = "natives", value_name = "INSTALL_PATH", num_args = 0..=1)]
    pub(crate) natives: Option<Option<PathBuf>>,
    /// Installs all artifacts
    #[clap(short, long)]
    pub(crate) all: bool,
    /// Set the version of OpenCV to install
    #[clap(short = 'v', long = "version", value_parser = parse_version, required_unless_present = "list_platforms")]
    pub(crate) version: Option<String>,
    /// Overwrite existing files when installing
    #[clap(short, long)]
    pub(crate) overwrite: bool,
    /// Install artifacts for a specific platform into `install/`
    #[clap(short, long, value_parser = parse_platform)]
    pub(crate) platform: Option<Platform>,
    /// Print the supported platforms and exit
    #[clap(long)]
    pub(crate) list_platforms: bool,
    /// Enable debug logging
    #[clap(short, long)]
    pub(crate) debug: bool,
}

impl CLI {
    /// The selected artifacts in install order, each with its explicit location if one was given.
    pub(crate) fn selected(&self) -> Vec<(ArtifactKind, Option<PathBuf>)> {
        let flags = [
            (ArtifactKind::Library, &self.java),
            (ArtifactKind::Bindings, &self.jni),
            (ArtifactKind::Headers, &self.headers),
            (ArtifactKind::NativeLibraries, &self.natives),
        ];
        flags
            .into_iter()
            .filter(|(_, flag)| self.all || flag.is_some())
            .map(|(kind, flag)| (kind, flag.clone().flatten()))
            .collect()
    }
}

fn parse_version(s: &str) -> Result<String, String> {
    if is_valid_version(s) {
        Ok(s.to_string())
    } else {
        Err(format!("Invalid version: {}", s))
    }
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse::<Platform>().map_err(|e| e.to_string())
}
