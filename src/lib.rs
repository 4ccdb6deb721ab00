//! # OpenCV Installer Core Library
//!
//! This crate contains the logic behind the `opencv-installer` tool, which fetches OpenCV
//! artifacts from a maven repository (or the local maven cache) and installs them into the
//! directories the current platform expects.
//!
//! ## Modules Overview
//! - [`platform`] – Detecting the running platform and its default install locations
//! - [`artifact`] – Artifact kinds and maven coordinates
//! - [`locator`] – Mapping coordinates to local cache paths and remote URLs
//! - [`fetcher`] – Downloading archives into the local maven repository
//! - [`extractor`] – Unpacking archives into the scratch area
//! - [`state`] – Records of completed installs
//! - [`installer`] – The install pipeline tying everything together
//! - [`config`] – User configuration
//! - [`util`] – Shared helpers (merge-copy, paths, version checks)
//! - [`global`] – Per-user directories


pub mod error;
pub mod artifact;
pub mod platform;
pub mod locator;
pub mod fetcher;
pub mod scratch;
pub mod extractor;
pub mod state;
pub mod installer;
pub mod config;
pub mod util;
pub mod global;

pub use error::*;
pub use artifact::*;
pub use platform::*;
pub use locator::*;
pub use fetcher::*;
pub use installer::*;
pub use state::*;
pub use config::*;
pub use util::*;
