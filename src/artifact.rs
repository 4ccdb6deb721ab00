use std::fmt;

/// The maven group every OpenCV artifact is published under.
pub const GROUP_ID: &str = "org.opencv";

/// The four kinds of OpenCV artifact this installer knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The Java API jar.
    Library,
    /// The JNI bindings for one platform.
    Bindings,
    /// The C++ headers.
    Headers,
    /// The C++ native libraries for one platform.
    NativeLibraries,
}

impl ArtifactKind {
    /// Returns every kind in install order.
    pub const fn all() -> &'static [ArtifactKind] {
        &[
            ArtifactKind::Library,
            ArtifactKind::Bindings,
            ArtifactKind::Headers,
            ArtifactKind::NativeLibraries,
        ]
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            ArtifactKind::Library => "Java library",
            ArtifactKind::Bindings => "JNI bindings",
            ArtifactKind::Headers => "C++ headers",
            ArtifactKind::NativeLibraries => "C++ native libraries",
        }
    }

    /// The maven artifact id published for this kind.
    pub const fn artifact_id(self) -> &'static str {
        match self {
            ArtifactKind::Library => "opencv-java",
            ArtifactKind::Bindings => "opencv-jni",
            ArtifactKind::Headers => "opencv-headers",
            ArtifactKind::NativeLibraries => "opencv-natives",
        }
    }

    /// Stable key used by the install state store. Never change these.
    pub const fn state_key(self) -> &'static str {
        match self {
            ArtifactKind::Library => "JAVA",
            ArtifactKind::Bindings => "JNI",
            ArtifactKind::Headers => "HEADERS",
            ArtifactKind::NativeLibraries => "NATIVES",
        }
    }

    /// Platform-specific kinds carry the platform name as their classifier.
    pub const fn is_platform_specific(self) -> bool {
        matches!(self, ArtifactKind::Bindings | ArtifactKind::NativeLibraries)
    }

    /// The Java jar is placed as-is; everything else is unpacked first.
    pub const fn needs_extraction(self) -> bool {
        !matches!(self, ArtifactKind::Library)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Identifies one archive inside a maven repository layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
}

impl ArtifactCoordinate {
    /// `<artifact>-<version>[-<classifier>]`
    pub fn full_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}-{}-{}", self.artifact_id, self.version, classifier),
            None => format!("{}-{}", self.artifact_id, self.version),
        }
    }

    /// `<group/with/slashes>/<artifact>/<version>`
    pub fn relative_dir(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version
        )
    }

    pub fn jar_name(&self) -> String {
        format!("{}.jar", self.full_name())
    }

    /// The descriptor never carries a classifier.
    pub fn pom_name(&self) -> String {
        format!("{}-{}.pom", self.artifact_id, self.version)
    }

    pub fn relative_jar_path(&self) -> String {
        format!("{}/{}", self.relative_dir(), self.jar_name())
    }

    pub fn relative_pom_path(&self) -> String {
        format!("{}/{}", self.relative_dir(), self.pom_name())
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}
