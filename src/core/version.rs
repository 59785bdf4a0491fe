//! Version descriptor and system info formats.
//!
//! Backends may report different contents here, but both strings must follow
//! the same layout so callers can branch on backend identity.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Qualifier carried by the in-process fallback.
pub const DEVELOPMENT_MOCK: &str = "development-mock";

/// `<semantic-version>[-<qualifier>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    version: semver::Version,
}

impl VersionDescriptor {
    /// Parse a descriptor; the qualifier is the semver pre-release part.
    pub fn parse(s: &str) -> Result<Self, semver::Error> {
        Ok(VersionDescriptor {
            version: semver::Version::parse(s.trim())?,
        })
    }

    /// Descriptor with a qualifier attached.
    pub fn qualified(version: &semver::Version, qualifier: &str) -> Result<Self, semver::Error> {
        let mut version = version.clone();
        version.pre = semver::Prerelease::new(qualifier)?;
        Ok(VersionDescriptor { version })
    }

    pub fn version(&self) -> &semver::Version {
        &self.version
    }

    /// `None` for a production backend.
    pub fn qualifier(&self) -> Option<&str> {
        if self.version.pre.is_empty() {
            None
        } else {
            Some(self.version.pre.as_str())
        }
    }

    /// Whether the backend declares itself a development mock.
    pub fn is_development_mock(&self) -> bool {
        self.qualifier().is_some_and(|q| q.contains("mock"))
    }
}

impl From<semver::Version> for VersionDescriptor {
    fn from(version: semver::Version) -> Self {
        VersionDescriptor { version }
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

static SYSTEM_INFO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<runtime>\S+) (?P<version>\S+) on (?P<platform>.+?) \((?P<arch>[^()]+)\) - (?P<qualifier>.+)$")
        .expect("system info pattern is valid")
});

/// Parsed `"<runtime> <version> on <platform> (<arch>) - <qualifier>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub runtime: String,
    pub version: String,
    pub platform: String,
    pub arch: String,
    pub qualifier: String,
}

impl SystemInfo {
    /// Parse a system info string, returning `None` if it does not follow the layout.
    pub fn parse(s: &str) -> Option<Self> {
        let caps = SYSTEM_INFO_RE.captures(s.trim())?;
        Some(SystemInfo {
            runtime: caps["runtime"].to_string(),
            version: caps["version"].to_string(),
            platform: caps["platform"].to_string(),
            arch: caps["arch"].to_string(),
            qualifier: caps["qualifier"].to_string(),
        })
    }
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} on {} ({}) - {}",
            self.runtime, self.version, self.platform, self.arch, self.qualifier
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_descriptor() {
        let desc = VersionDescriptor::parse("2.2.0").unwrap();
        assert_eq!(desc.qualifier(), None);
        assert!(!desc.is_development_mock());
        assert_eq!(desc.to_string(), "2.2.0");
    }

    #[test]
    fn test_mock_descriptor() {
        let desc = VersionDescriptor::parse("2.2.0-development-mock").unwrap();
        assert_eq!(desc.qualifier(), Some(DEVELOPMENT_MOCK));
        assert!(desc.is_development_mock());

        let built =
            VersionDescriptor::qualified(&semver::Version::new(0, 1, 0), DEVELOPMENT_MOCK).unwrap();
        assert_eq!(built.to_string(), "0.1.0-development-mock");
    }

    #[test]
    fn test_invalid_descriptor() {
        assert!(VersionDescriptor::parse("not a version").is_err());
        assert!(VersionDescriptor::parse("").is_err());
    }

    #[test]
    fn test_system_info_parse() {
        let info = SystemInfo::parse("capbridge 0.1.0 on linux (x86_64) - Development Fallback")
            .unwrap();
        assert_eq!(info.runtime, "capbridge");
        assert_eq!(info.version, "0.1.0");
        assert_eq!(info.platform, "linux");
        assert_eq!(info.arch, "x86_64");
        assert_eq!(info.qualifier, "Development Fallback");
        assert_eq!(
            info.to_string(),
            "capbridge 0.1.0 on linux (x86_64) - Development Fallback"
        );
    }

    #[test]
    fn test_system_info_rejects_free_text() {
        assert!(SystemInfo::parse("just some text").is_none());
        assert!(SystemInfo::parse("rt 1.0 on ios arm64 - missing parens").is_none());
    }
}
