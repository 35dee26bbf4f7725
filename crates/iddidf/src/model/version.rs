//! Two-component version numbers carried by dictionaries and documents.

use std::fmt;

/// A `major.minor` version, as read from `8.6.0` style version strings.
///
/// Only the first two dot-separated components are significant; anything
/// after the minor component (patch level, build suffix) is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    /// The value used when no version could be determined (`0.0`).
    pub const UNKNOWN: VersionNumber = VersionNumber { major: 0, minor: 0 };

    /// Creates a version from its components.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parses the leading `major.minor` components of a version string.
    ///
    /// Returns `None` when there are fewer than two components or either
    /// component is not an unsigned integer.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = parts.next()?.trim().parse().ok()?;
        Some(Self { major, minor })
    }

    /// Returns the version as a floating point value (`8.6` for `8.6.0`).
    pub fn as_f64(&self) -> f64 {
        format!("{}.{}", self.major, self.minor)
            .parse()
            .unwrap_or(0.0)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
