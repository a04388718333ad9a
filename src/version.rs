use std::fmt;
use std::str::FromStr;

use crate::store::Error;

/// Semantic version triple used to gate table revisions.
///
/// Ordering is lexicographic over (major, minor, patch), which is what the
/// registry relies on when picking the newest revision not exceeding the
/// running version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionNumber {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version the crate was built as, from Cargo metadata.
    pub fn current() -> Self {
        env!("CARGO_PKG_VERSION")
            .parse()
            .unwrap_or(Self::new(0, 0, 0))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionNumber {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.trim().splitn(3, '.');
        let mut next = |name: &'static str| -> Result<u32, Error> {
            let part = parts
                .next()
                .ok_or(Error::MalformedVersion(raw.to_string()))?;
            // Tolerate pre-release suffixes on the last component ("2-rc1").
            let digits = part
                .split(|ch: char| !ch.is_ascii_digit())
                .next()
                .unwrap_or("");
            digits
                .parse::<u32>()
                .map_err(|_| Error::MalformedVersion(format!("{raw} ({name})")))
        };
        Ok(Self {
            major: next("major")?,
            minor: next("minor")?,
            patch: next("patch")?,
        })
    }
}
