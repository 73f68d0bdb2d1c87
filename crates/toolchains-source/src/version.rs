//! `.version` markers for archive-backed components.
//!
//! After an archive is extracted its version is written to a `.version`
//! file in the component directory. On update the marker is compared with
//! the declared version. A missing or unreadable marker is never an error:
//! it just means the component needs to be fetched again.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use toolchains_shell::FsOp;

/// File name of the marker inside a component directory.
pub const MARKER: &str = ".version";

/// Outcome of comparing the local marker with the declared version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Local is newer than declared. Kept as-is; downgrades never happen.
    Newer,
    UpToDate,
    /// Older, missing, or malformed marker.
    Stale,
}

impl Freshness {
    pub fn needs_fetch(self) -> bool {
        self == Freshness::Stale
    }
}

/// Parse a dotted version, padding missing minor/patch components with zero.
///
/// `"1.18"` parses as `1.18.0`. Returns `None` for anything that is not one
/// to three numeric components.
pub fn parse_loose(text: &str) -> Option<Version> {
    let parts: Vec<&str> = text.trim().split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }
    Some(Version::new(numbers[0], numbers[1], numbers[2]))
}

fn marker_path(dir: &Path) -> PathBuf {
    dir.join(MARKER)
}

/// Read the first line of the marker in `dir`, if any.
pub fn read_marker(dir: &Path) -> Option<String> {
    let text = fs::read_to_string(marker_path(dir)).ok()?;
    text.lines().next().map(|l| l.trim().to_string())
}

/// Compare the marker in `dir` with `declared`.
pub fn check(dir: &Path, declared: &str) -> Freshness {
    let local = read_marker(dir).as_deref().and_then(parse_loose);
    match (local, parse_loose(declared)) {
        (Some(local), Some(declared)) if local > declared => Freshness::Newer,
        (Some(local), Some(declared)) if local == declared => Freshness::UpToDate,
        _ => Freshness::Stale,
    }
}

/// The filesystem operation that stamps `dir` with `version`.
pub fn stamp(dir: &Path, version: &str) -> FsOp {
    FsOp::WriteFile {
        path: marker_path(dir),
        contents: version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_marker(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MARKER), content).unwrap();
        dir
    }

    #[test]
    fn pads_short_versions() {
        assert_eq!(parse_loose("1.18"), Some(Version::new(1, 18, 0)));
        assert_eq!(parse_loose("6"), Some(Version::new(6, 0, 0)));
        assert_eq!(parse_loose(" 4.2.1\n"), Some(Version::new(4, 2, 1)));
        assert_eq!(parse_loose("1.2.3.4"), None);
        assert_eq!(parse_loose("v1.2"), None);
    }

    #[test]
    fn older_marker_is_stale() {
        let dir = with_marker("1.17");
        assert_eq!(check(dir.path(), "1.18"), Freshness::Stale);
        assert!(check(dir.path(), "1.18").needs_fetch());
    }

    #[test]
    fn newer_marker_is_kept() {
        let dir = with_marker("1.19");
        assert_eq!(check(dir.path(), "1.18"), Freshness::Newer);
        assert!(!Freshness::Newer.needs_fetch());
    }

    #[test]
    fn equal_marker_is_up_to_date() {
        let dir = with_marker("1.18\n");
        assert_eq!(check(dir.path(), "1.18.0"), Freshness::UpToDate);
    }

    #[test]
    fn missing_or_malformed_marker_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check(dir.path(), "1.18"), Freshness::Stale);
        let dir = with_marker("not a version");
        assert_eq!(check(dir.path(), "1.18"), Freshness::Stale);
    }

    #[test]
    fn stamp_then_check() {
        let dir = tempfile::tempdir().unwrap();
        stamp(dir.path(), "6.3.0").apply().unwrap();
        assert_eq!(read_marker(dir.path()).as_deref(), Some("6.3.0"));
        assert_eq!(check(dir.path(), "6.3.0"), Freshness::UpToDate);
    }
}
