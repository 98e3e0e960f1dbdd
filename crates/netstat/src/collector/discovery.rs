//! Interface discovery
//!
//! Scans the configured root directory once and builds the roster of
//! interfaces that later collection cycles read from.

use crate::error::{NetstatError, Result};
use crate::models::{EntityRecord, Roster};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Enumerate `root` and create one record per entry other than `.` and `..`
///
/// Records are prepended, so the roster ends up in reverse enumeration order.
/// Returns the number of records created together with the roster.
pub fn discover(root: impl AsRef<Path>) -> Result<(usize, Roster)> {
    let root = root.as_ref();
    let entries = fs::read_dir(root).map_err(|source| NetstatError::DirectoryUnavailable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut roster = Roster::new();
    let mut count = 0usize;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %root.display(), error = %e, "Failed to read directory entry");
                continue;
            }
        };

        let raw_name = entry.file_name();
        if raw_name == "." || raw_name == ".." {
            continue;
        }

        let record = EntityRecord::new(raw_name);
        if record.raw_name().to_str().is_none() {
            warn!(interface = %record.name, "Interface name is not valid UTF-8");
        }

        debug!(interface = %record.name, "Discovered interface");
        roster.prepend(record);
        count += 1;
    }

    info!(path = %root.display(), count, "Interface discovery complete");
    Ok((count, roster))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_discover_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["eth0", "eth1", "lo", "wlan0"] {
            fs::create_dir(temp_dir.path().join(name)).unwrap();
        }

        let (count, roster) = discover(temp_dir.path()).unwrap();

        assert_eq!(count, 4);
        assert_eq!(roster.len(), 4);
        let names: HashSet<&str> = roster.names().into_iter().collect();
        let expected: HashSet<&str> = ["eth0", "eth1", "lo", "wlan0"].into_iter().collect();
        assert_eq!(names, expected);
        assert!(roster.iter().all(|e| e.last_value == 0));
    }

    #[test]
    fn test_discover_reverses_enumeration_order() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["eth0", "eth1", "eth2", "lo", "wlan0"] {
            fs::create_dir(temp_dir.path().join(name)).unwrap();
        }

        let mut enumerated: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        enumerated.reverse();

        let (_, roster) = discover(temp_dir.path()).unwrap();

        assert_eq!(roster.names(), enumerated);
    }

    #[test]
    fn test_discover_keeps_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let raw = OsStr::from_bytes(b"eth\xff0");
        fs::create_dir(temp_dir.path().join(raw)).unwrap();

        let (count, roster) = discover(temp_dir.path()).unwrap();

        assert_eq!(count, 1);
        let record = roster.iter().next().unwrap();
        assert_eq!(record.raw_name(), raw);
        assert_eq!(record.name, "eth\u{FFFD}0");
    }

    #[test]
    fn test_discover_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let (count, roster) = discover(temp_dir.path()).unwrap();

        assert_eq!(count, 0);
        assert!(roster.is_empty());
    }

    #[test]
    fn test_discover_counts_regular_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("eth0")).unwrap();
        fs::write(temp_dir.path().join("bonding_masters"), "").unwrap();

        let (count, roster) = discover(temp_dir.path()).unwrap();

        assert_eq!(count, 2);
        assert!(roster.get("bonding_masters").is_some());
    }

    #[test]
    fn test_discover_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let result = discover(&missing);

        assert!(matches!(
            result,
            Err(NetstatError::DirectoryUnavailable { ref path, .. }) if path == &missing
        ));
    }

    #[test]
    fn test_discover_on_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "eth0").unwrap();

        assert!(matches!(
            discover(&file),
            Err(NetstatError::DirectoryUnavailable { .. })
        ));
    }
}
