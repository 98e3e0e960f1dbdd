//! Per-interface statistics reading
//!
//! Each cycle opens `<root><interface>/statistics/<file>` for every roster
//! entry, reads at most [`MAX_STAT_BYTES`] and parses the leading integer.

use super::MetricsSink;
use crate::error::{NetstatError, Result};
use crate::models::{GaugeSample, Roster};
use std::ffi::{OsStr, OsString};
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Read budget per statistics file
pub const MAX_STAT_BYTES: usize = 24;

/// Outcome of a completed collection cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Interfaces whose file was opened and whose sample was emitted
    pub entities_read: usize,
    /// Interfaces whose read failed and were reported as zero
    pub read_errors: usize,
}

/// Build the statistics path by plain concatenation
///
/// `root` is used verbatim, so it needs a trailing separator. `interface` is
/// the raw directory entry name and need not be UTF-8.
pub fn stat_path(root: &str, interface: &OsStr, stat_file: &str) -> PathBuf {
    let mut path = OsString::from(root);
    path.push(interface);
    path.push("/statistics/");
    path.push(stat_file);
    PathBuf::from(path)
}

/// Parse the leading decimal integer of `buf`
///
/// Leading ASCII whitespace and a single sign are accepted, parsing stops at
/// the first non-digit byte. Input without digits yields zero and values past
/// the `i64` range saturate.
pub fn parse_leading_int(buf: &[u8]) -> i64 {
    let mut bytes = buf
        .iter()
        .copied()
        .skip_while(|b| b.is_ascii_whitespace())
        .peekable();

    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    let mut value: i64 = 0;
    for b in bytes.take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

fn open_nonblocking(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

/// Read one statistics file
///
/// A failed open is returned as [`NetstatError::StatFileUnavailable`]. A failed
/// read is not fatal: the value parses from the zeroed buffer and the read
/// error is handed back next to it.
pub fn read_stat_value(path: &Path) -> Result<(i64, Option<NetstatError>)> {
    let mut file = open_nonblocking(path).map_err(|source| NetstatError::StatFileUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut buf = [0u8; MAX_STAT_BYTES];
    let read_error = file
        .read(&mut buf)
        .err()
        .map(|source| NetstatError::ReadError {
            path: path.to_path_buf(),
            source,
        });

    Ok((parse_leading_int(&buf), read_error))
}

/// Run one collection cycle over `roster`
///
/// Interfaces are visited in roster order. The first statistics file that
/// cannot be opened aborts the cycle, leaving later interfaces untouched for
/// this tick.
pub fn collect(
    roster: &mut Roster,
    root: &str,
    stat_file: &str,
    sink: &dyn MetricsSink,
) -> Result<CollectStats> {
    let mut stats = CollectStats::default();

    for entity in roster.iter_mut() {
        let path = stat_path(root, entity.raw_name(), stat_file);
        debug!(path = %path.display(), "Reading statistics file");

        let (value, read_error) = read_stat_value(&path).inspect_err(|e| {
            error!(interface = %entity.name, error = %e, "Aborting collection cycle");
        })?;

        if let Some(e) = read_error {
            error!(interface = %entity.name, error = %e, "Error reading stats file");
            stats.read_errors += 1;
        }

        entity.last_value = value;
        debug!(interface = %entity.name, value, "Parsed statistics value");

        sink.dispatch(GaugeSample::new(entity.name.clone(), value as f64));
        stats.entities_read += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_value() {
        assert_eq!(parse_leading_int(b"42\n"), 42);
        assert_eq!(parse_leading_int(b"0\n"), 0);
    }

    #[test]
    fn test_parse_numeric_prefix() {
        assert_eq!(parse_leading_int(b"  17 bytes"), 17);
        assert_eq!(parse_leading_int(b"\t99abc"), 99);
        assert_eq!(parse_leading_int(b"-5\n"), -5);
        assert_eq!(parse_leading_int(b"+8"), 8);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse_leading_int(b""), 0);
        assert_eq!(parse_leading_int(b"abc"), 0);
        assert_eq!(parse_leading_int(b"-"), 0);
        assert_eq!(parse_leading_int(b" - 4"), 0);
        assert_eq!(parse_leading_int(&[0u8; MAX_STAT_BYTES]), 0);
    }

    #[test]
    fn test_parse_stops_at_nul() {
        let mut buf = [0u8; MAX_STAT_BYTES];
        buf[..3].copy_from_slice(b"123");
        buf[4..6].copy_from_slice(b"45");
        assert_eq!(parse_leading_int(&buf), 123);
    }

    #[test]
    fn test_parse_saturates() {
        assert_eq!(parse_leading_int(b"99999999999999999999999"), i64::MAX);
        assert_eq!(parse_leading_int(b"-99999999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_stat_path_concatenates_verbatim() {
        assert_eq!(
            stat_path("/sys/class/net/", OsStr::new("eth0"), "rx_bytes"),
            PathBuf::from("/sys/class/net/eth0/statistics/rx_bytes")
        );
        assert_eq!(
            stat_path("/sys/class/net", OsStr::new("eth0"), "rx_bytes"),
            PathBuf::from("/sys/class/neteth0/statistics/rx_bytes")
        );
    }

    #[test]
    fn test_stat_path_keeps_raw_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let path = stat_path("/net/", OsStr::from_bytes(b"eth\xff0"), "rx_bytes");
        assert_eq!(path.as_os_str().as_bytes(), b"/net/eth\xff0/statistics/rx_bytes");
    }
}
