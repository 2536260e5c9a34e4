// file: src/partition.rs
// version: 1.0.0
// guid: 34d6cbee-5470-496b-b827-05fa65ccbfe2

//! Persistent partition sizing policy.
//!
//! The installation disk holds the OS partitions (ESP, OEM, state and recovery)
//! plus the persistent partition. The persistent partition grows with the disk on a
//! tiered schedule: a steep tier up to the soft minimum disk size and a gentler
//! tier above it, capped at [`MAX_PERSISTENT_PART_SIZE_GIB`].

use crate::error::{Result, SizingError};
use crate::utils::units::{byte_to_gib, byte_to_mib, gib_to_mib};
use regex::Regex;
use tracing::{debug, warn};

/// Disks below this size are refused outright
pub const HARD_MIN_DISK_SIZE_GIB: u64 = 60;
/// Disk size at which the gentler scaling tier starts
pub const SOFT_MIN_DISK_SIZE_GIB: u64 = 150;
/// Smallest persistent partition the installer will create
pub const MIN_PERSISTENT_PART_SIZE_GIB: u64 = 25;
/// Persistent partition size at the soft minimum disk size
pub const NORMAL_PERSISTENT_PART_SIZE_GIB: u64 = 50;
/// Largest persistent partition picked automatically
pub const MAX_PERSISTENT_PART_SIZE_GIB: u64 = 100;

/// Space used by the ESP, OEM, recovery and state partitions
pub const OS_PARTITIONS_OVERHEAD_MIB: u64 = 64 + 64 + 8 * 1024 + 15 * 1024;

/// Compute the persistent partition size (GiB) for a disk of `disk_size_gib`.
pub fn calc_persistent_partition_size(disk_size_gib: u64) -> Result<u64> {
    if disk_size_gib < HARD_MIN_DISK_SIZE_GIB {
        return Err(SizingError::DiskTooSmall {
            size_gib: disk_size_gib,
            min_gib: HARD_MIN_DISK_SIZE_GIB,
        }
        .into());
    }

    let size = if disk_size_gib < SOFT_MIN_DISK_SIZE_GIB {
        // 25GiB at the hard minimum, +5GiB per 16GiB of disk
        let grown = MIN_PERSISTENT_PART_SIZE_GIB + (disk_size_gib - HARD_MIN_DISK_SIZE_GIB) * 5 / 16;
        grown.min(NORMAL_PERSISTENT_PART_SIZE_GIB)
    } else {
        (20 + disk_size_gib / 5)
            .min(40 + disk_size_gib / 10)
            .min(MAX_PERSISTENT_PART_SIZE_GIB)
    };

    debug!("Persistent partition for {}GiB disk: {}GiB", disk_size_gib, size);
    Ok(size)
}

/// Parse a user-supplied `<N>Mi` / `<N>Gi` persistent partition size into MiB and
/// check it against the disk.
///
/// With `skip_checks` the bounds are not enforced; a request larger than the disk can
/// hold is clamped to the maximum instead.
pub fn parse_partition_size(disk_size_bytes: u64, size: &str, skip_checks: bool) -> Result<u64> {
    let size_re = Regex::new(r"^(-?\d+)([A-Za-z]*)$")
        .map_err(|e| crate::error::InstallerError::config(format!("Invalid regex pattern: {}", e)))?;

    let trimmed = size.trim();
    let caps = size_re
        .captures(trimmed)
        .ok_or_else(|| SizingError::MalformedSize(size.to_string()))?;

    let number = &caps[1];
    let unit = &caps[2];

    if number.starts_with('-') {
        return Err(SizingError::NegativeSize(size.to_string()).into());
    }
    let value: u64 = number
        .parse()
        .map_err(|_| SizingError::MalformedSize(size.to_string()))?;

    let size_mib = match unit {
        "Mi" => value,
        "Gi" => gib_to_mib(value),
        _ => {
            return Err(SizingError::InvalidUnit {
                size: size.to_string(),
                unit: unit.to_string(),
            }
            .into())
        }
    };

    let disk_mib = byte_to_mib(disk_size_bytes);
    let max_mib = disk_mib.saturating_sub(OS_PARTITIONS_OVERHEAD_MIB);
    let min_mib = gib_to_mib(MIN_PERSISTENT_PART_SIZE_GIB);

    if skip_checks {
        if size_mib > max_mib {
            warn!(
                "Requested persistent partition {}MiB exceeds disk capacity, using {}MiB",
                size_mib, max_mib
            );
            return Ok(max_mib);
        }
        return Ok(size_mib);
    }

    let disk_gib = byte_to_gib(disk_size_bytes);
    if disk_gib < HARD_MIN_DISK_SIZE_GIB {
        return Err(SizingError::DiskTooSmall {
            size_gib: disk_gib,
            min_gib: HARD_MIN_DISK_SIZE_GIB,
        }
        .into());
    }
    if size_mib < min_mib {
        return Err(SizingError::TooSmall { size_mib, min_mib }.into());
    }
    if size_mib > max_mib {
        return Err(SizingError::TooLarge { size_mib, max_mib }.into());
    }

    Ok(size_mib)
}

/// Resolve the persistent partition size in MiB: the policy when nothing was
/// requested, the parsed request otherwise.
pub fn persistent_partition_size_mib(
    disk_size_bytes: u64,
    requested: &str,
    skip_checks: bool,
) -> Result<u64> {
    if !requested.trim().is_empty() {
        return parse_partition_size(disk_size_bytes, requested, skip_checks);
    }

    match calc_persistent_partition_size(byte_to_gib(disk_size_bytes)) {
        Ok(gib) => Ok(gib_to_mib(gib)),
        Err(_) if skip_checks => {
            let max_mib = byte_to_mib(disk_size_bytes).saturating_sub(OS_PARTITIONS_OVERHEAD_MIB);
            Ok(gib_to_mib(MIN_PERSISTENT_PART_SIZE_GIB).min(max_mib))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::units::{gib_to_byte, mib_to_byte};

    #[test]
    fn test_reference_table() {
        let table = [
            (60, 25),
            (80, 31),
            (100, 37),
            (139, 49),
            (150, 50),
            (200, 60),
            (300, 70),
            (400, 80),
            (500, 90),
            (600, 100),
            (700, 100),
        ];
        for (disk, expected) in table {
            assert_eq!(
                calc_persistent_partition_size(disk).unwrap(),
                expected,
                "disk size {}GiB",
                disk
            );
        }
    }

    #[test]
    fn test_disk_too_small() {
        let err = calc_persistent_partition_size(50).unwrap_err();
        assert_eq!(
            err.as_sizing(),
            Some(&SizingError::DiskTooSmall { size_gib: 50, min_gib: 60 })
        );
    }

    #[test]
    fn test_monotonic() {
        let mut previous = 0;
        for disk in HARD_MIN_DISK_SIZE_GIB..=2048 {
            let size = calc_persistent_partition_size(disk).unwrap();
            assert!(size >= previous, "size dropped at {}GiB", disk);
            assert!(size <= MAX_PERSISTENT_PART_SIZE_GIB);
            previous = size;
        }
    }

    #[test]
    fn test_parse_partition_size() {
        let disk = gib_to_byte(200);
        assert_eq!(parse_partition_size(disk, "30Gi", false).unwrap(), 30 * 1024);
        assert_eq!(parse_partition_size(disk, "40960Mi", false).unwrap(), 40960);
    }

    #[test]
    fn test_parse_partition_size_rejects_bad_input() {
        let disk = gib_to_byte(200);

        let err = parse_partition_size(disk, "30GB", false).unwrap_err();
        assert!(matches!(err.as_sizing(), Some(SizingError::InvalidUnit { .. })));

        let err = parse_partition_size(disk, "-5Gi", false).unwrap_err();
        assert!(matches!(err.as_sizing(), Some(SizingError::NegativeSize(_))));

        let err = parse_partition_size(disk, "Gi", false).unwrap_err();
        assert!(matches!(err.as_sizing(), Some(SizingError::MalformedSize(_))));

        let err = parse_partition_size(disk, "10Gi", false).unwrap_err();
        assert!(matches!(err.as_sizing(), Some(SizingError::TooSmall { .. })));

        let err = parse_partition_size(disk, "190Gi", false).unwrap_err();
        assert!(matches!(err.as_sizing(), Some(SizingError::TooLarge { .. })));

        let err = parse_partition_size(gib_to_byte(40), "30Gi", false).unwrap_err();
        assert!(matches!(err.as_sizing(), Some(SizingError::DiskTooSmall { .. })));
    }

    #[test]
    fn test_parse_partition_size_skip_checks_clamps() {
        let disk = gib_to_byte(200);
        let max = 200 * 1024 - OS_PARTITIONS_OVERHEAD_MIB;
        assert_eq!(parse_partition_size(disk, "500Gi", true).unwrap(), max);
        assert_eq!(parse_partition_size(disk, "10Gi", true).unwrap(), 10 * 1024);
        assert_eq!(
            parse_partition_size(gib_to_byte(40), "30Gi", true).unwrap(),
            40 * 1024 - OS_PARTITIONS_OVERHEAD_MIB
        );
    }

    #[test]
    fn test_persistent_partition_size_mib() {
        assert_eq!(
            persistent_partition_size_mib(gib_to_byte(300), "", false).unwrap(),
            70 * 1024
        );
        assert_eq!(
            persistent_partition_size_mib(gib_to_byte(300), "64Gi", false).unwrap(),
            64 * 1024
        );
        assert!(persistent_partition_size_mib(gib_to_byte(30), "", false).is_err());
        assert_eq!(
            persistent_partition_size_mib(gib_to_byte(30), "", true).unwrap(),
            byte_to_mib(gib_to_byte(30)) - OS_PARTITIONS_OVERHEAD_MIB
        );
        assert_eq!(
            persistent_partition_size_mib(mib_to_byte(100 * 1024), "", true).unwrap(),
            37 * 1024
        );
    }
}
