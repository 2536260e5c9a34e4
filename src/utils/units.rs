// file: src/utils/units.rs
// version: 1.0.0
// guid: be66e97f-6a7d-43be-8c1a-bb3a1f03185b

//! Byte, MiB and GiB conversions used by the partition sizing policy

const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;

/// Whole GiB contained in `bytes` (truncating)
pub fn byte_to_gib(bytes: u64) -> u64 {
    bytes / GIB
}

/// Whole MiB contained in `bytes` (truncating)
pub fn byte_to_mib(bytes: u64) -> u64 {
    bytes / MIB
}

pub fn gib_to_byte(gib: u64) -> u64 {
    gib.saturating_mul(GIB)
}

pub fn mib_to_byte(mib: u64) -> u64 {
    mib.saturating_mul(MIB)
}

pub fn gib_to_mib(gib: u64) -> u64 {
    gib.saturating_mul(1024)
}

/// Human-readable size with two decimals
pub fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(byte_to_gib(gib_to_byte(60)), 60);
        assert_eq!(byte_to_mib(mib_to_byte(512)), 512);
        assert_eq!(gib_to_mib(25), 25600);
        // partial units are truncated
        assert_eq!(byte_to_gib(gib_to_byte(1) - 1), 0);
        assert_eq!(byte_to_mib(mib_to_byte(3) + 1), 3);
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512.00 B");
        assert_eq!(human_size(1536), "1.50 KiB");
        assert_eq!(human_size(gib_to_byte(250)), "250.00 GiB");
    }
}
