//! Host resource sizing for external build tools.

use std::fs;

/// Job count for `make -j` / `ninja -j`: 1.5 times the logical CPU count.
pub fn default_jobs() -> usize {
    (num_cpus::get() * 3 / 2).max(1)
}

/// Available memory in MiB, read from `/proc/meminfo`.
///
/// Linux only. Other build machines get `None`, which [`xz_memlimit`] turns
/// into `max`.
pub fn available_memory_mib() -> Option<u64> {
    let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
    parse_mem_available(&meminfo)
}

fn parse_mem_available(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemAvailable:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kib| kib.parse::<u64>().ok())
        .map(|kib| kib / 1024)
}

/// Value for `xz --memlimit=`: available memory plus 3 GiB of headroom.
pub fn xz_memlimit() -> String {
    match available_memory_mib() {
        Some(mib) => format!("{}MiB", mib + 3072),
        None => "max".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_is_positive() {
        assert!(default_jobs() >= 1);
    }

    #[test]
    fn parses_meminfo() {
        let sample = "MemTotal:       32768000 kB\nMemFree:         1000 kB\nMemAvailable:   16384000 kB\n";
        assert_eq!(parse_mem_available(sample), Some(16000));
        assert_eq!(parse_mem_available("MemTotal: 1 kB\n"), None);
    }

    #[cfg(windows)]
    #[test]
    fn no_memory_reading_on_windows() {
        assert_eq!(available_memory_mib(), None);
        assert_eq!(xz_memlimit(), "max");
    }
}
