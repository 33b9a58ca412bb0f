//! Text helpers shared by widgets: truncation and human-readable sizes

/// Marker appended to truncated strings
pub const ELLIPSIS: char = '⋯';

/// Shorten `input` to at most `max` characters, ending in [`ELLIPSIS`] when cut.
pub fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out: String = input.chars().take(max - 1).collect();
    out.push(ELLIPSIS);
    out
}

const IEC_UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
const SI_RATE_UNITS: [&str; 5] = ["B/s", "kB/s", "MB/s", "GB/s", "TB/s"];

/// Format a byte count using binary (IEC) units, e.g. `3.42 GiB`
pub fn ibytesize(bytes: u64) -> String {
    scaled(bytes as f64, 1024.0, &IEC_UNITS)
}

/// Format a transfer rate in bytes per second using decimal units, e.g. `1.20 MB/s`
pub fn byterate(bytes_per_sec: f64) -> String {
    scaled(bytes_per_sec.max(0.0), 1000.0, &SI_RATE_UNITS)
}

fn scaled(mut value: f64, step: f64, units: &[&str]) -> String {
    let last = units.len() - 1;
    let mut unit = 0;
    while value >= step && unit < last {
        value /= step;
        unit += 1;
    }

    // Rounding can carry into a fourth digit (1023.9 KiB, 999.9 kB/s)
    let mut rounded = round_significant(value);
    if rounded >= step.min(1000.0) && unit < last {
        unit += 1;
        rounded = round_significant(value / step);
    }

    let decimals = match rounded {
        _ if unit == 0 => 0,
        r if r >= 100.0 => 0,
        r if r >= 10.0 => 1,
        r if r >= 1.0 => 2,
        _ => 3,
    };
    format!("{:.*} {}", decimals, rounded, units[unit])
}

/// Round to three significant digits
fn round_significant(value: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(2 - magnitude);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_input_unchanged() {
        assert_eq!(truncate("home", 10), "home");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        let out = truncate("a very long network name", 10);
        assert_eq!(out, "a very lo⋯");
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let out = truncate("Café Wi-Fi Ünïcödé", 6);
        assert_eq!(out, "Café ⋯");
        assert_eq!(out.chars().count(), 6);
    }

    #[test]
    fn test_truncate_never_exceeds_width() {
        let input = "abcdefghijklmnopqrstuvwxyz";
        for max in 0..30 {
            let out = truncate(input, max);
            assert!(out.chars().count() <= max, "max = {}", max);
            if max < input.len() && max > 0 {
                assert!(out.ends_with(ELLIPSIS));
            }
        }
    }

    #[test]
    fn test_ibytesize() {
        assert_eq!(ibytesize(0), "0 B");
        assert_eq!(ibytesize(512), "512 B");
        assert_eq!(ibytesize(1536), "1.50 KiB");
        assert_eq!(ibytesize(12 * 1024 * 1024 + 300 * 1024), "12.3 MiB");
        assert_eq!(ibytesize(123 * 1024 * 1024), "123 MiB");
        assert_eq!(ibytesize(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }

    #[test]
    fn test_rounding_promotes_unit() {
        assert_eq!(ibytesize(1_048_575), "1.00 MiB");
        assert_eq!(ibytesize(1023), "0.999 KiB");
        assert_eq!(byterate(999_999.0), "1.00 MB/s");
        assert_eq!(byterate(99_960.0), "100 kB/s");
        assert_eq!(byterate(999.6), "1.00 kB/s");
        assert_eq!(byterate(9_996.0), "10.0 kB/s");
    }

    #[test]
    fn test_byterate() {
        assert_eq!(byterate(0.0), "0 B/s");
        assert_eq!(byterate(999.0), "999 B/s");
        assert_eq!(byterate(1200.0), "1.20 kB/s");
        assert_eq!(byterate(45_600_000.0), "45.6 MB/s");
        assert_eq!(byterate(-5.0), "0 B/s");
    }
}
