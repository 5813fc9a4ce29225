const SUFFIXES: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count as a human-readable size string.
///
/// Two decimals with trailing zeros stripped: `1536` -> `"1.5 KB"`.
/// Observational only (log output), not part of any programmatic contract.
pub fn bytes_to_human(nbytes: u64) -> String {
    let mut value = nbytes as f64;
    let mut i = 0;
    while value >= 1024.0 && i < SUFFIXES.len() - 1 {
        value /= 1024.0;
        i += 1;
    }
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SUFFIXES[i])
}
