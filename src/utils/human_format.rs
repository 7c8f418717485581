//! Human-readable formatting for byte counts

/// Formats a memory value in bytes to a human-readable string with appropriate units
pub fn format_memory(bytes: f64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0.0 {
        return "0B".to_string();
    }

    let mut size = bytes.abs();
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    let sign = if bytes < 0.0 { "-" } else { "" };

    if unit_index == 0 {
        format!("{sign}{size:.0}{}", UNITS[unit_index])
    } else if size >= 10.0 {
        format!("{sign}{size:.1}{}", UNITS[unit_index])
    } else {
        format!("{sign}{size:.2}{}", UNITS[unit_index])
    }
}
