//! Listing helpers for the file-browser UI: ordering and display
//! formatting. Rendering itself belongs to the host.

use chrono::{DateTime, Utc};
use provider_onedrive::FileEntry;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Order a listing for display: folders first, then case-insensitive
/// alphabetical within each group.
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        b.is_folder
            .cmp(&a.is_folder)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// Human-readable size: base-1024 units, rounded to two decimals, with the
/// unit index clamped to the table for absurdly large values.
pub fn format_file_size(size: u64) -> String {
    if size == 0 {
        return "0 B".to_string();
    }

    let mut power = (size as f64).log(1024.0).floor() as usize;
    if power >= SIZE_UNITS.len() {
        power = SIZE_UNITS.len() - 1;
    }

    let value = size as f64 / 1024f64.powi(power as i32);
    let rounded = (value * 100.0).round() / 100.0;

    format!("{} {}", rounded, SIZE_UNITS[power])
}

/// Human-readable modification date, `—` when the listing had none.
pub fn format_modified(modified: Option<DateTime<Utc>>) -> String {
    match modified {
        Some(timestamp) => timestamp.format("%-d %B %Y").to_string(),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, is_folder: bool) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            id: format!("id-{}", name),
            path: format!("/{}", name),
            size: 1,
            modified: None,
            is_folder,
            download_url: None,
        }
    }

    #[test]
    fn test_sort_folders_first_then_alpha() {
        let mut entries = vec![
            entry("zeta.pdf", false),
            entry("Books", true),
            entry("alpha.pdf", false),
            entry("archive", true),
        ];

        sort_entries(&mut entries);

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["archive", "Books", "alpha.pdf", "zeta.pdf"]);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(500), "500 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2048), "2 KB");
        assert_eq!(format_file_size(5_368_709_120), "5 GB");
    }

    #[test]
    fn test_format_file_size_clamps_to_largest_unit() {
        // Beyond the unit table: stays in TB instead of walking off the end
        assert!(format_file_size(u64::MAX).ends_with(" TB"));
    }

    #[test]
    fn test_format_modified() {
        let timestamp = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(format_modified(Some(timestamp)), "1 March 2024");
        assert_eq!(format_modified(None), "—");
    }
}
