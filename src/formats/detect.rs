//! Format detection for uploaded files

use std::path::Path;

use super::TransferFormat;

/// Detect transfer format from file content
pub fn detect_format_from_content(content: &[u8]) -> Option<TransferFormat> {
    let text = String::from_utf8_lossy(content);
    let trimmed = text.trim_start_matches('\u{feff}').trim();

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Some(TransferFormat::Json);
    }

    // CSV: a header line with at least one comma
    let first_line = trimmed.lines().next()?;
    if first_line.contains(',') {
        return Some(TransferFormat::Csv);
    }

    None
}

/// Extension first, falling back to content sniffing
pub fn detect_format(file_path: &Path, content: &[u8]) -> Option<TransferFormat> {
    TransferFormat::from_path(file_path).or_else(|| detect_format_from_content(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection_json() {
        assert_eq!(
            detect_format_from_content(br#"  [{"name": "Outdoor"}]"#),
            Some(TransferFormat::Json)
        );
    }

    #[test]
    fn test_format_detection_csv() {
        assert_eq!(
            detect_format_from_content(b"id,name,slug\n1,Outdoor,outdoor\n"),
            Some(TransferFormat::Csv)
        );
    }

    #[test]
    fn test_format_detection_unknown() {
        assert_eq!(detect_format_from_content(b"just some words"), None);
        assert_eq!(detect_format_from_content(b""), None);
    }

    #[test]
    fn test_extension_wins_over_content() {
        let format = detect_format(Path::new("upload.csv"), b"[]");
        assert_eq!(format, Some(TransferFormat::Csv));
        let format = detect_format(Path::new("upload.tmp"), b"[]");
        assert_eq!(format, Some(TransferFormat::Json));
    }
}
