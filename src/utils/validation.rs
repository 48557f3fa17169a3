use std::path::Path;

/// Fallback leaf name for parts that arrive without a usable filename
const DEFAULT_LEAF: &str = "upload.pdf";

/// Reduce an uploaded filename to a safe leaf name for staging.
///
/// Strips any path components, control characters and reserved separator
/// characters. Returns a fixed placeholder when nothing usable remains.
pub fn sanitize_filename(filename: &str) -> String {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("path components in uploaded filename: {}", filename);
    }

    // Keep only the filename component
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let sanitized: String = name
        .chars()
        .filter(|c| {
            !c.is_control()
                && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');
    if trimmed.is_empty() {
        DEFAULT_LEAF.to_string()
    } else {
        trimmed.to_string()
    }
}
