use std::path::Path;

/// Stem used when nothing survives sanitizing
pub const FALLBACK_STEM: &str = "clip";

/// Suffix appended to every sanitized stem in the output directory
pub const OUTPUT_SUFFIX: &str = "_color";

/// Normalize a filename stem into an output-safe identifier.
///
/// Keeps alphanumerics, `-` and `_`, turns each whitespace run into a single
/// `_`, drops everything else and trims underscores from both ends. Pure and
/// deterministic, so skip detection on output paths is stable across runs.
pub fn sanitize(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut in_whitespace = false;

    for ch in stem.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Get the file extension from a path
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// Output filename for an input: `<sanitize(stem)>_color.<ext>`
pub fn output_filename(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = format!("{}{}", sanitize(&stem), OUTPUT_SUFFIX);

    match get_extension(input) {
        Some(ext) => format!("{}.{}", base, ext),
        None => base,
    }
}
