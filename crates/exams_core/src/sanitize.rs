/// Longest path segment, in characters, that sanitization produces.
pub const MAX_SEGMENT_CHARS: usize = 120;

const FALLBACK_SEGMENT: &str = "untitled";

/// Turn arbitrary text into a single filesystem-safe path segment.
///
/// Strips characters that are illegal on common filesystems, collapses runs of
/// whitespace to one space and truncates to [`MAX_SEGMENT_CHARS`]. Applying it
/// to its own output is a no-op.
pub fn sanitize_segment(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut pending_space = false;
    for c in input.chars() {
        // Tabs and newlines are control characters too; they still separate words.
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if is_forbidden(c) {
            continue;
        }
        if pending_space && !cleaned.is_empty() {
            cleaned.push(' ');
        }
        pending_space = false;
        cleaned.push(c);
    }

    let mut segment = truncate_chars(&cleaned, MAX_SEGMENT_CHARS)
        .trim_end()
        .to_string();
    if segment.chars().all(|c| c == '.') {
        segment = FALLBACK_SEGMENT.to_string();
    }
    if is_reserved_windows_name(&segment) {
        segment.push('_');
    }
    segment
}

/// Sanitized file name that ends in `.{ext}`, still within the segment limit.
pub fn file_name_with_extension(raw: &str, ext: &str) -> String {
    let suffix = format!(".{ext}");
    let name = sanitize_segment(raw);
    if name.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase()) {
        return name;
    }
    let budget = MAX_SEGMENT_CHARS - suffix.chars().count();
    let stem = truncate_chars(&name, budget).trim_end();
    let stem = if stem.is_empty() { FALLBACK_SEGMENT } else { stem };
    sanitize_segment(&format!("{stem}{suffix}"))
}

fn truncate_chars(input: &str, max: usize) -> &str {
    match input.char_indices().nth(max) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}' | '\u{7F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
