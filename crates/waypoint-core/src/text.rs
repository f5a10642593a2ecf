use crate::constants::{FORMAT_PREFIX, MAX_NAME_LEN, MAX_TEXT_LEN, USER_FORMAT_PREFIX};
use crate::error::ValidationError;

/// Formatting codes clients understand after the `§` prefix.
const FORMAT_CODES: &str = "0123456789abcdefgklmnor";

/// Validate a waypoint name: 1..=64 bytes, ASCII alphanumeric once
/// underscores are stripped.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { max: MAX_NAME_LEN });
    }
    let mut stripped = name.chars().filter(|c| *c != '_').peekable();
    if stripped.peek().is_none() || !stripped.all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::NameNotAlphanumeric);
    }
    Ok(())
}

/// Runtime lookup key for a waypoint name.
pub fn lookup_key(name: &str) -> String {
    name.to_lowercase()
}

/// Expand `&`-prefixed formatting codes into `§` codes.
///
/// Returns `None` when the text contains control characters, which clients
/// refuse to display.
pub fn colorize(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_control() {
            return None;
        }
        if c == USER_FORMAT_PREFIX {
            if let Some(&code) = chars.peek() {
                if FORMAT_CODES.contains(code) {
                    out.push(FORMAT_PREFIX);
                    out.push(code);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    Some(out)
}

/// Colorize then clamp to `MAX_TEXT_LEN` characters.
pub fn normalize_text(input: &str) -> Option<String> {
    let expanded = colorize(input)?;
    Some(expanded.chars().take(MAX_TEXT_LEN).collect())
}

/// Normalize a waypoint title.
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    normalize_text(title).ok_or(ValidationError::InvalidTitle)
}

/// Normalize a display format.
pub fn normalize_display(display: &str) -> Result<String, ValidationError> {
    normalize_text(display).ok_or(ValidationError::InvalidDisplay)
}

/// Substitute `{TITLE}` and `{DISTANCE}` into a display format.
pub fn render_label(format: &str, title: &str, distance: f64) -> String {
    // Placeholders inside the title stay literal.
    let distance = format!("{}", distance.ceil() as i64);
    let mut out = String::with_capacity(format.len() + title.len());
    let mut rest = format;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix(crate::constants::FORMAT_TITLE) {
            out.push_str(title);
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix(crate::constants::FORMAT_DISTANCE) {
            out.push_str(&distance);
            rest = tail;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    out
}
