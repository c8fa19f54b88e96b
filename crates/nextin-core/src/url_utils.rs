use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

static HTTP_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://.+").expect("invalid http url regex"));

/// Rejected user input; the analysis request is never sent
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter a URL")]
    Empty,
    #[error("Please enter a valid URL starting with http:// or https://")]
    InvalidUrl,
}

/// Validate a website address typed by the user.
///
/// Returns the trimmed input as sent to the analysis service.
pub fn validate_target_url(input: &str) -> Result<String, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    if !HTTP_URL.is_match(trimmed) {
        return Err(InputError::InvalidUrl);
    }
    match Url::parse(trimmed) {
        Ok(parsed) if parsed.host_str().is_some_and(|h| !h.is_empty()) => Ok(trimmed.to_string()),
        _ => Err(InputError::InvalidUrl),
    }
}

/// Shorten `text` to at most `max_chars` characters, ending in `...`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
