// Output formatting: terminal display and report generation.

pub mod markdown;
pub mod terminal;

/// One-line preview of `text`: whitespace runs collapse to a single space and
/// anything past `max_chars` characters is replaced by "...".
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", flat[..cut].trim_end()),
        None => flat,
    }
}
