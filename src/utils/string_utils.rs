//! UTF-8-safe string truncation utilities
//!
//! Page titles, dedup keys and console messages come from arbitrary pages, so
//! slicing by byte offset would panic on multi-byte characters.

/// Truncate to at most `max_chars` characters (not bytes)
///
/// # Examples
/// ```
/// # use kodegen_tools_pagearchive::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("日本語のタイトル", 3), "日本語");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
#[must_use]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Truncate to at most `max_chars` characters, cutting at the last
/// whitespace within that range when there is one
///
/// # Examples
/// ```
/// # use kodegen_tools_pagearchive::utils::string_utils::truncate_at_word;
/// assert_eq!(truncate_at_word("Access denied for this request", 16), "Access denied");
/// assert_eq!(truncate_at_word("Unbroken", 4), "Unbr");
/// ```
#[must_use]
pub fn truncate_at_word(s: &str, max_chars: usize) -> &str {
    let head = safe_truncate_chars(s, max_chars);
    if head.len() == s.len() {
        return s;
    }
    match head.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => head[..idx].trim_end(),
        _ => head,
    }
}
