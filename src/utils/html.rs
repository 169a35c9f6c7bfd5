// src/utils/html.rs

use ammonia;

/// Whitelist-based sanitization of admin-authored material content.
///
/// Preserves safe formatting tags while stripping <script>, <iframe> and
/// event-handler attributes. Fail-safe against stored XSS reaching the
/// study pages.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
