//! MarkdownV2 escaping helpers.
//!
//! Telegram's MarkdownV2 dialect treats a fixed set of characters as
//! formatting controls; any of them appearing literally in message text must
//! be backslash-escaped or the API rejects the message.

/// Characters reserved by MarkdownV2.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Escape every reserved character in `text` with a backslash.
///
/// Apply exactly once per literal span. Escaping already-escaped text
/// double-escapes it; the caller is responsible for not doing that.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape `text` and wrap it in bold delimiters.
pub fn bold(text: &str) -> String {
    format!("*{}*", escape(text))
}

/// Escape `text` and wrap it in italic delimiters.
pub fn italic(text: &str) -> String {
    format!("_{}_", escape(text))
}
