//! Helpers for keeping client-supplied text single-line and bounded in log output.

/// Longest preview emitted for any one client string.
pub const MAX_LOG_PREVIEW: usize = 200;

/// Escape a client string for single-line logging.
///
/// Backslash, `\n`, `\r` and `\t` become their two-character escapes; other
/// control characters become `\xNN`. Output stops after [`MAX_LOG_PREVIEW`]
/// characters with a trailing `…`.
pub fn escape_log(s: &str) -> String {
    escape_log_capped(s, MAX_LOG_PREVIEW)
}

pub fn escape_log_capped(s: &str, cap: usize) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(s.len().min(cap) + 4);
    for (n, ch) in s.chars().enumerate() {
        if n == cap {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape and space-join command arguments for a debug line.
pub fn escape_args(args: &[String]) -> String {
    escape_log(&args.join(" "))
}
