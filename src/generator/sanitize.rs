//! Shared name-sanitization helpers used by every generator.
//!
//! Each vendor has its own legal character set and truncation length, but
//! all of them need the same two primitives: strip/replace illegal
//! characters, then truncate (spec.md §4.5: "Names are sanitized to the
//! target vendor's legal character set; truncation length is vendor-defined").

/// Replace any character not in `allowed` with `_`, then truncate to
/// `max_len` bytes (on a char boundary).
#[must_use]
pub fn sanitize(name: &str, allowed: impl Fn(char) -> bool, max_len: usize) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if allowed(c) { c } else { '_' })
        .collect();
    truncate_chars(&cleaned, max_len)
}

fn truncate_chars(s: &str, max_len: usize) -> String {
    s.chars().take(max_len).collect()
}

/// FortiOS object names: alphanumerics, `-`, `_`, `.`; 79 bytes max.
#[must_use]
pub fn fortinet_name(name: &str) -> String {
    sanitize(name, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.', 79)
}

/// PAN-OS object names: alphanumerics, `-`, `_`, `.`, space; 63 bytes max.
/// Additionally collapses the ASA-derived `_eq` suffix artifact, collapses
/// double dashes, and maps `&`/`/` to `n` (spec.md §4.5.2 "Service-name
/// hygiene").
#[must_use]
pub fn paloalto_name(name: &str) -> String {
    let mapped: String = name.chars().map(|c| if c == '&' || c == '/' { 'n' } else { c }).collect();
    let without_eq_suffix = mapped.strip_suffix("_eq").unwrap_or(&mapped).to_string();
    let cleaned = sanitize(
        &without_eq_suffix,
        |c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == ' ',
        63,
    );
    collapse_double_dashes(&cleaned)
}

/// Cisco ASA object names: alphanumerics, `_`, `.`, `-`; 64 bytes max.
#[must_use]
pub fn asa_name(name: &str) -> String {
    sanitize(name, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.', 64)
}

/// Check Point object names: alphanumerics, `_`, `-`, space; 100 bytes max.
#[must_use]
pub fn checkpoint_name(name: &str) -> String {
    sanitize(name, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ' ', 100)
}

fn collapse_double_dashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = false;
    for c in s.chars() {
        if c == '-' {
            if last_dash {
                continue;
            }
            last_dash = true;
        } else {
            last_dash = false;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fortinet_name_replaces_illegal_chars_and_truncates() {
        assert_eq!(fortinet_name("web server!"), "web_server_");
        let long = "a".repeat(100);
        assert_eq!(fortinet_name(&long).len(), 79);
    }

    #[test]
    fn paloalto_name_strips_eq_suffix_and_maps_slash() {
        assert_eq!(paloalto_name("HTTP_eq"), "HTTP");
        assert_eq!(paloalto_name("A&B/C"), "AnBnC");
    }

    #[test]
    fn paloalto_name_collapses_double_dashes() {
        assert_eq!(paloalto_name("a--b"), "a-b");
    }

    #[test]
    fn asa_name_truncates_to_64() {
        let long = "x".repeat(100);
        assert_eq!(asa_name(&long).len(), 64);
    }

    #[test]
    fn checkpoint_name_allows_spaces() {
        assert_eq!(checkpoint_name("web server"), "web server");
    }
}
