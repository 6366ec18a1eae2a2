// src/util.rs — Shared string helpers

/// Cut `s` to at most `max_len` bytes on a UTF-8 character boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Render a credential for display: first and last four characters only.
/// Short values are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len().max(4));
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_input() {
        assert_eq!(truncate_str("detail", 200), "detail");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(500);
        assert_eq!(truncate_str(&body, 200).len(), 200);
    }

    #[test]
    fn test_truncate_multibyte() {
        // "ねこた" is 9 bytes; cutting at 4 must not split the second char
        assert_eq!(truncate_str("ねこた", 4), "ね");
    }

    #[test]
    fn test_mask_long_token() {
        assert_eq!(mask_secret("eyJhbGciOiJIUzI1NiJ9.payload.sig"), "eyJh….sig");
    }

    #[test]
    fn test_mask_short_token() {
        assert_eq!(mask_secret("abc"), "****");
        assert_eq!(mask_secret("abcdefgh"), "********");
    }
}
