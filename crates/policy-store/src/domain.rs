//! Domain name canonicalization and matching.

use crate::error::PolicyError;

/// Canonicalize a domain: lower-case, strip a leading scheme, a trailing
/// dot, and a leading `www.`.
///
/// Rejects empty strings, names containing whitespace, and names with no
/// dot (since a single label can never be a real destination).
pub fn normalize(raw: &str) -> Result<String, PolicyError> {
    let mut s = raw.trim();
    if s.is_empty() {
        return Err(PolicyError::Validation {
            message: "domain is empty".to_string(),
        });
    }
    if s.chars().any(char::is_whitespace) {
        return Err(PolicyError::Validation {
            message: format!("domain {raw:?} contains whitespace"),
        });
    }

    if let Some(rest) = s.split_once("://") {
        s = rest.1;
    }
    let mut s = s.to_ascii_lowercase();

    if let Some(rest) = s.strip_suffix('.') {
        s = rest.to_string();
    }
    if let Some(rest) = s.strip_prefix("www.") {
        s = rest.to_string();
    }

    if !s.contains('.') {
        return Err(PolicyError::Validation {
            message: format!("domain {raw:?} has no dot"),
        });
    }

    Ok(s)
}

/// True iff query `q` (already canonical) matches stored pattern `p`
/// (already canonical): exact match, or `q` is a subdomain of `p`.
pub fn matches(query: &str, pattern: &str) -> bool {
    query == pattern || query.ends_with(&format!(".{pattern}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_scheme_and_case_and_dot() {
        assert_eq!(normalize("HTTPS://Twitter.com.").unwrap(), "twitter.com");
    }

    #[test]
    fn strips_leading_www() {
        assert_eq!(normalize("www.reddit.com").unwrap(), "reddit.com");
    }

    #[test]
    fn rejects_whitespace() {
        assert!(normalize("twitter.com evil").is_err());
    }

    #[test]
    fn rejects_missing_dot() {
        assert!(normalize("localhost").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(normalize("   ").is_err());
    }

    #[test]
    fn subdomain_matches() {
        assert!(matches("m.youtube.com", "youtube.com"));
        assert!(matches("youtube.com", "youtube.com"));
        assert!(!matches("notyoutube.com", "youtube.com"));
        assert!(!matches("youtube.com.evil.com", "youtube.com"));
    }
}
