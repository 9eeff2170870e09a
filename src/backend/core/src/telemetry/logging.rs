//! Log filtering and credential redaction.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

const REPLACEMENT: &str = "[REDACTED]";

/// `RUST_LOG` wins over the configured level when set.
pub fn build_filter(level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(level)?),
    }
}

fn credential_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(bearer\s+)[A-Za-z0-9\-._~+/]+=*",
            r"(?i)((?:access_)?token=)[^&\s]+",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Mask bearer tokens and `token=` query parameters before a value is logged.
pub fn redact_credentials(input: &str) -> Cow<'_, str> {
    let mut output = Cow::Borrowed(input);
    for pattern in credential_patterns() {
        if pattern.is_match(&output) {
            let replaced = pattern
                .replace_all(&output, format!("${{1}}{}", REPLACEMENT).as_str())
                .into_owned();
            output = Cow::Owned(replaced);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_bearer_token() {
        assert_eq!(
            redact_credentials("Bearer eyJhbGciOiJIUzI1NiJ9.e30.sig"),
            "Bearer [REDACTED]"
        );
    }

    #[test]
    fn test_redacts_query_token() {
        assert_eq!(
            redact_credentials("/appointments?access_token=abc123&page=2"),
            "/appointments?access_token=[REDACTED]&page=2"
        );
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        let input = "/businesses/42/appointments";
        assert!(matches!(redact_credentials(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_invalid_level_is_an_error() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(build_filter("info,=[").is_err());
            assert!(build_filter("salon_core=debug").is_ok());
        }
    }
}
