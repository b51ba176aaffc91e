//! Pattern-based redaction of free text.
//!
//! Error messages and log lines routinely carry SQL, connection strings,
//! tokens and file paths. [`redact`] rewrites them with fixed placeholders so
//! the text stays useful for diagnosis without leaking values.
//!
//! Patterns run in a fixed order: stack traces first (they swallow the rest
//! of the message), then credentials, then personal identifiers, then SQL,
//! and paths last.

use regex::Regex;
use std::{error::Error, sync::OnceLock};

pub const REDACTED: &str = "[REDACTED]";
pub const REDACTED_CREDENTIAL: &str = "[REDACTED_CREDENTIAL]";
pub const REDACTED_KEY: &str = "[REDACTED_KEY]";
pub const REDACTED_JWT: &str = "[REDACTED_JWT]";
pub const REDACTED_EMAIL: &str = "[REDACTED_EMAIL]";
pub const REDACTED_UUID: &str = "[REDACTED_UUID]";
pub const REDACTED_PATH: &str = "[REDACTED_PATH]";
pub const STACK_TRACE_REDACTED: &str = "[STACK_TRACE_REDACTED]";
pub const SQL_VALUES_REDACTED: &str = "[SQL_VALUES_REDACTED]";
pub const SQL_WHERE_REDACTED: &str = "[SQL_WHERE_REDACTED]";

struct Pattern {
    regex: Regex,
    replacement: String,
}

const RULES: &[(&str, &str)] = &[
    // stack traces
    (
        r"(?s)(?:thread '[^']*' panicked at|stack backtrace:|goroutine \d+ \[).*",
        STACK_TRACE_REDACTED,
    ),
    // scheme://user:password@
    (r"(?i)\b[a-z][a-z0-9+.-]*://[^\s/@]+@", REDACTED_CREDENTIAL),
    (
        r"\beyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
        REDACTED_JWT,
    ),
    (
        r#"(?i)\b(password|passwd|pwd)(\s*[=:]\s*['"]?)[^'"&\s,]{3,}"#,
        "${1}${2}[REDACTED_CREDENTIAL]",
    ),
    (
        r#"(?i)\b(api[_-]?key|access[_-]?key|token|secret|auth)(\s*[=:]\s*['"]?)[A-Za-z0-9_\-.~+/]{8,}"#,
        "${1}${2}[REDACTED_KEY]",
    ),
    (r"\bAKIA[0-9A-Z]{16}\b", REDACTED_KEY),
    (
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        REDACTED_EMAIL,
    ),
    (
        r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b",
        REDACTED_UUID,
    ),
    // SQL keeps the verb and target, drops everything up to the statement end
    (
        r"(?i)\bSELECT\s[^;]*?\bFROM\s+([\w.]+)[^;]*",
        "SELECT FROM ${1} [SQL_VALUES_REDACTED]",
    ),
    (
        r"(?i)\bINSERT\s+INTO\s+([\w.]+)[^;]*",
        "INSERT INTO ${1} [SQL_VALUES_REDACTED]",
    ),
    (
        r"(?i)\bUPDATE\s+([\w.]+)\s+SET\b[^;]*",
        "UPDATE ${1} SET [SQL_VALUES_REDACTED]",
    ),
    (
        r"(?i)\bDELETE\s+FROM\s+([\w.]+)[^;]*",
        "DELETE FROM ${1} [SQL_WHERE_REDACTED]",
    ),
    // postgres constraint detail: Key (email)=(value)
    (r"Key \(([^)]*)\)=\(([^)]*)\)", "Key (${1})=([REDACTED])"),
    (
        r#"(^|[\s'"(=])((?:/[\w.-]+){2,})"#,
        "${1}[REDACTED_PATH]",
    ),
    (r"(?i)\b[a-z]:\\[^\\\s]+(?:\\[^\\\s]+)+", REDACTED_PATH),
];

fn patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        RULES
            .iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|regex| Pattern {
                    regex,
                    replacement: (*replacement).to_string(),
                })
            })
            .collect()
    })
}

/// Redact sensitive fragments from `input`.
#[must_use]
pub fn redact(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    patterns().iter().fold(input.to_string(), |text, pattern| {
        pattern
            .regex
            .replace_all(&text, pattern.replacement.as_str())
            .into_owned()
    })
}

/// Redact an error message, including its chain of sources.
#[must_use]
pub fn redact_error(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    redact(&message)
}
