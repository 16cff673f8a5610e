//! PII Redactor: replaces emails, phone numbers, SSNs and street addresses
//! with fixed placeholder tokens.
//!
//! Substitutions run in a fixed order. Placeholders contain no `@` and no
//! digits, so they never match any pattern and redaction is idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

pub const EMAIL_PLACEHOLDER: &str = "[EMAIL_REDACTED]";
pub const PHONE_PLACEHOLDER: &str = "[PHONE_REDACTED]";
pub const SSN_PLACEHOLDER: &str = "[SSN_REDACTED]";
pub const ADDRESS_PLACEHOLDER: &str = "[ADDRESS_REDACTED]";

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email pattern is valid")
});

static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}")
        .expect("phone pattern is valid")
});

static SSN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn pattern is valid"));

// Single-line: a house number, one or more words, then a street suffix word.
static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:[ \t]+[a-z]+)+?[ \t]+(?:street|st|avenue|ave|road|rd|drive|dr|lane|ln|boulevard|blvd)\b",
    )
    .expect("address pattern is valid")
});

/// Redacts PII from `text`. Unmatched text passes through unchanged.
pub fn redact_pii(text: &str) -> String {
    let text = EMAIL.replace_all(text, EMAIL_PLACEHOLDER);
    let text = PHONE.replace_all(&text, PHONE_PLACEHOLDER);
    let text = SSN.replace_all(&text, SSN_PLACEHOLDER);
    ADDRESS.replace_all(&text, ADDRESS_PLACEHOLDER).into_owned()
}
