//! Entry Extractor: turns the raw text of an `experience` or `projects`
//! section into individual entries.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::resume::Entry;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const PROJECT_COMPANY: &str = "Personal Project";
pub const PROJECT_ROLE: &str = "Developer";

static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    let month = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+";
    Regex::new(&format!(
        r"(?i)\b((?:{month})?\d{{4}})\s*(?:-|–|—|to)\s*((?:{month})?\d{{4}}|present|current|now)\b"
    ))
    .expect("date range pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Experience,
    Project,
}

impl EntryKind {
    fn id_prefix(self) -> &'static str {
        match self {
            EntryKind::Experience => "exp",
            EntryKind::Project => "proj",
        }
    }
}

/// Extracts role entries from an `experience` section.
pub fn extract_experience(text: &str) -> Vec<Entry> {
    extract(text, EntryKind::Experience)
}

/// Extracts project entries from a `projects` section.
pub fn extract_projects(text: &str) -> Vec<Entry> {
    extract(text, EntryKind::Project)
}

fn extract(text: &str, kind: EntryKind) -> Vec<Entry> {
    split_fragments(text)
        .into_iter()
        .filter(|lines| lines.len() >= 2)
        .filter_map(|lines| build_entry(&lines, kind))
        .enumerate()
        .map(|(n, mut entry)| {
            entry.id = format!("{}-{n}", kind.id_prefix());
            entry
        })
        .collect()
}

/// Splits a section into entry fragments, each a list of trimmed non-blank lines.
///
/// Paragraphs (blank-line separated) are the fragments when the block has
/// more than one. Otherwise a fragment boundary is a newline directly followed
/// by an upper-case letter, the newline belonging to the next fragment.
fn split_fragments(text: &str) -> Vec<Vec<&str>> {
    let paragraphs = split_paragraphs(text);
    let raw: Vec<&str> = if paragraphs.len() > 1 {
        paragraphs
    } else {
        split_before_capitalized_lines(text)
    };
    raw.into_iter()
        .map(|fragment| {
            fragment
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|lines| !lines.is_empty())
        .collect()
}

fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                paragraphs.push(&text[s..end]);
            }
        } else {
            start.get_or_insert(offset);
            end = offset + line.len();
        }
        offset += line.len();
    }
    if let Some(s) = start {
        paragraphs.push(&text[s..end]);
    }
    paragraphs
}

fn split_before_capitalized_lines(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c != '\n' {
            continue;
        }
        if let Some(&(_, next)) = chars.peek() {
            if next.is_uppercase() && idx > start {
                fragments.push(&text[start..idx]);
                start = idx;
            }
        }
    }
    fragments.push(&text[start..]);
    fragments
}

fn build_entry(lines: &[&str], kind: EntryKind) -> Option<Entry> {
    let header = lines[0];
    let secondary = lines.get(1).copied();

    let (role, company, title, body) = match kind {
        EntryKind::Experience => {
            let (role, company) = split_role_company(header, secondary);
            let title = format!("{role} at {company}");
            let body = match lines[2..].join("\n").trim() {
                "" => lines[1..].join("\n").trim().to_string(),
                body => body.to_string(),
            };
            (role, company, title, body)
        }
        EntryKind::Project => (
            PROJECT_ROLE.to_string(),
            PROJECT_COMPANY.to_string(),
            header.to_string(),
            lines[1..].join("\n").trim().to_string(),
        ),
    };

    if body.is_empty() {
        return None;
    }

    let (start_date, end_date) = [Some(header), secondary]
        .into_iter()
        .flatten()
        .find_map(find_date_range)
        .unzip();

    Some(Entry {
        id: String::new(),
        durable_id: None,
        company,
        role,
        title,
        original: body,
        optimized: None,
        custom_prompt: None,
        start_date,
        end_date,
    })
}

fn split_role_company(header: &str, secondary: Option<&str>) -> (String, String) {
    if header.contains('|') || header.contains('-') {
        let mut parts = header.split(['|', '-']).map(str::trim);
        let role = parts.next().unwrap_or_default().to_string();
        let company = parts
            .next()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_COMPANY)
            .to_string();
        return (role, company);
    }
    let company = secondary
        .and_then(|line| line.split(['|', '-', ',']).next())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN_COMPANY)
        .to_string();
    (header.to_string(), company)
}

fn find_date_range(line: &str) -> Option<(String, String)> {
    let caps = DATE_RANGE.captures(line)?;
    Some((caps[1].trim().to_string(), caps[2].trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROLES: &str = "Senior Engineer - Acme Co\nSan Francisco\nBuilt X, improved Y by 40%.\n\nJunior Dev - Beta Inc\nRemote\nWrote tests.";

    #[test]
    fn test_two_entry_block_yields_two_entries() {
        let entries = extract_experience(TWO_ROLES);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].role, "Senior Engineer");
        assert_eq!(entries[0].company, "Acme Co");
        assert_eq!(entries[0].title, "Senior Engineer at Acme Co");
        assert_eq!(entries[0].original, "Built X, improved Y by 40%.");
        assert_eq!(entries[0].id, "exp-0");

        assert_eq!(entries[1].role, "Junior Dev");
        assert_eq!(entries[1].company, "Beta Inc");
        assert_eq!(entries[1].original, "Wrote tests.");
        assert_eq!(entries[1].id, "exp-1");
    }

    #[test]
    fn test_capitalized_line_split_keeps_bullets_with_header() {
        let text = "Staff Engineer | Gamma\n• led the storage rewrite\n• cut p99 by 30%\nIntern | Delta\n• fixed bugs";
        let entries = extract_experience(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].company, "Gamma");
        // line 1 is read as the secondary (location) line
        assert_eq!(entries[0].original, "• cut p99 by 30%");
        assert_eq!(entries[1].role, "Intern");
        assert_eq!(entries[1].original, "• fixed bugs");
    }

    #[test]
    fn test_company_from_second_line_when_header_has_no_separator() {
        let text = "Platform Engineer\nOmega Corp, Berlin\nRan the Kubernetes fleet.";
        let entries = extract_experience(&format!("{text}\n\nX"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role, "Platform Engineer");
        assert_eq!(entries[0].company, "Omega Corp");
        assert_eq!(entries[0].original, "Ran the Kubernetes fleet.");
    }

    #[test]
    fn test_single_line_fragments_are_dropped() {
        let entries = extract_experience("Just a header\n\nAnother lonely line");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_ids_follow_surviving_entries() {
        let text = "Lonely header\n\nEngineer - Acme\nShipped it\n\nDev - Beta\nTested it";
        let entries = extract_experience(text);
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["exp-0", "exp-1"]);
    }

    #[test]
    fn test_body_falls_back_to_second_line() {
        let entries = extract_experience("Engineer - Acme\nShipped the billing system\n\nZ");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original, "Shipped the billing system");
    }

    #[test]
    fn test_projects_use_header_as_title() {
        let text = "Rust Compiler\nA toy compiler for a Lisp dialect\nwritten over a weekend\n\nBlog\nstatic site";
        let entries = extract_projects(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "proj-0");
        assert_eq!(entries[0].title, "Rust Compiler");
        assert_eq!(entries[0].company, PROJECT_COMPANY);
        assert_eq!(entries[0].role, PROJECT_ROLE);
        assert_eq!(
            entries[0].original,
            "A toy compiler for a Lisp dialect\nwritten over a weekend"
        );
        assert_eq!(entries[1].title, "Blog");
    }

    #[test]
    fn test_date_range_is_captured() {
        let text = "Senior Engineer | Acme Co\nJan 2020 - Present\nBuilt the data platform.\n\nZ";
        let entries = extract_experience(text);
        assert_eq!(entries[0].start_date.as_deref(), Some("Jan 2020"));
        assert_eq!(entries[0].end_date.as_deref(), Some("Present"));
    }

    #[test]
    fn test_empty_section_yields_nothing() {
        assert!(extract_experience("").is_empty());
        assert!(extract_projects("   \n  ").is_empty());
    }
}
