use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One role or project record extracted from an experience/projects section.
///
/// `id` is sequential within a single parse (`exp-0`, `proj-1`, ...) and is not
/// stable across re-parses. `durable_id` is minted when the document is first
/// persisted and is what audit metadata refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_id: Option<Uuid>,
    pub company: String,
    pub role: String,
    #[serde(alias = "project")]
    pub title: String,
    pub original: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Entry {
    /// The text currently shown for this entry: the rewrite if any, else the original.
    pub fn live_text(&self) -> &str {
        self.optimized.as_deref().unwrap_or(&self.original)
    }

    /// Key used in audit metadata. Prefers the durable id.
    pub fn reference(&self) -> String {
        self.durable_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| self.id.clone())
    }

    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.durable_id.is_some_and(|id| id.to_string() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub experience: Vec<Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default)]
    pub projects: Vec<Entry>,
}

/// Structured resume document. Persisted as an opaque JSON value and replaced
/// wholesale on every optimization pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResume {
    pub sections: ResumeSections,
    pub raw_text: String,
}

impl ParsedResume {
    /// True when the segmenter found no section headings at all.
    pub fn is_unstructured(&self) -> bool {
        let s = &self.sections;
        s.summary.is_none()
            && s.education.is_none()
            && s.skills.is_none()
            && s.experience.is_empty()
            && s.projects.is_empty()
    }

    /// Mints a durable id for every entry that does not have one yet.
    pub fn assign_durable_ids(&mut self) {
        for entry in self
            .sections
            .experience
            .iter_mut()
            .chain(self.sections.projects.iter_mut())
        {
            if entry.durable_id.is_none() {
                entry.durable_id = Some(Uuid::new_v4());
            }
        }
    }

    pub fn find_entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.sections
            .experience
            .iter_mut()
            .chain(self.sections.projects.iter_mut())
            .find(|e| e.matches(key))
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, original: &str) -> Entry {
        Entry {
            id: id.to_string(),
            durable_id: None,
            company: "Acme Co".to_string(),
            role: "Engineer".to_string(),
            title: "Engineer at Acme Co".to_string(),
            original: original.to_string(),
            optimized: None,
            custom_prompt: None,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_live_text_prefers_optimized() {
        let mut e = entry("exp-0", "Built web apps");
        assert_eq!(e.live_text(), "Built web apps");
        e.optimized = Some("Built scalable web apps".to_string());
        assert_eq!(e.live_text(), "Built scalable web apps");
    }

    #[test]
    fn test_durable_ids_are_minted_once() {
        let mut resume = ParsedResume::default();
        resume.sections.experience.push(entry("exp-0", "a"));
        resume.assign_durable_ids();
        let first = resume.sections.experience[0].durable_id;
        assert!(first.is_some());
        resume.assign_durable_ids();
        assert_eq!(resume.sections.experience[0].durable_id, first);
    }

    #[test]
    fn test_find_entry_by_either_id() {
        let mut resume = ParsedResume::default();
        resume.sections.projects.push(entry("proj-0", "a"));
        resume.assign_durable_ids();
        let durable = resume.sections.projects[0].reference();
        assert!(resume.find_entry_mut("proj-0").is_some());
        assert!(resume.find_entry_mut(&durable).is_some());
        assert!(resume.find_entry_mut("proj-9").is_none());
    }

    #[test]
    fn test_legacy_project_field_deserializes_as_title() {
        let value = json!({
            "sections": {
                "experience": [{
                    "id": "exp-0",
                    "company": "Acme Co",
                    "role": "Engineer",
                    "project": "Engineer at Acme Co",
                    "original": "Built web apps"
                }]
            },
            "rawText": "..."
        });
        let resume = ParsedResume::from_value(value).unwrap();
        assert_eq!(resume.sections.experience[0].title, "Engineer at Acme Co");
        assert!(resume.sections.projects.is_empty());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let mut resume = ParsedResume {
            raw_text: "Summary\nHello".to_string(),
            ..Default::default()
        };
        resume.sections.summary = Some("Hello".to_string());
        resume.sections.experience.push(entry("exp-0", "Built web apps"));
        let value = resume.to_value().unwrap();
        assert_eq!(value["rawText"], "Summary\nHello");
        assert_eq!(ParsedResume::from_value(value).unwrap(), resume);
    }
}
