//! Snippet entity model: the markup/style/script fragment triple plus the
//! catalog metadata persisted around it. Serialized camelCase so stored
//! payloads keep the shape the catalog UI reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three source fragments defining one snippet. Mutated freely while
/// editing; render and execution always consume the current triple as one
/// unit, never a stale fragment mixed with a fresh one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentSet {
    pub markup: String,
    pub style: String,
    pub script: String,
}

impl FragmentSet {
    pub fn new(markup: &str, style: &str, script: &str) -> Self {
        FragmentSet {
            markup: markup.to_string(),
            style: style.to_string(),
            script: script.to_string(),
        }
    }
}

/// A persisted snippet record. Built-in snippets carry readable slug ids so
/// they can be reset to their factory copies; created snippets get UUID v4
/// ids. `updated_at` advances on every persisted edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub fragments: FragmentSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a snippet excluding id and timestamps; what a create or update
/// call supplies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetDraft {
    pub title: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub fragments: FragmentSet,
}

impl SnippetDraft {
    /// Materialize the draft as a new snippet with a fresh id and
    /// `created_at = updated_at = now`.
    pub fn into_snippet(self) -> Snippet {
        let now = Utc::now();
        Snippet {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            category: self.category,
            description: self.description,
            fragments: self.fragments,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Snippet> for SnippetDraft {
    fn from(snippet: &Snippet) -> Self {
        SnippetDraft {
            title: snippet.title.clone(),
            category: snippet.category.clone(),
            description: snippet.description.clone(),
            fragments: snippet.fragments.clone(),
        }
    }
}

/// A snippet category. Counts are computed from the snippet list by the
/// catalog, never stored; stale stored `count` fields are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_serializes_camel_case_with_flat_fragments() {
        let draft = SnippetDraft {
            title: "Primary Button".to_string(),
            category: "buttons".to_string(),
            description: Some("A button".to_string()),
            fragments: FragmentSet::new("<button>Go</button>", ".btn {}", "print('hi')"),
        };
        let snippet = draft.into_snippet();
        let json = serde_json::to_string(&snippet).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
        assert!(json.contains("\"markup\":\"<button>Go</button>\""));
        assert!(!json.contains("fragments"));

        let back: Snippet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snippet);
    }

    #[test]
    fn test_category_ignores_stored_count_field() {
        let json = r#"{"id":"buttons","name":"Buttons","icon":"mouse-pointer","count":6}"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.id, "buttons");
        assert_eq!(category.description, None);
    }

    #[test]
    fn test_created_ids_are_unique() {
        let a = SnippetDraft::default().into_snippet();
        let b = SnippetDraft::default().into_snippet();
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
    }
}
