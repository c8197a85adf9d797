//! Core domain types shared by the extraction pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved profile store key holding the fallback orientation.
pub const DEFAULT_PROFILE_KEY: &str = "default";

/// File name prefix of the consolidated-context output (`CONTEXTO_<id>.txt`).
pub const CONTEXT_FILE_PREFIX: &str = "CONTEXTO_";

/// File name prefix of the executive-summary output (`RESUMO_IA_<id>.txt`).
pub const SUMMARY_FILE_PREFIX: &str = "RESUMO_IA_";

/// Orientation used when no profile store exists or it lacks a default entry.
pub const DEFAULT_ORIENTATION: &str = "Extraia de forma objetiva os requisitos técnicos, \
regras de negócio e restrições descritos no texto, mantendo a terminologia original do documento.";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 identifier for one pipeline run (time-sortable, used in logs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Chunk / ExtractionResult
// ---------------------------------------------------------------------------

/// A word window of the corpus text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the chunk sequence.
    pub index: usize,
    /// Space-joined words of this window.
    pub text: String,
    /// Number of words in the window.
    pub word_count: usize,
}

/// Text extracted from one chunk that carried relevant content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Index of the chunk this text came from.
    pub chunk_index: usize,
    /// Trimmed model response.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Model profiles
// ---------------------------------------------------------------------------

/// A named extraction topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A persisted bundle of prompt orientation and topics for one document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-text instruction appended to the extraction persona.
    #[serde(default)]
    pub orientation: String,
    /// Ordered topic list; empty means the generic four-category prompt.
    #[serde(default)]
    pub topics: Vec<Topic>,
    /// When the profile was last saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// The reserved `"default"` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultProfile {
    #[serde(default = "default_orientation")]
    pub orientation: String,
}

impl Default for DefaultProfile {
    fn default() -> Self {
        Self {
            orientation: default_orientation(),
        }
    }
}

fn default_orientation() -> String {
    DEFAULT_ORIENTATION.into()
}

/// All persisted profiles, keyed by model id, plus the default entry.
///
/// Serialized as one flat JSON object: `{"default": {...}, "<id>": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileBook {
    #[serde(default)]
    pub default: DefaultProfile,
    #[serde(flatten)]
    pub profiles: BTreeMap<String, ModelProfile>,
}

/// Where a resolved profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    /// A named profile from the store.
    Stored,
    /// No model id was given.
    Default,
    /// A model id was given but is not in the store.
    UnknownFallback,
}

/// The orientation and topics an extraction run actually uses.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    pub model_id: Option<String>,
    pub orientation: String,
    pub topics: Vec<Topic>,
    pub source: ProfileSource,
}

impl ProfileBook {
    /// Look up a named profile. The reserved default key is never returned here.
    pub fn lookup(&self, model_id: &str) -> Option<&ModelProfile> {
        if model_id == DEFAULT_PROFILE_KEY {
            return None;
        }
        self.profiles.get(model_id)
    }

    /// Resolve the active profile, falling back to the default orientation
    /// with no topics when `model_id` is absent or unknown.
    pub fn resolve(&self, model_id: Option<&str>) -> ResolvedProfile {
        let fallback = |source| ResolvedProfile {
            model_id: model_id.map(String::from),
            orientation: self.default.orientation.clone(),
            topics: Vec::new(),
            source,
        };

        match model_id {
            None | Some(DEFAULT_PROFILE_KEY) => fallback(ProfileSource::Default),
            Some(id) => match self.lookup(id) {
                Some(profile) => ResolvedProfile {
                    model_id: Some(id.to_string()),
                    orientation: profile.orientation.clone(),
                    topics: profile.topics.clone(),
                    source: ProfileSource::Stored,
                },
                None => {
                    tracing::warn!(
                        model_id = id,
                        "unknown model profile, using default orientation"
                    );
                    fallback(ProfileSource::UnknownFallback)
                }
            },
        }
    }

    /// Insert or overwrite a profile, stamping it with `now`.
    pub fn upsert(
        &mut self,
        model_id: &str,
        name: &str,
        orientation: &str,
        topics: Vec<Topic>,
        now: DateTime<Utc>,
    ) {
        self.profiles.insert(
            model_id.to_string(),
            ModelProfile {
                name: name.to_string(),
                orientation: orientation.to_string(),
                topics,
                last_updated: Some(now),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_x() -> ProfileBook {
        let mut book = ProfileBook::default();
        book.upsert(
            "X",
            "Edital",
            "Foque em prazos contratuais.",
            vec![Topic::new("Escopo"), Topic::new("Prazo")],
            Utc::now(),
        );
        book
    }

    #[test]
    fn run_id_is_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn resolve_known_profile() {
        let resolved = book_with_x().resolve(Some("X"));
        assert_eq!(resolved.source, ProfileSource::Stored);
        assert_eq!(resolved.orientation, "Foque em prazos contratuais.");
        let names: Vec<_> = resolved.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Escopo", "Prazo"]);
    }

    #[test]
    fn resolve_unknown_and_absent_fall_back() {
        let book = book_with_x();

        let unknown = book.resolve(Some("Y"));
        assert_eq!(unknown.source, ProfileSource::UnknownFallback);
        assert_eq!(unknown.orientation, DEFAULT_ORIENTATION);
        assert!(unknown.topics.is_empty());

        let absent = book.resolve(None);
        assert_eq!(absent.source, ProfileSource::Default);
        assert!(absent.topics.is_empty());
    }

    #[test]
    fn default_key_is_not_a_named_profile() {
        let book = book_with_x();
        assert!(book.lookup(DEFAULT_PROFILE_KEY).is_none());
        assert_eq!(book.resolve(Some("default")).source, ProfileSource::Default);
    }

    #[test]
    fn profile_book_json_shape() {
        let json = r#"{
            "default": {"orientation": "Seja objetivo."},
            "X": {
                "name": "Edital",
                "orientation": "Foque em prazos.",
                "topics": [{"name": "Escopo"}, {"name": "Prazo"}],
                "last_updated": "2026-01-10T12:00:00Z"
            }
        }"#;
        let book: ProfileBook = serde_json::from_str(json).expect("parse");
        assert_eq!(book.default.orientation, "Seja objetivo.");
        assert_eq!(book.profiles.len(), 1);
        assert_eq!(book.profiles["X"].topics.len(), 2);
        assert!(book.profiles["X"].last_updated.is_some());

        let out = serde_json::to_value(&book).expect("serialize");
        assert!(out.get("default").is_some());
        assert_eq!(out["X"]["name"], "Edital");
    }

    #[test]
    fn missing_default_entry_uses_builtin_orientation() {
        let book: ProfileBook = serde_json::from_str(r#"{"X": {"name": "n"}}"#).expect("parse");
        assert_eq!(book.default.orientation, DEFAULT_ORIENTATION);
        assert!(book.profiles["X"].topics.is_empty());
    }
}
