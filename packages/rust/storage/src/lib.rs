//! JSON-file model profile store.
//!
//! The [`ModelProfileStore`] keeps every [`ModelProfile`] in one JSON object
//! keyed by model id, next to the reserved `"default"` entry. Saves rewrite the
//! whole file through a temporary sibling and a rename, so readers never see
//! a half-written store.
//!
//! **Failure policy:** [`ModelProfileStore::load`] reports errors;
//! [`ModelProfileStore::load_or_default`] logs them and degrades to a
//! default-only [`ProfileBook`].

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use reqminer_shared::{DEFAULT_PROFILE_KEY, ModelProfile, ProfileBook, ReqMinerError, Result, Topic};

/// Handle to a profile store file. The file need not exist yet.
#[derive(Debug, Clone)]
pub struct ModelProfileStore {
    path: PathBuf,
}

impl ModelProfileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store. A missing file yields a default-only book.
    pub fn load(&self) -> Result<ProfileBook> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "profile store not found, using defaults");
            return Ok(ProfileBook::default());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| ReqMinerError::io(&self.path, e))?;

        serde_json::from_str(&content).map_err(|e| {
            ReqMinerError::Storage(format!(
                "failed to parse profile store {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Read the store, degrading to a default-only book on any error.
    pub fn load_or_default(&self) -> ProfileBook {
        match self.load() {
            Ok(book) => book,
            Err(e) => {
                warn!(error = %e, "could not load model profiles, using default orientation only");
                ProfileBook::default()
            }
        }
    }

    /// Create or overwrite the profile for `model_id`, stamping the current time,
    /// and persist the whole store.
    ///
    /// An existing store that fails to load is reported and left untouched.
    pub fn save(
        &self,
        model_id: &str,
        name: &str,
        orientation: &str,
        topics: Vec<Topic>,
    ) -> Result<ModelProfile> {
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(ReqMinerError::validation("model id must not be empty"));
        }
        if model_id == DEFAULT_PROFILE_KEY {
            return Err(ReqMinerError::validation(format!(
                "'{DEFAULT_PROFILE_KEY}' is reserved; use the default orientation command instead"
            )));
        }

        let topics: Vec<Topic> = topics
            .into_iter()
            .filter(|t| !t.name.trim().is_empty())
            .collect();

        let mut book = self.load()?;
        book.upsert(model_id, name, orientation, topics, Utc::now());
        self.write_book(&book)?;

        info!(model_id, topics = book.profiles[model_id].topics.len(), "model profile saved");
        Ok(book.profiles[model_id].clone())
    }

    /// Replace the fallback orientation stored under the reserved key.
    pub fn save_default_orientation(&self, orientation: &str) -> Result<()> {
        let mut book = self.load()?;
        book.default.orientation = orientation.to_string();
        self.write_book(&book)?;
        info!("default orientation saved");
        Ok(())
    }

    /// Human-readable enumeration of every named profile and its topics.
    pub fn list(&self) -> String {
        render_listing(&self.load_or_default())
    }

    /// Serialize `book` to a temporary sibling, then rename over the store.
    fn write_book(&self, book: &ProfileBook) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ReqMinerError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(book)
            .map_err(|e| ReqMinerError::Storage(format!("failed to serialize profiles: {e}")))?;

        let tmp = tmp_path(&self.path);
        std::fs::write(&tmp, json).map_err(|e| ReqMinerError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            ReqMinerError::io(&self.path, e)
        })?;

        debug!(
            path = %self.path.display(),
            profiles = book.profiles.len(),
            "profile store written"
        );
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "model_profiles.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Format the named profiles of `book`, one block per profile.
pub fn render_listing(book: &ProfileBook) -> String {
    if book.profiles.is_empty() {
        return "No model profiles saved.\n".to_string();
    }

    let mut out = String::from("Saved model profiles:\n");
    for (id, profile) in &book.profiles {
        let name = if profile.name.is_empty() { id.as_str() } else { profile.name.as_str() };
        let _ = write!(out, "\n  {id}: {name}");
        if let Some(ts) = profile.last_updated {
            let _ = write!(out, " (updated {})", ts.format("%Y-%m-%d %H:%M UTC"));
        }
        out.push('\n');

        if profile.topics.is_empty() {
            out.push_str("    topics: (none, generic categories)\n");
        } else {
            let names: Vec<&str> = profile.topics.iter().map(|t| t.name.as_str()).collect();
            let _ = writeln!(out, "    topics: {}", names.join(", "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqminer_shared::DEFAULT_ORIENTATION;
    use uuid::Uuid;

    /// A store path inside a fresh temp directory (not created yet).
    fn test_store() -> ModelProfileStore {
        let dir = std::env::temp_dir().join(format!("reqminer_profiles_{}", Uuid::now_v7()));
        ModelProfileStore::open(dir.join("model_profiles.json"))
    }

    #[test]
    fn missing_store_is_default_only() {
        let store = test_store();
        let book = store.load().unwrap();
        assert!(book.profiles.is_empty());
        assert_eq!(book.default.orientation, DEFAULT_ORIENTATION);
    }

    #[test]
    fn corrupt_store_degrades_to_default() {
        let store = test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(ReqMinerError::Storage(_))));
        let book = store.load_or_default();
        assert!(book.profiles.is_empty());
    }

    #[test]
    fn save_then_load() {
        let store = test_store();
        let saved = store
            .save(
                "X",
                "Edital de licitação",
                "Foque em prazos.",
                vec![Topic::new("Escopo"), Topic::new("Prazo")],
            )
            .unwrap();
        assert!(saved.last_updated.is_some());

        let book = store.load().unwrap();
        let profile = book.lookup("X").expect("saved profile");
        assert_eq!(profile.name, "Edital de licitação");
        assert_eq!(profile.topics, vec![Topic::new("Escopo"), Topic::new("Prazo")]);
        assert!(!tmp_path(store.path()).exists());
    }

    #[test]
    fn save_overwrites_and_keeps_others() {
        let store = test_store();
        store.save("A", "first", "o1", vec![Topic::new("T1")]).unwrap();
        store.save("B", "other", "o2", vec![]).unwrap();
        store.save("A", "second", "o3", vec![]).unwrap();

        let book = store.load().unwrap();
        assert_eq!(book.profiles.len(), 2);
        assert_eq!(book.profiles["A"].name, "second");
        assert!(book.profiles["A"].topics.is_empty());
        assert_eq!(book.profiles["B"].orientation, "o2");
    }

    #[test]
    fn save_preserves_default_entry() {
        let store = test_store();
        store.save_default_orientation("Responda em tópicos.").unwrap();
        store.save("X", "x", "ox", vec![]).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["default"]["orientation"], "Responda em tópicos.");
        assert_eq!(raw["X"]["name"], "x");
    }

    #[test]
    fn save_rejects_reserved_and_empty_ids() {
        let store = test_store();
        assert!(store.save("default", "n", "o", vec![]).is_err());
        assert!(store.save("  ", "n", "o", vec![]).is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn save_refuses_to_overwrite_unreadable_store() {
        let store = test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        let original = r#"{
            "default": {"orientation": "o"},
            "A": {"name": "keep me", "topics": [{"name": "Escopo"}]},
            "B": {"name": "bad", "topics": "Prazo"}
        }"#;
        std::fs::write(store.path(), original).unwrap();

        let err = store.save("Z", "new", "o", vec![]).unwrap_err();
        assert!(matches!(err, ReqMinerError::Storage(_)));
        assert!(store.save_default_orientation("x").is_err());

        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), original);
        assert!(!tmp_path(store.path()).exists());
    }

    #[test]
    fn blank_topics_are_dropped() {
        let store = test_store();
        let saved = store
            .save("X", "x", "o", vec![Topic::new("Escopo"), Topic::new("  ")])
            .unwrap();
        assert_eq!(saved.topics, vec![Topic::new("Escopo")]);
    }

    #[test]
    fn listing_shows_named_profiles_only() {
        let store = test_store();
        assert!(store.list().contains("No model profiles saved"));

        store
            .save("X", "Edital", "o", vec![Topic::new("Escopo"), Topic::new("Prazo")])
            .unwrap();
        store.save("Y", "", "o", vec![]).unwrap();

        let listing = store.list();
        assert!(listing.contains("X: Edital"));
        assert!(listing.contains("topics: Escopo, Prazo"));
        assert!(listing.contains("Y: Y"));
        assert!(listing.contains("generic categories"));
        assert!(!listing.contains("default"));
    }
}
