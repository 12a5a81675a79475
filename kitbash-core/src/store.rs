//! Snippet and category persistence over a pluggable key-value medium.
//!
//! The store keeps working copies in memory and writes the full collection
//! back under a fixed key after every mutation. Unreadable or missing
//! payloads fall back to the built-in defaults; opening a store never
//! fails.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::catalog;
use crate::defaults;
use crate::error::StoreError;
use crate::snippet::{Category, Snippet, SnippetDraft};

pub const SNIPPETS_KEY: &str = "kitbash-snippets";
pub const CATEGORIES_KEY: &str = "kitbash-categories";

/// Durable string storage keyed by name. `read` distinguishes "no payload"
/// from a failing medium; corrupt contents are the store's problem, not
/// the medium's.
pub trait KvMedium: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One JSON file per key inside a data directory. The directory is created
/// on first write, not on open.
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileMedium { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KvMedium for FileMedium {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Medium(e.to_string())),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Medium(e.to_string()))?;
        fs::write(self.path_for(key), value).map_err(|e| StoreError::Medium(e.to_string()))
    }
}

/// In-memory medium. Clones share the same entries, so a test can hold a
/// handle onto what a store persisted.
#[derive(Clone, Default)]
pub struct MemoryMedium {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        MemoryMedium::default()
    }
}

impl KvMedium for MemoryMedium {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn load_or_default<T: DeserializeOwned>(
    medium: &dyn KvMedium,
    key: &str,
    fallback: fn() -> Vec<T>,
) -> Vec<T> {
    match medium.read(key) {
        Ok(Some(payload)) => match serde_json::from_str(&payload) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("stored payload under '{}' is unreadable ({}); using defaults", key, e);
                fallback()
            }
        },
        Ok(None) => {
            log::debug!("no stored payload under '{}'; starting from defaults", key);
            fallback()
        }
        Err(e) => {
            log::warn!("medium failed reading '{}' ({}); using defaults", key, e);
            fallback()
        }
    }
}

/// The snippet catalog's backing store. Mutations update the in-memory
/// collection first and then persist it; when persisting fails the error
/// is reported but the in-memory change stands, mirroring how the catalog
/// treats storage as best-effort.
pub struct SnippetStore {
    medium: Box<dyn KvMedium>,
    snippets: Vec<Snippet>,
    categories: Vec<Category>,
}

impl SnippetStore {
    pub fn open(medium: Box<dyn KvMedium>) -> Self {
        let snippets = load_or_default(medium.as_ref(), SNIPPETS_KEY, defaults::snippets);
        let categories = load_or_default(medium.as_ref(), CATEGORIES_KEY, defaults::categories);
        SnippetStore { medium, snippets, categories }
    }

    /// All snippets in insertion order.
    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    /// Add a new snippet from a draft. The store assigns the id and both
    /// timestamps.
    pub fn create(&mut self, draft: SnippetDraft) -> Result<Snippet, StoreError> {
        let snippet = draft.into_snippet();
        self.snippets.push(snippet.clone());
        self.persist_snippets()?;
        Ok(snippet)
    }

    /// Replace the draft fields of an existing snippet, advancing
    /// `updated_at`. Id and `created_at` never change.
    pub fn update(&mut self, id: &str, draft: SnippetDraft) -> Result<Snippet, StoreError> {
        let snippet = self
            .snippets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownId { id: id.to_string() })?;
        snippet.title = draft.title;
        snippet.category = draft.category;
        snippet.description = draft.description;
        snippet.fragments = draft.fragments;
        snippet.updated_at = Utc::now();
        let updated = snippet.clone();
        self.persist_snippets()?;
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let pos = self
            .snippets
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownId { id: id.to_string() })?;
        self.snippets.remove(pos);
        self.persist_snippets()
    }

    /// Restore a built-in snippet to its factory fragments and metadata.
    /// Only snippets shipped in the defaults have a factory copy; resetting
    /// anything else is an error.
    pub fn reset(&mut self, id: &str) -> Result<Snippet, StoreError> {
        let pos = self
            .snippets
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownId { id: id.to_string() })?;
        let mut factory = defaults::snippets()
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NoFactoryCopy { id: id.to_string() })?;
        factory.updated_at = Utc::now();
        self.snippets[pos] = factory.clone();
        self.persist_snippets()?;
        Ok(factory)
    }

    /// Add a category named `name`, deriving its id as a slug. Rejects
    /// names that slugify to nothing and names colliding with an existing
    /// category (by name, case-insensitively, or by slug).
    pub fn add_category(
        &mut self,
        name: &str,
        icon: &str,
        description: Option<&str>,
    ) -> Result<Category, StoreError> {
        let name = name.trim();
        let id = catalog::slugify(name);
        if !catalog::is_valid_slug(&id) {
            return Err(StoreError::InvalidCategoryName {
                name: name.to_string(),
                reason: "must contain at least one letter or digit".to_string(),
            });
        }
        let collides = self
            .categories
            .iter()
            .any(|c| c.id == id || c.name.eq_ignore_ascii_case(name));
        if collides {
            return Err(StoreError::DuplicateCategory { name: name.to_string() });
        }
        let category = Category {
            id,
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.map(str::to_string),
        };
        self.categories.push(category.clone());
        self.persist_categories()?;
        Ok(category)
    }

    fn persist_snippets(&self) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&self.snippets)?;
        if let Err(e) = self.medium.write(SNIPPETS_KEY, &payload) {
            log::error!("failed to persist snippets: {}", e);
            return Err(e);
        }
        Ok(())
    }

    fn persist_categories(&self) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&self.categories)?;
        if let Err(e) = self.medium.write(CATEGORIES_KEY, &payload) {
            log::error!("failed to persist categories: {}", e);
            return Err(e);
        }
        Ok(())
    }
}
