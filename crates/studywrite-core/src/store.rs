//! Local document store.
//!
//! The editing session mirrors one document out of a store and writes
//! plain-text content back to it. The store owns persistence; the
//! session treats `content` as the authoritative body verbatim. Only
//! local backends exist here — a directory of `.txt` files for the CLI
//! and an in-memory map for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// A document as loaded from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// Store-scoped identity, stable across saves.
    pub id: String,
    pub title: String,
    /// The plain-text body.
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry: everything but the body.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// Persistence collaborator behind the editing session.
pub trait DocumentStore {
    /// Loads a document by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not exist or cannot be read.
    fn load(&self, id: &str) -> Result<DocumentRecord>;

    /// Writes new content for an existing document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn save(&mut self, id: &str, content: &str) -> Result<()>;

    /// Creates a new empty document and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be created.
    fn create(&mut self, title: &str) -> Result<DocumentRecord>;

    /// Lists all documents in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list(&self) -> Result<Vec<DocumentMeta>>;
}

/// A store backed by a directory of UTF-8 `.txt` files.
///
/// The document id is the file stem; the title is the first non-empty
/// line of the content, falling back to the stem; `updated_at` comes
/// from the file modification time.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("failed to create store directory: {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.txt"))
    }

    fn record_from_path(&self, id: &str, path: &Path) -> Result<DocumentRecord> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document: {}", path.display()))?;
        let updated_at = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(DocumentRecord {
            id: id.to_string(),
            title: title_of(&content, id),
            content,
            updated_at,
        })
    }
}

impl DocumentStore for FileStore {
    fn load(&self, id: &str) -> Result<DocumentRecord> {
        let path = self.path_for(id);
        if !path.is_file() {
            anyhow::bail!("no document with id '{id}' in {}", self.root.display());
        }
        self.record_from_path(id, &path)
    }

    fn save(&mut self, id: &str, content: &str) -> Result<()> {
        let path = self.path_for(id);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write document: {}", path.display()))?;
        tracing::debug!(id, chars = content.chars().count(), "document saved");
        Ok(())
    }

    fn create(&mut self, title: &str) -> Result<DocumentRecord> {
        let base = slugify(title);
        let mut id = base.clone();
        let mut n = 1;
        while self.path_for(&id).exists() {
            n += 1;
            id = format!("{base}-{n}");
        }
        let path = self.path_for(&id);
        std::fs::write(&path, "")
            .with_context(|| format!("failed to create document: {}", path.display()))?;
        Ok(DocumentRecord {
            id,
            title: title.to_string(),
            content: String::new(),
            updated_at: Utc::now(),
        })
    }

    fn list(&self) -> Result<Vec<DocumentMeta>> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read store directory: {}", self.root.display()))?;
        let mut out = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let record = self.record_from_path(id, &path)?;
            out.push(DocumentMeta {
                id: record.id,
                title: record.title,
                updated_at: record.updated_at,
            });
        }
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: HashMap<String, DocumentRecord>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, id: &str) -> Result<DocumentRecord> {
        self.docs
            .get(id)
            .cloned()
            .with_context(|| format!("no document with id '{id}'"))
    }

    fn save(&mut self, id: &str, content: &str) -> Result<()> {
        let doc = self
            .docs
            .get_mut(id)
            .with_context(|| format!("no document with id '{id}'"))?;
        doc.content = content.to_string();
        doc.title = title_of(content, id);
        doc.updated_at = Utc::now();
        Ok(())
    }

    fn create(&mut self, title: &str) -> Result<DocumentRecord> {
        self.next_id += 1;
        let record = DocumentRecord {
            id: format!("doc-{}", self.next_id),
            title: title.to_string(),
            content: String::new(),
            updated_at: Utc::now(),
        };
        self.docs.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<DocumentMeta>> {
        let mut out: Vec<DocumentMeta> = self
            .docs
            .values()
            .map(|d| DocumentMeta {
                id: d.id.clone(),
                title: d.title.clone(),
                updated_at: d.updated_at,
            })
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }
}

/// Derives a display title: first non-empty line, truncated, else the id.
fn title_of(content: &str, fallback: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.chars().take(80).collect())
        .unwrap_or_else(|| fallback.to_string())
}

/// Turns a title into a filesystem-safe id.
fn slugify(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    let mut out = String::new();
    for part in slug.split('-').filter(|p| !p.is_empty()) {
        if !out.is_empty() {
            out.push('-');
        }
        out.push_str(part);
    }
    if out.is_empty() {
        "untitled".to_string()
    } else {
        out
    }
}
