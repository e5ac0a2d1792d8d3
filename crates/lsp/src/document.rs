//! Editor session: open documents plus the symbol registry they feed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use vero_core::{ParseResult, SymbolRegistry};

use crate::config::VeroConfig;
use crate::workspace::{self, WorkspaceError};

/// Information about a single open document.
pub struct DocumentInfo {
    /// File system path for this document.
    pub path: PathBuf,
    /// Editor-reported version number.
    pub version: i32,
    /// Latest content from the editor.
    pub content: String,
}

/// Everything one editor connection knows: open buffers, the workspace
/// registry and the active config. Sessions are independent of each other.
pub struct EditorSession {
    documents: HashMap<String, DocumentInfo>,
    registry: SymbolRegistry,
    config: VeroConfig,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(VeroConfig::default())
    }
}

/// Registry key for a file: its normalized path, so a file reached through
/// a symlink or a relative path is indexed once.
pub fn registry_key(path: &Path) -> String {
    workspace::normalize_path(path).to_string_lossy().into_owned()
}

impl EditorSession {
    pub fn new(config: VeroConfig) -> Self {
        Self {
            documents: HashMap::new(),
            registry: SymbolRegistry::new(),
            config,
        }
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &VeroConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: VeroConfig) {
        self.config = config;
    }

    /// Index every script under `root` from disk. Returns the number of
    /// files indexed; unreadable files are skipped with a warning.
    pub fn index_workspace(&mut self, root: &Path) -> Result<usize, WorkspaceError> {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let files = workspace::find_script_files(&root, &self.config)?;
        let mut indexed = 0;
        for path in &files {
            let path = &workspace::normalize_path(path);
            if let Some(doc) = self.documents.values().find(|d| &d.path == path) {
                self.registry.index_file(&registry_key(path), &doc.content);
                indexed += 1;
                continue;
            }
            match workspace::read_script(path) {
                Ok(text) => {
                    self.registry.index_file(&registry_key(path), &text);
                    indexed += 1;
                }
                Err(e) => tracing::warn!(error = %e, "skipping file"),
            }
        }
        tracing::info!(root = %root.display(), files = indexed, "indexed workspace");
        Ok(indexed)
    }

    /// Track a newly opened document and index its buffer.
    pub fn open(&mut self, uri: &str, path: PathBuf, version: i32, content: String) {
        let path = workspace::normalize_path(&path);
        self.registry.index_file(&registry_key(&path), &content);
        self.documents.insert(
            uri.to_owned(),
            DocumentInfo {
                path,
                version,
                content,
            },
        );
    }

    /// Replace the content of an open document and re-index it.
    pub fn change(&mut self, uri: &str, version: i32, content: String) {
        if let Some(doc) = self.documents.get_mut(uri) {
            self.registry.index_file(&registry_key(&doc.path), &content);
            doc.version = version;
            doc.content = content;
        }
    }

    /// Stop tracking a document. The registry falls back to the file on
    /// disk, or forgets the file if it no longer exists.
    pub fn close(&mut self, uri: &str) {
        let Some(doc) = self.documents.remove(uri) else {
            return;
        };
        let key = registry_key(&doc.path);
        match std::fs::read_to_string(&doc.path) {
            Ok(text) => self.registry.index_file(&key, &text),
            Err(_) => self.registry.clear_file(&key),
        }
    }

    /// Re-read a saved file from disk.
    pub fn saved(&mut self, path: &Path) {
        if let Ok(text) = std::fs::read_to_string(path) {
            self.registry.index_file(&registry_key(path), &text);
        }
    }

    pub fn get(&self, uri: &str) -> Option<&DocumentInfo> {
        self.documents.get(uri)
    }

    /// Buffer content when open, disk content otherwise.
    pub fn content(&self, uri: &str, path: &Path) -> String {
        match self.documents.get(uri) {
            Some(doc) => doc.content.clone(),
            None => std::fs::read_to_string(path).unwrap_or_default(),
        }
    }

    /// Buffer content of the open document at `path`, disk content
    /// otherwise, empty when unreadable.
    pub fn text_of(&self, path: &Path) -> String {
        let path = workspace::normalize_path(path);
        match self.documents.values().find(|d| d.path == path) {
            Some(doc) => doc.content.clone(),
            None => std::fs::read_to_string(&path).unwrap_or_default(),
        }
    }

    /// Parse `content` with the session's error limit.
    pub fn parse(&self, content: &str) -> ParseResult {
        vero_core::parser::parse_source_with_options(content, self.config.parse_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_edits_replace_registry_entries() {
        let mut session = EditorSession::default();
        let path = PathBuf::from("/nowhere/login.vero");
        session.open("file:///nowhere/login.vero", path.clone(), 1, "PAGE Old {\n}\n".into());
        assert!(session.registry().page("Old").is_some());

        session.change("file:///nowhere/login.vero", 2, "PAGE New {\n}\n".into());
        assert!(session.registry().page("Old").is_none());
        assert!(session.registry().page("New").is_some());
        assert_eq!(session.get("file:///nowhere/login.vero").map(|d| d.version), Some(2));

        // no file on disk, so closing forgets it
        session.close("file:///nowhere/login.vero");
        assert!(session.registry().page("New").is_none());
        assert_eq!(session.registry().file_count(), 0);
    }

    #[test]
    fn sessions_do_not_share_state() {
        let mut a = EditorSession::default();
        let b = EditorSession::default();
        a.open("file:///a.vero", PathBuf::from("/a.vero"), 1, "PAGE A {\n}\n".into());
        assert!(a.registry().page("A").is_some());
        assert!(b.registry().page("A").is_none());
    }
}
