//! Loading documentation directories into passages.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunker::TextSplitter;
use crate::config::ChunkingConfig;
use crate::document::Document;
use crate::error::{Result, RetrievalError};

/// Reads `*.txt` files under a directory and cuts them into tagged passages.
pub struct DocumentLoader {
    splitter: TextSplitter,
}

impl DocumentLoader {
    pub fn new(chunking: ChunkingConfig) -> Result<Self> {
        Ok(Self {
            splitter: TextSplitter::new(chunking)?,
        })
    }

    /// Load every `*.txt` file below `dir`, tagging passages with `product`
    /// and the file's base name.
    ///
    /// A missing directory is an error; individual unreadable files are
    /// skipped with a warning.
    pub fn load_directory(&self, dir: impl AsRef<Path>, product: &str) -> Result<Vec<Document>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RetrievalError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("documentation directory {} not found", dir.display()),
            )));
        }

        let mut files = 0usize;
        let mut documents = Vec::new();
        let walker = WalkDir::new(dir).sort_by_file_name();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "txt") {
                continue;
            }

            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping unreadable file {}: {e}", path.display());
                    continue;
                }
            };

            let source = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let chunks = self.splitter.split(&text);
            debug!("{} -> {} passages", path.display(), chunks.len());

            files += 1;
            documents.extend(
                chunks
                    .into_iter()
                    .map(|chunk| Document::new(chunk, product, source.clone())),
            );
        }

        info!(
            "Processed {files} documents into {} passages for {product}",
            documents.len()
        );
        Ok(documents)
    }
}
