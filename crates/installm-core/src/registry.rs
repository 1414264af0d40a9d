use crate::constants::models::{BITNET_MARKER, MODEL_EXTENSION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which backend serves a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Loaded in-process by the GGUF engine.
    Standard,
    /// Run through the external BitNet inference script.
    AlternateBackend,
}

impl ModelKind {
    /// Classify a model file by its name.
    pub fn classify(file_name: &str) -> Self {
        if file_name.to_lowercase().contains(BITNET_MARKER) {
            Self::AlternateBackend
        } else {
            Self::Standard
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Standard => "Standard",
            Self::AlternateBackend => "BitNet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub kind: ModelKind,
    pub path: PathBuf,
}

/// Directory-backed list of model files, refreshed by [`ModelRegistry::scan`].
pub struct ModelRegistry {
    dir: PathBuf,
    entries: Vec<ModelEntry>,
}

impl ModelRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: Vec::new(),
        }
    }

    /// Rescan the directory, replacing the previous list.
    ///
    /// The directory is created when missing. Unreadable directories and
    /// entries are logged and skipped, so the worst case is an empty list.
    pub fn scan(&mut self) -> Vec<ModelEntry> {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("Failed to create models directory {}: {e}", self.dir.display());
        }

        let mut entries = match std::fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| {
                    let path = entry.path();
                    if !path.is_file() || !is_model_file(&path) {
                        return None;
                    }
                    let name = entry.file_name().to_string_lossy().into_owned();
                    Some(ModelEntry {
                        kind: ModelKind::classify(&name),
                        name,
                        path,
                    })
                })
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!("Failed to read models directory {}: {e}", self.dir.display());
                Vec::new()
            }
        };
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            "Found models: {:?}",
            entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>()
        );

        self.entries = entries;
        self.entries.clone()
    }

    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// The entry the selector starts on.
    pub fn default_selection(&self) -> Option<&str> {
        self.entries.first().map(|e| e.name.as_str())
    }
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MODEL_EXTENSION))
}
