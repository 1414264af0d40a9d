mod bitnet;
mod gguf;

pub use bitnet::BitNetBackend;
pub use gguf::GgufBackend;

use crate::config::BitNetSettings;
use crate::error::InstaError;
use crate::registry::{ModelEntry, ModelKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: u64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        crate::config::InferenceSettings::default().sampling_params()
    }
}

/// A loaded model that turns a prompt into generated text.
#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`. The result holds only the new
    /// text; callers strip delimiter tokens.
    async fn generate(&self, prompt: &str, params: &SamplingParams)
        -> Result<String, InstaError>;
}

/// A model's loaded handle.
#[derive(Clone)]
pub struct LoadedHandle {
    pub entry: ModelEntry,
    pub backend: Arc<dyn InferenceBackend>,
}

impl std::fmt::Debug for LoadedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedHandle")
            .field("entry", &self.entry)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Builds handles for registry entries.
#[async_trait::async_trait]
pub trait BackendFactory: Send + Sync {
    async fn create(&self, entry: &ModelEntry) -> Result<LoadedHandle, InstaError>;
}

/// Dispatches on [`ModelKind`]: GGUF files load in-process, BitNet files get
/// a subprocess runner bound to their path.
pub struct DefaultBackendFactory {
    bitnet: BitNetSettings,
}

impl DefaultBackendFactory {
    pub fn new(bitnet: BitNetSettings) -> Self {
        Self { bitnet }
    }
}

#[async_trait::async_trait]
impl BackendFactory for DefaultBackendFactory {
    async fn create(&self, entry: &ModelEntry) -> Result<LoadedHandle, InstaError> {
        let backend: Arc<dyn InferenceBackend> = match entry.kind {
            ModelKind::Standard => {
                let path = entry.path.clone();
                let backend = tokio::task::spawn_blocking(move || GgufBackend::load(&path))
                    .await
                    .map_err(|e| InstaError::ModelLoad(format!("Loading task failed: {e}")))??;
                Arc::new(backend)
            }
            ModelKind::AlternateBackend => {
                Arc::new(BitNetBackend::new(entry.path.clone(), self.bitnet.clone())?)
            }
        };

        Ok(LoadedHandle {
            entry: entry.clone(),
            backend,
        })
    }
}
