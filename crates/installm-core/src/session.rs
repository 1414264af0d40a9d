use crate::backend::{BackendFactory, DefaultBackendFactory, LoadedHandle, SamplingParams};
use crate::config::{ChatMode, Settings};
use crate::constants::messages;
use crate::context::{clean_output, ConversationHistory, PromptTemplate, Turn};
use crate::registry::{ModelEntry, ModelRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// One loaded model and its conversation.
struct ModelSession {
    handle: LoadedHandle,
    history: ConversationHistory,
}

/// Keyed store of loaded models and their conversations.
///
/// Every operation answers with a user-facing string; failures never escape
/// as errors. Requests against the same model are serialized by that model's
/// mutex, so turns stay in order.
pub struct SessionManager {
    registry: RwLock<ModelRegistry>,
    sessions: RwLock<HashMap<String, Arc<Mutex<ModelSession>>>>,
    load_lock: Mutex<()>,
    factory: Arc<dyn BackendFactory>,
    template: PromptTemplate,
    mode: ChatMode,
    max_turns: usize,
    params: SamplingParams,
}

impl SessionManager {
    pub fn new(settings: &Settings, factory: Arc<dyn BackendFactory>) -> Self {
        let mut registry = ModelRegistry::new(settings.models.dir.clone());
        registry.scan();

        Self {
            registry: RwLock::new(registry),
            sessions: RwLock::new(HashMap::new()),
            load_lock: Mutex::new(()),
            factory,
            template: PromptTemplate::new(settings.chat.system_prompt.clone()),
            mode: settings.chat.mode,
            max_turns: settings.chat.max_turns,
            params: settings.inference.sampling_params(),
        }
    }

    /// Manager backed by the real GGUF and BitNet backends.
    pub fn from_settings(settings: &Settings) -> Self {
        let factory = Arc::new(DefaultBackendFactory::new(settings.bitnet.clone()));
        Self::new(settings, factory)
    }

    /// Rescan the models directory.
    pub async fn refresh(&self) -> Vec<ModelEntry> {
        self.registry.write().await.scan()
    }

    pub async fn default_selection(&self) -> Option<String> {
        self.registry
            .read()
            .await
            .default_selection()
            .map(str::to_string)
    }

    pub async fn loaded_models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn is_loaded(&self, name: &str) -> bool {
        self.sessions.read().await.contains_key(name)
    }

    /// Load `name` into memory. Loading an already loaded model keeps its
    /// handle and history.
    pub async fn load(&self, name: &str) -> String {
        if name.is_empty() {
            return messages::SELECT_MODEL.to_string();
        }

        let entry = match self.registry.read().await.get(name) {
            Some(entry) => entry.clone(),
            None => return messages::not_found(name),
        };

        // Loads are serialized so two requests for one name build a single handle.
        let _loading = self.load_lock.lock().await;
        if self.is_loaded(name).await {
            return messages::already_loaded(name);
        }

        info!(model = name, kind = entry.kind.label(), "Loading model");
        match self.factory.create(&entry).await {
            Ok(handle) => {
                let session = ModelSession {
                    handle,
                    history: ConversationHistory::new().with_max_turns(self.max_turns),
                };
                self.sessions
                    .write()
                    .await
                    .insert(name.to_string(), Arc::new(Mutex::new(session)));
                messages::loaded(name)
            }
            Err(e) => {
                warn!(model = name, "Model load failed: {e}");
                messages::load_error(&e)
            }
        }
    }

    /// Generate a reply from `name`. On backend failure the user turn stays in
    /// the history and no assistant turn is added.
    pub async fn generate(&self, name: &str, prompt: &str) -> String {
        if name.is_empty() {
            return messages::SELECT_MODEL.to_string();
        }

        let Some(session) = self.session(name).await else {
            return messages::LOAD_MODEL_FIRST.to_string();
        };
        let mut session = session.lock().await;

        session.history.add_user_turn(prompt);
        let rendered = match self.mode {
            ChatMode::MultiTurn => self.template.render(session.history.turns()),
            ChatMode::SingleTurn => prompt.to_string(),
        };

        debug!(
            model = name,
            prompt_len = rendered.len(),
            history_tokens = session.history.estimate_tokens(),
            "Generating"
        );

        let backend = session.handle.backend.clone();
        match backend.generate(&rendered, &self.params).await {
            Ok(raw) => {
                let text = clean_output(&raw);
                session.history.add_assistant_turn(text.clone());
                text
            }
            Err(e) => {
                warn!(model = name, backend = backend.name(), "Generation failed: {e}");
                messages::generate_error(&e)
            }
        }
    }

    /// Turns recorded for `name`; empty when the model is not loaded.
    pub async fn history(&self, name: &str) -> Vec<Turn> {
        match self.session(name).await {
            Some(session) => session.lock().await.history.to_vec(),
            None => Vec::new(),
        }
    }

    /// Forget the conversation but keep the model loaded.
    pub async fn reset(&self, name: &str) -> String {
        if name.is_empty() {
            return messages::SELECT_MODEL.to_string();
        }
        match self.session(name).await {
            Some(session) => {
                session.lock().await.history.clear();
                messages::history_cleared(name)
            }
            None => messages::not_loaded(name),
        }
    }

    /// Drop the handle and conversation for `name`.
    pub async fn unload(&self, name: &str) -> String {
        if name.is_empty() {
            return messages::SELECT_MODEL.to_string();
        }
        match self.sessions.write().await.remove(name) {
            Some(_) => {
                info!(model = name, "Model unloaded");
                messages::unloaded(name)
            }
            None => messages::not_loaded(name),
        }
    }

    async fn session(&self, name: &str) -> Option<Arc<Mutex<ModelSession>>> {
        self.sessions.read().await.get(name).cloned()
    }
}
