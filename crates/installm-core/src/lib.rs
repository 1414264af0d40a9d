pub mod backend;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod registry;
pub mod session;

// Re-export key types
pub use backend::{BackendFactory, InferenceBackend, LoadedHandle, SamplingParams};
pub use config::{ChatMode, Settings};
pub use context::{ConversationHistory, PromptTemplate, Role, Turn};
pub use error::InstaError;
pub use registry::{ModelEntry, ModelKind, ModelRegistry};
pub use session::SessionManager;
