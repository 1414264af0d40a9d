/// InstaLLM — centralized constants.
/// Defaults, file conventions, and the user-facing status messages live here.

// ─── Model files ──────────────────────────────────────────────────────────────

pub mod models {
    /// Extension (without dot) of loadable model files.
    pub const MODEL_EXTENSION: &str = "gguf";

    /// File names containing this marker go through the BitNet subprocess backend.
    pub const BITNET_MARKER: &str = "bitnet";

    /// Tokenizer file expected next to a GGUF file.
    pub const TOKENIZER_FILE: &str = "tokenizer.json";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 7860;
    pub const MODELS_DIR: &str = "models";

    pub const MAX_TOKENS: u32 = 2000;
    pub const TEMPERATURE: f32 = 0.8;
    pub const TOP_P: f32 = 0.95;
    pub const SEED: u64 = 299_792_458;

    pub const MAX_TURNS: usize = 100;
    pub const SYSTEM_PROMPT: &str =
        "You are a helpful AI assistant. Answer the user's questions clearly and concisely.";

    pub const PYTHON_PATH: &str = "python3";
    pub const BITNET_SCRIPT: &str = "BitNet/run_inference.py";
    pub const BITNET_THREADS: u32 = 4;
    pub const BITNET_CTX_SIZE: u32 = 2048;
}

// ─── Prompt template ──────────────────────────────────────────────────────────

pub mod template {
    pub const SYSTEM: &str = "<|system|>";
    pub const USER: &str = "<|user|>";
    pub const ASSISTANT: &str = "<|assistant|>";
    pub const END: &str = "</s>";

    /// Tokens some backends leave in their output.
    pub const STRIP_TOKENS: &[&str] = &[
        "</s>",
        "<s>",
        "<|system|>",
        "<|user|>",
        "<|assistant|>",
        "<|im_start|>",
        "<|im_end|>",
        "<|eot_id|>",
        "<|end_of_text|>",
        "[end of text]",
    ];
}

// ─── Status messages ──────────────────────────────────────────────────────────

pub mod messages {
    pub const SELECT_MODEL: &str = "Please select a model first!";
    pub const LOAD_MODEL_FIRST: &str = "Please load the model first!";

    pub fn not_found(name: &str) -> String {
        format!("Model {name} not found!")
    }

    pub fn loaded(name: &str) -> String {
        format!("Model {name} loaded successfully!")
    }

    pub fn already_loaded(name: &str) -> String {
        format!("Model {name} is already loaded!")
    }

    pub fn load_error(err: &dyn std::fmt::Display) -> String {
        format!("Error loading model: {err}")
    }

    pub fn generate_error(err: &dyn std::fmt::Display) -> String {
        format!("Error generating response: {err}")
    }

    pub fn history_cleared(name: &str) -> String {
        format!("Conversation with {name} cleared!")
    }

    pub fn unloaded(name: &str) -> String {
        format!("Model {name} unloaded!")
    }

    pub fn not_loaded(name: &str) -> String {
        format!("Model {name} is not loaded!")
    }
}
