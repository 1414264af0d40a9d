use super::{InferenceBackend, SamplingParams};
use crate::constants::models::TOKENIZER_FILE;
use crate::error::InstaError;
use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama as qlm;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// In-process GGUF inference on CPU.
///
/// Weights and KV cache live behind a mutex, so one generation per model runs
/// at a time. All tensor work happens on the blocking pool.
pub struct GgufBackend {
    state: Arc<Mutex<GgufState>>,
}

struct GgufState {
    model: qlm::ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    eos_token_id: u32,
}

impl GgufBackend {
    /// Read weights from `path` and the tokenizer stored beside it.
    pub fn load(path: &Path) -> Result<Self, InstaError> {
        info!(path = %path.display(), "Loading GGUF model");
        let device = Device::Cpu;

        let mut file = std::fs::File::open(path).map_err(|e| {
            InstaError::ModelLoad(format!("Failed to open {}: {e}", path.display()))
        })?;
        let content = gguf_file::Content::read(&mut file)
            .map_err(|e| InstaError::ModelLoad(format!("Failed to parse GGUF file: {e}")))?;

        let metadata_eos = content
            .metadata
            .get("tokenizer.ggml.eos_token_id")
            .and_then(|v| v.to_u32().ok());

        let model = qlm::ModelWeights::from_gguf(content, &mut file, &device)
            .map_err(|e| InstaError::ModelLoad(format!("Failed to load model weights: {e}")))?;

        let tokenizer_path = find_tokenizer(path).ok_or_else(|| {
            InstaError::ModelLoad(format!(
                "No {TOKENIZER_FILE} found next to {}",
                path.display()
            ))
        })?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| InstaError::ModelLoad(format!("Failed to load tokenizer: {e}")))?;

        let eos_token_id = metadata_eos
            .or_else(|| tokenizer.token_to_id("</s>"))
            .or_else(|| tokenizer.token_to_id("<|endoftext|>"))
            .or_else(|| tokenizer.token_to_id("<|im_end|>"))
            .or_else(|| tokenizer.token_to_id("<|eot_id|>"))
            .unwrap_or(2);

        info!(eos_token_id, tokenizer = %tokenizer_path.display(), "GGUF model loaded");

        Ok(Self {
            state: Arc::new(Mutex::new(GgufState {
                model,
                tokenizer,
                device,
                eos_token_id,
            })),
        })
    }
}

/// `{stem}.tokenizer.json` wins over a shared `tokenizer.json`.
fn find_tokenizer(model_path: &Path) -> Option<PathBuf> {
    let specific = model_path
        .file_stem()
        .map(|stem| model_path.with_file_name(format!("{}.{TOKENIZER_FILE}", stem.to_string_lossy())));
    let shared = model_path.with_file_name(TOKENIZER_FILE);
    specific.into_iter().chain([shared]).find(|p| p.is_file())
}

/// The forward pass needs at least one token and room for one more.
fn check_prompt_len(len: usize) -> Result<(), InstaError> {
    if len == 0 {
        return Err(InstaError::Inference("Prompt produced no tokens".into()));
    }
    if len >= qlm::MAX_SEQ_LEN {
        return Err(InstaError::Inference(format!(
            "Prompt is {len} tokens, the model accepts at most {}",
            qlm::MAX_SEQ_LEN
        )));
    }
    Ok(())
}

impl GgufState {
    fn generate(&mut self, prompt: &str, params: &SamplingParams) -> Result<String, InstaError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| InstaError::Inference(format!("Tokenization failed: {e}")))?;
        let prompt_tokens = encoding.get_ids().to_vec();
        check_prompt_len(prompt_tokens.len())?;

        debug!(
            prompt_tokens = prompt_tokens.len(),
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            "Starting GGUF generation"
        );

        let temperature = (params.temperature > 0.0).then_some(params.temperature as f64);
        let top_p = (params.top_p > 0.0 && params.top_p < 1.0).then_some(params.top_p as f64);
        let mut sampler = LogitsProcessor::new(params.seed, temperature, top_p);

        let budget = (params.max_tokens as usize).min(qlm::MAX_SEQ_LEN - prompt_tokens.len());
        let mut generated: Vec<u32> = Vec::new();
        let mut input = Tensor::new(prompt_tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        let mut index_pos = 0;

        for _ in 0..budget {
            let seq_len = input.dim(1)?;
            // Position 0 also resets the KV cache from any previous request.
            let logits = self.model.forward(&input, index_pos)?.squeeze(0)?;
            index_pos += seq_len;

            let next = sampler.sample(&logits)?;
            if next == self.eos_token_id {
                break;
            }
            generated.push(next);
            input = Tensor::new(&[next][..], &self.device)?.unsqueeze(0)?;
        }

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| InstaError::Inference(format!("Detokenization failed: {e}")))?;

        debug!(completion_tokens = generated.len(), "GGUF generation complete");
        Ok(text)
    }
}

#[async_trait::async_trait]
impl InferenceBackend for GgufBackend {
    fn name(&self) -> &str {
        "gguf"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, InstaError> {
        let state = self.state.clone();
        let prompt = prompt.to_string();
        let params = *params;

        tokio::task::spawn_blocking(move || {
            let mut guard = state
                .lock()
                .map_err(|_| InstaError::Inference("Model state poisoned by an earlier panic".into()))?;
            guard.generate(&prompt, &params)
        })
        .await
        .map_err(|e| InstaError::Inference(format!("Inference task failed: {e}")))?
    }
}
