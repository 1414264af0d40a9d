use super::{InferenceBackend, SamplingParams};
use crate::config::BitNetSettings;
use crate::error::InstaError;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{debug, info, warn};

/// Runs BitNet models through the external `run_inference.py` script.
///
/// The handle only stores the model path; every generation spawns the script
/// and waits for it to exit.
pub struct BitNetBackend {
    model_path: PathBuf,
    settings: BitNetSettings,
}

impl BitNetBackend {
    pub fn new(model_path: PathBuf, settings: BitNetSettings) -> Result<Self, InstaError> {
        if !model_path.exists() {
            return Err(InstaError::ModelLoad(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }
        if !settings.script_path.exists() {
            return Err(InstaError::ModelLoad(format!(
                "BitNet inference script not found: {}",
                settings.script_path.display()
            )));
        }

        info!(
            model = %model_path.display(),
            script = %settings.script_path.display(),
            "BitNet model registered"
        );

        Ok(Self {
            model_path,
            settings,
        })
    }

    /// Arguments passed after the interpreter.
    pub fn command_args(&self, prompt: &str, params: &SamplingParams) -> Vec<String> {
        vec![
            self.settings.script_path.to_string_lossy().into_owned(),
            "-m".into(),
            self.model_path.to_string_lossy().into_owned(),
            "-n".into(),
            params.max_tokens.to_string(),
            "-p".into(),
            prompt.to_string(),
            "-t".into(),
            self.settings.threads.to_string(),
            "-c".into(),
            self.settings.ctx_size.to_string(),
            "-temp".into(),
            params.temperature.to_string(),
        ]
    }
}

#[async_trait::async_trait]
impl InferenceBackend for BitNetBackend {
    fn name(&self) -> &str {
        "bitnet"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, InstaError> {
        let mut cmd = tokio::process::Command::new(&self.settings.python_path);
        cmd.args(self.command_args(prompt, params))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            python = %self.settings.python_path,
            prompt_len = prompt.len(),
            "Running BitNet inference"
        );

        let output = match self.settings.timeout_secs {
            Some(secs) => tokio::time::timeout(std::time::Duration::from_secs(secs), cmd.output())
                .await
                .map_err(|_| InstaError::Timeout("BitNet inference".into(), secs))?,
            None => cmd.output().await,
        }
        .map_err(|e| {
            InstaError::Inference(format!(
                "Failed to run {}: {e}",
                self.settings.python_path
            ))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            warn!(status = ?output.status.code(), "BitNet inference failed");
            return Err(InstaError::process(
                "BitNet inference",
                output.status.code(),
                stdout,
                stderr,
            ));
        }

        if stdout.trim().is_empty() {
            return Err(InstaError::EmptyOutput("BitNet inference".into()));
        }

        Ok(strip_echo(&stdout, prompt).to_string())
    }
}

/// The script prints the prompt before the completion.
fn strip_echo<'a>(stdout: &'a str, prompt: &str) -> &'a str {
    if prompt.is_empty() {
        return stdout;
    }
    stdout.strip_prefix(prompt).unwrap_or(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_script_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("bitnet.gguf");
        std::fs::write(&model, b"").unwrap();

        let settings = BitNetSettings {
            script_path: dir.path().join("nope.py"),
            ..BitNetSettings::default()
        };
        let err = BitNetBackend::new(model, settings).err().unwrap();
        assert!(err.to_string().contains("script not found"));
    }

    #[test]
    fn echoed_prompt_is_dropped() {
        assert_eq!(strip_echo("Capital?Paris.\n", "Capital?"), "Paris.\n");
        assert_eq!(strip_echo("Paris.\n", "Capital?"), "Paris.\n");
        assert_eq!(strip_echo("Paris.", ""), "Paris.");
    }

    #[test]
    fn command_args_follow_script_flags() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("bitnet.gguf");
        let script = dir.path().join("run_inference.py");
        std::fs::write(&model, b"").unwrap();
        std::fs::write(&script, b"").unwrap();

        let settings = BitNetSettings {
            script_path: script.clone(),
            threads: 2,
            ctx_size: 512,
            ..BitNetSettings::default()
        };
        let backend = BitNetBackend::new(model.clone(), settings).unwrap();
        let params = SamplingParams {
            max_tokens: 64,
            temperature: 0.5,
            ..SamplingParams::default()
        };
        let args = backend.command_args("hello", &params);

        assert_eq!(args[0], script.to_string_lossy());
        assert_eq!(
            &args[1..],
            &[
                "-m".to_string(),
                model.to_string_lossy().into_owned(),
                "-n".into(),
                "64".into(),
                "-p".into(),
                "hello".into(),
                "-t".into(),
                "2".into(),
                "-c".into(),
                "512".into(),
                "-temp".into(),
                "0.5".into(),
            ]
        );
    }
}
