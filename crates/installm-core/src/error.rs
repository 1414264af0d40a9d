use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstaError {
    #[error("Model loading error: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Process error: {command} exited with {code}\nstdout: {stdout}\nstderr: {stderr}")]
    Process {
        command: String,
        code: String,
        stdout: String,
        stderr: String,
    },

    #[error("{0} produced no output")]
    EmptyOutput(String),

    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstaError {
    pub fn process(
        command: impl Into<String>,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Process {
            command: command.into(),
            code: code.map_or_else(|| "signal".to_string(), |c| format!("code {c}")),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

impl From<candle_core::Error> for InstaError {
    fn from(e: candle_core::Error) -> Self {
        Self::Inference(format!("Candle error: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, InstaError>;
