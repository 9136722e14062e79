#![forbid(unsafe_code)]

use diagonal_core::CorpusError;
use diagonal_render::RenderError;
use diagonal_runtime::{AnimatorError, ConfigError, ScheduleError};

pub type Result<T> = std::result::Result<T, DemoError>;

/// Everything that can end the demo early.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("corpus: {0}")]
    Corpus(#[from] CorpusError),
    #[error("terminal: {0}")]
    Render(#[from] RenderError),
    #[error("animator: {0}")]
    Animator(#[from] AnimatorError<RenderError>),
    #[error("{0}: {detail}", detail = operation_detail(.0))]
    Schedule(#[from] ScheduleError<AnimatorError<RenderError>>),
    #[error("logging: {0}")]
    Logging(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DemoError {
    /// Process exit code: 2 for bad configuration, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}

fn operation_detail(err: &ScheduleError<AnimatorError<RenderError>>) -> String {
    match err {
        ScheduleError::Operation { source, .. } => source.to_string(),
        _ => "schedule unavailable".to_string(),
    }
}
