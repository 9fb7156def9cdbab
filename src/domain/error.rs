//! Error types for render-diagram.
//!
//! Every error is terminal: the binary prints it and exits with status 1.

use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving a render request or running the renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Usage: render-diagram <input.mmd> [output.png]")]
    Usage,

    #[error(
        "Renderer executable `{0}` not found. Please install Node.js / npm and ensure it is in your PATH."
    )]
    ProgramNotFound(String),

    #[error("Failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer exited with {}", exit_description(.code))]
    Failed {
        code: Option<i32>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },

    #[error("Invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl RenderError {
    /// True for failures that happened at or after launching the renderer.
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            RenderError::ProgramNotFound(_) | RenderError::Launch { .. } | RenderError::Failed { .. }
        )
    }

    /// Bytes to relay on stderr: the renderer's own error output, untouched,
    /// when it produced any, otherwise this error's message.
    pub fn diagnostic(&self) -> Cow<'_, [u8]> {
        match self {
            RenderError::Failed { stderr, .. } if !stderr.trim_ascii().is_empty() => {
                Cow::Borrowed(stderr.as_slice())
            }
            other => Cow::Owned(other.to_string().into_bytes()),
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
