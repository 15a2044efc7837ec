//! Error kinds for state decoding and image assembly.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while decoding a persisted state file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// A `hint:` directive whose value is not a non-negative integer.
    #[error("line {line}: invalid hint level '{value}'")]
    InvalidHint { line: usize, value: String },
}

/// Failure while assembling the ESP volume or the ISO image.
#[derive(Debug, Error)]
pub enum ImageBuildError {
    /// The application binary is missing at every candidate path.
    #[error("application binary not found; looked for {}", display_paths(.candidates))]
    MissingArtifact { candidates: Vec<PathBuf> },

    /// An external formatting, copy or mastering step failed.
    #[error("{tool} failed: {message}")]
    ToolFailure { tool: String, message: String },

    /// A local file operation around the tools failed.
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ImageBuildError {
    pub(crate) fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = ImageBuildError> = std::result::Result<T, E>;

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
