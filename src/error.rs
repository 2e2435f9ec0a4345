use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up or running a colorization batch
#[derive(Error, Debug)]
pub enum ColorizeError {
    #[error("Input folder not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Input path is not a directory: {}", .0.display())]
    InputNotDirectory(PathBuf),

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{tool} is not available: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    #[error("Engine failed on {}: {reason}", input.display())]
    Engine { input: PathBuf, reason: String },

    #[error(
        "No engine output found for {} under {} after {attempts} attempt(s)",
        input.display(),
        scratch.display()
    )]
    OutputNotFound {
        input: PathBuf,
        scratch: PathBuf,
        attempts: u32,
    },

    #[error("Failed to write {}: {source}", output.display())]
    Finalize {
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ColorizeError>;

impl ColorizeError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ColorizeError::Config(msg.into())
    }

    /// Setup errors abort the run before any item is touched
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            ColorizeError::InputNotFound(_)
                | ColorizeError::InputNotDirectory(_)
                | ColorizeError::CreateDir { .. }
                | ColorizeError::ToolUnavailable { .. }
                | ColorizeError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_not_found_message_names_input() {
        let err = ColorizeError::OutputNotFound {
            input: PathBuf::from("/in/a.mp4"),
            scratch: PathBuf::from("/scratch"),
            attempts: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("/in/a.mp4"));
        assert!(msg.contains("2 attempt(s)"));
        assert!(!err.is_setup());
    }

    #[test]
    fn test_tool_unavailable_is_setup() {
        let err = ColorizeError::ToolUnavailable {
            tool: "ffmpeg".into(),
            reason: "not found on PATH".into(),
        };
        assert!(err.is_setup());
        assert_eq!(err.to_string(), "ffmpeg is not available: not found on PATH");
    }
}
