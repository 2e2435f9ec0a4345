use std::process::{Command, Stdio};

use crate::config::ProbeConfig;
use crate::error::{ColorizeError, Result};

/// Pre-flight check for an environment-level dependency
pub trait ToolProbe {
    fn ensure_available(&self) -> Result<()>;
}

/// Runs a program in a no-op diagnostic mode (e.g. `ffmpeg -version`) and
/// treats launch failure or a non-zero exit as "not available".
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        CommandProbe {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        CommandProbe::new(config.program.clone(), config.args.clone())
    }

    fn unavailable(&self, reason: String) -> ColorizeError {
        ColorizeError::ToolUnavailable {
            tool: self.program.clone(),
            reason,
        }
    }
}

impl ToolProbe for CommandProbe {
    fn ensure_available(&self) -> Result<()> {
        log::debug!("Probing {} {:?}", self.program, self.args);

        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| self.unavailable(format!("not found on PATH ({})", e)))?;

        if !status.success() {
            return Err(self.unavailable(format!("diagnostic run exited with {}", status)));
        }
        Ok(())
    }
}
