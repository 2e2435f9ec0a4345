//! The external colorization engine.
//!
//! The engine never tells us where it wrote its result. All we can rely on
//! is that a call which returns successfully has left a fresh file somewhere
//! under the scratch directory it was given.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::EngineConfig;
use crate::error::{ColorizeError, Result};

/// One synchronous engine call
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    pub input: &'a Path,
    pub scratch_dir: &'a Path,
    pub render_factor: u32,
    pub watermarked: bool,
}

pub trait Engine {
    /// Blocks until the engine finishes. No output handle is returned.
    fn colorize(&self, request: &EngineRequest<'_>) -> Result<()>;
}

/// Engine driven as a child process with a templated argument list
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        CommandEngine { program, args }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        CommandEngine::new(config.program.clone(), config.args.clone())
    }

    fn expand_args(&self, request: &EngineRequest<'_>) -> Vec<String> {
        let input = request.input.to_string_lossy();
        let scratch = request.scratch_dir.to_string_lossy();
        let render_factor = request.render_factor.to_string();
        let watermark = request.watermarked.to_string();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{scratch}", &scratch)
                    .replace("{render_factor}", &render_factor)
                    .replace("{watermark}", &watermark)
            })
            .collect()
    }
}

impl Engine for CommandEngine {
    fn colorize(&self, request: &EngineRequest<'_>) -> Result<()> {
        let args = self.expand_args(request);
        log::info!("Running {} {:?}", self.program.display(), args);

        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(request.scratch_dir)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| ColorizeError::Engine {
                input: request.input.to_path_buf(),
                reason: format!("failed to launch {}: {}", self.program.display(), e),
            })?;

        if !status.success() {
            return Err(ColorizeError::Engine {
                input: request.input.to_path_buf(),
                reason: format!("{} exited with {}", self.program.display(), status),
            });
        }
        Ok(())
    }
}
