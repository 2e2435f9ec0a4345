use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::{BatchConfig, MissingOutputPolicy};

/// Colorize every clip in a folder through an external engine
#[derive(Debug, Parser)]
#[command(name = "colorize_batch", version)]
pub struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Folder holding the clips to colorize
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Folder receiving `<name>_color.<ext>` copies
    #[arg(short, long, visible_aliases = ["output-directory"])]
    pub output_dir: Option<PathBuf>,

    /// Folder the engine writes its results into
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Engine executable
    #[arg(long)]
    pub engine: Option<PathBuf>,

    /// Engine argument (repeatable); supports {input}, {scratch},
    /// {render_factor} and {watermark}
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Media extension to pick up
    #[arg(long)]
    pub extension: Option<String>,

    #[arg(long)]
    pub render_factor: Option<u32>,

    /// Keep the engine's watermark
    #[arg(long)]
    pub watermark: bool,

    /// Redo clips even when a complete output already exists
    #[arg(long)]
    pub no_skip_existing: bool,

    /// Outputs at or below this size count as incomplete
    #[arg(long)]
    pub min_output_bytes: Option<u64>,

    /// Delete the engine's own copy after saving
    #[arg(long)]
    pub delete_engine_output: bool,

    /// Run each clip in its own scratch subfolder
    #[arg(long)]
    pub isolate_scratch: bool,

    /// Keep going when a clip produces no output
    #[arg(long)]
    pub continue_on_missing: bool,

    /// Descend into subfolders of the input folder
    #[arg(long)]
    pub recursive: bool,

    /// How many times to look for engine output
    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Wait between looks, in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Program that must answer `-version` before the batch starts
    #[arg(long)]
    pub probe: Option<String>,

    /// More output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Merge the optional config file with command line overrides
    pub fn into_config(self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_file(path)?,
            None => BatchConfig::default(),
        };

        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = self.scratch_dir {
            config.scratch_dir = dir;
        }
        if let Some(program) = self.engine {
            config.engine.program = program;
        }
        if !self.engine_args.is_empty() {
            config.engine.args = self.engine_args;
        }
        if let Some(ext) = self.extension {
            config.extension = ext;
        }
        if let Some(factor) = self.render_factor {
            config.render_factor = factor;
        }
        if let Some(bytes) = self.min_output_bytes {
            config.min_output_bytes = bytes;
        }
        if let Some(attempts) = self.retry_attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry.delay_ms = delay;
        }
        if let Some(program) = self.probe {
            config.probe.program = program;
        }

        config.watermarked |= self.watermark;
        config.skip_existing &= !self.no_skip_existing;
        config.delete_engine_output |= self.delete_engine_output;
        config.isolate_scratch |= self.isolate_scratch;
        config.recursive_input |= self.recursive;
        if self.continue_on_missing {
            config.on_missing_output = MissingOutputPolicy::Continue;
        }

        config.validate()?;
        Ok(config)
    }
}
