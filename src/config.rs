use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ColorizeError;

/// Everything a batch run needs, built once and handed to the processor
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Tree the engine is known to write its results into
    pub scratch_dir: PathBuf,
    /// Media extension, without the dot
    pub extension: String,
    pub recursive_input: bool,
    pub render_factor: u32,
    pub watermarked: bool,
    pub skip_existing: bool,
    /// Existing outputs at or below this size are treated as partial and redone
    pub min_output_bytes: u64,
    pub delete_engine_output: bool,
    /// Give each item its own scratch subdirectory
    pub isolate_scratch: bool,
    pub on_missing_output: MissingOutputPolicy,
    pub retry: RetryPolicy,
    pub engine: EngineConfig,
    pub probe: ProbeConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            scratch_dir: PathBuf::new(),
            extension: "mp4".to_string(),
            recursive_input: false,
            render_factor: 10,
            watermarked: false,
            skip_existing: true,
            min_output_bytes: 1_000_000,
            delete_engine_output: false,
            isolate_scratch: false,
            on_missing_output: MissingOutputPolicy::Abort,
            retry: RetryPolicy::default(),
            engine: EngineConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: BatchConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ColorizeError> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(ColorizeError::config("input directory is not set"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ColorizeError::config("output directory is not set"));
        }
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(ColorizeError::config("engine scratch directory is not set"));
        }
        if self.engine.program.as_os_str().is_empty() {
            return Err(ColorizeError::config("engine program is not set"));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(ColorizeError::config("media extension is empty"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ColorizeError::config("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Extension without a leading dot
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}

/// What to do with the rest of the batch when an item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingOutputPolicy {
    Abort,
    Continue,
}

/// Bounded retry for locating engine output after the call returns
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 2,
            delay_ms: 2000,
            backoff_factor: 1,
        }
    }
}

impl RetryPolicy {
    /// Wait after the 1-based `attempt` failed
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.backoff_factor.max(1))
            .saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.delay_ms.saturating_mul(factor))
    }
}

/// External colorization engine invocation.
///
/// `args` may contain `{input}`, `{scratch}`, `{render_factor}` and
/// `{watermark}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            program: PathBuf::new(),
            args: default_engine_args(),
        }
    }
}

pub fn default_engine_args() -> Vec<String> {
    [
        "--input",
        "{input}",
        "--render-factor",
        "{render_factor}",
        "--watermark",
        "{watermark}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Environment-level dependency checked once before the batch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            program: "ffmpeg".to_string(),
            args: vec!["-version".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> BatchConfig {
        BatchConfig {
            input_dir: "/in".into(),
            output_dir: "/out".into(),
            scratch_dir: "/scratch".into(),
            engine: EngineConfig {
                program: "colorize".into(),
                ..EngineConfig::default()
            },
            ..BatchConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_reference_run() {
        let config = BatchConfig::default();
        assert_eq!(config.extension(), "mp4");
        assert_eq!(config.render_factor, 10);
        assert!(config.skip_existing);
        assert!(!config.watermarked);
        assert!(!config.delete_engine_output);
        assert_eq!(config.min_output_bytes, 1_000_000);
        assert_eq!(config.on_missing_output, MissingOutputPolicy::Abort);
        assert_eq!(config.probe.program, "ffmpeg");
    }

    #[test]
    fn test_validate() {
        assert!(valid().validate().is_ok());

        let mut missing_engine = valid();
        missing_engine.engine.program = PathBuf::new();
        assert!(missing_engine.validate().is_err());

        let mut no_attempts = valid();
        no_attempts.retry.max_attempts = 0;
        assert!(no_attempts.validate().is_err());

        let mut missing_input = valid();
        missing_input.input_dir = PathBuf::new();
        assert!(missing_input.validate().unwrap_err().is_setup());
    }

    #[test]
    fn test_retry_delays() {
        let fixed = RetryPolicy::default();
        assert_eq!(fixed.delay_after(1), Duration::from_secs(2));
        assert_eq!(fixed.delay_after(2), Duration::from_secs(2));

        let backoff = RetryPolicy {
            max_attempts: 4,
            delay_ms: 100,
            backoff_factor: 3,
        };
        assert_eq!(backoff.delay_after(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_after(2), Duration::from_millis(300));
        assert_eq!(backoff.delay_after(3), Duration::from_millis(900));
    }

    #[test]
    fn test_from_file_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(
            &path,
            r#"{
                "input_dir": "/videos",
                "output_dir": "/videos/color",
                "scratch_dir": "/opt/deoldify/result_videos",
                "render_factor": 21,
                "on_missing_output": "continue",
                "retry": { "delay_ms": 500 },
                "engine": { "program": "deoldify-cli" }
            }"#,
        )
        .unwrap();

        let config = BatchConfig::from_file(&path).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("/videos"));
        assert_eq!(config.render_factor, 21);
        assert_eq!(config.on_missing_output, MissingOutputPolicy::Continue);
        assert_eq!(config.retry.delay_ms, 500);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.engine.args, default_engine_args());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(&path, r#"{ "input_dri": "/typo" }"#).unwrap();
        assert!(BatchConfig::from_file(&path).is_err());
    }
}
