use std::path::PathBuf;

use crate::config::BatchConfig;
use crate::scanner::MediaItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    Skipped,
    Failed,
}

/// Terminal state of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { output: PathBuf },
    SkippedExisting { output: PathBuf },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub input: PathBuf,
    pub name: String,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn status(&self) -> JobStatus {
        match self.outcome {
            JobOutcome::Succeeded { .. } => JobStatus::Succeeded,
            JobOutcome::SkippedExisting { .. } => JobStatus::Skipped,
            JobOutcome::Failed { .. } => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<(PathBuf, String)>, // (input, reason)
}

impl BatchSummary {
    pub fn record(&mut self, result: &JobResult) {
        match &result.outcome {
            JobOutcome::Succeeded { .. } => self.succeeded += 1,
            JobOutcome::SkippedExisting { .. } => self.skipped += 1,
            JobOutcome::Failed { reason } => {
                self.failed += 1;
                self.failures.push((result.input.clone(), reason.clone()));
            }
        }
    }
}

/// Ordered progress sink. Exactly one `item_finished` call per item that
/// reached a terminal state.
pub trait Reporter {
    fn batch_started(&self, config: &BatchConfig, total: usize);
    fn item_started(&self, index: usize, total: usize, item: &MediaItem);
    fn item_finished(&self, index: usize, total: usize, result: &JobResult);
    fn batch_finished(&self, summary: &BatchSummary);
}

/// Prints progress to stdout, failures to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn batch_started(&self, config: &BatchConfig, total: usize) {
        if total == 0 {
            println!(
                "[WARN] No .{} found in {}",
                config.extension(),
                config.input_dir.display()
            );
            return;
        }
        println!("Input:   {}", config.input_dir.display());
        println!("Output:  {}", config.output_dir.display());
        println!("Scratch: {}", config.scratch_dir.display());
        println!("Render factor: {}", config.render_factor);
        println!("Clips found: {}", total);
    }

    fn item_started(&self, index: usize, total: usize, item: &MediaItem) {
        println!("[{}/{}] Colorizing: {}", index, total, item.name);
    }

    fn item_finished(&self, index: usize, total: usize, result: &JobResult) {
        match &result.outcome {
            JobOutcome::Succeeded { output } => {
                println!("      -> saved: {}", output.display());
            }
            JobOutcome::SkippedExisting { output } => {
                let name = output
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("[{}/{}] SKIP existing: {}", index, total, name);
            }
            JobOutcome::Failed { reason } => {
                eprintln!("[{}/{}] FAILED {}: {}", index, total, result.name, reason);
            }
        }
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        println!();
        println!("=== DONE ===");
        println!("Total clips: {}", summary.total);
        println!("Colorized: {}", summary.succeeded);
        println!("Skipped (already exist): {}", summary.skipped);
        println!("Failed: {}", summary.failed);

        if !summary.failures.is_empty() {
            println!();
            println!("=== FAILED CLIPS ===");
            for (input, reason) in &summary.failures {
                println!("{}", input.display());
                println!("   → {}", reason);
            }
        }
    }
}
