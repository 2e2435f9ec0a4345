use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;

use crate::clock::{Clock, SystemClock};
use crate::config::{BatchConfig, MissingOutputPolicy};
use crate::engine::{Engine, EngineRequest};
use crate::error::{ColorizeError, Result};
use crate::filename::{output_filename, sanitize};
use crate::probe::{CommandProbe, ToolProbe};
use crate::report::{BatchSummary, ConsoleReporter, JobOutcome, JobResult, Reporter};
use crate::scanner::{find_newest_after, list_media_files, MediaItem, OutputCandidate};

/// Drives the batch one item at a time.
///
/// Items are never processed concurrently: output is attributed to an input
/// only by being the freshest file in the scratch tree, which holds only
/// while a single engine call is in flight.
pub struct Processor {
    config: BatchConfig,
    engine: Box<dyn Engine>,
    probe: Box<dyn ToolProbe>,
    clock: Box<dyn Clock>,
    reporter: Box<dyn Reporter>,
}

impl Processor {
    pub fn new(config: BatchConfig, engine: Box<dyn Engine>) -> Self {
        let probe = Box::new(CommandProbe::from_config(&config.probe));
        Processor {
            config,
            engine,
            probe,
            clock: Box::new(SystemClock),
            reporter: Box::new(ConsoleReporter),
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn ToolProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run the whole batch.
    ///
    /// Setup failures return before any item is touched. Item failures are
    /// reported, then either abort the run or are recorded in the summary,
    /// depending on `on_missing_output`.
    pub fn run(&mut self) -> Result<BatchSummary> {
        self.config.validate()?;
        self.prepare_directories()?;
        self.probe.ensure_available()?;

        let items = self.collect_items();
        let total = items.len();
        self.reporter.batch_started(&self.config, total);

        let mut summary = BatchSummary {
            total,
            ..BatchSummary::default()
        };
        if total == 0 {
            return Ok(summary);
        }

        for (i, item) in items.iter().enumerate() {
            let index = i + 1;

            let (outcome, error) = match self.process_item(index, total, item) {
                Ok(outcome) => (outcome, None),
                Err(e) => (
                    JobOutcome::Failed {
                        reason: e.to_string(),
                    },
                    Some(e),
                ),
            };

            let result = JobResult {
                input: item.path.clone(),
                name: item.name.clone(),
                outcome,
            };
            self.reporter.item_finished(index, total, &result);
            summary.record(&result);

            if let Some(err) = error {
                log::error!("{} failed: {}", item.path.display(), err);
                if self.config.on_missing_output == MissingOutputPolicy::Abort {
                    return Err(err);
                }
            }
        }

        self.reporter.batch_finished(&summary);
        Ok(summary)
    }

    /// Check the input root, create output and scratch roots, and pin all
    /// three to absolute paths. The engine runs inside the scratch directory,
    /// so a relative `{input}` would not resolve there.
    fn prepare_directories(&mut self) -> Result<()> {
        let input = &self.config.input_dir;
        if !input.exists() {
            return Err(ColorizeError::InputNotFound(input.clone()));
        }
        if !input.is_dir() {
            return Err(ColorizeError::InputNotDirectory(input.clone()));
        }
        self.config.input_dir = std::path::absolute(input)?;

        for dir in [&mut self.config.output_dir, &mut self.config.scratch_dir] {
            fs::create_dir_all(&*dir).map_err(|source| ColorizeError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            *dir = std::path::absolute(&*dir)?;
        }
        Ok(())
    }

    fn collect_items(&self) -> Vec<MediaItem> {
        let mut items = list_media_files(
            &self.config.input_dir,
            self.config.extension(),
            self.config.recursive_input,
        );
        items.sort_by(|a, b| a.path.cmp(&b.path));

        for (first, second) in output_collisions(&items) {
            log::warn!(
                "{} and {} both map to {}; the later one will see the earlier one's output",
                first.display(),
                second.display(),
                output_filename(&second)
            );
        }
        items
    }

    fn process_item(&self, index: usize, total: usize, item: &MediaItem) -> Result<JobOutcome> {
        let output_path = self.config.output_dir.join(output_filename(&item.path));

        if self.config.skip_existing && self.is_complete_output(&output_path) {
            return Ok(JobOutcome::SkippedExisting {
                output: output_path,
            });
        }

        self.reporter.item_started(index, total, item);
        let scratch = self.item_scratch_dir(item)?;

        let t0 = self.clock.now();
        log::debug!(
            "Engine call for {} started at {}",
            item.name,
            DateTime::<Utc>::from(t0).to_rfc3339()
        );
        self.engine.colorize(&EngineRequest {
            input: &item.path,
            scratch_dir: &scratch,
            render_factor: self.config.render_factor,
            watermarked: self.config.watermarked,
        })?;

        let candidate =
            self.locate_output(&scratch, t0)
                .ok_or_else(|| ColorizeError::OutputNotFound {
                    input: item.path.clone(),
                    scratch: scratch.clone(),
                    attempts: self.config.retry.max_attempts,
                })?;
        log::debug!(
            "Claimed {} (modified {}) for {}",
            candidate.path.display(),
            DateTime::<Utc>::from(candidate.modified).to_rfc3339(),
            item.name
        );

        finalize(&candidate.path, &output_path)?;

        if self.config.delete_engine_output {
            self.cleanup(&candidate, &scratch);
        }

        Ok(JobOutcome::Succeeded {
            output: output_path,
        })
    }

    /// Anything at or below `min_output_bytes` is a leftover from an
    /// interrupted run and gets redone.
    fn is_complete_output(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|m| m.is_file() && m.len() > self.config.min_output_bytes)
            .unwrap_or(false)
    }

    fn item_scratch_dir(&self, item: &MediaItem) -> Result<PathBuf> {
        if !self.config.isolate_scratch {
            return Ok(self.config.scratch_dir.clone());
        }

        let stem = item
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = self.config.scratch_dir.join(sanitize(&stem));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn locate_output(&self, scratch: &Path, t0: SystemTime) -> Option<OutputCandidate> {
        let policy = &self.config.retry;

        for attempt in 1..=policy.max_attempts {
            if let Some(candidate) = find_newest_after(scratch, self.config.extension(), t0) {
                return Some(candidate);
            }
            if attempt < policy.max_attempts {
                let delay = policy.delay_after(attempt);
                log::info!(
                    "No output under {} yet (attempt {}/{}), waiting {:?}",
                    scratch.display(),
                    attempt,
                    policy.max_attempts,
                    delay
                );
                self.clock.sleep(delay);
            }
        }
        None
    }

    fn cleanup(&self, candidate: &OutputCandidate, scratch: &Path) {
        if let Err(e) = fs::remove_file(&candidate.path) {
            log::warn!(
                "Could not delete engine output {}: {}",
                candidate.path.display(),
                e
            );
            return;
        }

        if self.config.isolate_scratch {
            // Only succeeds once the engine left nothing else behind
            if let Err(e) = fs::remove_dir(scratch) {
                log::debug!("Kept scratch directory {}: {}", scratch.display(), e);
            }
        }
    }
}

/// Pairs of items whose sanitized output names coincide, in batch order
fn output_collisions(items: &[MediaItem]) -> Vec<(PathBuf, PathBuf)> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    let mut collisions = Vec::new();

    for item in items {
        match seen.entry(output_filename(&item.path)) {
            Entry::Occupied(first) => {
                collisions.push((first.get().to_path_buf(), item.path.clone()));
            }
            Entry::Vacant(slot) => {
                slot.insert(&item.path);
            }
        }
    }
    collisions
}

/// Copy `source` over `output` in one step.
///
/// Bytes land in a temporary file next to `output`, which is then renamed
/// over it, so a crash never leaves a truncated file under the final name.
fn finalize(source: &Path, output: &Path) -> Result<()> {
    let dir = output.parent().unwrap_or_else(|| Path::new("."));
    let write_err = |source: io::Error| ColorizeError::Finalize {
        output: output.to_path_buf(),
        source,
    };

    let mut reader = File::open(source).map_err(write_err)?;
    let mut staged = NamedTempFile::new_in(dir).map_err(write_err)?;
    io::copy(&mut reader, staged.as_file_mut()).map_err(write_err)?;
    staged.as_file().sync_all().map_err(write_err)?;

    copy_metadata(source, staged.as_file());

    staged.persist(output).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Best-effort: permissions and modification time
fn copy_metadata(source: &Path, target: &File) {
    let metadata = match fs::metadata(source) {
        Ok(m) => m,
        Err(e) => {
            log::debug!("No metadata for {}: {}", source.display(), e);
            return;
        }
    };

    if let Err(e) = target.set_permissions(metadata.permissions()) {
        log::debug!("Could not copy permissions from {}: {}", source.display(), e);
    }
    if let Ok(modified) = metadata.modified() {
        if let Err(e) = target.set_modified(modified) {
            log::debug!("Could not copy mtime from {}: {}", source.display(), e);
        }
    }
}
