//! Filesystem scanning for input media and for engine side-effect output.
//!
//! Both scans tolerate entries that vanish between enumeration and `stat`:
//! the engine may still be renaming or deleting temporaries while we walk its
//! scratch tree, so such entries are dropped rather than failing the scan.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// An input file picked up for colorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub name: String,
    pub modified: SystemTime,
}

/// A file found in the scratch tree that may be the engine's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCandidate {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// List files under `root` whose extension matches `extension`.
///
/// `recursive = false` looks only at the immediate directory. Symlinked
/// clips are followed. The returned order is whatever the filesystem
/// yields; callers sort.
pub fn list_media_files(root: &Path, extension: &str, recursive: bool) -> Vec<MediaItem> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    matching_files(root, extension, max_depth, true)
        .map(|(path, modified)| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            MediaItem {
                path,
                name,
                modified,
            }
        })
        .collect()
}

/// Find the matching file under `root` with the greatest modification time
/// that is not older than `reference`.
///
/// Ties on modification time go to the lexicographically largest path, so
/// the answer is stable when the engine writes several files in one tick.
pub fn find_newest_after(
    root: &Path,
    extension: &str,
    reference: SystemTime,
) -> Option<OutputCandidate> {
    matching_files(root, extension, usize::MAX, false)
        .filter(|(_, modified)| *modified >= reference)
        .max_by(|(a_path, a_time), (b_path, b_time)| {
            a_time.cmp(b_time).then_with(|| a_path.cmp(b_path))
        })
        .map(|(path, modified)| OutputCandidate { path, modified })
}

fn matching_files<'a>(
    root: &Path,
    extension: &'a str,
    max_depth: usize,
    follow_links: bool,
) -> impl Iterator<Item = (PathBuf, SystemTime)> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(follow_links)
        .into_iter()
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => Some(entry),
            Err(err) => {
                if is_not_found(&err) {
                    log::debug!("Entry vanished during scan: {}", err);
                } else if let Some(path) = err.path() {
                    log::warn!("Failed to access {}: {}", path.display(), err);
                } else {
                    log::warn!("WalkDir error: {}", err);
                }
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(move |entry| has_extension(entry.path(), extension))
        .filter(|entry| !is_sidecar(entry.path()))
        .filter_map(move |entry| stat_modified(entry.into_path(), follow_links))
}

/// Stat a listed path. A file removed since it was listed is dropped.
fn stat_modified(path: PathBuf, follow_links: bool) -> Option<(PathBuf, SystemTime)> {
    let metadata = if follow_links {
        fs::metadata(&path)
    } else {
        fs::symlink_metadata(&path)
    };
    modified_time(path, metadata)
}

fn modified_time(
    path: PathBuf,
    metadata: io::Result<fs::Metadata>,
) -> Option<(PathBuf, SystemTime)> {
    let metadata = match metadata {
        Ok(m) => m,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} disappeared before stat", path.display());
            return None;
        }
        Err(err) => {
            log::warn!("Failed to stat {}: {}", path.display(), err);
            return None;
        }
    };

    match metadata.modified() {
        Ok(modified) => Some((path, modified)),
        Err(err) => {
            log::warn!("No modification time for {}: {}", path.display(), err);
            None
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension.trim_start_matches('.')))
        .unwrap_or(false)
}

/// AppleDouble files (._*) carry the media extension but no media
fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("._"))
        .unwrap_or(false)
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|e| e.kind() == io::ErrorKind::NotFound)
        .unwrap_or(false)
}
