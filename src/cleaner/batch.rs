//! Directory batches

use crate::cleaner::{is_markdown_file, CleanError, CleaningPipeline, CleaningResult};
use crate::progress::{ProgressReporter, DONE, FAILED};
use crate::rewrite::Rewriter;
use std::path::{Path, PathBuf};

/// Recursively lists Markdown files under `dir`, sorted by path
///
/// Files whose name already starts with `skip_prefix` are outputs of an
/// earlier run and are left out. Subdirectories that cannot be read are
/// logged and skipped.
///
/// # Arguments
///
/// * `dir` - Root directory to walk
/// * `skip_prefix` - Output prefix; matching files are excluded
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Eligible files, possibly empty
/// * `Err(CleanError)` - `dir` is missing or unreadable
pub fn discover_markdown_files(dir: &Path, skip_prefix: &str) -> Result<Vec<PathBuf>, CleanError> {
    if !dir.is_dir() {
        return Err(CleanError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    let mut first = true;

    while let Some(current) = pending.pop() {
        let entries = match std::fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(source) if first => {
                return Err(CleanError::Read {
                    path: current,
                    source,
                })
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable directory {}: {}", current.display(), e);
                continue;
            }
        };
        first = false;

        for entry in entries.flatten() {
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(_) => continue,
            };

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            // Symlinked directories are not descended into; they can form cycles
            if file_type.is_symlink() && path.is_dir() {
                tracing::debug!("Not following directory symlink {}", path.display());
                continue;
            }

            let already_cleaned = path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| !skip_prefix.is_empty() && name.starts_with(skip_prefix));

            if is_markdown_file(&path) && !already_cleaned {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

impl<R: Rewriter> CleaningPipeline<R> {
    /// Cleans every eligible Markdown file under `dir`, one at a time
    ///
    /// A failing file never stops the batch; after cancellation the remaining
    /// files each yield a cancelled failure. Batch-level milestones are
    /// reported under the directory's identifier; each file also reports its
    /// own milestones under its path.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<CleaningResult>)` - One entry per file, in processing order.
    ///   An empty directory yields a single informational entry.
    /// * `Err(CleanError)` - The directory does not exist or cannot be read
    pub async fn clean_directory(
        &self,
        dir: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<CleaningResult>, CleanError> {
        let id = dir.display().to_string();

        let files = match discover_markdown_files(dir, &self.settings().output_prefix) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Cannot clean {}: {}", id, e);
                reporter.report(&id, FAILED, &e.to_string());
                return Err(e);
            }
        };

        if files.is_empty() {
            tracing::info!("No Markdown files found in {}", id);
            reporter.report(&id, DONE, "No Markdown files found");
            return Ok(vec![CleaningResult::info(dir, "No Markdown files found")]);
        }

        let total = files.len();
        tracing::info!("Found {} Markdown file(s) in {}", total, id);
        reporter.report(&id, 0, &format!("Found {} Markdown file(s)", total));

        let mut results = Vec::with_capacity(total);
        for (i, file) in files.iter().enumerate() {
            reporter.report(
                &id,
                (i * 100 / total) as i32,
                &format!("Processing file {}/{}: {}", i + 1, total, file.display()),
            );

            results.push(self.clean_file(file, reporter).await);
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        tracing::info!(
            "Batch {} finished: {} succeeded, {} failed",
            id,
            succeeded,
            results.len() - succeeded
        );
        reporter.report(
            &id,
            DONE,
            &format!("Finished: {}/{} file(s) cleaned", succeeded, total),
        );

        Ok(results)
    }
}
