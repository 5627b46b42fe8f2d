use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::job::Job;
use crate::paths;
use crate::pool::InFlight;

/// Counts gathered while walking the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Videos handed to the workers
    pub dispatched: usize,
    /// Videos that already had a default-language subtitle
    pub skipped: usize,
    /// Directories or entries that could not be read
    pub unreadable: usize,
}

/// Recursive discovery of videos that still need their subtitles extracted
pub struct Scanner {
    default_language: String,
}

impl Scanner {
    pub fn new<S: Into<String>>(default_language: S) -> Self {
        Self {
            default_language: default_language.into(),
        }
    }

    /// Walk `root` depth-first and call `on_job` for every video lacking a
    /// `{base}.{default}.srt`. Returning `false` from `on_job` stops the walk.
    pub fn walk<F>(&self, root: &Path, mut on_job: F) -> ScanReport
    where
        F: FnMut(Job) -> bool,
    {
        let mut report = ScanReport::default();

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let location = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string());
                    error!("accessing folder {}: {}", location, e);
                    report.unreadable += 1;
                    continue;
                }
            };

            if entry.file_type().is_dir() || !paths::is_video(entry.file_name()) {
                continue;
            }

            let candidate = paths::subtitle_for(entry.path(), &self.default_language);
            if candidate.exists() {
                info!("subtitles already extracted | {}", relative(root, entry.path()).display());
                report.skipped += 1;
                continue;
            }

            let location = entry
                .path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            let job = Job::new(report.dispatched + 1, location, entry.file_name());
            debug!("Queueing job {}: {}", job.id, relative(root, entry.path()).display());

            if !on_job(job) {
                break;
            }
            report.dispatched += 1;
        }

        report
    }

    /// Blocking scan feeding the worker queue. Each job is registered with
    /// `in_flight` before the hand-off; the caller closes the queue by
    /// dropping its sender once this returns.
    pub fn scan(&self, root: &Path, jobs: &mpsc::Sender<Job>, in_flight: &InFlight) -> ScanReport {
        let report = self.walk(root, |job| {
            in_flight.add();
            match jobs.blocking_send(job) {
                Ok(()) => true,
                Err(e) => {
                    in_flight.done();
                    error!("job queue closed, stopping scan at {}: {}", e.0.display_name(), e);
                    false
                }
            }
        });

        info!(
            "Scan finished: {} queued, {} already extracted, {} unreadable",
            report.dispatched, report.skipped, report.unreadable
        );
        report
    }

    /// Every job a scan would dispatch right now, without running anything
    pub fn pending_jobs(&self, root: &Path) -> (Vec<Job>, ScanReport) {
        let mut jobs = Vec::new();
        let report = self.walk(root, |job| {
            jobs.push(job);
            true
        });
        (jobs, report)
    }
}

/// Path relative to the scan root for log lines
fn relative(root: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf())
}
