use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, SubextractError};
use crate::extract::{ExtractOutcome, ExtractReport, SubtitleExtractor};
use crate::job::Job;
use crate::media::{interpret_probe, MediaProcessorFactory, MediaProcessorTrait, ProbeOutcome, SubtitleStream};
use crate::pool::{InFlight, JobHandler, WorkerPool, QUEUE_CAPACITY};
use crate::scanner::{ScanReport, Scanner};
use crate::sync::{AlassAligner, SubtitleAlignerTrait, SubtitleSynchronizer, SyncReport};

/// Outcome of one job, probe to cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub extract: ExtractOutcome,
    /// `None` when the job ended before the sync stage
    pub sync: Option<SyncReport>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub workers: usize,
    pub scan: ScanReport,
    /// Jobs that ran to completion, successful or not
    pub completed: usize,
}

pub struct Workflow {
    config: Config,
    media: Arc<dyn MediaProcessorTrait>,
    aligner: Arc<dyn SubtitleAlignerTrait>,
    extractor: SubtitleExtractor,
    synchronizer: SubtitleSynchronizer,
}

impl Workflow {
    /// Workflow backed by ffmpeg and alass as configured
    pub fn new(config: Config) -> Self {
        let media: Arc<dyn MediaProcessorTrait> =
            Arc::from(MediaProcessorFactory::create_processor(config.media.clone()));
        let aligner: Arc<dyn SubtitleAlignerTrait> = Arc::new(AlassAligner::new(&config.sync));
        Self::with_tools(config, media, aligner)
    }

    pub fn with_tools(
        config: Config,
        media: Arc<dyn MediaProcessorTrait>,
        aligner: Arc<dyn SubtitleAlignerTrait>,
    ) -> Self {
        let extractor = SubtitleExtractor::new(Arc::clone(&media), config.languages.clone());
        let synchronizer = SubtitleSynchronizer::new(
            Arc::clone(&aligner),
            config.languages.default_language.clone(),
            config.sync.scope,
        );

        Self {
            config,
            media,
            aligner,
            extractor,
            synchronizer,
        }
    }

    /// Warn about missing tools without refusing to run
    pub async fn check_tools(&self) {
        if let Err(e) = self.media.check_availability().await {
            warn!("{}", e);
        }
        if let Err(e) = self.aligner.check_availability().await {
            warn!("{}", e);
        }
    }

    /// Scan `root` and process every pending video on a worker pool. Returns
    /// once the scan is done and every dispatched job has completed.
    pub async fn run(self: Arc<Self>, root: &Path) -> Result<RunSummary> {
        ensure_root(root)?;

        let started_at = Local::now();
        let timer = Instant::now();
        let pool = WorkerPool::from_config(self.config.pool.workers);
        info!("using {} workers on {}", pool.size(), root.display());

        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let in_flight = Arc::new(InFlight::new());
        let handles = pool.spawn(rx, Arc::clone(&self), Arc::clone(&in_flight));

        let scanner = Scanner::new(self.config.languages.default_language.clone());
        let scan_root = root.to_path_buf();
        let scan_in_flight = Arc::clone(&in_flight);
        // Dropping `tx` at the end of the closure closes the queue
        let scan = tokio::task::spawn_blocking(move || scanner.scan(&scan_root, &tx, &scan_in_flight))
            .await
            .map_err(|e| SubextractError::Worker(format!("Scanner task failed: {}", e)))?;

        in_flight.wait().await;
        let completed = WorkerPool::join(handles).await?;

        Ok(RunSummary {
            started_at,
            elapsed: timer.elapsed(),
            workers: pool.size(),
            scan,
            completed,
        })
    }

    /// Probe, extract, then sync a single video
    pub async fn process_job(&self, job: &Job) -> JobReport {
        let extract = self.extractor.run(job).await;

        let sync = match &extract {
            ExtractOutcome::NoStreams => None,
            ExtractOutcome::Done(report) => {
                log_extract_summary(job, report);
                Some(self.synchronizer.sync(job.location(), &job.file_name).await)
            }
        };

        JobReport { extract, sync }
    }

    /// Videos a run would dispatch right now
    pub fn pending_jobs(&self, root: &Path) -> Result<(Vec<Job>, ScanReport)> {
        ensure_root(root)?;
        let scanner = Scanner::new(self.config.languages.default_language.clone());
        Ok(scanner.pending_jobs(root))
    }

    /// Subtitle streams of one video, paired with whether they would be extracted
    pub async fn probe_file(&self, video: &Path) -> Result<Vec<(SubtitleStream, bool)>> {
        if !video.is_file() {
            return Err(SubextractError::Media(format!("Video not found: {}", video.display())));
        }

        let output = self.media.probe(video).await?;
        let streams = match interpret_probe(&output) {
            ProbeOutcome::StreamsFound(streams) => streams,
            ProbeOutcome::NoSubtitles => Vec::new(),
            ProbeOutcome::ToolFailed => {
                return Err(SubextractError::Media(format!(
                    "Probe of {} failed without listing streams",
                    video.display()
                )));
            }
        };

        Ok(streams
            .into_iter()
            .map(|stream| {
                let allowed = self.config.languages.allows(&stream.language);
                (stream, allowed)
            })
            .collect())
    }

    /// Run only the sync stage for one video
    pub async fn sync_file(&self, video: &Path) -> Result<SyncReport> {
        let (location, name) = split_video_path(video)?;
        Ok(self.synchronizer.sync(&location, &name).await)
    }
}

#[async_trait]
impl JobHandler for Workflow {
    async fn handle(&self, job: Job) {
        info!("Processing job {} | {}", job.id, job.display_name());
        self.process_job(&job).await;
    }
}

fn log_extract_summary(job: &Job, report: &ExtractReport) {
    if !report.failed.is_empty() {
        warn!(
            "{} | {} of {} extractions failed: {}",
            job.display_name(),
            report.failed.len(),
            report.extracted.len() + report.failed.len(),
            report.failed.join(", ")
        );
    }
}

fn ensure_root(root: &Path) -> Result<()> {
    std::fs::read_dir(root)
        .map(|_| ())
        .map_err(|e| SubextractError::RootNotFound(format!("{}: {}", root.display(), e)))
}

fn split_video_path(video: &Path) -> Result<(PathBuf, std::ffi::OsString)> {
    if !video.is_file() {
        return Err(SubextractError::Sync(format!("Video not found: {}", video.display())));
    }
    let name = video
        .file_name()
        .ok_or_else(|| SubextractError::Sync(format!("Invalid video path: {}", video.display())))?;
    let location = match video.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((location, name.to_os_string()))
}
