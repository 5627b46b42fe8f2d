//! Alignment of every subtitle next to a video against the default-language track.
//!
//! alass first aligns `{base}.{default}.srt` to the video's audio, producing
//! `{base}.fix.srt`. Every subtitle file is then aligned to the video using
//! that fixed reference and rewritten in place. The fixed reference is always
//! removed afterwards.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::{SyncConfig, SyncScope};
use crate::error::{Result, SubextractError};
use crate::media::MediaCommand;
use crate::paths;

/// Operations the sync stage needs from the alignment tool
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleAlignerTrait: Send + Sync {
    /// Align `subtitle` to `video`, writing the result to `output`
    async fn align(&self, video: &Path, subtitle: &Path, output: &Path) -> Result<()>;

    /// Check if the alignment tool is available
    async fn check_availability(&self) -> Result<()>;
}

/// alass-backed aligner
pub struct AlassAligner {
    binary_path: String,
}

impl AlassAligner {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
        }
    }

    /// `alass <video> <subtitle> <output>`
    pub fn align_command(&self, video: &Path, subtitle: &Path, output: &Path) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle alignment")
            .output(video)
            .output(subtitle)
            .output(output)
    }
}

#[async_trait]
impl SubtitleAlignerTrait for AlassAligner {
    async fn align(&self, video: &Path, subtitle: &Path, output: &Path) -> Result<()> {
        self.align_command(video, subtitle, output)
            .execute()
            .await
            .map_err(|e| SubextractError::Sync(e.to_string()))
    }

    async fn check_availability(&self) -> Result<()> {
        let output = MediaCommand::new(&self.binary_path, "Version check")
            .arg("--version")
            .run()
            .await?;

        if output.success {
            info!("Alignment tool is available: {}", output.combined.lines().next().unwrap_or("alass"));
            Ok(())
        } else {
            Err(SubextractError::Sync("Alignment tool version check failed".to_string()))
        }
    }
}

/// What happened while syncing the subtitles of one video
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub reference_generated: bool,
    /// Subtitle files aligned successfully
    pub synced: Vec<PathBuf>,
    /// Subtitle files whose alignment failed
    pub failed: Vec<PathBuf>,
    /// The fixed reference no longer exists on disk
    pub cleaned_up: bool,
}

pub struct SubtitleSynchronizer {
    aligner: Arc<dyn SubtitleAlignerTrait>,
    default_language: String,
    scope: SyncScope,
}

impl SubtitleSynchronizer {
    pub fn new<S: Into<String>>(
        aligner: Arc<dyn SubtitleAlignerTrait>,
        default_language: S,
        scope: SyncScope,
    ) -> Self {
        Self {
            aligner,
            default_language: default_language.into(),
            scope,
        }
    }

    /// Sync every subtitle of `video_name` inside `location`.
    pub async fn sync(&self, location: &Path, video_name: &OsStr) -> SyncReport {
        let mut report = SyncReport::default();
        let video_display = video_name.to_string_lossy();

        // Fresh listing: extraction has just added files
        let subtitles = match self.list_subtitles(location, video_name).await {
            Ok(subtitles) => subtitles,
            Err(e) => {
                error!("listing {}: {}", location.display(), e);
                return report;
            }
        };

        let video_path = paths::join(location, video_name);
        let base = paths::base_path(&video_path);
        let reference = paths::srt_name(&base, &self.default_language);
        let fixed = paths::srt_name(&base, paths::FIXED_REFERENCE_TAG);

        match self.aligner.align(&video_path, &reference, &fixed).await {
            Ok(()) => {
                report.reference_generated = true;
                for subtitle in subtitles {
                    match self.aligner.align(&video_path, &fixed, &subtitle).await {
                        Ok(()) => {
                            info!("Synched | {}", file_name(&subtitle));
                            report.synced.push(subtitle);
                        }
                        Err(e) => {
                            error!("syncing {}: {}", file_name(&subtitle), e);
                            report.failed.push(subtitle);
                        }
                    }
                }
            }
            Err(e) => error!("generating sync reference for {}: {}", video_display, e),
        }

        report.cleaned_up = remove_fixed_reference(&fixed).await;
        report
    }

    /// Subtitle files of the directory, sorted, without fixed intermediates
    async fn list_subtitles(&self, location: &Path, video_name: &OsStr) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(location).await?;
        let mut subtitles = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name: OsString = entry.file_name();
            if !paths::is_subtitle(&name) || paths::is_fixed_reference(&name) {
                continue;
            }
            if self.scope == SyncScope::Video && !paths::belongs_to_video(&name, video_name) {
                continue;
            }
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            subtitles.push(entry.path());
        }

        subtitles.sort();
        debug!("{} subtitle files to sync in {}", subtitles.len(), location.display());
        Ok(subtitles)
    }
}

/// Delete the fixed reference; a missing file counts as removed.
async fn remove_fixed_reference(fixed: &Path) -> bool {
    match tokio::fs::remove_file(fixed).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            error!("removing {}: {}", fixed.display(), e);
            false
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
