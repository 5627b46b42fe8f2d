use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::paths;

/// One video file's extraction and sync task, consumed exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Dispatch sequence number, starting at 1
    pub id: usize,
    /// Directory containing the video
    pub location: PathBuf,
    /// File name of the video inside `location`
    pub file_name: OsString,
}

impl Job {
    pub fn new<P: Into<PathBuf>, N: Into<OsString>>(id: usize, location: P, file_name: N) -> Self {
        Self {
            id,
            location: location.into(),
            file_name: file_name.into(),
        }
    }

    pub fn video_path(&self) -> PathBuf {
        paths::join(&self.location, &self.file_name)
    }

    /// Video path without its extension, the stem shared by all its subtitles
    pub fn base_path(&self) -> PathBuf {
        paths::base_path(self.video_path())
    }

    pub fn subtitle_path(&self, language: &str) -> PathBuf {
        paths::srt_name(self.base_path(), language)
    }

    pub fn display_name(&self) -> String {
        self.file_name.to_string_lossy().into_owned()
    }

    pub fn location(&self) -> &Path {
        &self.location
    }
}
