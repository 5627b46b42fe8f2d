// Media tool abstraction
//
// - Commands: command builders and subprocess execution
// - Probe: parsing of the stream listing printed by `ffmpeg -i`
// - Processor: ffmpeg-backed implementation of the trait below

pub mod commands;
pub mod probe;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use probe::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Operations the extraction stage needs from the media tool
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Run the stream listing for a video and capture its output
    async fn probe(&self, video_path: &Path) -> Result<CommandOutput>;

    /// Extract one subtitle stream to an SRT file
    async fn extract_subtitle(
        &self,
        video_path: &Path,
        stream: &SubtitleStream,
        output_path: &Path,
    ) -> Result<()>;

    /// Check if the media tool is available
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::FfmpegProcessor::new(config))
    }
}
