use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, SubextractError};
use super::{CommandOutput, MediaCommandBuilder, MediaProcessorTrait, SubtitleStream};

/// ffmpeg-backed media processor
pub struct FfmpegProcessor {
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(config.binary_path),
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for FfmpegProcessor {
    async fn probe(&self, video_path: &Path) -> Result<CommandOutput> {
        debug!("Probing {}", video_path.display());
        self.command_builder.probe(video_path).run().await
    }

    async fn extract_subtitle(
        &self,
        video_path: &Path,
        stream: &SubtitleStream,
        output_path: &Path,
    ) -> Result<()> {
        debug!(
            "Extracting stream {} ({}) from {} to {}",
            stream.index,
            stream.language,
            video_path.display(),
            output_path.display()
        );

        self.command_builder
            .extract_subtitle(video_path, &stream.index, output_path)
            .execute()
            .await
    }

    async fn check_availability(&self) -> Result<()> {
        let output = self.command_builder.version_check().run().await?;

        if output.success {
            let version = output.combined.lines().next().unwrap_or("Unknown version");
            info!("Media processor is available: {}", version);
            Ok(())
        } else {
            Err(SubextractError::Media("Media processor version check failed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_binary() {
        let processor = FfmpegProcessor::new(MediaConfig {
            binary_path: "/nonexistent/ffmpeg-for-tests".to_string(),
        });
        assert!(processor.check_availability().await.is_err());
        assert!(processor.probe(Path::new("/tmp/none.mkv")).await.is_err());
    }
}
