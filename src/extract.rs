use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::LanguageSelection;
use crate::job::Job;
use crate::media::{interpret_probe, MediaProcessorTrait, ProbeOutcome, SubtitleStream};

/// What happened while probing and extracting one video
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Subtitle streams reported by the probe
    pub streams: Vec<SubtitleStream>,
    /// Languages written to `{base}.{lang}.srt`
    pub extracted: Vec<String>,
    /// Languages whose extraction failed
    pub failed: Vec<String>,
    /// Languages skipped by the allow-list
    pub filtered: Vec<String>,
}

/// Terminal state of the probe-and-extract stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Nothing to extract; the job ends here
    NoStreams,
    /// Streams were found and every allowed one was attempted
    Done(ExtractReport),
}

/// Probe a video for subtitle streams and extract each allowed one
pub struct SubtitleExtractor {
    media: Arc<dyn MediaProcessorTrait>,
    languages: LanguageSelection,
}

impl SubtitleExtractor {
    pub fn new(media: Arc<dyn MediaProcessorTrait>, languages: LanguageSelection) -> Self {
        Self { media, languages }
    }

    pub async fn run(&self, job: &Job) -> ExtractOutcome {
        let video_path = job.video_path();
        let name = job.display_name();

        let output = match self.media.probe(&video_path).await {
            Ok(output) => output,
            Err(e) => {
                error!("probing {}: {}", name, e);
                return ExtractOutcome::NoStreams;
            }
        };

        let streams = match interpret_probe(&output) {
            ProbeOutcome::ToolFailed => {
                info!("No subtitles found | {}", name);
                return ExtractOutcome::NoStreams;
            }
            ProbeOutcome::NoSubtitles => {
                info!("No subtitle detected | {}", name);
                return ExtractOutcome::NoStreams;
            }
            ProbeOutcome::StreamsFound(streams) => streams,
        };

        info!("Extracting from | {} | {} subtitle streams", name, streams.len());

        let mut report = ExtractReport::default();
        for stream in &streams {
            if !self.languages.allows(&stream.language) {
                debug!("Skipping {} stream {} of {}", stream.language, stream.index, name);
                report.filtered.push(stream.language.clone());
                continue;
            }

            let output_path = job.subtitle_path(&stream.language);
            match self.media.extract_subtitle(&video_path, stream, &output_path).await {
                Ok(()) => {
                    info!("extracted | {} | {}", stream.language, name);
                    report.extracted.push(stream.language.clone());
                }
                Err(e) => {
                    error!("extracting {} from {}: {}", stream.language, name, e);
                    report.failed.push(stream.language.clone());
                }
            }
        }

        report.streams = streams;
        ExtractOutcome::Done(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubextractError;
    use crate::media::{CommandOutput, MockMediaProcessorTrait};
    use std::path::PathBuf;

    const PROBE: &str = "  Stream #0:0: Video: h264\n  Stream #0:2(eng): Subtitle: subrip\n  Stream #0:3(por): Subtitle: subrip\n  Stream #0:4(spa): Subtitle: ass\n";

    fn probe_output(success: bool, combined: &str) -> CommandOutput {
        CommandOutput { success, code: Some(if success { 0 } else { 1 }), combined: combined.to_string() }
    }

    fn job() -> Job {
        Job::new(1, "/videos", "movie1.mkv")
    }

    #[tokio::test]
    async fn test_extracts_every_stream_when_allow_list_empty() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe().times(1).returning(|_| Ok(probe_output(false, PROBE)));
        media
            .expect_extract_subtitle()
            .times(3)
            .withf(|video, stream, output| {
                video == PathBuf::from("/videos/movie1.mkv").as_path()
                    && output == PathBuf::from(format!("/videos/movie1.{}.srt", stream.language)).as_path()
            })
            .returning(|_, _, _| Ok(()));

        let extractor = SubtitleExtractor::new(Arc::new(media), LanguageSelection::default());
        match extractor.run(&job()).await {
            ExtractOutcome::Done(report) => {
                assert_eq!(report.streams.len(), 3);
                assert_eq!(report.extracted, vec!["eng", "por", "spa"]);
                assert!(report.failed.is_empty());
                assert!(report.filtered.is_empty());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_index_pairs_with_language() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe().returning(|_| Ok(probe_output(false, PROBE)));
        media
            .expect_extract_subtitle()
            .times(3)
            .withf(|_, stream, _| {
                matches!(
                    (stream.index.as_str(), stream.language.as_str()),
                    ("0:2", "eng") | ("0:3", "por") | ("0:4", "spa")
                )
            })
            .returning(|_, _, _| Ok(()));

        let extractor = SubtitleExtractor::new(Arc::new(media), LanguageSelection::default());
        assert!(matches!(extractor.run(&job()).await, ExtractOutcome::Done(_)));
    }

    #[tokio::test]
    async fn test_allow_list_filters_languages() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe().returning(|_| Ok(probe_output(false, PROBE)));
        media
            .expect_extract_subtitle()
            .times(1)
            .withf(|_, stream, _| stream.language == "por" && stream.index == "0:3")
            .returning(|_, _, _| Ok(()));

        let languages = LanguageSelection::new(vec!["por".to_string()], "eng");
        let extractor = SubtitleExtractor::new(Arc::new(media), languages);
        match extractor.run(&job()).await {
            ExtractOutcome::Done(report) => {
                assert_eq!(report.extracted, vec!["por"]);
                assert_eq!(report.filtered, vec!["eng", "spa"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_extraction_does_not_stop_others() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe().returning(|_| Ok(probe_output(false, PROBE)));
        media.expect_extract_subtitle().times(3).returning(|_, stream, _| {
            if stream.language == "eng" {
                Err(SubextractError::Media("Subtitle extraction failed".to_string()))
            } else {
                Ok(())
            }
        });

        let extractor = SubtitleExtractor::new(Arc::new(media), LanguageSelection::default());
        match extractor.run(&job()).await {
            ExtractOutcome::Done(report) => {
                assert_eq!(report.failed, vec!["eng"]);
                assert_eq!(report.extracted, vec!["por", "spa"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_failure_without_subtitles_is_terminal() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_probe()
            .returning(|_| Ok(probe_output(false, "  Stream #0:1(eng): Audio: aac\n")));
        media.expect_extract_subtitle().never();

        let extractor = SubtitleExtractor::new(Arc::new(media), LanguageSelection::default());
        assert_eq!(extractor.run(&job()).await, ExtractOutcome::NoStreams);
    }

    #[tokio::test]
    async fn test_probe_spawn_error_is_terminal() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_probe()
            .returning(|_| Err(SubextractError::Media("Failed to execute ffmpeg".to_string())));
        media.expect_extract_subtitle().never();

        let extractor = SubtitleExtractor::new(Arc::new(media), LanguageSelection::default());
        assert_eq!(extractor.run(&job()).await, ExtractOutcome::NoStreams);
    }

    #[tokio::test]
    async fn test_all_streams_filtered_still_done() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe().returning(|_| Ok(probe_output(false, PROBE)));
        media.expect_extract_subtitle().never();

        let languages = LanguageSelection::new(vec!["jpn".to_string()], "eng");
        let extractor = SubtitleExtractor::new(Arc::new(media), languages);
        match extractor.run(&job()).await {
            ExtractOutcome::Done(report) => {
                assert!(report.extracted.is_empty());
                assert_eq!(report.filtered.len(), 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
