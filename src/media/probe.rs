//! Parsing of ffmpeg's human readable stream listing.
//!
//! `ffmpeg -i <file>` prints lines such as
//!
//! ```text
//!   Stream #0:2(eng): Subtitle: subrip (default)
//!   Stream #0:3[0x1f](spa): Subtitle: mov_text (tx3g / 0x67337874)
//! ```
//!
//! Only the stream index and the three letter language code are of interest.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::CommandOutput;

/// Literal that every subtitle stream line carries.
pub const SUBTITLE_MARKER: &str = "Subtitle";

static SUBTITLE_STREAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Stream #(\d+:\d+)(?:\[0x[0-9a-fA-F]+\])?\((\w{3})\): Subtitle")
        .expect("subtitle stream pattern is valid")
});

/// One embedded subtitle stream as reported by the probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleStream {
    /// ffmpeg stream specifier, e.g. `0:2`
    pub index: String,
    /// Three letter language code, e.g. `eng`
    pub language: String,
}

/// Result of interpreting a probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Tool failed and printed no subtitle stream
    ToolFailed,
    /// Tool ran but reported no subtitle stream
    NoSubtitles,
    StreamsFound(Vec<SubtitleStream>),
}

/// Extract every subtitle stream from probe output, in the order printed.
///
/// Lines that mention subtitles but do not match the full pattern are skipped.
pub fn parse_subtitle_streams(output: &str) -> Vec<SubtitleStream> {
    output
        .lines()
        .filter(|line| line.contains(SUBTITLE_MARKER))
        .filter_map(|line| SUBTITLE_STREAM.captures(line))
        .map(|caps| SubtitleStream {
            index: caps[1].to_string(),
            language: caps[2].to_lowercase(),
        })
        .collect()
}

/// Decide what a probe run means. The exit status only matters when the
/// output carries no subtitle stream: ffmpeg exits non-zero for a bare `-i`
/// even though it printed the full stream listing.
pub fn interpret_probe(output: &CommandOutput) -> ProbeOutcome {
    let streams = parse_subtitle_streams(&output.combined);
    if !streams.is_empty() {
        ProbeOutcome::StreamsFound(streams)
    } else if output.success {
        ProbeOutcome::NoSubtitles
    } else {
        ProbeOutcome::ToolFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MKV_OUTPUT: &str = r#"Input #0, matroska,webm, from 'movie1.mkv':
  Metadata:
    title           : Movie
  Duration: 01:42:17.02, start: 0.000000, bitrate: 5123 kb/s
  Stream #0:0: Video: h264 (High), yuv420p(progressive), 1920x1080, 23.98 fps
  Stream #0:1(eng): Audio: ac3, 48000 Hz, 5.1(side), fltp, 384 kb/s (default)
  Stream #0:2(eng): Subtitle: subrip (default)
    Metadata:
      title           : English
  Stream #0:3(spa): Subtitle: subrip
  Stream #0:4: Subtitle: hdmv_pgs_subtitle
At least one output file must be specified
"#;

    fn output(success: bool, combined: &str) -> CommandOutput {
        CommandOutput {
            success,
            code: Some(if success { 0 } else { 1 }),
            combined: combined.to_string(),
        }
    }

    #[test]
    fn test_parse_subtitle_streams() {
        let streams = parse_subtitle_streams(MKV_OUTPUT);
        assert_eq!(
            streams,
            vec![
                SubtitleStream { index: "0:2".to_string(), language: "eng".to_string() },
                SubtitleStream { index: "0:3".to_string(), language: "spa".to_string() },
            ]
        );
    }

    #[test]
    fn test_parse_stream_with_container_id() {
        let streams = parse_subtitle_streams("  Stream #0:5[0x1f](por): Subtitle: mov_text (tx3g)\n");
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].index, "0:5");
        assert_eq!(streams[0].language, "por");
    }

    #[test]
    fn test_audio_streams_are_ignored() {
        let streams = parse_subtitle_streams("  Stream #0:1(eng): Audio: aac\n  Stream #0:0: Video: hevc\n");
        assert!(streams.is_empty());
    }

    #[test]
    fn test_k_lines_give_k_streams() {
        let text: String = (0..7)
            .map(|i| format!("  Stream #0:{}(l{:02}): Subtitle: ass\n", i + 2, i))
            .collect();
        let streams = parse_subtitle_streams(&text);
        assert_eq!(streams.len(), 7);
        for (i, stream) in streams.iter().enumerate() {
            assert_eq!(stream.index, format!("0:{}", i + 2));
            assert_eq!(stream.language, format!("l{:02}", i));
        }
    }

    #[test]
    fn test_failed_exit_with_streams_is_success() {
        match interpret_probe(&output(false, MKV_OUTPUT)) {
            ProbeOutcome::StreamsFound(streams) => assert_eq!(streams.len(), 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_failed_exit_with_only_other_streams() {
        let text = "  Stream #0:0: Video: h264\n  Stream #0:1(eng): Audio: aac\n";
        assert_eq!(interpret_probe(&output(false, text)), ProbeOutcome::ToolFailed);
    }

    #[test]
    fn test_failed_exit_without_output() {
        let text = "movie.mkv: Invalid data found when processing input\n";
        assert_eq!(interpret_probe(&output(false, text)), ProbeOutcome::ToolFailed);
    }

    #[test]
    fn test_success_without_subtitles() {
        assert_eq!(
            interpret_probe(&output(true, "  Stream #0:0: Video: h264\n")),
            ProbeOutcome::NoSubtitles
        );
    }
}
