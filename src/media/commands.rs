use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SubextractError};

/// Captured result of an external tool invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr
    pub combined: String,
}

/// Abstract external tool command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add a positional path (output file, or a plain argument for tools without flags)
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Select a single input stream, e.g. `0:2`
    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    /// Set subtitle codec
    pub fn subtitle_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:s").arg(codec)
    }

    /// Run the command and capture its output without judging the exit status
    pub async fn run(&self) -> Result<CommandOutput> {
        debug!("Executing {}: {} {:?}", self.description, self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                SubextractError::Media(format!("Failed to execute {}: {}", self.binary_path, e))
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            combined,
        })
    }

    /// Execute the command, failing on a non-zero exit status
    pub async fn execute(&self) -> Result<()> {
        let output = self.run().await?;

        if !output.success {
            let status = output
                .code
                .map(|code| format!("exit status {}", code))
                .unwrap_or_else(|| "terminated by signal".to_string());
            return Err(SubextractError::Media(format!(
                "{} failed ({}): {}",
                self.description,
                status,
                last_line(&output.combined)
            )));
        }

        Ok(())
    }
}

/// Last non-empty line of tool output; ffmpeg and alass put the actual reason there.
fn last_line(output: &str) -> &str {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no output")
}

/// Builder for the ffmpeg invocations used by the pipeline
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// `ffmpeg -i <video>`: lists streams on stderr and exits non-zero (no output file)
    pub fn probe<P: AsRef<Path>>(&self, video_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle probe").input(video_path)
    }

    /// `ffmpeg -i <video> -map <index> -c:s srt <output>`
    pub fn extract_subtitle<P: AsRef<Path>>(
        &self,
        video_path: P,
        stream_index: &str,
        output_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle extraction")
            .input(video_path)
            .map(stream_index)
            .subtitle_codec("srt")
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_command_args() {
        let cmd = MediaCommandBuilder::new("ffmpeg").probe("/videos/movie.mkv");
        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(cmd.args, vec!["-i", "/videos/movie.mkv"]);
    }

    #[test]
    fn test_extract_command_args() {
        let cmd = MediaCommandBuilder::new("/opt/ffmpeg").extract_subtitle(
            Path::new("/videos/movie.mkv"),
            "0:3",
            Path::new("/videos/movie.spa.srt"),
        );
        assert_eq!(
            cmd.args,
            vec!["-i", "/videos/movie.mkv", "-map", "0:3", "-c:s", "srt", "/videos/movie.spa.srt"]
        );
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("a\nb\n\n  \n"), "b");
        assert_eq!(last_line(""), "no output");
    }

    #[tokio::test]
    async fn test_missing_binary_is_media_error() {
        let cmd = MediaCommand::new("/nonexistent/definitely-not-ffmpeg", "Probe").arg("-version");
        let result = cmd.run().await;
        assert!(matches!(result, Err(SubextractError::Media(_))));
    }
}
