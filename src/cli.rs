use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides shared by the commands that walk a library
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LibraryArgs {
    /// Root folder to search for videos
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Languages to extract, e.g. "[por, eng]"; empty or "[]" extracts all
    #[arg(short, long)]
    pub languages: Option<String>,

    /// Language that marks a video as done and serves as the sync reference
    #[arg(short, long)]
    pub default_language: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract and sync subtitles for every pending video under the root folder
    Run {
        #[command(flatten)]
        library: LibraryArgs,

        /// Number of workers (defaults to available parallelism minus one)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// List the videos a run would process, without invoking any tool
    Scan {
        #[command(flatten)]
        library: LibraryArgs,

        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the subtitle streams embedded in a video
    Probe {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Sync the subtitles next to a video against its default-language track
    Sync {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write the default configuration to a file
    Init {
        /// Output configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_run_overrides() {
        let args = Args::parse_from([
            "subextract", "-v", "run", "--root", "/media", "--languages", "[por]", "--workers", "2",
        ]);
        assert!(args.verbose);
        match args.command {
            Commands::Run { library, workers } => {
                assert_eq!(library.root, Some(PathBuf::from("/media")));
                assert_eq!(library.languages.as_deref(), Some("[por]"));
                assert_eq!(library.default_language, None);
                assert_eq!(workers, Some(2));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_scan_json() {
        let args = Args::parse_from(["subextract", "scan", "-d", "spa", "--json"]);
        match args.command {
            Commands::Scan { library, json } => {
                assert!(json);
                assert_eq!(library.default_language.as_deref(), Some("spa"));
            }
            _ => panic!("expected scan command"),
        }
    }
}
