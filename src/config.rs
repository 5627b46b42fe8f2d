use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SubextractError};

fn default_root_folder() -> PathBuf {
    PathBuf::from("/app/subextract/videos")
}

fn default_language() -> String {
    "eng".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory searched for videos
    #[serde(default = "default_root_folder")]
    pub root_folder: PathBuf,
    #[serde(default)]
    pub languages: LanguageSelection,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Which subtitle tracks to extract and which one acts as the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSelection {
    /// Languages to extract; empty means every detected language
    #[serde(default)]
    pub extract: Vec<String>,
    /// Marks a video as already processed and serves as the sync reference
    #[serde(default = "default_language")]
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Path to alass binary
    pub binary_path: String,
    /// Which subtitle files of a directory get aligned
    #[serde(default)]
    pub scope: SyncScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncScope {
    /// Every subtitle file in the video's directory
    #[default]
    Directory,
    /// Only subtitle files named after the video
    Video,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of workers; derived from available parallelism when unset
    pub workers: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_folder: default_root_folder(),
            languages: LanguageSelection::default(),
            media: MediaConfig::default(),
            sync: SyncConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

impl Default for LanguageSelection {
    fn default() -> Self {
        Self {
            extract: Vec::new(),
            default_language: default_language(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            binary_path: "./alass-cli".to_string(),
            scope: SyncScope::Directory,
        }
    }
}

impl LanguageSelection {
    pub fn new<S: Into<String>>(extract: Vec<String>, default_language: S) -> Self {
        Self {
            extract: extract.into_iter().map(|l| l.trim().to_lowercase()).collect(),
            default_language: default_language.into().trim().to_lowercase(),
        }
    }

    /// Parse a bracketed, comma separated list such as `[por, eng]`.
    ///
    /// `""` and `"[]"` both yield an empty list, which means "extract all".
    pub fn parse_list(value: &str) -> Vec<String> {
        let trimmed = value.trim();
        let inner = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(trimmed);

        inner
            .split(',')
            .map(|lang| lang.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_lowercase())
            .filter(|lang| !lang.is_empty())
            .collect()
    }

    /// Whether a detected language should be extracted.
    pub fn allows(&self, language: &str) -> bool {
        self.extract.is_empty() || self.extract.iter().any(|l| l.eq_ignore_ascii_case(language))
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubextractError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubextractError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubextractError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply `SUBEXTRACT_*` environment variables on top of this config.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup; `apply_env` uses the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("SUBEXTRACT_ROOT_FOLDER") {
            self.root_folder = PathBuf::from(root);
        }
        if let Some(languages) = lookup("SUBEXTRACT_LANGUAGES") {
            self.languages.extract = LanguageSelection::parse_list(&languages);
        }
        if let Some(language) = lookup("SUBEXTRACT_DEFAULT_LANGUAGE") {
            let language = language.trim().to_lowercase();
            if !language.is_empty() {
                self.languages.default_language = language;
            }
        }
        if let Some(ffmpeg) = lookup("SUBEXTRACT_FFMPEG") {
            self.media.binary_path = ffmpeg;
        }
        if let Some(alass) = lookup("SUBEXTRACT_ALASS") {
            self.sync.binary_path = alass;
        }
        if let Some(workers) = lookup("SUBEXTRACT_WORKERS") {
            let workers = workers.trim().parse::<usize>().map_err(|e| {
                SubextractError::Config(format!("Invalid SUBEXTRACT_WORKERS '{}': {}", workers, e))
            })?;
            self.pool.workers = Some(workers);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.languages.default_language.trim().is_empty() {
            return Err(SubextractError::Config("Default language must not be empty".to_string()));
        }
        if self.media.binary_path.trim().is_empty() {
            return Err(SubextractError::Config("ffmpeg binary path must not be empty".to_string()));
        }
        if self.sync.binary_path.trim().is_empty() {
            return Err(SubextractError::Config("alass binary path must not be empty".to_string()));
        }
        Ok(())
    }
}
