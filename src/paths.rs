//! Path helpers shared by the scanner, the extraction stage and the sync stage.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Extensions recognized as video containers.
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm"];

/// Extensions recognized as subtitle files.
pub const SUBTITLE_EXTENSIONS: &[&str] = &[".srt"];

/// Language tag of the intermediate alignment reference (`{base}.fix.srt`).
pub const FIXED_REFERENCE_TAG: &str = "fix";

/// Lowercased extension of a file name, including the leading dot.
///
/// Returns an empty string when the name has no extension, so `"movie.MKV"`
/// gives `".mkv"` while `"README"` and the dotfile `".mkv"` give `""`.
pub fn extension<P: AsRef<Path>>(name: P) -> String {
    name.as_ref()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub fn is_video<P: AsRef<Path>>(name: P) -> bool {
    VIDEO_EXTENSIONS.contains(&extension(name).as_str())
}

pub fn is_subtitle<P: AsRef<Path>>(name: P) -> bool {
    SUBTITLE_EXTENSIONS.contains(&extension(name).as_str())
}

/// True for `*.fix.srt` intermediates left by (or in use by) the sync stage.
pub fn is_fixed_reference<P: AsRef<Path>>(name: P) -> bool {
    let name = name.as_ref();
    is_subtitle(name)
        && name
            .file_stem()
            .map(|stem| extension(stem) == format!(".{}", FIXED_REFERENCE_TAG))
            .unwrap_or(false)
}

pub fn join<P: AsRef<Path>, Q: AsRef<Path>>(location: P, name: Q) -> PathBuf {
    location.as_ref().join(name)
}

/// Path of a video with its extension stripped: `/dir/movie.mkv` -> `/dir/movie`.
pub fn base_path<P: AsRef<Path>>(video_path: P) -> PathBuf {
    video_path.as_ref().with_extension("")
}

/// Subtitle file name for a base path and language: `/dir/movie` + `eng` -> `/dir/movie.eng.srt`.
pub fn srt_name<P: AsRef<Path>>(base: P, language: &str) -> PathBuf {
    let mut name: OsString = base.as_ref().as_os_str().to_owned();
    name.push(format!(".{}.srt", language));
    PathBuf::from(name)
}

/// `{base}.{language}.srt` next to the given video file.
pub fn subtitle_for<P: AsRef<Path>>(video_path: P, language: &str) -> PathBuf {
    srt_name(base_path(video_path), language)
}

/// True when `subtitle_name` belongs to the video with the given file name,
/// i.e. it starts with the video's stem followed by a dot.
pub fn belongs_to_video(subtitle_name: &OsStr, video_name: &OsStr) -> bool {
    let stem = base_path(video_name);
    let mut prefix = stem.as_os_str().to_string_lossy().into_owned();
    prefix.push('.');
    subtitle_name.to_string_lossy().starts_with(&prefix)
}
