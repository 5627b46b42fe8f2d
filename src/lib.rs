//! Subextract - embedded subtitle extraction and synchronization
//!
//! Walks a video library, extracts the embedded subtitle tracks of every video
//! that has not been processed yet with ffmpeg, and aligns them with alass.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod job;
pub mod media;
pub mod paths;
pub mod pool;
pub mod scanner;
pub mod sync;
pub mod workflow;
