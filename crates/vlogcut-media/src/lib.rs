//! FFmpeg CLI wrapper for cutting plans into a single video.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner with per-command timeouts
//! - Plan execution: stream-copy extraction, concat manifest, final join

pub mod command;
pub mod cut;
pub mod error;

pub use command::{check_ffmpeg, concat_command, extract_command, FfmpegCommand, FfmpegRunner};
pub use cut::{
    cut_plan, cut_plan_with, escape_concat_path, segment_file_name, write_concat_manifest,
    CutOptions, CutReport, SegmentOutcome, SegmentResult, SegmentRunner, MANIFEST_FILE_NAME,
};
pub use error::{MediaError, MediaResult};
