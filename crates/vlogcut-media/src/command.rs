//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default per-command timeout.
pub const DEFAULT_FFMPEG_TIMEOUT_SECS: u64 = 600;

const STDERR_TAIL_CHARS: usize = 2000;
const FFMPEG_LOG_LEVEL: &str = "error";

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Seek to a position (`HH:MM:SS` or seconds) before opening the input.
    pub fn seek(self, position: impl Into<String>) -> Self {
        self.input_arg("-ss").input_arg(position)
    }

    /// Stop reading the input at a position on the input timeline.
    pub fn until(self, position: impl Into<String>) -> Self {
        self.input_arg("-to").input_arg(position)
    }

    /// Force the input demuxer.
    pub fn input_format(self, format: impl Into<String>) -> Self {
        self.input_arg("-f").input_arg(format)
    }

    /// Allow absolute paths in a concat manifest.
    pub fn unsafe_paths(self) -> Self {
        self.input_arg("-safe").input_arg("0")
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(FFMPEG_LOG_LEVEL.to_string());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Stream-copy extraction of `[start, end]` from `input`.
pub fn extract_command(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: &str,
    end: &str,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .seek(start)
        .until(end)
        .codec_copy()
}

/// Stream-copy concatenation of the files listed in a concat manifest.
pub fn concat_command(manifest: impl AsRef<Path>, output: impl AsRef<Path>) -> FfmpegCommand {
    FfmpegCommand::new(manifest, output)
        .input_format("concat")
        .unsafe_paths()
        .codec_copy()
}

/// Runner for FFmpeg commands with a per-command timeout.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: u64,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self {
            timeout_secs: DEFAULT_FFMPEG_TIMEOUT_SECS,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                // dropping the future kills the child
                warn!("FFmpeg timed out after {} seconds, killing process", self.timeout_secs);
                return Err(MediaError::Timeout(self.timeout_secs));
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr_tail(&stderr)),
                output.status.code(),
            ))
        }
    }
}

/// Last part of FFmpeg's stderr, which holds the actual error.
fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - STDERR_TAIL_CHARS).collect()
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_args() {
        let args = extract_command("videos/partA.mp4", "out/seg.mp4", "00:00:10", "00:00:15").build_args();
        assert_eq!(
            args,
            vec![
                "-y", "-v", "error", "-ss", "00:00:10", "-to", "00:00:15", "-i", "videos/partA.mp4", "-c",
                "copy", "out/seg.mp4"
            ]
        );
    }

    #[test]
    fn test_concat_args() {
        let args = concat_command("out/segments_list.txt", "final.mp4").build_args();
        assert_eq!(
            args,
            vec![
                "-y", "-v", "error", "-f", "concat", "-safe", "0", "-i", "out/segments_list.txt", "-c",
                "copy", "final.mp4"
            ]
        );
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(stderr_tail("  short  "), "short");
        let long = format!("{}END", "x".repeat(3000));
        let tail = stderr_tail(&long);
        assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS);
        assert!(tail.ends_with("END"));
    }
}
