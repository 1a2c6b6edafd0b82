//! System ffmpeg/ffprobe as the probing and extraction collaborators.
//! Both fail fast; retrying is the outer loop's decision.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;
use serde_json::Value;
use vsmp_core::engine::frame_timestamp_ms;
use vsmp_core::error::PlayerError;
use vsmp_core::source::FrameSource;

pub struct FfmpegFrameSource {
    extract_path: PathBuf,
}

impl FfmpegFrameSource {
    pub fn new<P: AsRef<Path>>(extract_path: P) -> Self {
        Self {
            extract_path: extract_path.as_ref().to_path_buf(),
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_count(&mut self, media: &Path) -> Result<u64, PlayerError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_streams",
                "-print_format",
                "json",
            ])
            .arg(media)
            .output()
            .map_err(|err| probe_err(media, format!("failed to run ffprobe: {err}")))?;

        if !output.status.success() {
            return Err(probe_err(
                media,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let document: Value = serde_json::from_slice(&output.stdout)
            .map_err(|err| probe_err(media, format!("unparsable ffprobe output: {err}")))?;
        let Some(stream) = document.get("streams").and_then(|streams| streams.get(0)) else {
            return Err(probe_err(media, "no streams found in ffmpeg probe".into()));
        };

        // ffprobe reports numbers as JSON strings; fall back to the
        // nominal timeline when the container omits nb_frames
        let nb_frames = stream
            .get("nb_frames")
            .and_then(Value::as_str)
            .and_then(|value| value.parse::<u64>().ok());
        let frame_count = match nb_frames {
            Some(count) if count > 0 => count,
            _ => {
                let duration = stream
                    .get("duration")
                    .and_then(Value::as_str)
                    .and_then(|value| value.parse::<f64>().ok())
                    .ok_or_else(|| {
                        probe_err(media, "stream has neither nb_frames nor duration".into())
                    })?;
                (24.0 * duration) as u64
            }
        };

        if frame_count == 0 {
            return Err(probe_err(media, "probe reported zero frames".into()));
        }
        Ok(frame_count)
    }

    fn extract_frame(&mut self, media: &Path, frame: u64) -> Result<PathBuf, PlayerError> {
        info!("Extracting frame #{frame} from `{}`", media.display());

        let seek = format!("{:.3}ms", frame_timestamp_ms(frame));
        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y", "-ss", &seek, "-i"])
            .arg(media)
            .args(["-frames:v", "1"])
            .arg(&self.extract_path)
            .output()
            .map_err(|err| extract_err(media, frame, format!("failed to run ffmpeg: {err}")))?;

        if !output.status.success() {
            return Err(extract_err(
                media,
                frame,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(self.extract_path.clone())
    }
}

fn probe_err(media: &Path, reason: String) -> PlayerError {
    PlayerError::Probe {
        media: media.to_path_buf(),
        reason,
    }
}

fn extract_err(media: &Path, frame: u64, reason: String) -> PlayerError {
    PlayerError::Extraction {
        media: media.to_path_buf(),
        frame,
        reason,
    }
}
