use std::env;
use std::path::PathBuf;

use crate::error::PlayerError;

/// Runtime configuration, read once from the environment at startup.
///
/// Anything unset takes the documented default; anything set but invalid
/// is fatal before playback starts.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for `.mp4` files.
    pub movie_dir: PathBuf,
    /// Optional directory of stills shown after the video queue.
    pub photo_dir: Option<PathBuf>,
    /// The JSON progress ledger.
    pub progress_log: PathBuf,
    /// Where extracted frames are written before display.
    pub extract_path: PathBuf,
    /// Frames advanced per step.
    pub frame_step: u64,
    /// Seconds each extracted frame stays on screen.
    pub frame_delay: u64,
    /// Seconds each photo stays on screen.
    pub photo_delay: u64,
    /// A ledger entry within this many frames of its total counts as
    /// fully played.
    pub resume_threshold: u64,
    /// Debug knob: zero progress before every playback.
    pub always_restart: bool,
    /// Videos at least this long get the late resume default.
    pub long_video_cutoff: u64,
    /// First-play resume point for long videos, to skip leading credits.
    pub long_video_resume: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, PlayerError> {
        let frame_step = env_u64("VSMP_FRAME_STEP", 12)?;
        if frame_step == 0 {
            return Err(PlayerError::Config(
                "`VSMP_FRAME_STEP` must be at least 1".into(),
            ));
        }
        Ok(Self {
            movie_dir: env_path("VSMP_MOVIE_DIR", ".media/movies"),
            photo_dir: env::var_os("VSMP_PHOTO_DIR").map(PathBuf::from),
            progress_log: env_path("VSMP_PROGRESS_LOG", ".media/progress_log.json"),
            extract_path: match env::var_os("VSMP_EXTRACT_PATH") {
                Some(path) => PathBuf::from(path),
                None => env::temp_dir().join("vsmp_extract.jpg"),
            },
            frame_step,
            frame_delay: env_u64("VSMP_FRAME_DELAY", 120)?,
            photo_delay: env_u64("VSMP_PHOTO_DELAY", 300)?,
            resume_threshold: env_u64("VSMP_RESUME_THRESHOLD", frame_step)?,
            always_restart: env_bool("ALWAYS_RESTART_VIDEOS", false)?,
            long_video_cutoff: env_u64("VSMP_LONG_VIDEO_CUTOFF", 10_000)?,
            long_video_resume: env_u64("VSMP_LONG_VIDEO_RESUME", 2_000)?,
        })
    }
}

fn env_path(name: &str, default: &str) -> PathBuf {
    env::var_os(name)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn env_u64(name: &str, default: u64) -> Result<u64, PlayerError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| PlayerError::Config(format!("`{name}` must be an integer, got `{value}`"))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => {
            Err(PlayerError::Config(format!("`{name}` is not valid UTF-8")))
        }
    }
}

fn env_bool(name: &str, default: bool) -> Result<bool, PlayerError> {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(PlayerError::Config(format!(
                "`{name}` must be a boolean, got `{value}`"
            ))),
        },
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => {
            Err(PlayerError::Config(format!("`{name}` is not valid UTF-8")))
        }
    }
}
