use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the playback core.
///
/// The engine reports failures per item rather than swallowing them; the
/// outer loop uses [`PlayerError::is_fatal`] to decide whether to move on
/// to the next selection or end the run.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("media `{0}` is no longer available")]
    MediaUnavailable(PathBuf),

    #[error("could not determine frame count of `{media}`: {reason}")]
    Probe { media: PathBuf, reason: String },

    #[error("failed to extract frame #{frame} from `{media}`: {reason}")]
    Extraction {
        media: PathBuf,
        frame: u64,
        reason: String,
    },

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("cannot encode {width}x{height} image for a {panel_width}x{panel_height} panel")]
    BadFrameSize {
        width: u32,
        height: u32,
        panel_width: u32,
        panel_height: u32,
    },

    #[error("progress ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("display protocol failure during {stage}: {reason}")]
    Device { stage: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("cannot access `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing store exists but does not parse. Overwriting it would
    /// silently discard progress, so writes refuse to proceed.
    #[error("`{path}` is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PlayerError {
    /// Whether the run must stop, as opposed to skipping to the next
    /// selected item. Losing the device or the ledger leaves unknown
    /// state behind; a vanished file or a broken video does not.
    pub fn is_fatal(&self) -> bool {
        match self {
            PlayerError::Config(_)
            | PlayerError::Ledger(_)
            | PlayerError::Io(_)
            | PlayerError::Device { .. } => true,
            PlayerError::MediaUnavailable(_)
            | PlayerError::Probe { .. }
            | PlayerError::Extraction { .. }
            | PlayerError::Image(_)
            | PlayerError::BadFrameSize { .. } => false,
        }
    }
}
