use std::path::{Path, PathBuf};

use crate::error::PlayerError;

/// A directory (or anything that looks like one) of candidate media.
pub trait MediaInventory {
    /// Candidate identifiers in stable order.
    fn list(&self) -> Result<Vec<PathBuf>, PlayerError>;

    fn exists(&self, id: &Path) -> bool;
}

/// Probing and single-frame extraction for one media item. Both calls are
/// opaque and may fail; the engine never retries them.
pub trait FrameSource {
    /// Total frame count of `media`, on the nominal 24 fps timeline.
    fn frame_count(&mut self, media: &Path) -> Result<u64, PlayerError>;

    /// Extract frame `frame` of `media` to a still image and return its
    /// location.
    fn extract_frame(&mut self, media: &Path, frame: u64) -> Result<PathBuf, PlayerError>;
}
