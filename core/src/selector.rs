use std::path::PathBuf;

use log::{debug, info};

use crate::error::PlayerError;
use crate::ledger::ProgressLedger;
use crate::source::MediaInventory;

/// The container extension the inventory is expected to hold.
pub const MOVIE_EXTENSION: &str = ".mp4";

/// Pick the next item to play: first any ledger entry with more than
/// `resume_threshold` unplayed frames (in ledger order), then the first
/// never-played file in the inventory. `None` means playback is complete.
///
/// A ledger entry within `resume_threshold` of its total is treated as
/// played and never selected again, even though it is not deleted.
pub fn select_next<I: MediaInventory>(
    ledger: &ProgressLedger,
    inventory: &I,
    resume_threshold: u64,
) -> Result<Option<PathBuf>, PlayerError> {
    let entries = ledger.entries()?;
    info!("There are {} videos in the log", entries.len());

    for (path, record) in &entries {
        if !inventory.exists(path) {
            debug!("`{}` no longer available", path.display());
            continue;
        }
        let total = record.total.unwrap_or(0);
        if total.saturating_sub(record.current) > resume_threshold {
            info!(
                "`{}` has only had {}/{} frames played",
                path.display(),
                record.current,
                total,
            );
            return Ok(Some(path.clone()));
        }
    }

    for path in inventory.list()? {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if !name.ends_with(MOVIE_EXTENSION) {
            debug!("`{name}` is not an mp4");
            continue;
        }
        if ledger.contains(&path)? {
            debug!("`{}` has already been played", path.display());
            continue;
        }
        info!("`{}` hasn't been played yet, returning", path.display());
        return Ok(Some(path));
    }

    Ok(None)
}
