use std::fs;
use std::path::{Path, PathBuf};

use vsmp_core::error::PlayerError;
use vsmp_core::source::MediaInventory;

/// A flat directory of candidate movies. Entries are sorted by name so
/// "listing order" is stable across runs and filesystems.
pub struct DirInventory {
    root: PathBuf,
}

impl DirInventory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl MediaInventory for DirInventory {
    fn list(&self) -> Result<Vec<PathBuf>, PlayerError> {
        list_files(&self.root)
    }

    fn exists(&self, id: &Path) -> bool {
        id.is_file()
    }
}

/// Stills in `dir` that the photo pass can display, in name order.
pub fn photos(dir: &Path) -> Result<Vec<PathBuf>, PlayerError> {
    let mut photos = list_files(dir)?;
    photos.retain(|path| {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        name.ends_with(".jpg") || name.ends_with(".jpeg") || name.ends_with(".png")
    });
    Ok(photos)
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, PlayerError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vsmp-inv-{label}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn listing_is_name_sorted_and_files_only() {
        let dir = scratch("sorted");
        fs::write(dir.join("b.mp4"), b"").unwrap();
        fs::write(dir.join("a.mp4"), b"").unwrap();
        fs::create_dir_all(dir.join("sub")).unwrap();

        let inventory = DirInventory::new(&dir);
        let listed = inventory.list().unwrap();
        assert_eq!(listed, vec![dir.join("a.mp4"), dir.join("b.mp4")]);
        assert!(inventory.exists(&dir.join("a.mp4")));
        assert!(!inventory.exists(&dir.join("missing.mp4")));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn photo_listing_filters_by_extension() {
        let dir = scratch("photos");
        fs::write(dir.join("one.JPG"), b"").unwrap();
        fs::write(dir.join("two.png"), b"").unwrap();
        fs::write(dir.join("skip.mp4"), b"").unwrap();

        let listed = photos(&dir).unwrap();
        assert_eq!(listed, vec![dir.join("one.JPG"), dir.join("two.png")]);

        let _ = fs::remove_dir_all(&dir);
    }
}
