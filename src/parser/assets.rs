//! Image asset files.
//!
//! Assets live in a subdirectory of the output directory and are named
//! `page_{page}_image_{sequence}.{ext}`. Before a page's images are written,
//! every existing `page_{page}_image_*` file is removed so that repeated runs
//! never leave stale assets behind.

use std::fs;
use std::path::PathBuf;

use crate::error::Result;

/// Writes and cleans image assets for one output directory.
#[derive(Debug, Clone)]
pub struct AssetStore {
    output_dir: PathBuf,
    subdir: String,
}

impl AssetStore {
    /// Create a store rooted at `output_dir/subdir`.
    pub fn new(output_dir: impl Into<PathBuf>, subdir: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            subdir: subdir.into(),
        }
    }

    /// Absolute asset directory.
    pub fn dir(&self) -> PathBuf {
        self.output_dir.join(&self.subdir)
    }

    /// Create the asset directory if needed.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(self.dir())?;
        Ok(())
    }

    /// Path of an asset relative to the output directory, `/`-separated.
    pub fn relative(&self, file_name: &str) -> String {
        if self.subdir.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.subdir.trim_end_matches('/'), file_name)
        }
    }

    /// Remove every `page_{page}_image_*` file. Returns how many were removed.
    ///
    /// A missing directory is not an error; individual removal failures are
    /// logged and skipped.
    pub fn clear_page_images(&self, page: u32) -> usize {
        let prefix = format!("page_{}_image_", page);
        let entries = match fs::read_dir(self.dir()) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(&prefix) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to remove stale asset {:?}: {}", entry.path(), e),
            }
        }
        if removed > 0 {
            log::debug!("Removed {} stale image asset(s) for page {}", removed, page);
        }
        removed
    }

    /// Write an image asset and return its relative path.
    pub fn write_image(&self, page: u32, sequence: usize, extension: &str, data: &[u8]) -> Result<String> {
        self.ensure_dir()?;
        let file_name = format!("page_{}_image_{}.{}", page, sequence, extension);
        fs::write(self.dir().join(&file_name), data)?;
        Ok(self.relative(&file_name))
    }

    /// Absolute and relative paths of a page background render.
    pub fn background_path(&self, page: u32) -> (PathBuf, String) {
        let file_name = format!("page_{}.png", page);
        (self.dir().join(&file_name), self.relative(&file_name))
    }
}

/// Pick a file extension for image bytes.
///
/// A declared extension wins; otherwise the data is sniffed for well-known
/// signatures. Unknown data gets `bin`.
pub fn resolve_extension(declared: Option<&str>, data: &[u8]) -> String {
    if let Some(ext) = declared {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext;
        }
    }

    let sniffed = if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        "png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if data.starts_with(b"\x00\x00\x00\x0cjP  ") || data.starts_with(&[0xFF, 0x4F, 0xFF, 0x51]) {
        "jp2"
    } else if data.starts_with(b"II*\x00") || data.starts_with(b"MM\x00*") {
        "tiff"
    } else {
        "bin"
    };
    sniffed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path(), "assets");

        let rel = store.write_image(1, 1, "png", b"data").unwrap();
        assert_eq!(rel, "assets/page_1_image_1.png");
        store.write_image(1, 2, "jpg", b"data").unwrap();
        store.write_image(10, 1, "png", b"data").unwrap();

        assert_eq!(store.clear_page_images(1), 2);
        assert!(!dir.path().join("assets/page_1_image_1.png").exists());
        assert!(dir.path().join("assets/page_10_image_1.png").exists());
    }

    #[test]
    fn test_clear_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path(), "nothing-here");
        assert_eq!(store.clear_page_images(3), 0);
    }

    #[test]
    fn test_background_path() {
        let store = AssetStore::new("/out", "assets");
        let (abs, rel) = store.background_path(2);
        assert_eq!(abs, PathBuf::from("/out/assets/page_2.png"));
        assert_eq!(rel, "assets/page_2.png");
    }

    #[test]
    fn test_resolve_extension() {
        assert_eq!(resolve_extension(Some("JPG"), b""), "jpg");
        assert_eq!(resolve_extension(Some(".png"), b""), "png");
        assert_eq!(resolve_extension(None, &[0xFF, 0xD8, 0xFF, 0xE0]), "jpg");
        assert_eq!(resolve_extension(None, b"\x89PNG\r\n\x1a\nrest"), "png");
        assert_eq!(resolve_extension(None, b"MM\x00*...."), "tiff");
        assert_eq!(resolve_extension(Some("../x"), b"garbage"), "bin");
    }
}
