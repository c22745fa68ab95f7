use crate::buffer::PixelBuffer;
use crate::history::BoundedHistory;
use anyhow::{bail, Context, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};

pub const HISTORY_CAPACITY: usize = 10;

pub type ImageHistory = BoundedHistory<PixelBuffer, HISTORY_CAPACITY>;

/// No history exists before the first successful load.
#[derive(Clone, Debug, Default)]
pub enum DocumentHistory {
    #[default]
    Uninitialized,
    Active(ImageHistory),
}

/// Image files on disk and the edit history of the open document.
///
/// Buffers are kept bottom row first: rows are flipped on load and flipped
/// back on save.
#[derive(Clone, Debug, Default)]
pub struct ImageStore {
    history: DocumentHistory,
    path: Option<PathBuf>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path` and starts a new history with it. On failure the
    /// previous document stays open.
    pub fn load_image(&mut self, path: &Path) -> Result<PixelBuffer> {
        let img = image::open(path).with_context(|| format!("Failed to open image {}", path.display()))?;
        let buffer = PixelBuffer::from_rgba_image(&img.to_rgba8()).mirrored(false, true);
        if buffer.is_empty() {
            bail!("{} contains no pixels", path.display());
        }

        log::info!("loaded {} ({}x{})", path.display(), buffer.width(), buffer.height());
        self.history = DocumentHistory::Active(ImageHistory::new(buffer.clone()));
        self.path = Some(path.to_path_buf());
        Ok(buffer)
    }

    /// Starts a new history from an in-memory image.
    pub fn open_buffer(&mut self, buffer: PixelBuffer) {
        self.history = DocumentHistory::Active(ImageHistory::new(buffer));
        self.path = None;
    }

    /// Writes the image currently shown by the history.
    pub fn save_image(&self, path: &Path) -> Result<()> {
        let Some(current) = self.current_image() else {
            bail!("no image is open");
        };
        let rgba = current.mirrored(false, true).to_rgba_image();

        let is_jpeg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
        let result = if is_jpeg {
            // jpeg has no alpha channel
            DynamicImage::ImageRgba8(rgba).to_rgb8().save(path)
        } else {
            rgba.save(path)
        };
        result.with_context(|| format!("Failed to save image {}", path.display()))?;

        log::info!("saved {}", path.display());
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.history, DocumentHistory::Active(_))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn history(&self) -> Option<&ImageHistory> {
        match &self.history {
            DocumentHistory::Active(history) => Some(history),
            DocumentHistory::Uninitialized => None,
        }
    }

    pub fn current_image(&self) -> Option<&PixelBuffer> {
        self.history().map(ImageHistory::current)
    }

    pub fn undo(&mut self) -> Option<&PixelBuffer> {
        match &mut self.history {
            DocumentHistory::Active(history) => Some(history.undo()),
            DocumentHistory::Uninitialized => None,
        }
    }

    pub fn redo(&mut self) -> Option<&PixelBuffer> {
        match &mut self.history {
            DocumentHistory::Active(history) => Some(history.redo()),
            DocumentHistory::Uninitialized => None,
        }
    }

    pub fn append_history(&mut self, image: PixelBuffer) {
        match &mut self.history {
            DocumentHistory::Active(history) => {
                history.append(image);
                log::debug!("history at {} of {}", history.index() + 1, history.len());
            }
            DocumentHistory::Uninitialized => log::warn!("no image is open; edit not recorded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("arsedit-{}-{}", std::process::id(), name))
    }

    fn sample() -> PixelBuffer {
        PixelBuffer::from_fn(4, 3, |x, y| Pixel::from_rgba(x as u8 * 60, y as u8 * 100, 5, 255))
    }

    #[test]
    fn uninitialized_store_has_nothing() {
        let mut store = ImageStore::new();
        assert!(!store.is_loaded());
        assert!(store.current_image().is_none());
        assert!(store.undo().is_none());
        assert!(store.redo().is_none());

        store.append_history(sample());
        assert!(store.history().is_none());
        assert!(store.save_image(&temp_path("never.png")).is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_path("round-trip.png");
        let mut store = ImageStore::new();
        store.open_buffer(sample());
        store.save_image(&path).unwrap();

        // the file holds the rows top to bottom
        let on_disk = image::open(&path).unwrap().to_rgba8();
        assert_eq!(Pixel::from(*on_disk.get_pixel(1, 0)), sample().pixel(1, 2));

        let mut reloaded = ImageStore::new();
        assert_eq!(reloaded.load_image(&path).unwrap(), sample());
        assert_eq!(reloaded.path(), Some(path.as_path()));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_writes_current_state_not_latest() {
        let path = temp_path("current.png");
        let mut store = ImageStore::new();
        store.open_buffer(sample());
        store.append_history(sample().mirrored(true, false));
        store.undo();

        store.save_image(&path).unwrap();
        let mut reloaded = ImageStore::new();
        assert_eq!(reloaded.load_image(&path).unwrap(), sample());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn failed_load_keeps_previous_document() {
        let mut store = ImageStore::new();
        store.open_buffer(sample());
        store.append_history(PixelBuffer::new(1, 1));

        assert!(store.load_image(&temp_path("missing.png")).is_err());
        assert_eq!(store.history().unwrap().len(), 2);
        assert_eq!(store.undo(), Some(&sample()));
    }

    #[test]
    fn jpeg_is_saved_without_alpha() {
        let path = temp_path("flat.jpg");
        let mut store = ImageStore::new();
        store.open_buffer(PixelBuffer::filled(8, 8, Pixel::gray(128).with_alpha(40)));
        store.save_image(&path).unwrap();

        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded.dimensions(), (8, 8));
        assert_eq!(reloaded.get_pixel(0, 0)[3], 255);
        std::fs::remove_file(&path).ok();
    }
}
