//! Image discovery: turn files and folders into work items.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::types::ImageSource;

/// Discovers image files in directories.
pub struct ImageDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredImage {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl DiscoveredImage {
    pub fn into_source(self) -> ImageSource {
        ImageSource::from_path(self.path)
    }
}

impl ImageDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover all supported images under each input path, in input order.
    ///
    /// A file input is returned if supported; a directory is walked
    /// recursively and its files sorted by path. Files above the size limit
    /// are skipped with a warning.
    pub fn discover_all(&self, inputs: &[PathBuf]) -> Vec<DiscoveredImage> {
        inputs.iter().flat_map(|p| self.discover(p)).collect()
    }

    /// Discover supported images at a single path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredImage> {
        if path.is_file() {
            return self
                .accept(path, std::fs::metadata(path).ok().map(|m| m.len()))
                .into_iter()
                .collect();
        }

        let mut files: Vec<DiscoveredImage> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let size = entry.metadata().ok().map(|m| m.len());
                self.accept(entry.path(), size)
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    fn accept(&self, path: &Path, size: Option<u64>) -> Option<DiscoveredImage> {
        if !self.is_supported(path) {
            return None;
        }
        let size = size?;
        let limit = self.config.max_file_size_mb.saturating_mul(1024 * 1024);
        if size > limit {
            tracing::warn!(
                "Skipping {:?}: {} bytes exceeds the {}MB limit",
                path,
                size,
                self.config.max_file_size_mb
            );
            return None;
        }
        Some(DiscoveredImage {
            path: path.to_path_buf(),
            size,
        })
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }
}

/// MIME type for an image path, by extension. Unknown extensions map to JPEG.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        other => {
            tracing::debug!("Unknown image extension '{other}', defaulting to image/jpeg");
            "image/jpeg"
        }
    }
}
