//! File categorization by extension.
//!
//! Every file ends up in exactly one [`Category`]. The mapping is built once
//! by inverting a category-to-extensions table; unknown and missing
//! extensions fall back to [`Category::Other`].
//!
//! # Examples
//!
//! ```
//! use sortdir::file_category::{Category, FileMapper};
//!
//! let mapper = FileMapper::global();
//! assert_eq!(mapper.classify(".png"), Category::Images);
//! assert_eq!(mapper.classify(".TXT"), Category::Documents);
//! assert_eq!(mapper.classify(".xyz"), Category::Other);
//! assert_eq!(mapper.classify(""), Category::Other);
//! ```

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Represents a top-level category folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Image files (JPEG, PNG, SVG)
    Images,
    /// Video files (AVI, MP4, MOV, MKV)
    Video,
    /// Document files (PDF, TXT, DOCX, spreadsheets, ...)
    Documents,
    /// Audio files (MP3, OGG, WAV, AMR)
    Audio,
    /// Archive files (ZIP, GZ, TAR)
    Archives,
    /// Unknown or uncategorized files
    Other,
}

impl Category {
    /// All categories, in the order their folders are created.
    pub const ALL: [Category; 6] = [
        Category::Images,
        Category::Video,
        Category::Documents,
        Category::Audio,
        Category::Archives,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "images");
    /// assert_eq!(Category::Video.dir_name(), "video");
    /// assert_eq!(Category::Other.dir_name(), "other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Video => "video",
            Category::Documents => "documents",
            Category::Audio => "audio",
            Category::Archives => "archives",
            Category::Other => "other",
        }
    }

    /// Extensions (without the leading dot) that belong to this category.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Images => &["jpeg", "png", "jpg", "svg"],
            Category::Video => &["avi", "mp4", "mov", "mkv"],
            Category::Documents => &[
                "pdf", "txt", "doc", "docx", "rtf", "tex", "wpd", "odt", "xls", "xlsx",
            ],
            Category::Audio => &["mp3", "ogg", "wav", "amr"],
            Category::Archives => &["zip", "gz", "tar"],
            Category::Other => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

static GLOBAL_MAPPER: Lazy<FileMapper> = Lazy::new(FileMapper::new);

/// Maps file extensions to categories.
///
/// Keys are stored lowercase with their leading dot, so lookups are
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a new `FileMapper` by inverting the category table.
    pub fn new() -> Self {
        let mut extension_map = HashMap::new();
        for category in Category::ALL {
            for ext in category.extensions() {
                extension_map.insert(format!(".{ext}"), category);
            }
        }
        Self { extension_map }
    }

    /// The shared mapper, built on first use.
    pub fn global() -> &'static FileMapper {
        &GLOBAL_MAPPER
    }

    /// Maps an extension (with its leading dot, possibly empty) to a category.
    pub fn classify(&self, ext: &str) -> Category {
        self.extension_map
            .get(&ext.to_lowercase())
            .copied()
            .unwrap_or(Category::Other)
    }

    /// Classifies a file by the extension of its final path component.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::file_category::{Category, FileMapper};
    /// use std::path::Path;
    ///
    /// let mapper = FileMapper::global();
    /// assert_eq!(mapper.category_for_path(Path::new("a/b/song.MP3")), Category::Audio);
    /// assert_eq!(mapper.category_for_path(Path::new("Makefile")), Category::Other);
    /// ```
    pub fn category_for_path(&self, path: &Path) -> Category {
        match path.extension() {
            Some(ext) => self.classify(&format!(".{}", ext.to_string_lossy())),
            None => Category::Other,
        }
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}
