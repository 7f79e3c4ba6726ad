//! Image source
//!
//! Lazy, depth-first discovery of micrograph files under a root directory.
//! Entries inside a directory are visited in file-name order so that a
//! batch over the same tree always processes images in the same order.

use crate::format::has_image_extension;
use crate::{IoError, IoResult};
use stainquant_core::Pix;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A discovered image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Full path of the file
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated, without a leading slash
    pub identifier: String,
}

impl SourceEntry {
    /// Decode the file as a 32 bpp RGB image.
    pub fn read_rgb(&self) -> IoResult<Pix> {
        crate::read_image_rgb(&self.path)
    }
}

/// Iterator over the image files below a root directory.
///
/// Not restartable: create a new source on the same root to walk again.
pub struct ImageSource {
    root: PathBuf,
    walker: walkdir::IntoIter,
}

impl ImageSource {
    /// Open a source rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidRoot`] if `root` is not an existing directory.
    pub fn new<P: AsRef<Path>>(root: P) -> IoResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(IoError::InvalidRoot(root));
        }
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Ok(Self { root, walker })
    }

    /// The root directory being walked.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Iterator for ImageSource {
    type Item = SourceEntry;

    fn next(&mut self) -> Option<SourceEntry> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !has_image_extension(entry.path()) {
                continue;
            }
            let path = entry.into_path();
            let identifier = relative_identifier(&self.root, &path);
            debug!(%identifier, "discovered image");
            return Some(SourceEntry { path, identifier });
        }
    }
}

/// Build the `/`-joined identifier of `path` relative to `root`.
pub fn relative_identifier(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
