//! Archive page types

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

/// Comic container extensions
pub const COMIC_EXTENSIONS: &[&str] = &["cbr", "cbt", "cbz", "cb7"];

/// Raster formats accepted as pages. Anything else in the archive
/// (metadata, extensionless files) is not a page.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "jif", "jfif", "jfi", "png", "avif", "gif", "bmp", "dib", "tiff", "tif",
    "webp",
];

fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Whether an archive entry name looks like a page image
pub fn is_page_image(name: &str) -> bool {
    extension_of(name)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Whether a path names a comic book container
pub fn is_comic_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| COMIC_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// One page image extracted from the archive
#[derive(Debug, Clone)]
pub struct PageEntry {
    /// Position in reading order
    pub index: usize,
    /// Entry name inside the container
    pub name: String,
    /// Raw encoded image bytes
    pub bytes: Arc<[u8]>,
}

/// Revocable reference to a page's bytes
///
/// Clones share the revocation flag, so every borrower observes a revoke
/// issued by the owning cache. Only the cache can revoke.
#[derive(Clone)]
pub struct ResourceHandle {
    index: usize,
    uri: String,
    mime_type: String,
    data: Arc<[u8]>,
    revoked: Arc<AtomicBool>,
}

impl ResourceHandle {
    pub(crate) fn new(entry: &PageEntry) -> Self {
        let mime_type = mime_guess::from_path(&entry.name)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Self {
            index: entry.index,
            uri: format!("blob:amnesia/{}", Uuid::new_v4()),
            mime_type,
            data: Arc::clone(&entry.bytes),
            revoked: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Transient URI identifying this handle
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    /// Page bytes, or `None` once the handle has been revoked
    pub fn bytes(&self) -> Option<&[u8]> {
        if self.is_revoked() {
            None
        } else {
            Some(&self.data)
        }
    }

    pub(crate) fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("index", &self.index)
            .field("uri", &self.uri)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .field("revoked", &self.is_revoked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> PageEntry {
        PageEntry {
            index: 3,
            name: name.to_string(),
            bytes: Arc::from(vec![1u8, 2, 3]),
        }
    }

    #[test]
    fn test_is_page_image() {
        assert!(is_page_image("001.jpg"));
        assert!(is_page_image("Chapter 1/002.PNG"));
        assert!(is_page_image("cover.webp"));
        assert!(!is_page_image("ComicInfo.xml"));
        assert!(!is_page_image("README"));
        assert!(!is_page_image("pages/"));
    }

    #[test]
    fn test_is_comic_path() {
        assert!(is_comic_path("/library/Saga 01.cbz"));
        assert!(is_comic_path("volume.CBR"));
        assert!(!is_comic_path("book.epub"));
        assert!(!is_comic_path("noext"));
    }

    #[test]
    fn test_handle_revocation_is_shared() {
        let handle = ResourceHandle::new(&entry("page.png"));
        let borrowed = handle.clone();

        assert_eq!(handle.index(), 3);
        assert_eq!(handle.mime_type(), "image/png");
        assert!(handle.uri().starts_with("blob:amnesia/"));
        assert_eq!(borrowed.bytes(), Some(&[1u8, 2, 3][..]));

        handle.revoke();
        assert!(borrowed.is_revoked());
        assert!(borrowed.bytes().is_none());
    }

    #[test]
    fn test_handle_uris_are_unique() {
        let page = entry("a.jpg");
        let first = ResourceHandle::new(&page);
        let second = ResourceHandle::new(&page);
        assert_ne!(first.uri(), second.uri());
    }
}
