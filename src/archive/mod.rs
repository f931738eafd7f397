//! Comic archive access
//!
//! Extracts page images from a comic container and hands out revocable
//! resource handles for a bounded window of pages around the reader.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            ArchiveResourceCache              │
//! │  (ordered pages + LRU of live handles)       │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//!            ┌──────────────────────┐
//!            │   ArchiveExtractor   │
//!            │   (ZipExtractor)     │
//!            └──────────────────────┘
//! ```

mod cache;
mod error;
mod extract;
mod types;

pub use cache::{collect_pages, ArchiveResourceCache};
pub use error::{ArchiveError, ArchiveResult};
pub use extract::{ArchiveEntry, ArchiveExtractor, ZipExtractor};
pub use types::{
    is_comic_path, is_page_image, PageEntry, ResourceHandle, COMIC_EXTENSIONS, IMAGE_EXTENSIONS,
};
