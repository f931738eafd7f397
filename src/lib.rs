//! Amnesia Comics Library
//!
//! Reading core for comic book archives: page extraction with a bounded
//! handle cache, heuristic panel detection, reading-order sorting and guided
//! panel-by-panel navigation.
//!
//! # Modules
//!
//! - `archive`: Comic archive extraction and the resource handle cache
//! - `panels`: Page content analysis, panel segmentation and reading order
//! - `navigation`: Panel navigation state machine and focus transforms
//! - `session`: Reader session driver wiring the above to a carousel

pub mod archive;
pub mod config;
pub mod navigation;
pub mod panels;
pub mod session;

pub use config::Config;
