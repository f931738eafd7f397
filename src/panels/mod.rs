//! Panel detection
//!
//! Heuristic geometric segmentation of comic pages into panels. This is not
//! a vision model: panels are found as regions separated by empty gutters.
//!
//! ```text
//!   page bytes ──decode──▶ ContentAnalyzer ──mask──▶ segment() ──▶ sort_panels()
//!                          (crop box + mask)        (SAT gutters)   (rows, direction)
//! ```
//!
//! Results are memoized per page in [`AnalysisCache`].

mod analyzer;
mod cache;
mod detector;
mod order;
mod sat;
mod segmenter;
mod types;

pub use analyzer::{ContentAnalyzer, ContentMask, PageContent, MAX_ANALYSIS_DIMENSION};
pub use cache::AnalysisCache;
pub use detector::{AnalysisError, PanelDetector};
pub use order::{sort_panels, ROW_THRESHOLD};
pub use sat::SummedAreaTable;
pub use segmenter::{
    find_horizontal_gutter, find_vertical_gutter, segment, split_into_panels, Gutter,
    PanelLimits,
};
pub use types::{AnalysisResult, NormalizedBox, PixelRegion, ReadingDirection};

#[cfg(test)]
pub(crate) use analyzer::tests::page_with_blocks;
#[cfg(test)]
pub(crate) use detector::tests::encode_png;
