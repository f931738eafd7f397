//! Page analysis pipeline
//!
//! decode -> downsample + content mask -> segmentation. Decoding and pixel
//! scans are CPU-bound and run on the blocking pool. Failures never reach
//! the caller as page errors: an unreadable page is analysed as a single
//! whole-page panel instead.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use thiserror::Error;
use tokio::time::{timeout, Duration};

use crate::config::AnalysisConfig;

use super::analyzer::ContentAnalyzer;
use super::segmenter::{segment, PanelLimits};
use super::types::AnalysisResult;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Task join error: {0}")]
    TaskJoin(String),

    #[error("Analysis timed out after {0} seconds")]
    Timeout(u64),
}

impl AnalysisError {
    /// Failure of the analysis run rather than of the page
    pub fn is_transient(&self) -> bool {
        matches!(self, AnalysisError::TaskJoin(_) | AnalysisError::Timeout(_))
    }
}

#[derive(Debug, Clone)]
pub struct PanelDetector {
    analyzer: ContentAnalyzer,
    limits: PanelLimits,
    timeout_secs: u64,
}

impl Default for PanelDetector {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl PanelDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            analyzer: ContentAnalyzer::new(config.max_dimension),
            limits: PanelLimits::new(config.min_panels, config.max_panels),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn limits(&self) -> PanelLimits {
        self.limits
    }

    /// Analyse a decoded page
    pub fn detect(&self, image: &DynamicImage) -> AnalysisResult {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return AnalysisResult::fallback(width, height);
        }

        let content = self.analyzer.analyze(image);
        let panels = segment(&content, self.limits);

        AnalysisResult {
            crop_box: content.crop_box,
            panels,
            image_width: width,
            image_height: height,
        }
    }

    /// Decode and analyse encoded page bytes
    pub fn detect_bytes(&self, data: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        let image = image::load_from_memory(data)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(AnalysisError::EmptyImage);
        }
        Ok(self.detect(&image))
    }

    /// Analyse a page on the blocking pool
    ///
    /// Undecodable and zero-sized images resolve to the whole-page fallback,
    /// sized from the image header when it can still be read; that result is
    /// final for the page. Timeouts and task failures say nothing about the
    /// page itself and are returned as errors so the caller can retry later.
    pub async fn analyze_page(
        &self,
        page: usize,
        data: Arc<[u8]>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let detector = self.clone();
        let task_data = Arc::clone(&data);

        let outcome = timeout(
            Duration::from_secs(self.timeout_secs),
            tokio::task::spawn_blocking(move || detector.detect_bytes(&task_data)),
        )
        .await;

        let result = match outcome {
            Ok(join_result) => join_result
                .map_err(|e| AnalysisError::TaskJoin(e.to_string()))
                .and_then(|result| result),
            Err(_) => Err(AnalysisError::Timeout(self.timeout_secs)),
        };

        match result {
            Ok(result) => {
                tracing::debug!(
                    page,
                    panels = result.panels.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Analyzed page"
                );
                Ok(result)
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(page, error = %e, "Page analysis did not complete");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "Page analysis failed, using whole page");
                Ok(Self::fallback_for(&data))
            }
        }
    }

    /// Whole-page result for `data`, sized from its header when readable
    pub fn fallback_for(data: &[u8]) -> AnalysisResult {
        let (width, height) = header_dimensions(data).unwrap_or((0, 0));
        AnalysisResult::fallback(width, height)
    }
}

/// Image size from the header alone
fn header_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::panels::analyzer::tests::page_with_blocks;
    use crate::panels::{NormalizedBox, ReadingDirection};

    pub(crate) fn encode_png(image: image::RgbaImage) -> Vec<u8> {
        let mut output = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
            .unwrap();
        output
    }

    /// 1200x1800 page with two 550 px wide columns around a gutter at x=575..675
    pub(crate) fn two_column_page() -> image::RgbaImage {
        page_with_blocks(1200, 1800, &[(25, 50, 575, 1750), (675, 50, 1175, 1750)])
    }

    #[test]
    fn test_two_column_page_scenario() {
        let detector = PanelDetector::default();
        let result = detector.detect(&DynamicImage::ImageRgba8(two_column_page()));

        assert_eq!(result.panels.len(), 2);
        assert_eq!((result.image_width, result.image_height), (1200, 1800));

        let ltr = result.reading_panels(ReadingDirection::Ltr);
        let (left, right) = (ltr[0], ltr[1]);
        assert!(left.x < right.x);
        assert!(left.right() >= 0.46 && left.right() <= 0.5);
        assert!(right.x >= 0.54 && right.x <= 0.58);

        let rtl = result.reading_panels(ReadingDirection::Rtl);
        assert_eq!(rtl, vec![right, left]);
    }

    #[test]
    fn test_single_centered_region() {
        let detector = PanelDetector::default();
        let page = page_with_blocks(400, 600, &[(100, 150, 300, 450)]);
        let result = detector.detect(&DynamicImage::ImageRgba8(page));

        // 400x600 downsamples to 320x480: block covers 80..240 x 120..360
        let crop = result.crop_box;
        let tolerance = 4.0 / 320.0;
        assert!((crop.x - 80.0 / 320.0).abs() <= tolerance);
        assert!((crop.right() - 240.0 / 320.0).abs() <= tolerance);
        assert!((crop.y - 120.0 / 480.0).abs() <= tolerance);
        assert!((crop.bottom() - 360.0 / 480.0).abs() <= tolerance);
        assert!(result.panels.len() <= 1);
    }

    #[test]
    fn test_detect_bytes_rejects_garbage() {
        let detector = PanelDetector::default();
        assert!(matches!(
            detector.detect_bytes(b"not an image"),
            Err(AnalysisError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_page_decodes_png() {
        let detector = PanelDetector::default();
        let png = encode_png(two_column_page());
        let result = detector.analyze_page(0, Arc::from(png)).await.unwrap();

        assert_eq!(result.panels.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_page_falls_back_on_corrupt_data() {
        let detector = PanelDetector::default();
        let result = detector
            .analyze_page(3, Arc::from(b"garbage".to_vec()))
            .await
            .unwrap();

        assert!(result.is_fallback());
        assert_eq!(result.reading_panels(ReadingDirection::Ltr), vec![NormalizedBox::FULL]);
    }

    #[test]
    fn test_header_dimensions() {
        let png = encode_png(page_with_blocks(64, 32, &[]));
        assert_eq!(header_dimensions(&png), Some((64, 32)));
        assert_eq!(header_dimensions(b"garbage"), None);
    }

    #[tokio::test]
    async fn test_blank_page_is_whole_page() {
        let detector = PanelDetector::default();
        let png = encode_png(page_with_blocks(64, 32, &[]));
        let result = detector.analyze_page(0, Arc::from(png)).await.unwrap();

        assert!(result.is_fallback());
        assert_eq!((result.image_width, result.image_height), (64, 32));
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        let detector = PanelDetector::new(&AnalysisConfig {
            timeout_secs: 0,
            ..Default::default()
        });
        let png = encode_png(two_column_page());

        let err = detector.analyze_page(0, Arc::from(png)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout(0)));
        assert!(err.is_transient());
        assert!(!AnalysisError::EmptyImage.is_transient());
    }

    #[test]
    fn test_fallback_for_reads_header() {
        let png = encode_png(page_with_blocks(64, 32, &[]));
        let result = PanelDetector::fallback_for(&png);
        assert!(result.is_fallback());
        assert_eq!((result.image_width, result.image_height), (64, 32));
    }
}
