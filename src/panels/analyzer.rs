//! Page content analysis
//!
//! Downsamples a page, estimates its background from the corners and builds
//! a binary mask of "content" pixels together with their tight crop box.
//! Comic pages are assumed to have near-uniform margins.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};

use super::types::{NormalizedBox, PixelRegion};

/// Default longest side of the analysis raster
pub const MAX_ANALYSIS_DIMENSION: u32 = 480;

/// Pixels more transparent than this are never content
const MIN_ALPHA: u8 = 40;

/// Gray values at or above this are treated as paper
const NEAR_WHITE: f32 = 245.0;

/// Minimum gray distance from the background for content
const BACKGROUND_DELTA: f32 = 14.0;

/// Padding added around the content bounds so art is not cut
const CROP_PADDING: u32 = 2;

/// Binary content mask over the analysis raster
#[derive(Debug, Clone)]
pub struct ContentMask {
    width: u32,
    height: u32,
    cells: Vec<u8>,
}

impl ContentMask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_content(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[self.offset(x, y)] != 0
    }

    /// 0/1 value of a cell, for prefix sums
    pub(crate) fn cell(&self, x: u32, y: u32) -> u32 {
        self.cells[self.offset(x, y)] as u32
    }

    pub fn content_pixels(&self) -> usize {
        self.cells.iter().filter(|c| **c != 0).count()
    }

    fn set(&mut self, x: u32, y: u32) {
        let offset = self.offset(x, y);
        self.cells[offset] = 1;
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Output of [`ContentAnalyzer::analyze`]
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Padded content bounds on the raster, `None` when nothing qualified
    pub crop: Option<PixelRegion>,
    /// Crop bounds as page fractions (whole page when `crop` is `None`)
    pub crop_box: NormalizedBox,
    pub mask: ContentMask,
}

impl PageContent {
    pub fn has_content(&self) -> bool {
        self.crop.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ContentAnalyzer {
    max_dimension: u32,
}

impl Default for ContentAnalyzer {
    fn default() -> Self {
        Self::new(MAX_ANALYSIS_DIMENSION)
    }
}

impl ContentAnalyzer {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Scale the page so its longer side is at most `max_dimension`
    pub fn downsample(&self, image: &DynamicImage) -> RgbaImage {
        let (iw, ih) = image.dimensions();
        let longest = iw.max(ih).max(1);

        if longest <= self.max_dimension {
            return image.to_rgba8();
        }

        // Integer floor of side * max / longest keeps the aspect ratio exact
        let max = self.max_dimension as u64;
        let w = ((iw as u64 * max / longest as u64) as u32).max(1);
        let h = ((ih as u64 * max / longest as u64) as u32).max(1);

        image.resize_exact(w, h, FilterType::Triangle).to_rgba8()
    }

    pub fn analyze(&self, image: &DynamicImage) -> PageContent {
        let raster = self.downsample(image);
        self.analyze_raster(&raster)
    }

    /// Analyse a raster that is already at analysis resolution
    pub fn analyze_raster(&self, raster: &RgbaImage) -> PageContent {
        let (w, h) = raster.dimensions();
        let mut mask = ContentMask::empty(w, h);

        if w == 0 || h == 0 {
            return PageContent {
                crop: None,
                crop_box: NormalizedBox::FULL,
                mask,
            };
        }

        let background = estimate_background(raster);

        let mut min_x = w;
        let mut min_y = h;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut has_content = false;

        for (x, y, pixel) in raster.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            if a < MIN_ALPHA {
                continue;
            }

            let gray = gray_value(r, g, b);
            if gray < NEAR_WHITE && (gray - background).abs() > BACKGROUND_DELTA {
                mask.set(x, y);
                has_content = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        if !has_content {
            return PageContent {
                crop: None,
                crop_box: NormalizedBox::FULL,
                mask,
            };
        }

        let crop = PixelRegion::new(
            min_x.saturating_sub(CROP_PADDING),
            min_y.saturating_sub(CROP_PADDING),
            (max_x + CROP_PADDING).min(w - 1) + 1,
            (max_y + CROP_PADDING).min(h - 1) + 1,
        );

        PageContent {
            crop: Some(crop),
            crop_box: crop.normalize(w, h),
            mask,
        }
    }
}

fn gray_value(r: u8, g: u8, b: u8) -> f32 {
    (r as f32 + g as f32 + b as f32) / 3.0
}

/// Mean gray of the four corner pixels
fn estimate_background(raster: &RgbaImage) -> f32 {
    let (w, h) = raster.dimensions();
    let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)];

    let total: f32 = corners
        .iter()
        .map(|&(x, y)| {
            let [r, g, b, _] = raster.get_pixel(x, y).0;
            gray_value(r, g, b)
        })
        .sum();

    total / corners.len() as f32
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const INK: Rgba<u8> = Rgba([30, 30, 30, 255]);

    /// White page with dark filled rectangles `(x0, y0, x1, y1)`, exclusive ends
    pub(crate) fn page_with_blocks(width: u32, height: u32, blocks: &[(u32, u32, u32, u32)]) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(width, height, WHITE);
        for &(x0, y0, x1, y1) in blocks {
            for y in y0..y1.min(height) {
                for x in x0..x1.min(width) {
                    img.put_pixel(x, y, INK);
                }
            }
        }
        img
    }

    #[test]
    fn test_downsample_bounds_longest_side() {
        let analyzer = ContentAnalyzer::default();
        let page = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1200, 1800, WHITE));
        let raster = analyzer.downsample(&page);

        assert_eq!(raster.dimensions(), (320, 480));
    }

    #[test]
    fn test_downsample_keeps_small_images() {
        let analyzer = ContentAnalyzer::default();
        let page = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 300, WHITE));
        assert_eq!(analyzer.downsample(&page).dimensions(), (200, 300));
    }

    #[test]
    fn test_blank_page_falls_back_to_full_crop() {
        let analyzer = ContentAnalyzer::default();
        let content = analyzer.analyze_raster(&page_with_blocks(100, 150, &[]));

        assert!(!content.has_content());
        assert_eq!(content.crop_box, NormalizedBox::FULL);
        assert_eq!(content.mask.content_pixels(), 0);
    }

    #[test]
    fn test_centered_block_crop_is_tight() {
        let analyzer = ContentAnalyzer::default();
        let raster = page_with_blocks(200, 300, &[(50, 60, 150, 240)]);
        let content = analyzer.analyze_raster(&raster);

        let crop = content.crop.unwrap();
        assert_eq!(crop, PixelRegion::new(48, 58, 152, 242));
        assert_eq!(content.mask.content_pixels(), 100 * 180);
        assert!(content.mask.is_content(50, 60));
        assert!(!content.mask.is_content(49, 60));
    }

    #[test]
    fn test_crop_clamps_to_image_bounds() {
        let analyzer = ContentAnalyzer::default();
        let raster = page_with_blocks(100, 100, &[(1, 1, 99, 50)]);
        let content = analyzer.analyze_raster(&raster);

        // Corners stay white so the background estimate is unaffected
        assert_eq!(content.crop.unwrap(), PixelRegion::new(0, 0, 100, 52));
    }

    #[test]
    fn test_transparent_and_light_pixels_are_not_content() {
        let analyzer = ContentAnalyzer::default();
        let mut raster = page_with_blocks(50, 50, &[]);
        raster.put_pixel(10, 10, Rgba([0, 0, 0, 20]));
        raster.put_pixel(20, 20, Rgba([250, 250, 250, 255]));
        raster.put_pixel(30, 30, Rgba([245, 245, 245, 255]));

        let content = analyzer.analyze_raster(&raster);
        assert!(!content.has_content());
    }

    #[test]
    fn test_dark_background_detects_light_art() {
        let analyzer = ContentAnalyzer::default();
        let mut raster = RgbaImage::from_pixel(60, 60, Rgba([10, 10, 10, 255]));
        for y in 20..40 {
            for x in 20..40 {
                raster.put_pixel(x, y, Rgba([180, 180, 180, 255]));
            }
        }

        let content = analyzer.analyze_raster(&raster);
        assert_eq!(content.crop.unwrap(), PixelRegion::new(18, 18, 42, 42));
    }
}
