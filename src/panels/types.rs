//! Core panel types
//!
//! Boxes are stored as fractions of the analysed page image so they stay
//! valid regardless of the resolution the page is displayed at.

use serde::{Deserialize, Serialize};

use super::order::sort_panels;

/// Floating tolerance for box bounds checks
const BOX_EPSILON: f32 = 1e-4;

/// Rectangle in page fractions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl NormalizedBox {
    /// The whole page
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Positive size and fully inside the unit square
    pub fn is_valid(&self) -> bool {
        self.w > 0.0
            && self.h > 0.0
            && self.x >= -BOX_EPSILON
            && self.y >= -BOX_EPSILON
            && self.right() <= 1.0 + BOX_EPSILON
            && self.bottom() <= 1.0 + BOX_EPSILON
    }

    pub fn contains(&self, other: &NormalizedBox) -> bool {
        other.x >= self.x - BOX_EPSILON
            && other.y >= self.y - BOX_EPSILON
            && other.right() <= self.right() + BOX_EPSILON
            && other.bottom() <= self.bottom() + BOX_EPSILON
    }
}

impl Default for NormalizedBox {
    fn default() -> Self {
        Self::FULL
    }
}

/// Pixel rectangle on the analysis raster, `x1`/`y1` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRegion {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRegion {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Convert to fractions of a `width` x `height` raster
    pub fn normalize(&self, width: u32, height: u32) -> NormalizedBox {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        NormalizedBox {
            x: self.x0 as f32 / w,
            y: self.y0 as f32 / h,
            w: self.width() as f32 / w,
            h: self.height() as f32 / h,
        }
    }
}

/// Horizontal reading direction within a row of panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingDirection {
    #[default]
    Ltr,
    Rtl,
}

impl ReadingDirection {
    pub fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Ltr => Self::Rtl,
            Self::Rtl => Self::Ltr,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

/// Analysis of one page: content crop box and detected panels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Bounding box of all detected content
    pub crop_box: NormalizedBox,
    /// Panels in discovery order; empty when nothing usable was found
    pub panels: Vec<NormalizedBox>,
    /// Source image width in pixels (0 when the image could not be decoded)
    pub image_width: u32,
    /// Source image height in pixels
    pub image_height: u32,
}

impl AnalysisResult {
    /// Whole page as the only panel
    pub fn fallback(image_width: u32, image_height: u32) -> Self {
        Self {
            crop_box: NormalizedBox::FULL,
            panels: Vec::new(),
            image_width,
            image_height,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.panels.is_empty() && self.crop_box == NormalizedBox::FULL
    }

    pub fn has_image_size(&self) -> bool {
        self.image_width > 0 && self.image_height > 0
    }

    /// Panels in reading order for `direction`; a page without panels is
    /// read as its crop box
    pub fn reading_panels(&self, direction: ReadingDirection) -> Vec<NormalizedBox> {
        if self.panels.is_empty() {
            vec![self.crop_box]
        } else {
            sort_panels(&self.panels, direction)
        }
    }
}
