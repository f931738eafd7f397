//! Panel focus transform
//!
//! The page image is first fitted into the viewport, then magnified and
//! translated so the target panel fills the safe sub-rectangle left free by
//! the reader chrome. The result is an affine `matrix(s, 0, 0, s, tx, ty)`
//! applied with a top-left transform origin.

use serde::Serialize;

use crate::config::FocusConfig;
use crate::panels::NormalizedBox;

/// Smallest panel side (page fraction) used for magnification
const MIN_PANEL_FRACTION: f32 = 0.02;

/// Size of the element the page image is rendered into, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Viewport area not covered by chrome, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeArea {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl SafeArea {
    pub fn new(viewport: Viewport, config: &FocusConfig) -> Self {
        Self {
            left: config.side_inset,
            top: config.top_inset,
            right: viewport.width - config.side_inset,
            bottom: viewport.height - config.bottom_inset,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(1.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTransform {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    /// Size of the page image once fitted into the viewport
    pub fit_width: f32,
    pub fit_height: f32,
}

impl FocusTransform {
    /// CSS `matrix()` value for the page image element
    pub fn to_css_matrix(&self) -> String {
        format!(
            "matrix({s},0,0,{s},{tx},{ty})",
            s = self.scale,
            tx = self.translate_x,
            ty = self.translate_y
        )
    }

    /// Where a page-fraction box lands in viewport pixels
    pub fn project(&self, panel: &NormalizedBox) -> (f32, f32, f32, f32) {
        let left = panel.x * self.fit_width * self.scale + self.translate_x;
        let top = panel.y * self.fit_height * self.scale + self.translate_y;
        let right = panel.right() * self.fit_width * self.scale + self.translate_x;
        let bottom = panel.bottom() * self.fit_height * self.scale + self.translate_y;
        (left, top, right, bottom)
    }
}

/// Transform framing `panel` of an `image_width` x `image_height` page
///
/// Returns `None` when either the image or the viewport has no area.
///
/// The scale never drops below `min_scale`. When that floor leaves the panel
/// larger than the safe area, the right and bottom edges are pinned to it and
/// the panel overflows past the left and top edges instead.
pub fn focus_transform(
    panel: &NormalizedBox,
    image_width: u32,
    image_height: u32,
    viewport: Viewport,
    pages_per_view: u8,
    config: &FocusConfig,
) -> Option<FocusTransform> {
    if image_width == 0 || image_height == 0 || viewport.is_empty() {
        return None;
    }

    let (iw, ih) = (image_width as f32, image_height as f32);
    let fit_scale = (viewport.width / iw).min(viewport.height / ih);
    let fit_width = iw * fit_scale;
    let fit_height = ih * fit_scale;

    let panel_width = panel.w.max(MIN_PANEL_FRACTION) * fit_width;
    let panel_height = panel.h.max(MIN_PANEL_FRACTION) * fit_height;
    let (cx, cy) = panel.center();
    let (cx, cy) = (cx * fit_width, cy * fit_height);

    let safe = SafeArea::new(viewport, config);

    let scale = ((safe.width() / panel_width).min(safe.height() / panel_height)
        * config.fill_factor)
        .clamp(config.min_scale, config.max_scale(pages_per_view));

    let mut translate_x = safe.left + safe.width() / 2.0 - cx * scale;
    let mut translate_y = safe.top + safe.height() / 2.0 - cy * scale;

    // Keep the panel edges out from under the chrome
    let left = panel.x * fit_width * scale + translate_x;
    let right = panel.right() * fit_width * scale + translate_x;
    if left < safe.left {
        translate_x += safe.left - left;
    }
    if right > safe.right {
        translate_x -= right - safe.right;
    }

    let top = panel.y * fit_height * scale + translate_y;
    let bottom = panel.bottom() * fit_height * scale + translate_y;
    if top < safe.top {
        translate_y += safe.top - top;
    }
    if bottom > safe.bottom {
        translate_y -= bottom - safe.bottom;
    }

    Some(FocusTransform {
        scale,
        translate_x,
        translate_y,
        fit_width,
        fit_height,
    })
}
