//! Gutter-based panel segmentation
//!
//! The crop region is split recursively along the best empty band of rows
//! (horizontal gutter) or columns (vertical gutter). All density queries go
//! through a summed-area table. Segmentation never fails: the worst case is
//! the crop region coming back unsplit.

use super::analyzer::PageContent;
use super::sat::SummedAreaTable;
use super::types::{NormalizedBox, PixelRegion};

/// Rows/columns skipped at each region edge when scanning for gutters
const GUTTER_EDGE_MARGIN: u32 = 6;

/// Content pixels tolerated per gutter line, as a fraction of line length
const GUTTER_LINE_DENSITY: f32 = 0.004;

/// Minimum thickness of a gutter band
const MIN_GUTTER_BAND: u32 = 4;

/// Minimum region extent along the scan axis to look for a gutter
const MIN_GUTTER_REGION: u32 = 80;

const MAX_SPLIT_DEPTH: u32 = 4;

/// Regions smaller than this in either dimension are never split
const MIN_SPLIT_REGION: u32 = 120;

/// Both halves of a split must exceed this along the split axis
const MIN_SPLIT_PART: u32 = 60;

/// Candidates below this share of the crop area are noise
const MIN_PANEL_AREA: f32 = 0.02;

/// Candidates narrower or shorter than this share of the crop are slivers
const MIN_PANEL_SIDE: f32 = 0.08;

/// Accepted range of detected panel counts
///
/// Outside it the detection is not trusted and the crop box becomes the
/// only panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLimits {
    pub min: usize,
    pub max: usize,
}

impl PanelLimits {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn accepts(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl Default for PanelLimits {
    fn default() -> Self {
        Self { min: 2, max: 15 }
    }
}

/// Empty band between panels, `start..end` along the scan axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gutter {
    pub start: u32,
    pub end: u32,
    pub score: f32,
}

impl Gutter {
    pub fn size(&self) -> u32 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    /// Scan rows top to bottom
    Rows,
    /// Scan columns left to right
    Columns,
}

/// Best band of empty rows in `region`
pub fn find_horizontal_gutter(sat: &SummedAreaTable, region: &PixelRegion) -> Option<Gutter> {
    find_gutter(sat, region, Axis::Rows)
}

/// Best band of empty columns in `region`
pub fn find_vertical_gutter(sat: &SummedAreaTable, region: &PixelRegion) -> Option<Gutter> {
    find_gutter(sat, region, Axis::Columns)
}

fn find_gutter(sat: &SummedAreaTable, region: &PixelRegion, axis: Axis) -> Option<Gutter> {
    let (lo, hi, line_length) = match axis {
        Axis::Rows => (region.y0, region.y1, region.width()),
        Axis::Columns => (region.x0, region.x1, region.height()),
    };
    let extent = hi.saturating_sub(lo);
    if extent < MIN_GUTTER_REGION {
        return None;
    }

    let max_line_content = ((line_length as f32 * GUTTER_LINE_DENSITY).floor() as u32).max(1);

    let mut best: Option<Gutter> = None;
    let mut band_start: Option<u32> = None;

    // A band still open at the end of the scan touches the edge margin and is
    // not a gutter between two panels
    for pos in (lo + GUTTER_EDGE_MARGIN)..(hi - GUTTER_EDGE_MARGIN) {
        let count = match axis {
            Axis::Rows => sat.sum(region.x0, pos, region.x1, pos + 1),
            Axis::Columns => sat.sum(pos, region.y0, pos + 1, region.y1),
        };
        let is_gutter = count <= max_line_content;

        match (is_gutter, band_start) {
            (true, None) => band_start = Some(pos),
            (false, Some(start)) => {
                let size = pos - start;
                if size >= MIN_GUTTER_BAND {
                    let mid = (start + pos) as f32 / 2.0;
                    let relative = (mid - lo as f32) / extent as f32;
                    // Favour gutters near the middle over edge captions
                    let center_proximity = 1.0 - (0.5 - relative).abs();
                    let score = size as f32 * 1.5 + center_proximity * 10.0;

                    if best.map_or(true, |b| score > b.score) {
                        best = Some(Gutter {
                            start,
                            end: pos,
                            score,
                        });
                    }
                }
                band_start = None;
            }
            _ => {}
        }
    }

    best
}

/// Recursively split `region` along gutters
pub fn split_into_panels(
    sat: &SummedAreaTable,
    region: PixelRegion,
    depth: u32,
) -> Vec<PixelRegion> {
    if depth >= MAX_SPLIT_DEPTH
        || region.width() < MIN_SPLIT_REGION
        || region.height() < MIN_SPLIT_REGION
    {
        return vec![region];
    }

    if let Some(gutter) = find_horizontal_gutter(sat, &region) {
        let top = PixelRegion::new(region.x0, region.y0, region.x1, gutter.start);
        let bottom = PixelRegion::new(region.x0, gutter.end, region.x1, region.y1);

        if top.height() > MIN_SPLIT_PART && bottom.height() > MIN_SPLIT_PART {
            let mut regions = split_into_panels(sat, top, depth + 1);
            regions.extend(split_into_panels(sat, bottom, depth + 1));
            return regions;
        }
    }

    if let Some(gutter) = find_vertical_gutter(sat, &region) {
        let left = PixelRegion::new(region.x0, region.y0, gutter.start, region.y1);
        let right = PixelRegion::new(gutter.end, region.y0, region.x1, region.y1);

        if left.width() > MIN_SPLIT_PART && right.width() > MIN_SPLIT_PART {
            let mut regions = split_into_panels(sat, left, depth + 1);
            regions.extend(split_into_panels(sat, right, depth + 1));
            return regions;
        }
    }

    vec![region]
}

/// Whether a candidate is large enough relative to the crop to be a panel
fn is_panel_sized(region: &PixelRegion, crop: &PixelRegion) -> bool {
    let crop_area = crop.area().max(1) as f32;
    let area = region.area() as f32 / crop_area;
    let width = region.width() as f32 / crop.width().max(1) as f32;
    let height = region.height() as f32 / crop.height().max(1) as f32;

    area >= MIN_PANEL_AREA && width >= MIN_PANEL_SIDE && height >= MIN_PANEL_SIDE
}

/// Panels of an analysed page, in discovery order
///
/// Returns an empty list for a page without content, and exactly the crop
/// box when the candidate count falls outside `limits`.
pub fn segment(content: &PageContent, limits: PanelLimits) -> Vec<NormalizedBox> {
    let Some(crop) = content.crop else {
        return Vec::new();
    };

    let sat = SummedAreaTable::build(&content.mask);
    let (width, height) = (sat.width(), sat.height());

    let candidates: Vec<NormalizedBox> = split_into_panels(&sat, crop, 0)
        .iter()
        .filter(|region| is_panel_sized(region, &crop))
        .map(|region| region.normalize(width, height))
        .collect();

    if limits.accepts(candidates.len()) {
        candidates
    } else {
        vec![content.crop_box]
    }
}
