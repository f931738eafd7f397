//! Summed-area table over a content mask
//!
//! `(width + 1) x (height + 1)` prefix sums with a zero first row and column,
//! giving constant-time content counts for any rectangle.

use super::analyzer::ContentMask;
use super::types::PixelRegion;

#[derive(Debug, Clone)]
pub struct SummedAreaTable {
    width: u32,
    height: u32,
    sums: Vec<u32>,
}

impl SummedAreaTable {
    pub fn build(mask: &ContentMask) -> Self {
        let width = mask.width();
        let height = mask.height();
        let stride = width as usize + 1;
        let mut sums = vec![0u32; stride * (height as usize + 1)];

        for y in 1..=height as usize {
            let mut row_sum = 0u32;
            for x in 1..=width as usize {
                row_sum += mask.cell(x as u32 - 1, y as u32 - 1);
                sums[y * stride + x] = sums[(y - 1) * stride + x] + row_sum;
            }
        }

        Self {
            width,
            height,
            sums,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Content pixels in `[x0, x1) x [y0, y1)`; bounds are clamped to the table
    pub fn sum(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> u32 {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return 0;
        }

        let stride = self.width as usize + 1;
        let at = |x: u32, y: u32| self.sums[y as usize * stride + x as usize];

        at(x1, y1) + at(x0, y0) - at(x1, y0) - at(x0, y1)
    }

    pub fn sum_region(&self, region: &PixelRegion) -> u32 {
        self.sum(region.x0, region.y0, region.x1, region.y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::analyzer::tests::page_with_blocks;
    use crate::panels::analyzer::ContentAnalyzer;

    #[test]
    fn test_sum_matches_mask() {
        let raster = page_with_blocks(40, 30, &[(5, 5, 15, 10), (20, 12, 30, 28)]);
        let content = ContentAnalyzer::default().analyze_raster(&raster);
        let sat = SummedAreaTable::build(&content.mask);

        assert_eq!(sat.sum(0, 0, 40, 30), 10 * 5 + 10 * 16);
        assert_eq!(sat.sum(5, 5, 15, 10), 50);
        assert_eq!(sat.sum(0, 0, 5, 30), 0);
        assert_eq!(sat.sum(10, 0, 25, 30), 5 * 5 + 5 * 16);
        assert_eq!(sat.sum_region(&PixelRegion::new(20, 12, 21, 13)), 1);
    }

    #[test]
    fn test_sum_degenerate_ranges() {
        let raster = page_with_blocks(12, 12, &[(1, 1, 11, 11)]);
        let content = ContentAnalyzer::default().analyze_raster(&raster);
        let sat = SummedAreaTable::build(&content.mask);

        assert_eq!(sat.sum(4, 4, 4, 8), 0);
        assert_eq!(sat.sum(8, 8, 3, 3), 0);
        assert_eq!(sat.sum(5, 5, 50, 50), 36);
    }
}
