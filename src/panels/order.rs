//! Reading order
//!
//! Panels are grouped into rows by vertical center, rows are read top to
//! bottom and panels within a row follow the reading direction.

use super::types::{NormalizedBox, ReadingDirection};

/// Maximum vertical-center distance (page fractions) from a row's running
/// average for a panel to join that row
pub const ROW_THRESHOLD: f32 = 0.08;

/// Order panels for reading
///
/// Both sorts are stable, so panels with equal keys keep discovery order.
pub fn sort_panels(panels: &[NormalizedBox], direction: ReadingDirection) -> Vec<NormalizedBox> {
    let mut by_height: Vec<NormalizedBox> = panels.to_vec();
    by_height.sort_by(|a, b| a.center().1.total_cmp(&b.center().1));

    let mut rows: Vec<Vec<NormalizedBox>> = Vec::new();
    for panel in by_height {
        let cy = panel.center().1;
        match rows.last_mut() {
            Some(row) if (cy - row_center(row)).abs() <= ROW_THRESHOLD => row.push(panel),
            _ => rows.push(vec![panel]),
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by(|a, b| {
                let (ax, bx) = (a.center().0, b.center().0);
                if direction.is_rtl() {
                    bx.total_cmp(&ax)
                } else {
                    ax.total_cmp(&bx)
                }
            });
            row
        })
        .collect()
}

fn row_center(row: &[NormalizedBox]) -> f32 {
    row.iter().map(|p| p.center().1).sum::<f32>() / row.len() as f32
}
