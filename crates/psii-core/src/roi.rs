use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    DEFAULT_GRID_COLS, DEFAULT_GRID_ORIGIN, DEFAULT_GRID_ROWS, DEFAULT_GRID_SPACING,
    DEFAULT_ROI_RADIUS,
};
use crate::error::{PsiiError, Result};
use crate::frame::Mask;
use crate::objects::LocatedObjects;
use crate::segmentation::components::touches_border;

/// A circular region expected to hold one pot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    /// Position in row-major grid order.
    pub index: usize,
    /// Center as (x, y) = (column, row).
    pub center: (usize, usize),
    pub radius: usize,
}

impl Roi {
    /// True if pixel (row, col) lies on or inside the circle.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let dx = col as i64 - self.center.0 as i64;
        let dy = row as i64 - self.center.1 as i64;
        let r = self.radius as i64;
        dx * dx + dy * dy <= r * r
    }

    /// Whether a bounding box (min_row, max_row, min_col, max_col) can overlap the circle.
    fn may_overlap(&self, bbox: (usize, usize, usize, usize)) -> bool {
        let (min_row, max_row, min_col, max_col) = bbox;
        let (cx, cy) = self.center;
        min_col <= cx + self.radius
            && max_col + self.radius >= cx
            && min_row <= cy + self.radius
            && max_row + self.radius >= cy
    }
}

/// Rectangular layout of equally sized circular ROIs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiGrid {
    /// Center (x, y) of the top-left ROI.
    pub origin: (usize, usize),
    pub radius: usize,
    /// Distance (x, y) between neighbouring ROI centers.
    pub spacing: (usize, usize),
    pub rows: usize,
    pub cols: usize,
}

impl Default for RoiGrid {
    fn default() -> Self {
        Self {
            origin: DEFAULT_GRID_ORIGIN,
            radius: DEFAULT_ROI_RADIUS,
            spacing: DEFAULT_GRID_SPACING,
            rows: DEFAULT_GRID_ROWS,
            cols: DEFAULT_GRID_COLS,
        }
    }
}

impl RoiGrid {
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// ROIs in row-major order; the index is stable for a fixed geometry.
    pub fn define(&self) -> Vec<Roi> {
        (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| (row, col)))
            .enumerate()
            .map(|(index, (row, col))| Roi {
                index,
                center: (
                    self.origin.0 + col * self.spacing.0,
                    self.origin.1 + row * self.spacing.1,
                ),
                radius: self.radius,
            })
            .collect()
    }

    /// Define the grid and check every ROI lies inside a (height, width) frame.
    pub fn define_within(&self, dim: (usize, usize)) -> Result<Vec<Roi>> {
        let (height, width) = dim;
        let rois = self.define();
        for roi in &rois {
            let (cx, cy) = roi.center;
            if cx < roi.radius
                || cy < roi.radius
                || cx + roi.radius >= width
                || cy + roi.radius >= height
            {
                return Err(PsiiError::RoiOutOfFrame {
                    index: roi.index,
                    center: roi.center,
                    radius: roi.radius,
                    width,
                    height,
                });
            }
        }
        Ok(rois)
    }
}

/// Plant material attributed to one ROI.
#[derive(Clone, Debug)]
pub struct RoiAssignment {
    pub roi: Roi,
    /// Indices into [`LocatedObjects::objects`] of the kept plant objects.
    pub objects: Vec<usize>,
    /// Union of the kept objects.
    pub mask: Mask,
    /// Plant pixels in `mask`.
    pub area: usize,
    /// Bounding box of `mask`, `None` when nothing was kept.
    pub bbox: Option<(usize, usize, usize, usize)>,
}

impl RoiAssignment {
    pub fn has_plant(&self) -> bool {
        self.area > 0
    }

    /// Whether the composite plant stays clear of the frame edge.
    /// `None` when the ROI holds no plant.
    pub fn in_frame(&self) -> Option<bool> {
        let (h, w) = self.mask.dim();
        self.bbox.map(|bbox| !touches_border(bbox, h, w))
    }
}

/// Keep every plant object that partially or fully overlaps `roi` and merge
/// the kept objects into one composite mask.
///
/// Overlap is tested against the object including the holes it encloses, so
/// a rosette ringing the ROI center still counts. Objects reaching into
/// several ROIs are attributed to each of them.
pub fn assign(located: &LocatedObjects, roi: &Roi) -> RoiAssignment {
    let mut mask = Mask::empty(located.dim);
    let mut kept = Vec::new();
    let mut bbox: Option<(usize, usize, usize, usize)> = None;

    for index in located.outer_indices() {
        let object = &located.objects[index];
        if !roi.may_overlap(object.bbox) {
            continue;
        }
        let overlaps = object
            .pixels
            .iter()
            .chain(located.holes_of(index).flat_map(|hole| hole.pixels.iter()))
            .any(|&(row, col)| roi.contains(row, col));
        if !overlaps {
            continue;
        }

        for &(row, col) in &object.pixels {
            mask.data[[row, col]] = true;
        }
        bbox = Some(match bbox {
            None => object.bbox,
            Some(b) => (
                b.0.min(object.bbox.0),
                b.1.max(object.bbox.1),
                b.2.min(object.bbox.2),
                b.3.max(object.bbox.3),
            ),
        });
        kept.push(index);
    }

    let area = mask.count();
    debug!(roi = roi.index, objects = kept.len(), area, "Assigned objects to ROI");

    RoiAssignment {
        roi: *roi,
        objects: kept,
        mask,
        area,
        bbox,
    }
}
