//! Object location: connected plant regions and their containment tree.
//!
//! Plant regions are 8-connected, background regions 4-connected, so a
//! ring of leaves always closes around the soil it encloses. Background
//! regions that do not reach the image edge are holes; they carry the
//! enclosing plant region as parent, and any plant region growing inside a
//! hole carries that hole as parent.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::error::{PsiiError, Result};
use crate::frame::{Frame, Mask};
use crate::segmentation::components::{label_components, touches_border, Connectivity};

/// Whether an object is plant material or a hole inside plant material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Outer,
    Hole,
}

/// One located region.
#[derive(Clone, Debug)]
pub struct PlantObject {
    pub kind: ObjectKind,
    /// Member pixels as (row, col), in row-major order.
    pub pixels: Vec<(usize, usize)>,
    /// Bounding box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
}

impl PlantObject {
    pub fn area(&self) -> usize {
        self.pixels.len()
    }
}

/// Containment links of one object, indexing into [`LocatedObjects::objects`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyNode {
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// All regions of one mask with their hierarchy.
#[derive(Clone, Debug)]
pub struct LocatedObjects {
    pub objects: Vec<PlantObject>,
    pub hierarchy: Vec<HierarchyNode>,
    /// (height, width) of the source mask.
    pub dim: (usize, usize),
}

impl LocatedObjects {
    /// Indices of plant (non-hole) objects.
    pub fn outer_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.kind == ObjectKind::Outer)
            .map(|(i, _)| i)
    }

    /// Holes directly enclosed by object `index`.
    pub fn holes_of(&self, index: usize) -> impl Iterator<Item = &PlantObject> + '_ {
        self.hierarchy[index]
            .children
            .iter()
            .map(|&c| &self.objects[c])
            .filter(|o| o.kind == ObjectKind::Hole)
    }
}

/// Find every connected plant region in `mask` and the containment tree
/// linking regions to the holes they enclose.
pub fn locate(frame: &Frame, mask: &Mask) -> Result<LocatedObjects> {
    if frame.dim() != mask.dim() {
        return Err(PsiiError::DimensionMismatch {
            expected: frame.dim(),
            actual: mask.dim(),
        });
    }
    let (h, w) = mask.dim();

    let plant = label_components(&mask.data, Connectivity::Eight);
    let soil = label_components(&mask.data.mapv(|v| !v), Connectivity::Four);
    let n_plant = plant.components.len();
    let n_nodes = n_plant + soil.components.len();

    // Node ids: plant components first, then background components.
    let node_of = |row: usize, col: usize| -> usize {
        let p = plant.labels[[row, col]];
        if p > 0 {
            p as usize - 1
        } else {
            n_plant + soil.labels[[row, col]] as usize - 1
        }
    };

    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_nodes];
    for row in 0..h {
        for col in 0..w {
            let here = node_of(row, col);
            if col + 1 < w {
                let right = node_of(row, col + 1);
                if right != here {
                    adjacency[here].insert(right);
                    adjacency[right].insert(here);
                }
            }
            if row + 1 < h {
                let below = node_of(row + 1, col);
                if below != here {
                    adjacency[here].insert(below);
                    adjacency[below].insert(here);
                }
            }
        }
    }

    // Breadth-first walk inwards from the image edge. Border background is
    // depth 0, plant regions touching the edge are top-level at depth 1.
    let on_border = |node: usize| -> bool {
        let bbox = if node < n_plant {
            plant.components[node].bbox
        } else {
            soil.components[node - n_plant].bbox
        };
        touches_border(bbox, h, w)
    };

    let mut depth: Vec<Option<usize>> = vec![None; n_nodes];
    let mut parent: Vec<Option<usize>> = vec![None; n_nodes];
    let mut queue = VecDeque::new();
    for node in (n_plant..n_nodes).chain(0..n_plant) {
        if on_border(node) {
            let d = if node < n_plant { 1 } else { 0 };
            depth[node] = Some(d);
            queue.push_back(node);
        }
    }
    while let Some(node) = queue.pop_front() {
        let d = depth[node].unwrap_or(0);
        for &next in &adjacency[node] {
            if depth[next].is_some() {
                continue;
            }
            depth[next] = Some(d + 1);
            parent[next] = (d > 0).then_some(node);
            queue.push_back(next);
        }
    }

    // Objects: every plant region, then every enclosed background region.
    let mut object_of: Vec<Option<usize>> = vec![None; n_nodes];
    let mut objects = Vec::new();
    for (node, stats) in plant.components.iter().enumerate() {
        object_of[node] = Some(objects.len());
        objects.push(PlantObject {
            kind: ObjectKind::Outer,
            pixels: Vec::with_capacity(stats.area),
            bbox: stats.bbox,
        });
    }
    for (i, stats) in soil.components.iter().enumerate() {
        let node = n_plant + i;
        if depth[node].is_some_and(|d| d > 0) {
            object_of[node] = Some(objects.len());
            objects.push(PlantObject {
                kind: ObjectKind::Hole,
                pixels: Vec::with_capacity(stats.area),
                bbox: stats.bbox,
            });
        }
    }

    for row in 0..h {
        for col in 0..w {
            if let Some(idx) = object_of[node_of(row, col)] {
                objects[idx].pixels.push((row, col));
            }
        }
    }

    let mut hierarchy = vec![HierarchyNode::default(); objects.len()];
    for node in 0..n_nodes {
        let (Some(child), Some(p)) = (object_of[node], parent[node]) else {
            continue;
        };
        if let Some(parent_obj) = object_of[p] {
            hierarchy[child].parent = Some(parent_obj);
            hierarchy[parent_obj].children.push(child);
        }
    }

    debug!(
        plants = n_plant,
        holes = objects.len() - n_plant,
        "Located objects"
    );

    Ok(LocatedObjects {
        objects,
        hierarchy,
        dim: (h, w),
    })
}
