use ndarray::Array2;

/// Pixel neighbourhood used when grouping foreground pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    /// Edge neighbours only.
    Four,
    /// Edge and corner neighbours.
    Eight,
}

impl Connectivity {
    /// Neighbours already visited in a row-major scan, as (row, col) offsets.
    fn causal_offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &[(-1, 0), (0, -1)],
            Self::Eight => &[(-1, -1), (-1, 0), (-1, 1), (0, -1)],
        }
    }

    /// Every neighbour of a pixel, as (row, col) offsets.
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
            Self::Eight => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        }
    }
}

/// Statistics for a single connected component.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentStats {
    /// Label of this component in [`Labeling::labels`], starting at 1.
    pub label: u32,
    /// Number of pixels in the component.
    pub area: usize,
    /// Bounding box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
}

/// Result of connected component labeling.
#[derive(Clone, Debug)]
pub struct Labeling {
    /// Per-pixel component label; 0 = not part of any component.
    pub labels: Array2<u32>,
    /// Components ordered by label, i.e. by their first pixel in row-major order.
    pub components: Vec<ComponentStats>,
}

/// Label connected components of a binary mask using two-pass labeling with
/// union-find.
///
/// Labels are consecutive and assigned in row-major order of each
/// component's first pixel, so the result is deterministic.
pub fn label_components(mask: &Array2<bool>, connectivity: Connectivity) -> Labeling {
    let (h, w) = mask.dim();
    let mut labels = Array2::<u32>::zeros((h, w));
    if h == 0 || w == 0 {
        return Labeling {
            labels,
            components: Vec::new(),
        };
    }

    // Union-find parent array. Index 0 unused; labels start at 1.
    let mut parent: Vec<u32> = vec![0];

    // Pass 1: assign provisional labels.
    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }

            let mut smallest = 0u32;
            for &(dr, dc) in connectivity.causal_offsets() {
                let Some((nr, nc)) = offset(row, col, dr, dc, h, w) else {
                    continue;
                };
                let lbl = labels[[nr, nc]];
                if lbl == 0 {
                    continue;
                }
                if smallest == 0 {
                    smallest = lbl;
                } else if lbl != smallest {
                    union(&mut parent, smallest, lbl);
                    smallest = smallest.min(lbl);
                }
            }

            if smallest == 0 {
                let next = parent.len() as u32;
                parent.push(next);
                labels[[row, col]] = next;
            } else {
                labels[[row, col]] = smallest;
            }
        }
    }

    // Flatten parent references.
    for i in 1..parent.len() {
        parent[i] = find(&parent, i as u32);
    }

    // Pass 2: map roots to consecutive labels and collect stats.
    let mut final_label = vec![0u32; parent.len()];
    let mut components: Vec<ComponentStats> = Vec::new();

    for row in 0..h {
        for col in 0..w {
            let lbl = labels[[row, col]];
            if lbl == 0 {
                continue;
            }
            let root = parent[lbl as usize] as usize;
            if final_label[root] == 0 {
                components.push(ComponentStats {
                    label: components.len() as u32 + 1,
                    area: 0,
                    bbox: (row, row, col, col),
                });
                final_label[root] = components.len() as u32;
            }
            let resolved = final_label[root];
            labels[[row, col]] = resolved;

            let entry = &mut components[resolved as usize - 1];
            entry.area += 1;
            entry.bbox.0 = entry.bbox.0.min(row);
            entry.bbox.1 = entry.bbox.1.max(row);
            entry.bbox.2 = entry.bbox.2.min(col);
            entry.bbox.3 = entry.bbox.3.max(col);
        }
    }

    Labeling { labels, components }
}

/// Returns true if the component's bounding box touches any edge of the image.
pub fn touches_border(bbox: (usize, usize, usize, usize), height: usize, width: usize) -> bool {
    let (min_row, max_row, min_col, max_col) = bbox;
    min_row == 0 || max_row + 1 >= height || min_col == 0 || max_col + 1 >= width
}

/// Neighbour coordinate, or `None` when it falls outside the image.
pub(crate) fn offset(
    row: usize,
    col: usize,
    dr: isize,
    dc: isize,
    h: usize,
    w: usize,
) -> Option<(usize, usize)> {
    let nr = row.checked_add_signed(dr)?;
    let nc = col.checked_add_signed(dc)?;
    (nr < h && nc < w).then_some((nr, nc))
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Merge larger root into smaller root to keep labels consistent.
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> Array2<bool> {
        let h = rows.len();
        let w = rows[0].len();
        Array2::from_shape_fn((h, w), |(r, c)| rows[r].as_bytes()[c] == b'#')
    }

    #[test]
    fn test_diagonal_pixels_split_under_four_connectivity() {
        let mask = mask_from(&["#.", ".#"]);
        assert_eq!(label_components(&mask, Connectivity::Four).components.len(), 2);
        assert_eq!(label_components(&mask, Connectivity::Eight).components.len(), 1);
    }

    #[test]
    fn test_u_shape_merges_into_one_label() {
        let mask = mask_from(&["#.#", "#.#", "###"]);
        let labeling = label_components(&mask, Connectivity::Four);
        assert_eq!(labeling.components.len(), 1);
        assert_eq!(labeling.components[0].area, 7);
        assert_eq!(labeling.components[0].bbox, (0, 2, 0, 2));
        assert!(labeling.labels.iter().all(|&l| l <= 1));
    }

    #[test]
    fn test_labels_follow_scan_order() {
        let mask = mask_from(&["..#", "...", "#.."]);
        let labeling = label_components(&mask, Connectivity::Eight);
        assert_eq!(labeling.labels[[0, 2]], 1);
        assert_eq!(labeling.labels[[2, 0]], 2);
    }

    #[test]
    fn test_touches_border() {
        assert!(touches_border((0, 3, 2, 3), 10, 10));
        assert!(touches_border((2, 9, 2, 3), 10, 10));
        assert!(!touches_border((1, 8, 1, 8), 10, 10));
    }
}
