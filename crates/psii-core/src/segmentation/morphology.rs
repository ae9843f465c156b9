use ndarray::Array2;

use super::components::{label_components, offset, Connectivity};

/// Binary erosion with a `kernel` x `kernel` square structuring element,
/// repeated `iterations` times.
///
/// The kernel is anchored at `kernel / 2`, so an even-sized kernel reaches
/// further up and left than down and right. Pixels outside the image do not
/// erode their neighbours.
pub fn erode(mask: &Array2<bool>, kernel: usize, iterations: usize) -> Array2<bool> {
    if kernel <= 1 {
        return mask.clone();
    }
    let anchor = (kernel / 2) as isize;
    let reach: Vec<isize> = (0..kernel as isize).map(|k| k - anchor).collect();

    let mut current = mask.clone();
    for _ in 0..iterations {
        current = erode_once(&current, &reach);
    }
    current
}

fn erode_once(mask: &Array2<bool>, reach: &[isize]) -> Array2<bool> {
    let (h, w) = mask.dim();
    let mut result = Array2::from_elem((h, w), false);

    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }
            let all_true = reach.iter().all(|&dr| {
                reach.iter().all(|&dc| match offset(row, col, dr, dc, h, w) {
                    Some((nr, nc)) => mask[[nr, nc]],
                    None => true,
                })
            });
            result[[row, col]] = all_true;
        }
    }

    result
}

/// Remove 4-connected foreground components smaller than `min_area` pixels.
pub fn fill(mask: &Array2<bool>, min_area: usize) -> Array2<bool> {
    let labeling = label_components(mask, Connectivity::Four);
    let keep: Vec<bool> = std::iter::once(false)
        .chain(labeling.components.iter().map(|c| c.area >= min_area))
        .collect();
    labeling.labels.mapv(|l| keep[l as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_drops_small_speckle() {
        let mut mask = Array2::from_elem((12, 12), false);
        for row in 1..6 {
            for col in 1..6 {
                mask[[row, col]] = true;
            }
        }
        mask[[10, 10]] = true;
        mask[[10, 11]] = true;

        let filled = fill(&mask, 3);
        assert!(filled[[3, 3]]);
        assert!(!filled[[10, 10]]);
        assert_eq!(filled.iter().filter(|&&v| v).count(), 25);
    }

    #[test]
    fn test_erode_two_by_two_trims_top_left_edge() {
        let mut mask = Array2::from_elem((6, 6), false);
        for row in 1..5 {
            for col in 1..5 {
                mask[[row, col]] = true;
            }
        }
        let eroded = erode(&mask, 2, 1);
        // Anchor (1, 1): a pixel survives if it and its up/left/up-left neighbours are set.
        assert!(!eroded[[1, 1]]);
        assert!(!eroded[[1, 4]]);
        assert!(eroded[[2, 2]]);
        assert!(eroded[[4, 4]]);
        assert_eq!(eroded.iter().filter(|&&v| v).count(), 9);
    }

    #[test]
    fn test_erode_full_mask_keeps_border() {
        let mask = Array2::from_elem((4, 4), true);
        let eroded = erode(&mask, 2, 3);
        assert!(eroded.iter().all(|&v| v));
    }
}
