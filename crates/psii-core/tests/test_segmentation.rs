#[allow(dead_code)]
mod common;

use ndarray::Array2;

use psii_core::error::PsiiError;
use psii_core::frame::Frame;
use psii_core::segmentation::{segment, MaskMode, SegmentationConfig};

#[test]
fn test_all_zero_frame_segments_to_empty_mask() {
    let frame = Frame::new(Array2::zeros((64, 64)), 16);
    let mask = segment(&frame, &SegmentationConfig::default());
    assert!(mask.is_empty());
    assert_eq!(mask.dim(), (64, 64));
}

#[test]
fn test_uniform_noise_floor_segments_to_empty_mask() {
    let frame = Frame::new(Array2::from_elem((40, 50), 312), 16);
    assert!(segment(&frame, &SegmentationConfig::default()).is_empty());
}

#[test]
fn test_plants_are_segmented_and_background_is_not() {
    let centers = common::grid_centers();
    let discs: Vec<_> = centers[..3].iter().map(|&c| (c, 3000)).collect();
    let frame = common::disc_frame(common::DIM, 200, &discs);

    let mask = segment(&frame, &SegmentationConfig::default());

    for &(x, y) in &centers[..3] {
        assert!(mask.data[[y, x]], "plant center ({x}, {y}) should be segmented");
    }
    let (x, y) = centers[3];
    assert!(!mask.data[[y, x]], "empty pot should stay background");
    assert!(!mask.data[[0, 0]]);

    // Erosion shaves the disc edge, never grows it.
    let disc_area = frame.data.iter().filter(|&&v| v == 3000).count();
    assert!(mask.count() < disc_area);
    assert!(mask.count() > disc_area * 3 / 4);
}

#[test]
fn test_speckle_below_fill_area_is_removed() {
    let centers = common::grid_centers();
    let mut frame = common::disc_frame(common::DIM, 200, &[(centers[0], 3000)]);
    // A 5x5 bright speck: far below the 150 pixel fill area.
    for row in 75..80 {
        for col in 75..80 {
            frame.data[[row, col]] = 3000;
        }
    }

    let mask = segment(&frame, &SegmentationConfig::default());
    assert!(!mask.data[[77, 77]]);
    assert!(mask.data[[40, 40]]);
}

#[test]
fn test_segmentation_is_deterministic() {
    let centers = common::grid_centers();
    let discs: Vec<_> = centers.iter().enumerate().map(|(i, &c)| (c, 2500 + 90 * i as u16)).collect();
    let frame = common::disc_frame(common::DIM, 180, &discs);
    let config = SegmentationConfig::default();
    assert_eq!(segment(&frame, &config), segment(&frame, &config));
}

#[test]
fn test_mask_mode_parses_thresh_only() {
    assert_eq!("thresh".parse::<MaskMode>().unwrap(), MaskMode::Thresh);
    assert_eq!(" Thresh ".parse::<MaskMode>().unwrap(), MaskMode::Thresh);
    let err = "watershed".parse::<MaskMode>().unwrap_err();
    assert!(matches!(err, PsiiError::UnsupportedMaskMode(ref m) if m == "watershed"));
}

#[test]
fn test_unsupported_mode_in_config_is_rejected() {
    let result: Result<SegmentationConfig, _> = toml::from_str("mode = \"kmeans\"");
    let err = result.unwrap_err().to_string();
    assert!(err.contains("kmeans"), "got: {err}");
}

#[test]
fn test_segmentation_config_defaults() {
    let cfg = SegmentationConfig::default();
    assert_eq!(cfg.mode, MaskMode::Thresh);
    assert_eq!(cfg.first_fill_area, 150);
    assert_eq!(cfg.erode_kernel, 2);
    assert_eq!(cfg.erode_iterations, 1);
    assert_eq!(cfg.second_fill_area, 45);
}
