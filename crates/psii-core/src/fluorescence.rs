//! Photosynthetic ratio images from a dark/bright frame pair.
//!
//! Every output starts as the zero sentinel and is written only at pixels
//! inside the mask whose bright value is positive. Invalid pixels are never
//! the result of a division, so no Inf or NaN reaches a persisted image.

use ndarray::{Array2, Zip};

use crate::error::{PsiiError, Result};
use crate::frame::{Frame, Mask, RatioImage};

/// Outputs of the dark-adapted `FvFm` measurement.
#[derive(Clone, Debug)]
pub struct BaselineFluorescence {
    /// Variable fluorescence Fm - Fo inside the mask, zero elsewhere.
    pub fv: RatioImage,
    /// Fv/Fm.
    pub yii: RatioImage,
    /// Always zero: there is no quenching at the reference point.
    pub npq: RatioImage,
}

/// Outputs of one light-adapted induction measurement.
#[derive(Clone, Debug)]
pub struct InductionFluorescence {
    /// Fv'/Fm'.
    pub yii: RatioImage,
    /// Fm/Fm' - 1 where that ratio is at least 1, the raw ratio where it is below 1.
    pub npq: RatioImage,
}

/// Compute Fv and Fv/Fm for the baseline measurement.
pub fn compute_baseline(dark: &Frame, bright: &Frame, mask: &Mask) -> Result<BaselineFluorescence> {
    check_dims(bright, dark.dim())?;
    check_dims(bright, mask.dim())?;

    let fv = variable_fluorescence(dark, bright, mask);
    let yii = quantum_yield(&fv, bright, mask);
    let npq = Array2::<f32>::zeros(bright.dim());

    Ok(BaselineFluorescence { fv, yii, npq })
}

/// Compute Fv'/Fm' and NPQ for an induction measurement, using the baseline
/// mask and the baseline maximum-fluorescence frame.
pub fn compute_induction(
    dark: &Frame,
    bright: &Frame,
    mask: &Mask,
    baseline_bright: &Frame,
) -> Result<InductionFluorescence> {
    check_dims(bright, dark.dim())?;
    check_dims(bright, mask.dim())?;
    check_dims(bright, baseline_bright.dim())?;

    let fvp = variable_fluorescence(dark, bright, mask);
    let yii = quantum_yield(&fvp, bright, mask);

    let mut npq = Array2::<f32>::zeros(bright.dim());
    Zip::from(&mut npq)
        .and(&baseline_bright.data)
        .and(&bright.data)
        .and(&mask.data)
        .for_each(|out, &fm, &fmp, &plant| {
            if plant && fmp > 0 {
                *out = quenching(fm as f32 / fmp as f32);
            }
        });

    Ok(InductionFluorescence { yii, npq })
}

/// Stern-Volmer quenching from the Fm/Fm' ratio. The offset of 1 only
/// applies when the ratio is at least 1; smaller ratios pass through.
pub fn quenching(ratio: f32) -> f32 {
    if ratio >= 1.0 {
        ratio - 1.0
    } else {
        ratio
    }
}

/// bright - dark inside the mask, clamped at zero so a brighter dark frame
/// cannot wrap. Zero outside the mask.
fn variable_fluorescence(dark: &Frame, bright: &Frame, mask: &Mask) -> RatioImage {
    let mut fv = Array2::<f32>::zeros(bright.dim());
    Zip::from(&mut fv)
        .and(&dark.data)
        .and(&bright.data)
        .and(&mask.data)
        .for_each(|out, &lo, &hi, &plant| {
            if plant {
                *out = hi.saturating_sub(lo) as f32;
            }
        });
    fv
}

fn quantum_yield(fv: &RatioImage, bright: &Frame, mask: &Mask) -> RatioImage {
    let mut yii = Array2::<f32>::zeros(bright.dim());
    Zip::from(&mut yii)
        .and(fv)
        .and(&bright.data)
        .and(&mask.data)
        .for_each(|out, &v, &fm, &plant| {
            if plant && fm > 0 {
                *out = v / fm as f32;
            }
        });
    yii
}

fn check_dims(reference: &Frame, actual: (usize, usize)) -> Result<()> {
    if reference.dim() != actual {
        return Err(PsiiError::DimensionMismatch {
            expected: reference.dim(),
            actual,
        });
    }
    Ok(())
}
