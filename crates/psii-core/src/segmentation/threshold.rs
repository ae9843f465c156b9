use ndarray::Array2;

use crate::frame::Mask;

/// Yen's maximum-correlation threshold over the integer intensity histogram.
///
/// The histogram has one bin per intensity between the frame minimum and
/// maximum. Returns the lowest intensity of the foreground class, so plant
/// pixels are those `>=` the result. A frame with a single intensity has no
/// foreground and yields `max + 1`.
pub fn yen_threshold(data: &Array2<u16>) -> u32 {
    let Some((min, max)) = intensity_range(data) else {
        return 0;
    };
    if min == max {
        return max as u32 + 1;
    }

    let bins = (max - min) as usize + 1;
    let mut histogram = vec![0u64; bins];
    for &v in data.iter() {
        histogram[(v - min) as usize] += 1;
    }

    let total = data.len() as f64;
    let pmf: Vec<f64> = histogram.iter().map(|&c| c as f64 / total).collect();

    // Cumulative probability and cumulative squared probability from below,
    // squared probability from above.
    let mut p1 = Vec::with_capacity(bins);
    let mut p1_sq = Vec::with_capacity(bins);
    let (mut acc, mut acc_sq) = (0.0_f64, 0.0_f64);
    for &p in &pmf {
        acc += p;
        acc_sq += p * p;
        p1.push(acc);
        p1_sq.push(acc_sq);
    }
    let mut p2_sq = vec![0.0_f64; bins];
    let mut acc_sq = 0.0_f64;
    for i in (0..bins).rev() {
        acc_sq += pmf[i] * pmf[i];
        p2_sq[i] = acc_sq;
    }

    let mut best_bin = 0usize;
    let mut best_crit = f64::NEG_INFINITY;
    for i in 0..bins - 1 {
        let spread = p1[i] * (1.0 - p1[i]);
        let crit = (spread * spread / (p1_sq[i] * p2_sq[i + 1])).ln();
        if crit > best_crit {
            best_crit = crit;
            best_bin = i;
        }
    }

    min as u32 + best_bin as u32 + 1
}

/// Binary threshold with "light" polarity: keep pixels at or above `level`.
pub fn threshold_light(data: &Array2<u16>, level: u32) -> Mask {
    Mask::new(data.mapv(|v| v as u32 >= level))
}

fn intensity_range(data: &Array2<u16>) -> Option<(u16, u16)> {
    let mut iter = data.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
