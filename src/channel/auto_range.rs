//! Automatic intensity window from pixel statistics.
//!
//! Background pixels (zero or negative) are ignored; the window spans the
//! `cutoff` and `1 - cutoff` percentiles of the remaining samples. Both
//! percentiles are found by partial selection, so the cost is linear on
//! average instead of a full sort.

use super::display::IntensityRange;

/// Percentile bounds of the foreground samples.
///
/// Returns `(low, high)` where `low` is the sample at rank
/// `floor(n * cutoff)` and `high` the sample at rank `floor(n * (1 - cutoff))`
/// among the `n` positive samples, in sorted order. A bound is `None` when
/// its rank falls outside the foreground (no foreground at all, or a zero
/// cutoff on the high side). Cutoffs are clamped to `[0, 0.5]`; NaN counts
/// as zero.
pub fn percentile_bounds(samples: &[f32], cutoff: f64) -> (Option<f32>, Option<f32>) {
    // keeps bottom <= top, so both ranks stay order statistics
    let cutoff = if cutoff.is_nan() {
        0.0
    } else {
        cutoff.clamp(0.0, 0.5)
    };
    let mut values: Vec<f32> = samples.iter().copied().filter(|&v| v > 0.0).collect();
    let n = values.len();

    let top = (n as f64 * (1.0 - cutoff)).floor() as usize;
    let bottom = (n as f64 * cutoff).floor() as usize;

    if top < n {
        values.select_nth_unstable_by(top, f32::total_cmp);
    }
    // everything before `top` is now <= values[top]
    if bottom < top {
        values[..top].select_nth_unstable_by(bottom, f32::total_cmp);
    }

    log::trace!(
        "auto range: {} foreground samples, ranks {} and {}",
        n,
        bottom,
        top
    );

    (values.get(bottom).copied(), values.get(top).copied())
}

/// Intensity window for a frame, or the full range when there is no frame.
pub fn auto_range(pixels: Option<&[f32]>, cutoff: f64) -> IntensityRange {
    let Some(pixels) = pixels else {
        return IntensityRange::FULL;
    };

    let (low, high) = percentile_bounds(pixels, cutoff);
    IntensityRange::clamped(
        low.map_or(0, to_intensity),
        high.map_or(255, to_intensity),
    )
}

fn to_intensity(sample: f32) -> i32 {
    // saturating float-to-int conversion; clamped to 0-255 by the caller
    sample.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_AUTO_RANGE_CUTOFF;
    use proptest::prelude::*;

    fn sorted_bounds(samples: &[f32], cutoff: f64) -> (Option<f32>, Option<f32>) {
        let mut values: Vec<f32> = samples.iter().copied().filter(|&v| v > 0.0).collect();
        values.sort_by(f32::total_cmp);
        let n = values.len();
        let top = (n as f64 * (1.0 - cutoff)).floor() as usize;
        let bottom = (n as f64 * cutoff).floor() as usize;
        (values.get(bottom).copied(), values.get(top).copied())
    }

    #[test]
    fn test_nine_samples() {
        let samples = [5.0, 1.0, 9.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0];
        assert_eq!(
            percentile_bounds(&samples, DEFAULT_AUTO_RANGE_CUTOFF),
            (Some(1.0), Some(9.0))
        );
        assert_eq!(
            auto_range(Some(&samples), DEFAULT_AUTO_RANGE_CUTOFF).as_tuple(),
            (1, 9)
        );
    }

    #[test]
    fn test_background_is_ignored() {
        let samples = [0.0, 0.0, -3.0, 40.0, 0.0, 60.0, 50.0];
        assert_eq!(
            percentile_bounds(&samples, DEFAULT_AUTO_RANGE_CUTOFF),
            (Some(40.0), Some(60.0))
        );
    }

    #[test]
    fn test_no_frame_or_no_foreground_gives_full_range() {
        assert_eq!(auto_range(None, DEFAULT_AUTO_RANGE_CUTOFF), IntensityRange::FULL);
        assert_eq!(
            auto_range(Some(&[0.0, 0.0, -1.0]), DEFAULT_AUTO_RANGE_CUTOFF),
            IntensityRange::FULL
        );
        assert_eq!(auto_range(Some(&[]), DEFAULT_AUTO_RANGE_CUTOFF), IntensityRange::FULL);
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(
            auto_range(Some(&[0.0, 17.0]), DEFAULT_AUTO_RANGE_CUTOFF).as_tuple(),
            (17, 17)
        );
    }

    #[test]
    fn test_zero_cutoff_leaves_high_bound_open() {
        let samples = [3.0, 1.0, 2.0];
        assert_eq!(percentile_bounds(&samples, 0.0), (Some(1.0), None));
        assert_eq!(auto_range(Some(&samples), 0.0).as_tuple(), (1, 255));
    }

    #[test]
    fn test_out_of_scale_samples_are_clamped() {
        let samples = [0.4, 1000.0];
        // 0.4 rounds to 0, 1000 saturates at 255
        assert_eq!(auto_range(Some(&samples), DEFAULT_AUTO_RANGE_CUTOFF).as_tuple(), (0, 255));
    }

    #[test]
    fn test_out_of_range_cutoff_is_clamped() {
        let samples: Vec<f32> = (1..=10).map(|v| v as f32).collect();
        // above one half both ranks meet at the median
        assert_eq!(percentile_bounds(&samples, 0.8), sorted_bounds(&samples, 0.5));
        assert_eq!(percentile_bounds(&samples, 0.8), (Some(6.0), Some(6.0)));
        assert_eq!(percentile_bounds(&samples, -1.0), sorted_bounds(&samples, 0.0));
        assert_eq!(percentile_bounds(&samples, f64::NAN), sorted_bounds(&samples, 0.0));
    }

    proptest! {
        #[test]
        fn selection_matches_full_sort(
            samples in prop::collection::vec(-20i32..280, 0..2000),
            cutoff in 0.0f64..0.5,
        ) {
            // small integer range gives plenty of duplicates and background
            let samples: Vec<f32> = samples.into_iter().map(|v| v as f32).collect();
            prop_assert_eq!(percentile_bounds(&samples, cutoff), sorted_bounds(&samples, cutoff));
        }

        #[test]
        fn selection_matches_full_sort_for_any_floats(
            samples in prop::collection::vec(any::<f32>(), 0..500),
            cutoff in 0.0f64..0.5,
        ) {
            prop_assert_eq!(percentile_bounds(&samples, cutoff), sorted_bounds(&samples, cutoff));
        }

        #[test]
        fn auto_range_is_ordered(
            samples in prop::collection::vec(-1000.0f32..1000.0, 0..500),
            cutoff in 0.0f64..0.5,
        ) {
            let range = auto_range(Some(&samples), cutoff);
            prop_assert!(range.lo() <= range.hi());
        }
    }
}
