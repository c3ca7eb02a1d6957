//! Axis scale selection.

use wxfeed_types::{Sample, ScaleMode};

/// Value spread above which a series is drawn on a logarithmic axis.
pub const LOG_SCALE_RANGE: f64 = 100.0;

/// Pick the axis scale for a set of points.
///
/// Logarithmic when `max(value) - min(value)` exceeds [`LOG_SCALE_RANGE`].
/// Order of the points does not matter; an empty set is linear.
pub fn select_scale<'a, I>(points: I) -> ScaleMode
where
    I: IntoIterator<Item = &'a Sample>,
{
    select_scale_values(points.into_iter().map(|s| s.value))
}

/// Same rule over bare values. NaN values are ignored.
pub fn select_scale_values<I>(values: I) -> ScaleMode
where
    I: IntoIterator<Item = f64>,
{
    let bounds = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });

    match bounds {
        Some((lo, hi)) if hi - lo > LOG_SCALE_RANGE => ScaleMode::Logarithmic,
        _ => ScaleMode::Linear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(i as f64, *v))
            .collect()
    }

    #[test]
    fn test_narrow_range_is_linear() {
        assert_eq!(select_scale(&samples(&[5.0, 7.0, 10.0])), ScaleMode::Linear);
    }

    #[test]
    fn test_wide_range_is_logarithmic() {
        assert_eq!(select_scale(&samples(&[1.0, 150.0])), ScaleMode::Logarithmic);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(select_scale_values([0.0, 100.0]), ScaleMode::Linear);
        assert_eq!(select_scale_values([0.0, 100.5]), ScaleMode::Logarithmic);
    }

    #[test]
    fn test_empty_and_nan() {
        assert_eq!(select_scale(&Vec::new()), ScaleMode::Linear);
        assert_eq!(select_scale_values([f64::NAN, 3.0]), ScaleMode::Linear);
    }
}
