// Summary statistics over a single numeric series
use serde::Serialize;

/// Which readings count as a signal.
///
/// A zero watt or kWh reading means "no measurement", while a temperature of
/// zero degrees is a real value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalFilter {
    /// Drops null, NaN, zero and negative values.
    Positive,
    /// Drops null and NaN only.
    Finite,
}

impl SignalFilter {
    pub fn accepts(&self, value: f64) -> bool {
        match self {
            SignalFilter::Positive => value.is_finite() && value > 0.0,
            SignalFilter::Finite => value.is_finite(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Statistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl Statistics {
    pub fn compute<I>(values: I, filter: SignalFilter) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut total = 0.0;
        let mut count = 0u64;

        for value in values.into_iter().flatten().filter(|v| filter.accepts(*v)) {
            min = Some(min.map_or(value, |m| m.min(value)));
            max = Some(max.map_or(value, |m| m.max(value)));
            total += value;
            count += 1;
        }

        let mean = (count > 0).then(|| total / count as f64);
        Self { min, max, mean }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.mean.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excludes_non_positive_values() {
        let stats = Statistics::compute(
            vec![Some(0.0), Some(-5.0), Some(10.0), Some(20.0), None],
            SignalFilter::Positive,
        );

        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(20.0));
        assert_eq!(stats.mean, Some(15.0));
    }

    #[test]
    fn test_excludes_nan() {
        let stats = Statistics::compute(vec![Some(f64::NAN), Some(3.0)], SignalFilter::Positive);
        assert_eq!(stats.mean, Some(3.0));
    }

    #[test]
    fn test_empty_filtered_set() {
        let stats = Statistics::compute(vec![Some(0.0), None], SignalFilter::Positive);
        assert_eq!(stats, Statistics::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_finite_filter_keeps_zero_and_negative() {
        let stats = Statistics::compute(
            vec![Some(-2.0), Some(0.0), Some(5.0), None],
            SignalFilter::Finite,
        );

        assert_eq!(stats.min, Some(-2.0));
        assert_eq!(stats.max, Some(5.0));
        assert_eq!(stats.mean, Some(1.0));
    }
}
