use serde::{Deserialize, Serialize};

use super::range::RangeIncl;

/// Range of the finite values of an array. Non-finite values (NaN, ±inf)
/// are counted but otherwise ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrayStats {
    pub range: RangeIncl<f64>,
    pub non_finite: usize,
}

impl ArrayStats {
    /// Returns `None` if there is not a single finite value.
    pub fn new(data: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut non_finite = 0usize;
        let range = RangeIncl::from_iter_val(data.into_iter().filter(|value| {
            let finite = value.is_finite();
            if !finite {
                non_finite += 1;
            }
            finite
        }))?;
        Some(Self { range, non_finite })
    }

    /// True if every finite value is identical.
    pub fn is_constant(&self) -> bool {
        self.range.min == self.range.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_non_finite() {
        let stats = ArrayStats::new([1.0, f64::NAN, 3.0, f64::INFINITY]).unwrap();
        assert_eq!(stats.range, RangeIncl::new(1.0, 3.0));
        assert_eq!(stats.non_finite, 2);
    }

    #[test]
    fn all_nan_has_no_stats() {
        assert!(ArrayStats::new([f64::NAN, f64::NAN]).is_none());
    }

    #[test]
    fn constant_values() {
        assert!(!ArrayStats::new([-4.0, 0.0]).unwrap().is_constant());
        assert!(ArrayStats::new([5.0, 5.0]).unwrap().is_constant());
    }
}
