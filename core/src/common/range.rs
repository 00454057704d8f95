use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Constructor, Serialize, Deserialize)]
pub struct RangeIncl<N> {
    pub min: N,
    pub max: N,
}

impl<N: PartialOrd + Copy> RangeIncl<N> {
    pub fn expand(&self, new: N) -> Self {
        Self::new(
            if self.min < new { self.min } else { new },
            if self.max > new { self.max } else { new },
        )
    }

    /// Smallest range covering both `self` and `new`.
    pub fn max(&self, new: RangeIncl<N>) -> Self {
        Self::new(
            if self.min < new.min {
                self.min
            } else {
                new.min
            },
            if self.max > new.max {
                self.max
            } else {
                new.max
            },
        )
    }

    pub fn from_iter_val(iter: impl IntoIterator<Item = N>) -> Option<RangeIncl<N>> {
        iter.into_iter().fold(None, |acc, n| match acc {
            Some(acc) => Some(acc.expand(n)),
            None => Some(RangeIncl::new(n, n)),
        })
    }

    pub fn from_iter_range(iter: impl IntoIterator<Item = RangeIncl<N>>) -> Option<RangeIncl<N>> {
        iter.into_iter().fold(None, |acc, range| match acc {
            Some(acc) => Some(acc.max(range)),
            None => Some(range),
        })
    }
}

/// Union of an optional running range with a new one.
pub fn union<N: PartialOrd + Copy>(
    acc: Option<RangeIncl<N>>,
    new: RangeIncl<N>,
) -> RangeIncl<N> {
    match acc {
        Some(acc) => acc.max(new),
        None => new,
    }
}
