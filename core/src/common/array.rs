//! Small numeric helpers on top of `ndarray` used by slices and transforms.

use ndarray::{
    Array1, ArrayD, ArrayView1, ArrayViewD, Axis, ErrorKind, IxDyn, ShapeError, Slice, Zip,
};

/// Interface coordinates for a vector of cell centers.
///
/// Interior interfaces sit half way between neighbouring centers, the two
/// outer interfaces are extrapolated by half the width of the outermost cell.
/// A single center gets a unit-width cell around it.
pub fn staggered(centers: ArrayView1<f64>) -> Array1<f64> {
    let n = centers.len();
    match n {
        0 => Array1::zeros(0),
        1 => Array1::from(vec![centers[0] - 0.5, centers[0] + 0.5]),
        _ => {
            let mut stag = Array1::zeros(n + 1);
            stag[0] = centers[0] - (centers[1] - centers[0]) / 2.0;
            for i in 1..n {
                stag[i] = (centers[i - 1] + centers[i]) / 2.0;
            }
            stag[n] = centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0;
            stag
        }
    }
}

/// Index of the first element `>= value`, or the length if there is none.
pub fn search_sorted_left(sorted: ArrayView1<f64>, value: f64) -> usize {
    sorted
        .iter()
        .position(|&c| c >= value)
        .unwrap_or(sorted.len())
}

pub fn is_ascending(values: ArrayView1<f64>) -> bool {
    values.windows(2).into_iter().all(|w| w[0] <= w[1])
}

/// Removes the given unit-length axes.
pub fn remove_axes(mut arr: ArrayD<f64>, axes: &[usize]) -> ArrayD<f64> {
    let mut axes = axes.to_vec();
    axes.sort_unstable();
    for &axis in axes.iter().rev() {
        arr = arr.index_axis_move(Axis(axis), 0);
    }
    arr
}

/// First-order difference along `axis`.
pub fn diff(arr: ArrayViewD<f64>, axis: Axis) -> ArrayD<f64> {
    if arr.len_of(axis) == 0 {
        return arr.to_owned();
    }
    let upper = arr.slice_axis(axis, Slice::new(1, None, 1));
    let lower = arr.slice_axis(axis, Slice::new(0, Some(-1), 1));
    &upper - &lower
}

/// Repeats a 1-D vector lying along `axis` across the full `shape`.
pub fn broadcast_along(
    values: ArrayView1<f64>,
    shape: &[usize],
    axis: usize,
) -> Result<ArrayD<f64>, ShapeError> {
    let mut lane_shape = vec![1; shape.len()];
    lane_shape[axis] = values.len();
    let lane = values.to_owned().into_shape(IxDyn(&lane_shape))?;
    lane.broadcast(IxDyn(shape))
        .map(|view| view.to_owned())
        .ok_or_else(|| ShapeError::from_kind(ErrorKind::IncompatibleShape))
}

/// Linear blend of two hyperplanes along `axis`: `left + rel * (right - left)`.
pub fn interp_axis(arr: ArrayViewD<f64>, axis: Axis, left: usize, right: usize, rel: f64) -> ArrayD<f64> {
    let l = arr.index_axis(axis, left);
    let r = arr.index_axis(axis, right);
    &l + &((&r - &l) * rel)
}

/// Folds `axis` into `target`: the output has `axis` removed and `target`
/// lengthened by the length of `axis`, with element `(target=i, axis=j)`
/// landing at position `i * len(axis) + j` along the new target axis.
pub fn flatten_axes(arr: ArrayViewD<f64>, axis: usize, target: usize) -> ArrayD<f64> {
    let source_count = arr.len_of(Axis(axis));
    let target_count = arr.len_of(Axis(target));
    let new_target = if axis < target { target - 1 } else { target };
    let inner_axis = if axis > target { axis - 1 } else { axis };

    let mut shape = arr.shape().to_vec();
    shape[target] *= source_count;
    shape.remove(axis);

    let mut out = ArrayD::zeros(IxDyn(&shape));
    for i in 0..target_count {
        let row = arr.index_axis(Axis(target), i);
        for j in 0..source_count {
            out.index_axis_mut(Axis(new_target), i * source_count + j)
                .assign(&row.index_axis(Axis(inner_axis), j));
        }
    }
    out
}

/// Weighted percentiles along `axis`, one output array per requested fraction.
///
/// Values are sorted per lane and placed on a grid of interfaces between
/// neighbouring sorted values. The cumulative weight (starting at zero) is
/// interpolated linearly on that grid.
pub fn weighted_percentiles(
    data: ArrayViewD<f64>,
    weights: ArrayViewD<f64>,
    axis: Axis,
    fractions: &[f64],
) -> Vec<ArrayD<f64>> {
    let per_lane = Zip::from(data.lanes(axis))
        .and(weights.lanes(axis))
        .map_collect(|values, weights| lane_percentiles(values, weights, fractions));
    (0..fractions.len())
        .map(|k| per_lane.map(|lane| lane[k]))
        .collect()
}

fn lane_percentiles(values: ArrayView1<f64>, weights: ArrayView1<f64>, fractions: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return vec![f64::NAN; fractions.len()];
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut grid = Vec::with_capacity(n + 1);
    grid.push(values[order[0]]);
    for k in 1..n {
        grid.push((values[order[k - 1]] + values[order[k]]) / 2.0);
    }
    grid.push(values[order[n - 1]]);

    let mut cumulative = Vec::with_capacity(n + 1);
    let mut sum = 0.0;
    cumulative.push(sum);
    for &k in &order {
        sum += weights[k];
        cumulative.push(sum);
    }

    fractions
        .iter()
        .map(|&fraction| match cumulative.iter().position(|&c| c >= fraction) {
            Some(0) => grid[0],
            Some(k) => {
                let rel = (fraction - cumulative[k - 1]) / (cumulative[k] - cumulative[k - 1]);
                grid[k - 1] + rel * (grid[k] - grid[k - 1])
            }
            None => grid[n],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn staggered_mid_points() {
        let stag = staggered(array![0.0, 1.0, 3.0].view());
        assert_eq!(stag, array![-0.5, 0.5, 2.0, 4.0]);
        assert_eq!(staggered(array![2.0].view()), array![1.5, 2.5]);
        assert_eq!(staggered(Array1::<f64>::zeros(0).view()).len(), 0);
    }

    #[test]
    fn search_sorted() {
        let coords = array![0.0, 1.0, 2.0];
        assert_eq!(search_sorted_left(coords.view(), -1.0), 0);
        assert_eq!(search_sorted_left(coords.view(), 0.0), 0);
        assert_eq!(search_sorted_left(coords.view(), 0.5), 1);
        assert_eq!(search_sorted_left(coords.view(), 2.0), 2);
        assert_eq!(search_sorted_left(coords.view(), 2.5), 3);
    }

    #[test]
    fn diff_along_axis() {
        let arr = array![[0.0, 1.0, 3.0], [1.0, 1.0, 1.0]].into_dyn();
        assert_eq!(diff(arr.view(), Axis(1)), array![[1.0, 2.0], [0.0, 0.0]].into_dyn());
        assert_eq!(diff(arr.view(), Axis(0)), array![[1.0, 0.0, -2.0]].into_dyn());
    }

    #[test]
    fn broadcast_vector() {
        let out = broadcast_along(array![1.0, 2.0].view(), &[2, 3], 0).unwrap();
        assert_eq!(out, array![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]].into_dyn());
    }

    #[test]
    fn remove_unit_axes() {
        let arr = Array::from_shape_vec(IxDyn(&[1, 3, 1]), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(remove_axes(arr, &[2, 0]), array![1.0, 2.0, 3.0].into_dyn());
    }

    #[test]
    fn flatten_leading_axis_into_trailing() {
        // axis 0 has length 2, axis 1 has length 3
        let arr = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
        let flat = flatten_axes(arr.view(), 0, 1);
        assert_eq!(flat, array![1.0, 4.0, 2.0, 5.0, 3.0, 6.0].into_dyn());
        let flat = flatten_axes(arr.view(), 1, 0);
        assert_eq!(flat, array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0].into_dyn());
    }

    #[test]
    fn uniform_median() {
        let data = array![10.0, 14.0, 12.0].into_dyn();
        let weights = array![1.0, 1.0, 1.0].into_dyn() / 3.0;
        let out = weighted_percentiles(data.view(), weights.view(), Axis(0), &[0.5, 0.0, 1.0]);
        assert_abs_diff_eq!(out[0][[]], 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1][[]], 10.0);
        assert_abs_diff_eq!(out[2][[]], 14.0, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn staggered_brackets_centers(mut centers in prop::collection::vec(-1e6f64..1e6, 2..40)) {
            centers.sort_by(f64::total_cmp);
            let centers = Array1::from(centers);
            let stag = staggered(centers.view());
            prop_assert_eq!(stag.len(), centers.len() + 1);
            for (i, &c) in centers.iter().enumerate() {
                prop_assert!(stag[i] <= c && c <= stag[i + 1]);
            }
        }

        #[test]
        fn full_width_percentiles_are_extremes(values in prop::collection::vec(-1e3f64..1e3, 1..30)) {
            let n = values.len();
            let data = Array1::from(values.clone()).into_dyn();
            let weights = Array1::from_elem(n, 1.0 / n as f64).into_dyn();
            let out = weighted_percentiles(data.view(), weights.view(), Axis(0), &[0.0, 1.0]);
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!((out[0][[]] - min).abs() < 1e-9);
            prop_assert!((out[1][[]] - max).abs() < 1e-9);
        }
    }
}
