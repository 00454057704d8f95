use ndarray::{ArrayD, Ix1};
use serde::{Deserialize, Serialize};

use crate::{
    common::array::{remove_axes, staggered},
    variable::VariableError,
};

/// A window of n-dimensional data together with its coordinates.
///
/// Coordinates per dimension are either a 1-D vector valid across the whole
/// domain, or an n-D array shaped like `data` (with the own dimension one
/// longer for interface coordinates).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Slice {
    pub dimensions: Vec<String>,
    pub data: Option<ArrayD<f64>>,
    pub coords: Vec<Option<ArrayD<f64>>>,
    pub coords_stag: Vec<Option<ArrayD<f64>>>,
    pub lbound: Option<ArrayD<f64>>,
    pub ubound: Option<ArrayD<f64>>,
    /// Dimensions that were collapsed to a single coordinate, with that coordinate.
    pub fixedcoords: Vec<(String, f64)>,
}

impl Slice {
    /// An empty slice over `dimensions`. It is invalid until data and
    /// coordinates are filled in.
    pub fn new(dimensions: Vec<String>) -> Self {
        let ndim = dimensions.len();
        Self {
            dimensions,
            data: None,
            coords: vec![None; ndim],
            coords_stag: vec![None; ndim],
            lbound: None,
            ubound: None,
            fixedcoords: Vec::new(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    /// Valid slices have at least one dimension, data and both coordinate
    /// sets for every dimension. A valid slice may still hold zero values.
    pub fn is_valid(&self) -> bool {
        self.ndim() > 0
            && self.data.is_some()
            && self.coords.iter().all(Option::is_some)
            && self.coords_stag.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.data.as_ref().map_or(true, |data| data.is_empty())
    }

    pub fn shape(&self) -> &[usize] {
        self.data.as_ref().map_or(&[], |data| data.shape())
    }

    /// Derives interface coordinates from the 1-D center coordinates of every dimension.
    pub fn generate_staggered(&mut self) -> Result<(), VariableError> {
        for (idim, dim) in self.dimensions.iter().enumerate() {
            let centers = self.coords[idim]
                .as_ref()
                .ok_or_else(|| VariableError::MissingCoordinates(dim.clone()))?;
            let centers = centers
                .view()
                .into_dimensionality::<Ix1>()
                .map_err(|_| VariableError::MultiDimensionalCoordinates(dim.clone()))?;
            self.coords_stag[idim] = Some(staggered(centers).into_dyn());
        }
        Ok(())
    }

    /// Drops every dimension of length one, recording its coordinate in
    /// `fixedcoords`. Invalid slices are returned unchanged.
    pub fn squeeze(self) -> Slice {
        let Some(data) = &self.data else {
            return self;
        };
        if !self.is_valid() {
            return self;
        }
        let singletons: Vec<usize> = data
            .shape()
            .iter()
            .enumerate()
            .filter(|(_, &len)| len == 1)
            .map(|(idim, _)| idim)
            .collect();
        if singletons.is_empty() {
            return self;
        }

        let Slice {
            dimensions,
            data,
            coords,
            coords_stag,
            lbound,
            ubound,
            mut fixedcoords,
        } = self;

        let squeeze_coords = |coords: Vec<Option<ArrayD<f64>>>| -> Vec<Option<ArrayD<f64>>> {
            coords
                .into_iter()
                .enumerate()
                .filter(|(idim, _)| !singletons.contains(idim))
                .map(|(_, c)| c.map(|c| squeeze_coordinate(c, &singletons)))
                .collect()
        };

        for &idim in &singletons {
            let value = coords[idim]
                .as_ref()
                .and_then(|c| c.iter().next().copied())
                .unwrap_or(f64::NAN);
            fixedcoords.push((dimensions[idim].clone(), value));
        }

        Slice {
            dimensions: dimensions
                .into_iter()
                .enumerate()
                .filter(|(idim, _)| !singletons.contains(idim))
                .map(|(_, dim)| dim)
                .collect(),
            data: data.map(|d| remove_axes(d, &singletons)),
            coords: squeeze_coords(coords),
            coords_stag: squeeze_coords(coords_stag),
            lbound: lbound.map(|b| remove_axes(b, &singletons)),
            ubound: ubound.map(|b| remove_axes(b, &singletons)),
            fixedcoords,
        }
    }
}

/// 1-D coordinates are kept as they are; n-D coordinates lose the same axes as the data.
fn squeeze_coordinate(coords: ArrayD<f64>, singletons: &[usize]) -> ArrayD<f64> {
    if coords.ndim() == 1 {
        coords
    } else {
        remove_axes(coords, singletons)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array, IxDyn};
    use proptest::prelude::*;

    use super::*;

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn grid_slice(shape: &[usize]) -> Slice {
        let names: Vec<String> = (0..shape.len()).map(|i| format!("d{i}")).collect();
        let mut slice = Slice::new(names);
        let len: usize = shape.iter().product();
        slice.data = Some(Array::from_shape_vec(IxDyn(shape), (0..len).map(|v| v as f64).collect()).unwrap());
        for (idim, &n) in shape.iter().enumerate() {
            slice.coords[idim] = Some(Array::from_iter((0..n).map(|v| v as f64 * 2.0)).into_dyn());
        }
        slice.generate_staggered().unwrap();
        slice
    }

    #[test]
    fn validity() {
        let mut slice = Slice::new(dims(&["x"]));
        assert!(!slice.is_valid());
        slice.data = Some(array![1.0, 2.0].into_dyn());
        slice.coords[0] = Some(array![0.0, 1.0].into_dyn());
        assert!(!slice.is_valid());
        slice.generate_staggered().unwrap();
        assert!(slice.is_valid());
        assert_eq!(slice.coords_stag[0], Some(array![-0.5, 0.5, 1.5].into_dyn()));

        assert!(!Slice::new(Vec::new()).is_valid());
    }

    #[test]
    fn staggered_requires_1d_centers() {
        let mut slice = Slice::new(dims(&["x", "y"]));
        slice.coords[0] = Some(array![[0.0, 1.0], [0.0, 1.0]].into_dyn());
        slice.coords[1] = Some(array![0.0, 1.0].into_dyn());
        assert!(matches!(
            slice.generate_staggered(),
            Err(VariableError::MultiDimensionalCoordinates(dim)) if dim == "x"
        ));

        let mut slice = Slice::new(dims(&["x"]));
        assert!(matches!(
            slice.generate_staggered(),
            Err(VariableError::MissingCoordinates(_))
        ));
    }

    #[test]
    fn squeeze_records_fixed_coordinates() {
        let slice = grid_slice(&[1, 3, 1]).squeeze();
        assert_eq!(slice.dimensions, dims(&["d1"]));
        assert_eq!(slice.data, Some(array![0.0, 1.0, 2.0].into_dyn()));
        assert_eq!(slice.coords[0], Some(array![0.0, 2.0, 4.0].into_dyn()));
        assert_eq!(slice.coords_stag[0], Some(array![-1.0, 1.0, 3.0, 5.0].into_dyn()));
        assert_eq!(
            slice.fixedcoords,
            vec![("d0".to_string(), 0.0), ("d2".to_string(), 0.0)]
        );
    }

    #[test]
    fn squeeze_bounds_and_nd_coordinates() {
        let mut slice = Slice::new(dims(&["t", "z"]));
        slice.data = Some(array![[1.0, 2.0]].into_dyn());
        slice.lbound = Some(array![[0.0, 1.0]].into_dyn());
        slice.coords[0] = Some(array![5.0].into_dyn());
        slice.coords[1] = Some(array![[-1.0, -2.0]].into_dyn());
        slice.coords_stag[0] = Some(array![4.5, 5.5].into_dyn());
        slice.coords_stag[1] = Some(array![[-0.5, -1.5, -2.5]].into_dyn());

        let slice = slice.squeeze();
        assert_eq!(slice.dimensions, dims(&["z"]));
        assert_eq!(slice.lbound, Some(array![0.0, 1.0].into_dyn()));
        assert_eq!(slice.coords[0], Some(array![-1.0, -2.0].into_dyn()));
        assert_eq!(slice.coords_stag[0], Some(array![-0.5, -1.5, -2.5].into_dyn()));
        assert_eq!(slice.fixedcoords, vec![("t".to_string(), 5.0)]);
    }

    #[test]
    fn zero_length_dimensions_stay() {
        let slice = grid_slice(&[0, 2]).squeeze();
        assert!(slice.is_valid());
        assert!(slice.is_empty());
        assert_eq!(slice.shape(), &[0, 2]);
    }

    proptest! {
        #[test]
        fn squeeze_is_idempotent(shape in prop::collection::vec(1usize..4, 1..4)) {
            let once = grid_slice(&shape).squeeze();
            let twice = once.clone().squeeze();
            prop_assert_eq!(&once.dimensions, &twice.dimensions);
            prop_assert_eq!(&once.data, &twice.data);
        }
    }
}
