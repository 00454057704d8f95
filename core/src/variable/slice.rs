use ndarray::{ArrayD, Axis, Ix1};
use tracing::{debug, instrument};

use super::{
    reduce::impl_name_overrides, AnyVariable, DimBounds, DimensionInfo, ReduceDimension, Variable,
    VariableError,
};
use crate::{
    common::array::{interp_axis, search_sorted_left},
    slice::Slice,
};

/// Takes the source at a fixed coordinate of one dimension, interpolating
/// linearly between the two grid points around it.
#[derive(Debug, Clone)]
pub struct VariableSlice {
    reduce: ReduceDimension,
    value: f64,
}

impl VariableSlice {
    pub fn new(source: AnyVariable, dimension: &str, value: f64) -> Result<Self, VariableError> {
        Ok(Self {
            reduce: ReduceDimension::new(source, dimension, "", "")?,
            value,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl_name_overrides!(VariableSlice);

impl Variable for VariableSlice {
    fn name(&self) -> &str {
        &self.reduce.name
    }

    fn long_name(&self) -> &str {
        &self.reduce.long_name
    }

    fn unit(&self) -> &str {
        self.reduce.source.unit()
    }

    fn dimensions(&self) -> Vec<String> {
        self.reduce.dimensions()
    }

    #[instrument(level = "debug", skip_all, fields(variable = %self.reduce.name, at = self.value))]
    fn slice(&self, bounds: &[DimBounds]) -> Result<Slice, VariableError> {
        let reduce = &self.reduce;
        let source_bounds = reduce.source_bounds(bounds, DimBounds::at(self.value))?;
        let source = reduce.source.slice(&source_bounds)?;

        let mut slice = Slice::new(self.dimensions());
        if !source.is_valid() {
            return Ok(slice);
        }

        let idim = reduce.idimension;
        let axis = Axis(idim);
        let coords = source.coords[idim]
            .as_ref()
            .ok_or_else(|| VariableError::MissingCoordinates(reduce.dimension.clone()))?
            .view()
            .into_dimensionality::<Ix1>()
            .map_err(|_| VariableError::MultiDimensionalCoordinates(reduce.dimension.clone()))?;

        let ipos = search_sorted_left(coords, self.value);
        if ipos == 0 || ipos >= coords.len() {
            debug!("Coordinate outside of the source range");
            return Ok(slice);
        }
        let (left, right) = (ipos - 1, ipos);
        let rel = (self.value - coords[left]) / (coords[right] - coords[left]);
        let interp = |arr: &ArrayD<f64>| interp_axis(arr.view(), axis, left, right, rel);

        slice.data = source.data.as_ref().map(interp);
        slice.lbound = source.lbound.as_ref().map(interp);
        slice.ubound = source.ubound.as_ref().map(interp);

        let keep = |c: &ArrayD<f64>| if c.ndim() == 1 { c.clone() } else { interp(c) };
        for (isource, (coords, coords_stag)) in
            source.coords.iter().zip(&source.coords_stag).enumerate()
        {
            if let Some(itarget) = reduce.reduced_index(isource) {
                slice.coords[itarget] = coords.as_ref().map(keep);
                slice.coords_stag[itarget] = coords_stag.as_ref().map(keep);
            }
        }

        slice.fixedcoords = source.fixedcoords;
        slice.fixedcoords.push((reduce.dimension.clone(), self.value));
        Ok(slice)
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.reduce.dimension_info(dimension)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;
    use crate::variable::test_util;

    #[test]
    fn interpolates_between_grid_points() {
        let sliced = VariableSlice::new(test_util::temp(), "time", 0.5).unwrap();
        assert!(sliced.dimensions().is_empty());
        assert_eq!(sliced.name(), "temp");
        assert_eq!(sliced.unit(), "degC");

        // zero-dimensional result: invalid as a plot slice but carrying the value
        let slice = sliced.slice(&[]).unwrap();
        assert_abs_diff_eq!(slice.data.unwrap()[[]], 11.0);
        assert_eq!(slice.fixedcoords, vec![("time".to_string(), 0.5)]);
    }

    #[test]
    fn exact_at_interior_nodes() {
        let sliced = VariableSlice::new(test_util::field(4, 3), "x", 2.0).unwrap();
        let slice = sliced.slice(&[DimBounds::unbounded()]).unwrap();
        assert!(slice.is_valid());
        assert_eq!(slice.dimensions, vec!["z".to_string()]);
        assert_eq!(slice.data, Some(array![20.0, 21.0, 22.0].into_dyn()));
        assert_eq!(slice.coords[0], Some(array![0.0, 0.5, 1.0].into_dyn()));
    }

    #[test]
    fn inner_dimension() {
        let sliced = VariableSlice::new(test_util::field(2, 3), "z", 0.25).unwrap();
        let slice = sliced.slice(&[DimBounds::unbounded()]).unwrap();
        assert_eq!(slice.data, Some(array![0.5, 10.5].into_dyn()));
    }

    #[test]
    fn edges() {
        let field = test_util::field(3, 2);
        let at_first = VariableSlice::new(field.clone(), "x", 0.0).unwrap();
        assert!(!at_first.slice(&[DimBounds::unbounded()]).unwrap().is_valid());

        let beyond = VariableSlice::new(field.clone(), "x", 7.0).unwrap();
        assert!(!beyond.slice(&[DimBounds::unbounded()]).unwrap().is_valid());

        let at_last = VariableSlice::new(field, "x", 2.0).unwrap();
        let slice = at_last.slice(&[DimBounds::unbounded()]).unwrap();
        assert_eq!(slice.data, Some(array![20.0, 21.0].into_dyn()));
    }

    #[test]
    fn nd_coordinates_are_rejected() {
        let data = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
        let var: AnyVariable = crate::variable::SourceVariable::builder("v", ["a", "b"], data.clone())
            .coords("a", data.clone())
            .coords_stag("a", array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]].into_dyn())
            .build()
            .unwrap()
            .into();
        let sliced = VariableSlice::new(var, "a", 1.5).unwrap();
        assert!(matches!(
            sliced.slice(&[DimBounds::unbounded()]),
            Err(VariableError::MultiDimensionalCoordinates(_))
        ));
    }
}
