use ndarray::{Array1, ArrayD, Ix1};
use tracing::instrument;

use super::{
    reduce::impl_name_overrides, AnyVariable, DimBounds, DimensionInfo, ReduceDimension, Variable,
    VariableError,
};
use crate::{
    common::array::{flatten_axes, staggered},
    slice::Slice,
};

/// Folds one dimension into another: every coordinate of the target
/// dimension is repeated once per coordinate of the folded dimension.
#[derive(Debug, Clone)]
pub struct VariableFlat {
    reduce: ReduceDimension,
    target: String,
    itarget: usize,
}

impl VariableFlat {
    pub fn new(source: AnyVariable, dimension: &str, target: &str) -> Result<Self, VariableError> {
        if dimension == target {
            return Err(VariableError::FlattenIntoSelf(dimension.to_string()));
        }
        let itarget = source
            .dimensions()
            .iter()
            .position(|d| d == target)
            .ok_or_else(|| VariableError::DimensionNotFound {
                variable: source.name().to_string(),
                dimension: target.to_string(),
            })?;
        let label = source.dimension_info(dimension).label;
        Ok(Self {
            reduce: ReduceDimension::new(source, dimension, "flat_", &format!("{label}-combined "))?,
            target: target.to_string(),
            itarget,
        })
    }

    /// Id of the dimension that absorbs the folded one.
    pub fn target(&self) -> &str {
        &self.target
    }

    fn one_dimensional<'a>(
        &self,
        slice: &'a Slice,
        idim: usize,
    ) -> Result<ndarray::ArrayView1<'a, f64>, VariableError> {
        let dimension = &slice.dimensions[idim];
        slice.coords[idim]
            .as_ref()
            .ok_or_else(|| VariableError::MissingCoordinates(dimension.clone()))?
            .view()
            .into_dimensionality::<Ix1>()
            .map_err(|_| VariableError::MultiDimensionalCoordinates(dimension.clone()))
    }
}

impl_name_overrides!(VariableFlat);

impl Variable for VariableFlat {
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

    #[instrument(level = "debug", skip_all, fields(variable = %self.reduce.name))]
    fn slice(&self, bounds: &[DimBounds]) -> Result<Slice, VariableError> {
        let reduce = &self.reduce;
        let source_bounds = reduce.source_bounds(bounds, DimBounds::unbounded())?;
        let source = reduce.source.slice(&source_bounds)?;

        let mut slice = Slice::new(self.dimensions());
        if !source.is_valid() {
            return Ok(slice);
        }

        let idim = reduce.idimension;
        let folded = self.one_dimensional(&source, idim)?;
        let target = self.one_dimensional(&source, self.itarget)?;
        let fold = |arr: &ArrayD<f64>| flatten_axes(arr.view(), idim, self.itarget);

        slice.data = source.data.as_ref().map(fold);
        slice.lbound = source.lbound.as_ref().map(fold);
        slice.ubound = source.ubound.as_ref().map(fold);

        for (isource, (coords, coords_stag)) in
            source.coords.iter().zip(&source.coords_stag).enumerate()
        {
            let Some(inew) = reduce.reduced_index(isource) else {
                continue;
            };
            if isource == self.itarget {
                let repeated = Array1::from_iter(
                    target
                        .iter()
                        .flat_map(|&c| std::iter::repeat(c).take(folded.len())),
                );
                slice.coords_stag[inew] = Some(staggered(repeated.view()).into_dyn());
                slice.coords[inew] = Some(repeated.into_dyn());
            } else {
                let keep = |c: &ArrayD<f64>| if c.ndim() == 1 { c.clone() } else { fold(c) };
                slice.coords[inew] = coords.as_ref().map(keep);
                slice.coords_stag[inew] = coords_stag.as_ref().map(keep);
            }
        }
        slice.fixedcoords = source.fixedcoords.clone();
        Ok(slice)
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.reduce.dimension_info(dimension)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2, Array3};
    use proptest::prelude::*;

    use super::*;
    use crate::variable::{test_util, SourceVariable};

    #[test]
    fn folds_into_target() {
        let flat = VariableFlat::new(test_util::field(2, 3), "x", "z").unwrap();
        assert_eq!(flat.name(), "flat_field");
        assert_eq!(flat.long_name(), "x-combined field");
        assert_eq!(flat.dimensions(), vec!["z".to_string()]);

        let slice = flat.slice(&[DimBounds::unbounded()]).unwrap();
        assert!(slice.is_valid());
        assert_eq!(
            slice.data,
            Some(array![0.0, 10.0, 1.0, 11.0, 2.0, 12.0].into_dyn())
        );
        assert_eq!(
            slice.coords[0],
            Some(array![0.0, 0.0, 0.5, 0.5, 1.0, 1.0].into_dyn())
        );
        assert_eq!(slice.coords_stag[0].as_ref().map(|c| c.len()), Some(7));
    }

    #[test]
    fn target_before_folded_dimension() {
        let data = Array3::from_shape_fn((2, 3, 2), |(a, b, c)| (100 * a + 10 * b + c) as f64);
        let var: AnyVariable = SourceVariable::builder("v", ["a", "b", "c"], data.into_dyn())
            .build()
            .unwrap()
            .into();
        let flat = VariableFlat::new(var, "c", "a").unwrap();
        assert_eq!(flat.dimensions(), vec!["a".to_string(), "b".to_string()]);
        let slice = flat
            .slice(&[DimBounds::unbounded(), DimBounds::unbounded()])
            .unwrap();
        assert_eq!(slice.shape(), &[4, 3]);
        let data = slice.data.unwrap();
        // a = 1, c = 1 lands at row 1 * 2 + 1
        assert_eq!(data[[3, 2]], 121.0);
        assert_eq!(data[[2, 0]], 100.0);
    }

    #[test]
    fn invalid_construction() {
        assert!(matches!(
            VariableFlat::new(test_util::field(2, 2), "x", "x"),
            Err(VariableError::FlattenIntoSelf(_))
        ));
        assert!(matches!(
            VariableFlat::new(test_util::field(2, 2), "x", "y"),
            Err(VariableError::DimensionNotFound { .. })
        ));
    }

    #[test]
    fn wrong_bounds_count() {
        let flat = VariableFlat::new(test_util::field(2, 2), "x", "z").unwrap();
        assert!(matches!(flat.slice(&[]), Err(VariableError::WrongBoundsCount { .. })));
    }

    proptest! {
        #[test]
        fn flatten_round_trip(na in 1usize..6, nb in 1usize..6) {
            let data = Array2::from_shape_fn((na, nb), |(a, b)| (a * 31 + b * 7) as f64);
            let var: AnyVariable = SourceVariable::builder("v", ["a", "b"], data.clone().into_dyn())
                .build()
                .unwrap()
                .into();
            let flat = VariableFlat::new(var, "a", "b").unwrap();
            let slice = flat.slice(&[DimBounds::unbounded()]).unwrap();
            let back = slice.data.unwrap().into_shape((nb, na)).unwrap();
            for a in 0..na {
                for b in 0..nb {
                    prop_assert_eq!(back[[b, a]], data[[a, b]]);
                }
            }
        }
    }
}
