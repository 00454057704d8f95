use super::{check_bounds_count, AnyVariable, DimBounds, DimensionInfo, Variable, VariableError};

/// Shared state of transforms that remove one dimension of their source.
#[derive(Debug, Clone)]
pub struct ReduceDimension {
    pub(super) source: Box<AnyVariable>,
    pub(super) dimension: String,
    pub(super) idimension: usize,
    pub(super) name: String,
    pub(super) long_name: String,
}

impl ReduceDimension {
    /// Resolves `dimension` in the source. Name and long name are the
    /// source's, each with the given prefix.
    pub fn new(
        source: AnyVariable,
        dimension: &str,
        name_prefix: &str,
        long_name_prefix: &str,
    ) -> Result<Self, VariableError> {
        let idimension = source
            .dimensions()
            .iter()
            .position(|d| d == dimension)
            .ok_or_else(|| VariableError::DimensionNotFound {
                variable: source.name().to_string(),
                dimension: dimension.to_string(),
            })?;
        Ok(Self {
            name: format!("{name_prefix}{}", source.name()),
            long_name: format!("{long_name_prefix}{}", source.long_name()),
            source: Box::new(source),
            dimension: dimension.to_string(),
            idimension,
        })
    }

    pub fn source(&self) -> &AnyVariable {
        &self.source
    }

    /// Id of the removed dimension.
    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    /// Position of the removed dimension in the source.
    pub fn idimension(&self) -> usize {
        self.idimension
    }

    pub fn dimensions(&self) -> Vec<String> {
        let mut dimensions = self.source.dimensions();
        dimensions.remove(self.idimension);
        dimensions
    }

    pub fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.source.dimension_info(dimension)
    }

    /// Source bounds: the given ones with `removed` inserted for the removed dimension.
    pub(super) fn source_bounds(
        &self,
        bounds: &[DimBounds],
        removed: DimBounds,
    ) -> Result<Vec<DimBounds>, VariableError> {
        check_bounds_count(&self.name, bounds, self.dimensions().len())?;
        let mut source_bounds = bounds.to_vec();
        source_bounds.insert(self.idimension, removed);
        Ok(source_bounds)
    }

    /// Maps a source dimension index to its index after the reduction.
    pub(super) fn reduced_index(&self, idim: usize) -> Option<usize> {
        match idim {
            i if i == self.idimension => None,
            i if i > self.idimension => Some(i - 1),
            i => Some(i),
        }
    }
}

/// Adds `with_name`/`with_long_name` overrides to a transform holding a `reduce` field.
macro_rules! impl_name_overrides {
    ($ty:ty) => {
        impl $ty {
            pub fn with_name(mut self, name: impl Into<String>) -> Self {
                self.reduce.name = name.into();
                self
            }

            pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
                self.reduce.long_name = long_name.into();
                self
            }

            pub fn reduce(&self) -> &$crate::variable::ReduceDimension {
                &self.reduce
            }
        }
    };
}

pub(super) use impl_name_overrides;
