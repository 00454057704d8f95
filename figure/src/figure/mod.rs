use std::{collections::HashMap, path::Path};

use tracing::debug;
use varplot_core::AnyStore;

use crate::{
    backend::PlotBackend,
    err::FigureError,
    properties::{FigureProperties, Keyed, SeriesProperties},
};

mod update;

#[cfg(test)]
mod tests;

/// Dots per inch used by [`Figure::export_to_file`] callers that do not care.
pub const DEFAULT_DPI: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FigureEvent {
    /// Fired after every completed update with whether any series was drawn.
    CompleteStateChange,
}

type Callback = Box<dyn FnMut(bool)>;

/// Registered data sources by name. The first one added is the default.
#[derive(Debug, Default)]
pub(crate) struct Sources {
    stores: HashMap<String, AnyStore>,
    default: Option<String>,
}

/// A plot assembled from variable stores and drawn onto a [`PlotBackend`].
///
/// Settings live in two property trees: the forced one holds explicit user
/// choices and the default one is recomputed by every update. Any change to
/// the forced tree triggers an update, unless updates are suspended with
/// [`Figure::set_updating`], in which case a single update runs once they
/// are re-enabled.
pub struct Figure<B> {
    backend: B,
    properties: FigureProperties,
    default_properties: FigureProperties,
    sources: Sources,
    updating: bool,
    dirty: bool,
    has_changed: bool,
    callbacks: Vec<(FigureEvent, Callback)>,
}

impl<B: PlotBackend> Figure<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            properties: FigureProperties::default(),
            default_properties: FigureProperties::initial_defaults(),
            sources: Sources::default(),
            updating: true,
            dirty: false,
            has_changed: false,
            callbacks: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Explicitly set properties.
    pub fn properties(&self) -> &FigureProperties {
        &self.properties
    }

    /// Defaults computed by the last update.
    pub fn default_properties(&self) -> &FigureProperties {
        &self.default_properties
    }

    pub fn register_callback(&mut self, event: FigureEvent, callback: impl FnMut(bool) + 'static) {
        self.callbacks.push((event, Box::new(callback)));
    }

    /// Enables or suspends updates and returns the previous setting.
    /// Re-enabling runs the update that was deferred while suspended.
    pub fn set_updating(&mut self, updating: bool) -> Result<bool, FigureError> {
        let old = self.updating;
        if old != updating {
            self.updating = updating;
            if updating && self.dirty {
                self.update()?;
            }
        }
        Ok(old)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the forced properties changed since creation or the last
    /// [`Figure::reset_changed`].
    pub fn has_changed(&self) -> bool {
        self.has_changed
    }

    pub fn reset_changed(&mut self) {
        self.has_changed = false;
    }

    pub fn clear_sources(&mut self) {
        self.sources = Sources::default();
    }

    pub fn add_data_source(&mut self, name: impl Into<String>, store: impl Into<AnyStore>) {
        let name = name.into();
        if self.sources.default.is_none() {
            self.sources.default = Some(name.clone());
        }
        self.sources.stores.insert(name, store.into());
    }

    pub fn default_source(&self) -> Option<&str> {
        self.sources.default.as_deref()
    }

    /// Adds a series for `name` from `source` (the default source when
    /// `None`). With `replace` an existing series for the same variable is
    /// reused instead of adding a second one.
    pub fn add_variable(
        &mut self,
        name: &str,
        source: Option<&str>,
        replace: bool,
    ) -> Result<(), FigureError> {
        let id = format!("{}/{}", source.unwrap_or_default(), name);
        if replace {
            self.properties.series.get_or_create(&id);
            self.default_properties.series.get_or_create(&id);
        } else {
            self.properties.series.push(SeriesProperties::with_id(&id));
            self.default_properties.series.push(SeriesProperties::with_id(&id));
        }
        self.property_changed()
    }

    pub fn clear_variables(&mut self) -> Result<(), FigureError> {
        self.properties.series.clear();
        self.property_changed()
    }

    /// Replaces the forced properties.
    pub fn set_properties(&mut self, properties: FigureProperties) -> Result<(), FigureError> {
        self.properties = properties;
        self.property_changed()
    }

    /// Unsets every forced property. With `delete_optional` the series,
    /// axis and dimension entries go as well, leaving an empty figure.
    pub fn clear_properties(&mut self, delete_optional: bool) -> Result<(), FigureError> {
        self.properties.clear_values(delete_optional);
        self.property_changed()
    }

    /// Applies `edit` to the forced properties, then updates.
    pub fn edit_properties(
        &mut self,
        edit: impl FnOnce(&mut FigureProperties),
    ) -> Result<(), FigureError> {
        edit(&mut self.properties);
        self.property_changed()
    }

    fn property_changed(&mut self) -> Result<(), FigureError> {
        self.has_changed = true;
        self.update()
    }

    /// Rebuilds the figure from the current properties and sources.
    ///
    /// While updates are suspended this only marks the figure dirty.
    pub fn update(&mut self) -> Result<(), FigureError> {
        if !self.updating {
            debug!("Updates suspended, deferring figure update");
            self.dirty = true;
            return Ok(());
        }

        let plotted = update::render(
            &mut self.backend,
            &self.properties,
            &mut self.default_properties,
            &self.sources,
        )?;

        for (event, callback) in &mut self.callbacks {
            if *event == FigureEvent::CompleteStateChange {
                callback(plotted);
            }
        }
        self.dirty = false;
        Ok(())
    }

    pub fn export_to_file(&self, path: impl AsRef<Path>, dpi: u32) -> Result<(), FigureError> {
        Ok(self.backend.export(path.as_ref(), dpi)?)
    }
}

impl Sources {
    fn resolve<'a>(&'a self, source: &'a str, variable: &str) -> Result<(&'a str, &'a AnyStore), FigureError> {
        let source = if source.is_empty() {
            self.default
                .as_deref()
                .ok_or_else(|| FigureError::NoDefaultSource {
                    variable: variable.to_string(),
                })?
        } else {
            source
        };
        let store = self
            .stores
            .get(source)
            .ok_or_else(|| FigureError::UnknownSource(source.to_string()))?;
        Ok((source, store))
    }
}
