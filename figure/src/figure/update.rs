use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayD, ArrayView1, Axis, Ix1, Ix2};
use tracing::{debug, instrument, warn};
use varplot_core::{
    common::{
        arr_meta::ArrayStats,
        array::staggered,
        range::{union, RangeIncl},
    },
    variable::{DataType, DimensionInfo, PreferredAxis, VariableError, VariableSlice},
    DimBounds, Variable, VariableStore,
};

use super::Sources;
use crate::{
    backend::{
        ArtistId, AxisRole, ContourStyle, EdgeStyle, ErrorBars, FontSpec, Mesh, PlotBackend,
        TickSpec,
    },
    err::FigureError,
    properties::{pick, AxisProperties, FigureProperties},
    style::{Color, ConfidenceStyle, LineProperties, MarkerType, PlotType3D},
    time::{num_to_date, time_tick_settings},
};

const TITLE_SIZE: f64 = 10.0;
const LABEL_SIZE: f64 = 8.0;
const TICK_SIZE: f64 = 8.0;
const LEGEND_SIZE: f64 = 8.0;

/// Opacity of shaded confidence bands.
const BAND_ALPHA: f64 = 0.7;

/// What is known about one dimension (or one series' value axis) during an update.
#[derive(Debug, Clone)]
struct DimData {
    forced: DimBounds,
    label: String,
    unit: String,
    preferred_axis: Option<PreferredAxis>,
    datatype: DataType,
    /// Axis limits hug the data instead of following the backend's choice.
    tight: bool,
    datarange: Option<RangeIncl<f64>>,
    axis: Option<AxisRole>,
}

impl DimData {
    fn new(key: &str) -> Self {
        Self {
            forced: DimBounds::unbounded(),
            label: key.to_string(),
            unit: String::new(),
            preferred_axis: None,
            datatype: DataType::Float,
            tight: true,
            datarange: None,
            axis: None,
        }
    }

    fn apply_info(&mut self, info: DimensionInfo) {
        self.label = info.label;
        self.unit = info.unit;
        self.preferred_axis = info.preferred_axis;
        self.datatype = info.datatype;
    }

    fn extend_range(&mut self, range: RangeIncl<f64>) {
        self.datarange = Some(union(self.datarange, range));
    }
}

/// Dimensions in order of first appearance.
#[derive(Debug, Default)]
struct DimTable {
    entries: Vec<(String, DimData)>,
}

impl DimTable {
    fn get(&self, key: &str) -> Option<&DimData> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, d)| d)
    }

    fn entry(&mut self, key: &str) -> &mut DimData {
        let pos = match self.entries.iter().position(|(k, _)| k == key) {
            Some(pos) => pos,
            None => {
                self.entries.push((key.to_string(), DimData::new(key)));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    fn preferred_axis(&self, key: &str) -> Option<PreferredAxis> {
        self.get(key).and_then(|d| d.preferred_axis)
    }

    /// Dimension shown on each axis. Later entries win.
    fn axes(&self) -> BTreeMap<AxisRole, &str> {
        self.entries
            .iter()
            .filter_map(|(key, data)| Some((data.axis?, key.as_str())))
            .collect()
    }
}

struct Fonts {
    title: FontSpec,
    label: FontSpec,
    tick: FontSpec,
    legend: FontSpec,
}

impl Fonts {
    fn new(forced: &FigureProperties, defaults: &FigureProperties) -> Self {
        let scaling = pick(&forced.font_scaling, &defaults.font_scaling).unwrap_or(100.0) / 100.0;
        let family = pick(&forced.font_name, &defaults.font_name).unwrap_or_else(|| "sans-serif".to_string());
        let font = |size: f64| FontSpec::new(family.clone(), size * scaling);
        Self {
            title: font(TITLE_SIZE),
            label: font(LABEL_SIZE),
            tick: font(TICK_SIZE),
            legend: font(LEGEND_SIZE),
        }
    }
}

/// Rebuilds the figure on `backend`. Computed defaults are written to
/// `defaults`; entries for series and axes that are no longer drawn are
/// removed from it. Returns whether any series was drawn.
#[instrument(level = "debug", skip_all, fields(series = forced.series.len()))]
pub(super) fn render<B: PlotBackend>(
    backend: &mut B,
    forced: &FigureProperties,
    defaults: &mut FigureProperties,
    sources: &Sources,
) -> Result<bool, FigureError> {
    backend.clear();

    let fonts = Fonts::new(forced, defaults);
    let colormap = pick(&forced.color_map, &defaults.color_map).unwrap_or_default();

    let mut dims = DimTable::default();
    for dimension in &forced.dimensions {
        dims.entry(&dimension.id).forced = dimension.bounds();
    }

    let forced_colorbar = forced.axes.get(AxisRole::Colorbar.id());
    let colorbar_log = forced_colorbar.and_then(|a| a.log_scale).unwrap_or(false);
    let colorbar_range = forced_colorbar.map_or((None, None), |a| a.range(false));

    let mut stale_series = defaults.series.ids();
    let mut titles: Vec<String> = Vec::new();
    let mut legend: Vec<(ArtistId, String)> = Vec::new();
    let mut colorbar: Option<ArtistId> = None;
    let mut has_color_map = false;
    let mut zorder = 0;
    let mut line_count = 0usize;
    let mut mesh_count = 0usize;

    for (iseries, series) in forced.series.iter().enumerate() {
        let varpath = series.id.as_str();
        if varpath.is_empty() {
            warn!("Skipping data series {iseries} because its source/variable id is not set");
            continue;
        }
        let (source, name) = varpath
            .split_once('/')
            .ok_or_else(|| FigureError::MalformedSeriesId(varpath.to_string()))?;
        let (source, store) = sources.resolve(source, name)?;
        let mut variable = store
            .variable(name)
            .ok_or_else(|| FigureError::MissingVariable {
                store: source.to_string(),
                variable: name.to_string(),
            })?;
        let long_name = variable.long_name().to_string();

        let def = defaults.series.get_or_create(varpath);
        def.label = Some(long_name.clone());
        def.plot_type_3d = Some(PlotType3D::Pseudocolor);
        def.has_confidence_limits = Some(false);
        def.line = LineProperties::defaults(Color::LINE_CYCLE[0]);
        def.show_edges = Some(false);
        def.use_color_map = Some(true);
        def.edge_color = Some(Color::BLACK);
        def.edge_width = Some(1.0);
        let label = pick(&series.label, &def.label).unwrap_or_default();

        stale_series.retain(|id| id != varpath);
        titles.push(label.clone());

        // Degenerate forced ranges take a slice through the dimension.
        let original_dims = variable.dimensions();
        let mut bounds = Vec::with_capacity(original_dims.len());
        for dim in &original_dims {
            let forced_bounds = dims.get(dim).map(|d| d.forced).unwrap_or_default();
            match forced_bounds.degenerate_value() {
                Some(value) => variable = VariableSlice::new(variable, dim, value)?.into(),
                None => bounds.push(forced_bounds),
            }
        }

        let slice = variable.slice(&bounds)?;
        if !slice.is_valid() {
            debug!("No data for series {varpath}, skipping");
            continue;
        }

        for dim in &original_dims {
            let info = variable.dimension_info(dim);
            dims.entry(dim).apply_info(info);
        }
        let value_axis = dims.entry(varpath);
        value_axis.label = variable.long_name().to_string();
        value_axis.unit = variable.unit().to_string();
        value_axis.datatype = DataType::Float;
        value_axis.tight = false;

        let mut slice = slice.squeeze();
        let Some(data) = slice.data.as_mut() else {
            continue;
        };
        let Some(stats) = ArrayStats::new(data.iter().copied()) else {
            debug!("Series {varpath} has no finite values, skipping");
            continue;
        };
        if stats.non_finite > 0 {
            warn!(
                "Masking {} invalid values (inf or nan) out of {} in {}",
                stats.non_finite,
                data.len(),
                varpath
            );
            data.mapv_inplace(|v| if v.is_finite() { v } else { f64::NAN });
        }
        let data = data.clone();
        let datarange = stats.range;

        def.dimension_count = Some(slice.ndim());
        let plot_type = pick(&series.plot_type_3d, &def.plot_type_3d).unwrap_or_default();
        let staggered_grid = slice.ndim() == 2 && plot_type == PlotType3D::Pseudocolor;
        let grid_coords = if staggered_grid {
            &slice.coords_stag
        } else {
            &slice.coords
        };

        dims.entry(varpath).datarange = Some(datarange);
        for (idim, dim) in slice.dimensions.iter().enumerate() {
            if let Some(range) = grid_coords[idim].as_ref().and_then(|c| coordinate_range(c, idim)) {
                dims.entry(dim).extend_range(range);
            }
        }

        match slice.ndim() {
            1 => {
                let dim = slice.dimensions[0].as_str();
                let coords = coords_1d(&slice.coords[0], dim)?;
                let values = data.view().into_dimensionality::<Ix1>().map_err(VariableError::from)?;
                let switch_axes = dims.preferred_axis(dim) == Some(PreferredAxis::Y);
                let (x, y) = if switch_axes {
                    (values.view(), coords.view())
                } else {
                    (coords.view(), values.view())
                };

                let color = Color::LINE_CYCLE[line_count % Color::LINE_CYCLE.len()];
                def.line.color = Some(color);
                def.line.marker_face_color = Some(color);
                let style = series.line.resolve(&def.line);

                let has_limits = slice.lbound.is_some() || slice.ubound.is_some();
                def.has_confidence_limits = Some(has_limits);
                if has_limits {
                    let lower = bound_1d(slice.lbound.as_ref(), &values)?;
                    let upper = bound_1d(slice.ubound.as_ref(), &values)?;
                    let marker = pick(&series.line.marker_type, &def.line.marker_type).unwrap_or_default();
                    def.confidence_style = Some(if marker == MarkerType::None {
                        ConfidenceStyle::Band
                    } else {
                        ConfidenceStyle::ErrorBars
                    });
                    match pick(&series.confidence_style, &def.confidence_style).unwrap_or_default() {
                        ConfidenceStyle::None => {}
                        ConfidenceStyle::ErrorBars => {
                            let bars = ErrorBars {
                                along: if switch_axes { AxisRole::X } else { AxisRole::Y },
                                below: &values - &lower,
                                above: &upper - &values,
                            };
                            backend.error_bars(x, y, bars, style.color, zorder);
                        }
                        ConfidenceStyle::Band => {
                            let mut outline_coords = coords.to_vec();
                            outline_coords.extend(coords.iter().rev());
                            let mut outline_values = lower.to_vec();
                            outline_values.extend(upper.iter().rev());
                            let (ox, oy) = if switch_axes {
                                (outline_values, outline_coords)
                            } else {
                                (outline_coords, outline_values)
                            };
                            backend.fill(
                                Array1::from(ox).view(),
                                Array1::from(oy).view(),
                                style.color.brighten(0.5),
                                BAND_ALPHA,
                                zorder,
                            );
                        }
                    }
                    zorder += 1;
                }

                if !style.is_invisible() {
                    let artist = backend.plot_line(x, y, &style, &label, zorder);
                    legend.push((artist, label.clone()));
                }

                let (xname, yname) = if switch_axes { (varpath, dim) } else { (dim, varpath) };
                dims.entry(xname).axis = Some(AxisRole::X);
                dims.entry(yname).axis = Some(AxisRole::Y);
                line_count += 1;
            }
            2 => {
                let prefs = (
                    dims.preferred_axis(&slice.dimensions[0]),
                    dims.preferred_axis(&slice.dimensions[1]),
                );
                let swap = (prefs.0 == Some(PreferredAxis::Y) && prefs.1 != Some(PreferredAxis::Y))
                    || (prefs.1 == Some(PreferredAxis::X) && prefs.0 != Some(PreferredAxis::X));
                let (xdim, ydim) = if swap { (1, 0) } else { (0, 1) };
                dims.entry(&slice.dimensions[xdim]).axis = Some(AxisRole::X);
                dims.entry(&slice.dimensions[ydim]).axis = Some(AxisRole::Y);
                if plot_type != PlotType3D::Contour {
                    dims.entry(varpath).axis = Some(AxisRole::Colorbar);
                }

                let mesh = build_mesh(grid_coords, &slice.dimensions, &data, xdim, staggered_grid)?;
                let show_edges = pick(&series.show_edges, &def.show_edges).unwrap_or(false);
                let mappable = match plot_type {
                    PlotType3D::Pseudocolor => {
                        Some(backend.pcolormesh(&mesh, colormap, colorbar_log, show_edges, zorder))
                    }
                    PlotType3D::FilledContour | PlotType3D::Contour => {
                        let use_color_map = pick(&series.use_color_map, &def.use_color_map).unwrap_or(true);
                        let edge_color = if plot_type == PlotType3D::Contour && use_color_map {
                            None
                        } else {
                            Some(pick(&series.edge_color, &def.edge_color).unwrap_or(Color::BLACK))
                        };
                        let edge_width = pick(&series.edge_width, &def.edge_width).unwrap_or(1.0);
                        let filled = plot_type == PlotType3D::FilledContour;
                        let borders = show_edges || plot_type == PlotType3D::Contour;
                        let style = ContourStyle {
                            count: series.contour_count,
                            filled,
                            edges: None,
                            colormap,
                            log: colorbar_log,
                        };

                        let filled_set = filled.then(|| backend.contour(&mesh, &style, zorder));
                        let line_set = borders.then(|| {
                            if filled {
                                zorder += 1;
                            }
                            let edges = EdgeStyle {
                                color: edge_color,
                                width: edge_width,
                            };
                            let style = ContourStyle {
                                filled: false,
                                edges: Some(edges),
                                ..style
                            };
                            backend.contour(&mesh, &style, zorder)
                        });
                        if series.contour_count.is_none() {
                            if let Some(set) = filled_set.as_ref().or(line_set.as_ref()) {
                                def.contour_count = Some(set.levels.len().saturating_sub(2));
                            }
                        }
                        filled_set.map(|set| set.artist)
                    }
                };
                has_color_map = true;

                if let Some(mappable) = mappable {
                    if colorbar.is_some() {
                        return Err(FigureError::MultipleColorbars(varpath.to_string()));
                    }
                    let limits = if stats.is_constant() {
                        (Some(datarange.min - 1.0), Some(datarange.max + 1.0))
                    } else {
                        colorbar_range
                    };
                    backend.colorbar(mappable, limits);
                    colorbar = Some(mappable);
                }
                mesh_count += 1;
            }
            ndim => {
                debug!("Series {varpath} has {ndim} dimensions after squeezing, not drawn");
            }
        }
        zorder += 1;
    }

    for id in &stale_series {
        defaults.series.remove(id);
    }

    let title = match titles.first() {
        Some(first) if titles.iter().all(|t| t == first) => first.clone(),
        Some(_) => titles.join(", "),
        None => String::new(),
    };
    defaults.title = Some(title);
    let title = pick(&forced.title, &defaults.title).unwrap_or_default();
    if !title.is_empty() {
        backend.set_title(&title, &fonts.title);
    }

    defaults.can_have_legend = Some(line_count > 0);
    if line_count > 0 {
        defaults.legend.show = Some(line_count > 1);
        if pick(&forced.legend.show, &defaults.legend.show).unwrap_or(false) {
            let location = pick(&forced.legend.location, &defaults.legend.location).unwrap_or_default();
            backend.legend(&legend, location, &fonts.legend, zorder);
            zorder += 1;
        }
    }
    defaults.has_color_map = Some(has_color_map);

    let axes = dims.axes();

    // Log scaling goes first, it changes the backend's automatic ranges.
    for (&role, &key) in &axes {
        let Some(dim) = dims.get(key) else { continue };
        let can_log = dim.datatype != DataType::Datetime
            && dim.datarange.map_or(false, |r| r.min > 0.0 || r.max > 0.0);
        let def_axis = defaults.axes.get_or_create(role.id());
        def_axis.log_scale = Some(false);
        def_axis.can_have_log_scale = Some(can_log);

        let log = forced.axes.get(role.id()).and_then(|a| a.log_scale).unwrap_or(false);
        if can_log && log && matches!(role, AxisRole::X | AxisRole::Y) {
            backend.set_log_scale(role);
        }
    }

    let mut stale_axes = defaults.axes.ids();
    for (&role, &key) in &axes {
        let Some(dim) = dims.get(key) else { continue };
        stale_axes.retain(|id| id != role.id());
        let Some(datarange) = dim.datarange else { continue };

        let no_forced = AxisProperties::default();
        let forced_axis = forced.axes.get(role.id()).unwrap_or(&no_forced);
        let def_axis = defaults.axes.get_or_create(role.id());
        resolve_axis(backend, role, dim, datarange, forced_axis, def_axis, &fonts)?;

        if role == AxisRole::Colorbar && colorbar.is_none() {
            return Err(FigureError::MissingColorbar);
        }
    }
    for id in &stale_axes {
        defaults.axes.remove(id);
    }

    if pick(&forced.grid.show, &defaults.grid.show).unwrap_or(false) {
        let style = forced.grid.line.resolve(&defaults.grid.line);
        backend.set_grid(&style);
    }
    backend.set_tick_font(&fonts.tick);
    backend.draw();

    debug!(
        lines = line_count,
        meshes = mesh_count,
        layers = zorder,
        "Figure rebuilt"
    );
    Ok(line_count + mesh_count > 0)
}

/// Default settings, effective range, ticks and label of one axis.
fn resolve_axis<B: PlotBackend>(
    backend: &mut B,
    role: AxisRole,
    dim: &DimData,
    datarange: RangeIncl<f64>,
    forced: &AxisProperties,
    defaults: &mut AxisProperties,
    fonts: &Fonts,
) -> Result<(), FigureError> {
    let is_time = dim.datatype == DataType::Datetime;
    let on_plot = matches!(role, AxisRole::X | AxisRole::Y);

    let mut natural = if on_plot && !dim.tight {
        backend
            .auto_range(role)
            .unwrap_or((datarange.min, datarange.max))
    } else {
        (datarange.min, datarange.max)
    };

    let (mut forced_min, mut forced_max) = forced.range(is_time);
    let log = defaults.can_have_log_scale.unwrap_or(false)
        && pick(&forced.log_scale, &defaults.log_scale).unwrap_or(false);
    if log {
        forced_min = forced_min.filter(|&v| v > 0.0);
        forced_max = forced_max.filter(|&v| v > 0.0);
        if natural.0 <= 0.0 && on_plot {
            if let Some((auto_min, _)) = backend.auto_range(role) {
                natural.0 = auto_min;
            }
        }
    }

    let effective_data = (
        forced_min.unwrap_or(datarange.min),
        forced_max.unwrap_or(datarange.max),
    );
    let limits = (forced_min.unwrap_or(natural.0), forced_max.unwrap_or(natural.1));

    defaults.label = Some(if dim.unit.is_empty() {
        dim.label.clone()
    } else {
        format!("{} ({})", dim.label, dim.unit)
    });
    defaults.unit = Some(dim.unit.clone());
    defaults.ticks_major.show = Some(true);
    defaults.ticks_major.show_labels = Some(true);
    defaults.ticks_minor.show = Some(false);
    defaults.ticks_minor.show_labels = Some(false);
    defaults.is_time_axis = Some(is_time);

    let (mut major, mut minor) = (TickSpec::Auto, TickSpec::Auto);
    if is_time {
        if role == AxisRole::Colorbar {
            return Err(FigureError::TimeColorbar);
        }
        let dayspan = effective_data.1 - effective_data.0;
        let major_ticks = time_tick_settings(dayspan, &forced.ticks_major, &mut defaults.ticks_major);
        let minor_ticks = time_tick_settings(
            major_ticks.span.min(dayspan),
            &forced.ticks_minor,
            &mut defaults.ticks_minor,
        );
        major = TickSpec::Time {
            locator: major_ticks.locator,
            format: Some(major_ticks.format),
        };
        minor = TickSpec::Time {
            locator: minor_ticks.locator,
            format: None,
        };
        defaults.minimum_time = num_to_date(natural.0);
        defaults.maximum_time = num_to_date(natural.1);
    } else {
        defaults.minimum = Some(natural.0);
        defaults.maximum = Some(natural.1);
    }

    if !pick(&forced.ticks_major.show, &defaults.ticks_major.show).unwrap_or(true) {
        major = TickSpec::Hidden;
    }
    if !pick(&forced.ticks_minor.show, &defaults.ticks_minor.show).unwrap_or(false) {
        minor = TickSpec::Hidden;
    }
    backend.set_ticks(role, major, minor);

    let label = pick(&forced.label, &defaults.label).unwrap_or_default();
    if !label.is_empty() {
        backend.set_axis_label(role, &label, &fonts.label);
    }
    if on_plot {
        backend.set_limits(role, limits.0, limits.1);
    }
    Ok(())
}

/// Lowest and highest coordinate of dimension `idim`. n-D coordinates are
/// assumed to increase along their own dimension.
fn coordinate_range(coords: &ArrayD<f64>, idim: usize) -> Option<RangeIncl<f64>> {
    let finite = |v: &f64| v.is_finite();
    if coords.ndim() == 1 {
        let first = *coords.iter().next()?;
        let last = *coords.iter().last()?;
        return Some(RangeIncl::new(first.min(last), first.max(last)));
    }
    let n = coords.len_of(Axis(idim));
    if n == 0 {
        return None;
    }
    let low = coords.index_axis(Axis(idim), 0);
    let high = coords.index_axis(Axis(idim), n - 1);
    let min = low.iter().copied().filter(finite).reduce(f64::min)?;
    let max = high.iter().copied().filter(finite).reduce(f64::max)?;
    Some(RangeIncl::new(min, max))
}

fn coords_1d(coords: &Option<ArrayD<f64>>, dim: &str) -> Result<Array1<f64>, VariableError> {
    let coords = coords
        .as_ref()
        .ok_or_else(|| VariableError::MissingCoordinates(dim.to_string()))?;
    Ok(coords.view().into_dimensionality::<Ix1>()?.to_owned())
}

/// A confidence bound as a vector; a missing bound coincides with the data.
fn bound_1d(
    bound: Option<&ArrayD<f64>>,
    values: &ArrayView1<f64>,
) -> Result<Array1<f64>, VariableError> {
    match bound {
        Some(bound) => Ok(bound.view().into_dimensionality::<Ix1>()?.to_owned()),
        None => Ok(values.to_owned()),
    }
}

/// Grid of dimension `idim`'s coordinates over a 2-D slice of `shape`,
/// indexed like the data. On a staggered grid both directions get cell
/// interfaces; n-D interface coordinates are staggered along the other
/// dimension with the mid-point rule.
fn coordinate_grid(
    coords: &ArrayD<f64>,
    dim: &str,
    idim: usize,
    shape: [usize; 2],
    staggered_grid: bool,
) -> Result<Array2<f64>, VariableError> {
    let extra = usize::from(staggered_grid);
    let full = [shape[0] + extra, shape[1] + extra];
    let shape_error = |found: &[usize], expected: Vec<usize>| VariableError::CoordinateShape {
        dimension: dim.to_string(),
        found: found.to_vec(),
        expected,
    };

    if coords.ndim() == 1 {
        let c = coords.view().into_dimensionality::<Ix1>()?;
        if c.len() != full[idim] {
            return Err(shape_error(c.shape(), vec![full[idim]]));
        }
        return Ok(Array2::from_shape_fn((full[0], full[1]), |(i, j)| {
            if idim == 0 {
                c[i]
            } else {
                c[j]
            }
        }));
    }

    let c = coords.view().into_dimensionality::<Ix2>()?;
    let mut expected = shape;
    expected[idim] += extra;
    if c.shape() != &expected[..] {
        return Err(shape_error(c.shape(), expected.to_vec()));
    }
    if !staggered_grid {
        return Ok(c.to_owned());
    }
    let other = 1 - idim;
    let mut grid = Array2::zeros((full[0], full[1]));
    for (lane, mut out) in c.lanes(Axis(other)).into_iter().zip(grid.lanes_mut(Axis(other))) {
        out.assign(&staggered(lane));
    }
    Ok(grid)
}

/// Mesh with rows along the y axis.
fn build_mesh(
    coords: &[Option<ArrayD<f64>>],
    dimensions: &[String],
    data: &ArrayD<f64>,
    xdim: usize,
    staggered_grid: bool,
) -> Result<Mesh, VariableError> {
    let z = data.view().into_dimensionality::<Ix2>()?.to_owned();
    let shape = [z.nrows(), z.ncols()];
    let ydim = 1 - xdim;
    let grid = |idim: usize| -> Result<Array2<f64>, VariableError> {
        let c = coords[idim]
            .as_ref()
            .ok_or_else(|| VariableError::MissingCoordinates(dimensions[idim].clone()))?;
        coordinate_grid(c, &dimensions[idim], idim, shape, staggered_grid)
    };
    let (x, y) = (grid(xdim)?, grid(ydim)?);

    // data is indexed (dim 0, dim 1); rows must follow y
    Ok(if xdim == 0 {
        Mesh {
            x: x.reversed_axes(),
            y: y.reversed_axes(),
            z: z.reversed_axes(),
        }
    } else {
        Mesh { x, y, z }
    })
}
