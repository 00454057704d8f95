//! PNG rendering of a recorded [`Scene`] with `plotters`.

use std::path::Path;

use plotters::{
    coord::{cartesian::Cartesian2d, types::RangedCoordf64, Shift},
    prelude::*,
};
use thiserror::Error;
use tracing::debug;
use varplot_figure::{
    backend::{AxisRole, ContourStyle, Mesh, SceneAxis, SceneItem, TickSpec},
    style::{Color as FigureColor, ColorMap, LegendLocation, MarkerType, PlotStyle},
    Scene,
};

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Pixel sizes below are for 100 dpi.
const BASE_DPI: f64 = 100.0;
const MARGIN: i32 = 15;
const LABEL_AREA: i32 = 45;
const COLORBAR_WIDTH: i32 = 90;
const COLORBAR_STEPS: usize = 64;
const ERROR_BAR_WIDTH: u32 = 6;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::error::Error>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Writes `scene` to `path` at `size` pixels (for 100 dpi), scaled to `dpi`.
pub fn render_png(scene: &Scene, path: &Path, size: (u32, u32), dpi: u32) -> Result<(), RenderError> {
    let scale = f64::from(dpi) / BASE_DPI;
    let pixels = (
        (f64::from(size.0) * scale).round() as u32,
        (f64::from(size.1) * scale).round() as u32,
    );
    let root = BitMapBackend::new(path, pixels).into_drawing_area();
    draw_scene(&root, scene, Scaling::new(dpi))?;
    root.present().map_err(draw_err)?;
    debug!("Rendered {} items to {:?}", scene.items.len(), path);
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Scaling {
    dpi: f64,
}

impl Scaling {
    fn new(dpi: u32) -> Self {
        Self { dpi: f64::from(dpi) }
    }

    fn px(&self, pixels: i32) -> i32 {
        (f64::from(pixels) * self.dpi / BASE_DPI).round() as i32
    }

    /// Points to pixels.
    fn pt(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }

    fn stroke(&self, points: f64) -> u32 {
        self.pt(points).round().max(1.0) as u32
    }
}

/// Maps data coordinates onto the chart, log10 on logarithmic axes.
#[derive(Debug, Clone, Copy)]
struct Transform {
    xlog: bool,
    ylog: bool,
}

impl Transform {
    fn axis(value: f64, log: bool) -> Option<f64> {
        let value = if log {
            (value > 0.0).then(|| value.log10())?
        } else {
            value
        };
        value.is_finite().then_some(value)
    }

    fn point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((Self::axis(x, self.xlog)?, Self::axis(y, self.ylog)?))
    }
}

/// Position of a value between colour limits.
#[derive(Debug, Clone, Copy)]
struct Norm {
    lo: f64,
    hi: f64,
    log: bool,
}

impl Norm {
    fn new(limits: (f64, f64), log: bool) -> Self {
        let (lo, hi) = if log {
            (limits.0.max(f64::MIN_POSITIVE).log10(), limits.1.max(f64::MIN_POSITIVE).log10())
        } else {
            limits
        };
        Self { lo, hi, log }
    }

    fn of(&self, value: f64) -> Option<f64> {
        let value = Transform::axis(value, self.log)?;
        if self.hi == self.lo {
            return Some(0.5);
        }
        Some(((value - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0))
    }
}

fn rgb(color: FigureColor) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn legend_position(location: LegendLocation) -> SeriesLabelPosition {
    match location {
        LegendLocation::Best | LegendLocation::UpperRight => SeriesLabelPosition::UpperRight,
        LegendLocation::UpperLeft => SeriesLabelPosition::UpperLeft,
        LegendLocation::LowerLeft => SeriesLabelPosition::LowerLeft,
        LegendLocation::LowerRight => SeriesLabelPosition::LowerRight,
        LegendLocation::Right | LegendLocation::CenterRight => SeriesLabelPosition::MiddleRight,
        LegendLocation::CenterLeft => SeriesLabelPosition::MiddleLeft,
        LegendLocation::LowerCenter => SeriesLabelPosition::LowerMiddle,
        LegendLocation::UpperCenter => SeriesLabelPosition::UpperMiddle,
        LegendLocation::Center => SeriesLabelPosition::MiddleMiddle,
    }
}

fn number_label(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0 && !(1e-3..1e5).contains(&magnitude) {
        return format!("{value:.2e}");
    }
    let text = format!("{value:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Tick label text for an axis.
fn tick_label(axis: Option<&SceneAxis>, value: f64) -> String {
    let Some(axis) = axis else {
        return number_label(value);
    };
    if axis.log {
        return number_label(10f64.powf(value));
    }
    match axis.major {
        Some(TickSpec::Time {
            format: Some(format),
            ..
        }) => format.formatter().format_num(value),
        _ => number_label(value),
    }
}

fn label_count(axis: Option<&SceneAxis>, limits: (f64, f64)) -> usize {
    match axis.and_then(|a| a.major) {
        Some(TickSpec::Hidden) => 0,
        Some(TickSpec::Time { locator, .. }) => locator.ticks(limits.0, limits.1).len().clamp(2, 12),
        _ => 8,
    }
}

/// Limits of an axis on the chart, never empty.
fn chart_range(axis: Option<&SceneAxis>) -> (f64, f64) {
    let log = axis.map_or(false, |a| a.log);
    let (lo, hi) = axis
        .and_then(|a| a.limits)
        .and_then(|(lo, hi)| Some((Transform::axis(lo, log)?, Transform::axis(hi, log)?)))
        .unwrap_or((0.0, 1.0));
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// Segments where the bilinear surface over each grid cell crosses `level`.
pub fn contour_segments(mesh: &Mesh, level: f64) -> Vec<[(f64, f64); 2]> {
    let (rows, cols) = mesh.z.dim();
    let mut segments = Vec::new();
    for i in 0..rows.saturating_sub(1) {
        for j in 0..cols.saturating_sub(1) {
            // counter-clockwise around the cell
            let corners = [(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)];
            let mut crossings = Vec::with_capacity(4);
            for k in 0..4 {
                let a = corners[k];
                let b = corners[(k + 1) % 4];
                let (za, zb) = (mesh.z[a], mesh.z[b]);
                if !za.is_finite() || !zb.is_finite() || (za >= level) == (zb >= level) {
                    continue;
                }
                let t = (level - za) / (zb - za);
                crossings.push((
                    mesh.x[a] + t * (mesh.x[b] - mesh.x[a]),
                    mesh.y[a] + t * (mesh.y[b] - mesh.y[a]),
                ));
            }
            for pair in crossings.chunks_exact(2) {
                segments.push([pair[0], pair[1]]);
            }
        }
    }
    segments
}

/// Index of the band between consecutive `levels` holding `value`.
fn band(levels: &[f64], value: f64) -> Option<usize> {
    if levels.len() < 2 || !value.is_finite() {
        return None;
    }
    let last = levels.len() - 2;
    Some(
        levels
            .windows(2)
            .position(|w| value < w[1])
            .unwrap_or(last)
            .min(last),
    )
}

fn draw_scene<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &Scene,
    scaling: Scaling,
) -> Result<(), RenderError> {
    root.fill(&WHITE).map_err(draw_err)?;

    let (plot_area, bar_area) = match &scene.colorbar {
        Some(_) => {
            let (width, _) = root.dim_in_pixel();
            let split = width as i32 - scaling.px(COLORBAR_WIDTH);
            let (plot, bar) = root.split_horizontally(split);
            (plot, Some(bar))
        }
        None => (root.clone(), None),
    };

    let xaxis = scene.axis(AxisRole::X);
    let yaxis = scene.axis(AxisRole::Y);
    let xrange = chart_range(xaxis);
    let yrange = chart_range(yaxis);
    let transform = Transform {
        xlog: xaxis.map_or(false, |a| a.log),
        ylog: yaxis.map_or(false, |a| a.log),
    };

    let mut builder = ChartBuilder::on(&plot_area);
    builder
        .margin(scaling.px(MARGIN))
        .x_label_area_size(scaling.px(LABEL_AREA))
        .y_label_area_size(scaling.px(LABEL_AREA) + scaling.px(15));
    if let Some((title, font)) = &scene.title {
        builder.caption(title, (font.family.as_str(), scaling.pt(font.size)));
    }
    let mut chart = builder
        .build_cartesian_2d(xrange.0..xrange.1, yrange.0..yrange.1)
        .map_err(draw_err)?;

    let x_formatter = |v: &f64| tick_label(xaxis, *v);
    let y_formatter = |v: &f64| tick_label(yaxis, *v);
    let tick_font = scene
        .tick_font
        .as_ref()
        .map_or(("sans-serif", scaling.pt(8.0)), |f| (f.family.as_str(), scaling.pt(f.size)));

    let mut mesh = chart.configure_mesh();
    mesh.x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .x_labels(label_count(xaxis, xrange))
        .y_labels(label_count(yaxis, yrange))
        .label_style(tick_font);
    if let Some((label, font)) = xaxis.and_then(|a| a.label.as_ref()) {
        mesh.x_desc(label.as_str())
            .axis_desc_style((font.family.as_str(), scaling.pt(font.size)));
    }
    if let Some((label, font)) = yaxis.and_then(|a| a.label.as_ref()) {
        mesh.y_desc(label.as_str())
            .axis_desc_style((font.family.as_str(), scaling.pt(font.size)));
    }
    match &scene.grid {
        Some(grid) => {
            mesh.bold_line_style(rgb(grid.color).stroke_width(scaling.stroke(grid.line_width)))
                .light_line_style(TRANSPARENT);
        }
        None => {
            mesh.disable_mesh();
        }
    }
    mesh.draw().map_err(draw_err)?;

    let colorbar = scene.colorbar.as_ref();
    for item in scene.layers() {
        match item {
            SceneItem::Line {
                x, y, style, label, ..
            } => {
                let points: Vec<Option<(f64, f64)>> = x
                    .iter()
                    .zip(y.iter())
                    .map(|(&x, &y)| transform.point(x, y))
                    .collect();
                let legend = scene
                    .legend
                    .as_ref()
                    .filter(|l| l.entries.iter().any(|(_, l)| l == label))
                    .map(|_| label.as_str());
                draw_line(&mut chart, &points, style, legend, scaling)?;
            }
            SceneItem::ErrorBars {
                x, y, bars, color, ..
            } => {
                let stroke = rgb(*color).stroke_width(scaling.stroke(1.0));
                let width = (f64::from(ERROR_BAR_WIDTH) * scaling.dpi / BASE_DPI) as u32;
                let vertical = bars.along != AxisRole::X;
                let mut vertical_bars = Vec::new();
                let mut horizontal_bars = Vec::new();
                for i in 0..x.len() {
                    let (lo, hi) = (bars.below[i], bars.above[i]);
                    if vertical {
                        let key = Transform::axis(x[i], transform.xlog);
                        let values = [y[i] - lo, y[i], y[i] + hi].map(|v| Transform::axis(v, transform.ylog));
                        if let (Some(key), [Some(min), Some(avg), Some(max)]) = (key, values) {
                            vertical_bars.push(ErrorBar::new_vertical(key, min, avg, max, stroke, width));
                        }
                    } else {
                        let key = Transform::axis(y[i], transform.ylog);
                        let values = [x[i] - lo, x[i], x[i] + hi].map(|v| Transform::axis(v, transform.xlog));
                        if let (Some(key), [Some(min), Some(avg), Some(max)]) = (key, values) {
                            horizontal_bars.push(ErrorBar::new_horizontal(key, min, avg, max, stroke, width));
                        }
                    }
                }
                chart.draw_series(vertical_bars).map_err(draw_err)?;
                chart.draw_series(horizontal_bars).map_err(draw_err)?;
            }
            SceneItem::Fill {
                x, y, color, alpha, ..
            } => {
                let points: Vec<_> = x
                    .iter()
                    .zip(y.iter())
                    .filter_map(|(&x, &y)| transform.point(x, y))
                    .collect();
                chart
                    .draw_series(std::iter::once(Polygon::new(points, rgb(*color).mix(*alpha).filled())))
                    .map_err(draw_err)?;
            }
            SceneItem::Pseudocolor {
                artist,
                mesh,
                colormap,
                log,
                show_edges,
                ..
            } => {
                let limits = colorbar
                    .filter(|c| c.mappable == *artist)
                    .map(|c| c.limits)
                    .or_else(|| mesh.z_range().map(|r| (r.min, r.max)))
                    .unwrap_or((0.0, 1.0));
                draw_cells(&mut chart, mesh, 1, transform, |i, j| {
                    let t = Norm::new(limits, *log).of(mesh.z[(i, j)])?;
                    Some(colormap.sample(t))
                })?;
                if *show_edges {
                    draw_cell_edges(&mut chart, mesh, transform, scaling)?;
                }
            }
            SceneItem::Contour {
                artist,
                mesh,
                style,
                levels,
                ..
            } => {
                let limits = colorbar
                    .filter(|c| c.mappable == *artist)
                    .map(|c| c.limits)
                    .or_else(|| Some((*levels.first()?, *levels.last()?)))
                    .unwrap_or((0.0, 1.0));
                let norm = Norm::new(limits, style.log);
                if style.filled {
                    // cells between neighbouring grid points, coloured by band
                    draw_cells(&mut chart, mesh, 0, transform, |i, j| {
                        let corners = [(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)];
                        let mean = corners.iter().map(|&c| mesh.z[c]).sum::<f64>() / 4.0;
                        let k = band(levels, mean)?;
                        let mid = (levels[k] + levels[k + 1]) / 2.0;
                        Some(style.colormap.sample(norm.of(mid)?))
                    })?;
                }
                draw_contour_lines(&mut chart, mesh, style, levels, norm, transform, scaling)?;
            }
        }
    }

    if let Some(legend) = &scene.legend {
        chart
            .configure_series_labels()
            .position(legend_position(legend.location))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((legend.font.family.as_str(), scaling.pt(legend.font.size)))
            .draw()
            .map_err(draw_err)?;
    }

    if let (Some(colorbar), Some(bar_area)) = (colorbar, bar_area) {
        let axis = scene.axis(AxisRole::Colorbar);
        draw_colorbar(&bar_area, colorbar.colormap, colorbar.limits, colorbar.log, axis, scaling)?;
    }
    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    points: &[Option<(f64, f64)>],
    style: &PlotStyle,
    legend: Option<&str>,
    scaling: Scaling,
) -> Result<(), RenderError> {
    let stroke = rgb(style.color).stroke_width(scaling.stroke(style.line_width));
    let face = rgb(style.marker_face_color).filled();
    let size = scaling.pt(style.marker_size / 2.0).round().max(1.0) as i32;
    let mut labelled = legend.is_none();

    if style.has_line() {
        // masked values break the line
        for segment in points.split(Option::is_none).filter(|s| !s.is_empty()) {
            let anno = chart
                .draw_series(LineSeries::new(segment.iter().flatten().copied(), stroke))
                .map_err(draw_err)?;
            if let (false, Some(label)) = (labelled, legend) {
                anno.label(label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
                labelled = true;
            }
        }
    }

    let points: Vec<(f64, f64)> = points.iter().flatten().copied().collect();
    let anno = match style.marker {
        MarkerType::None => return Ok(()),
        MarkerType::Triangle => chart
            .draw_series(points.iter().map(|&p| TriangleMarker::new(p, size, face)))
            .map_err(draw_err)?,
        MarkerType::Plus | MarkerType::Cross => chart
            .draw_series(points.iter().map(|&p| Cross::new(p, size, stroke)))
            .map_err(draw_err)?,
        MarkerType::Square | MarkerType::Diamond => chart
            .draw_series(
                points
                    .iter()
                    .map(|&p| EmptyElement::at(p) + Rectangle::new([(-size, -size), (size, size)], face)),
            )
            .map_err(draw_err)?,
        MarkerType::Pixel => chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 1, face)))
            .map_err(draw_err)?,
        MarkerType::Point | MarkerType::Circle => chart
            .draw_series(points.iter().map(|&p| Circle::new(p, size, face)))
            .map_err(draw_err)?,
    };
    if let (false, Some(label)) = (labelled, legend) {
        anno.label(label)
            .legend(move |(x, y)| Circle::new((x + 10, y), size, face));
    }
    Ok(())
}

/// Fills the quadrilaterals of `mesh`. With `corner_offset` 1 the x/y grids
/// are cell corners (one longer than z), with 0 the cells join neighbouring
/// grid points.
fn draw_cells<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    mesh: &Mesh,
    corner_offset: usize,
    transform: Transform,
    color: impl Fn(usize, usize) -> Option<FigureColor>,
) -> Result<(), RenderError> {
    let (rows, cols) = mesh.z.dim();
    let (rows, cols) = if corner_offset == 1 {
        (rows, cols)
    } else {
        (rows.saturating_sub(1), cols.saturating_sub(1))
    };
    let mut cells = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let Some(fill) = color(i, j) else { continue };
            let corners: Option<Vec<_>> = [(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)]
                .iter()
                .map(|&c| transform.point(mesh.x[c], mesh.y[c]))
                .collect();
            if let Some(corners) = corners {
                cells.push(Polygon::new(corners, rgb(fill).filled()));
            }
        }
    }
    chart.draw_series(cells).map_err(draw_err)?;
    Ok(())
}

fn draw_cell_edges<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    mesh: &Mesh,
    transform: Transform,
    scaling: Scaling,
) -> Result<(), RenderError> {
    let stroke = BLACK.stroke_width(scaling.stroke(0.5));
    let rows = mesh.x.rows().into_iter().zip(mesh.y.rows());
    let cols = mesh.x.columns().into_iter().zip(mesh.y.columns());
    for (xs, ys) in rows.chain(cols) {
        let points: Vec<_> = xs
            .iter()
            .zip(ys.iter())
            .filter_map(|(&x, &y)| transform.point(x, y))
            .collect();
        chart.draw_series(LineSeries::new(points, stroke)).map_err(draw_err)?;
    }
    Ok(())
}

fn draw_contour_lines<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    mesh: &Mesh,
    style: &ContourStyle,
    levels: &[f64],
    norm: Norm,
    transform: Transform,
    scaling: Scaling,
) -> Result<(), RenderError> {
    let Some(edges) = style.edges else {
        return Ok(());
    };
    for &level in levels {
        let color = match edges.color {
            Some(color) => color,
            None => style.colormap.sample(norm.of(level).unwrap_or(0.0)),
        };
        let stroke = rgb(color).stroke_width(scaling.stroke(edges.width));
        let segments = contour_segments(mesh, level).into_iter().filter_map(|[a, b]| {
            let a = transform.point(a.0, a.1)?;
            let b = transform.point(b.0, b.1)?;
            Some(PathElement::new(vec![a, b], stroke))
        });
        chart.draw_series(segments).map_err(draw_err)?;
    }
    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    colormap: ColorMap,
    limits: (f64, f64),
    log: bool,
    axis: Option<&SceneAxis>,
    scaling: Scaling,
) -> Result<(), RenderError> {
    let norm = Norm::new(limits, log);
    let (lo, hi) = if norm.lo == norm.hi {
        (norm.lo - 0.5, norm.hi + 0.5)
    } else {
        (norm.lo.min(norm.hi), norm.lo.max(norm.hi))
    };

    let mut chart = ChartBuilder::on(area)
        .margin(scaling.px(MARGIN))
        .margin_bottom(scaling.px(MARGIN + LABEL_AREA))
        .y_label_area_size(scaling.px(LABEL_AREA))
        .build_cartesian_2d(0f64..1f64, lo..hi)
        .map_err(draw_err)?;

    let formatter = |v: &f64| {
        if log {
            number_label(10f64.powf(*v))
        } else {
            number_label(*v)
        }
    };
    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .x_labels(0)
        .y_label_formatter(&formatter)
        .label_style(("sans-serif", scaling.pt(8.0)));
    if let Some((label, font)) = axis.and_then(|a| a.label.as_ref()) {
        mesh.y_desc(label.as_str())
            .axis_desc_style((font.family.as_str(), scaling.pt(font.size)));
    }
    mesh.draw().map_err(draw_err)?;

    let step = (hi - lo) / COLORBAR_STEPS as f64;
    chart
        .draw_series((0..COLORBAR_STEPS).map(|k| {
            let v0 = lo + step * k as f64;
            let t = (k as f64 + 0.5) / COLORBAR_STEPS as f64;
            Rectangle::new([(0.0, v0), (1.0, v0 + step)], rgb(colormap.sample(t)).filled())
        }))
        .map_err(draw_err)?;
    Ok(())
}
