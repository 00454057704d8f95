use std::{collections::BTreeMap, fmt, path::Path};

use ndarray::{Array1, ArrayView1};
use tracing::debug;
use varplot_core::common::range::RangeIncl;

use super::{
    ArtistId, AxisRole, BackendError, ContourSet, ContourStyle, ErrorBars, FontSpec, Mesh,
    PlotBackend, TickSpec,
};
use crate::style::{Color, ColorMap, LegendLocation, PlotStyle};

/// Default number of intervals between the lowest and highest contour level.
const CONTOUR_INTERVALS: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    Line {
        artist: ArtistId,
        x: Array1<f64>,
        y: Array1<f64>,
        style: PlotStyle,
        label: String,
        zorder: i32,
    },
    ErrorBars {
        x: Array1<f64>,
        y: Array1<f64>,
        bars: ErrorBars,
        color: Color,
        zorder: i32,
    },
    Fill {
        x: Array1<f64>,
        y: Array1<f64>,
        color: Color,
        alpha: f64,
        zorder: i32,
    },
    Pseudocolor {
        artist: ArtistId,
        mesh: Mesh,
        colormap: ColorMap,
        log: bool,
        show_edges: bool,
        zorder: i32,
    },
    Contour {
        artist: ArtistId,
        mesh: Mesh,
        style: ContourStyle,
        levels: Vec<f64>,
        zorder: i32,
    },
}

impl SceneItem {
    pub fn zorder(&self) -> i32 {
        match self {
            SceneItem::Line { zorder, .. }
            | SceneItem::ErrorBars { zorder, .. }
            | SceneItem::Fill { zorder, .. }
            | SceneItem::Pseudocolor { zorder, .. }
            | SceneItem::Contour { zorder, .. } => *zorder,
        }
    }

    fn artist(&self) -> Option<ArtistId> {
        match self {
            SceneItem::Line { artist, .. }
            | SceneItem::Pseudocolor { artist, .. }
            | SceneItem::Contour { artist, .. } => Some(*artist),
            _ => None,
        }
    }

    /// Finite extent along `axis`, positive values only if `positive`.
    fn extent(&self, axis: AxisRole, positive: bool) -> Option<RangeIncl<f64>> {
        let keep = |v: &f64| v.is_finite() && (!positive || *v > 0.0);
        let values: Vec<f64> = match (self, axis) {
            (SceneItem::Line { x, .. } | SceneItem::Fill { x, .. }, AxisRole::X) => {
                x.iter().copied().collect()
            }
            (SceneItem::Line { y, .. } | SceneItem::Fill { y, .. }, AxisRole::Y) => {
                y.iter().copied().collect()
            }
            (SceneItem::ErrorBars { x, y, bars, .. }, AxisRole::X | AxisRole::Y) => {
                let centers = if axis == AxisRole::X { x } else { y };
                if bars.along == axis {
                    let low = centers - &bars.below;
                    let high = centers + &bars.above;
                    low.iter().chain(high.iter()).copied().collect()
                } else {
                    centers.to_vec()
                }
            }
            (
                SceneItem::Pseudocolor { mesh, .. } | SceneItem::Contour { mesh, .. },
                AxisRole::X,
            ) => mesh.x.iter().copied().collect(),
            (
                SceneItem::Pseudocolor { mesh, .. } | SceneItem::Contour { mesh, .. },
                AxisRole::Y,
            ) => mesh.y.iter().copied().collect(),
            _ => Vec::new(),
        };
        RangeIncl::from_iter_val(values.into_iter().filter(keep))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneAxis {
    pub label: Option<(String, FontSpec)>,
    pub limits: Option<(f64, f64)>,
    pub log: bool,
    pub major: Option<TickSpec>,
    pub minor: Option<TickSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneColorbar {
    pub mappable: ArtistId,
    pub colormap: ColorMap,
    pub log: bool,
    pub limits: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneLegend {
    pub entries: Vec<(PlotStyle, String)>,
    pub location: LegendLocation,
    pub font: FontSpec,
    pub zorder: i32,
}

/// Everything drawn by one figure update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub title: Option<(String, FontSpec)>,
    pub items: Vec<SceneItem>,
    pub colorbar: Option<SceneColorbar>,
    pub legend: Option<SceneLegend>,
    pub axes: BTreeMap<AxisRole, SceneAxis>,
    pub grid: Option<PlotStyle>,
    pub tick_font: Option<FontSpec>,
    /// Number of completed draws since the backend was created.
    pub draws: usize,
}

impl Scene {
    pub fn axis(&self, role: AxisRole) -> Option<&SceneAxis> {
        self.axes.get(&role)
    }

    /// Items sorted by z-order, stable for equal orders.
    pub fn layers(&self) -> Vec<&SceneItem> {
        let mut items: Vec<_> = self.items.iter().collect();
        items.sort_by_key(|item| item.zorder());
        items
    }

    pub fn lines(&self) -> impl Iterator<Item = &SceneItem> {
        self.items
            .iter()
            .filter(|item| matches!(item, SceneItem::Line { .. }))
    }

    fn item(&self, artist: ArtistId) -> Option<&SceneItem> {
        self.items.iter().find(|item| item.artist() == Some(artist))
    }
}

/// Renders a [`Scene`] to a file at the given dpi.
pub type Exporter = Box<dyn Fn(&Scene, &Path, u32) -> Result<(), BackendError>>;

/// Backend that records every call into a [`Scene`]. Export is delegated
/// to an optional [`Exporter`].
#[derive(Default)]
pub struct RecordingBackend {
    scene: Scene,
    next_artist: usize,
    exporter: Option<Exporter>,
}

impl fmt::Debug for RecordingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingBackend")
            .field("scene", &self.scene)
            .field("exporter", &self.exporter.is_some())
            .finish()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exporter(
        exporter: impl Fn(&Scene, &Path, u32) -> Result<(), BackendError> + 'static,
    ) -> Self {
        Self {
            exporter: Some(Box::new(exporter)),
            ..Self::default()
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn artist(&mut self) -> ArtistId {
        self.next_artist += 1;
        ArtistId(self.next_artist)
    }

    fn axis_mut(&mut self, axis: AxisRole) -> &mut SceneAxis {
        self.scene.axes.entry(axis).or_default()
    }

    fn is_log(&self, axis: AxisRole) -> bool {
        self.scene.axis(axis).map_or(false, |a| a.log)
    }
}

/// `count + 2` levels spread over `range`, geometrically on log scales.
fn contour_levels(range: RangeIncl<f64>, count: Option<usize>, log: bool) -> Vec<f64> {
    let n = count.map_or(CONTOUR_INTERVALS + 1, |c| c + 2);
    if log && range.min > 0.0 {
        let (lo, hi) = (range.min.log10(), range.max.log10());
        Array1::linspace(lo, hi, n).mapv(|v| 10f64.powf(v)).to_vec()
    } else {
        Array1::linspace(range.min, range.max, n).to_vec()
    }
}

impl PlotBackend for RecordingBackend {
    fn clear(&mut self) {
        let draws = self.scene.draws;
        self.scene = Scene {
            draws,
            ..Scene::default()
        };
    }

    fn plot_line(
        &mut self,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        style: &PlotStyle,
        label: &str,
        zorder: i32,
    ) -> ArtistId {
        let artist = self.artist();
        self.scene.items.push(SceneItem::Line {
            artist,
            x: x.to_owned(),
            y: y.to_owned(),
            style: *style,
            label: label.to_string(),
            zorder,
        });
        artist
    }

    fn error_bars(
        &mut self,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        bars: ErrorBars,
        color: Color,
        zorder: i32,
    ) {
        self.scene.items.push(SceneItem::ErrorBars {
            x: x.to_owned(),
            y: y.to_owned(),
            bars,
            color,
            zorder,
        });
    }

    fn fill(&mut self, x: ArrayView1<f64>, y: ArrayView1<f64>, color: Color, alpha: f64, zorder: i32) {
        self.scene.items.push(SceneItem::Fill {
            x: x.to_owned(),
            y: y.to_owned(),
            color,
            alpha,
            zorder,
        });
    }

    fn pcolormesh(
        &mut self,
        mesh: &Mesh,
        colormap: ColorMap,
        log: bool,
        show_edges: bool,
        zorder: i32,
    ) -> ArtistId {
        let artist = self.artist();
        self.scene.items.push(SceneItem::Pseudocolor {
            artist,
            mesh: mesh.clone(),
            colormap,
            log,
            show_edges,
            zorder,
        });
        artist
    }

    fn contour(&mut self, mesh: &Mesh, style: &ContourStyle, zorder: i32) -> ContourSet {
        let artist = self.artist();
        let levels = mesh
            .z_range()
            .map(|range| contour_levels(range, style.count, style.log))
            .unwrap_or_default();
        self.scene.items.push(SceneItem::Contour {
            artist,
            mesh: mesh.clone(),
            style: *style,
            levels: levels.clone(),
            zorder,
        });
        ContourSet { artist, levels }
    }

    fn colorbar(&mut self, mappable: ArtistId, limits: (Option<f64>, Option<f64>)) {
        let (colormap, log, data) = match self.scene.item(mappable) {
            Some(SceneItem::Pseudocolor {
                mesh, colormap, log, ..
            }) => (*colormap, *log, mesh.z_range()),
            Some(SceneItem::Contour { mesh, style, .. }) => (style.colormap, style.log, mesh.z_range()),
            _ => (ColorMap::default(), false, None),
        };
        let data = data.unwrap_or(RangeIncl::new(0.0, 1.0));
        self.scene.colorbar = Some(SceneColorbar {
            mappable,
            colormap,
            log,
            limits: (limits.0.unwrap_or(data.min), limits.1.unwrap_or(data.max)),
        });
    }

    fn set_title(&mut self, title: &str, font: &FontSpec) {
        self.scene.title = Some((title.to_string(), font.clone()));
    }

    fn legend(
        &mut self,
        entries: &[(ArtistId, String)],
        location: LegendLocation,
        font: &FontSpec,
        zorder: i32,
    ) {
        let entries = entries
            .iter()
            .filter_map(|(artist, label)| match self.scene.item(*artist) {
                Some(SceneItem::Line { style, .. }) => Some((*style, label.clone())),
                _ => None,
            })
            .collect();
        self.scene.legend = Some(SceneLegend {
            entries,
            location,
            font: font.clone(),
            zorder,
        });
    }

    fn set_log_scale(&mut self, axis: AxisRole) {
        self.axis_mut(axis).log = true;
    }

    fn auto_range(&self, axis: AxisRole) -> Option<(f64, f64)> {
        if axis == AxisRole::Colorbar {
            return self.scene.colorbar.as_ref().map(|cb| cb.limits);
        }
        let positive = self.is_log(axis);
        let range = RangeIncl::from_iter_range(
            self.scene
                .items
                .iter()
                .filter_map(|item| item.extent(axis, positive)),
        )?;
        if range.min == range.max {
            let pad = if range.min == 0.0 { 1.0 } else { range.min.abs() * 0.05 };
            return Some((range.min - pad, range.max + pad));
        }
        Some((range.min, range.max))
    }

    fn set_axis_label(&mut self, axis: AxisRole, label: &str, font: &FontSpec) {
        self.axis_mut(axis).label = Some((label.to_string(), font.clone()));
    }

    fn set_limits(&mut self, axis: AxisRole, min: f64, max: f64) {
        self.axis_mut(axis).limits = Some((min, max));
    }

    fn set_ticks(&mut self, axis: AxisRole, major: TickSpec, minor: TickSpec) {
        let axis = self.axis_mut(axis);
        axis.major = Some(major);
        axis.minor = Some(minor);
    }

    fn set_grid(&mut self, style: &PlotStyle) {
        self.scene.grid = Some(*style);
    }

    fn set_tick_font(&mut self, font: &FontSpec) {
        self.scene.tick_font = Some(font.clone());
    }

    fn draw(&mut self) {
        self.scene.draws += 1;
        debug!(
            items = self.scene.items.len(),
            draws = self.scene.draws,
            "Scene complete"
        );
    }

    fn export(&self, path: &Path, dpi: u32) -> Result<(), BackendError> {
        let exporter = self.exporter.as_ref().ok_or(BackendError::NoExporter)?;
        exporter(&self.scene, path, dpi)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn auto_range_covers_all_items() {
        let mut backend = RecordingBackend::new();
        backend.plot_line(
            array![0.0, 1.0, 2.0].view(),
            array![10.0, 12.0, 14.0].view(),
            &PlotStyle::default(),
            "a",
            0,
        );
        backend.error_bars(
            array![0.0, 1.0, 2.0].view(),
            array![10.0, 12.0, 14.0].view(),
            ErrorBars {
                along: AxisRole::Y,
                below: array![1.0, 1.0, 1.0],
                above: array![0.5, 0.5, 0.5],
            },
            Color::BLACK,
            1,
        );
        assert_eq!(backend.auto_range(AxisRole::X), Some((0.0, 2.0)));
        assert_eq!(backend.auto_range(AxisRole::Y), Some((9.0, 14.5)));
        assert_eq!(backend.auto_range(AxisRole::Colorbar), None);
    }

    #[test]
    fn log_axes_ignore_non_positive_data() {
        let mut backend = RecordingBackend::new();
        backend.set_log_scale(AxisRole::Y);
        backend.plot_line(
            array![0.0, 1.0, 2.0].view(),
            array![-1.0, 0.1, 10.0].view(),
            &PlotStyle::default(),
            "a",
            0,
        );
        assert_eq!(backend.auto_range(AxisRole::Y), Some((0.1, 10.0)));
    }

    #[test]
    fn contours_and_colorbar() {
        let mut backend = RecordingBackend::new();
        let mesh = Mesh {
            x: array![[0.0, 1.0], [0.0, 1.0]],
            y: array![[0.0, 0.0], [1.0, 1.0]],
            z: array![[0.0, 3.5], [f64::NAN, 7.0]],
        };
        let style = ContourStyle {
            count: None,
            filled: true,
            edges: None,
            colormap: ColorMap::Hot,
            log: false,
        };
        let set = backend.contour(&mesh, &style, 0);
        assert_eq!(set.levels, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

        backend.colorbar(set.artist, (None, Some(5.0)));
        let cb = backend.scene().colorbar.as_ref().unwrap();
        assert_eq!(cb.limits, (0.0, 5.0));
        assert_eq!(cb.colormap, ColorMap::Hot);
    }

    #[test]
    fn clear_keeps_draw_count() {
        let mut backend = RecordingBackend::new();
        backend.draw();
        backend.set_log_scale(AxisRole::X);
        backend.clear();
        assert_eq!(backend.scene().draws, 1);
        assert!(backend.scene().axes.is_empty());
    }

    #[test]
    fn export_needs_an_exporter() {
        let backend = RecordingBackend::new();
        assert!(matches!(
            backend.export(Path::new("out.png"), 150),
            Err(BackendError::NoExporter)
        ));
        let backend = RecordingBackend::with_exporter(|scene, _, dpi| {
            assert_eq!(dpi, 72);
            assert_eq!(scene.draws, 0);
            Ok(())
        });
        assert!(backend.export(Path::new("out.png"), 72).is_ok());
    }
}
