//! The drawing surface a [`Figure`](crate::Figure) renders onto.

use std::path::Path;

use derive_more::Constructor;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use varplot_core::common::range::RangeIncl;

use crate::{
    style::{Color, ColorMap, LegendLocation, PlotStyle},
    time::{TickFormat, TimeLocator},
};

mod recording;

pub use recording::{Exporter, RecordingBackend, Scene, SceneAxis, SceneColorbar, SceneItem, SceneLegend};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend has no exporter attached")]
    NoExporter,
    #[error("Export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisRole {
    X,
    Y,
    Z,
    Colorbar,
}

impl AxisRole {
    pub const ALL: [AxisRole; 4] = [AxisRole::X, AxisRole::Y, AxisRole::Z, AxisRole::Colorbar];

    /// Key of the axis in a property tree.
    pub fn id(self) -> &'static str {
        match self {
            AxisRole::X => "x",
            AxisRole::Y => "y",
            AxisRole::Z => "z",
            AxisRole::Colorbar => "colorbar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Constructor, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    /// Points.
    pub size: f64,
}

/// Handle to something drawn, used for legends and colorbars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistId(pub usize);

/// Values on a 2-D grid, rows along the y axis. For a pseudocolor mesh `x`
/// and `y` hold the cell corners and are one longer than `z` in both
/// directions, for contours all three share a shape. Masked values are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub z: Array2<f64>,
}

impl Mesh {
    /// Range of the finite values.
    pub fn z_range(&self) -> Option<RangeIncl<f64>> {
        RangeIncl::from_iter_val(self.z.iter().copied().filter(|v| v.is_finite()))
    }
}

/// Error bar lengths below and above each point, along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBars {
    pub along: AxisRole,
    pub below: Array1<f64>,
    pub above: Array1<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    /// `None` colours the edges by the colormap.
    pub color: Option<Color>,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourStyle {
    /// Number of levels between the outermost two; the backend chooses when unset.
    pub count: Option<usize>,
    pub filled: bool,
    pub edges: Option<EdgeStyle>,
    pub colormap: ColorMap,
    pub log: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSet {
    pub artist: ArtistId,
    pub levels: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TickSpec {
    Auto,
    Hidden,
    Time {
        locator: TimeLocator,
        /// Label format, minor ticks have none.
        format: Option<TickFormat>,
    },
}

/// Operations a figure needs from a plotting library. `zorder` values
/// order the layers: higher ones are drawn on top.
pub trait PlotBackend {
    fn clear(&mut self);

    fn plot_line(
        &mut self,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        style: &PlotStyle,
        label: &str,
        zorder: i32,
    ) -> ArtistId;

    fn error_bars(
        &mut self,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        bars: ErrorBars,
        color: Color,
        zorder: i32,
    );

    /// Filled polygon without outline.
    fn fill(&mut self, x: ArrayView1<f64>, y: ArrayView1<f64>, color: Color, alpha: f64, zorder: i32);

    fn pcolormesh(
        &mut self,
        mesh: &Mesh,
        colormap: ColorMap,
        log: bool,
        show_edges: bool,
        zorder: i32,
    ) -> ArtistId;

    fn contour(&mut self, mesh: &Mesh, style: &ContourStyle, zorder: i32) -> ContourSet;

    /// Attaches the colorbar for `mappable`. Unset limits follow the data.
    fn colorbar(&mut self, mappable: ArtistId, limits: (Option<f64>, Option<f64>));

    fn set_title(&mut self, title: &str, font: &FontSpec);

    fn legend(
        &mut self,
        entries: &[(ArtistId, String)],
        location: LegendLocation,
        font: &FontSpec,
        zorder: i32,
    );

    fn set_log_scale(&mut self, axis: AxisRole);

    /// Range the backend would pick on its own for `axis`.
    fn auto_range(&self, axis: AxisRole) -> Option<(f64, f64)>;

    fn set_axis_label(&mut self, axis: AxisRole, label: &str, font: &FontSpec);

    fn set_limits(&mut self, axis: AxisRole, min: f64, max: f64);

    fn set_ticks(&mut self, axis: AxisRole, major: TickSpec, minor: TickSpec);

    fn set_grid(&mut self, style: &PlotStyle);

    fn set_tick_font(&mut self, font: &FontSpec);

    /// Called once an update has issued all of its calls.
    fn draw(&mut self);

    fn export(&self, path: &Path, dpi: u32) -> Result<(), BackendError>;
}
