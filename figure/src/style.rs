//! Coded style enums and line styling.

use serde::{Deserialize, Serialize};
use varplot_core::coded_enum;

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    /// Cycled through by the line series of a figure.
    pub const LINE_CYCLE: [Color; 7] = [
        Color::new(0, 0, 255),
        Color::new(0, 255, 0),
        Color::new(255, 0, 0),
        Color::new(0, 255, 255),
        Color::new(255, 0, 255),
        Color::new(255, 255, 0),
        Color::new(0, 0, 0),
    ];

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_normalized(r: f64, g: f64, b: f64) -> Self {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(r), channel(g), channel(b))
    }

    pub fn normalized(&self) -> [f64; 3] {
        [self.r, self.g, self.b].map(|c| f64::from(c) / 255.0)
    }

    /// Moves every channel towards white by `amount` (0 keeps the colour, 1 gives white).
    pub fn brighten(&self, amount: f64) -> Self {
        let channel = |c: u8| {
            let c = f64::from(c);
            (c + (255.0 - c) * amount.clamp(0.0, 1.0)).round() as u8
        };
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }
}

coded_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LineStyle: "line style" {
        None = 0,
        #[default]
        Solid = 1,
        Dashed = 2,
        DashDot = 3,
        Dotted = 4,
    }
}

coded_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MarkerType: "marker type" {
        #[default]
        None = 0,
        Point = 1,
        Pixel = 2,
        Circle = 3,
        Triangle = 4,
        Square = 5,
        Plus = 6,
        Cross = 7,
        Diamond = 8,
    }
}

coded_enum! {
    /// How a series with two remaining dimensions is drawn.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PlotType3D: "3-D plot type" {
        #[default]
        Pseudocolor = 0,
        FilledContour = 1,
        Contour = 2,
    }
}

coded_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ConfidenceStyle: "error bar style" {
        None = 0,
        ErrorBars = 1,
        #[default]
        Band = 2,
    }
}

coded_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LegendLocation: "legend location" {
        #[default]
        Best = 0,
        UpperRight = 1,
        UpperLeft = 2,
        LowerLeft = 3,
        LowerRight = 4,
        Right = 5,
        CenterLeft = 6,
        CenterRight = 7,
        LowerCenter = 8,
        UpperCenter = 9,
        Center = 10,
    }
}

coded_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ColorMap: "colormap" {
        #[default]
        Jet = 0,
        Hsv = 1,
        Hot = 2,
        Cool = 3,
        Spring = 4,
        Summer = 5,
        Autumn = 6,
        Winter = 7,
        Gray = 8,
        Bone = 9,
        Copper = 10,
        Pink = 11,
    }
}

impl ColorMap {
    /// Colour at position `t` in `[0, 1]`; values outside are clamped.
    pub fn sample(self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let clamp = |v: f64| v.clamp(0.0, 1.0);
        let [r, g, b] = match self {
            ColorMap::Jet => [
                clamp(1.5 - (4.0 * t - 3.0).abs()),
                clamp(1.5 - (4.0 * t - 2.0).abs()),
                clamp(1.5 - (4.0 * t - 1.0).abs()),
            ],
            ColorMap::Hsv => hue(t),
            ColorMap::Hot => hot(t),
            ColorMap::Cool => [t, 1.0 - t, 1.0],
            ColorMap::Spring => [1.0, t, 1.0 - t],
            ColorMap::Summer => [t, 0.5 + t / 2.0, 0.4],
            ColorMap::Autumn => [1.0, t, 0.0],
            ColorMap::Winter => [0.0, t, 1.0 - t / 2.0],
            ColorMap::Gray => [t, t, t],
            ColorMap::Bone => {
                let [hr, hg, hb] = hot(t);
                [(7.0 * t + hb) / 8.0, (7.0 * t + hg) / 8.0, (7.0 * t + hr) / 8.0]
            }
            ColorMap::Copper => [clamp(1.25 * t), 0.7812 * t, 0.4975 * t],
            ColorMap::Pink => {
                let [hr, hg, hb] = hot(t);
                [
                    ((2.0 * t + hr) / 3.0).sqrt(),
                    ((2.0 * t + hg) / 3.0).sqrt(),
                    ((2.0 * t + hb) / 3.0).sqrt(),
                ]
            }
        };
        Color::from_normalized(r, g, b)
    }
}

fn hot(t: f64) -> [f64; 3] {
    [
        (t / 0.365).clamp(0.0, 1.0),
        ((t - 0.365) / 0.381).clamp(0.0, 1.0),
        ((t - 0.746) / 0.254).clamp(0.0, 1.0),
    ]
}

fn hue(t: f64) -> [f64; 3] {
    let h = (t * 6.0) % 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    match h as u8 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}

/// Line and marker settings as stored in a property tree; unset leaves fall
/// back to the default tree and then to [`PlotStyle::default`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_have_marker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_style: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_type: Option<MarkerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_face_color: Option<Color>,
}

impl LineProperties {
    /// Fully populated defaults drawn in `color`.
    pub fn defaults(color: Color) -> Self {
        let style = PlotStyle::default();
        Self {
            can_have_marker: Some(true),
            line_style: Some(style.line_style),
            line_width: Some(style.line_width),
            color: Some(color),
            marker_type: Some(style.marker),
            marker_size: Some(style.marker_size),
            marker_face_color: Some(color),
        }
    }

    /// Resolves every leaf, preferring `self` over `defaults`.
    pub fn resolve(&self, defaults: &LineProperties) -> PlotStyle {
        let fallback = PlotStyle::default();
        PlotStyle {
            line_style: self.line_style.or(defaults.line_style).unwrap_or(fallback.line_style),
            line_width: self.line_width.or(defaults.line_width).unwrap_or(fallback.line_width),
            color: self.color.or(defaults.color).unwrap_or(fallback.color),
            marker: self.marker_type.or(defaults.marker_type).unwrap_or(fallback.marker),
            marker_size: self.marker_size.or(defaults.marker_size).unwrap_or(fallback.marker_size),
            marker_face_color: self
                .marker_face_color
                .or(defaults.marker_face_color)
                .unwrap_or(fallback.marker_face_color),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Resolved style handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotStyle {
    pub line_style: LineStyle,
    pub line_width: f64,
    pub color: Color,
    pub marker: MarkerType,
    pub marker_size: f64,
    pub marker_face_color: Color,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            line_style: LineStyle::Solid,
            line_width: 1.0,
            color: Color::new(0, 0, 255),
            marker: MarkerType::None,
            marker_size: 6.0,
            marker_face_color: Color::new(0, 0, 255),
        }
    }
}

impl PlotStyle {
    pub fn has_line(&self) -> bool {
        self.line_style != LineStyle::None
    }

    pub fn has_marker(&self) -> bool {
        self.marker != MarkerType::None
    }

    /// Neither a line nor markers would be drawn.
    pub fn is_invisible(&self) -> bool {
        !self.has_line() && !self.has_marker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brighten_moves_towards_white() {
        assert_eq!(Color::new(0, 0, 255).brighten(0.5), Color::new(128, 128, 255));
        assert_eq!(Color::BLACK.brighten(0.0), Color::BLACK);
        assert_eq!(Color::BLACK.brighten(1.0), Color::WHITE);
    }

    #[test]
    fn normalized_channels() {
        assert_eq!(Color::new(255, 0, 51).normalized(), [1.0, 0.0, 0.2]);
    }

    #[test]
    fn line_properties_fall_back_in_order() {
        let forced = LineProperties {
            line_width: Some(3.0),
            ..Default::default()
        };
        let defaults = LineProperties::defaults(Color::new(255, 0, 0));
        let style = forced.resolve(&defaults);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, Color::new(255, 0, 0));
        assert_eq!(style.line_style, LineStyle::Solid);
        assert!(!style.has_marker());

        let bare = LineProperties::default().resolve(&LineProperties::default());
        assert_eq!(bare, PlotStyle::default());
    }

    #[test]
    fn colormap_end_points() {
        assert_eq!(ColorMap::Gray.sample(0.0), Color::BLACK);
        assert_eq!(ColorMap::Gray.sample(1.0), Color::WHITE);
        assert_eq!(ColorMap::Jet.sample(0.0), Color::new(0, 0, 128));
        assert_eq!(ColorMap::Jet.sample(1.0), Color::new(128, 0, 0));
        assert_eq!(ColorMap::Hot.sample(1.0), Color::WHITE);
        assert_eq!(ColorMap::Gray.sample(f64::NAN), Color::BLACK);
    }

    #[test]
    fn style_codes() {
        assert_eq!(MarkerType::try_from(8), Ok(MarkerType::Diamond));
        assert!(MarkerType::try_from(9).is_err());
        assert_eq!(ColorMap::ALL.len(), 12);
        assert_eq!(LegendLocation::try_from(10), Ok(LegendLocation::Center));
        assert_eq!(
            PlotType3D::try_from(3).unwrap_err().to_string(),
            "Unknown 3-D plot type code 3"
        );
    }
}
