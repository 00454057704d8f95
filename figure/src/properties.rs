//! Typed figure property trees.
//!
//! A figure keeps two [`FigureProperties`]: the forced tree with explicit
//! user settings and the default tree that every update recomputes. Every
//! leaf is optional, and a read with default fallback is `forced.or(default)`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use varplot_core::DimBounds;

use crate::{
    style::{
        Color, ColorMap, ConfidenceStyle, LegendLocation, LineProperties, LineStyle, PlotType3D,
    },
    time::{date_to_num, TickFormat, TimeLocation},
};

/// Prefers the forced value, then the default.
pub fn pick<T: Clone>(forced: &Option<T>, default: &Option<T>) -> Option<T> {
    forced.as_ref().or(default.as_ref()).cloned()
}

/// An entry of a repeatable child collection, identified by a string id.
pub trait Keyed {
    fn id(&self) -> &str;
    fn with_id(id: &str) -> Self;
}

/// Repeatable children keyed by id, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Children<T>(Vec<T>);

impl<T> Default for Children<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Keyed> Children<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.0.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.0.iter_mut().find(|c| c.id() == id)
    }

    pub fn get_or_create(&mut self, id: &str) -> &mut T {
        let pos = match self.0.iter().position(|c| c.id() == id) {
            Some(pos) => pos,
            None => {
                self.0.push(T::with_id(id));
                self.0.len() - 1
            }
        };
        &mut self.0[pos]
    }

    /// Appends a new child even if one with the same id exists.
    pub fn push(&mut self, child: T) -> &mut T {
        self.0.push(child);
        let last = self.0.len() - 1;
        &mut self.0[last]
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let pos = self.0.iter().position(|c| c.id() == id)?;
        Some(self.0.remove(pos))
    }

    pub fn ids(&self) -> Vec<String> {
        self.0.iter().map(|c| c.id().to_string()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

impl<T> Children<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.0.iter_mut()
    }

    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.0.retain(f);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<'a, T> IntoIterator for &'a Children<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// Percentage applied to all font sizes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_scaling: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_map: Option<ColorMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_color_map: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_have_legend: Option<bool>,
    pub legend: LegendProperties,
    pub grid: GridProperties,
    #[serde(skip_serializing_if = "Children::is_empty")]
    pub series: Children<SeriesProperties>,
    #[serde(skip_serializing_if = "Children::is_empty")]
    pub axes: Children<AxisProperties>,
    #[serde(skip_serializing_if = "Children::is_empty")]
    pub dimensions: Children<DimensionProperties>,
}

impl FigureProperties {
    /// Defaults of a freshly created figure.
    pub fn initial_defaults() -> Self {
        Self {
            title: None,
            font_name: Some("sans-serif".to_string()),
            font_scaling: Some(100.0),
            color_map: Some(ColorMap::Jet),
            has_color_map: Some(false),
            can_have_legend: None,
            legend: LegendProperties {
                show: Some(false),
                location: Some(LegendLocation::Best),
            },
            grid: GridProperties {
                show: Some(false),
                line: LineProperties {
                    can_have_marker: Some(false),
                    line_style: Some(LineStyle::Dotted),
                    line_width: Some(0.5),
                    ..LineProperties::defaults(Color::BLACK)
                },
            },
            series: Children::default(),
            axes: Children::default(),
            dimensions: Children::default(),
        }
    }

    /// Clears every value. Series, axis and dimension entries are removed
    /// when `delete_optional` is set, otherwise only emptied.
    pub fn clear_values(&mut self, delete_optional: bool) {
        let series_ids = self.series.ids();
        let axis_ids = self.axes.ids();
        let dimension_ids = self.dimensions.ids();
        *self = Self::default();
        if !delete_optional {
            for id in &series_ids {
                self.series.push(SeriesProperties::with_id(id));
            }
            for id in &axis_ids {
                self.axes.push(AxisProperties::with_id(id));
            }
            for id in &dimension_ids {
                self.dimensions.push(DimensionProperties::with_id(id));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LegendLocation>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    pub line: LineProperties,
}

/// One plotted variable, keyed by `source/variable` (`/variable` for the
/// default source).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesProperties {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_type_3d: Option<PlotType3D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_confidence_limits: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_style: Option<ConfidenceStyle>,
    /// Number of contour levels; the default tree holds the count chosen
    /// by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contour_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_edges: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_color_map: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_width: Option<f64>,
    pub line: LineProperties,
}

impl Keyed for SeriesProperties {
    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }
}

/// Settings of one figure axis, keyed by role: `x`, `y`, `z` or `colorbar`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisProperties {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_time_axis: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_scale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_have_log_scale: Option<bool>,
    pub ticks_major: TickProperties,
    pub ticks_minor: TickProperties,
}

impl AxisProperties {
    /// Forced range in plot coordinates, day numbers for time axes.
    pub fn range(&self, time_axis: bool) -> (Option<f64>, Option<f64>) {
        if time_axis {
            (
                self.minimum_time.map(date_to_num),
                self.maximum_time.map(date_to_num),
            )
        } else {
            (self.minimum, self.maximum)
        }
    }
}

impl Keyed for AxisProperties {
    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TickProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_time: Option<TimeLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_time: Option<TickFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_time: Option<u32>,
}

/// Forced range of one data dimension. Equal minimum and maximum take a
/// slice through the dimension at that coordinate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionProperties {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_time: Option<NaiveDateTime>,
}

impl DimensionProperties {
    /// Date-time bounds win over numeric ones.
    pub fn bounds(&self) -> DimBounds {
        DimBounds::new(
            self.minimum_time.map(date_to_num).or(self.minimum),
            self.maximum_time.map(date_to_num).or(self.maximum),
        )
    }
}

impl Keyed for DimensionProperties {
    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::MarkerType;

    #[test]
    fn children_are_keyed() {
        let mut axes: Children<AxisProperties> = Children::default();
        axes.get_or_create("x").minimum = Some(1.0);
        axes.get_or_create("x").maximum = Some(2.0);
        axes.get_or_create("y");
        assert_eq!(axes.ids(), ["x", "y"]);
        assert_eq!(axes.get("x").and_then(|a| a.maximum), Some(2.0));
        assert!(axes.remove("x").is_some());
        assert!(!axes.contains("x"));
    }

    #[test]
    fn pick_prefers_forced() {
        assert_eq!(pick(&Some(1), &Some(2)), Some(1));
        assert_eq!(pick(&None, &Some(2)), Some(2));
        assert_eq!(pick::<i32>(&None, &None), None);
    }

    #[test]
    fn clear_keeps_entries_unless_asked() {
        let mut props = FigureProperties {
            title: Some("t".to_string()),
            ..Default::default()
        };
        props.series.get_or_create("/temp").label = Some("T".to_string());
        props.clear_values(false);
        assert_eq!(props.title, None);
        assert_eq!(props.series.get("/temp"), Some(&SeriesProperties::with_id("/temp")));
        props.clear_values(true);
        assert!(props.series.is_empty());
    }

    #[test]
    fn dimension_bounds_prefer_dates() {
        let dim = DimensionProperties {
            id: "time".to_string(),
            minimum: Some(5.0),
            maximum: Some(7.0),
            minimum_time: NaiveDateTime::default().checked_add_signed(chrono::Duration::days(2)),
            maximum_time: None,
        };
        assert_eq!(dim.bounds(), DimBounds::new(Some(2.0), Some(7.0)));
    }

    #[test]
    fn reads_toml() {
        let props: FigureProperties = toml::from_str(
            r#"
            title = "Run comparison"
            font_scaling = 150.0
            color_map = "hot"

            [legend]
            show = true
            location = "upper_left"

            [[series]]
            id = "run1/temp"
            plot_type_3d = "filled_contour"
            line = { marker_type = "circle", color = { r = 255, g = 0, b = 0 } }

            [[axes]]
            id = "y"
            log_scale = true
            minimum = 0.1

            [[dimensions]]
            id = "time"
            minimum_time = "2000-03-01T00:00:00"
            maximum_time = "2000-03-01T00:00:00"
            "#,
        )
        .unwrap();
        assert_eq!(props.color_map, Some(ColorMap::Hot));
        assert_eq!(props.legend.location, Some(LegendLocation::UpperLeft));
        let series = props.series.get("run1/temp").unwrap();
        assert_eq!(series.plot_type_3d, Some(PlotType3D::FilledContour));
        assert_eq!(series.line.marker_type, Some(MarkerType::Circle));
        assert_eq!(props.axes.get("y").unwrap().log_scale, Some(true));
        let bounds = props.dimensions.get("time").unwrap().bounds();
        assert!(bounds.degenerate_value().is_some());

        let text = toml::to_string(&props).unwrap();
        let back: FigureProperties = toml::from_str(&text).unwrap();
        assert_eq!(back, props);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = toml::from_str::<FigureProperties>(r#"color_map = "rainbow""#);
        assert!(err.is_err());
    }
}
