use std::{cell::RefCell, rc::Rc};

use approx::assert_abs_diff_eq;
use ndarray::{array, ArrayD};
use varplot_core::{
    store::{CustomVariableStore, MemoryStore, MergedVariableStore},
    variable::{DataType, DimensionInfo, SourceVariable, VariableAverage},
    AnyStore, Variable, VariableStore,
};

use super::*;
use crate::{
    backend::{AxisRole, RecordingBackend, SceneItem, TickSpec},
    style::{Color, ConfidenceStyle, PlotType3D},
    time::{num_to_date, TickFormat, TimeLocation},
};

fn series(name: &str, dims: &[&str], data: ArrayD<f64>, time: ArrayD<f64>) -> SourceVariable {
    SourceVariable::builder(name, dims.iter().copied(), data)
        .coords("time", time)
        .build()
        .unwrap()
}

fn temp_store(values: [f64; 3]) -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .add_variable(series(
            "temp",
            &["time"],
            ndarray::Array1::from(values.to_vec()).into_dyn(),
            array![0.0, 1.0, 2.0].into_dyn(),
        ))
        .unwrap();
    store.set_dimension_info("time", DimensionInfo::new("time").with_unit("s"));
    store
}

fn figure_with(store: impl Into<AnyStore>) -> Figure<RecordingBackend> {
    let mut figure = Figure::new(RecordingBackend::new());
    figure.add_data_source("run1", store);
    figure
}

fn line_xy(item: &SceneItem) -> (Vec<f64>, Vec<f64>) {
    match item {
        SceneItem::Line { x, y, .. } => (x.to_vec(), y.to_vec()),
        other => panic!("not a line: {other:?}"),
    }
}

#[test]
fn single_line_with_default_axes() {
    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    figure.add_variable("temp", None, false).unwrap();

    let scene = figure.backend().scene();
    let lines: Vec<_> = scene.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(line_xy(lines[0]), (vec![0.0, 1.0, 2.0], vec![10.0, 12.0, 14.0]));
    assert_eq!(scene.title.as_ref().map(|(t, _)| t.as_str()), Some("temp"));
    assert!(scene.colorbar.is_none());
    assert!(scene.legend.is_none());
    assert_eq!(scene.axis(AxisRole::X).unwrap().limits, Some((0.0, 2.0)));
    assert_eq!(scene.axis(AxisRole::Y).unwrap().limits, Some((10.0, 14.0)));
    assert_eq!(
        scene.axis(AxisRole::X).unwrap().label.as_ref().map(|(l, _)| l.as_str()),
        Some("time (s)")
    );
    assert_eq!(scene.draws, 1);

    let defaults = figure.default_properties();
    let series = defaults.series.get("/temp").unwrap();
    assert_eq!(series.label.as_deref(), Some("temp"));
    assert_eq!(series.dimension_count, Some(1));
    assert_eq!(series.has_confidence_limits, Some(false));
    assert_eq!(defaults.title.as_deref(), Some("temp"));
    assert_eq!(defaults.can_have_legend, Some(true));
    assert_eq!(defaults.has_color_map, Some(false));
    assert_eq!(defaults.axes.get("x").unwrap().minimum, Some(0.0));
    assert!(!defaults.axes.contains("colorbar"));
}

#[test]
fn degenerate_dimension_range_slices_to_a_point() {
    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    figure
        .edit_properties(|p| {
            let time = p.dimensions.get_or_create("time");
            time.minimum = Some(0.5);
            time.maximum = Some(0.5);
        })
        .unwrap();
    figure.add_variable("temp", None, false).unwrap();

    // a scalar has nothing to draw against
    let scene = figure.backend().scene();
    assert!(scene.items.is_empty());
    assert_eq!(scene.draws, 2);
    assert_eq!(figure.default_properties().series.get("/temp").unwrap().dimension_count, None);
}

#[test]
fn forced_dimension_range_limits_the_data() {
    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    figure.add_variable("temp", None, false).unwrap();
    figure
        .edit_properties(|p| p.dimensions.get_or_create("time").minimum = Some(1.5))
        .unwrap();

    let scene = figure.backend().scene();
    let (x, y) = line_xy(scene.lines().next().unwrap());
    assert_eq!(x, vec![1.0, 2.0]);
    assert_eq!(y, vec![12.0, 14.0]);
}

#[test]
fn average_is_drawn_with_a_band() {
    let runs = array![[10.0, 20.0], [12.0, 20.0], [14.0, 20.0]].into_dyn();
    let temp = series("temp", &["run", "time"], runs, array![0.0, 1.0].into_dyn());
    let mut store = CustomVariableStore::new();
    store
        .add_variable(VariableAverage::new(temp.into(), "run").unwrap())
        .unwrap();
    let mut figure = figure_with(store);
    figure.add_variable("avg_temp", None, false).unwrap();

    let scene = figure.backend().scene();
    let sd = (8.0f64 / 3.0).sqrt();
    let (fill_x, fill_y, color, fill_z) = scene
        .items
        .iter()
        .find_map(|item| match item {
            SceneItem::Fill { x, y, color, zorder, .. } => Some((x.to_vec(), y.to_vec(), *color, *zorder)),
            _ => None,
        })
        .unwrap();
    assert_eq!(fill_x, vec![0.0, 1.0, 1.0, 0.0]);
    let expected = [12.0 - sd, 20.0, 20.0, 12.0 + sd];
    for (found, expected) in fill_y.iter().zip(expected) {
        assert_abs_diff_eq!(*found, expected, epsilon = 1e-12);
    }
    assert_eq!(color, Color::LINE_CYCLE[0].brighten(0.5));

    let line = scene.lines().next().unwrap();
    assert!(line.zorder() > fill_z);
    let (_, y) = line_xy(line);
    assert_abs_diff_eq!(y[0], 12.0, epsilon = 1e-12);

    let series = figure.default_properties().series.get("/avg_temp").unwrap();
    assert_eq!(series.has_confidence_limits, Some(true));
    assert_eq!(series.confidence_style, Some(ConfidenceStyle::Band));
}

#[test]
fn error_bars_instead_of_band() {
    let runs = array![[10.0, 20.0], [12.0, 20.0], [14.0, 20.0]].into_dyn();
    let temp = series("temp", &["run", "time"], runs, array![0.0, 1.0].into_dyn());
    let mut store = CustomVariableStore::new();
    store
        .add_variable(VariableAverage::new(temp.into(), "run").unwrap())
        .unwrap();
    let mut figure = figure_with(store);
    figure.add_variable("avg_temp", None, false).unwrap();
    figure
        .edit_properties(|p| {
            p.series.get_or_create("/avg_temp").confidence_style = Some(ConfidenceStyle::ErrorBars)
        })
        .unwrap();

    let scene = figure.backend().scene();
    assert!(!scene.items.iter().any(|i| matches!(i, SceneItem::Fill { .. })));
    let bars = scene
        .items
        .iter()
        .find_map(|item| match item {
            SceneItem::ErrorBars { bars, .. } => Some(bars.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(bars.along, AxisRole::Y);
    assert_abs_diff_eq!(bars.below[0], (8.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(bars.above[1], 0.0, epsilon = 1e-12);
}

fn merged_runs() -> MergedVariableStore {
    MergedVariableStore::with_dimension(
        vec![
            temp_store([10.0, 12.0, 14.0]).into(),
            temp_store([20.0, 22.0, 24.0]).into(),
        ],
        "run",
        "run",
    )
}

#[test]
fn merged_runs_as_pseudocolor() {
    let store = merged_runs();
    assert_eq!(store.variable("temp").unwrap().dimensions(), vec!["run", "time"]);
    let mut figure = figure_with(store);
    figure.add_variable("temp", None, false).unwrap();

    let scene = figure.backend().scene();
    let mesh = scene
        .items
        .iter()
        .find_map(|item| match item {
            SceneItem::Pseudocolor { mesh, .. } => Some(mesh.clone()),
            _ => None,
        })
        .unwrap();
    // rows follow time on the y axis
    assert_eq!(mesh.z, array![[10.0, 20.0], [12.0, 22.0], [14.0, 24.0]]);
    assert_eq!(mesh.x.shape(), &[4, 3]);

    let colorbar = scene.colorbar.as_ref().unwrap();
    assert_eq!(colorbar.limits, (10.0, 24.0));
    assert_eq!(scene.axis(AxisRole::X).unwrap().limits, Some((-0.5, 1.5)));
    assert_eq!(
        scene.axis(AxisRole::Colorbar).unwrap().label.as_ref().map(|(l, _)| l.as_str()),
        Some("temp")
    );

    let defaults = figure.default_properties();
    assert_eq!(defaults.series.get("/temp").unwrap().dimension_count, Some(2));
    assert_eq!(defaults.has_color_map, Some(true));
    assert_eq!(defaults.axes.get("x").unwrap().label.as_deref(), Some("run"));
    assert!(defaults.axes.contains("colorbar"));
}

#[test]
fn contours_record_their_level_count() {
    let mut figure = figure_with(merged_runs());
    figure.add_variable("temp", None, false).unwrap();
    figure
        .edit_properties(|p| {
            p.series.get_or_create("/temp").plot_type_3d = Some(PlotType3D::FilledContour)
        })
        .unwrap();

    let scene = figure.backend().scene();
    assert!(scene.colorbar.is_some());
    let series = figure.default_properties().series.get("/temp").unwrap();
    assert_eq!(series.contour_count, Some(6));

    figure
        .edit_properties(|p| p.series.get_or_create("/temp").contour_count = Some(3))
        .unwrap();
    let levels = figure
        .backend()
        .scene()
        .items
        .iter()
        .find_map(|item| match item {
            SceneItem::Contour { levels, .. } => Some(levels.len()),
            _ => None,
        });
    assert_eq!(levels, Some(5));
}

#[test]
fn second_colorbar_is_an_error() {
    let mut figure = figure_with(merged_runs());
    figure.add_variable("temp", None, false).unwrap();
    let err = figure.add_variable("temp", None, false).unwrap_err();
    assert!(matches!(err, FigureError::MultipleColorbars(id) if id == "/temp"));
}

#[test]
fn replace_reuses_the_series() {
    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    figure.add_variable("temp", None, true).unwrap();
    figure.add_variable("temp", None, true).unwrap();
    assert_eq!(figure.properties().series.len(), 1);
    assert_eq!(figure.backend().scene().lines().count(), 1);
}

#[test]
fn two_lines_get_a_legend_and_cycled_colors() {
    let mut store = temp_store([10.0, 12.0, 14.0]);
    store
        .add_variable(series(
            "pressure",
            &["time"],
            array![1.0, 2.0, 3.0].into_dyn(),
            array![0.0, 1.0, 2.0].into_dyn(),
        ))
        .unwrap();
    let mut figure = figure_with(store);
    figure.add_variable("temp", None, false).unwrap();
    figure.add_variable("pressure", Some("run1"), false).unwrap();

    let scene = figure.backend().scene();
    let legend = scene.legend.as_ref().unwrap();
    let colors: Vec<_> = legend.entries.iter().map(|(style, _)| style.color).collect();
    assert_eq!(colors, vec![Color::LINE_CYCLE[0], Color::LINE_CYCLE[1]]);
    assert_eq!(scene.title.as_ref().unwrap().0, "temp, pressure");

    // dropping a series drops its defaults
    figure
        .edit_properties(|p| {
            p.series.remove("run1/pressure");
        })
        .unwrap();
    assert!(!figure.default_properties().series.contains("run1/pressure"));
    assert!(figure.backend().scene().legend.is_none());

    figure.clear_variables().unwrap();
    assert!(figure.default_properties().axes.is_empty());
}

#[test]
fn log_axis_ignores_non_positive_limits() {
    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    figure.add_variable("temp", None, false).unwrap();
    figure
        .edit_properties(|p| {
            let y = p.axes.get_or_create("y");
            y.log_scale = Some(true);
            y.minimum = Some(-5.0);
            y.maximum = Some(100.0);
        })
        .unwrap();

    let axis = figure.backend().scene().axis(AxisRole::Y).unwrap();
    assert!(axis.log);
    assert_eq!(axis.limits, Some((10.0, 100.0)));
    let defaults = figure.default_properties().axes.get("y").unwrap();
    assert_eq!(defaults.log_scale, Some(false));
    assert_eq!(defaults.can_have_log_scale, Some(true));
}

#[test]
fn time_axis_gets_date_ticks() {
    let mut store = MemoryStore::new();
    store
        .add_variable(series(
            "temp",
            &["time"],
            array![1.0, 2.0, 3.0].into_dyn(),
            array![0.0, 10.0, 20.0].into_dyn(),
        ))
        .unwrap();
    store.set_dimension_info(
        "time",
        DimensionInfo::new("time").with_datatype(DataType::Datetime),
    );
    let mut figure = figure_with(store);
    figure.add_variable("temp", None, false).unwrap();

    let axis = figure.backend().scene().axis(AxisRole::X).unwrap();
    match axis.major {
        Some(TickSpec::Time { locator, format }) => {
            assert_eq!(locator.location, TimeLocation::Day);
            assert_eq!(format, Some(TickFormat::DayMonth));
        }
        other => panic!("expected date ticks, got {other:?}"),
    }
    assert_eq!(axis.minor, Some(TickSpec::Hidden));

    let defaults = figure.default_properties().axes.get("x").unwrap();
    assert_eq!(defaults.is_time_axis, Some(true));
    assert_eq!(defaults.minimum_time, num_to_date(0.0));
    assert_eq!(defaults.maximum_time, num_to_date(20.0));
    assert_eq!(defaults.ticks_major.location_time, Some(TimeLocation::Day));
    assert_eq!(defaults.can_have_log_scale, Some(false));
}

#[test]
fn suspended_updates_run_once() {
    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    assert!(figure.set_updating(false).unwrap());
    figure.add_variable("temp", None, false).unwrap();
    figure
        .edit_properties(|p| p.title = Some("Run 1".to_string()))
        .unwrap();
    assert!(figure.is_dirty());
    assert_eq!(figure.backend().scene().draws, 0);

    assert!(!figure.set_updating(true).unwrap());
    assert!(!figure.is_dirty());
    let scene = figure.backend().scene();
    assert_eq!(scene.draws, 1);
    assert_eq!(scene.title.as_ref().unwrap().0, "Run 1");
    assert!(figure.has_changed());
}

#[test]
fn callbacks_see_whether_series_exist() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    let sink = seen.clone();
    figure.register_callback(FigureEvent::CompleteStateChange, move |has_series| {
        sink.borrow_mut().push(has_series)
    });
    figure.add_variable("temp", None, false).unwrap();
    figure.clear_variables().unwrap();
    assert_eq!(*seen.borrow(), vec![true, false]);
}

#[test]
fn callbacks_report_nothing_drawn_for_point_series() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut store = MemoryStore::new();
    store
        .add_variable(series("temp", &["time"], array![10.0].into_dyn(), array![0.0].into_dyn()))
        .unwrap();
    let mut figure = figure_with(store);
    let sink = seen.clone();
    figure.register_callback(FigureEvent::CompleteStateChange, move |plotted| {
        sink.borrow_mut().push(plotted)
    });
    figure.add_variable("temp", None, false).unwrap();

    // configured, but a single value squeezes to nothing drawable
    assert_eq!(figure.properties().series.len(), 1);
    assert!(figure.backend().scene().items.is_empty());
    assert_eq!(*seen.borrow(), vec![false]);
}

#[test]
fn unresolvable_series() {
    let mut figure = Figure::new(RecordingBackend::new());
    let err = figure.add_variable("temp", None, false).unwrap_err();
    assert!(matches!(err, FigureError::NoDefaultSource { .. }));

    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    let err = figure.add_variable("temp", Some("run2"), false).unwrap_err();
    assert!(matches!(err, FigureError::UnknownSource(name) if name == "run2"));

    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    let err = figure.add_variable("salinity", None, false).unwrap_err();
    assert!(matches!(err, FigureError::MissingVariable { variable, .. } if variable == "salinity"));

    let mut figure = figure_with(temp_store([10.0, 12.0, 14.0]));
    let err = figure
        .edit_properties(|p| {
            p.series.push(SeriesProperties::with_id("temp"));
        })
        .unwrap_err();
    assert!(matches!(err, FigureError::MalformedSeriesId(_)));
}

#[test]
fn invalid_values_are_masked() {
    let mut figure = figure_with(temp_store([10.0, f64::INFINITY, 14.0]));
    figure.add_variable("temp", None, false).unwrap();
    let (_, y) = line_xy(figure.backend().scene().lines().next().unwrap());
    assert!(y[1].is_nan());
    assert_eq!(figure.backend().scene().axis(AxisRole::Y).unwrap().limits, Some((10.0, 14.0)));
}
