use std::{fs::File, io::BufReader, path::PathBuf};

use clap::Parser;
use color_eyre::eyre::{self, WrapErr};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use varplot_core::{
    store::{CustomVariableStore, MergedVariableStore},
    tree::{TreeNode, OTHER_NODE},
    AnyStore, Variable, VariableStore,
};
use varplot_figure::{
    backend::BackendError, figure::DEFAULT_DPI, Figure, FigureProperties, RecordingBackend,
};

mod devc;
mod render;
mod select;

use select::{parse_flatten, parse_slice, split_variable, Transforms};

/// Source name of the variables built by transforms.
const SELECTION_SOURCE: &str = "selection";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Device CSV file, registered as a source named by its file stem
    #[arg(long = "csv", value_name = "FILE", required = true)]
    csv: Vec<PathBuf>,

    /// Merge all CSV sources into one along a new dimension
    #[arg(long, value_name = "DIM")]
    merge: Option<String>,

    /// Variable to plot, optionally as SOURCE/NAME
    #[arg(long = "var", value_name = "NAME")]
    vars: Vec<String>,

    /// Average every variable over a dimension
    #[arg(long, value_name = "DIM")]
    average: Option<String>,

    /// Use the median instead of the mean when averaging
    #[arg(long, requires = "average")]
    median: bool,

    /// Slice every variable at a coordinate
    #[arg(long = "slice", value_name = "DIM=VALUE", value_parser = parse_slice)]
    slices: Vec<(String, f64)>,

    /// Combine a dimension into another one
    #[arg(long, value_name = "DIM:TARGET", value_parser = parse_flatten)]
    flatten: Option<(String, String)>,

    /// Forced figure properties
    #[arg(long, value_name = "TOML")]
    properties: Option<PathBuf>,

    /// Print the computed default properties as TOML
    #[arg(long)]
    dump_defaults: bool,

    /// List the variables of every source and exit
    #[arg(long)]
    list: bool,

    #[arg(short, long, value_name = "PNG")]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    #[arg(long, default_value_t = DEFAULT_DPI)]
    dpi: u32,
}

impl Cli {
    fn transforms(&self) -> Transforms {
        Transforms {
            slices: self.slices.clone(),
            flatten: self.flatten.clone(),
            average: self.average.clone(),
            median: self.median,
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();

    let sources = load_sources(&args)?;
    if args.list {
        list_variables(&sources)?;
        return Ok(());
    }

    let (width, height) = (args.width, args.height);
    let backend = RecordingBackend::with_exporter(move |scene, path, dpi| {
        render::render_png(scene, path, (width, height), dpi)
            .map_err(|e| BackendError::Export(e.to_string()))
    });
    let mut figure = Figure::new(backend);

    // one update once everything is in place
    figure.set_updating(false)?;
    let selected = select_variables(&args, &sources)?;
    let transforms = args.transforms();
    if transforms.is_empty() {
        for (name, store) in sources {
            figure.add_data_source(name, store);
        }
        for (source, name) in &selected {
            figure.add_variable(name, Some(source), false)?;
        }
    } else {
        let mut selection = CustomVariableStore::new();
        let mut names = Vec::new();
        for (source, name) in &selected {
            let variable = lookup(&sources, source)?
                .variable(name)
                .ok_or_else(|| eyre::eyre!("No variable {name} in {source}"))?;
            let variable = transforms
                .apply(variable)
                .wrap_err_with(|| format!("Transforming {source}/{name}"))?;
            names.push(variable.name().to_string());
            selection.add_variable(variable)?;
        }
        figure.add_data_source(SELECTION_SOURCE, selection);
        for name in &names {
            figure.add_variable(name, Some(SELECTION_SOURCE), false)?;
        }
    }

    if let Some(path) = &args.properties {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Reading properties from {}", path.display()))?;
        let properties: FigureProperties = toml::from_str(&text)
            .wrap_err_with(|| format!("Parsing properties from {}", path.display()))?;
        let properties = merge_series(properties, figure.properties());
        figure.set_properties(properties)?;
    }
    figure.set_updating(true)?;
    info!("Figure has {} series", figure.properties().series.len());

    if args.dump_defaults {
        println!("{}", toml::to_string_pretty(figure.default_properties())?);
    }
    if let Some(output) = &args.output {
        figure
            .export_to_file(output, args.dpi)
            .wrap_err_with(|| format!("Writing {}", output.display()))?;
        info!("Wrote {}", output.display());
    }
    Ok(())
}

/// Device files by source name, merged into one when requested.
fn load_sources(args: &Cli) -> color_eyre::Result<Vec<(String, AnyStore)>> {
    let mut sources = Vec::with_capacity(args.csv.len());
    for path in &args.csv {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| eyre::eyre!("Unusable file name {}", path.display()))?
            .to_string();
        let file = File::open(path).wrap_err_with(|| format!("Opening {}", path.display()))?;
        let store = devc::from_reader(BufReader::new(file))
            .wrap_err_with(|| format!("Parsing {}", path.display()))?;
        debug!("Loaded {} variables from {}", store.len(), path.display());
        sources.push((name, AnyStore::from(store)));
    }

    Ok(match &args.merge {
        Some(dimension) => {
            let (names, stores): (Vec<_>, Vec<_>) = sources.into_iter().unzip();
            let merged = MergedVariableStore::with_dimension(stores, dimension, dimension);
            vec![(names.join("+"), merged.into())]
        }
        None => sources,
    })
}

fn lookup<'a>(sources: &'a [(String, AnyStore)], name: &str) -> color_eyre::Result<&'a AnyStore> {
    sources
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, store)| store)
        .ok_or_else(|| eyre::eyre!("No source named {name}"))
}

/// `(source, name)` of every requested variable. Without `--var` every
/// variable of the first source is taken.
fn select_variables(
    args: &Cli,
    sources: &[(String, AnyStore)],
) -> color_eyre::Result<Vec<(String, String)>> {
    let (default, store) = sources
        .first()
        .ok_or_else(|| eyre::eyre!("No data sources"))?;
    if args.vars.is_empty() {
        return Ok(store
            .variable_names()
            .into_iter()
            .map(|name| (default.clone(), name))
            .collect());
    }
    Ok(args
        .vars
        .iter()
        .map(|var| match split_variable(var) {
            (Some(source), name) => (source.to_string(), name.to_string()),
            (None, name) => (default.clone(), name.to_string()),
        })
        .collect())
}

/// Series from the file override the command line selection; series only
/// selected on the command line are kept.
fn merge_series(mut properties: FigureProperties, current: &FigureProperties) -> FigureProperties {
    for series in &current.series {
        if !properties.series.contains(&series.id) {
            properties.series.push(series.clone());
        }
    }
    properties
}

fn list_variables(sources: &[(String, AnyStore)]) -> color_eyre::Result<()> {
    for (name, store) in sources {
        let schema = TreeNode::new(name.as_str()).with_child(TreeNode::new(OTHER_NODE));
        let tree = store.variable_tree(&schema)?;
        print_tree(&tree, 0);
    }
    Ok(())
}

fn print_tree(node: &TreeNode, depth: usize) {
    let label = node.label.as_deref().unwrap_or(&node.name);
    println!("{:indent$}{} ({})", "", label, node.name, indent = depth * 2);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}
