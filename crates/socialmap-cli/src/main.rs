use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use socialmap_core::{House, Role};
use socialmap_graph::{FilterState, Frame, RegionOutline, Viewer, ViewerConfig};
use std::path::PathBuf;

mod dataset;

use dataset::Dataset;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON dataset (characters, social groups, relationships)
    #[arg(short, long)]
    data: PathBuf,

    /// Path to a JSON viewer config; omitted fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulation steps to run before dumping the frame
    #[arg(short, long, default_value_t = 300)]
    ticks: usize,

    /// Entity id to focus on
    #[arg(long)]
    focus: Option<String>,

    /// Role label to uncheck, e.g. "Hogwarts Staff" (repeatable)
    #[arg(long)]
    hide_role: Vec<String>,

    /// House label to uncheck, e.g. "Slytherin" (repeatable)
    #[arg(long)]
    hide_house: Vec<String>,

    /// Write the frame here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Output<'a> {
    outlines: &'a [RegionOutline],
    frame: Frame,
}

fn filter_from(args: &Args) -> Result<FilterState> {
    let mut filter = FilterState::all();
    for label in &args.hide_role {
        filter = filter.without_role(Role::try_from(label.as_str())?);
    }
    for label in &args.hide_house {
        filter = filter.without_house(House::try_from(label.as_str())?);
    }
    if let Some(focus) = &args.focus {
        filter = filter.with_focus(focus.as_str());
    }
    Ok(filter)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let dataset = Dataset::load(&args.data)?;
    let entities = dataset.entities();
    let relationships = dataset.relationships();
    tracing::info!(
        "Loaded {} entities and {} relationship records from {}",
        entities.len(),
        relationships.len(),
        args.data.display()
    );

    let mut viewer = Viewer::create(entities, &relationships, config)?;
    let filter = filter_from(&args)?;
    let delta = viewer.project(filter);
    tracing::info!(
        "Projection shows {} nodes ({} hidden)",
        viewer.projection().nodes.len(),
        delta.removed.len()
    );

    for _ in 0..args.ticks {
        viewer.tick();
    }

    let output = Output {
        outlines: viewer.regions().outlines(),
        frame: viewer.frame(),
    };
    let json = serde_json::to_string_pretty(&output)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Wrote frame to {:?}", path);
        }
        None => println!("{json}"),
    }

    viewer.dispose();
    Ok(())
}
