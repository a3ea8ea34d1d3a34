//! Command-line interface for grape
//! Runs a grape pattern over an HTML page and prints the extracted records as JSON.
//!
//! Usage:
//!   grape `<pattern>` [`<html>`]              - Extract a list of records, one per match
//!   grape `<pattern>` [`<html>`] --single     - Merge every match into one record
//!
//! The HTML is read from stdin when no file is given.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use grape::{Document, Pattern};
use grape_config::{GrapeConfig, Loader, OutputMode};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type Row = BTreeMap<String, String>;

fn main() {
    let matches = Command::new("grape")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract records from HTML with grape patterns")
        .arg_required_else_help(true)
        .arg(
            Arg::new("pattern")
                .help("Path to the grape pattern file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("html")
                .help("Path to the HTML document (default: stdin)")
                .index(2),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("single")
                .long("single")
                .help("Write every match into a single record")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("compact")
                .long("compact")
                .help("Print JSON on one line")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    init_logging(&config);

    let pattern_path = matches
        .get_one::<String>("pattern")
        .context("missing pattern path")?;
    let source = fs::read_to_string(pattern_path)
        .with_context(|| format!("reading pattern {}", pattern_path))?;
    let mut pattern: Pattern = source
        .parse()
        .with_context(|| format!("compiling pattern {}", pattern_path))?;
    pattern.register_filters(config.filters()?);
    debug!(rules = pattern.rules().len(), "pattern ready");

    let document = match matches.get_one::<String>("html") {
        Some(path) => {
            let file = fs::File::open(path).with_context(|| format!("opening {}", path))?;
            Document::from_reader(file).with_context(|| format!("reading {}", path))?
        }
        None => Document::from_reader(io::stdin().lock()).context("reading stdin")?,
    };

    let output = match config.output.mode {
        OutputMode::Single => {
            let mut row = Row::new();
            pattern.find(&document, &mut row)?;
            render(&row, config.output.pretty)?
        }
        OutputMode::List => {
            let mut rows: Vec<Row> = Vec::new();
            pattern.find_all(&document, &mut rows)?;
            render(&rows, config.output.pretty)?
        }
    };
    println!("{}", output);
    Ok(())
}

/// Layers the optional config file and the output flags over the defaults.
fn load_config(matches: &ArgMatches) -> Result<GrapeConfig> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if matches.get_flag("single") {
        loader = loader.set_override("output.mode", "single")?;
    }
    if matches.get_flag("compact") {
        loader = loader.set_override("output.pretty", false)?;
    }
    loader.build().context("loading configuration")
}

fn init_logging(config: &GrapeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    // Logs go to stderr so stdout stays valid JSON
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn render<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
