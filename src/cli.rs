use crate::config::{load_config, Config, ParameterStyle};
use crate::format::{format_document, FormatOptions};
use crate::ir::GraphDocument;
use crate::layout_dump::write_layout_dump;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ngfmt", version, about = "Auto-layout for node graph parameters")]
pub struct Args {
    /// Input graph document (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Name of the node whose parameters are formatted
    #[arg(short = 'r', long = "root")]
    pub root: String,

    /// Node that keeps its position (defaults to the root)
    #[arg(short = 'k', long = "keep-still")]
    pub keep_still: Option<String>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// What to write
    #[arg(short = 'e', long = "emit", value_enum, default_value = "graph")]
    pub emit: Emit,

    /// Nodes that must not be moved (comma separated)
    #[arg(long = "ignore", value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Restrict formatting to these nodes (comma separated)
    #[arg(long = "only", value_delimiter = ',')]
    pub only: Vec<String>,

    /// Override the configured parameter style
    #[arg(long = "style", value_enum)]
    pub style: Option<StyleArg>,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// The input document with updated positions
    Graph,
    /// Formatter internals: formatted set, parents, same-row pairs
    Dump,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleArg {
    LeftSide,
    Helixing,
}

impl From<StyleArg> for ParameterStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::LeftSide => ParameterStyle::LeftSide,
            StyleArg::Helixing => ParameterStyle::Helixing,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let (graph, formatter) = format_document(&input, &args.root, &args.format_options(&config))?;

    match args.emit {
        Emit::Graph => {
            let document = GraphDocument::from_graph(&graph);
            write_json(args.output.as_deref(), &document)?;
        }
        Emit::Dump => write_layout_dump(args.output.as_deref(), &graph, &formatter)?,
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = format!("nodegraph_format={level},ngfmt={level}");
    if std::env::var("RUST_LOG").is_err() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&filter)).init();
    } else {
        env_logger::init();
    }
}

impl Args {
    fn format_options(&self, config: &Config) -> FormatOptions {
        FormatOptions {
            config: config.formatter.clone(),
            keep_still: self.keep_still.clone(),
            ignore: self.ignore.clone(),
            only: self.only.clone(),
            style: self.style.map(ParameterStyle::from),
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_json<T: serde::Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    match path {
        Some(path) => std::fs::write(path, json)?,
        None => io::stdout().write_all(json.as_bytes())?,
    }
    Ok(())
}
