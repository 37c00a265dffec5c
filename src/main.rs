use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thumbsmith::config::{self, TransformConfig};
use thumbsmith::imaging::{Method, RustCodec};
use thumbsmith::pipeline::Pipeline;
use thumbsmith::request::{RequestParams, Source, TransformRequest};

/// Shared flags for commands that describe a transformation.
#[derive(clap::Args, Clone)]
struct TransformArgs {
    /// Source image path, or a JSON object with a "file" key
    source: Source,

    /// Target width in pixels
    #[arg(long)]
    width: u32,

    /// Target height in pixels
    #[arg(long)]
    height: u32,

    /// Transformation method: resize (aspect-preserving fit) or crop
    /// (fill + centered crop)
    #[arg(long, default_value = "resize")]
    method: Method,

    /// Encoder quality (0-100); defaults to the configured quality
    #[arg(long)]
    quality: Option<u32>,

    /// Skip watermark compositing even when a watermark is configured
    #[arg(long)]
    no_watermark: bool,

    /// Additional parameter as name=value (repeatable); unknown names are
    /// passed to the encoder untouched
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,
}

#[derive(Parser)]
#[command(name = "thumbsmith")]
#[command(about = "On-demand image transformation with deterministic cache paths")]
#[command(long_about = "\
On-demand image transformation with deterministic cache paths

Every transformation is addressed by its parameters: method, width, height,
source, and whether a watermark is applied. The same parameters always map
to the same cache path, so transformed images are computed once and served
from disk afterwards.

  thumbsmith transform photos/cat.jpg --width 800 --height 600
  thumbsmith transform photos/cat.jpg --width 400 --height 400 --method crop
  thumbsmith path photos/cat.jpg --width 800 --height 600

Run 'thumbsmith gen-config' to generate a documented thumbsmith.toml.")]
#[command(version)]
struct Cli {
    /// Config file (TOML); stock defaults are used when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform an image and save it at its derived cache path
    Transform {
        #[command(flatten)]
        args: TransformArgs,

        /// Re-encode even if the cached output already exists
        #[arg(long)]
        force: bool,
    },
    /// Print the derived cache path without transforming anything
    Path {
        #[command(flatten)]
        args: TransformArgs,
    },
    /// Print a stock thumbsmith.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => TransformConfig::load(path)?,
        None => TransformConfig::default(),
    };

    match cli.command {
        Command::Transform { args, force } => {
            let codec = RustCodec::new();
            let mut pipeline = Pipeline::new(&codec, &config, build_request(&args)?)?;
            let cache_path = pipeline.cache_path()?;
            if !force && std::path::Path::new(&cache_path).exists() {
                println!("cached: {cache_path}");
                return Ok(());
            }
            let saved = pipeline.save()?;
            println!("saved: {}", saved.display());
        }
        Command::Path { args } => {
            let codec = RustCodec::new();
            let pipeline = Pipeline::new(&codec, &config, build_request(&args)?)?;
            println!("{}", pipeline.cache_path()?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn build_request(args: &TransformArgs) -> Result<TransformRequest, Box<dyn std::error::Error>> {
    let mut params = RequestParams::from_pairs(args.set.iter().map(|entry| {
        entry
            .split_once('=')
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .unwrap_or_else(|| (entry.clone(), String::new()))
    }))?;

    // Dedicated flags win over --set pairs
    params.merge(RequestParams {
        width: Some(args.width),
        height: Some(args.height),
        method: Some(args.method),
        quality: args.quality,
        watermark: args.no_watermark.then_some(false),
        ..RequestParams::default()
    });

    Ok(TransformRequest::new(args.source.clone()).with_params(params))
}
