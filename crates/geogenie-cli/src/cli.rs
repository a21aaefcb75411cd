use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GeoGenie - Natural-language geoprocessing
#[derive(Parser, Debug)]
#[command(name = "geogenie")]
#[command(about = "Run buffer, clip, reproject, dissolve and intersection from plain-language requests", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ~/.geogenie/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Language-model provider (openai, anthropic or ollama)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model name for the selected provider
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a request, confirm it and run it
    Run(RunArgs),

    /// Print the prompt that would be sent to the model
    Prompt(PromptArgs),

    /// List the layers the model would see
    Layers(LayersArgs),

    /// Show the effective configuration and where each value comes from
    Config,

    /// Manage stored API keys
    Key(KeyArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// The request, e.g. "buffer the schools layer by 100 meters"
    pub text: String,

    /// GeoJSON file to load as a layer (repeatable)
    #[arg(long = "layer", short = 'l', value_name = "FILE")]
    pub layers: Vec<PathBuf>,

    /// Skip the confirmation dialog
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Write the output layer to this GeoJSON file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct PromptArgs {
    /// The request text
    pub text: String,

    /// GeoJSON file to load as a layer (repeatable)
    #[arg(long = "layer", short = 'l', value_name = "FILE")]
    pub layers: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct LayersArgs {
    /// GeoJSON file to load as a layer (repeatable)
    #[arg(long = "layer", short = 'l', value_name = "FILE")]
    pub layers: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub command: KeyCommand,
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Store the API key of a provider
    Set(KeySetArgs),

    /// Show which providers have a key available
    Status,
}

#[derive(Parser, Debug)]
pub struct KeySetArgs {
    /// Provider the key belongs to
    pub provider: String,

    /// The key; prompted for without echo when omitted
    pub key: Option<String>,
}
