//! Clap derive structures for the `shoremap` CLI.
//!
//! Only clap types live here so `build.rs` can compile this file on its
//! own to render man pages and completions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// shoremap -- drive the beach map's interaction layer from a terminal
#[derive(Debug, Parser)]
#[command(
    name = "shoremap",
    version,
    about = "Inspect and simulate the shoremap beach map from the command line",
    long_about = "Works with the interaction layer behind the shoremap beach map.\n\n\
        Lists the recipe table, replays recipes against a headless map and\n\
        prints the bus traffic they cause, and talks to the beach, POI and\n\
        weather proxies.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the platform default
    #[arg(long, env = "SHOREMAP_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the data proxies (overrides config)
    #[arg(long, env = "SHOREMAP_API_URL", global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "SHOREMAP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format [default: table, or `defaults.output` from config]
    #[arg(long, short = 'o', env = "SHOREMAP_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto, or `defaults.color` from config]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Kinds of selectable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Beach,
    Poi,
    Region,
    State,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect the active recipe table
    #[command(alias = "r")]
    Recipes(RecipesArgs),

    /// Run a recipe against a headless map and print the bus traffic
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Fetch the beach and POI collections the map starts with
    Prefetch,

    /// Fetch current weather readings for a beach
    Weather {
        /// Beach id
        location: String,
    },

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RECIPES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RecipesArgs {
    #[command(subcommand)]
    pub command: RecipesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RecipesCommand {
    /// List recipes, built-in and configured
    #[command(alias = "ls")]
    List,

    /// Show the steps of one recipe
    Show {
        /// Recipe name (e.g. selectBeachFromMap)
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SIMULATE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Recipe name to run
    pub recipe: String,

    /// GeoJSON feature the interaction is about
    #[arg(long, short = 'f', value_name = "FILE", conflicts_with = "feature_id")]
    pub feature_file: Option<PathBuf>,

    /// Id of a cached beach or POI the interaction is about
    #[arg(long, value_name = "ID")]
    pub feature_id: Option<String>,

    /// Entity type of the feature (inferred from its layer when omitted)
    #[arg(long, short = 't')]
    pub entity_type: Option<EntityKind>,

    /// Lay the page out as a phone would
    #[arg(long, short = 'm')]
    pub mobile: bool,

    /// Prefetch from the proxies instead of the canned collections
    #[arg(long)]
    pub live: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Write a config file with the shipped defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
