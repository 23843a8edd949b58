//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Dependency-aware rebuilds and live reload for front-end sources
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: livefront.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = crate::config::DEFAULT_CONFIG, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile sources with a configured dialect (jade, stylus, markdown, ...)
    #[command(visible_alias = "c")]
    Compile {
        /// Directory to compile (default: config directory or cwd)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,

        /// Recurse through directories
        #[arg(short, long)]
        recursive: bool,

        /// Recompile on modification, dependents included
        #[arg(short, long)]
        watch: bool,

        /// Output directory mirroring the source layout
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: Option<PathBuf>,

        /// Serve files over HTTP, optionally on PORT
        #[arg(short, long, value_name = "PORT", num_args = 0..=1)]
        serve: Option<Option<u16>>,

        /// Live reload; implies --watch and --serve
        #[arg(short, long, value_name = "PORT", num_args = 0..=1)]
        live: Option<Option<u16>>,
    },

    /// Serve files on HOST:PORT (default 127.0.0.1:3000)
    #[command(visible_alias = "s")]
    Serve {
        /// Port number to listen on
        port: Option<u16>,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        host: Option<IpAddr>,

        /// Run `compile -rw` alongside the server
        #[arg(short, long)]
        compile: bool,

        /// Refresh the browser when HTML/CSS/JS files change
        #[arg(short, long)]
        live: bool,

        /// Output directory for --compile
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: Option<PathBuf>,
    },

    /// Minify CSS/JS files matching a regular expression
    #[command(visible_alias = "m")]
    Minify {
        #[command(flatten)]
        args: MinifyArgs,
    },
}

/// Minify command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct MinifyArgs {
    /// Regular expression matched against paths relative to the root
    pub pattern: Option<String>,

    /// Also search subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Shortcut for all CSS files
    #[arg(long)]
    pub css: bool,

    /// Shortcut for all JS files
    #[arg(long)]
    pub js: bool,

    /// Treat PATTERN as a literal path instead of a regular expression
    #[arg(short, long)]
    pub plain: bool,

    /// Output name; `{{ name }}` and `{{ extension }}` are substituted
    #[arg(short, long, default_value = "{{ name }}.min.{{ extension }}")]
    pub out: String,

    /// Treat matched files as TYPE (css or js) regardless of extension
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    /// Replace matched files with their minified versions
    #[arg(long)]
    pub overwrite: bool,
}

impl Commands {
    /// Explicit root argument, if the command takes one.
    pub fn root(&self) -> Option<&PathBuf> {
        match self {
            Self::Compile { root, .. } => root.as_ref(),
            Self::Serve { .. } | Self::Minify { .. } => None,
        }
    }
}
