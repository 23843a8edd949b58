//! Project configuration from `livefront.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── compile    # [compile]
//! │   ├── serve      # [serve]
//! │   └── dialect    # [[dialect]]
//! ├── types/         # ConfigError
//! └── mod.rs         # Config (this file)
//! ```
//!
//! The file is optional. Without one every section takes its defaults and
//! the root is the working directory (or the `compile` ROOT argument).
//! CLI flags override file values.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{CompileConfig, DialectConfig, ReferencesConfig, ServeConfig};
pub use types::ConfigError;

use crate::{
    cli::{Cli, Commands},
    debug, log,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file name looked up when `-C` is not given.
pub const DEFAULT_CONFIG: &str = "livefront.toml";

/// Root configuration structure representing livefront.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Absolute path to the config file; empty when none was found
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute project root (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Rebuild engine settings
    #[serde(default)]
    pub compile: CompileConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// User dialects, `[[dialect]]`
    #[serde(default)]
    pub dialect: Vec<DialectConfig>,
}

impl Config {
    /// Load configuration for the parsed command line.
    ///
    /// Searches upward from cwd for the config file. The root is the
    /// command's ROOT argument, else the config file's directory, else cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let found = find_config_file(&cli.config, &cwd);

        let mut config = match &found {
            Some(path) => Self::from_path(path)?,
            None if cli.config != Path::new(DEFAULT_CONFIG) => {
                bail!("config file '{}' not found", cli.config.display());
            }
            None => {
                debug!("config"; "no {} found, using defaults", DEFAULT_CONFIG);
                Self::default()
            }
        };

        let root = match cli.command.root() {
            Some(root) => cwd.join(root),
            None => found
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or(cwd),
        };
        if !root.is_dir() {
            bail!("root '{}' is not a directory", root.display());
        }

        config.config_path = found.unwrap_or_default();
        config.finalize(cli, &root);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides and make paths absolute.
    fn finalize(&mut self, cli: &Cli, root: &Path) {
        self.root = crate::utils::path::normalize_path(root);
        if !self.config_path.as_os_str().is_empty() {
            self.config_path = crate::utils::path::normalize_path(&self.config_path);
        }

        self.apply_command_options(cli);

        if let Some(output) = self.compile.output_dir() {
            self.compile.output = crate::utils::path::normalize_path(&self.root.join(output));
        }
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub(crate) fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.compile.poll_interval == 0 {
            bail!(ConfigError::Validation(
                "compile.poll_interval must be positive".into()
            ));
        }
        if self.serve.asset_interval == 0 {
            bail!(ConfigError::Validation(
                "serve.asset_interval must be positive".into()
            ));
        }
        if let Some(problem) = self.dialect.iter().find_map(DialectConfig::problem) {
            bail!(ConfigError::Validation(problem));
        }
        Ok(())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Compile {
                recursive,
                output,
                serve,
                live,
                ..
            } => {
                if *recursive {
                    self.compile.recursive = true;
                }
                Self::update_option(&mut self.compile.output, output.as_ref());
                // `-l PORT` and `-s PORT` both name the HTTP port
                if let Some(port) = live.or(*serve).flatten() {
                    self.serve.port = port;
                }
                if live.is_some() {
                    self.serve.live = true;
                }
            }
            Commands::Serve {
                port,
                host,
                compile,
                live,
                output,
            } => {
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.interface, host.as_ref());
                Self::update_option(&mut self.compile.output, output.as_ref());
                if *live {
                    self.serve.live = true;
                }
                // serve -c runs compile -rw
                if *compile {
                    self.compile.recursive = true;
                }
            }
            Commands::Minify { .. } => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::net::{IpAddr, Ipv4Addr};

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("livefront").chain(args.iter().copied()))
    }

    fn finalized(content: &str, args: &[&str]) -> Config {
        let mut config = test_parse_config(content);
        config.finalize(&cli(args), Path::new("/site"));
        config
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(Config::parse_with_ignored("[compile\nrecursive = true").is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.get_root(), Path::new(""));
        assert!(config.dialect.is_empty());
        assert_eq!(config.serve.port, 3000);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[compile]\nrecursive = true\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = Config::parse_with_ignored(content).unwrap();

        assert!(config.compile.recursive);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_unknown_nested_field_detected() {
        let (_, ignored) = Config::parse_with_ignored("[serve]\nlivereload = true").unwrap();
        assert_eq!(ignored, vec!["serve.livereload".to_string()]);
    }

    #[test]
    fn test_compile_flags_override() {
        let config = finalized("", &["compile", "-r", "-o", "dist", "-l", "8080"]);

        assert!(config.compile.recursive);
        assert_eq!(config.compile.output, PathBuf::from("/site/dist"));
        assert_eq!(config.serve.port, 8080);
        assert!(config.serve.live);
    }

    #[test]
    fn test_compile_serve_without_port_keeps_config_port() {
        let config = finalized("[serve]\nport = 4000", &["compile", "-s"]);
        assert_eq!(config.serve.port, 4000);
        assert!(!config.serve.live);
    }

    #[test]
    fn test_serve_flags_override() {
        let config = finalized("[serve]\nport = 4000", &["serve", "5000", "0.0.0.0", "-c", "-l"]);

        assert_eq!(config.serve.port, 5000);
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(config.serve.live);
        assert!(config.compile.recursive);
    }

    #[test]
    fn test_absolute_output_kept() {
        let config = finalized("[compile]\noutput = \"/tmp/out\"", &["compile"]);
        assert_eq!(config.compile.output, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_validate_rejects_bad_dialect() {
        let config = test_parse_config(
            "[[dialect]]\nname = \"less\"\nextensions = [\"less\"]\noutput = \"css\"\ncommand = []",
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("empty command"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = test_parse_config("[compile]\npoll_interval = 0");
        assert!(config.validate().is_err());
    }
}
