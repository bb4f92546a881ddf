use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "intake - watch drop folders, validate documents, queue or quarantine them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses RUST_LOG, then the config file value
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/intake/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Level requested on the command line, if any.
    pub fn requested_level(&self) -> Option<LevelFilter> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level.into()),
            (None, true) => Some(LevelFilter::DEBUG),
            (None, false) => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch folders until interrupted, printing notifications as JSON lines
    Sync {
        /// Folders to watch
        #[arg(required = true)]
        folders: Vec<String>,
    },

    /// Validate a single file and print the outcome
    Check {
        /// File to validate
        file: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },

    /// Write an example configuration file
    Init {
        /// Destination (defaults to ~/.config/intake/config.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_accepts_several_folders() {
        let cli = Cli::try_parse_from(["intake", "sync", "./resumes", "/srv/drop"]).unwrap();
        match cli.command {
            Commands::Sync { folders } => assert_eq!(folders, vec!["./resumes", "/srv/drop"]),
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn test_sync_requires_a_folder() {
        assert!(Cli::try_parse_from(["intake", "sync"]).is_err());
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::try_parse_from(["intake", "-v", "-l", "warn", "check", "a.pdf"]).unwrap();
        assert_eq!(cli.requested_level(), Some(LevelFilter::WARN));

        let cli = Cli::try_parse_from(["intake", "check", "a.pdf", "--verbose"]).unwrap();
        assert_eq!(cli.requested_level(), Some(LevelFilter::DEBUG));

        let cli = Cli::try_parse_from(["intake", "config", "show"]).unwrap();
        assert_eq!(cli.requested_level(), None);
    }
}
