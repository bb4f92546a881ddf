use anyhow::{Context, Result};
use intake_pipeline::IntakeConfig;
use intake_watch::WatchMode;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Example written by `intake config init`.
const EXAMPLE_CONFIG: &str = r#"# Intake Configuration
# Location: ~/.config/intake/config.toml

[watch]
# "polling" rescans the tree (works on network shares and container mounts)
# "native" uses OS notifications
mode = "polling"
poll_interval_ms = 100
# A file is processed once its size has not changed for this long
stability_threshold_ms = 2000
max_depth = 99

[validation]
# Files larger than this are quarantined as "Too large" (5 MiB)
max_file_size_bytes = 5242880
timeout_ms = 30000

[queue]
# Uncomment to bound the admission queue; full queues leave files in place
# capacity = 1000

[results]
# Uncomment to keep only the most recent quarantine records
# capacity = 10000

[logging]
# Used when neither --log-level nor RUST_LOG is set
level = "info"
"#;

/// Load configuration with precedence: defaults < file < env.
pub fn load(config_file: Option<PathBuf>) -> Result<IntakeConfig> {
    let mut config = from_file_or_default(config_file)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Get default config file path
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("intake");
    Ok(config_dir.join("config.toml"))
}

/// Load config from file or return default
fn from_file_or_default(config_file: Option<PathBuf>) -> Result<IntakeConfig> {
    // An explicitly named file must exist.
    if let Some(path) = config_file {
        return read_config(&path);
    }

    match default_config_path().ok().filter(|p| p.exists()) {
        Some(path) => read_config(&path),
        None => Ok(IntakeConfig::default()),
    }
}

fn read_config(path: &Path) -> Result<IntakeConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Apply `INTAKE_*` environment overrides. Unparsable values are ignored.
pub fn apply_env_overrides(config: &mut IntakeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(mode) = lookup("INTAKE_WATCH_MODE") {
        match WatchMode::parse(&mode) {
            Some(mode) => config.watch.mode = mode,
            None => warn!("Ignoring INTAKE_WATCH_MODE={}", mode),
        }
    }
    if let Some(value) = lookup("INTAKE_POLL_INTERVAL_MS") {
        match value.trim().parse() {
            Ok(ms) => config.watch.poll_interval_ms = ms,
            Err(_) => warn!("Ignoring INTAKE_POLL_INTERVAL_MS={}", value),
        }
    }
    if let Some(value) = lookup("INTAKE_STABILITY_MS") {
        match value.trim().parse() {
            Ok(ms) => config.watch.stability_threshold_ms = ms,
            Err(_) => warn!("Ignoring INTAKE_STABILITY_MS={}", value),
        }
    }
}

/// Write the example configuration to `path`.
pub fn create_example(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Display the configuration as TOML
pub fn display_as_toml(config: &IntakeConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config as TOML")
}

/// Display the configuration as JSON
pub fn display_as_json(config: &IntakeConfig) -> Result<String> {
    serde_json::to_string_pretty(config).context("Failed to serialize config as JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config: IntakeConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config, IntakeConfig::default());
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("intake.toml");
        std::fs::write(&path, "[watch]\nmode = \"native\"\n\n[queue]\ncapacity = 5\n").unwrap();

        let config = from_file_or_default(Some(path)).unwrap();
        assert_eq!(config.watch.mode, WatchMode::Native);
        assert_eq!(config.queue.capacity, Some(5));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(from_file_or_default(Some(dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("INTAKE_WATCH_MODE", "native"),
            ("INTAKE_POLL_INTERVAL_MS", "250"),
            ("INTAKE_STABILITY_MS", "not-a-number"),
        ]);
        let mut config = IntakeConfig::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.watch.mode, WatchMode::Native);
        assert_eq!(config.watch.poll_interval_ms, 250);
        assert_eq!(config.watch.stability_threshold_ms, 2000);
    }

    #[test]
    fn test_create_example_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        create_example(&path, false).unwrap();
        assert!(create_example(&path, false).is_err());
        assert!(create_example(&path, true).is_ok());
    }

    #[test]
    fn test_display_round_trips() {
        let config = IntakeConfig::default();
        let rendered = display_as_toml(&config).unwrap();
        let parsed: IntakeConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
