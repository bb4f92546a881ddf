use crate::cli::{ConfigCommands, ConfigFormat};
use crate::config;
use anyhow::Result;
use intake_pipeline::IntakeConfig;

pub fn execute(effective: &IntakeConfig, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { format } => {
            let rendered = match format {
                ConfigFormat::Toml => config::display_as_toml(effective)?,
                ConfigFormat::Json => config::display_as_json(effective)?,
            };
            println!("{}", rendered);
        }
        ConfigCommands::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => config::default_config_path()?,
            };
            config::create_example(&path, force)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
