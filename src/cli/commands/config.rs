//! Config Command
//!
//! Usage:
//!   aarlens config show [-g] [-f json]
//!   aarlens config path
//!   aarlens config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(global: bool, format: &str) -> Result<()> {
    if !global {
        // Merged effective config
        return ConfigLoader::show_config(format == "json");
    }

    match ConfigLoader::global_config_path() {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)?;
            println!("# Global Config: {}\n", path.display());
            println!("{}", content);
        }
        Some(_) => {
            println!("No global config found.");
            println!("Run 'aarlens config init --global' to create one.");
        }
        None => println!("Cannot determine global config directory."),
    }
    Ok(())
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn init_global(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_global(force)?;
    let out = Output::new();
    out.success("Initialized global configuration");
    out.field("Directory", dir.display());
    if let Some(config_path) = ConfigLoader::global_config_path() {
        out.field("Config", config_path.display());
    }
    Ok(())
}

pub fn init_project() -> Result<()> {
    let dir = ConfigLoader::init_project()?;
    let out = Output::new();
    out.success("Initialized project configuration");
    out.field("Directory", dir.display());
    out.field("Config", ConfigLoader::project_config_path().display());
    Ok(())
}
