//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// `path` is the file named by `--config`, if any.
pub async fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let rendered = match formatter.format() {
                OutputFormat::Json => serde_json::to_string_pretty(config)?,
                OutputFormat::Table => config.to_toml()?,
            };
            println!("{}", rendered);
        }
        ConfigAction::Init { force } => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => Config::path()?,
            };
            init(&path, force)?;
            println!("{}", formatter.success(&format!("Wrote {}", path.display())));
        }
    }

    Ok(())
}

/// Write a default configuration file.
fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Config::default().save(path)
}
