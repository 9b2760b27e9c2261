use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file with defaults")]
    Init {
        #[arg(long, short = 'f', help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file path")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { force } => {
            let path = Config::config_path()
                .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

            if path.exists() && !force {
                anyhow::bail!(
                    "Config already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            let path = Config::default()
                .save()
                .context("failed to write config file")?;
            println!(
                "{}",
                formatter.format_message(&format!("Created config at: {}", path.display()))
            );
        }
        ConfigCommand::Show => {
            let config = Config::load()?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigCommand::Path => {
            let path = Config::config_path()
                .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
            let marker = if path.exists() { "" } else { " (not created)" };
            println!("{}{}", path.display(), marker);
        }
    }

    Ok(())
}
