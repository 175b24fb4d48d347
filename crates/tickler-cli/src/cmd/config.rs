use crate::output::print_json;
use clap::Subcommand;
use std::path::Path;
use tickler_core::config::Config;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Check the configuration and report where it was loaded from
    Validate,
}

pub fn run(
    config: &Config,
    path: Option<&Path>,
    subcmd: ConfigSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(config, json),
        ConfigSubcommand::Validate => validate(config, path, json),
    }
}

fn show(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(config)
    } else {
        print!("{}", config.to_yaml()?);
        Ok(())
    }
}

fn validate(config: &Config, path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    config.validate()?;
    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());

    if json {
        print_json(&serde_json::json!({ "valid": true, "source": source }))?;
    } else {
        println!("Config is valid ({source}).");
    }
    Ok(())
}
