use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use nxtgen_core::config::{Config, WarnLevel};
use nxtgen_core::{io, paths};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective config (defaults filled in)
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a default .nxtgen/config.yaml if none exists
    Init {
        /// Project name (default: the root directory's name)
        #[arg(long)]
        name: Option<String>,

        /// Replace an existing config with the defaults
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Init { name, force } => init(root, name, force, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        print_json(&config)
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(root: &Path, name: Option<String>, force: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    let name = name
        .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "nxtgen".to_string());
    let config = Config::new(name);
    let created = if force {
        config
            .save(root)
            .with_context(|| format!("failed to write {}", path.display()))?;
        true
    } else {
        let yaml = serde_yaml::to_string(&config)?;
        io::write_if_missing(&path, yaml.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?
    };

    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "created": created,
        }))
    } else {
        if created {
            println!("Created {}", path.display());
        } else {
            println!("{} already exists", path.display());
        }
        Ok(())
    }
}
