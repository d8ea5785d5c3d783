//! Model management commands - fetch and inspect the embedding model

use anyhow::{Context, Result};
use colored::Colorize;

use crate::core::config::Config;
use crate::labels::{load_embedder, locate_model, ModelSource};

/// Run model subcommand
pub fn run(subcmd: &str, json: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = Config::load(&cwd);

    match subcmd {
        "download" => download(&config, json),
        "status" => status(&config, json),
        _ => {
            if !json {
                println!("{} Unknown subcommand: {}", "!".yellow().bold(), subcmd);
                println!();
                println!("Available subcommands:");
                println!(
                    "  {} - Download the embedding model into its cache",
                    "download".cyan()
                );
                println!("  {} - Show model status", "status".cyan());
            }
            Ok(())
        }
    }
}

/// Load the configured model, downloading it when it is not on disk
fn download(config: &Config, json: bool) -> Result<()> {
    let model_id = config.model_id();

    if !json {
        match &config.model_path {
            Some(path) => println!(
                "{} Loading {} model {} ({})...",
                "→".dimmed(),
                config.backend,
                model_id.cyan(),
                path.display()
            ),
            None => println!(
                "{} Loading {} model {}...",
                "→".dimmed(),
                config.backend,
                model_id.cyan()
            ),
        }
        println!("  This may take a few minutes on first download...");
    }

    match load_embedder(config.backend, model_id, config.model_path.as_deref()) {
        Ok(embedder) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "backend": config.backend,
                        "model_id": model_id,
                        "dimension": embedder.dimension(),
                        "name": embedder.name(),
                    })
                );
            } else {
                println!("{} Model ready", "✓".green().bold());
                println!("  {} Model: {}", "→".dimmed(), embedder.name());
                println!("  {} Dimension: {}", "→".dimmed(), embedder.dimension());
            }
            Ok(())
        }
        Err(e) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": false,
                        "backend": config.backend,
                        "model_id": model_id,
                        "error": e.to_string(),
                    })
                );
            } else {
                println!("{} Failed to load model: {}", "✗".red().bold(), e);
            }
            Err(e.into())
        }
    }
}

/// Report where the model would load from; never downloads
fn status(config: &Config, json: bool) -> Result<()> {
    let model_id = config.model_id();
    let source = locate_model(config.backend, model_id, config.model_path.as_deref())?;

    let (state, path) = match &source {
        ModelSource::Local(path) if path.exists() => ("local", Some(path)),
        ModelSource::Local(path) => ("missing", Some(path)),
        ModelSource::Cached(path) => ("cached", Some(path)),
        ModelSource::Remote => ("not_downloaded", None),
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "backend": config.backend,
                "model_id": model_id,
                "state": state,
                "path": path.map(|p| p.display().to_string()),
                "ready": matches!(state, "local" | "cached"),
            })
        );
        return Ok(());
    }

    println!("{}", "Model Status".bold());
    println!();
    println!("  {} Backend: {}", "→".dimmed(), config.backend);
    println!("  {} Model: {}", "→".dimmed(), model_id.cyan());
    match &source {
        ModelSource::Local(path) if path.exists() => {
            println!("  {} Local: {}", "✓".green(), path.display())
        }
        ModelSource::Local(path) => {
            println!("  {} Local path missing: {}", "✗".red(), path.display())
        }
        ModelSource::Cached(path) => {
            println!("  {} Cached: {}", "✓".green(), path.display())
        }
        ModelSource::Remote => {
            println!("  {} Not downloaded", "!".yellow());
            println!();
            println!("Download with:");
            println!("  {} model download", "taxolabel".cyan());
        }
    }

    Ok(())
}
