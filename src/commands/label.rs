//! Label command - assign taxonomy labels and rewrite the companies file

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::core::config::{Config, EmbeddingBackend};
use crate::labels::load_embedder;
use crate::pipeline::{Inputs, LabelReport, Pipeline, PipelineSettings};
use crate::table::OUTPUT_COLUMN;

/// CLI overrides on top of `.taxolabel.json`
#[derive(Debug, Default)]
pub struct LabelArgs {
    pub companies: Option<PathBuf>,
    pub taxonomy: Option<PathBuf>,
    pub threshold: Option<f32>,
    pub backend: Option<EmbeddingBackend>,
    pub model: Option<String>,
    pub model_path: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub strict_vectors: bool,
    pub dry_run: bool,
    pub json: bool,
}

impl LabelArgs {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(path) = &self.companies {
            config.companies_path = path.clone();
        }
        if let Some(path) = &self.taxonomy {
            config.taxonomy_path = path.clone();
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(backend) = self.backend {
            if backend != config.backend {
                // A model ID from the file belongs to the other backend
                config.model_id = None;
            }
            config.backend = backend;
        }
        if let Some(model) = &self.model {
            config.model_id = Some(model.clone());
        }
        if let Some(path) = &self.model_path {
            config.model_path = Some(path.clone());
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if self.strict_vectors {
            config.strict_vectors = true;
        }
        config
    }
}

pub fn run(args: LabelArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = args.apply(Config::load(&cwd));
    let settings = PipelineSettings::from_config(&config)?;

    // Tables first: a bad input should fail before the model is loaded
    let inputs = Inputs::load(&settings).context("Failed to load input tables")?;

    if !args.json {
        println!(
            "{} {} companies, {} taxonomy labels",
            "→".dimmed(),
            inputs.companies.len().to_string().cyan(),
            inputs.vocabulary.len().to_string().cyan()
        );
        println!(
            "{} Loading {} model {}...",
            "→".dimmed(),
            config.backend,
            config.model_id().cyan()
        );
    }

    let embedder = load_embedder(
        config.backend,
        config.model_id(),
        config.model_path.as_deref(),
    )
    .context("Failed to load embedding model")?;

    if !args.json && !args.dry_run {
        println!(
            "{} {} will be overwritten in place (no backup)",
            "!".yellow().bold(),
            settings.companies_path.display()
        );
    }

    let pipeline = Pipeline::new(settings, embedder);
    let report = pipeline
        .run_with(&inputs, args.dry_run)
        .context("Labeling failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &LabelReport) {
    println!();
    println!(
        "{} Labeled {} companies ({} labels assigned, threshold {})",
        "✓".green().bold(),
        report.stats.companies.to_string().cyan(),
        report.stats.assigned,
        report.threshold
    );
    if report.stats.unlabeled > 0 {
        println!(
            "  {} {} companies matched no label",
            "→".dimmed(),
            report.stats.unlabeled
        );
    }
    if report.stats.degenerate_pairs > 0 {
        println!(
            "  {} {} undefined similarities excluded",
            "!".yellow(),
            report.stats.degenerate_pairs
        );
    }
    if let Some(changed) = report.changed_rows {
        println!(
            "  {} {} rows changed since the previous run",
            "→".dimmed(),
            changed
        );
    }

    let mut top: Vec<_> = report.label_counts.iter().filter(|c| c.count > 0).collect();
    top.sort_by(|a, b| b.count.cmp(&a.count));
    if !top.is_empty() {
        println!();
        println!("{}", "Most assigned labels:".cyan().bold());
        for count in top.iter().take(10) {
            println!("  {:>5} × {}", count.count, count.label);
        }
    }

    println!();
    if report.written {
        println!(
            "Updated '{}' with column '{}'",
            report.companies_path, OUTPUT_COLUMN
        );
    } else {
        println!(
            "{} Dry run: '{}' was not modified",
            "→".dimmed(),
            report.companies_path
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = LabelArgs {
            companies: Some(PathBuf::from("in.csv")),
            threshold: Some(0.5),
            strict_vectors: true,
            ..Default::default()
        };
        let config = args.apply(Config::default());

        assert_eq!(config.companies_path, PathBuf::from("in.csv"));
        assert_eq!(config.threshold, 0.5);
        assert!(config.strict_vectors);
        assert_eq!(
            config.taxonomy_path,
            PathBuf::from(crate::core::config::DEFAULT_TAXONOMY_PATH)
        );
    }

    #[test]
    fn test_no_args_keep_config() {
        let mut base = Config::default();
        base.strict_vectors = true;
        base.batch_size = 64;

        let config = LabelArgs::default().apply(base);
        assert!(config.strict_vectors);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.model_path, None);
    }

    #[test]
    fn test_backend_switch_drops_file_model_id() {
        let mut base = Config::default();
        base.model_id = Some("sentence-transformers/all-MiniLM-L12-v2".to_string());

        let args = LabelArgs {
            backend: Some(EmbeddingBackend::Model2Vec),
            ..Default::default()
        };
        let config = args.apply(base.clone());
        assert_eq!(
            config.model_id(),
            crate::core::config::DEFAULT_MODEL2VEC_MODEL_ID
        );

        let args = LabelArgs {
            backend: Some(EmbeddingBackend::Model2Vec),
            model: Some("minishlab/potion-base-32M".to_string()),
            ..Default::default()
        };
        assert_eq!(args.apply(base).model_id(), "minishlab/potion-base-32M");
    }
}
