//! Labeling pipeline: load, compose, embed, assign, write
//!
//! Each stage takes and returns explicit values; the only side effect is the
//! final rewrite of the companies file.

use serde::Serialize;
use std::path::PathBuf;

use crate::core::config::Config;
use crate::error::Result;
use crate::labels::{
    build_vocabulary, compose_query, embed_all, parse_label_list, AssignStats,
    DegenerateVectorPolicy, Embedder, LabelAssigner,
};
use crate::table::{load_companies, load_taxonomy, write_labeled, CompanyTable};

/// Resolved, validated run parameters
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub companies_path: PathBuf,
    pub taxonomy_path: PathBuf,
    pub threshold: f32,
    pub delimiter: u8,
    pub batch_size: usize,
    pub policy: DegenerateVectorPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            companies_path: config.companies_path.clone(),
            taxonomy_path: config.taxonomy_path.clone(),
            threshold: config.threshold,
            delimiter: config.delimiter_byte()?,
            batch_size: config.batch_size,
            policy: if config.strict_vectors {
                DegenerateVectorPolicy::Fail
            } else {
                DegenerateVectorPolicy::Exclude
            },
        })
    }
}

/// Both tables, read and checked before any model work starts
#[derive(Debug, Clone)]
pub struct Inputs {
    pub companies: CompanyTable,
    pub vocabulary: Vec<String>,
}

impl Inputs {
    pub fn load(settings: &PipelineSettings) -> Result<Self> {
        let companies = load_companies(&settings.companies_path, settings.delimiter)?;
        let raw_labels = load_taxonomy(&settings.taxonomy_path, settings.delimiter)?;
        let vocabulary = build_vocabulary(raw_labels);

        tracing::info!(
            companies = companies.len(),
            labels = vocabulary.len(),
            "inputs loaded"
        );

        Ok(Self {
            companies,
            vocabulary,
        })
    }

    /// One query text per company row, in row order
    pub fn queries(&self) -> Vec<String> {
        (0..self.companies.len())
            .map(|row| {
                compose_query(
                    self.companies.description(row),
                    self.companies.business_tags(row),
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct LabelReport {
    pub companies_path: String,
    pub model: String,
    pub threshold: f32,
    pub vocabulary_size: usize,
    #[serde(flatten)]
    pub stats: AssignStats,
    /// Rows whose labels differ from a previous run; `None` on first labeling
    pub changed_rows: Option<usize>,
    /// Companies per label, in vocabulary order
    pub label_counts: Vec<LabelCount>,
    pub written: bool,
}

pub struct Pipeline {
    settings: PipelineSettings,
    embedder: Box<dyn Embedder>,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings, embedder: Box<dyn Embedder>) -> Self {
        Self { settings, embedder }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Embed both tables and assign labels per company.
    ///
    /// Taxonomy vectors are fully materialized before the first company is
    /// scored.
    pub fn assign(&self, inputs: &Inputs) -> Result<(Vec<Vec<String>>, AssignStats)> {
        let queries = inputs.queries();
        let query_refs: Vec<&str> = queries.iter().map(String::as_str).collect();
        let label_refs: Vec<&str> = inputs.vocabulary.iter().map(String::as_str).collect();

        let company_vectors = embed_all(
            self.embedder.as_ref(),
            &query_refs,
            self.settings.batch_size,
            "company",
        )?;
        let label_vectors = embed_all(
            self.embedder.as_ref(),
            &label_refs,
            self.settings.batch_size,
            "taxonomy",
        )?;

        LabelAssigner::new(self.settings.threshold)
            .with_policy(self.settings.policy)
            .assign_all(&company_vectors, &inputs.vocabulary, &label_vectors)
    }

    /// Label already-loaded inputs; writes unless `dry_run`
    pub fn run_with(&self, inputs: &Inputs, dry_run: bool) -> Result<LabelReport> {
        let (assignments, stats) = self.assign(inputs)?;

        let changed_rows = inputs.companies.output_column().map(|_| {
            assignments
                .iter()
                .enumerate()
                .filter(|(row, labels)| {
                    let previous = inputs
                        .companies
                        .existing_labels(*row)
                        .and_then(parse_label_list);
                    previous.as_ref() != Some(*labels)
                })
                .count()
        });

        let label_counts = inputs
            .vocabulary
            .iter()
            .map(|label| LabelCount {
                label: label.clone(),
                count: assignments
                    .iter()
                    .filter(|labels| labels.contains(label))
                    .count(),
            })
            .collect();

        if dry_run {
            tracing::info!("dry run, companies file left untouched");
        } else {
            write_labeled(
                &inputs.companies,
                &assignments,
                &self.settings.companies_path,
                self.settings.delimiter,
            )?;
        }

        Ok(LabelReport {
            companies_path: self.settings.companies_path.display().to_string(),
            model: self.embedder.name().to_string(),
            threshold: self.settings.threshold,
            vocabulary_size: inputs.vocabulary.len(),
            stats,
            changed_rows,
            label_counts,
            written: !dry_run,
        })
    }

    /// Full run: load both tables, label, write
    pub fn run(&self, dry_run: bool) -> Result<LabelReport> {
        let inputs = Inputs::load(&self.settings)?;
        self.run_with(&inputs, dry_run)
    }
}
