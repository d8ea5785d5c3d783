//! Label assigner: thresholded multi-label filter
//!
//! Every taxonomy label scoring at or above the threshold is kept, in
//! vocabulary order. There is no ranking and no top-k.

use serde::Serialize;

use super::similarity::{cosine_similarity, l2_norm};
use crate::error::{LabelError, Result};

/// What to do when a similarity is undefined (zero-norm vector)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateVectorPolicy {
    /// Treat the pair as non-matching
    Exclude,
    /// Abort with `LabelError::DegenerateVector`
    Fail,
}

/// Counters collected while assigning
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignStats {
    pub companies: usize,
    pub assigned: usize,
    pub unlabeled: usize,
    pub degenerate_pairs: usize,
}

pub struct LabelAssigner {
    /// Minimum similarity for assignment (inclusive)
    threshold: f32,
    policy: DegenerateVectorPolicy,
}

impl LabelAssigner {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            policy: DegenerateVectorPolicy::Exclude,
        }
    }

    pub fn with_policy(mut self, policy: DegenerateVectorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Whether `score` clears the threshold; equality counts as a match
    pub fn accepts(&self, score: f32) -> bool {
        score >= self.threshold
    }

    /// Labels for one company, in vocabulary order.
    ///
    /// `label_vectors[i]` must be the embedding of `vocabulary[i]`.
    pub fn assign(
        &self,
        company_vector: &[f32],
        vocabulary: &[String],
        label_vectors: &[Vec<f32>],
    ) -> Result<Vec<String>> {
        check_label_vectors(vocabulary, label_vectors)?;
        if self.policy == DegenerateVectorPolicy::Fail && is_degenerate(company_vector) {
            return Err(LabelError::DegenerateVector {
                kind: "company",
                index: 0,
            });
        }
        let mut degenerate = 0;
        self.assign_counting(company_vector, vocabulary, label_vectors, &mut degenerate)
    }

    fn assign_counting(
        &self,
        company_vector: &[f32],
        vocabulary: &[String],
        label_vectors: &[Vec<f32>],
        degenerate: &mut usize,
    ) -> Result<Vec<String>> {
        let mut labels = Vec::new();

        for (idx, (label, label_vector)) in vocabulary.iter().zip(label_vectors).enumerate() {
            match cosine_similarity(company_vector, label_vector) {
                Some(score) if self.accepts(score) => labels.push(label.clone()),
                Some(_) => {}
                None => {
                    if self.policy == DegenerateVectorPolicy::Fail {
                        return Err(LabelError::DegenerateVector {
                            kind: "taxonomy",
                            index: idx,
                        });
                    }
                    *degenerate += 1;
                }
            }
        }

        Ok(labels)
    }

    /// Labels for every company against the fully materialized taxonomy
    pub fn assign_all(
        &self,
        company_vectors: &[Vec<f32>],
        vocabulary: &[String],
        label_vectors: &[Vec<f32>],
    ) -> Result<(Vec<Vec<String>>, AssignStats)> {
        check_label_vectors(vocabulary, label_vectors)?;

        let mut stats = AssignStats {
            companies: company_vectors.len(),
            ..Default::default()
        };
        let mut assignments = Vec::with_capacity(company_vectors.len());

        for (row, company_vector) in company_vectors.iter().enumerate() {
            if self.policy == DegenerateVectorPolicy::Fail && is_degenerate(company_vector) {
                return Err(LabelError::DegenerateVector {
                    kind: "company",
                    index: row,
                });
            }

            let labels = self.assign_counting(
                company_vector,
                vocabulary,
                label_vectors,
                &mut stats.degenerate_pairs,
            )?;

            if labels.is_empty() {
                stats.unlabeled += 1;
            }
            stats.assigned += labels.len();
            assignments.push(labels);
        }

        if stats.degenerate_pairs > 0 {
            tracing::warn!(
                pairs = stats.degenerate_pairs,
                "undefined similarities (zero-norm or mismatched vectors) excluded"
            );
        }

        Ok((assignments, stats))
    }
}

fn check_label_vectors(vocabulary: &[String], label_vectors: &[Vec<f32>]) -> Result<()> {
    if vocabulary.len() != label_vectors.len() {
        return Err(LabelError::Embedding {
            model: "taxonomy".to_string(),
            message: format!(
                "{} labels but {} label vectors",
                vocabulary.len(),
                label_vectors.len()
            ),
        });
    }
    Ok(())
}

/// Zero, NaN or infinite norm: no cosine is defined against this vector
fn is_degenerate(v: &[f32]) -> bool {
    let norm = l2_norm(v);
    !(norm.is_finite() && norm > 0.0)
}
