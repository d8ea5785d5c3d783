//! Assign insurance taxonomy labels to company records by embedding similarity.
//!
//! Each company's `description` and `business_tags` are embedded alongside the
//! taxonomy labels; every label with cosine similarity at or above the
//! threshold is written to the `insurance_label` column.

pub mod commands;
pub mod core;
pub mod error;
pub mod labels;
pub mod pipeline;
pub mod table;

pub use error::{LabelError, Result};
pub use pipeline::{Inputs, LabelReport, Pipeline, PipelineSettings};
