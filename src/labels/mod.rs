//! Taxonomy label assignment for company records
//!
//! # Components
//!
//! - `compose`: query text and taxonomy vocabulary
//! - `embedder`: fastembed and Model2Vec backends behind one trait
//! - `similarity`: cosine similarity with an explicit undefined case
//! - `assigner`: thresholded multi-label filter
//! - `serialize`: list literal used in the output column

pub mod assigner;
pub mod compose;
pub mod embedder;
pub mod serialize;
pub mod similarity;

pub use assigner::{AssignStats, DegenerateVectorPolicy, LabelAssigner};
pub use compose::{build_vocabulary, compose_query};
pub use embedder::{
    embed_all, load_embedder, locate_model, Embedder, FastEmbedEmbedder, ModelSource,
    Model2VecEmbedder,
};
pub use serialize::{format_label_list, parse_label_list};
pub use similarity::cosine_similarity;
