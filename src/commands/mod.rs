pub mod label;
pub mod model;
