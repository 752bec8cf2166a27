//! Data types shared across the pipeline.

pub mod config;
pub mod document;
pub mod metadata;
pub mod row;
