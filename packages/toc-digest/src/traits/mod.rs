//! Core trait abstractions for the digest library.
//!
//! These traits define the interfaces that applications implement
//! to provide the summarization model and the output table.

pub mod model;
pub mod table;
