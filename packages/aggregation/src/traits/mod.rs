//! Core trait abstractions for the aggregation library.
//!
//! These traits define the seams where applications plug in data sources,
//! AI backends and extraction strategies.

pub mod adapter;
pub mod backend;
pub mod extractor;
