//! Data types for the aggregation library.

pub mod config;
pub mod entity;
pub mod payload;
pub mod profile;
pub mod query;
pub mod report;
