//! AI backends for the aggregation library.
//!
//! Reference implementations of [`EntityBackend`](crate::traits::backend::EntityBackend).
//! Applications can use these directly or implement their own.

mod openai;

pub use openai::OpenAIBackend;
