//! Source adapter implementations.
//!
//! - [`DirectoryAdapter`] - in-memory person records
//! - [`HttpJsonAdapter`] - JSON people-search endpoint
//! - [`WebSearchAdapter`] - Tavily web search, answered as free text

pub mod directory;
pub mod http_json;
pub mod record;
pub mod web_search;

pub use directory::DirectoryAdapter;
pub use http_json::HttpJsonAdapter;
pub use record::PersonRecord;
pub use web_search::WebSearchAdapter;
