//! Credential handling.

pub mod credentials;

pub use credentials::{env_secret, SecretString};
