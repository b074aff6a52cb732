//! Configuration loading and validation
//!
//! Configuration is a single TOML file with kebab-case keys. Loading parses,
//! validates, and optionally hashes the file; the hash identifies the run in
//! the checkpoint store.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, CrawlerConfig, CredentialEntry, OutputConfig, SourceConfig};
pub use validation::validate;
