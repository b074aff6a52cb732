use serde::Deserialize;

/// Main configuration structure for a crawl run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
    pub output: OutputConfig,
    #[serde(default)]
    pub source: Option<SourceConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Target accumulator size; the crawl stops once this many nodes exist
    #[serde(rename = "max-nodes")]
    pub max_nodes: u64,

    /// Per-node fan-out cap applied after popularity ranking
    #[serde(rename = "max-leaves")]
    pub max_leaves: u32,

    /// Node id or username the traversal starts from
    #[serde(rename = "starting-node")]
    pub starting_node: String,

    /// Courtesy pause between successful node expansions (milliseconds)
    #[serde(rename = "request-pause-ms", default = "default_request_pause")]
    pub request_pause_ms: u64,

    /// Optional language tag; when set, candidates declaring a different
    /// language are rejected
    #[serde(rename = "language-filter", default)]
    pub language_filter: Option<String>,

    /// Whether candidates with no declared language pass the language filter
    #[serde(rename = "accept-unspecified-language", default = "default_true")]
    pub accept_unspecified_language: bool,
}

/// One credential entry for the data source
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialEntry {
    /// Operator-visible identity; also the checkpoint's credential key
    pub id: String,

    #[serde(rename = "api-key")]
    pub api_key: String,

    #[serde(rename = "api-secret")]
    pub api_secret: String,

    #[serde(rename = "access-token")]
    pub access_token: String,

    #[serde(rename = "access-secret")]
    pub access_secret: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite checkpoint database
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path the final edge list is written to
    #[serde(rename = "edges-path")]
    pub edges_path: String,

    /// Keep the checkpoint after a clean completion
    #[serde(rename = "retain-checkpoint", default)]
    pub retain_checkpoint: bool,
}

/// Optional replay source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Path to a recorded graph fixture to crawl offline
    #[serde(rename = "fixture-path")]
    pub fixture_path: String,
}

fn default_request_pause() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}
