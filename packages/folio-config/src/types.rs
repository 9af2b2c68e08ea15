use serde::Deserialize;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const MAX_TRENDING_LIMIT: u32 = 50;
/// Text search configuration baked into the `search_vector` column.
pub const TEXT_SEARCH_CONFIG: &str = "english";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub discovery: Discovery,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Upper bound for a single request; the request's cancellation token fires after it.
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Discovery {
	#[serde(default = "default_page_limit")]
	pub default_limit: u32,
	#[serde(default = "max_page_limit")]
	pub max_limit: u32,
	#[serde(default = "max_trending_limit")]
	pub trending_max_limit: u32,
	/// Disables the full-text strategy; keyword search then starts at the scored fallback.
	#[serde(default = "default_true")]
	pub ranked_search: bool,
	/// Postgres text search configuration used by the ranked strategy. Must match the schema.
	#[serde(default = "default_text_search_config")]
	pub text_search_config: String,
}
impl Default for Discovery {
	fn default() -> Self {
		Self {
			default_limit: DEFAULT_PAGE_LIMIT,
			max_limit: MAX_PAGE_LIMIT,
			trending_max_limit: MAX_TRENDING_LIMIT,
			ranked_search: true,
			text_search_config: default_text_search_config(),
		}
	}
}

fn default_request_timeout_ms() -> u64 {
	10_000
}

fn default_page_limit() -> u32 {
	DEFAULT_PAGE_LIMIT
}

fn max_page_limit() -> u32 {
	MAX_PAGE_LIMIT
}

fn max_trending_limit() -> u32 {
	MAX_TRENDING_LIMIT
}

fn default_true() -> bool {
	true
}

fn default_text_search_config() -> String {
	TEXT_SEARCH_CONFIG.to_string()
}
