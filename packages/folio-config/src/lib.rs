mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DEFAULT_PAGE_LIMIT, Discovery, MAX_PAGE_LIMIT, MAX_TRENDING_LIMIT, Postgres, Service,
	Storage, TEXT_SEARCH_CONFIG,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(path, &raw)
}

pub fn parse(path: &Path, raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "service.request_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let discovery = &cfg.discovery;

	for (label, value) in [
		("discovery.default_limit", discovery.default_limit),
		("discovery.max_limit", discovery.max_limit),
		("discovery.trending_max_limit", discovery.trending_max_limit),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if discovery.max_limit > MAX_PAGE_LIMIT {
		return Err(Error::Validation {
			message: format!("discovery.max_limit must not exceed {MAX_PAGE_LIMIT}."),
		});
	}
	if discovery.trending_max_limit > MAX_TRENDING_LIMIT {
		return Err(Error::Validation {
			message: format!("discovery.trending_max_limit must not exceed {MAX_TRENDING_LIMIT}."),
		});
	}
	if discovery.default_limit > discovery.max_limit {
		return Err(Error::Validation {
			message: "discovery.default_limit must not exceed discovery.max_limit.".to_string(),
		});
	}
	if discovery.trending_max_limit > discovery.max_limit {
		return Err(Error::Validation {
			message: "discovery.trending_max_limit must not exceed discovery.max_limit."
				.to_string(),
		});
	}
	// The generated search_vector column is built with this configuration.
	if discovery.text_search_config != TEXT_SEARCH_CONFIG {
		return Err(Error::Validation {
			message: format!("discovery.text_search_config must be {TEXT_SEARCH_CONFIG:?}."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.discovery.text_search_config = cfg.discovery.text_search_config.trim().to_ascii_lowercase();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
