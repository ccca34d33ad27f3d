mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Bandit, BanditRewards, Config, Recommend, Search, SearchBm25, SearchTfidf, Security, Service,
	Sqlite, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
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
	if cfg.storage.artifacts_dir.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "storage.artifacts_dir must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.sqlite.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.sqlite.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	validate_search(cfg)?;
	validate_recommend(cfg)?;
	validate_bandit(cfg)?;

	Ok(())
}

fn validate_search(cfg: &Config) -> Result<()> {
	let search = &cfg.search;

	if search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}
	if search.max_limit < search.default_limit {
		return Err(Error::Validation {
			message: "search.max_limit must be at least search.default_limit.".to_string(),
		});
	}
	if search.snippet_chars == 0 || search.explain_snippet_chars == 0 {
		return Err(Error::Validation {
			message: "search.snippet_chars and search.explain_snippet_chars must be greater than zero."
				.to_string(),
		});
	}
	if !search.bm25.k1.is_finite() || search.bm25.k1 <= 0.0 {
		return Err(Error::Validation {
			message: "search.bm25.k1 must be a finite number greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&search.bm25.b) {
		return Err(Error::Validation {
			message: "search.bm25.b must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !matches!(search.tfidf.ngram_max, 1 | 2) {
		return Err(Error::Validation {
			message: "search.tfidf.ngram_max must be 1 or 2.".to_string(),
		});
	}
	if search.tfidf.max_features == 0 {
		return Err(Error::Validation {
			message: "search.tfidf.max_features must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_recommend(cfg: &Config) -> Result<()> {
	let recommend = &cfg.recommend;

	if recommend.default_top_k == 0 {
		return Err(Error::Validation {
			message: "recommend.default_top_k must be greater than zero.".to_string(),
		});
	}
	if recommend.max_top_k < recommend.default_top_k {
		return Err(Error::Validation {
			message: "recommend.max_top_k must be at least recommend.default_top_k.".to_string(),
		});
	}
	if !recommend.episode_penalty.is_finite() || !(0.0..1.0).contains(&recommend.episode_penalty)
	{
		return Err(Error::Validation {
			message: "recommend.episode_penalty must be in the range 0.0-1.0 (exclusive of 1.0)."
				.to_string(),
		});
	}

	if let Some(expansion) = recommend.tag_expansion.as_ref() {
		for (tag, expanded) in expansion {
			if tag.is_empty() || expanded.iter().any(|value| value.is_empty()) {
				return Err(Error::Validation {
					message: "recommend.tag_expansion keys and values must be non-empty."
						.to_string(),
				});
			}
		}
	}

	Ok(())
}

fn validate_bandit(cfg: &Config) -> Result<()> {
	let bandit = &cfg.bandit;

	if !matches!(bandit.policy.as_str(), "ucb" | "epsilon_greedy") {
		return Err(Error::Validation {
			message: "bandit.policy must be one of ucb or epsilon_greedy.".to_string(),
		});
	}
	if bandit.min_observations == 0 {
		return Err(Error::Validation {
			message: "bandit.min_observations must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&bandit.epsilon) {
		return Err(Error::Validation {
			message: "bandit.epsilon must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !bandit.ucb_exploration.is_finite() || bandit.ucb_exploration < 0.0 {
		return Err(Error::Validation {
			message: "bandit.ucb_exploration must be a finite number, zero or greater.".to_string(),
		});
	}

	for (label, weight) in [
		("completed", bandit.rewards.completed),
		("like", bandit.rewards.like),
		("skip", bandit.rewards.skip),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("bandit.rewards.{label} must be a finite number."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.security.api_key = None;
	}
	if cfg
		.bandit
		.default_protocol
		.as_deref()
		.map(|slug| slug.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.bandit.default_protocol = None;
	}

	cfg.bandit.policy = cfg.bandit.policy.trim().to_ascii_lowercase();

	if let Some(expansion) = cfg.recommend.tag_expansion.take() {
		let normalized = expansion
			.into_iter()
			.map(|(tag, expanded)| {
				let expanded = expanded
					.into_iter()
					.map(|value| value.trim().to_lowercase())
					.collect::<Vec<_>>();

				(tag.trim().to_lowercase(), expanded)
			})
			.collect();

		cfg.recommend.tag_expansion = Some(normalized);
	}
}
