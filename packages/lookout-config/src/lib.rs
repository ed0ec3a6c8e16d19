mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DEFAULT_NAMESPACE, Page, Pages, RULE_LIST_SESSION_FLAG, RULE_LIST_STORAGE_KEY,
	SavedSearches, Service, Storage, StorageBackend, TRIAGE_SESSION_FLAG, TRIAGE_STORAGE_KEY,
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
	if cfg.storage.backend == StorageBackend::File && cfg.storage.root.is_none() {
		return Err(Error::Validation {
			message: "storage.root is required when storage.backend is file.".to_string(),
		});
	}
	if cfg.storage.namespace.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.namespace must be non-empty.".to_string(),
		});
	}

	let pages = [("rule_list", &cfg.pages.rule_list), ("triage", &cfg.pages.triage)];

	for (label, page) in pages {
		if page.storage_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("pages.{label}.storage_key must be non-empty."),
			});
		}
		if page.session_flag.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("pages.{label}.session_flag must be non-empty."),
			});
		}
		if !page.base_path.starts_with('/') {
			return Err(Error::Validation {
				message: format!("pages.{label}.base_path must start with '/'."),
			});
		}
	}

	if cfg.pages.rule_list.storage_key == cfg.pages.triage.storage_key {
		return Err(Error::Validation {
			message: "pages.rule_list.storage_key and pages.triage.storage_key must differ."
				.to_string(),
		});
	}
	if cfg.pages.rule_list.session_flag == cfg.pages.triage.session_flag {
		return Err(Error::Validation {
			message: "pages.rule_list.session_flag and pages.triage.session_flag must differ."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.root.as_deref().map(|root| root.as_os_str().is_empty()).unwrap_or(false) {
		cfg.storage.root = None;
	}

	cfg.storage.namespace = cfg.storage.namespace.trim().to_string();

	for page in [&mut cfg.pages.rule_list, &mut cfg.pages.triage] {
		page.storage_key = page.storage_key.trim().to_string();
		page.session_flag = page.session_flag.trim().to_string();
	}
}
