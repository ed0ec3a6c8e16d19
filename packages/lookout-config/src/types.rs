use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_NAMESPACE: &str = "alerting";
pub const RULE_LIST_STORAGE_KEY: &str = "savedSearches";
pub const TRIAGE_STORAGE_KEY: &str = "triageSavedSearches";
pub const RULE_LIST_SESSION_FLAG: &str = "grafana.alerting.ruleList.visited";
pub const TRIAGE_SESSION_FLAG: &str = "grafana.alerting.triagePage.visited";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub saved_searches: SavedSearches,
	#[serde(default)]
	pub pages: Pages,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	File,
	Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	/// Required for the file backend. Each namespace becomes a subdirectory.
	pub root: Option<PathBuf>,
	#[serde(default = "default_namespace")]
	pub namespace: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedSearches {
	/// Gates auto-applying the default saved search on first visit.
	pub enabled: bool,
}
impl Default for SavedSearches {
	fn default() -> Self {
		Self { enabled: true }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pages {
	#[serde(default = "default_rule_list_page")]
	pub rule_list: Page,
	#[serde(default = "default_triage_page")]
	pub triage: Page,
}
impl Default for Pages {
	fn default() -> Self {
		Self { rule_list: default_rule_list_page(), triage: default_triage_page() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
	pub storage_key: String,
	pub session_flag: String,
	pub base_path: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_namespace() -> String {
	DEFAULT_NAMESPACE.to_string()
}

fn default_rule_list_page() -> Page {
	Page {
		storage_key: RULE_LIST_STORAGE_KEY.to_string(),
		session_flag: RULE_LIST_SESSION_FLAG.to_string(),
		base_path: "/alerting/list".to_string(),
	}
}

fn default_triage_page() -> Page {
	Page {
		storage_key: TRIAGE_STORAGE_KEY.to_string(),
		session_flag: TRIAGE_SESSION_FLAG.to_string(),
		base_path: "/alerting/triage".to_string(),
	}
}
