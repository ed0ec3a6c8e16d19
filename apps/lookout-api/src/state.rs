use std::sync::Arc;

use lookout_config::Config;
use lookout_service::{LogNotifier, LogTracker, Notifier, SavedSearchStore, StoreConfig, Tracker};
use lookout_storage::ScopedStorage;

pub const RULE_LIST_PAGE: &str = "rule-list";
pub const TRIAGE_PAGE: &str = "triage";

#[derive(Clone)]
pub struct AppState {
	pub rule_list: Arc<SavedSearchStore>,
	pub triage: Arc<SavedSearchStore>,
}
impl AppState {
	pub fn new(config: &Config) -> color_eyre::Result<Self> {
		let storage = ScopedStorage::from_config(&config.storage)?;

		Ok(Self::with_storage(config, storage))
	}

	pub fn with_storage(config: &Config, storage: ScopedStorage) -> Self {
		let tracker: Arc<dyn Tracker> = Arc::new(LogTracker);
		let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
		let rule_list = SavedSearchStore::new(
			StoreConfig::rule_list(config),
			storage.clone(),
			tracker.clone(),
			notifier.clone(),
		);
		let triage =
			SavedSearchStore::new(StoreConfig::triage(config), storage, tracker, notifier);

		Self { rule_list: Arc::new(rule_list), triage: Arc::new(triage) }
	}

	pub fn store(&self, page: &str) -> Option<&SavedSearchStore> {
		match page {
			RULE_LIST_PAGE => Some(&self.rule_list),
			TRIAGE_PAGE => Some(&self.triage),
			_ => None,
		}
	}
}
