use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
	DefaultAction, Error, Navigator, Notifier, Result, Tracker, TrackingAction, TrackingEvent,
	TrackingPage, navigation,
};
use lookout_domain::{
	SavedSearch, Salvaged,
	saved_search::{self, find_name_conflict, has_default, normalize_name, sort_saved_searches},
	schema,
};
use lookout_storage::ScopedStorage;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load saved searches.";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save saved searches. Please try again.";

#[derive(Debug, Clone)]
pub struct StoreConfig {
	pub storage_key: String,
	pub page: TrackingPage,
	pub base_path: String,
}
impl StoreConfig {
	pub fn from_page(page: &lookout_config::Page, tracking: TrackingPage) -> Self {
		Self {
			storage_key: page.storage_key.clone(),
			page: tracking,
			base_path: page.base_path.clone(),
		}
	}

	pub fn rule_list(cfg: &lookout_config::Config) -> Self {
		Self::from_page(&cfg.pages.rule_list, TrackingPage::RuleList)
	}

	pub fn triage(cfg: &lookout_config::Config) -> Self {
		Self::from_page(&cfg.pages.triage, TrackingPage::Triage)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
	Idle,
	Loading,
	Ready,
	Failed,
}

#[derive(Debug)]
struct Snapshot {
	state: LoadState,
	searches: Vec<SavedSearch>,
}

/// Saved searches for one page, persisted as a single JSON array under one storage key.
///
/// The stored collection is read until one read succeeds and never again after that. Every
/// mutation requires a successful read, rewrites the whole array and only touches memory after
/// the write succeeded. Mutations are not queued against each other, so
/// two in flight at once race and the last write wins.
pub struct SavedSearchStore {
	cfg: StoreConfig,
	storage: ScopedStorage,
	tracker: Arc<dyn Tracker>,
	notifier: Arc<dyn Notifier>,
	loaded: OnceCell<()>,
	snapshot: Mutex<Snapshot>,
}
impl SavedSearchStore {
	pub fn new(
		cfg: StoreConfig,
		storage: ScopedStorage,
		tracker: Arc<dyn Tracker>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		Self {
			cfg,
			storage,
			tracker,
			notifier,
			loaded: OnceCell::new(),
			snapshot: Mutex::new(Snapshot { state: LoadState::Idle, searches: Vec::new() }),
		}
	}

	pub fn config(&self) -> &StoreConfig {
		&self.cfg
	}

	pub fn state(&self) -> LoadState {
		self.lock().state
	}

	/// Current collection, default first and then by name.
	pub fn saved_searches(&self) -> Vec<SavedSearch> {
		sort_saved_searches(self.lock().searches.clone())
	}

	/// Reads the collection unless an earlier read succeeded. Never fails: unreadable data or
	/// a rejected read yields an empty collection, and a rejected read is retried next time.
	pub async fn load(&self) -> Vec<SavedSearch> {
		// Already logged and notified.
		let _ = self.ensure_loaded().await;

		self.saved_searches()
	}

	pub async fn default_search(&self) -> Option<SavedSearch> {
		self.load().await;

		saved_search::default_search(&self.lock().searches).cloned()
	}

	pub async fn save_search(&self, name: &str, query: &str) -> Result<SavedSearch> {
		self.ensure_loaded().await?;

		let mut searches = self.current();
		let name = normalize_name(name);

		validate_name(&searches, &name, None)?;

		let search = SavedSearch {
			id: Uuid::new_v4().to_string(),
			name,
			query: query.to_string(),
			is_default: false,
			created_at: now_millis(),
		};

		searches.push(search.clone());

		let has_default = has_default(&searches);
		let total_count = searches.len();

		self.persist(searches).await?;
		self.track(TrackingAction::Save { has_default, total_count });

		Ok(search)
	}

	pub async fn rename_search(&self, id: &str, new_name: &str) -> Result<SavedSearch> {
		self.ensure_loaded().await?;

		let mut searches = self.current();
		let name = normalize_name(new_name);

		validate_name(&searches, &name, Some(id))?;

		let renamed = {
			let search = searches
				.iter_mut()
				.find(|search| search.id == id)
				.ok_or_else(|| not_found(id))?;

			search.name = name;

			search.clone()
		};

		self.persist(searches).await?;
		self.track(TrackingAction::Rename);

		Ok(renamed)
	}

	/// Deleting an unknown id is a no-op that still rewrites the collection.
	pub async fn delete_search(&self, id: &str) -> Result<()> {
		self.ensure_loaded().await?;

		let searches =
			self.current().into_iter().filter(|search| search.id != id).collect::<Vec<_>>();

		self.persist(searches).await?;
		self.track(TrackingAction::Delete);

		Ok(())
	}

	/// Makes `id` the only default; `None` clears the default.
	pub async fn set_default_search(&self, id: Option<&str>) -> Result<()> {
		self.ensure_loaded().await?;

		let searches = saved_search::with_default(self.current(), id);
		let action = if id.is_some() { DefaultAction::Set } else { DefaultAction::Clear };

		self.persist(searches).await?;
		self.track(TrackingAction::SetDefault { action });

		Ok(())
	}

	pub async fn apply_search(&self, id: &str, navigator: &dyn Navigator) -> Result<SavedSearch> {
		self.ensure_loaded().await?;

		let search = self
			.lock()
			.searches
			.iter()
			.find(|search| search.id == id)
			.cloned()
			.ok_or_else(|| not_found(id))?;

		navigation::apply_saved_search(navigator, &self.cfg.base_path, &search.query);
		self.track(TrackingAction::Apply { is_default: search.is_default });

		Ok(search)
	}

	pub(crate) fn track(&self, action: TrackingAction) {
		self.tracker.track(&TrackingEvent { page: self.cfg.page, action });
	}

	async fn ensure_loaded(&self) -> Result<()> {
		self.loaded.get_or_try_init(|| self.fetch()).await?;

		Ok(())
	}

	async fn fetch(&self) -> Result<()> {
		self.set_state(LoadState::Loading);

		match self.storage.get_item(&self.cfg.storage_key).await {
			Ok(raw) => {
				let searches = raw.map(|raw| self.decode(&raw)).unwrap_or_default();
				let mut snapshot = self.lock();

				snapshot.searches = searches;
				snapshot.state = LoadState::Ready;

				Ok(())
			},
			Err(err) => {
				tracing::error!(
					error = %err,
					storage_key = %self.cfg.storage_key,
					"Failed to load saved searches."
				);
				self.notifier.notify_error(LOAD_FAILED_MESSAGE);

				let mut snapshot = self.lock();

				snapshot.searches = Vec::new();
				snapshot.state = LoadState::Failed;

				Err(err.into())
			},
		}
	}

	fn decode(&self, raw: &str) -> Vec<SavedSearch> {
		match schema::parse_saved_searches(raw) {
			Ok(Salvaged { searches, rejected }) => {
				if rejected > 0 {
					tracing::warn!(
						storage_key = %self.cfg.storage_key,
						rejected,
						kept = searches.len(),
						"Dropped invalid saved searches."
					);
				}

				searches
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					storage_key = %self.cfg.storage_key,
					"Discarding unreadable saved searches."
				);

				Vec::new()
			},
		}
	}

	async fn persist(&self, searches: Vec<SavedSearch>) -> Result<()> {
		let payload = serde_json::to_string(&searches)
			.map_err(|err| Error::Storage { message: err.to_string() })?;

		if let Err(err) = self.storage.set_item(&self.cfg.storage_key, &payload).await {
			tracing::error!(
				error = %err,
				storage_key = %self.cfg.storage_key,
				"Failed to save saved searches."
			);
			self.notifier.notify_error(SAVE_FAILED_MESSAGE);

			return Err(err.into());
		}

		self.lock().searches = searches;

		Ok(())
	}

	fn current(&self) -> Vec<SavedSearch> {
		self.lock().searches.clone()
	}

	fn set_state(&self, state: LoadState) {
		self.lock().state = state;
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Snapshot> {
		self.snapshot.lock().unwrap_or_else(|err| err.into_inner())
	}
}

fn validate_name(searches: &[SavedSearch], name: &str, exclude_id: Option<&str>) -> Result<()> {
	if name.is_empty() {
		return Err(Error::Validation {
			field: "name".to_string(),
			message: "Name is required.".to_string(),
		});
	}
	if find_name_conflict(searches, name, exclude_id).is_some() {
		return Err(Error::Validation {
			field: "name".to_string(),
			message: "A saved search with this name already exists.".to_string(),
		});
	}

	Ok(())
}

fn not_found(id: &str) -> Error {
	Error::NotFound { message: format!("Saved search {id} does not exist.") }
}

fn now_millis() -> i64 {
	(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
