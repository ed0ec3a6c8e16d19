use std::{
	env, fs, io,
	path::{Path, PathBuf},
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use tokio::sync::Notify;
use uuid::Uuid;

use lookout_service::{
	Navigator, Notifier, SavedSearchStore, StoreConfig, Tracker, TrackingEvent, TrackingPage,
};
use lookout_storage::{BoxFuture, Error, KeyValueStore, MemoryStore, Result, ScopedStorage};

pub const NAMESPACE: &str = "alerting";

/// A scratch directory removed on drop.
pub struct TestDir {
	path: PathBuf,
}
impl TestDir {
	pub fn new(prefix: &str) -> io::Result<Self> {
		let path = env::temp_dir().join(format!("{prefix}_{}", Uuid::new_v4().simple()));

		fs::create_dir_all(&path)?;

		Ok(Self { path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl Drop for TestDir {
	fn drop(&mut self) {
		if let Err(err) = fs::remove_dir_all(&self.path) {
			eprintln!("Test directory cleanup failed: {err}.");
		}
	}
}

/// In-memory backend that can be told to fail, and counts calls.
#[derive(Default)]
pub struct FlakyStore {
	inner: MemoryStore,
	fail_reads: AtomicBool,
	fail_writes: AtomicBool,
	reads: AtomicUsize,
	writes: AtomicUsize,
}
impl FlakyStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn fail_reads(&self, fail: bool) {
		self.fail_reads.store(fail, Ordering::SeqCst);
	}

	pub fn fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	pub fn reads(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}

	pub fn writes(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}
}
impl KeyValueStore for FlakyStore {
	fn get_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>> {
		self.reads.fetch_add(1, Ordering::SeqCst);

		if self.fail_reads.load(Ordering::SeqCst) {
			return Box::pin(async { Err(Error::Unavailable("read rejected".to_string())) });
		}

		self.inner.get_item(namespace, key)
	}

	fn set_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
		value: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		self.writes.fetch_add(1, Ordering::SeqCst);

		if self.fail_writes.load(Ordering::SeqCst) {
			return Box::pin(async { Err(Error::Unavailable("write rejected".to_string())) });
		}

		self.inner.set_item(namespace, key, value)
	}
}

/// In-memory backend whose reads wait until [`GatedStore::release`]. Writes pass through.
#[derive(Default)]
pub struct GatedStore {
	inner: MemoryStore,
	gate: Notify,
}
impl GatedStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Lets one pending or later read through.
	pub fn release(&self) {
		self.gate.notify_one();
	}
}
impl KeyValueStore for GatedStore {
	fn get_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move {
			self.gate.notified().await;

			self.inner.get_item(namespace, key).await
		})
	}

	fn set_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
		value: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		self.inner.set_item(namespace, key, value)
	}
}

#[derive(Default)]
pub struct RecordingTracker {
	events: Mutex<Vec<TrackingEvent>>,
}
impl RecordingTracker {
	pub fn events(&self) -> Vec<TrackingEvent> {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl Tracker for RecordingTracker {
	fn track(&self, event: &TrackingEvent) {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).push(*event);
	}
}

#[derive(Default)]
pub struct RecordingNotifier {
	messages: Mutex<Vec<String>>,
}
impl RecordingNotifier {
	pub fn messages(&self) -> Vec<String> {
		self.messages.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl Notifier for RecordingNotifier {
	fn notify_error(&self, message: &str) {
		self.messages.lock().unwrap_or_else(|err| err.into_inner()).push(message.to_string());
	}
}

#[derive(Default)]
pub struct RecordingNavigator {
	locations: Mutex<Vec<String>>,
}
impl RecordingNavigator {
	pub fn locations(&self) -> Vec<String> {
		self.locations.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl Navigator for RecordingNavigator {
	fn navigate(&self, location: &str) {
		self.locations.lock().unwrap_or_else(|err| err.into_inner()).push(location.to_string());
	}
}

/// A store wired to recording doubles over a shared backend.
pub struct StoreHarness {
	pub backend: Arc<FlakyStore>,
	pub tracker: Arc<RecordingTracker>,
	pub notifier: Arc<RecordingNotifier>,
	pub store: SavedSearchStore,
}
impl StoreHarness {
	pub fn new(page: TrackingPage) -> Self {
		Self::with_backend(Arc::new(FlakyStore::new()), page)
	}

	pub fn with_backend(backend: Arc<FlakyStore>, page: TrackingPage) -> Self {
		let tracker = Arc::new(RecordingTracker::default());
		let notifier = Arc::new(RecordingNotifier::default());
		let store = SavedSearchStore::new(
			store_config(page),
			ScopedStorage::new(backend.clone(), NAMESPACE),
			tracker.clone(),
			notifier.clone(),
		);

		Self { backend, tracker, notifier, store }
	}

	pub async fn seed(&self, page: TrackingPage, raw: &str) {
		let key = store_config(page).storage_key;

		if let Err(err) = self.backend.inner.set_item(NAMESPACE, &key, raw).await {
			panic!("Failed to seed saved searches: {err}.");
		}
	}

	pub async fn stored(&self, page: TrackingPage) -> Option<String> {
		let key = store_config(page).storage_key;

		self.backend.inner.get_item(NAMESPACE, &key).await.unwrap_or_else(|err| {
			panic!("Failed to read stored saved searches: {err}.");
		})
	}
}

pub fn store_config(page: TrackingPage) -> StoreConfig {
	match page {
		TrackingPage::RuleList => StoreConfig {
			storage_key: "savedSearches".to_string(),
			page,
			base_path: "/alerting/list".to_string(),
		},
		TrackingPage::Triage => StoreConfig {
			storage_key: "triageSavedSearches".to_string(),
			page,
			base_path: "/alerting/triage".to_string(),
		},
	}
}
