use std::sync::Arc;

use lookout_config::StorageBackend;

use crate::{BoxFuture, Error, FileStore, MemoryStore, Result};

/// Namespaced string values by string key.
///
/// No retries and no conflict detection: the last completed write wins.
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	fn get_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>>;

	fn set_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
		value: &'a str,
	) -> BoxFuture<'a, Result<()>>;
}

/// A backend bound to one service namespace.
#[derive(Clone)]
pub struct ScopedStorage {
	backend: Arc<dyn KeyValueStore>,
	namespace: String,
}
impl ScopedStorage {
	pub fn new(backend: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
		Self { backend, namespace: namespace.into() }
	}

	pub fn from_config(cfg: &lookout_config::Storage) -> Result<Self> {
		let backend: Arc<dyn KeyValueStore> = match cfg.backend {
			StorageBackend::Memory => Arc::new(MemoryStore::new()),
			StorageBackend::File => {
				let root = cfg.root.clone().ok_or_else(|| {
					Error::Unavailable("storage.root is required for the file backend.".to_string())
				})?;

				Arc::new(FileStore::new(root))
			},
		};

		Ok(Self::new(backend, cfg.namespace.clone()))
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
		self.backend.get_item(&self.namespace, key).await
	}

	pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
		self.backend.set_item(&self.namespace, key, value).await
	}
}
