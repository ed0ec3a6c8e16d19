use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{BoxFuture, KeyValueStore, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
	items: RwLock<HashMap<(String, String), String>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}
impl KeyValueStore for MemoryStore {
	fn get_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move {
			let items = self.items.read().await;

			Ok(items.get(&(namespace.to_string(), key.to_string())).cloned())
		})
	}

	fn set_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
		value: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut items = self.items.write().await;

			items.insert((namespace.to_string(), key.to_string()), value.to_string());

			Ok(())
		})
	}
}
