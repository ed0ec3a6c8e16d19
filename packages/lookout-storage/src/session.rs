use std::{collections::HashSet, sync::Mutex};

/// Ephemeral flags that live as long as one browsing session.
pub trait SessionFlags
where
	Self: Send + Sync,
{
	fn is_set(&self, key: &str) -> bool;

	/// Sets `key` and reports whether it was unset before, as one atomic step.
	fn try_set(&self, key: &str) -> bool;

	fn clear(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySessionFlags {
	flags: Mutex<HashSet<String>>,
}
impl MemorySessionFlags {
	pub fn new() -> Self {
		Self::default()
	}
}
impl SessionFlags for MemorySessionFlags {
	fn is_set(&self, key: &str) -> bool {
		self.flags.lock().unwrap_or_else(|err| err.into_inner()).contains(key)
	}

	fn try_set(&self, key: &str) -> bool {
		self.flags.lock().unwrap_or_else(|err| err.into_inner()).insert(key.to_string())
	}

	fn clear(&self, key: &str) {
		self.flags.lock().unwrap_or_else(|err| err.into_inner()).remove(key);
	}
}
