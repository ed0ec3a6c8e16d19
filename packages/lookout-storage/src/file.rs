use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
};

use tokio::fs;
use uuid::Uuid;

use crate::{BoxFuture, Error, KeyValueStore, Result};

/// Stores each value at `<root>/<namespace>/<key>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so readers never see a
/// partially written value.
#[derive(Debug, Clone)]
pub struct FileStore {
	root: PathBuf,
}
impl FileStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn path_for(&self, namespace: &str, key: &str) -> Result<PathBuf> {
		validate_segment("namespace", namespace)?;
		validate_segment("key", key)?;

		Ok(self.root.join(namespace).join(format!("{key}.json")))
	}
}
impl KeyValueStore for FileStore {
	fn get_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move {
			let path = self.path_for(namespace, key)?;

			match fs::read_to_string(&path).await {
				Ok(raw) => Ok(Some(raw)),
				Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
				Err(err) => Err(err.into()),
			}
		})
	}

	fn set_item<'a>(
		&'a self,
		namespace: &'a str,
		key: &'a str,
		value: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let path = self.path_for(namespace, key)?;
			let dir = self.root.join(namespace);
			let tmp = dir.join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));

			fs::create_dir_all(&dir).await?;
			fs::write(&tmp, value).await?;

			if let Err(err) = fs::rename(&tmp, &path).await {
				let _ = fs::remove_file(&tmp).await;

				return Err(err.into());
			}

			Ok(())
		})
	}
}

fn validate_segment(label: &str, value: &str) -> Result<()> {
	let valid = !value.is_empty()
		&& !value.starts_with('.')
		&& value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

	if !valid {
		return Err(Error::InvalidKey(format!("{label} {value:?} is not a safe path segment.")));
	}

	Ok(())
}
