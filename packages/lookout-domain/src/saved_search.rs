use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// One named, persisted filter configuration.
///
/// Field names follow the stored JSON shape, which other clients read as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
	pub id: String,
	pub name: String,
	/// Serialized page state. Opaque here; the owning page decides what it means.
	pub query: String,
	pub is_default: bool,
	/// Epoch milliseconds.
	#[serde(deserialize_with = "deserialize_epoch_millis")]
	pub created_at: i64,
}

pub fn normalize_name(name: &str) -> String {
	name.trim().to_string()
}

pub fn names_collide(a: &str, b: &str) -> bool {
	a.to_lowercase() == b.to_lowercase()
}

pub fn find_name_conflict<'a>(
	searches: &'a [SavedSearch],
	name: &str,
	exclude_id: Option<&str>,
) -> Option<&'a SavedSearch> {
	searches
		.iter()
		.filter(|search| exclude_id != Some(search.id.as_str()))
		.find(|search| names_collide(&search.name, name))
}

pub fn has_default(searches: &[SavedSearch]) -> bool {
	searches.iter().any(|search| search.is_default)
}

pub fn default_search(searches: &[SavedSearch]) -> Option<&SavedSearch> {
	searches.iter().find(|search| search.is_default)
}

/// Marks `id` as the only default. `None` clears every default.
pub fn with_default(searches: Vec<SavedSearch>, id: Option<&str>) -> Vec<SavedSearch> {
	searches
		.into_iter()
		.map(|mut search| {
			search.is_default = id == Some(search.id.as_str());

			search
		})
		.collect()
}

/// Default first, then by name ignoring case and accents.
pub fn sort_saved_searches(mut searches: Vec<SavedSearch>) -> Vec<SavedSearch> {
	searches.sort_by_cached_key(|search| {
		(!search.is_default, collation_key(&search.name), search.name.clone(), search.id.clone())
	});

	searches
}

pub fn compare_names(a: &str, b: &str) -> Ordering {
	collation_key(a).cmp(&collation_key(b)).then_with(|| a.cmp(b))
}

fn collation_key(name: &str) -> String {
	name.nfkd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase).collect()
}

fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = serde_json::Number::deserialize(deserializer)?;

	if let Some(value) = raw.as_i64() {
		return Ok(value);
	}

	match raw.as_f64() {
		Some(value) if value.is_finite() => Ok(value.trunc() as i64),
		_ => Err(serde::de::Error::custom("createdAt must be a finite number.")),
	}
}
