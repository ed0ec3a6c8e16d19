//! Shape checks for saved searches read back from storage.
//!
//! Stored values come from a shared key-value service and may have been written by older or
//! foreign clients. Reads degrade instead of failing: a broken array keeps every element that
//! validates on its own.

use serde_json::Value;

use crate::saved_search::SavedSearch;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
	#[error("Stored saved searches are not valid JSON: {0}")]
	MalformedJson(#[source] serde_json::Error),
	#[error("Stored saved searches must be a JSON array.")]
	NotAnArray,
	#[error("Invalid saved search{}: {message}", describe_index(.index))]
	InvalidRecord { index: Option<usize>, message: String },
}

fn describe_index(index: &Option<usize>) -> String {
	index.map(|index| format!(" at index {index}")).unwrap_or_default()
}

/// Result of partial-array recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Salvaged {
	pub searches: Vec<SavedSearch>,
	/// Number of elements dropped because they failed validation on their own.
	pub rejected: usize,
}

pub fn validate_saved_search(raw: &Value) -> Result<SavedSearch, SchemaError> {
	if !raw.is_object() {
		return Err(SchemaError::InvalidRecord {
			index: None,
			message: "expected an object".to_string(),
		});
	}

	serde_json::from_value(raw.clone())
		.map_err(|err| SchemaError::InvalidRecord { index: None, message: err.to_string() })
}

pub fn validate_saved_searches(raw: &Value) -> Result<Vec<SavedSearch>, SchemaError> {
	let items = raw.as_array().ok_or(SchemaError::NotAnArray)?;

	items
		.iter()
		.enumerate()
		.map(|(index, item)| {
			validate_saved_search(item).map_err(|err| match err {
				SchemaError::InvalidRecord { message, .. } =>
					SchemaError::InvalidRecord { index: Some(index), message },
				other => other,
			})
		})
		.collect()
}

/// Keeps the whole array when it validates, otherwise every element that passes alone.
pub fn salvage_saved_searches(raw: &Value) -> Salvaged {
	let Some(items) = raw.as_array() else {
		return Salvaged::default();
	};

	if let Ok(searches) = validate_saved_searches(raw) {
		return Salvaged { searches, rejected: 0 };
	}

	let searches =
		items.iter().filter_map(|item| validate_saved_search(item).ok()).collect::<Vec<_>>();
	let rejected = items.len() - searches.len();

	Salvaged { searches, rejected }
}

pub fn parse_saved_searches(raw: &str) -> Result<Salvaged, SchemaError> {
	let value: Value = serde_json::from_str(raw).map_err(SchemaError::MalformedJson)?;

	if !value.is_array() {
		return Err(SchemaError::NotAnArray);
	}

	Ok(salvage_saved_searches(&value))
}
