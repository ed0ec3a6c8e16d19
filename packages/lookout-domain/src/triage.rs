//! Triage page state as URL query parameters.
//!
//! Filters travel as repeated `var-filters` values encoded `key|operator|value`, group-by keys
//! as repeated `var-groupBy` values, and the time range as single `from`/`to` values.

use serde::{Deserialize, Serialize};
use time::{
	OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};
use url::form_urlencoded;

pub const FILTERS_PARAM: &str = "var-filters";
pub const GROUP_BY_PARAM: &str = "var-groupBy";
pub const FROM_PARAM: &str = "from";
pub const TO_PARAM: &str = "to";
pub const DEFAULT_FROM: &str = "now-4h";
pub const DEFAULT_TO: &str = "now";

const RULE_LIST_SEARCH_PARAM: &str = "search";
const ISO_MILLIS: &[BorrowedFormatItem<'static>] = format_description!(
	"[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

/// One end of a time range: a time expression such as `now-1h`, or an absolute instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeValue {
	Expr(String),
	Instant(OffsetDateTime),
}
impl TimeValue {
	/// Instants render as ISO-8601 UTC with millisecond precision.
	pub fn to_query_value(&self) -> String {
		match self {
			Self::Expr(expr) => expr.clone(),
			Self::Instant(instant) => {
				let utc = instant.to_offset(UtcOffset::UTC);

				utc.format(ISO_MILLIS).unwrap_or_else(|_| utc.to_string())
			},
		}
	}
}
impl From<String> for TimeValue {
	fn from(value: String) -> Self {
		Self::Expr(value)
	}
}
impl From<&str> for TimeValue {
	fn from(value: &str) -> Self {
		Self::Expr(value.to_string())
	}
}
impl From<OffsetDateTime> for TimeValue {
	fn from(value: OffsetDateTime) -> Self {
		Self::Instant(value)
	}
}
impl From<TimeValue> for String {
	fn from(value: TimeValue) -> Self {
		value.to_query_value()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
	pub from: TimeValue,
	pub to: TimeValue,
}
impl Default for TimeRange {
	fn default() -> Self {
		Self { from: DEFAULT_FROM.into(), to: DEFAULT_TO.into() }
	}
}

/// Time range strings as read back from a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeParams {
	pub from: String,
	pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageSceneState {
	#[serde(default)]
	pub time_range: TimeRange,
	#[serde(default)]
	pub filters: Vec<String>,
	#[serde(default)]
	pub group_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFilter {
	pub key: String,
	pub operator: String,
	pub value: String,
}

pub fn serialize_triage_scene_state(state: &TriageSceneState) -> String {
	let mut params = form_urlencoded::Serializer::new(String::new());

	for filter in state.filters.iter().filter(|filter| !filter.is_empty()) {
		params.append_pair(FILTERS_PARAM, filter);
	}
	for key in state.group_by.iter().filter(|key| !key.is_empty()) {
		params.append_pair(GROUP_BY_PARAM, key);
	}

	params.append_pair(FROM_PARAM, &state.time_range.from.to_query_value());
	params.append_pair(TO_PARAM, &state.time_range.to.to_query_value());

	params.finish()
}

/// Only the first two pipes separate fields; the value keeps any further pipes.
pub fn parse_filter_string(raw: &str) -> Option<ParsedFilter> {
	let mut parts = raw.splitn(3, '|');
	let key = parts.next()?;
	let operator = parts.next()?;
	let value = parts.next()?;

	if key.is_empty() || operator.is_empty() {
		return None;
	}

	Some(ParsedFilter {
		key: key.to_string(),
		operator: operator.to_string(),
		value: value.to_string(),
	})
}

pub fn extract_time_range(query: &str) -> TimeRangeParams {
	TimeRangeParams {
		from: first_value(query, FROM_PARAM).unwrap_or_else(|| DEFAULT_FROM.to_string()),
		to: first_value(query, TO_PARAM).unwrap_or_else(|| DEFAULT_TO.to_string()),
	}
}

pub fn extract_group_by(query: &str) -> Vec<String> {
	all_values(query, GROUP_BY_PARAM)
}

pub fn extract_filters(query: &str) -> Vec<String> {
	all_values(query, FILTERS_PARAM)
}

pub fn extract_parsed_filters(query: &str) -> Vec<ParsedFilter> {
	extract_filters(query).iter().filter_map(|filter| parse_filter_string(filter)).collect()
}

pub fn parse_triage_query(query: &str) -> TriageSceneState {
	let TimeRangeParams { from, to } = extract_time_range(query);

	TriageSceneState {
		time_range: TimeRange { from: from.into(), to: to.into() },
		filters: extract_filters(query),
		group_by: extract_group_by(query),
	}
}

/// The time range never counts as active state.
pub fn has_active_triage_state(query: &str) -> bool {
	!extract_filters(query).is_empty() || !extract_group_by(query).is_empty()
}

pub fn has_active_rule_list_filters(query: &str) -> bool {
	first_value(query, RULE_LIST_SEARCH_PARAM).is_some_and(|search| !search.trim().is_empty())
}

pub fn generate_url(query: &str, base_path: &str) -> String {
	let query = strip_question_mark(query);

	if query.is_empty() { base_path.to_string() } else { format!("{base_path}?{query}") }
}

fn strip_question_mark(query: &str) -> &str {
	query.strip_prefix('?').unwrap_or(query)
}

fn pairs(query: &str) -> form_urlencoded::Parse<'_> {
	form_urlencoded::parse(strip_question_mark(query).as_bytes())
}

fn first_value(query: &str, name: &str) -> Option<String> {
	pairs(query)
		.find(|(key, value)| key == name && !value.is_empty())
		.map(|(_, value)| value.into_owned())
}

fn all_values(query: &str, name: &str) -> Vec<String> {
	pairs(query)
		.filter(|(key, value)| key == name && !value.is_empty())
		.map(|(_, value)| value.into_owned())
		.collect()
}
