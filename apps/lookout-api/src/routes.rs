use std::sync::Mutex;

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, patch, post, put},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use lookout_domain::{
	SavedSearch,
	triage::{self, ParsedFilter, TriageSceneState},
};
use lookout_service::{Error as ServiceError, Navigator, SavedSearchStore};

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
	pub name: String,
	#[serde(default)]
	pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
	pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetDefaultRequest {
	pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
	pub location: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SerializeResponse {
	pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseParams {
	#[serde(default)]
	pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
	pub state: TriageSceneState,
	pub parsed_filters: Vec<ParsedFilter>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Validation { field, message } => json_error(
				StatusCode::UNPROCESSABLE_ENTITY,
				"VALIDATION_ERROR",
				message,
				Some(vec![field]),
			),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::Storage { message } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", message, None),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

/// Captures the location a saved search navigates to, for returning it to the caller.
#[derive(Default)]
struct CapturedLocation(Mutex<Option<String>>);
impl CapturedLocation {
	fn take(&self) -> Option<String> {
		self.0.lock().unwrap_or_else(|err| err.into_inner()).take()
	}
}
impl Navigator for CapturedLocation {
	fn navigate(&self, location: &str) {
		*self.0.lock().unwrap_or_else(|err| err.into_inner()) = Some(location.to_string());
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/pages/{page}/saved-searches", get(list_searches).post(save_search))
		.route("/v1/pages/{page}/saved-searches/{id}", patch(rename_search).delete(delete_search))
		.route("/v1/pages/{page}/saved-searches/{id}/apply", post(apply_search))
		.route("/v1/pages/{page}/default", put(set_default))
		.route("/v1/triage/serialize", post(serialize_triage))
		.route("/v1/triage/parse", get(parse_triage))
		.with_state(state)
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_searches(
	State(state): State<AppState>,
	Path(page): Path<String>,
) -> Result<Json<Vec<SavedSearch>>, ApiError> {
	let store = page_store(&state, &page)?;

	Ok(Json(store.load().await))
}

async fn save_search(
	State(state): State<AppState>,
	Path(page): Path<String>,
	Json(payload): Json<SaveRequest>,
) -> Result<(StatusCode, Json<SavedSearch>), ApiError> {
	let store = page_store(&state, &page)?;
	let saved = store.save_search(&payload.name, &payload.query).await?;

	Ok((StatusCode::CREATED, Json(saved)))
}

async fn rename_search(
	State(state): State<AppState>,
	Path((page, id)): Path<(String, String)>,
	Json(payload): Json<RenameRequest>,
) -> Result<Json<SavedSearch>, ApiError> {
	let store = page_store(&state, &page)?;
	let renamed = store.rename_search(&id, &payload.name).await?;

	Ok(Json(renamed))
}

async fn delete_search(
	State(state): State<AppState>,
	Path((page, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
	let store = page_store(&state, &page)?;

	store.delete_search(&id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn set_default(
	State(state): State<AppState>,
	Path(page): Path<String>,
	Json(payload): Json<SetDefaultRequest>,
) -> Result<Json<Vec<SavedSearch>>, ApiError> {
	let store = page_store(&state, &page)?;

	store.set_default_search(payload.id.as_deref()).await?;

	Ok(Json(store.saved_searches()))
}

async fn apply_search(
	State(state): State<AppState>,
	Path((page, id)): Path<(String, String)>,
) -> Result<Json<ApplyResponse>, ApiError> {
	let store = page_store(&state, &page)?;
	let navigator = CapturedLocation::default();
	let search = store.apply_search(&id, &navigator).await?;
	let location = navigator
		.take()
		.unwrap_or_else(|| triage::generate_url(&search.query, &store.config().base_path));

	Ok(Json(ApplyResponse { location }))
}

async fn serialize_triage(Json(payload): Json<TriageSceneState>) -> Json<SerializeResponse> {
	Json(SerializeResponse { query: triage::serialize_triage_scene_state(&payload) })
}

async fn parse_triage(Query(params): Query<ParseParams>) -> Json<ParseResponse> {
	Json(ParseResponse {
		state: triage::parse_triage_query(&params.query),
		parsed_filters: triage::extract_parsed_filters(&params.query),
	})
}

fn page_store<'a>(state: &'a AppState, page: &str) -> Result<&'a SavedSearchStore, ApiError> {
	state.store(page).ok_or_else(|| {
		json_error(StatusCode::NOT_FOUND, "UNKNOWN_PAGE", format!("Unknown page {page}."), None)
	})
}
