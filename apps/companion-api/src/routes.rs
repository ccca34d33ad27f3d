use axum::{
	Json, Router,
	extract::{Path, Query, State, rejection::JsonRejection},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use companion_domain::UserProfile;
use companion_service::{
	Error as ServiceError, EventRequest, EventResponse, ExplainRequest, ExplainResponse,
	HealthResponse, NextRequest, NextResponse, ProfilePatch, RecommendRequest, RecommendResponse,
	RefreshResponse, SearchMode, SearchRequest, SearchResponse,
};

use crate::state::AppState;

pub const HEADER_API_KEY: &str = "x-api-key";

type Params = Query<Vec<(String, String)>>;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/v1/health", get(health))
		.route("/v1/search", get(search))
		.route("/v1/recommend", get(recommend))
		.route("/v1/next", get(next))
		.route("/v1/explain", get(explain))
		.route("/v1/events", post(log_event))
		.route("/v1/users/{id}", get(get_profile).patch(update_profile))
		.route("/v1/admin/refresh", post(refresh))
		.with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(state.service.health())
}

async fn search(
	State(state): State<AppState>,
	Query(params): Params,
) -> Result<Json<SearchResponse>, ApiError> {
	let params = QueryParams(params);
	let mode = match params.first("mode") {
		Some(raw) =>
			raw.parse::<SearchMode>().map_err(|err| with_field(err.into(), "$.mode"))?,
		None => SearchMode::default(),
	};
	let req = SearchRequest {
		q: params.required("q")?.to_string(),
		mode,
		limit: params.parse_u32("limit")?,
		offset: params.parse_u32("offset")?,
		tags: params.all("tags"),
	};
	let response = state.service.search(req)?;

	Ok(Json(response))
}

async fn recommend(
	State(state): State<AppState>,
	Query(params): Params,
) -> Result<Json<RecommendResponse>, ApiError> {
	let params = QueryParams(params);
	let req = RecommendRequest {
		tags: params.all("tags"),
		top_k: params.parse_u32("topk")?,
		user_id: params.first("user_id").map(str::to_string),
	};
	let response = state.service.recommend(req).await?;

	Ok(Json(response))
}

async fn next(
	State(state): State<AppState>,
	Query(params): Params,
) -> Result<Json<NextResponse>, ApiError> {
	let params = QueryParams(params);
	let req = NextRequest {
		user_id: params.required("user_id")?.to_string(),
		goals: params.all("goals"),
	};
	let response = state.service.next(req).await?;

	Ok(Json(response))
}

async fn explain(
	State(state): State<AppState>,
	Query(params): Params,
) -> Result<Json<ExplainResponse>, ApiError> {
	let params = QueryParams(params);
	let episode_id = params.required("episode_id")?.to_string();
	let Some(chunk_index) = params.parse_u32("chunk_index")? else {
		return Err(validation_error("chunk_index is required.", "$.chunk_index"));
	};
	let response = state.service.explain(ExplainRequest { episode_id, chunk_index })?;

	Ok(Json(response))
}

async fn log_event(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
	require_write_key(&state, &headers)?;

	let Json(payload) = payload.map_err(json_rejection)?;
	let response = state.service.log_event(payload).await?;

	Ok(Json(response))
}

async fn get_profile(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
	let response = state.service.get_profile(&user_id).await?;

	Ok(Json(response))
}

async fn update_profile(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
	headers: HeaderMap,
	payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
	require_write_key(&state, &headers)?;

	let Json(payload) = payload.map_err(json_rejection)?;
	let response = state.service.update_profile(&user_id, payload).await?;

	Ok(Json(response))
}

async fn refresh(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<RefreshResponse>, ApiError> {
	let Some(expected) = state.service.cfg.security.api_key.as_deref() else {
		return Err(json_error(
			StatusCode::UNAUTHORIZED,
			"UNAUTHORIZED",
			"Admin API key is not configured.",
			None,
		));
	};

	if !is_authorized(&headers, expected) {
		return Err(unauthorized());
	}

	let response = state.service.refresh().await?;

	Ok(Json(response))
}

/// Events and profile writes need the key only when one is configured and `protect_writes` is on.
fn require_write_key(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
	let security = &state.service.cfg.security;

	match security.api_key.as_deref() {
		Some(expected) if security.protect_writes && !is_authorized(headers, expected) =>
			Err(unauthorized()),
		_ => Ok(()),
	}
}

fn is_authorized(headers: &HeaderMap, expected: &str) -> bool {
	read_api_key(headers).is_some_and(|key| key == expected)
}

fn read_api_key(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(HEADER_API_KEY)?.to_str().ok()?.trim();

	if value.is_empty() { None } else { Some(value) }
}

/// Query pairs in request order; repeatable keys also match their `key[]` spelling.
struct QueryParams(Vec<(String, String)>);
impl QueryParams {
	fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
		self.0.iter().filter_map(move |(key, value)| {
			let key = key.strip_suffix("[]").unwrap_or(key);

			(key == name).then_some(value.as_str())
		})
	}

	fn first(&self, name: &str) -> Option<&str> {
		self.values(name).map(str::trim).find(|value| !value.is_empty())
	}

	fn all(&self, name: &str) -> Vec<String> {
		self.values(name)
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(str::to_string)
			.collect()
	}

	fn required(&self, name: &str) -> Result<&str, ApiError> {
		self.first(name).ok_or_else(|| {
			validation_error(format!("{name} is required."), format!("$.{name}"))
		})
	}

	fn parse_u32(&self, name: &str) -> Result<Option<u32>, ApiError> {
		let Some(raw) = self.first(name) else { return Ok(None) };

		raw.parse::<u32>().map(Some).map_err(|_| {
			validation_error(
				format!("{name} must be a non-negative integer; got {raw:?}."),
				format!("$.{name}"),
			)
		})
	}
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
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, None),
			ServiceError::InvalidEvent { message } => json_error(
				StatusCode::BAD_REQUEST,
				"INVALID_EVENT",
				message,
				Some(vec!["$.event".to_string()]),
			),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::IndexBuild { message } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "INDEX_BUILD_ERROR", message, None),
			ServiceError::Unavailable { message } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", message, None),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage failure while serving a request.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message, None)
			},
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

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

fn validation_error(message: impl Into<String>, field: impl Into<String>) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, Some(vec![field.into()]))
}

fn with_field(mut err: ApiError, field: &str) -> ApiError {
	err.fields = Some(vec![field.to_string()]);

	err
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", rejection.body_text(), None)
}

fn unauthorized() -> ApiError {
	json_error(
		StatusCode::UNAUTHORIZED,
		"UNAUTHORIZED",
		format!("Missing or invalid {HEADER_API_KEY} header."),
		None,
	)
}
