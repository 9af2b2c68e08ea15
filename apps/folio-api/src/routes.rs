use axum::{
	Json, Router,
	extract::{
		Path, Query, State,
		rejection::{JsonRejection, PathRejection, QueryRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_domain::query::RawDiscoveryQuery;
use folio_service::{
	Category, Content, CreateCategoryRequest, CreateContentRequest, Error, ListResponse,
	SearchRequest, SearchResponse, TrendingRequest, TrendingResponse, UpdateCategoryRequest,
	UpdateContentRequest, ViewCountResponse,
};

use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CycleCheckParams {
	pub parent_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CycleCheckResponse {
	pub category_id: Uuid,
	pub parent_id: Uuid,
	pub would_create_cycle: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}

	fn invalid(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => Self::invalid(message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, "not_found", message),
			Error::Conflict { message } => Self::new(StatusCode::CONFLICT, "conflict", message),
			Error::Unavailable { message } =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage request failed.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"storage_error",
					"Storage request failed.",
				)
			},
			Error::Cancelled => Self::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"request_timeout",
				"Request did not finish in time.",
			),
		}
	}
}
impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		Self::invalid(rejection.body_text())
	}
}
impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		Self::invalid(rejection.body_text())
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::invalid(rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/contents", get(list_contents).post(create_content))
		.route("/v1/contents/search", get(search_contents))
		.route("/v1/contents/trending", get(trending_contents))
		.route(
			"/v1/contents/{content_id}",
			get(get_content).patch(update_content).delete(delete_content),
		)
		.route("/v1/contents/{content_id}/views", post(record_view))
		.route("/v1/categories", get(list_categories).post(create_category))
		.route(
			"/v1/categories/{category_id}",
			get(get_category).patch(update_category).delete(delete_category),
		)
		.route("/v1/categories/{category_id}/cycle-check", get(cycle_check))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_contents(
	State(state): State<AppState>,
	query: Result<Query<RawDiscoveryQuery>, QueryRejection>,
) -> ApiResult<Json<ListResponse>> {
	let Query(params) = query?;
	let deadline = state.deadline();
	let response = state.service.list(params, deadline.token()).await?;

	Ok(Json(response))
}

async fn search_contents(
	State(state): State<AppState>,
	query: Result<Query<SearchRequest>, QueryRejection>,
) -> ApiResult<Json<SearchResponse>> {
	let Query(params) = query?;
	let deadline = state.deadline();
	let response = state.service.search(params, deadline.token()).await?;

	Ok(Json(response))
}

async fn trending_contents(
	State(state): State<AppState>,
	query: Result<Query<TrendingRequest>, QueryRejection>,
) -> ApiResult<Json<TrendingResponse>> {
	let Query(params) = query?;
	let deadline = state.deadline();
	let response = state.service.trending(params, deadline.token()).await?;

	Ok(Json(response))
}

async fn create_content(
	State(state): State<AppState>,
	payload: Result<Json<CreateContentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Content>)> {
	let Json(payload) = payload?;
	let content = state.service.create_content(payload).await?;

	Ok((StatusCode::CREATED, Json(content)))
}

async fn get_content(
	State(state): State<AppState>,
	content_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Content>> {
	let Path(content_id) = content_id?;

	Ok(Json(state.service.get_content(content_id).await?))
}

async fn update_content(
	State(state): State<AppState>,
	content_id: Result<Path<Uuid>, PathRejection>,
	payload: Result<Json<UpdateContentRequest>, JsonRejection>,
) -> ApiResult<Json<Content>> {
	let Path(content_id) = content_id?;
	let Json(payload) = payload?;

	Ok(Json(state.service.update_content(content_id, payload).await?))
}

async fn delete_content(
	State(state): State<AppState>,
	content_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
	let Path(content_id) = content_id?;

	state.service.delete_content(content_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn record_view(
	State(state): State<AppState>,
	content_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ViewCountResponse>> {
	let Path(content_id) = content_id?;

	Ok(Json(state.service.record_view(content_id).await?))
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
	Ok(Json(state.service.list_categories().await?))
}

async fn create_category(
	State(state): State<AppState>,
	payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
	let Json(payload) = payload?;
	let category = state.service.create_category(payload).await?;

	Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
	State(state): State<AppState>,
	category_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Category>> {
	let Path(category_id) = category_id?;

	Ok(Json(state.service.get_category(category_id).await?))
}

async fn update_category(
	State(state): State<AppState>,
	category_id: Result<Path<Uuid>, PathRejection>,
	payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> ApiResult<Json<Category>> {
	let Path(category_id) = category_id?;
	let Json(payload) = payload?;
	let deadline = state.deadline();
	let category = state.service.update_category(category_id, payload, deadline.token()).await?;

	Ok(Json(category))
}

async fn delete_category(
	State(state): State<AppState>,
	category_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
	let Path(category_id) = category_id?;

	state.service.delete_category(category_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn cycle_check(
	State(state): State<AppState>,
	category_id: Result<Path<Uuid>, PathRejection>,
	query: Result<Query<CycleCheckParams>, QueryRejection>,
) -> ApiResult<Json<CycleCheckResponse>> {
	let Path(category_id) = category_id?;
	let Query(params) = query?;
	let deadline = state.deadline();
	let would_create_cycle = state
		.service
		.would_create_cycle(category_id, params.parent_id, deadline.token())
		.await?;

	Ok(Json(CycleCheckResponse { category_id, parent_id: params.parent_id, would_create_cycle }))
}
