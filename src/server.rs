//! HTTP backend serving the employee table, its statistics and the chart data.
//!
//! GET /api/health
//! GET /api/dataframe/data - one filtered, sorted page of employees
//! GET /api/dataframe/stats - aggregate metrics over all employees
//! GET /api/plotting/line-data - daily stock prices
//! GET /api/plotting/bar-data - sales per category

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use derive_setters::Setters;
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::{
    BAR_DATA_PATH, BarResponse, DATA_PATH, ErrorResponse, HEALTH_PATH, HealthResponse,
    LINE_DATA_PATH, LineResponse, PageResponse, STATS_PATH, StatsResponse,
};
use crate::charts::DEFAULT_DAYS;
use crate::domain::DataAppError;
use crate::query::SortOrder;
use crate::sample_data::{DEFAULT_EMPLOYEE_COUNT, DEFAULT_SEED};
use crate::store::{DataStore, EmployeeQuery};

pub const SERVICE_NAME: &str = "data-app-backend";

pub struct AppState {
    pub store: DataStore,
}

#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Employee table to serve instead of generated data.
    #[setters(strip_option)]
    pub employees: Option<PathBuf>,
    pub employee_count: usize,
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            employees: None,
            employee_count: DEFAULT_EMPLOYEE_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected request parameters.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] DataAppError),
    #[error("request worker failed: {0}")]
    Worker(#[from] JoinError),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) | ApiError::Worker(_) => {
                error!("Request failed: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn check_range(name: &str, value: i64, min: i64, max: i64) -> Result<i64, ApiError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct DataParams {
    page: Option<i64>,
    page_size: Option<i64>,
    sort_by: Option<String>,
    sort_order: Option<SortOrder>,
    department: Option<String>,
    search: Option<String>,
}

impl TryFrom<DataParams> for EmployeeQuery {
    type Error = ApiError;

    fn try_from(params: DataParams) -> Result<Self, Self::Error> {
        let page = check_range("page", params.page.unwrap_or(1), 1, u32::MAX as i64)?;
        let page_size = check_range("page_size", params.page_size.unwrap_or(10), 5, 50)?;
        Ok(EmployeeQuery {
            page: page as u32,
            page_size: page_size as u32,
            sort_by: non_empty(params.sort_by),
            sort_order: params.sort_order.unwrap_or_default(),
            department: non_empty(params.department),
            search: non_empty(params.search),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LineParams {
    company: Option<String>,
    days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BarParams {
    region: Option<String>,
}

/// Run a store query on the blocking pool. Polars may drive its own runtime while collecting.
async fn query_store<T, F>(state: Arc<AppState>, query: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&DataStore) -> Result<T, DataAppError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || query(&state.store)).await?;
    Ok(result?)
}

/// GET /api/health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// GET /api/dataframe/data
async fn data_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DataParams>, QueryRejection>,
) -> Result<Json<PageResponse>, ApiError> {
    let Query(params) = params?;
    let query = EmployeeQuery::try_from(params)?;
    let page = query_store(state, move |store| store.employees.query_page(&query)).await?;
    Ok(Json(page))
}

/// GET /api/dataframe/stats
async fn stats_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = query_store(state, |store| store.employees.stats()).await?;
    Ok(Json(stats))
}

/// GET /api/plotting/line-data
async fn line_data_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LineParams>, QueryRejection>,
) -> Result<Json<LineResponse>, ApiError> {
    let Query(params) = params?;
    let days = check_range("days", params.days.unwrap_or(DEFAULT_DAYS as i64), 7, 365)?;
    let company = non_empty(params.company);
    let line = query_store(state, move |store| {
        store.stocks.line_data(company.as_deref(), days as usize)
    })
    .await?;
    Ok(Json(line))
}

/// GET /api/plotting/bar-data
async fn bar_data_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<BarParams>, QueryRejection>,
) -> Result<Json<BarResponse>, ApiError> {
    let Query(params) = params?;
    let region = non_empty(params.region);
    let bars = query_store(state, move |store| store.sales.bar_data(region.as_deref())).await?;
    Ok(Json(bars))
}

pub fn router(store: DataStore) -> Router {
    let state = Arc::new(AppState { store });
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(DATA_PATH, get(data_handler))
        .route(STATS_PATH, get(stats_handler))
        .route(LINE_DATA_PATH, get(line_data_handler))
        .route(BAR_DATA_PATH, get(bar_data_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `store` on an already bound listener until ctrl-c.
pub async fn serve(listener: TcpListener, store: DataStore) -> Result<(), DataAppError> {
    let app = router(store);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}

/// Build the data store and start the HTTP server.
pub async fn run_server(config: ServerConfig) -> Result<(), DataAppError> {
    let today = chrono::Local::now().date_naive();
    let store = DataStore::build(
        config.employees.clone(),
        config.employee_count,
        config.seed,
        today,
    )?;
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    serve(listener, store).await
}
