//! HTTP client for the data-app backend.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, trace};

use crate::api::{
    BAR_DATA_PATH, BarResponse, DATA_PATH, LINE_DATA_PATH, LineResponse, PageResponse,
    STATS_PATH, Stats,
};
use crate::charts::{BarQuery, LineQuery};
use crate::fetcher::FetchFn;
use crate::query::QueryState;

/// Why a request did not produce data. The views only show the message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("{0}")]
    Network(String),
    /// Non-success status; the message names what could not be fetched.
    #[error("{context}")]
    Status { status: u16, context: &'static str },
    #[error("{context}: invalid response ({reason})")]
    Decode {
        context: &'static str,
        reason: String,
    },
}

/// Everything the views need from the backend.
pub trait DataSource: Send + Sync {
    fn fetch_page(&self, query: QueryState) -> BoxFuture<'static, Result<PageResponse, FetchError>>;
    fn fetch_stats(&self) -> BoxFuture<'static, Result<Stats, FetchError>>;
    fn fetch_line_data(&self, query: LineQuery)
    -> BoxFuture<'static, Result<LineResponse, FetchError>>;
    fn fetch_bar_data(&self, query: BarQuery) -> BoxFuture<'static, Result<BarResponse, FetchError>>;
}

pub fn page_fetch(source: Arc<dyn DataSource>) -> FetchFn<QueryState, PageResponse> {
    Arc::new(move |query| source.fetch_page(query))
}

pub fn line_fetch(source: Arc<dyn DataSource>) -> FetchFn<LineQuery, LineResponse> {
    Arc::new(move |query| source.fetch_line_data(query))
}

pub fn bar_fetch(source: Arc<dyn DataSource>) -> FetchFn<BarQuery, BarResponse> {
    Arc::new(move |query| source.fetch_bar_data(query))
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get<T: DeserializeOwned + Send + 'static>(
        &self,
        path: &'static str,
        params: Vec<(&'static str, String)>,
        context: &'static str,
    ) -> BoxFuture<'static, Result<T, FetchError>> {
        let request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&params);
        Box::pin(async move {
            trace!("GET {path} {params:?}");
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                debug!("GET {path} answered {status}");
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    context,
                });
            }
            response.json::<T>().await.map_err(|e| FetchError::Decode {
                context,
                reason: e.to_string(),
            })
        })
    }
}

impl DataSource for ApiClient {
    fn fetch_page(&self, query: QueryState) -> BoxFuture<'static, Result<PageResponse, FetchError>> {
        self.get(DATA_PATH, query.to_params(), "Failed to fetch data")
    }

    fn fetch_stats(&self) -> BoxFuture<'static, Result<Stats, FetchError>> {
        self.get(STATS_PATH, Vec::new(), "Failed to fetch stats")
    }

    fn fetch_line_data(
        &self,
        query: LineQuery,
    ) -> BoxFuture<'static, Result<LineResponse, FetchError>> {
        self.get(LINE_DATA_PATH, query.to_params(), "Failed to fetch line data")
    }

    fn fetch_bar_data(&self, query: BarQuery) -> BoxFuture<'static, Result<BarResponse, FetchError>> {
        self.get(BAR_DATA_PATH, query.to_params(), "Failed to fetch bar data")
    }
}
