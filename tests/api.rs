use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::get,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tower::ServiceExt;

use data_app::api::{
    BarResponse, DATA_PATH, ErrorResponse, HealthResponse, LineResponse, PageResponse,
    StatsResponse,
};
use data_app::charts::LineQuery;
use data_app::client::{ApiClient, DataSource};
use data_app::query::{QueryStateHolder, SortColumn};
use data_app::server::{SERVICE_NAME, router};
use data_app::store::DataStore;

fn store() -> DataStore {
    let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    DataStore::build(None, 100, 42, today).unwrap()
}

async fn get_json<T: DeserializeOwned>(app: &Router, uri: &str) -> (StatusCode, T) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_names_the_service() {
    let app = router(store());
    let (status, body): (_, HealthResponse) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "healthy");
    assert_eq!(body.service, SERVICE_NAME);
}

#[tokio::test]
async fn default_page_has_ten_rows() {
    let app = router(store());
    let (status, body): (_, PageResponse) = get_json(&app, "/api/dataframe/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.data.len(), 10);
    assert_eq!(body.pagination.page, 1);
    assert_eq!(body.pagination.page_size, 10);
    assert_eq!(body.pagination.total_items, 100);
    assert_eq!(body.pagination.total_pages, 10);
    assert!(!body.filters.departments.is_empty());
    assert!(!body.filters.positions.is_empty());
}

#[tokio::test]
async fn department_filter_keeps_full_filter_options() {
    let app = router(store());
    let (_, all): (_, PageResponse) = get_json(&app, "/api/dataframe/data").await;
    let department = all.filters.departments[0].clone();

    let uri = format!("/api/dataframe/data?department={department}&page_size=50");
    let (status, body): (_, PageResponse) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.data.is_empty());
    assert!(body.data.iter().all(|e| e.department == department));
    assert!(body.pagination.total_items < 100);
    assert_eq!(body.filters, all.filters);
}

#[tokio::test]
async fn search_ignores_case() {
    let app = router(store());
    let (_, all): (_, PageResponse) = get_json(&app, "/api/dataframe/data").await;
    let last_name = all.data[0].name.split(' ').nth(1).unwrap().to_string();

    let uri = format!(
        "/api/dataframe/data?search={}&page_size=50",
        last_name.to_uppercase()
    );
    let (status, body): (_, PageResponse) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.data.iter().any(|e| e.id == all.data[0].id));
    let needle = last_name.to_lowercase();
    assert!(body.data.iter().all(|e| {
        e.name.to_lowercase().contains(&needle) || e.email.to_lowercase().contains(&needle)
    }));
}

#[tokio::test]
async fn sorts_descending_by_salary() {
    let app = router(store());
    let (_, body): (_, PageResponse) = get_json(
        &app,
        "/api/dataframe/data?sort_by=salary&sort_order=desc&page_size=50",
    )
    .await;
    let salaries: Vec<i64> = body.data.iter().map(|e| e.salary).collect();
    assert_eq!(salaries.len(), 50);
    assert!(salaries.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn unknown_sort_column_is_ignored() {
    let app = router(store());
    let (status, body): (_, PageResponse) =
        get_json(&app, "/api/dataframe/data?sort_by=shoe_size").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.data.len(), 10);
}

#[tokio::test]
async fn page_past_the_end_is_clamped() {
    let app = router(store());
    let (status, body): (_, PageResponse) =
        get_json(&app, "/api/dataframe/data?page=999&page_size=25").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.pagination.page, 4);
    assert_eq!(body.pagination.total_pages, 4);
    assert_eq!(body.data.len(), 25);
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    let app = router(store());
    for uri in [
        "/api/dataframe/data?page_size=3",
        "/api/dataframe/data?page_size=51",
        "/api/dataframe/data?page=0",
        "/api/dataframe/data?page=abc",
        "/api/dataframe/data?sort_order=up",
        "/api/plotting/line-data?days=5",
    ] {
        let (status, body): (_, ErrorResponse) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert!(!body.detail.is_empty(), "{uri}");
    }
}

#[tokio::test]
async fn stats_cover_the_whole_table() {
    let app = router(store());
    let (status, stats): (_, StatsResponse) = get_json(&app, "/api/dataframe/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats.total_employees, 100);
    assert!(stats.avg_salary > 0.0);
    assert!((1.0..=5.0).contains(&stats.avg_performance));
    let counted: i64 = stats.by_department.values().map(|d| d.count).sum();
    assert_eq!(counted, 100);
    assert_eq!(stats.by_position.values().sum::<i64>(), 100);
}

#[tokio::test]
async fn line_data_returns_requested_days() {
    let app = router(store());
    let (status, body): (_, LineResponse) =
        get_json(&app, "/api/plotting/line-data?days=30").await;
    assert_eq!(status, StatusCode::OK);
    let dates: BTreeSet<&str> = body.data.iter().map(|p| p.date.as_str()).collect();
    assert_eq!(dates.len(), 30);
    assert_eq!(body.companies.len(), 4);
    let range = body.date_range.unwrap();
    assert_eq!(range.start, "2025-06-01");
    assert_eq!(range.end, "2025-06-30");

    let company = body.companies[0].clone();
    let uri = format!("/api/plotting/line-data?days=7&company={}", company.replace(' ', "%20"));
    let (_, single): (_, LineResponse) = get_json(&app, &uri).await;
    assert_eq!(single.data.len(), 7);
    assert!(single.data.iter().all(|p| p.company == company));
}

#[tokio::test]
async fn bar_data_has_one_row_per_category() {
    let app = router(store());
    let (status, all): (_, BarResponse) = get_json(&app, "/api/plotting/bar-data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.data.len(), 6);
    assert_eq!(all.regions.len(), 4);
    let categories: Vec<&str> = all.data.iter().map(|c| c.category.as_str()).collect();
    let mut sorted = categories.clone();
    sorted.sort();
    assert_eq!(categories, sorted);

    let (_, north): (_, BarResponse) =
        get_json(&app, "/api/plotting/bar-data?region=North").await;
    assert_eq!(north.data.len(), 6);
    for (region, total) in north.data.iter().zip(all.data.iter()) {
        assert_eq!(region.category, total.category);
        assert!(region.sales < total.sales);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_endpoint_answers_on_worker_threads() {
    let app = router(store());
    let uris = [
        "/api/health",
        "/api/dataframe/data",
        "/api/dataframe/stats",
        "/api/plotting/line-data",
        "/api/plotting/bar-data",
        "/api/plotting/bar-data?region=North",
    ];
    let mut requests = Vec::new();
    for uri in uris.into_iter().cycle().take(uris.len() * 3) {
        let app = app.clone();
        requests.push(tokio::spawn(async move {
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            (uri, response.status())
        }));
    }
    for request in requests {
        let (uri, status) = request.await.unwrap();
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn default_bar_data_sums_all_regions() {
    let app = router(store());
    let (status, all): (_, BarResponse) = get_json(&app, "/api/plotting/bar-data").await;
    assert_eq!(status, StatusCode::OK);
    let mut summed = vec![0i64; all.data.len()];
    for region in &all.regions {
        let (_, part): (_, BarResponse) =
            get_json(&app, &format!("/api/plotting/bar-data?region={region}")).await;
        for (total, row) in summed.iter_mut().zip(&part.data) {
            *total += row.sales;
        }
    }
    let sales: Vec<i64> = all.data.iter().map(|c| c.sales).collect();
    assert_eq!(sales, summed);
}

#[tokio::test]
async fn unknown_company_keeps_the_date_range() {
    let app = router(store());
    let (status, body): (_, LineResponse) =
        get_json(&app, "/api/plotting/line-data?days=7&company=Nobody").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.data.is_empty());
    let range = body.date_range.unwrap();
    assert_eq!(range.start, "2025-06-24");
    assert_eq!(range.end, "2025-06-30");
}

#[tokio::test]
async fn client_reads_a_live_server() {
    let url = spawn_server(router(store())).await;
    let client = Arc::new(ApiClient::new(&url, Duration::from_secs(5)).unwrap());

    let mut holder = QueryStateHolder::new();
    holder.set_sort(SortColumn::Salary);
    holder.set_sort(SortColumn::Salary);
    holder.set_page(3);
    let page = client.fetch_page(holder.state().clone()).await.unwrap();
    assert_eq!(page.pagination.page, 3);
    assert_eq!(page.data.len(), 10);
    assert!(page.data.windows(2).all(|w| w[0].salary >= w[1].salary));

    let stats = client.fetch_stats().await.unwrap();
    assert_eq!(stats.total_employees, 100);

    let line = client.fetch_line_data(LineQuery::default()).await.unwrap();
    assert_eq!(line.data.len(), 90 * 4);
}

#[tokio::test]
async fn server_error_reads_failed_to_fetch_data() {
    let app = Router::new().route(
        DATA_PATH,
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let url = spawn_server(app).await;
    let client = ApiClient::new(&url, Duration::from_secs(5)).unwrap();
    let err = client
        .fetch_page(QueryStateHolder::new().state().clone())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch data");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let client = ApiClient::new(&url, Duration::from_secs(2)).unwrap();
    assert!(client.fetch_stats().await.is_err());
}
