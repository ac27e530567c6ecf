//! JSON payloads shared by the server and the client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DATA_PATH: &str = "/api/dataframe/data";
pub const STATS_PATH: &str = "/api/dataframe/stats";
pub const LINE_DATA_PATH: &str = "/api/plotting/line-data";
pub const BAR_DATA_PATH: &str = "/api/plotting/bar-data";
pub const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub salary: i64,
    pub hire_date: String,
    pub years_employed: i64,
    pub performance_rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Pagination for `total_items` rows, with `page` clamped into the available range.
    pub fn clamped(page: u32, page_size: u32, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(page_size.max(1) as u64) as u32;
        Self {
            page: page.clamp(1, total_pages.max(1)),
            page_size,
            total_items,
            total_pages,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub departments: Vec<String>,
    pub positions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    pub data: Vec<Employee>,
    pub pagination: Pagination,
    pub filters: FilterOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub count: i64,
    pub salary: f64,
    pub performance_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_employees: u64,
    pub avg_salary: f64,
    pub median_salary: f64,
    pub avg_years_employed: f64,
    pub avg_performance: f64,
    pub by_department: BTreeMap<String, DepartmentSummary>,
    pub by_position: BTreeMap<String, i64>,
}

/// The aggregate metrics the table view shows above the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_employees: u64,
    pub avg_salary: f64,
    pub avg_years_employed: f64,
    pub avg_performance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPoint {
    pub date: String,
    pub company: String,
    pub price: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineResponse {
    pub data: Vec<StockPoint>,
    pub companies: Vec<String>,
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySales {
    pub category: String,
    pub sales: i64,
    pub units: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarResponse {
    pub data: Vec<CategorySales>,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
