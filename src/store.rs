//! In-memory tables behind the HTTP api.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::api::{
    BarResponse, CategorySales, DateRange, DepartmentSummary, Employee, FilterOptions,
    LineResponse, PageResponse, Pagination, StatsResponse, StockPoint,
};
use crate::domain::DataAppError;
use crate::query::SortOrder;
use crate::sample_data::{
    STOCK_DAYS, generate_employee_data, generate_sales_data, generate_stock_data,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

fn detect_file_type(path: &Path) -> Result<FileType, DataAppError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(DataAppError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, DataAppError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataAppError::FileNotFound,
        ErrorKind::PermissionDenied => DataAppError::PermissionDenied,
        _ => DataAppError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DataAppError::LoadingFailed("Not a file!".into()));
    }
    let file_type = detect_file_type(&path)?;
    Ok(FileInfo {
        path,
        file_size: metadata.len(),
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

/// Read a csv, parquet or arrow file into memory.
pub fn load_frame(path: PathBuf) -> Result<DataFrame, DataAppError> {
    let file_info = get_file_info(path)?;
    debug!(
        "Loading {:?} ({} bytes) as {:?}",
        file_info.path, file_info.file_size, file_info.file_type
    );
    let start_time = Instant::now();
    let frame = match file_info.file_type {
        FileType::Csv => load_csv(&file_info.path)?,
        FileType::Parquet => load_parquet(&file_info.path)?,
        FileType::Arrow => load_arrow(&file_info.path)?,
    };
    let df = frame.collect()?;
    info!(
        "Loaded {} rows from {:?} in {}ms",
        df.height(),
        file_info.path,
        start_time.elapsed().as_millis()
    );
    Ok(df)
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Distinct non-null values of a string column in order of first appearance.
fn unique_strings(df: &DataFrame, column: &str) -> PolarsResult<Vec<String>> {
    let values = df.column(column)?.str()?;
    let mut seen: Vec<String> = Vec::new();
    for value in values.into_iter().flatten() {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    Ok(seen)
}

fn employee_schema() -> [(&'static str, DataType); 9] {
    [
        ("id", DataType::Int64),
        ("name", DataType::String),
        ("email", DataType::String),
        ("department", DataType::String),
        ("position", DataType::String),
        ("salary", DataType::Int64),
        ("hire_date", DataType::String),
        ("years_employed", DataType::Int64),
        ("performance_rating", DataType::Float64),
    ]
}

/// Server side parameters of one page request, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub department: Option<String>,
    pub search: Option<String>,
}

impl Default for EmployeeQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            sort_by: None,
            sort_order: SortOrder::Asc,
            department: None,
            search: None,
        }
    }
}

pub struct EmployeeTable {
    frame: DataFrame,
    filters: FilterOptions,
}

impl EmployeeTable {
    /// Select and cast the employee columns. Fails if one is missing.
    pub fn new(frame: DataFrame) -> Result<Self, DataAppError> {
        let columns = employee_schema()
            .iter()
            .map(|(name, dtype)| {
                frame
                    .column(name)
                    .map_err(|_| DataAppError::LoadingFailed(format!("missing column '{name}'")))?
                    .cast(dtype)
                    .map_err(DataAppError::from)
            })
            .collect::<Result<Vec<Column>, DataAppError>>()?;
        let frame = DataFrame::new(columns)?;
        let filters = FilterOptions {
            departments: unique_strings(&frame, "department")?,
            positions: unique_strings(&frame, "position")?,
        };
        Ok(Self { frame, filters })
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn filters(&self) -> &FilterOptions {
        &self.filters
    }

    fn filtered(&self, query: &EmployeeQuery) -> PolarsResult<DataFrame> {
        let mut df = self.frame.clone();
        if let Some(department) = &query.department {
            let mask = df.column("department")?.str()?.equal(department.as_str());
            df = df.filter(&mask)?;
        }
        if let Some(term) = &query.search {
            let term = term.to_lowercase();
            let mask: BooleanChunked = {
                let names = df.column("name")?.str()?;
                let emails = df.column("email")?.str()?;
                let matches = |v: Option<&str>| v.is_some_and(|v| v.to_lowercase().contains(&term));
                names
                    .into_iter()
                    .zip(emails)
                    .map(|(name, email)| matches(name) || matches(email))
                    .collect()
            };
            df = df.filter(&mask)?;
        }
        if let Some(sort_by) = &query.sort_by {
            if df.column(sort_by).is_ok() {
                df = df.sort(
                    [sort_by.as_str()],
                    SortMultipleOptions::default()
                        .with_order_descending(query.sort_order == SortOrder::Desc)
                        .with_maintain_order(true),
                )?;
            } else {
                debug!("Ignoring sort by unknown column '{sort_by}'");
            }
        }
        Ok(df)
    }

    pub fn query_page(&self, query: &EmployeeQuery) -> Result<PageResponse, DataAppError> {
        let df = self.filtered(query)?;
        let pagination = Pagination::clamped(query.page, query.page_size, df.height() as u64);
        let page = df.slice(pagination.offset() as i64, query.page_size as usize);
        log_clamped_page(query, &pagination);
        Ok(PageResponse {
            data: employees(&page)?,
            pagination,
            filters: self.filters.clone(),
        })
    }

    pub fn stats(&self) -> Result<StatsResponse, DataAppError> {
        let mean = |name: &str| -> PolarsResult<f64> {
            Ok(self
                .frame
                .column(name)?
                .as_materialized_series()
                .mean()
                .unwrap_or(0.0))
        };
        let median_salary = self
            .frame
            .column("salary")?
            .as_materialized_series()
            .median()
            .unwrap_or(0.0);

        let departments = self
            .frame
            .clone()
            .lazy()
            .group_by([col("department")])
            .agg([
                col("id").count().cast(DataType::Int64).alias("count"),
                col("salary").mean().alias("salary"),
                col("performance_rating").mean().alias("performance_rating"),
            ])
            .collect()?;
        let mut by_department = BTreeMap::new();
        {
            let names = departments.column("department")?.str()?;
            let counts = departments.column("count")?.i64()?;
            let salaries = departments.column("salary")?.f64()?;
            let ratings = departments.column("performance_rating")?.f64()?;
            for i in 0..departments.height() {
                if let Some(name) = names.get(i) {
                    by_department.insert(
                        name.to_string(),
                        DepartmentSummary {
                            count: counts.get(i).unwrap_or(0),
                            salary: round_to(salaries.get(i).unwrap_or(0.0), 2),
                            performance_rating: round_to(ratings.get(i).unwrap_or(0.0), 2),
                        },
                    );
                }
            }
        }

        let positions = self
            .frame
            .clone()
            .lazy()
            .group_by([col("position")])
            .agg([col("id").count().cast(DataType::Int64).alias("count")])
            .collect()?;
        let mut by_position = BTreeMap::new();
        {
            let names = positions.column("position")?.str()?;
            let counts = positions.column("count")?.i64()?;
            for (name, count) in names.into_iter().zip(counts) {
                if let Some(name) = name {
                    by_position.insert(name.to_string(), count.unwrap_or(0));
                }
            }
        }

        Ok(StatsResponse {
            total_employees: self.len() as u64,
            avg_salary: round_to(mean("salary")?, 2),
            median_salary: round_to(median_salary, 2),
            avg_years_employed: round_to(mean("years_employed")?, 1),
            avg_performance: round_to(mean("performance_rating")?, 2),
            by_department,
            by_position,
        })
    }
}

fn log_clamped_page(query: &EmployeeQuery, pagination: &Pagination) {
    if pagination.page != query.page {
        debug!(
            "Page {} clamped to {} of {}",
            query.page, pagination.page, pagination.total_pages
        );
    }
}

fn employees(df: &DataFrame) -> PolarsResult<Vec<Employee>> {
    let id = df.column("id")?.i64()?;
    let name = df.column("name")?.str()?;
    let email = df.column("email")?.str()?;
    let department = df.column("department")?.str()?;
    let position = df.column("position")?.str()?;
    let salary = df.column("salary")?.i64()?;
    let hire_date = df.column("hire_date")?.str()?;
    let years_employed = df.column("years_employed")?.i64()?;
    let rating = df.column("performance_rating")?.f64()?;

    let text = |v: Option<&str>| v.unwrap_or_default().to_string();
    Ok((0..df.height())
        .map(|i| Employee {
            id: id.get(i).unwrap_or_default(),
            name: text(name.get(i)),
            email: text(email.get(i)),
            department: text(department.get(i)),
            position: text(position.get(i)),
            salary: salary.get(i).unwrap_or_default(),
            hire_date: text(hire_date.get(i)),
            years_employed: years_employed.get(i).unwrap_or_default(),
            performance_rating: rating.get(i).unwrap_or_default(),
        })
        .collect())
}

pub struct StockTable {
    frame: DataFrame,
    companies: Vec<String>,
}

impl StockTable {
    pub fn new(frame: DataFrame) -> Result<Self, DataAppError> {
        let companies = unique_strings(&frame, "company")?;
        Ok(Self { frame, companies })
    }

    /// Prices of the `days` most recent dates, optionally for one company.
    pub fn line_data(
        &self,
        company: Option<&str>,
        days: usize,
    ) -> Result<LineResponse, DataAppError> {
        let dates = self.frame.column("date")?.str()?;
        let distinct: BTreeSet<&str> = dates.into_iter().flatten().collect();
        let recent: Vec<&str> = distinct.iter().rev().take(days).copied().collect();
        let cutoff = recent.last().copied();
        let date_range = match (recent.last(), recent.first()) {
            (Some(start), Some(end)) => Some(DateRange {
                start: start.to_string(),
                end: end.to_string(),
            }),
            _ => None,
        };

        let mut mask: BooleanChunked = dates
            .into_iter()
            .map(|d| match (d, cutoff) {
                (Some(d), Some(cutoff)) => d >= cutoff,
                _ => false,
            })
            .collect();
        if let Some(company) = company {
            mask = &mask & &self.frame.column("company")?.str()?.equal(company);
        }
        let df = self.frame.filter(&mask)?;

        let data = stock_points(&df)?;
        Ok(LineResponse {
            data,
            companies: self.companies.clone(),
            date_range,
        })
    }
}

fn stock_points(df: &DataFrame) -> PolarsResult<Vec<StockPoint>> {
    let date = df.column("date")?.str()?;
    let company = df.column("company")?.str()?;
    let price = df.column("price")?.f64()?;
    let volume = df.column("volume")?.i64()?;
    Ok((0..df.height())
        .map(|i| StockPoint {
            date: date.get(i).unwrap_or_default().to_string(),
            company: company.get(i).unwrap_or_default().to_string(),
            price: price.get(i).unwrap_or_default(),
            volume: volume.get(i).unwrap_or_default(),
        })
        .collect())
}

pub struct SalesTable {
    frame: DataFrame,
    regions: Vec<String>,
}

impl SalesTable {
    pub fn new(frame: DataFrame) -> Result<Self, DataAppError> {
        let regions = unique_strings(&frame, "region")?;
        Ok(Self { frame, regions })
    }

    /// Sales and units per category, summed over all regions or the given one.
    pub fn bar_data(&self, region: Option<&str>) -> Result<BarResponse, DataAppError> {
        let categories = self.frame.column("category")?.str()?;
        let regions = self.frame.column("region")?.str()?;
        let sales = self.frame.column("sales")?.i64()?;
        let units = self.frame.column("units")?.i64()?;

        let mut totals: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        for i in 0..self.frame.height() {
            let (Some(category), Some(row_region)) = (categories.get(i), regions.get(i)) else {
                continue;
            };
            if region.is_some_and(|r| r != row_region) {
                continue;
            }
            let total = totals.entry(category).or_default();
            total.0 += sales.get(i).unwrap_or_default();
            total.1 += units.get(i).unwrap_or_default();
        }
        let data = totals
            .into_iter()
            .map(|(category, (sales, units))| CategorySales {
                category: category.to_string(),
                sales,
                units,
            })
            .collect();
        Ok(BarResponse {
            data,
            regions: self.regions.clone(),
        })
    }
}

/// Everything the server answers from.
pub struct DataStore {
    pub employees: EmployeeTable,
    pub stocks: StockTable,
    pub sales: SalesTable,
}

impl DataStore {
    pub fn new(
        employees: DataFrame,
        stocks: DataFrame,
        sales: DataFrame,
    ) -> Result<Self, DataAppError> {
        Ok(Self {
            employees: EmployeeTable::new(employees)?,
            stocks: StockTable::new(stocks)?,
            sales: SalesTable::new(sales)?,
        })
    }

    /// Generated tables, with employees read from `employees` when given.
    pub fn build(
        employees: Option<PathBuf>,
        employee_count: usize,
        seed: u64,
        today: NaiveDate,
    ) -> Result<Self, DataAppError> {
        let employee_frame = match employees {
            Some(path) => load_frame(path)?,
            None => generate_employee_data(employee_count, seed, today)?,
        };
        let store = Self::new(
            employee_frame,
            generate_stock_data(STOCK_DAYS, seed, today)?,
            generate_sales_data(seed)?,
        )?;
        info!(
            "Data store ready with {} employees, {} companies, {} regions",
            store.employees.len(),
            store.stocks.companies.len(),
            store.sales.regions.len()
        );
        if store.employees.is_empty() {
            warn!("Employee table is empty, every page will have no rows");
        }
        Ok(store)
    }
}
