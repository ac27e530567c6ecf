//! Deterministic sample tables served by the backend.

use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rayon::prelude::*;
use tracing::debug;

use crate::domain::DataAppError;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_EMPLOYEE_COUNT: usize = 100;
pub const STOCK_DAYS: usize = 365;

const FIRST_NAMES: [&str; 18] = [
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "William",
    "Elizabeth", "David", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
];
const LAST_NAMES: [&str; 12] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez",
];
pub const DEPARTMENTS: [&str; 6] = [
    "Engineering",
    "Sales",
    "Marketing",
    "HR",
    "Finance",
    "Operations",
];
pub const POSITIONS: [&str; 6] = [
    "Junior",
    "Mid-level",
    "Senior",
    "Lead",
    "Manager",
    "Director",
];
const POSITION_WEIGHTS: [f64; 6] = [0.2, 0.3, 0.25, 0.12, 0.08, 0.05];
const BASE_SALARIES: [f64; 6] = [50000.0, 70000.0, 90000.0, 110000.0, 130000.0, 160000.0];

pub const COMPANIES: [(&str, f64); 4] = [
    ("ACME Corp", 100.0),
    ("TechGiant", 250.0),
    ("GreenEnergy", 75.0),
    ("HealthPlus", 150.0),
];
pub const CATEGORIES: [&str; 6] = [
    "Electronics",
    "Clothing",
    "Food & Beverage",
    "Home & Garden",
    "Sports",
    "Books",
];
pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

fn distribution_error(e: impl std::fmt::Display) -> DataAppError {
    DataAppError::LoadingFailed(format!("invalid sample distribution: {e}"))
}

fn pick<'a>(rng: &mut StdRng, values: &[&'a str]) -> &'a str {
    values[rng.gen_range(0..values.len())]
}

/// Employee records with a salary driven by position and a hire date relative to `today`.
pub fn generate_employee_data(
    n_employees: usize,
    seed: u64,
    today: NaiveDate,
) -> Result<DataFrame, DataAppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions = WeightedIndex::new(POSITION_WEIGHTS).map_err(distribution_error)?;
    let tenure = Normal::new(5.0, 3.0).map_err(distribution_error)?;

    let mut ids = Vec::with_capacity(n_employees);
    let mut names = Vec::with_capacity(n_employees);
    let mut emails = Vec::with_capacity(n_employees);
    let mut departments = Vec::with_capacity(n_employees);
    let mut position_names = Vec::with_capacity(n_employees);
    let mut salaries = Vec::with_capacity(n_employees);
    let mut hire_dates = Vec::with_capacity(n_employees);
    let mut years_employed = Vec::with_capacity(n_employees);
    let mut ratings = Vec::with_capacity(n_employees);

    for i in 0..n_employees {
        let first = pick(&mut rng, &FIRST_NAMES);
        let last = pick(&mut rng, &LAST_NAMES);
        let department = pick(&mut rng, &DEPARTMENTS);
        let position_idx = positions.sample(&mut rng);

        let salary = (BASE_SALARIES[position_idx] * rng.gen_range(0.9..1.2)) as i64;
        let years = (tenure.sample(&mut rng) as i64).max(0);
        let rating = round_to(rng.gen_range(2.5..5.0), 1);
        let hire_date = today - Duration::days(years * 365 + rng.gen_range(0..365));

        ids.push(i as i64 + 1);
        names.push(format!("{first} {last}"));
        emails.push(format!(
            "{}.{}{i}@company.com",
            first.to_lowercase(),
            last.to_lowercase()
        ));
        departments.push(department.to_string());
        position_names.push(POSITIONS[position_idx].to_string());
        salaries.push(salary);
        hire_dates.push(hire_date.format("%Y-%m-%d").to_string());
        years_employed.push(years);
        ratings.push(rating);
    }

    let df = df!(
        "id" => ids,
        "name" => names,
        "email" => emails,
        "department" => departments,
        "position" => position_names,
        "salary" => salaries,
        "hire_date" => hire_dates,
        "years_employed" => years_employed,
        "performance_rating" => ratings,
    )?;
    debug!("Generated {} employees", df.height());
    Ok(df)
}

struct PriceWalk {
    prices: Vec<f64>,
    volumes: Vec<i64>,
}

fn price_walk(seed: u64, base_price: f64, days: usize) -> Result<PriceWalk, DataAppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let change = Normal::new(0.001, 0.02).map_err(distribution_error)?;
    let mut prices = Vec::with_capacity(days);
    let mut price = base_price;
    for day in 0..days {
        if day > 0 {
            price = (price * (1.0 + change.sample(&mut rng))).max(1.0);
        }
        prices.push(price);
    }
    let volumes = (0..days)
        .map(|_| rng.gen_range(100_000.0..1_000_000.0) as i64)
        .collect();
    Ok(PriceWalk { prices, volumes })
}

/// Daily prices for each company over the `days` days ending at `today`.
pub fn generate_stock_data(
    days: usize,
    seed: u64,
    today: NaiveDate,
) -> Result<DataFrame, DataAppError> {
    // Every company walks with its own generator, so the walks can be built in parallel.
    let walks: Vec<PriceWalk> = COMPANIES
        .par_iter()
        .enumerate()
        .map(|(idx, (_, base_price))| price_walk(seed + idx as u64, *base_price, days))
        .collect::<Result<_, _>>()?;

    let dates: Vec<String> = (0..days)
        .map(|d| {
            (today - Duration::days((days - 1 - d) as i64))
                .format("%Y-%m-%d")
                .to_string()
        })
        .collect();

    let n = COMPANIES.len() * days;
    let mut date_col = Vec::with_capacity(n);
    let mut company_col = Vec::with_capacity(n);
    let mut price_col = Vec::with_capacity(n);
    let mut volume_col = Vec::with_capacity(n);
    for ((company, _), walk) in COMPANIES.iter().zip(walks) {
        for (day, date) in dates.iter().enumerate() {
            date_col.push(date.clone());
            company_col.push(company.to_string());
            price_col.push(round_to(walk.prices[day], 2));
            volume_col.push(walk.volumes[day]);
        }
    }

    let df = df!(
        "date" => date_col,
        "company" => company_col,
        "price" => price_col,
        "volume" => volume_col,
    )?;
    Ok(df)
}

/// Sales and units for each category in each region.
pub fn generate_sales_data(seed: u64) -> Result<DataFrame, DataAppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = CATEGORIES.len() * REGIONS.len();
    let mut category_col = Vec::with_capacity(n);
    let mut region_col = Vec::with_capacity(n);
    let mut sales_col = Vec::with_capacity(n);
    let mut units_col = Vec::with_capacity(n);
    let mut avg_price_col = Vec::with_capacity(n);

    for category in CATEGORIES {
        for region in REGIONS {
            let sales = rng.gen_range(50_000.0..500_000.0) as i64;
            let units = rng.gen_range(1_000.0..10_000.0) as i64;
            category_col.push(category.to_string());
            region_col.push(region.to_string());
            sales_col.push(sales);
            units_col.push(units);
            avg_price_col.push(round_to(sales as f64 / units as f64, 2));
        }
    }

    let df = df!(
        "category" => category_col,
        "region" => region_col,
        "sales" => sales_col,
        "units" => units_col,
        "avg_price" => avg_price_col,
    )?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn employees_are_deterministic_for_a_seed() {
        let a = generate_employee_data(20, 7, today()).unwrap();
        let b = generate_employee_data(20, 7, today()).unwrap();
        assert!(a.equals(&b));
        assert_eq!(a.height(), 20);
        assert_eq!(a.width(), 9);
    }

    #[test]
    fn employee_values_stay_in_range() {
        let df = generate_employee_data(200, DEFAULT_SEED, today()).unwrap();
        let salaries = df.column("salary").unwrap().i64().unwrap();
        assert!(salaries.into_iter().flatten().all(|s| (45_000..=192_000).contains(&s)));
        let ratings = df.column("performance_rating").unwrap().f64().unwrap();
        assert!(ratings.into_iter().flatten().all(|r| (2.5..=5.0).contains(&r)));
        let years = df.column("years_employed").unwrap().i64().unwrap();
        assert!(years.into_iter().flatten().all(|y| y >= 0));
        let ids = df.column("id").unwrap().i64().unwrap();
        assert_eq!(ids.get(0), Some(1));
        assert_eq!(ids.get(199), Some(200));
    }

    #[test]
    fn stocks_cover_every_company_and_day() {
        let df = generate_stock_data(30, DEFAULT_SEED, today()).unwrap();
        assert_eq!(df.height(), COMPANIES.len() * 30);
        let dates = df.column("date").unwrap().str().unwrap();
        assert_eq!(dates.get(0), Some("2025-06-01"));
        assert_eq!(dates.get(29), Some("2025-06-30"));
        let prices = df.column("price").unwrap().f64().unwrap();
        assert_eq!(prices.get(0), Some(100.0));
        assert!(prices.into_iter().flatten().all(|p| p >= 1.0));
    }

    #[test]
    fn sales_cover_every_category_and_region() {
        let df = generate_sales_data(DEFAULT_SEED).unwrap();
        assert_eq!(df.height(), CATEGORIES.len() * REGIONS.len());
        let sales = df.column("sales").unwrap().i64().unwrap();
        assert!(sales.into_iter().flatten().all(|s| (50_000..500_000).contains(&s)));
    }
}
