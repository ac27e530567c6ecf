//! Queries and data shaping for the plotting view.

use std::collections::BTreeMap;

use crate::api::{CategorySales, StockPoint};

pub const DAY_RANGES: [u32; 5] = [30, 60, 90, 180, 365];
pub const DEFAULT_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineQuery {
    pub company: Option<String>,
    pub days: u32,
}

impl Default for LineQuery {
    fn default() -> Self {
        Self {
            company: None,
            days: DEFAULT_DAYS,
        }
    }
}

impl LineQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(company) = &self.company {
            params.push(("company", company.clone()));
        }
        params.push(("days", self.days.to_string()));
        params
    }

    pub fn with_next_days(&self) -> Self {
        let idx = DAY_RANGES.iter().position(|d| *d == self.days).unwrap_or(0);
        Self {
            days: DAY_RANGES[(idx + 1) % DAY_RANGES.len()],
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarQuery {
    pub region: Option<String>,
}

impl BarQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        match &self.region {
            Some(region) => vec![("region", region.clone())],
            None => Vec::new(),
        }
    }
}

/// Step through `None`, then each option in order, then back to `None`.
pub fn cycle_option(current: Option<&str>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(value) => options
            .iter()
            .position(|o| o == value)
            .and_then(|idx| options.get(idx + 1))
            .cloned(),
    }
}

/// One line of the price chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub company: String,
    pub points: Vec<(f64, f64)>,
}

/// Prices per company over a shared date axis. The x value is the date's position
/// among all dates of the response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceChart {
    pub dates: Vec<String>,
    pub series: Vec<PriceSeries>,
    pub min_price: f64,
    pub max_price: f64,
}

impl PriceChart {
    pub fn from_points(points: &[StockPoint], companies: &[String]) -> Self {
        let mut by_date: BTreeMap<&str, Vec<&StockPoint>> = BTreeMap::new();
        for p in points {
            by_date.entry(p.date.as_str()).or_default().push(p);
        }
        let dates: Vec<String> = by_date.keys().map(|d| d.to_string()).collect();

        let mut series: Vec<PriceSeries> = companies
            .iter()
            .filter(|c| points.iter().any(|p| &p.company == *c))
            .map(|c| PriceSeries {
                company: c.clone(),
                points: Vec::new(),
            })
            .collect();

        let mut min_price = f64::MAX;
        let mut max_price = f64::MIN;
        for (x, day) in by_date.values().enumerate() {
            for p in day {
                if let Some(s) = series.iter_mut().find(|s| s.company == p.company) {
                    s.points.push((x as f64, p.price));
                    min_price = min_price.min(p.price);
                    max_price = max_price.max(p.price);
                }
            }
        }
        if series.iter().all(|s| s.points.is_empty()) {
            min_price = 0.0;
            max_price = 0.0;
        }

        Self {
            dates,
            series,
            min_price,
            max_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Bars of the sales chart, in thousands of dollars.
pub fn sales_bars(data: &[CategorySales]) -> Vec<(String, u64)> {
    data.iter()
        .map(|c| (c.category.clone(), (c.sales.max(0) as u64) / 1000))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, company: &str, price: f64) -> StockPoint {
        StockPoint {
            date: date.to_string(),
            company: company.to_string(),
            price,
            volume: 1,
        }
    }

    #[test]
    fn pivots_prices_by_date() {
        let companies = vec!["ACME Corp".to_string(), "TechGiant".to_string()];
        let points = vec![
            point("2024-01-02", "TechGiant", 251.0),
            point("2024-01-01", "ACME Corp", 100.0),
            point("2024-01-01", "TechGiant", 250.0),
            point("2024-01-02", "ACME Corp", 99.5),
        ];
        let chart = PriceChart::from_points(&points, &companies);
        assert_eq!(chart.dates, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(chart.series[0].company, "ACME Corp");
        assert_eq!(chart.series[0].points, vec![(0.0, 100.0), (1.0, 99.5)]);
        assert_eq!(chart.series[1].points, vec![(0.0, 250.0), (1.0, 251.0)]);
        assert_eq!(chart.min_price, 99.5);
        assert_eq!(chart.max_price, 251.0);
    }

    #[test]
    fn filtered_company_yields_single_series() {
        let companies = vec!["ACME Corp".to_string(), "TechGiant".to_string()];
        let points = vec![point("2024-01-01", "TechGiant", 250.0)];
        let chart = PriceChart::from_points(&points, &companies);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].company, "TechGiant");
    }

    #[test]
    fn cycling_wraps_back_to_all() {
        let options = vec!["North".to_string(), "South".to_string()];
        assert_eq!(cycle_option(None, &options), Some("North".to_string()));
        assert_eq!(cycle_option(Some("North"), &options), Some("South".to_string()));
        assert_eq!(cycle_option(Some("South"), &options), None);
        assert_eq!(cycle_option(None, &[]), None);
    }

    #[test]
    fn day_ranges_cycle() {
        let q = LineQuery::default();
        assert_eq!(q.with_next_days().days, 180);
        let q = LineQuery {
            days: 365,
            ..LineQuery::default()
        };
        assert_eq!(q.with_next_days().days, 30);
    }

    #[test]
    fn line_params_include_company_only_when_selected() {
        let q = LineQuery::default();
        assert_eq!(q.to_params(), vec![("days", "90".to_string())]);
        let q = LineQuery {
            company: Some("HealthPlus".to_string()),
            days: 30,
        };
        assert_eq!(
            q.to_params(),
            vec![("company", "HealthPlus".to_string()), ("days", "30".to_string())]
        );
    }
}
