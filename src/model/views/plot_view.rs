use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::ViewStatus;
use crate::api::{BarResponse, DateRange, LineResponse};
use crate::charts::{BarQuery, LineQuery, PriceChart, cycle_option, sales_bars};
use crate::client::{DataSource, bar_fetch, line_fetch};
use crate::domain::Message;
use crate::fetcher::{Fetcher, Outcome, Publisher};

/// State of the mounted Plotting Demo view: stock prices and sales per category.
pub struct PlotView {
    line_query: LineQuery,
    bar_query: BarQuery,
    line_publisher: Publisher<LineQuery>,
    bar_publisher: Publisher<BarQuery>,
    line_fetcher: Fetcher<LineQuery, LineResponse>,
    bar_fetcher: Fetcher<BarQuery, BarResponse>,
    line_loaded: bool,
    line_error: Option<String>,
    bar_error: Option<String>,
    chart: PriceChart,
    companies: Vec<String>,
    date_range: Option<DateRange>,
    bars: Vec<(String, u64)>,
    regions: Vec<String>,
}

impl PlotView {
    pub fn mount(source: Arc<dyn DataSource>) -> Self {
        let line_query = LineQuery::default();
        let bar_query = BarQuery::default();
        let line_publisher = Publisher::new(line_query.clone());
        let bar_publisher = Publisher::new(bar_query.clone());
        let line_fetcher = Fetcher::spawn(
            "line",
            line_publisher.subscribe(),
            line_fetch(source.clone()),
            Duration::ZERO,
        );
        let bar_fetcher = Fetcher::spawn(
            "bar",
            bar_publisher.subscribe(),
            bar_fetch(source),
            Duration::ZERO,
        );
        debug!("Mounted plot view");

        Self {
            line_query,
            bar_query,
            line_publisher,
            bar_publisher,
            line_fetcher,
            bar_fetcher,
            line_loaded: false,
            line_error: None,
            bar_error: None,
            chart: PriceChart::default(),
            companies: Vec::new(),
            date_range: None,
            bars: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn status(&self) -> ViewStatus {
        match (&self.line_error, &self.bar_error) {
            (Some(e), _) | (None, Some(e)) => ViewStatus::Error(e.clone()),
            (None, None) if self.line_loaded => ViewStatus::Ready,
            (None, None) => ViewStatus::Loading,
        }
    }

    pub fn line_query(&self) -> &LineQuery {
        &self.line_query
    }

    pub fn bar_query(&self) -> &BarQuery {
        &self.bar_query
    }

    pub fn chart(&self) -> &PriceChart {
        &self.chart
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    pub fn bars(&self) -> &[(String, u64)] {
        &self.bars
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::CycleCompany => {
                self.line_query.company =
                    cycle_option(self.line_query.company.as_deref(), &self.companies);
                self.line_publisher.publish(&self.line_query);
            }
            Message::CycleDays => {
                self.line_query = self.line_query.with_next_days();
                self.line_publisher.publish(&self.line_query);
            }
            Message::CycleRegion => {
                self.bar_query.region =
                    cycle_option(self.bar_query.region.as_deref(), &self.regions);
                self.bar_publisher.publish(&self.bar_query);
            }
            _ => {}
        }
    }

    pub fn poll(&mut self) {
        while let Some(outcome) = self.line_fetcher.try_next() {
            self.apply_line(outcome);
        }
        while let Some(outcome) = self.bar_fetcher.try_next() {
            self.apply_bar(outcome);
        }
    }

    fn apply_line(&mut self, outcome: Outcome<LineQuery, LineResponse>) {
        if !self.line_publisher.is_current(outcome.seq) {
            debug!("Discarding stale line data #{}", outcome.seq);
            return;
        }
        match outcome.result {
            Ok(response) => {
                self.chart = PriceChart::from_points(&response.data, &response.companies);
                self.companies = response.companies;
                self.date_range = response.date_range;
                self.line_loaded = true;
                self.line_error = None;
            }
            Err(e) => {
                warn!("Fetching line data failed: {e}");
                self.line_error = Some(e.to_string());
            }
        }
    }

    fn apply_bar(&mut self, outcome: Outcome<BarQuery, BarResponse>) {
        if !self.bar_publisher.is_current(outcome.seq) {
            debug!("Discarding stale bar data #{}", outcome.seq);
            return;
        }
        match outcome.result {
            Ok(response) => {
                self.bars = sales_bars(&response.data);
                self.regions = response.regions;
                self.bar_error = None;
            }
            Err(e) => {
                warn!("Fetching bar data failed: {e}");
                self.bar_error = Some(e.to_string());
            }
        }
    }
}
