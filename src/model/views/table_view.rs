use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::event::KeyEvent;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, trace, warn};

use super::ViewStatus;
use crate::api::{FilterOptions, PageResponse, Pagination, Stats};
use crate::charts::cycle_option;
use crate::client::{DataSource, FetchError, page_fetch};
use crate::domain::{Message, ViewerConfig};
use crate::fetcher::{Fetcher, Outcome, Publisher};
use crate::inputter::Inputter;
use crate::query::{QueryState, QueryStateHolder};
use crate::table::{COLUMNS, PaginationControls, TableColumn};

/// State of the mounted DataFrame Demo view.
///
/// The holder owns the query state. Every change is published, the fetcher turns it into one
/// request, and `poll` applies the response if it still belongs to the latest state.
pub struct TableView {
    holder: QueryStateHolder,
    publisher: Publisher<QueryState>,
    fetcher: Fetcher<QueryState, PageResponse>,
    stats_rx: Option<oneshot::Receiver<Result<Stats, FetchError>>>,
    status: ViewStatus,
    page: Option<PageResponse>,
    filters: FilterOptions,
    stats: Option<Stats>,
    selected_column: usize,
    input: Inputter,
    searching: bool,
}

impl TableView {
    /// Create the default query state, start fetching its page and the statistics.
    pub fn mount(source: Arc<dyn DataSource>, config: &ViewerConfig) -> Self {
        let holder = QueryStateHolder::new();
        let publisher = Publisher::new(holder.state().clone());
        let fetcher = Fetcher::spawn(
            "table",
            publisher.subscribe(),
            page_fetch(source.clone()),
            Duration::from_millis(config.search_debounce_ms),
        );

        let (tx, stats_rx) = oneshot::channel();
        let request = source.fetch_stats();
        tokio::spawn(async move {
            let _ = tx.send(request.await);
        });
        debug!("Mounted table view");

        Self {
            holder,
            publisher,
            fetcher,
            stats_rx: Some(stats_rx),
            status: ViewStatus::Loading,
            page: None,
            filters: FilterOptions::default(),
            stats: None,
            selected_column: 0,
            input: Inputter::default(),
            searching: false,
        }
    }

    pub fn state(&self) -> &QueryState {
        self.holder.state()
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn page(&self) -> Option<&PageResponse> {
        self.page.as_ref()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.page.as_ref().map(|p| p.pagination)
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    pub fn filters(&self) -> &FilterOptions {
        &self.filters
    }

    pub fn selected_column(&self) -> &TableColumn {
        &COLUMNS[self.selected_column]
    }

    pub fn searching(&self) -> bool {
        self.searching
    }

    /// Text of the search box, including uncommitted edits.
    pub fn search_text(&self) -> String {
        if self.searching {
            self.input.get().input
        } else {
            self.holder.state().search.clone().unwrap_or_default()
        }
    }

    /// Cursor position in the search box while it is focused.
    pub fn search_cursor(&self) -> Option<usize> {
        self.searching.then(|| self.input.get().cursor_pos)
    }

    fn total_pages(&self) -> u32 {
        self.pagination().map(|p| p.total_pages).unwrap_or(0)
    }

    pub fn controls(&self) -> PaginationControls {
        PaginationControls::new(self.holder.state().page, self.total_pages())
    }

    pub fn update(&mut self, message: Message) {
        let controls = self.controls();
        let page = self.holder.state().page;
        match message {
            Message::SelectColumnLeft => {
                self.selected_column = self.selected_column.saturating_sub(1);
            }
            Message::SelectColumnRight => {
                self.selected_column = (self.selected_column + 1).min(COLUMNS.len() - 1);
            }
            Message::Sort => {
                self.holder.set_sort(COLUMNS[self.selected_column].sort);
                self.publish();
            }
            Message::FirstPage if controls.first => self.go_to_page(1),
            Message::PreviousPage if controls.previous => self.go_to_page(page - 1),
            Message::NextPage if controls.next => self.go_to_page(page + 1),
            Message::LastPage if controls.last => self.go_to_page(self.total_pages()),
            Message::CycleDepartment => {
                let next = cycle_option(
                    self.holder.state().department.as_deref(),
                    &self.filters.departments,
                );
                self.holder.set_department_filter(next.as_deref());
                self.publish();
            }
            Message::CyclePageSize => {
                let next = self.holder.state().page_size.next();
                self.holder.set_page_size(next);
                self.publish();
            }
            Message::Search => {
                let current = self.search_text();
                self.input.set(&current);
                self.searching = true;
            }
            Message::RawKey(key) => self.search_key(key),
            _ => {}
        }
    }

    fn go_to_page(&mut self, page: u32) {
        self.holder.set_page(page);
        self.publish();
    }

    fn search_key(&mut self, key: KeyEvent) {
        let result = self.input.read(key);
        if result.changed {
            self.holder.set_search_term(Some(result.input.as_str()));
            self.publish();
        }
        if result.finished {
            self.searching = false;
        }
    }

    fn publish(&mut self) {
        if self.publisher.publish(self.holder.state()) {
            trace!("Published {:?}", self.holder.state());
        }
    }

    /// Apply everything the background requests delivered since the last frame.
    pub fn poll(&mut self) {
        while let Some(outcome) = self.fetcher.try_next() {
            self.apply_page(outcome);
        }
        if let Some(rx) = &mut self.stats_rx {
            match rx.try_recv() {
                Ok(result) => {
                    self.stats_rx = None;
                    self.apply_stats(result);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Closed) => self.stats_rx = None,
            }
        }
    }

    fn apply_page(&mut self, outcome: Outcome<QueryState, PageResponse>) {
        if !self.publisher.is_current(outcome.seq) {
            debug!(
                "Discarding stale response #{} for {:?}",
                outcome.seq, outcome.query
            );
            return;
        }
        match outcome.result {
            Ok(response) => {
                let p = response.pagination;
                if p.page != self.holder.state().page {
                    debug!("Server moved page {} to {}", self.holder.state().page, p.page);
                }
                self.holder.adopt_pagination(p.page, p.page_size);
                self.publisher.adopt(self.holder.state());
                self.filters = response.filters.clone();
                self.page = Some(response);
                self.status = ViewStatus::Ready;
            }
            Err(e) => {
                warn!("Fetching page failed: {e}");
                self.page = None;
                self.status = ViewStatus::Error(e.to_string());
            }
        }
    }

    fn apply_stats(&mut self, result: Result<Stats, FetchError>) {
        match result {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => warn!("Failed to fetch stats: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeSource;
    use crate::query::{PageSize, SortColumn, SortOrder};
    use ratatui::crossterm::event::KeyCode;

    async fn mounted(source: FakeSource) -> (TableView, Arc<FakeSource>) {
        let source = Arc::new(source);
        let mut view = TableView::mount(source.clone(), &ViewerConfig::default());
        settle(&mut view).await;
        (view, source)
    }

    /// Wait for the response to the latest published state and the statistics.
    async fn settle(view: &mut TableView) {
        loop {
            let outcome = view.fetcher.next().await.unwrap();
            let current = view.publisher.is_current(outcome.seq);
            view.apply_page(outcome);
            if current {
                break;
            }
        }
        if let Some(rx) = view.stats_rx.take() {
            view.apply_stats(rx.await.unwrap());
        }
    }

    fn outcome(
        seq: u64,
        query: QueryState,
        result: Result<PageResponse, FetchError>,
    ) -> Outcome<QueryState, PageResponse> {
        Outcome { seq, query, result }
    }

    #[tokio::test]
    async fn mount_loads_first_page_and_stats() {
        let (view, source) = mounted(FakeSource::new(237)).await;
        assert_eq!(view.status(), &ViewStatus::Ready);
        let page = view.page().unwrap();
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.pagination.total_pages, 24);
        assert_eq!(view.stats().unwrap().total_employees, 500);
        assert_eq!(view.filters().departments.len(), 2);
        assert_eq!(source.requests(), vec![QueryState::default()]);
    }

    #[tokio::test]
    async fn paging_follows_enabled_controls() {
        let (mut view, source) = mounted(FakeSource::new(237)).await;
        view.update(Message::PreviousPage);
        view.update(Message::FirstPage);
        assert_eq!(source.requests().len(), 1);

        view.update(Message::LastPage);
        settle(&mut view).await;
        assert_eq!(view.state().page, 24);
        assert_eq!(view.page().unwrap().data.len(), 7);
        let controls = view.controls();
        assert!(!controls.next && !controls.last);

        view.update(Message::NextPage);
        assert_eq!(source.requests().len(), 2);
        view.update(Message::PreviousPage);
        settle(&mut view).await;
        assert_eq!(view.state().page, 23);
    }

    #[tokio::test]
    async fn sorting_selected_column_toggles_and_resets_page() {
        let (mut view, source) = mounted(FakeSource::new(237)).await;
        view.update(Message::NextPage);
        settle(&mut view).await;
        for _ in 0..4 {
            view.update(Message::SelectColumnRight);
        }
        assert_eq!(view.selected_column().title, "Salary");
        view.update(Message::Sort);
        view.update(Message::Sort);
        settle(&mut view).await;
        let last = source.requests().pop().unwrap();
        assert_eq!(last.sort_column, Some(SortColumn::Salary));
        assert_eq!(last.sort_order, SortOrder::Desc);
        assert_eq!(last.page, 1);
    }

    #[tokio::test]
    async fn search_without_matches_disables_paging() {
        let (mut view, _source) = mounted(FakeSource::new(237)).await;
        view.update(Message::Search);
        for c in "Jane".chars() {
            view.update(Message::RawKey(KeyEvent::from(KeyCode::Char(c))));
        }
        view.update(Message::RawKey(KeyEvent::from(KeyCode::Enter)));
        settle(&mut view).await;

        assert!(!view.searching());
        assert_eq!(view.search_text(), "Jane");
        let page = view.page().unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_items, 0);
        assert_eq!(page.pagination.total_pages, 0);
        let controls = view.controls();
        assert!(!controls.next && !controls.last);
    }

    #[tokio::test]
    async fn search_box_tracks_the_cursor() {
        let (mut view, _source) = mounted(FakeSource::new(30)).await;
        assert_eq!(view.search_cursor(), None);
        view.update(Message::Search);
        for c in "Jne".chars() {
            view.update(Message::RawKey(KeyEvent::from(KeyCode::Char(c))));
        }
        view.update(Message::RawKey(KeyEvent::from(KeyCode::Home)));
        view.update(Message::RawKey(KeyEvent::from(KeyCode::Right)));
        assert_eq!(view.search_cursor(), Some(1));
        view.update(Message::RawKey(KeyEvent::from(KeyCode::Char('a'))));
        assert_eq!(view.search_text(), "Jane");
        assert_eq!(view.search_cursor(), Some(2));
    }

    #[tokio::test]
    async fn escape_clears_the_search() {
        let (mut view, source) = mounted(FakeSource::new(30)).await;
        view.update(Message::Search);
        view.update(Message::RawKey(KeyEvent::from(KeyCode::Char('x'))));
        view.update(Message::RawKey(KeyEvent::from(KeyCode::Esc)));
        settle(&mut view).await;
        assert!(!view.searching());
        assert_eq!(view.state().search, None);
        assert_eq!(source.requests().last().unwrap(), &QueryState::default());
    }

    #[tokio::test]
    async fn department_and_page_size_cycle() {
        let (mut view, source) = mounted(FakeSource::new(237)).await;
        view.update(Message::CycleDepartment);
        view.update(Message::CyclePageSize);
        settle(&mut view).await;
        let last = source.requests().pop().unwrap();
        assert_eq!(last.department.as_deref(), Some("Engineering"));
        assert_eq!(last.page_size, PageSize::TwentyFive);
    }

    #[tokio::test]
    async fn server_clamped_page_is_adopted_without_refetch() {
        let (mut view, source) = mounted(FakeSource::new(237)).await;
        let query = view.state().with_page(40);
        view.holder.set_page(40);
        view.publish();
        let seq = view.publisher.current().seq;
        let mut response = source.page_for(&query);
        response.pagination = Pagination::clamped(40, 10, 237);
        view.apply_page(outcome(seq, query, Ok(response)));

        assert_eq!(view.state().page, 24);
        assert!(view.publisher.is_current(seq));
        assert_eq!(view.publisher.current().query.page, 24);
    }

    #[tokio::test]
    async fn only_the_latest_response_is_shown() {
        let (mut view, source) = mounted(FakeSource::new(237)).await;
        let older = view.state().with_page(2);
        view.holder.set_page(2);
        view.publish();
        let older_seq = view.publisher.current().seq;
        let newer = view.state().with_page(3);
        view.holder.set_page(3);
        view.publish();
        let newer_seq = view.publisher.current().seq;

        // Newer first, then the older one arrives late.
        view.apply_page(outcome(newer_seq, newer.clone(), Ok(source.page_for(&newer))));
        view.apply_page(outcome(older_seq, older.clone(), Ok(source.page_for(&older))));
        assert_eq!(view.page().unwrap().data[0].id, 21);

        // Older first, then the newer one.
        view.apply_page(outcome(older_seq, older.clone(), Ok(source.page_for(&older))));
        assert_eq!(view.page().unwrap().data[0].id, 21);
        view.apply_page(outcome(newer_seq, newer.clone(), Ok(source.page_for(&newer))));
        assert_eq!(view.page().unwrap().data[0].id, 21);
        assert_eq!(view.state().page, 3);
    }

    #[tokio::test]
    async fn failed_fetch_hides_rows_until_next_success() {
        let source = FakeSource::new(237);
        source.set_failing(true);
        let (mut view, source) = mounted(source).await;
        assert_eq!(
            view.status(),
            &ViewStatus::Error("Failed to fetch data".to_string())
        );
        assert!(view.page().is_none());

        source.set_failing(false);
        view.update(Message::CyclePageSize);
        settle(&mut view).await;
        assert_eq!(view.status(), &ViewStatus::Ready);
        assert_eq!(view.page().unwrap().data.len(), 25);
    }

    #[tokio::test]
    async fn failed_stats_leave_the_view_usable() {
        let source = FakeSource::new(12);
        source.set_stats_failing(true);
        let (view, _source) = mounted(source).await;
        assert!(view.stats().is_none());
        assert_eq!(view.status(), &ViewStatus::Ready);
    }
}
