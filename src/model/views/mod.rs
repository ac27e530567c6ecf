mod plot_view;
mod table_view;

pub use plot_view::PlotView;
pub use table_view::TableView;

/// What a data view currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// Nothing fetched yet since the view was mounted.
    Loading,
    Ready,
    Error(String),
}
