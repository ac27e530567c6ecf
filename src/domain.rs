use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataAppError {
    #[error("io error: {0}")]
    IoError(#[from] Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("unknown file type, expected csv, parquet or arrow")]
    UnknownFileType,
    #[error("could not set up logging: {0}")]
    LoggingFailed(String),
}

/// Top level tabs of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Plotting,
    DataFrame,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Home, Tab::Plotting, Tab::DataFrame];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Plotting => "Plotting Demo",
            Tab::DataFrame => "DataFrame Demo",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Plotting => 1,
            Tab::DataFrame => 2,
        }
    }

    pub fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn previous(&self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    NextTab,
    PreviousTab,
    SelectTab(Tab),
    Help,
    Exit,
    SelectColumnLeft,
    SelectColumnRight,
    Sort,
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    CycleDepartment,
    CyclePageSize,
    Search,
    CycleCompany,
    CycleDays,
    CycleRegion,
    RawKey(KeyEvent),
}

/// Settings of the interactive viewer.
#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct ViewerConfig {
    /// Base url of the backend, e.g. `http://127.0.0.1:8000`.
    pub server_url: String,
    pub event_poll_time: u64,
    /// Quiet period before a changed query is fetched. Zero fetches on every change.
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub log_file: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            event_poll_time: 100,
            search_debounce_ms: 0,
            request_timeout_secs: 30,
            log_file: PathBuf::from("data-app.log"),
        }
    }
}

pub const HELP_TEXT: &str = "\
Navigation
  Tab / Shift-Tab   next / previous tab
  1 2 3             Home, Plotting Demo, DataFrame Demo
  q                 quit
  ?                 this help (Esc closes)

DataFrame Demo
  Left / Right      select column header
  s / Enter         sort by selected column (again to flip order)
  /                 search name or email (Enter keeps, Esc clears)
  d                 cycle department filter
  z                 cycle rows per page
  g / Home          first page
  b / PageUp        previous page
  n / PageDown      next page
  G / End           last page

Plotting Demo
  c                 cycle company
  t                 cycle day range
  r                 cycle region";
