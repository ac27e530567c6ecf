//! A terminal frontend and a REST backend for paginated employee data and charts.
//!
//! `server` answers the HTTP contract from the `polars` tables in `store`;
//! the viewer (`model`, `ui`, `controller`) talks to it through `client`.

pub mod api;
pub mod charts;
pub mod client;
pub mod controller;
pub mod domain;
pub mod fetcher;
pub mod inputter;
pub mod logging;
pub mod model;
pub mod query;
pub mod sample_data;
pub mod server;
pub mod store;
pub mod table;
pub mod ui;
