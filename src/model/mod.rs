pub mod views;

use std::sync::Arc;

use tracing::{info, trace};

pub use views::{PlotView, TableView, ViewStatus};

use crate::client::DataSource;
use crate::domain::{DataAppError, HELP_TEXT, Message, Tab, ViewerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Quitting,
}

/// Application state of the viewer. Only the view of the active tab is mounted.
pub struct Model {
    pub status: Status,
    tab: Tab,
    config: ViewerConfig,
    source: Arc<dyn DataSource>,
    table_view: Option<TableView>,
    plot_view: Option<PlotView>,
    show_help: bool,
}

impl Model {
    pub fn init(config: &ViewerConfig, source: Arc<dyn DataSource>) -> Self {
        Self {
            status: Status::Running,
            tab: Tab::Home,
            config: config.clone(),
            source,
            table_view: None,
            plot_view: None,
            show_help: false,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn table_view(&self) -> Option<&TableView> {
        self.table_view.as_ref()
    }

    pub fn plot_view(&self) -> Option<&PlotView> {
        self.plot_view.as_ref()
    }

    pub fn help_text(&self) -> Option<&'static str> {
        self.show_help.then_some(HELP_TEXT)
    }

    /// Keys go straight to the search box while it is focused.
    pub fn raw_keyevents(&self) -> bool {
        self.table_view.as_ref().is_some_and(|v| v.searching())
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DataAppError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: tab {:?}, message {:?}", self.tab, msg);

        if self.show_help {
            match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.show_help = false,
                _ => (),
            }
            return Ok(());
        }

        match msg {
            Message::Quit => self.quit(),
            Message::Help => self.show_help = true,
            Message::NextTab => self.select_tab(self.tab.next()),
            Message::PreviousTab => self.select_tab(self.tab.previous()),
            Message::SelectTab(tab) => self.select_tab(tab),
            msg => match self.tab {
                Tab::Home => (),
                Tab::Plotting => {
                    if let Some(view) = &mut self.plot_view {
                        view.update(msg);
                    }
                }
                Tab::DataFrame => {
                    if let Some(view) = &mut self.table_view {
                        view.update(msg);
                    }
                }
            },
        }
        Ok(())
    }

    /// Leaving a tab unmounts its view, entering one mounts a fresh view.
    fn select_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        info!("Switching from {:?} to {:?}", self.tab, tab);
        self.table_view = None;
        self.plot_view = None;
        match tab {
            Tab::Home => (),
            Tab::Plotting => self.plot_view = Some(PlotView::mount(self.source.clone())),
            Tab::DataFrame => {
                self.table_view = Some(TableView::mount(self.source.clone(), &self.config))
            }
        }
        self.tab = tab;
    }

    /// Apply responses that arrived since the last frame.
    pub fn poll(&mut self) {
        if let Some(view) = &mut self.table_view {
            view.poll();
        }
        if let Some(view) = &mut self.plot_view {
            view.poll();
        }
    }
}
