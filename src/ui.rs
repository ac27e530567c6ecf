use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span, Text},
    widgets::{
        Axis, BarChart, Block, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table,
        Tabs, Wrap,
    },
};

use crate::domain::Tab;
use crate::model::{Model, PlotView, TableView, ViewStatus};
use crate::table::{
    COLUMNS, cell, format_avg_salary, header_title, pagination_text,
};

pub const TABS_HEIGHT: u16 = 3;
pub const STATS_HEIGHT: u16 = 4;
const SERIES_COLORS: [Color; 4] = [Color::Blue, Color::Red, Color::Green, Color::Yellow];

#[derive(Debug, Default)]
pub struct AppUI {}

impl AppUI {
    pub fn new() -> Self {
        Self {}
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let [tabs_area, body, footer] = Layout::vertical([
            Constraint::Length(TABS_HEIGHT),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let titles = Tab::ALL.iter().map(|t| t.title());
        let tabs = Tabs::new(titles)
            .select(model.tab().index())
            .highlight_style(Style::default().fg(Color::Yellow).bold())
            .block(Block::bordered().title(" Data App "));
        frame.render_widget(tabs, tabs_area);

        match model.tab() {
            Tab::Home => render_home(frame, body),
            Tab::Plotting => {
                if let Some(view) = model.plot_view() {
                    render_plot_view(frame, body, view);
                }
            }
            Tab::DataFrame => {
                if let Some(view) = model.table_view() {
                    render_table_view(frame, body, view);
                }
            }
        }

        frame.render_widget(Paragraph::new(key_hints(model)).dark_gray(), footer);

        if let Some(help) = model.help_text() {
            render_popup(frame, " Help ", help);
        }
    }
}

fn key_hints(model: &Model) -> Line<'static> {
    let hints = match model.tab() {
        Tab::Home => " 1-3 tabs | ? help | q quit",
        Tab::Plotting => " c company | t days | r region | ? help | q quit",
        Tab::DataFrame if model.raw_keyevents() => " Enter done | Esc clear search",
        Tab::DataFrame => {
            " ←/→ column | s sort | / search | d department | z per page | g b n G pages | ? help | q quit"
        }
    };
    Line::from(hints)
}

fn render_home(frame: &mut Frame, area: Rect) {
    let [hero, cards] =
        Layout::vertical([Constraint::Length(5), Constraint::Fill(1)]).areas(area);

    let welcome = Text::from(vec![
        Line::from("Welcome to Data App".bold()),
        Line::from(""),
        Line::from("A demo application pairing a terminal frontend with a REST backend for data visualization."),
    ]);
    frame.render_widget(
        Paragraph::new(welcome)
            .centered()
            .wrap(Wrap { trim: true }),
        hero,
    );

    let [left, right] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(cards);
    let plotting = Text::from(vec![
        Line::from("Interactive charts displaying stock price trends and sales data."),
        Line::from("Line and bar charts with filtering controls."),
        Line::from(""),
        Line::from(vec!["Press ".into(), "2".yellow().bold(), " to explore charts".into()]),
    ]);
    let dataframe = Text::from(vec![
        Line::from("A sortable, filterable table of employee records."),
        Line::from("Includes pagination, search and summary statistics."),
        Line::from(""),
        Line::from(vec!["Press ".into(), "3".yellow().bold(), " to view data".into()]),
    ]);
    frame.render_widget(
        Paragraph::new(plotting)
            .wrap(Wrap { trim: true })
            .block(Block::bordered().title(" Plotting Demo ")),
        left,
    );
    frame.render_widget(
        Paragraph::new(dataframe)
            .wrap(Wrap { trim: true })
            .block(Block::bordered().title(" DataFrame Demo ")),
        right,
    );
}

/// Renders the loading or error notice. Returns false when there is data to show.
fn render_status(frame: &mut Frame, area: Rect, status: &ViewStatus) -> bool {
    let text = match status {
        ViewStatus::Ready => return false,
        ViewStatus::Loading => Line::from("Loading data..."),
        ViewStatus::Error(message) => Line::from(format!("Error: {message}")).red(),
    };
    frame.render_widget(Paragraph::new(text).centered(), area);
    true
}

fn render_table_view(frame: &mut Frame, area: Rect, view: &TableView) {
    if view.status() != &ViewStatus::Ready {
        let [controls_area, notice_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        render_controls(frame, controls_area, view);
        render_status(frame, notice_area, view.status());
        return;
    }
    let Some(page) = view.page() else {
        return;
    };

    let stats_height = if view.stats().is_some() { STATS_HEIGHT } else { 0 };
    let [stats_area, controls_area, table_area, pagination_area] = Layout::vertical([
        Constraint::Length(stats_height),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    if let Some(stats) = view.stats() {
        let cards = [
            (stats.total_employees.to_string(), "Total Employees"),
            (format_avg_salary(stats.avg_salary), "Average Salary"),
            (stats.avg_years_employed.to_string(), "Avg Years Employed"),
            (stats.avg_performance.to_string(), "Avg Performance"),
        ];
        let areas = Layout::horizontal([Constraint::Fill(1); 4]).split(stats_area);
        for ((value, label), card_area) in cards.into_iter().zip(areas.iter()) {
            let text = Text::from(vec![Line::from(value.bold()), Line::from(label).dark_gray()]);
            frame.render_widget(
                Paragraph::new(text).centered().block(Block::bordered()),
                *card_area,
            );
        }
    }

    render_controls(frame, controls_area, view);

    let state = view.state();

    let selected = view.selected_column().sort;
    let header = Row::new(COLUMNS.iter().map(|c| {
        let style = if c.sort == selected {
            Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Cell::from(header_title(c, state.sort_column, state.sort_order)).style(style)
    }));
    let rows = page
        .data
        .iter()
        .map(|e| Row::new(COLUMNS.iter().map(|c| Cell::from(cell(e, c.sort)))));
    let widths = COLUMNS.iter().map(|c| Constraint::Length(c.width));
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::bordered().title(" Employee Data "));
    frame.render_widget(table, table_area);

    let controls = view.controls();
    let button = |label: &'static str, enabled: bool| {
        if enabled {
            Span::raw(label).bold()
        } else {
            Span::raw(label).dark_gray()
        }
    };
    let p = page.pagination;
    let line = Line::from(vec![
        button("[First]", controls.first),
        " ".into(),
        button("[Previous]", controls.previous),
        "  ".into(),
        Span::raw(pagination_text(state.page, p.total_pages, p.total_items)),
        "  ".into(),
        button("[Next]", controls.next),
        " ".into(),
        button("[Last]", controls.last),
    ]);
    frame.render_widget(Paragraph::new(line).centered(), pagination_area);
}

fn search_spans(view: &TableView) -> Vec<Span<'static>> {
    let text = view.search_text();
    match view.search_cursor() {
        Some(pos) => {
            let before: String = text.chars().take(pos).collect();
            let mut rest = text.chars().skip(pos);
            let under = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
            let after: String = rest.collect();
            vec![Span::raw(before), Span::raw(under).reversed(), Span::raw(after)]
        }
        None if view.state().search.is_none() => {
            vec![Span::raw("Search name or email...").dark_gray()]
        }
        None => vec![Span::raw(text)],
    }
}

fn render_controls(frame: &mut Frame, area: Rect, view: &TableView) {
    let state = view.state();
    let mut controls = vec!["Search: ".bold()];
    controls.extend(search_spans(view));
    controls.extend([
        "  Department: ".bold(),
        Span::raw(
            state
                .department
                .clone()
                .unwrap_or_else(|| "All Departments".to_string()),
        ),
        "  Per page: ".bold(),
        Span::raw(state.page_size.value().to_string()),
    ]);
    frame.render_widget(Paragraph::new(Line::from(controls)), area);
}

fn render_plot_view(frame: &mut Frame, area: Rect, view: &PlotView) {
    if render_status(frame, area, &view.status()) {
        return;
    }
    let [line_area, bar_area] =
        Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)]).areas(area);
    render_line_chart(frame, line_area, view);
    render_bar_chart(frame, bar_area, view);
}

fn render_line_chart(frame: &mut Frame, area: Rect, view: &PlotView) {
    let query = view.line_query();
    let [controls_area, chart_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
    let company = query.company.as_deref().unwrap_or("All Companies").to_string();
    let mut controls = vec![
        "Company: ".bold(),
        Span::raw(company),
        "  Days: ".bold(),
        Span::raw(format!("{} days", query.days)),
    ];
    if let Some(range) = view.date_range() {
        controls.push(Span::raw(format!("  ({} to {})", range.start, range.end)).dark_gray());
    }
    frame.render_widget(Paragraph::new(Line::from(controls)), controls_area);

    let chart = view.chart();
    let block = Block::bordered().title(" Stock Prices ");
    if chart.is_empty() {
        frame.render_widget(Paragraph::new("No data").centered().block(block), chart_area);
        return;
    }

    let datasets = chart
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Dataset::default()
                .name(s.company.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(&s.points)
        })
        .collect::<Vec<_>>();

    let last = chart.dates.len().saturating_sub(1);
    let x_labels = vec![
        chart.dates[0].clone(),
        chart.dates[last / 2].clone(),
        chart.dates[last].clone(),
    ];
    let margin = ((chart.max_price - chart.min_price) * 0.05).max(1.0);
    let (y_min, y_max) = (chart.min_price - margin, chart.max_price + margin);
    let y_labels = vec![
        format!("${y_min:.0}"),
        format!("${:.0}", (y_min + y_max) / 2.0),
        format!("${y_max:.0}"),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().dark_gray())
                .bounds([0.0, last.max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().dark_gray())
                .bounds([y_min, y_max])
                .labels(y_labels),
        );
    frame.render_widget(chart, chart_area);
}

fn render_bar_chart(frame: &mut Frame, area: Rect, view: &PlotView) {
    let [controls_area, chart_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
    let region = view
        .bar_query()
        .region
        .as_deref()
        .unwrap_or("All Regions")
        .to_string();
    frame.render_widget(
        Paragraph::new(Line::from(vec!["Region: ".bold(), Span::raw(region)])),
        controls_area,
    );

    let bars: Vec<(&str, u64)> = view
        .bars()
        .iter()
        .map(|(category, sales)| (category.as_str(), *sales))
        .collect();
    let chart = BarChart::default()
        .block(Block::bordered().title(" Sales by Category ($k) "))
        .data(bars.as_slice())
        .bar_width(7)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Blue))
        .value_style(Style::default().fg(Color::White).bg(Color::Blue));
    frame.render_widget(chart, chart_area);
}

fn render_popup(frame: &mut Frame, title: &str, text: &str) {
    let lines = text.lines().count() as u16 + 2;
    let width = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
    let area = centered(frame.area(), width, lines);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(Block::bordered().title(title.to_string())),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}
