use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ratatui::DefaultTerminal;
use tracing::{error, info};

use data_app::client::ApiClient;
use data_app::controller::Controller;
use data_app::domain::{DataAppError, ViewerConfig};
use data_app::logging::{init_file_logging, init_stderr_logging};
use data_app::model::{Model, Status};
use data_app::sample_data::{DEFAULT_EMPLOYEE_COUNT, DEFAULT_SEED};
use data_app::server::{ServerConfig, run_server};
use data_app::ui::AppUI;

#[derive(Parser, Debug)]
#[command(name = "data-app", version)]
#[command(about = "Employee data and charts served over HTTP and browsed in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST backend
    Serve(ServeArgs),
    /// Browse the backend in the terminal
    View(ViewArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "DATA_APP_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, env = "DATA_APP_PORT", default_value_t = 8000)]
    port: u16,

    /// Serve this csv, parquet or arrow file instead of generated employees
    #[arg(short, long)]
    employees: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_EMPLOYEE_COUNT)]
    employee_count: usize,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

#[derive(Args, Debug)]
struct ViewArgs {
    #[arg(short, long, env = "DATA_APP_URL", default_value = "http://127.0.0.1:8000")]
    url: String,

    #[arg(long, default_value_t = 100)]
    event_poll_ms: u64,

    /// Quiet period before a changed query is fetched
    #[arg(long, default_value_t = 0)]
    search_debounce_ms: u64,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, default_value = "data-app.log")]
    log_file: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve(args) => serve(args),
        Command::View(args) => view(args),
    };
    match result {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn serve(args: ServeArgs) -> Result<(), DataAppError> {
    init_stderr_logging()?;
    let mut config = ServerConfig::default()
        .host(args.host)
        .port(args.port)
        .employee_count(args.employee_count)
        .seed(args.seed);
    if let Some(path) = args.employees {
        config = config.employees(path);
    }
    info!("Starting server with {config:?}");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(config))
}

fn view(args: ViewArgs) -> Result<(), DataAppError> {
    let cfg = ViewerConfig::default()
        .server_url(args.url)
        .event_poll_time(args.event_poll_ms)
        .search_debounce_ms(args.search_debounce_ms)
        .request_timeout_secs(args.timeout_secs)
        .log_file(args.log_file);
    let log_file = init_file_logging(&cfg.log_file)?;
    info!("Starting viewer, logging to {}", log_file.display());

    let runtime = tokio::runtime::Runtime::new()?;
    // Fetchers spawn onto this runtime from the ui thread.
    let _guard = runtime.enter();

    let client = ApiClient::new(
        &cfg.server_url,
        Duration::from_secs(cfg.request_timeout_secs),
    )
    .map_err(|e| DataAppError::LoadingFailed(e.to_string()))?;
    let mut model = Model::init(&cfg, Arc::new(client));
    let mut ui = AppUI::new();
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = run_loop(&mut terminal, &mut model, &mut ui, &controller);
    ratatui::restore();
    info!("Viewer stopped");
    result
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut AppUI,
    controller: &Controller,
) -> Result<(), DataAppError> {
    while model.status != Status::Quitting {
        // Apply responses that arrived, render, then wait for the next key
        model.poll();
        terminal.draw(|f| ui.draw(model, f))?;
        let message = controller.handle_event(model)?;
        model.update(message)?;
    }
    Ok(())
}
