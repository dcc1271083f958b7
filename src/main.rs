use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gpuwatch::data::duration::{format_duration, parse_duration};
use gpuwatch::ui::{self, Theme};
use gpuwatch::{events, App, DashboardConfig, PrometheusSource};

#[derive(Parser, Debug)]
#[command(name = "gpuwatch")]
#[command(about = "Terminal dashboard for GPU telemetry exported by DCGM to Prometheus")]
struct Args {
    /// Prometheus (or Thanos Querier) base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Bearer token for the metrics endpoint
    #[arg(long)]
    token: Option<String>,

    /// UUID of the GPU to show first
    #[arg(short, long)]
    gpu: Option<String>,

    /// History window of the sparklines (e.g., "1h", "30m")
    #[arg(long)]
    range: Option<String>,

    /// Resolution of the history window (e.g., "60s")
    #[arg(long)]
    step: Option<String>,

    /// Export the dashboard to a JSON file once loaded and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// How long export mode waits for every card to load
    #[arg(long, default_value = "30s", requires = "export")]
    export_wait: String,

    /// Write logs to this file (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Command-line flags take precedence over the file and environment.
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(ref endpoint) = self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(ref token) = self.token {
            config.token = Some(token.clone());
        }
        if let Some(refresh) = self.refresh {
            config.refresh_secs = refresh;
        }
        if let Some(ref range) = self.range {
            config.range = range.clone();
        }
        if let Some(ref step) = self.step {
            config.step = step.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_file.as_deref(), args.export.is_some())?;

    let mut config = DashboardConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    let catalog = config.catalog()?;
    let settings = config.poll_settings()?;
    let client = config.client()?;
    info!(
        endpoint = %config.endpoint,
        metrics = catalog.len(),
        interval = %format_duration(settings.interval),
        range = %format_duration(settings.window.span),
        "starting gpuwatch"
    );

    // The poller runs on the runtime's workers while the UI owns the main thread
    let rt = tokio::runtime::Runtime::new()?;
    let source = {
        let _guard = rt.enter();
        PrometheusSource::spawn(client, catalog.clone(), settings)
    };
    let app = App::new(Box::new(source), catalog, args.gpu.clone());

    if let Some(ref export_path) = args.export {
        let wait = parse_duration(&args.export_wait).context("invalid --export-wait")?;
        return export_to_file(app, export_path, wait);
    }

    run_tui(app)
}

/// Install the tracing subscriber.
///
/// Export mode logs to stderr. The TUI only logs when `--log-file` is given.
fn init_logging(log_file: Option<&Path>, export_mode: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gpuwatch=info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if export_mode => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    app.theme = Theme::auto_detect();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    app.reload_data();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(100));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5u16.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(8),    // Cards
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::cards::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }

        // Drain replies from the poller
        if last_refresh.elapsed() >= refresh_interval {
            app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Wait until every card has loaded (or `wait` elapses) and write the state.
fn export_to_file(mut app: App, export_path: &Path, wait: Duration) -> Result<()> {
    let started = Instant::now();
    loop {
        app.reload_data();
        if app.is_settled() {
            break;
        }
        if started.elapsed() >= wait {
            warn!(?wait, "timed out waiting for metrics; exporting partial state");
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    app.export_state(export_path)?;
    println!("Exported dashboard state to: {}", export_path.display());
    Ok(())
}
