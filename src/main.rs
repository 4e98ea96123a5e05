mod app;
mod client;
mod config;
mod drug;
mod form;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use client::{AskService, HttpAskClient};
use config::AppConfig;
use form::QueryForm;
use theme::Theme;

/// Brand drugs checked by `--batch`
const BATCH_BRANDS: [&str; 10] = [
    "Advil", "Mucinex", "Claritin", "Zyrtec", "Tylenol",
    "Aleve", "Pepto-Bismol", "Benadryl", "Robitussin", "Dramamine",
];

#[derive(Parser, Debug)]
#[command(name = "medwise")]
#[command(version = "0.1.0")]
#[command(about = "Ask about brand-name drugs, generic alternatives, and prices")]
struct Args {
    /// Ask a single question and print the answer
    #[arg(short, long)]
    ask: Option<String>,

    /// Ask for the cheapest generic of each built-in brand drug
    #[arg(short, long)]
    batch: bool,

    /// Print the --ask outcome as JSON
    #[arg(long, requires = "ask")]
    json: bool,

    /// Endpoint that answers questions (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(short, long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr keeps stdout clean for --ask output)
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = AppConfig::load()
        .unwrap_or_default()
        .with_overrides(args.endpoint, args.timeout);

    let client = HttpAskClient::new(&config.endpoint, Duration::from_secs(config.timeout_seconds))?;
    tracing::debug!("Using endpoint {}", client.endpoint());

    // Handle CLI-only commands
    if let Some(question) = args.ask {
        return ask_once(&client, &question, args.json).await;
    }

    if args.batch {
        return run_batch(&client).await;
    }

    // Run TUI
    ui::init_theme(Theme::from_config(&config.theme));
    run_tui(Arc::new(client), &config.endpoint).await
}

async fn ask_once(service: &dyn AskService, question: &str, json: bool) -> Result<()> {
    let mut form = QueryForm::new();
    form.input = question.to_string();

    if !form.submit(service).await {
        tracing::warn!("Empty question, nothing to ask");
        return Ok(());
    }

    if let Some(outcome) = form.outcome() {
        if json {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        } else {
            println!("{}", ui::plain::outcome_to_plain(outcome));
        }
    }
    Ok(())
}

async fn run_batch(service: &dyn AskService) -> Result<()> {
    println!("\n🧪 Running test queries for cheapest generic alternatives:\n");

    let mut form = QueryForm::new();
    for drug in BATCH_BRANDS {
        form.input = format!("What is the cheapest generic alternative to {}?", drug);
        println!("🔍 {}", form.input);

        // Failures become an error outcome, so the batch keeps going
        form.submit(service).await;
        if let Some(outcome) = form.outcome() {
            println!("{}\n", ui::plain::outcome_to_plain(outcome));
        }
    }
    Ok(())
}

async fn run_tui(service: Arc<dyn AskService>, endpoint: &str) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(service, endpoint);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }

        // Pick up finished requests
        app.tick();
    }
}
