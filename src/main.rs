//! Sigma Search - missing person reporting in the terminal.
//!
//! Without a subcommand the interactive TUI starts. The `records`, `health`
//! and `asset` subcommands expose the record gateway from the shell.

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use sigma_search::application::{App, Workflow};
use sigma_search::domain::{RandomFoundSource, SimulatedSearch};
use sigma_search::infrastructure::{
    AppConfig, AssetGate, AssetLocator, CredentialCheck, CredentialSet, JsonRecordStore,
    LoggingConfig, RecordGateway, RecordId, ResolvedConfig, Session,
};
use sigma_search::presentation::{InputHandler, render_ui};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(name = "sigma-search", version, about = "Missing person reporting in the terminal")]
struct Cli {
    /// TOML configuration file, layered over `sigma-search.toml`.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the interactive terminal UI (default).
    Run,
    /// Inspect stored records.
    Records {
        #[arg(short, long, default_value = "Sigma")]
        user: String,
        #[arg(short, long)]
        secret: String,
        #[command(subcommand)]
        action: RecordsAction,
    },
    /// Print the service health report as JSON.
    Health,
    /// Locate the protected download.
    Asset {
        #[arg(short, long)]
        secret: String,
    },
}

#[derive(Debug, Subcommand)]
enum RecordsAction {
    /// List every record, ordered by name.
    List,
    /// Show one record and its latest search result.
    Show { id: RecordId },
    /// Write all records to a CSV file.
    Export { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let command = cli.command.unwrap_or(Command::Run);

    init_tracing(&config.logging, cli.verbose, matches!(command, Command::Run))?;
    let resolved = config.resolve().context("invalid configuration")?;
    let gateway = build_gateway(&resolved);

    match command {
        Command::Run => run_tui(&resolved, gateway),
        Command::Records {
            user,
            secret,
            action,
        } => {
            let session = authenticate(&resolved.credentials, &user, &secret)?;
            run_records(&gateway, &session, action)
        }
        Command::Health => {
            println!("{}", serde_json::to_string_pretty(&gateway.health())?);
            Ok(())
        }
        Command::Asset { secret } => {
            let locator = gateway.request_asset(&secret)?;
            locator
                .ensure_exists()
                .with_context(|| format!("failed to prepare {}", locator.path.display()))?;
            println!("{} -> {}", locator.file_name, locator.path.display());
            Ok(())
        }
    }
}

/// The TUI owns stdout, so it logs to a file; the other commands log to
/// stderr.
fn init_tracing(logging: &LoggingConfig, verbose: bool, to_file: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_env("SIGMA_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.file)
            .with_context(|| format!("failed to open log file {}", logging.file.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
    } else {
        builder.with_writer(io::stderr).try_init()
    };
    result.map_err(|error| anyhow!("failed to initialize tracing subscriber: {error}"))
}

fn build_gateway(resolved: &ResolvedConfig) -> RecordGateway {
    let store = JsonRecordStore::new(&resolved.storage_path);
    let locator = AssetLocator {
        path: resolved.asset_path.clone(),
        file_name: resolved.asset_file_name.clone(),
    };
    RecordGateway::new(
        Box::new(store),
        AssetGate::new(resolved.asset_secret_hash.clone(), locator),
    )
}

fn authenticate(credentials: &CredentialSet, user: &str, secret: &str) -> anyhow::Result<Session> {
    match credentials.check(user, secret) {
        CredentialCheck::Accepted => Ok(Session::authenticated(user)),
        CredentialCheck::UnknownIdentifier => bail!("unknown user '{user}'"),
        CredentialCheck::WrongSecret => bail!("wrong secret for '{user}'"),
    }
}

fn run_records(gateway: &RecordGateway, session: &Session, action: RecordsAction) -> anyhow::Result<()> {
    match action {
        RecordsAction::List => {
            for record in gateway.list(session)? {
                println!(
                    "{:>5}  {}  {}  ({})",
                    record.id,
                    record.created_on.format("%d/%m/%Y"),
                    record.full_name,
                    record.submitted_by
                );
            }
        }
        RecordsAction::Show { id } => {
            let record = gateway.fetch(session, id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            match gateway.latest_search_result(session, id)? {
                Some(result) => println!(
                    "latest search: {} on {}",
                    if result.found { "found" } else { "not found" },
                    result.queried_on
                ),
                None => println!("latest search: none"),
            }
        }
        RecordsAction::Export { path } => {
            let count = gateway.export_csv(session, &path)?;
            println!("exported {count} record(s) to {}", path.display());
        }
    }
    Ok(())
}

fn run_tui(resolved: &ResolvedConfig, gateway: RecordGateway) -> anyhow::Result<()> {
    let backend = SimulatedSearch::new(RandomFoundSource::new(resolved.found_probability));
    let workflow = Workflow::new(resolved.credentials.clone(), Box::new(backend))
        .with_search_delay(resolved.search_delay);
    let mut app = App::new(workflow, Some(gateway));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    tracing::info!("terminal session started");
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "terminal session failed");
    }
    res.context("terminal I/O failed")
}

/// Draws, waits up to one tick for a key, then lets the search timer advance.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    InputHandler::handle_key_event(app, key.code, key.modifiers);
                }
            }
        }
        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}
