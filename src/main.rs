use clap::Parser;
use crossterm::event::{self, Event as CEvent, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::error::Error;
use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use dex_catalog::api::{PokeApiClient, ResourceKind};
use dex_catalog::collection::Accumulated;
use dex_catalog::config::{Config, DumpTarget};
use dex_catalog::loader;
use dex_catalog::models::{Generation, Location, Move, Pokemon, Record, Species};
use dex_catalog::session::{GroupedSession, Source};
use dex_catalog::ui::{draw_ui, App};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cfg = Config::parse();
    cfg.validate()?;
    init_tracing(&cfg)?;

    let client = PokeApiClient::new(cfg.timeout())?;
    let source = Source::new(Arc::new(client), cfg.base_url.clone()).with_pokemon_limit(cfg.limit);

    // Fetch-only mode streams one listing to stdout and exits (useful for seeding data).
    if let Some(target) = cfg.fetch_only {
        tracing::info!(?target, pokemon_limit = ?cfg.limit, "running fetch-only mode");
        return dump(&cfg, source, target).await;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(source, cfg.batch_size, cfg.page_size);
    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(LeaveAlternateScreen)?;
    result
}

fn init_tracing(cfg: &Config) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_new(&cfg.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if let Some(path) = &cfg.log_file {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else if cfg.fetch_only.is_some() {
        builder.with_writer(io::stderr).init();
    } else {
        // the TUI owns the terminal
        builder.with_writer(io::sink).init();
    }
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        draw_ui(terminal, app)?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if app.search_mode {
                    match key.code {
                        KeyCode::Enter | KeyCode::Esc => {
                            app.search_mode = false;
                        }
                        KeyCode::Backspace => {
                            app.search_query.pop();
                            app.apply_filter();
                        }
                        KeyCode::Char(c) => {
                            app.search_query.push(c);
                            app.apply_filter();
                        }
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::F(1) | KeyCode::Char('h') => {
                            app.show_help = !app.show_help;
                        }
                        KeyCode::Char('/') => {
                            app.search_mode = true;
                            app.search_query.clear();
                            app.apply_filter();
                        }
                        KeyCode::Down => app.next(),
                        KeyCode::Up => app.previous(),
                        KeyCode::Char('n') | KeyCode::PageDown => app.next_page(),
                        KeyCode::Char('p') | KeyCode::PageUp => app.previous_page(),
                        KeyCode::Tab => app.switch_tab(true),
                        KeyCode::BackTab => app.switch_tab(false),
                        KeyCode::Char('s') => app.show_sprites = !app.show_sprites,
                        // Reload the current listing from a fresh index fetch
                        KeyCode::Char('r') => app.restart(),
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

async fn dump(cfg: &Config, source: Source, target: DumpTarget) -> Result<(), Box<dyn Error>> {
    match target {
        DumpTarget::Kind(ResourceKind::Pokemon) => dump_kind::<Pokemon>(&source).await,
        DumpTarget::Kind(ResourceKind::PokemonSpecies) => dump_kind::<Species>(&source).await,
        DumpTarget::Kind(ResourceKind::Location) => dump_kind::<Location>(&source).await,
        DumpTarget::Kind(ResourceKind::Move) => dump_kind::<Move>(&source).await,
        DumpTarget::Kind(ResourceKind::Generation) => dump_kind::<Generation>(&source).await,
        DumpTarget::Forms => dump_forms(source, cfg.batch_size).await,
    }
}

async fn dump_kind<T: Record>(source: &Source) -> Result<(), Box<dyn Error>> {
    let index = source.index(T::KIND).await?;
    let total = index.len();
    let items = loader::stream::<T>(source.fetch.clone(), index, CancellationToken::new());
    futures::pin_mut!(items);

    let mut collected: Accumulated<T> = Accumulated::new();
    let mut out = io::stdout().lock();
    while let Some(item) = items.next().await {
        writeln!(out, "{}", serde_json::to_string(&item)?)?;
        collected.insert(item);
        tracing::debug!(fetched = collected.len(), total, "progress");
    }
    out.flush()?;
    tracing::info!(kind = %T::KIND, fetched = collected.len(), total, "fetch complete");
    Ok(())
}

async fn dump_forms(source: Source, batch_size: usize) -> Result<(), Box<dyn Error>> {
    let mut session = GroupedSession::new(source, batch_size);
    let mut out = io::stdout().lock();
    loop {
        let page = session.load_more().await?;
        for group in &page.groups {
            writeln!(out, "{}", serde_json::to_string(group)?)?;
        }
        tracing::info!(
            members = page.member_count(),
            examined = session.offset(),
            total = session.total().unwrap_or(0),
            forms = session.seen().len(),
            "batch complete"
        );
        if session.is_exhausted() {
            break;
        }
    }
    out.flush()?;
    Ok(())
}
