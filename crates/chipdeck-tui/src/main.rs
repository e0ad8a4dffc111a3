//! chipdeck - live template chips in the terminal.
//!
//! Loads the chip configuration, connects to the template server over its
//! Unix socket and keeps every chip's templates subscribed while the chips
//! are on screen.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chipdeck_core::config::{Config, Directories, invalid_entities, unknown_fields};
use chipdeck_core::markup::parse_inline_icons;
use chipdeck_core::{ActionKind, ChipField, ConfigHash, ResultCache, TemplateBackend, TemplateChip};
use chipdeck_rpc::{RpcClient, RpcTemplateBackend};
use chipdeck_tui::colors;
use chipdeck_tui::widgets::render_chip_view;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod app;
mod cli;

use app::App;
use cli::{Cli, Commands};

fn setup_logging(debug_flag: bool) {
    let level = if debug_flag || cfg!(debug_assertions) {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_dir = std::env::temp_dir();
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("chipdeck-{timestamp}.log");
    let log_path = log_dir.join(&log_filename);

    let symlink_path = log_dir.join("chipdeck.log");
    let _ = std::fs::remove_file(&symlink_path);
    let _ = std::os::unix::fs::symlink(&log_path, &symlink_path);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    std::mem::forget(guard);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.debug);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Directories::new().config_file);

    match cli.command {
        Some(Commands::Scan { text }) => scan(&text)?,
        Some(Commands::Hash) => print_hashes(&config_path)?,
        Some(Commands::Check) => check(&config_path)?,
        Some(Commands::Watch) | None => watch(&config_path, cli.socket).await?,
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}

fn scan(text: &str) -> Result<()> {
    let segments = parse_inline_icons(text);
    println!("{}", serde_json::to_string_pretty(&segments)?);
    Ok(())
}

fn print_hashes(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    for (index, chip) in config.chips.iter().enumerate() {
        let hash = ConfigHash::of(chip).with_context(|| format!("Failed to hash chip {index}"))?;
        println!(
            "{:>3}  {}  {}",
            index + 1,
            hash,
            chip.entity.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn check(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        println!("{}: not found, defaults apply", config_path.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let unknown = unknown_fields(&content);
    let invalid = invalid_entities(&content);
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config {}", config_path.display()))?;

    println!("{}", config_path.display());
    println!("  chips:     {}", config.chips.len());
    println!("  templates: {}", config.template_count());
    for path in &unknown {
        println!("  unknown field: {path}");
    }
    for (path, entity) in &invalid {
        println!("  invalid entity at {path}: {entity:?}");
    }
    if unknown.is_empty() && invalid.is_empty() {
        println!("  ok");
    }
    Ok(())
}

async fn watch(config_path: &Path, socket: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let socket = socket.unwrap_or_else(|| config.backend.socket_path());

    let client = RpcClient::connect_to(&socket)
        .await
        .with_context(|| format!("Failed to connect to template server at {}", socket.display()))?
        .with_timeout(config.backend.request_timeout());
    let backend: Arc<dyn TemplateBackend> = Arc::new(RpcTemplateBackend::new(Arc::new(client)));

    let cache = ResultCache::new(config.cache.capacity);
    let (updates_tx, updates) = mpsc::unbounded_channel();

    let mut chips = Vec::with_capacity(config.chips.len());
    for (index, chip_config) in config.chips.into_iter().enumerate() {
        let mut chip = TemplateChip::with_updates(cache.clone(), updates_tx.clone());
        chip.set_config(chip_config)
            .await
            .with_context(|| format!("Invalid chip {index}"))?;
        chip.set_backend(Arc::clone(&backend), config.user.clone());
        chips.push(chip);
    }
    drop(updates_tx);

    tracing::debug!("Watching {} chip(s) via {}", chips.len(), socket.display());

    let mut app = App::new(chips);
    app.mount_all();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let outcome = run_event_loop(&mut terminal, &mut app, updates).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.unmount_all().await;
    outcome
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut updates: mpsc::UnboundedReceiver<ChipField>,
) -> Result<()> {
    let mut event_stream = EventStream::new();
    let mut needs_render = true;

    loop {
        if needs_render {
            terminal.draw(|f| ui(f, app))?;
            needs_render = false;
        }

        tokio::select! {
            Some(field) = updates.recv() => {
                tracing::trace!("Template result for {}", field);
                needs_render = true;
            }

            Some(event_result) = event_stream.next() => {
                let event = match event_result {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::error!("Event stream error: {}", e);
                        continue;
                    }
                };

                match event {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        handle_key(app, key.code).await;
                        needs_render = true;
                    }
                    Event::Resize(..) => needs_render = true,
                    _ => {}
                }
            }

            else => break,
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn handle_key(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Enter => app.trigger(ActionKind::Tap),
        KeyCode::Char('h') => app.trigger(ActionKind::Hold),
        KeyCode::Char('d') => app.trigger(ActionKind::DoubleTap),
        KeyCode::Char('r') => app.remount_selected().await,
        _ => {}
    }
}

fn ui(f: &mut Frame, app: &App) {
    let [body, status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(f.area());

    let lines: Vec<Line> = app
        .chips
        .iter()
        .enumerate()
        .map(|(index, chip)| {
            let marker = if index == app.selected { "> " } else { "  " };
            let mut line = chip.render().map_or_else(
                || Line::from(Span::styled("(…)", Style::default().fg(colors::OUTLINE))),
                |view| render_chip_view(&view),
            );
            line.spans.insert(0, Span::styled(marker, Style::default().fg(colors::PRIMARY)));
            if index == app.selected {
                line = line.style(Style::default().bg(colors::SURFACE_HIGH));
            }
            line
        })
        .collect();

    let chips = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors::OUTLINE))
                .title(Span::styled(
                    " chipdeck ",
                    Style::default()
                        .fg(colors::PRIMARY)
                        .add_modifier(Modifier::BOLD),
                )),
        )
        .style(Style::default().bg(colors::BG));
    f.render_widget(chips, body);

    let status_text = app.status.clone().unwrap_or_else(|| {
        "q quit  ↑/↓ select  enter tap  h hold  d double tap  r remount".to_string()
    });
    let status_color = if app.status.is_some() {
        colors::SUCCESS
    } else {
        colors::SUBTEXT
    };
    f.render_widget(
        Paragraph::new(status_text).style(Style::default().fg(status_color)),
        status,
    );
}
