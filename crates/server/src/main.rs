mod config;
mod events;
mod server;
mod tui;

use std::io;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use config::ServerConfig;
use events::ServerEvent;
use server::GameServer;

#[derive(Parser)]
#[command(name = "outland-server")]
#[command(about = "Outland extraction shooter server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = outland::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = outland::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, default_value_t = 4)]
    max_teams: u8,

    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bind_addr = format!("{}:{}", args.bind, args.port);

    let mut config = ServerConfig::default();
    config.core.network.world_update_rate = args.tick_rate;
    config.max_teams = args.max_teams;

    let mut server = GameServer::new(&bind_addr, config)?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Server started on {}", server.local_addr());
        server.run();
        log::info!("Server shutting down");
    } else {
        run_with_tui(&mut server)?;
    }

    Ok(())
}

fn run_with_tui(server: &mut GameServer) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let running = server.running();
    log::info!("Server started on {}", server.local_addr());

    while running.load(Ordering::SeqCst) {
        server.tick_once();

        for event in server.drain_events() {
            match event {
                ServerEvent::PlayerConnected { player_id, addr, player_name } => {
                    log::info!("player {player_id} ({player_name}) connected from {addr}");
                }
                ServerEvent::PlayerReconnected { player_id, addr } => {
                    log::info!("player {player_id} reconnected from {addr}");
                }
                ServerEvent::PlayerDisconnected { player_id, reason } => {
                    log::info!("player {player_id} {}", reason.as_str());
                }
                ServerEvent::ConnectionDenied { addr, reason } => {
                    log::warn!("connection denied to {addr}: {reason}");
                }
                ServerEvent::WorldStarted { world_id, lobby_id, player_count } => {
                    log::info!("world {world_id} started from lobby {lobby_id} with {player_count} players");
                }
                ServerEvent::WorldCompleted { world_id, winning_team } => {
                    log::info!("world {world_id} completed, team {winning_team} won");
                }
                ServerEvent::Error { message } => {
                    log::error!("{message}");
                }
            }
        }

        if event::poll(Duration::from_millis(1))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        {
            running.store(false, Ordering::SeqCst);
        }

        let stats = server.stats();
        terminal.draw(|frame| {
            tui::render(frame, stats);
        })?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
