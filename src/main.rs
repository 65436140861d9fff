//! # Duskhold Main Entry Point
//!
//! Parses the CLI, wires up the network collaborators, and runs the main
//! tick loop: one key read with a short timeout, one session tick, one
//! frame per iteration.

use clap::Parser;
use duskhold::ui::{self, Display, Key, TerminalDisplay};
use duskhold::{
    config, ContentPack, Direction, DuskholdError, DuskholdResult, GameSession, NullRelay,
    OfflineRecords, PlayerClass, Relay, SessionEvent,
};
use log::{info, warn};
use std::time::Duration;

/// Command line arguments for the Duskhold client.
#[derive(Parser, Debug)]
#[command(name = "duskhold")]
#[command(about = "A terminal multiplayer dungeon-crawler RPG client")]
#[command(version)]
struct Args {
    /// Player name
    #[arg(short, long, default_value = "Adventurer")]
    name: String,

    /// Player class: rogue, knight or wizard
    #[arg(short, long, default_value = "knight")]
    class: String,

    /// Random seed for board generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Game server host for position sync
    #[arg(long)]
    host: Option<String>,

    /// Game server port
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Skip all network collaborators
    #[arg(long)]
    offline: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .init();

    if let Err(err) = run(&args) {
        eprintln!("fatal: {}", err);
        std::process::exit(1);
    }
}

/// Builds the relay: TCP when a host is given and reachable, offline
/// otherwise. Connection failure is a degradation, never a crash.
fn build_relay(args: &Args) -> Box<dyn Relay> {
    if args.offline {
        return Box::new(NullRelay);
    }
    let Some(host) = args.host.as_deref() else {
        info!("no server host given; running offline");
        return Box::new(NullRelay);
    };
    let mut relay = duskhold::net::TcpRelay::new();
    match relay.connect(host, args.port) {
        Ok(()) => Box::new(relay),
        Err(err) => {
            warn!("could not reach game server ({}); running offline", err);
            Box::new(NullRelay)
        }
    }
}

fn run(args: &Args) -> DuskholdResult<()> {
    info!("Starting Duskhold v{}", duskhold::VERSION);

    let class = PlayerClass::parse(&args.class).ok_or_else(|| {
        DuskholdError::InvalidAction(format!(
            "unknown class '{}'; pick rogue, knight or wizard",
            args.class
        ))
    })?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("session seed: {}", seed);

    let relay = build_relay(args);
    // The player-record REST service is reached through the same degrade-to-
    // offline seam; stat sync is fire-and-forget either way.
    let records = Box::new(OfflineRecords::new());

    let mut session = GameSession::new(
        &args.name,
        class,
        seed,
        ContentPack::builtin(),
        relay,
        records,
    )?;

    let mut display = TerminalDisplay::new()?;
    let mut messages: Vec<String> = vec![
        "Welcome to Duskhold!".to_string(),
        "Step onto U to enter the dungeon.".to_string(),
    ];

    'game: loop {
        let mut events = session.tick();
        ui::frame::render(&mut display, &session, &messages)?;

        if let Some(key) = display.read_key(Duration::from_millis(config::INPUT_POLL_MS))? {
            match key {
                Key::Escape | Key::Char('q') => {
                    info!("player quit");
                    break 'game;
                }
                Key::Up | Key::Char('w') => events.extend(session.handle_move(Direction::North)?),
                Key::Down | Key::Char('s') => {
                    events.extend(session.handle_move(Direction::South)?)
                }
                Key::Left | Key::Char('a') => events.extend(session.handle_move(Direction::West)?),
                Key::Right | Key::Char('d') => {
                    events.extend(session.handle_move(Direction::East)?)
                }
                Key::Char('k') => ui::menus::skills_menu(&mut display, &mut session)?,
                Key::Char('i') => ui::menus::inventory_menu(&mut display, &mut session)?,
                Key::Char('r') => ui::menus::rankings_menu(&mut display, &mut session)?,
                _ => {}
            }
        }

        for event in events {
            match event {
                SessionEvent::Message(text) => messages.push(text),
                SessionEvent::BattleTriggered(enemy_index) => {
                    let result = match session.battle_context(enemy_index) {
                        Some(mut ctx) => ui::encounter::run_battle(&mut display, &mut ctx)?,
                        None => continue,
                    };
                    for post in session.finish_battle(enemy_index, result) {
                        match post {
                            SessionEvent::Message(text) => messages.push(text),
                            SessionEvent::PlayerDied => {
                                ui::menus::death_screen(&mut display, &session)?;
                                break 'game;
                            }
                            _ => {}
                        }
                    }
                }
                SessionEvent::PlayerDied => {
                    ui::menus::death_screen(&mut display, &session)?;
                    break 'game;
                }
                _ => {}
            }
        }

        let overflow = messages.len().saturating_sub(6);
        if overflow > 0 {
            messages.drain(..overflow);
        }
    }

    info!("game loop ended");
    Ok(())
}
