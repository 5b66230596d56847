/// Entry point: config, logging, login, then the game loop.

mod auth;
mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::io;

use auth::CredentialStore;
use config::GameConfig;
use sim::level::Catalog;
use sim::save::{FileStore, ProgressStore};
use sim::session::{MoveOutcome, Session};
use ui::input::{self, Intent};
use ui::login::{LoginFlow, LoginOutcome};
use ui::renderer::Renderer;

fn main() {
    let config = GameConfig::load();
    let save_dir = config::save_dir(&config);
    init_logging(&config, &save_dir);
    for warning in &config.warnings {
        log::warn!("{warning}");
    }

    let catalog = match Catalog::load(&config) {
        Ok(c) => c,
        Err(e) => {
            log::error!("no playable levels: {e}");
            eprintln!("Cannot start: {e}");
            std::process::exit(1);
        }
    };

    let mut store = FileStore::new(&save_dir);
    let mut creds = CredentialStore::new();
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = run(&mut renderer, catalog, &mut store, &mut creds);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(Some(session)) if session.is_game_complete() => {
            println!("You solved all {} levels. Thanks for playing!", session.level_count());
        }
        Ok(Some(session)) => {
            println!(
                "Thanks for playing! You reached level {} of {}.",
                session.current_level_number() + 1,
                session.level_count(),
            );
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("game aborted: {e}");
            eprintln!("Game error: {e}");
        }
    }
}

/// Send log output to a file: the terminal is in raw mode while playing.
/// `RUST_LOG` overrides the configured level. A log file that cannot be
/// opened leaves logging off.
fn init_logging(config: &GameConfig, save_dir: &std::path::Path) {
    let path = save_dir.join(&config.log.file);
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Logging disabled: cannot open {}: {e}", path.display());
            return;
        }
    };
    let env = env_logger::Env::default().default_filter_or(config.log.level.as_str());
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

/// Login, start the session, restore saved progress, then play.
/// `Ok(None)` when the player quit from the login screen.
fn run(
    renderer: &mut Renderer,
    catalog: Catalog,
    store: &mut dyn ProgressStore,
    creds: &mut CredentialStore,
) -> Result<Option<Session>, Box<dyn std::error::Error>> {
    let user = match login(renderer, creds, catalog.name())? {
        LoginOutcome::Quit => return Ok(None),
        LoginOutcome::Guest => None,
        LoginOutcome::User(id) => Some(id),
    };

    let mut session = Session::new(catalog, user)?;
    let mut message = String::new();
    if session.user().is_some() {
        if session.request_load(store)? {
            message = format!("Welcome back! Resuming level {}.", session.current_level_number() + 1);
        }
    } else {
        message = "Playing as guest: progress cannot be saved.".to_string();
    }

    game_loop(renderer, &mut session, store, message)?;
    Ok(Some(session))
}

fn login(
    renderer: &mut Renderer,
    creds: &mut CredentialStore,
    catalog_name: &str,
) -> io::Result<LoginOutcome> {
    let mut flow = LoginFlow::new();
    loop {
        renderer.render_login(&flow, catalog_name)?;
        if let Some(key) = input::next_key()? {
            if let Some(outcome) = flow.handle_key(&key, creds) {
                return Ok(outcome);
            }
        }
    }
}

fn game_loop(
    renderer: &mut Renderer,
    session: &mut Session,
    store: &mut dyn ProgressStore,
    mut message: String,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        renderer.render_game(session, &message)?;

        let Some(key) = input::next_key()? else {
            continue;
        };
        // Congratulation screen: any key exits.
        if session.is_game_complete() {
            return Ok(());
        }
        let Some(intent) = input::intent_for(&key) else {
            continue;
        };

        match intent {
            Intent::Quit => return Ok(()),
            Intent::Move(dir) => match session.try_move(dir) {
                MoveOutcome::Moved => message.clear(),
                MoveOutcome::Blocked => {}
                MoveOutcome::LevelComplete => {
                    message = format!(
                        "Level solved! On to level {}: {}",
                        session.current_level_number() + 1,
                        session.level_name(),
                    );
                    renderer.invalidate()?;
                }
                MoveOutcome::GameComplete => renderer.invalidate()?,
            },
            Intent::Restart => {
                session.restart_level()?;
                message = "Level restarted.".to_string();
            }
            Intent::Save => {
                message = match session.request_save(store) {
                    Ok(()) => format!("Progress saved at level {}.", session.current_level_number() + 1),
                    Err(e) => {
                        log::warn!("save failed: {e}");
                        e.to_string()
                    }
                };
            }
            Intent::Load => {
                message = if session.user().is_none() {
                    "Log in to load saved progress.".to_string()
                } else if session.request_load(store)? {
                    renderer.invalidate()?;
                    format!("Progress loaded: level {}.", session.current_level_number() + 1)
                } else {
                    "No saved progress found.".to_string()
                };
            }
        }
    }
}
