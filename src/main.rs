mod app;
mod binding;
mod config;
mod controls;
mod error;
mod gauge;
mod media;
mod now_playing;
mod playlist;
mod progress;
mod remote;
mod theme;
mod track;
mod visualizer;
mod volume;

use std::{
    fs, io,
    sync::{
        Mutex,
        mpsc::{self, Receiver, Sender},
    },
    time::Instant,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
};
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{App, Effect, Message};
use crate::config::{Args, Config};
use crate::media::{MediaElement, RodioElement};
use crate::now_playing::spawn_art_fetch;
use crate::remote::{Remote, spawn_song_fetch};

fn init_logging(config: &Config) -> Result<()> {
    let file = fs::File::create(&config.log_file)
        .with_context(|| format!("cannot create log file {}", config.log_file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let config = Config::from_args(Args::parse());
    init_logging(&config)?;
    info!(server = %config.server, "starting");

    let remote = Remote::new(&config.server);
    let media = RodioElement::new(remote.clone()).context("failed to open audio output")?;
    let mut app = App::new(media, &config.images_dir, config.default_image());

    let mut terminal = ratatui::try_init().context("failed to initialise terminal")?;
    let (tx, rx) = mpsc::channel();
    let result = execute!(io::stdout(), EnableMouseCapture)
        .map_err(anyhow::Error::from)
        .and_then(|()| run(&mut terminal, &mut app, &config, &remote, tx, rx));
    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();
    info!("exiting");
    result
}

fn execute_effect(effect: Effect, remote: &Remote, tx: &Sender<Message>) {
    match effect {
        Effect::FetchSongs => spawn_song_fetch(remote.clone(), tx.clone()),
        Effect::FetchCover(path) => spawn_art_fetch(remote.clone(), path, tx.clone()),
    }
}

fn run<M: MediaElement>(
    terminal: &mut DefaultTerminal,
    app: &mut App<M>,
    config: &Config,
    remote: &Remote,
    tx: Sender<Message>,
    rx: Receiver<Message>,
) -> Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| app.draw(f))?;

        let timeout = config.tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Some(msg) = Message::from_terminal(event::read()?) {
                app.handle(msg);
            }
        }

        while let Ok(msg) = rx.try_recv() {
            app.handle(msg);
        }

        if last_tick.elapsed() >= config.tick_rate {
            app.handle(Message::Tick);
            last_tick = Instant::now();
        }

        for effect in app.take_effects() {
            execute_effect(effect, remote, &tx);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
