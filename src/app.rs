use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use rand::{Rng, SeedableRng, rngs::StdRng};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    widgets::{Block, Borders},
};
use tracing::{debug, error, info};

use crate::binding::{SeekBar, seek_target};
use crate::controls::{
    self, Action, MuteIcon, PlayIcon, Status, draw_controls, flag_announcement, key_action,
};
use crate::media::{MediaElement, MediaEvent};
use crate::now_playing::{ART_ROWS, ArtPixels, CoverArt, NowPlaying, draw_now_playing};
use crate::playlist::{PlaylistView, draw_playlist};
use crate::progress::draw_progress;
use crate::theme::{THEME, Theme};
use crate::track::{EndedAction, PlayerState};
use crate::visualizer::{AnalysisGraph, DrawTask, draw_visualizer};
use crate::volume::draw_volume;

/// Everything the app reacts to. Handled one at a time, to completion.
#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    SongsLoaded(Vec<String>),
    CoverLoaded { path: String, pixels: ArtPixels },
    CoverFailed { path: String },
}

impl Message {
    pub fn from_terminal(event: Event) -> Option<Message> {
        match event {
            Event::Key(key) => Some(Message::Key(key)),
            Event::Mouse(mouse) => Some(Message::Mouse(mouse)),
            Event::Resize(w, h) => Some(Message::Resize(w, h)),
            _ => None,
        }
    }
}

/// I/O requested by a handler, run by the event loop after the handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchSongs,
    FetchCover(String),
}

/// Screen regions from the last draw, used to route mouse clicks.
#[derive(Debug, Default, Clone, Copy)]
pub struct UiLayout {
    pub playlist: Rect,
    pub progress: Rect,
    pub volume: Rect,
}

pub struct App<M: MediaElement, R: Rng = StdRng> {
    pub state: PlayerState,
    pub media: M,
    pub playlist: PlaylistView,
    pub seek: SeekBar,
    pub graph: AnalysisGraph,
    pub draw_task: DrawTask,
    pub cover: CoverArt,
    pub play_icon: PlayIcon,
    pub mute_icon: MuteIcon,
    pub status: Option<Status>,
    pub layout: UiLayout,
    pub should_quit: bool,
    effects: Vec<Effect>,
    rng: R,
    theme: &'static Theme,
}

impl<M: MediaElement> App<M> {
    pub fn new(media: M, images_dir: &str, default_image: String) -> Self {
        App::with_rng(media, images_dir, default_image, StdRng::from_os_rng())
    }
}

impl<M: MediaElement, R: Rng> App<M, R> {
    pub fn with_rng(media: M, images_dir: &str, default_image: String, rng: R) -> Self {
        App {
            state: PlayerState::new(images_dir),
            media,
            playlist: PlaylistView::default(),
            seek: SeekBar::default(),
            graph: AnalysisGraph::Uninitialized,
            draw_task: DrawTask::default(),
            cover: CoverArt::new(default_image),
            play_icon: PlayIcon::Play,
            mute_icon: MuteIcon::Unmuted,
            status: None,
            layout: UiLayout::default(),
            should_quit: false,
            // The song list is requested as soon as the app exists
            effects: vec![Effect::FetchSongs],
            rng,
            theme: &THEME,
        }
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn handle(&mut self, msg: Message) {
        match msg {
            Message::Tick => self.on_tick(Instant::now()),
            Message::Key(key) => {
                if let Some(action) = key_action(key) {
                    self.apply(action);
                }
            }
            Message::Mouse(mouse) => {
                if let Some(action) = self.mouse_action(mouse) {
                    self.apply(action);
                }
            }
            Message::Resize(w, h) => debug!(w, h, "resize"),
            Message::SongsLoaded(songs) => self.on_songs_loaded(songs),
            Message::CoverLoaded { path, pixels } => self.cover.on_load(&path, pixels),
            Message::CoverFailed { path } => {
                if let Some(fallback) = self.cover.on_error(&path) {
                    self.effects.push(Effect::FetchCover(fallback));
                }
            }
        }
    }

    fn on_tick(&mut self, now: Instant) {
        for event in self.media.poll_events() {
            self.on_media_event(event);
        }
        self.draw_task.tick(&mut self.graph);
        if self.status.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.status = None;
        }
    }

    fn on_songs_loaded(&mut self, songs: Vec<String>) {
        self.state.replace_songs(songs);
        self.playlist.reset(self.state.len());
        if !self.state.is_empty() {
            self.load_track(0);
        }
    }

    pub fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Play => {
                if self.graph.ensure_attached(&self.media.samples()) {
                    debug!("visualizer started");
                }
                self.draw_task.start();
            }
            MediaEvent::Pause => {
                self.draw_task.stop();
                debug!(frames = self.draw_task.frames(), "visualizer stopped");
            }
            MediaEvent::TimeUpdate => {
                self.seek
                    .on_time_update(self.media.current_time(), self.media.duration());
            }
            MediaEvent::LoadedMetadata => self.seek.on_loaded_metadata(self.media.duration()),
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::Error => {
                error!(src = %self.media.src(), "playback failed");
                self.play_icon = PlayIcon::Play;
                self.draw_task.stop();
            }
        }
    }

    fn on_ended(&mut self) {
        match self.state.on_ended(&mut self.rng) {
            Some(EndedAction::Restart) => {
                self.media.set_current_time(Duration::ZERO);
                self.media.play();
            }
            Some(EndedAction::Play(index)) => self.play_index(index),
            None => {}
        }
    }

    /// Point the media element and cover at `index` without starting playback.
    pub fn load_track(&mut self, index: usize) {
        let Some(track) = self.state.load_track(index) else {
            return;
        };
        info!(index, title = %track.title, "load track");
        self.media.set_src(&track.audio_path);
        self.play_icon = PlayIcon::Pause;
        self.seek.reset();
        let cover = self.cover.set_src(track.cover_path);
        self.effects.push(Effect::FetchCover(cover));
    }

    fn play_index(&mut self, index: usize) {
        if index >= self.state.len() {
            return;
        }
        self.load_track(index);
        self.playlist.select(index);
        self.media.play();
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::PlayPause => self.play_pause(),
            Action::SeekBy(delta) => {
                let value = (self.seek.value + delta).clamp(0.0, self.seek.max);
                self.seek_to(value, self.seek.max);
            }
            Action::SeekTo { value, max } => self.seek_to(value, max),
            Action::SetVolume(v) => self.set_volume(v),
            Action::VolumeBy(step) => self.set_volume(self.state.volume() + step),
            Action::ToggleMute => self.toggle_mute(),
            Action::ToggleShuffle => {
                self.state.shuffle = !self.state.shuffle;
                self.announce(flag_announcement("Shuffle", self.state.shuffle));
            }
            Action::ToggleRepeat => {
                self.state.repeat = !self.state.repeat;
                self.announce(flag_announcement("Repeat", self.state.repeat));
            }
            Action::Next => {
                if let Some(index) = self.state.next_index() {
                    self.play_index(index);
                }
            }
            Action::Prev => {
                if let Some(index) = self.state.prev_index() {
                    self.play_index(index);
                }
            }
            Action::CursorUp => self.playlist.cursor_up(),
            Action::CursorDown => self.playlist.cursor_down(),
            Action::PlaySelected => {
                if let Some(index) = self.playlist.selected() {
                    self.play_index(index);
                }
            }
            Action::PlayIndex(index) => self.play_index(index),
        }
    }

    fn play_pause(&mut self) {
        if self.state.is_empty() {
            return;
        }
        if self.media.paused() {
            self.media.play();
            self.play_icon = PlayIcon::Pause;
        } else {
            self.media.pause();
            self.play_icon = PlayIcon::Play;
        }
    }

    fn seek_to(&mut self, value: f64, max: f64) {
        let duration = self.media.duration();
        if let Some(target) = seek_target(value, max, duration) {
            self.media.set_current_time(target);
            self.seek.on_time_update(target, duration);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        let v = self.state.set_volume(volume);
        self.media.set_volume(v);
    }

    fn toggle_mute(&mut self) {
        self.state.muted = !self.media.muted();
        self.media.set_muted(self.state.muted);
        self.mute_icon = self.mute_icon.toggled();
    }

    fn announce(&mut self, text: String) {
        info!("{text}");
        self.status = Some(Status::new(text, Instant::now()));
    }

    fn mouse_action(&self, mouse: MouseEvent) -> Option<Action> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }
        let (col, row) = (mouse.column, mouse.row);
        let hit = |r: Rect| r.width > 0 && r.contains((col, row).into());

        if let Some(index) = self.playlist.row_at(self.layout.playlist, col, row) {
            return Some(Action::PlayIndex(index));
        }
        if hit(self.layout.progress) {
            let r = self.layout.progress;
            let value = (col - r.x) as f64 + 0.5;
            return Some(Action::SeekTo { value, max: r.width as f64 });
        }
        if hit(self.layout.volume) {
            let r = self.layout.volume;
            let value = ((col - r.x + 1) as f32 / r.width as f32).clamp(0.0, 1.0);
            return Some(Action::SetVolume(value));
        }
        None
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let theme = self.theme;
        let controls_h = controls::controls_height(frame.area().width, theme);
        let [main, progress, volume, controls_area] = Layout::vertical([
            Constraint::Min(ART_ROWS + 4),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(controls_h),
        ])
        .areas(frame.area());
        let [playlist_area, right] =
            Layout::horizontal([Constraint::Percentage(35), Constraint::Min(24)]).areas(main);
        let [header, vis_area] =
            Layout::vertical([Constraint::Length(ART_ROWS + 2), Constraint::Min(3)]).areas(right);

        let inner = |r: Rect| Block::default().borders(Borders::ALL).inner(r);
        self.layout = UiLayout {
            playlist: inner(playlist_area),
            progress: inner(progress),
            volume: inner(volume),
        };

        let current = (!self.state.is_empty()).then(|| self.state.current());
        draw_playlist(
            frame,
            playlist_area,
            self.state.songs(),
            current,
            &mut self.playlist,
            theme,
        );

        let info = NowPlaying {
            title: self.state.current_song(),
            paused: self.media.paused(),
            play_icon: self.play_icon,
            mute_icon: self.mute_icon,
            shuffle: self.state.shuffle,
            repeat: self.state.repeat,
            track_pos: current.map(|i| (i + 1, self.state.len())),
            art: self.cover.pixels(),
        };
        draw_now_playing(frame, header, &info, theme);
        draw_visualizer(frame, vis_area, &self.graph, &self.draw_task, theme);
        draw_progress(frame, progress, &self.seek, theme);
        draw_volume(frame, volume, self.state.volume(), self.mute_icon, theme);
        draw_controls(frame, controls_area, self.status.as_ref(), theme);
    }
}
