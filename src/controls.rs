use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::theme::Theme;

pub const SEEK_STEP_SECS: f64 = 5.0;
pub const VOLUME_STEP: f32 = 0.05;
const STATUS_TTL: Duration = Duration::from_secs(3);

/// User intents produced by the control surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    PlayPause,
    SeekBy(f64),
    /// Slider position and slider range, as a click on the seek bar reports them
    SeekTo { value: f64, max: f64 },
    SetVolume(f32),
    VolumeBy(f32),
    ToggleMute,
    ToggleShuffle,
    ToggleRepeat,
    Next,
    Prev,
    CursorUp,
    CursorDown,
    PlaySelected,
    PlayIndex(usize),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayIcon {
    Play,
    Pause,
}

impl PlayIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            PlayIcon::Play => "▶",
            PlayIcon::Pause => "⏸",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteIcon {
    Unmuted,
    Muted,
}

impl MuteIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            MuteIcon::Unmuted => "🔊",
            MuteIcon::Muted => "🔇",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            MuteIcon::Unmuted => MuteIcon::Muted,
            MuteIcon::Muted => MuteIcon::Unmuted,
        }
    }
}

/// Transient announcement shown in the controls panel.
#[derive(Debug, Clone)]
pub struct Status {
    pub text: String,
    expires: Instant,
}

impl Status {
    pub fn new(text: String, now: Instant) -> Self {
        Status {
            text,
            expires: now + STATUS_TTL,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires
    }
}

pub fn flag_announcement(name: &str, on: bool) -> String {
    format!("{name}: {}", if on { "On" } else { "Off" })
}

pub fn key_action(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char(' ') => Action::PlayPause,
        KeyCode::Right => Action::SeekBy(SEEK_STEP_SECS),
        KeyCode::Left => Action::SeekBy(-SEEK_STEP_SECS),
        KeyCode::Up => Action::VolumeBy(VOLUME_STEP),
        KeyCode::Down => Action::VolumeBy(-VOLUME_STEP),
        KeyCode::Char('0') => Action::SetVolume(1.0),
        KeyCode::Char(c @ '1'..='9') => Action::SetVolume((c as u8 - b'0') as f32 / 10.0),
        KeyCode::Char('m') => Action::ToggleMute,
        KeyCode::Char('s') => Action::ToggleShuffle,
        KeyCode::Char('r') => Action::ToggleRepeat,
        KeyCode::Char('n') => Action::Next,
        KeyCode::Char('p') => Action::Prev,
        KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Enter => Action::PlaySelected,
        _ => return None,
    };
    Some(action)
}

fn build_control_spans(theme: &Theme) -> Vec<Span<'static>> {
    let key_style = Style::default().fg(Color::Black).bg(theme.secondary);
    vec![
        Span::styled(" Space ", key_style),
        Span::raw(" Play/Pause  "),
        Span::styled(" ←/→ ", key_style),
        Span::raw(" Seek ±5s  "),
        Span::styled(" ↑/↓ 0-9 ", key_style),
        Span::raw(" Volume  "),
        Span::styled(" m ", key_style),
        Span::raw(" Mute  "),
        Span::styled(" n/p ", key_style),
        Span::raw(" Next/Prev  "),
        Span::styled(" s ", key_style),
        Span::raw(" Shuffle  "),
        Span::styled(" r ", key_style),
        Span::raw(" Repeat  "),
        Span::styled(" j/k Enter ", key_style),
        Span::raw(" Playlist  "),
        Span::styled(" q ", key_style),
        Span::raw(" Quit"),
    ]
}

/// Wrap spans into lines, breaking at group boundaries (every 2 spans = key + label).
fn wrap_lines(spans: Vec<Span<'static>>, inner_w: usize) -> Vec<Line<'static>> {
    if inner_w == 0 {
        return vec![Line::from(spans)];
    }
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_w: usize = 0;
    for chunk in spans.chunks(2) {
        let group_w: usize = Line::from(chunk.to_vec()).width();
        if current_w + group_w > inner_w && current_w > 0 {
            lines.push(Line::from(std::mem::take(&mut current)));
            current_w = 0;
        }
        current.extend(chunk.iter().cloned());
        current_w += group_w;
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

pub fn controls_height(width: u16, theme: &Theme) -> u16 {
    let inner_w = width.saturating_sub(2) as usize;
    let lines = wrap_lines(build_control_spans(theme), inner_w);
    lines.len() as u16 + 2 // +2 for borders
}

pub fn draw_controls(frame: &mut Frame, area: Rect, status: Option<&Status>, theme: &Theme) {
    let inner_w = area.width.saturating_sub(2) as usize;
    let lines = wrap_lines(build_control_spans(theme), inner_w);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Controls ");
    if let Some(status) = status {
        block = block.title(
            Line::from(Span::styled(
                format!(" {} ", status.text),
                Style::default().fg(Color::Black).bg(theme.accent),
            ))
            .right_aligned(),
        );
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(key_action(press(KeyCode::Char(' '))), Some(Action::PlayPause));
        assert_eq!(key_action(press(KeyCode::Left)), Some(Action::SeekBy(-5.0)));
        assert_eq!(key_action(press(KeyCode::Char('3'))), Some(Action::SetVolume(0.3)));
        assert_eq!(key_action(press(KeyCode::Char('0'))), Some(Action::SetVolume(1.0)));
        assert_eq!(key_action(press(KeyCode::Char('x'))), None);
        assert_eq!(
            key_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
    }

    #[test]
    fn releases_are_ignored() {
        let mut key = press(KeyCode::Char(' '));
        key.kind = KeyEventKind::Release;
        assert_eq!(key_action(key), None);
    }

    #[test]
    fn mute_icon_toggles_back() {
        let icon = MuteIcon::Unmuted;
        assert_eq!(icon.toggled().toggled(), icon);
        assert_eq!(icon.toggled().glyph(), "🔇");
    }

    #[test]
    fn status_expires() {
        let now = Instant::now();
        let status = Status::new(flag_announcement("Shuffle", true), now);
        assert_eq!(status.text, "Shuffle: On");
        assert!(!status.is_expired(now + Duration::from_secs(1)));
        assert!(status.is_expired(now + STATUS_TTL));
    }

    #[test]
    fn controls_wrap_on_narrow_terminals() {
        assert_eq!(controls_height(400, &crate::theme::THEME), 3);
        assert!(controls_height(40, &crate::theme::THEME) > 3);
    }
}
