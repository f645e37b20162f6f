use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
};

use crate::theme::Theme;

/// Cursor over the playlist panel. The cursor is independent of the
/// playing track until an entry is activated.
#[derive(Debug, Default)]
pub struct PlaylistView {
    pub state: ListState,
    len: usize,
}

impl PlaylistView {
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.state = ListState::default();
        if len > 0 {
            self.state.select(Some(0));
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected().filter(|&i| i < self.len)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.len {
            self.state.select(Some(index));
        }
    }

    pub fn cursor_down(&mut self) {
        if self.len == 0 {
            return;
        }
        let next = self.selected().map(|i| (i + 1).min(self.len - 1)).unwrap_or(0);
        self.state.select(Some(next));
    }

    pub fn cursor_up(&mut self) {
        if self.len == 0 {
            return;
        }
        let prev = self.selected().map(|i| i.saturating_sub(1)).unwrap_or(0);
        self.state.select(Some(prev));
    }

    /// Map a clicked terminal row inside the list's inner area to an entry.
    pub fn row_at(&self, inner: Rect, column: u16, row: u16) -> Option<usize> {
        if !inner.contains((column, row).into()) {
            return None;
        }
        let index = self.state.offset() + (row - inner.y) as usize;
        (index < self.len).then_some(index)
    }
}

pub fn draw_playlist(
    frame: &mut Frame,
    area: Rect,
    songs: &[String],
    current: Option<usize>,
    view: &mut PlaylistView,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Playlist ")
        .title_bottom(Line::from(format!(" {} songs ", songs.len())).right_aligned());

    if songs.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " No songs",
            Style::default().fg(theme.dimmed),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = songs
        .iter()
        .enumerate()
        .map(|(i, song)| {
            if Some(i) == current {
                ListItem::new(Line::from(vec![
                    Span::styled("♪ ", Style::default().fg(theme.accent)),
                    Span::styled(song.as_str(), Style::default().fg(theme.accent)),
                ]))
            } else {
                ListItem::new(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(song.as_str(), Style::default().fg(theme.text)),
                ]))
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(list, area, &mut view.state);
}

#[cfg(test)]
mod tests {
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::theme::THEME;

    #[test]
    fn cursor_is_clamped() {
        let mut view = PlaylistView::default();
        view.reset(3);
        view.cursor_up();
        assert_eq!(view.selected(), Some(0));
        view.cursor_down();
        view.cursor_down();
        view.cursor_down();
        assert_eq!(view.selected(), Some(2));
    }

    #[test]
    fn empty_playlist_has_no_selection() {
        let mut view = PlaylistView::default();
        view.reset(0);
        view.cursor_down();
        assert_eq!(view.selected(), None);
        assert_eq!(view.row_at(Rect::new(1, 1, 10, 5), 2, 2), None);
    }

    #[test]
    fn click_maps_to_row() {
        let mut view = PlaylistView::default();
        view.reset(3);
        let inner = Rect::new(1, 1, 20, 10);
        assert_eq!(view.row_at(inner, 5, 1), Some(0));
        assert_eq!(view.row_at(inner, 5, 3), Some(2));
        assert_eq!(view.row_at(inner, 5, 4), None);
        assert_eq!(view.row_at(inner, 0, 1), None);
    }

    #[test]
    fn renders_one_row_per_song() {
        let backend = TestBackend::new(24, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        let songs = vec!["a.mp3".to_string(), "b.mp3".to_string()];
        let mut view = PlaylistView::default();
        view.reset(songs.len());
        terminal
            .draw(|f| draw_playlist(f, f.area(), &songs, Some(1), &mut view, &THEME))
            .unwrap();
        let buf = terminal.backend().buffer();
        let line = |y: u16| -> String { (0..24).map(|x| buf[(x, y)].symbol().to_string()).collect() };
        assert!(line(1).contains("a.mp3"));
        assert!(line(2).contains("♪ b.mp3"));
    }
}
