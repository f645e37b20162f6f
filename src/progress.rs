use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Block, BorderType, Borders},
};

use crate::binding::SeekBar;
use crate::gauge::RoundedGauge;
use crate::theme::Theme;

pub fn progress_label(seek: &SeekBar) -> String {
    format!("{} / {}", seek.current_label, seek.duration_label)
}

pub fn draw_progress(frame: &mut Frame, area: Rect, seek: &SeekBar, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Progress ")
        .title(Line::from(format!(" {} ", progress_label(seek))).alignment(Alignment::Right));

    let gauge = RoundedGauge::new(seek.ratio(), String::new(), theme.accent)
        .dimmed_color(theme.dimmed)
        .block(block);
    frame.render_widget(gauge, area);
}
