use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Block, BorderType, Borders},
};

use crate::controls::MuteIcon;
use crate::gauge::RoundedGauge;
use crate::theme::Theme;

pub fn volume_label(volume: f32, icon: MuteIcon) -> String {
    match icon {
        MuteIcon::Muted => format!("{} muted", icon.glyph()),
        MuteIcon::Unmuted => format!("{} {}%", icon.glyph(), (volume * 100.0).round() as u16),
    }
}

pub fn draw_volume(frame: &mut Frame, area: Rect, volume: f32, icon: MuteIcon, theme: &Theme) {
    let color = match icon {
        MuteIcon::Muted => theme.dimmed,
        MuteIcon::Unmuted => theme.positive,
    };
    let vol_gauge = RoundedGauge::new(volume as f64, String::new(), color)
        .dimmed_color(theme.dimmed)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(" Volume ")
                .title(Line::from(format!(" {} ", volume_label(volume, icon))).alignment(Alignment::Right)),
        );
    frame.render_widget(vol_gauge, area);
}
