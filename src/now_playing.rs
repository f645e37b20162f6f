use std::{sync::mpsc::Sender, thread};

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap},
};
use tracing::{debug, warn};

use crate::app::Message;
use crate::controls::{MuteIcon, PlayIcon};
use crate::error::Result;
use crate::remote::Remote;
use crate::theme::Theme;

pub const ART_ROWS: u16 = 8;
pub const ART_COLS: u16 = ART_ROWS * 2; // 2 cols per row for square aspect

// Album art pixel grid: rows of (R, G, B) tuples
pub type ArtPixels = Vec<Vec<(u8, u8, u8)>>;

pub fn decode_art(bytes: &[u8], cols: u16, rows: u16) -> Result<ArtPixels> {
    let img = image::load_from_memory(bytes)?;
    let px_w = cols as u32;
    let px_h = (rows as u32) * 2; // half-block = 2 pixels per row
    let resized = img.resize_exact(px_w, px_h, image::imageops::FilterType::Lanczos3);
    let rgb = resized.to_rgb8();
    let mut pixels = Vec::with_capacity(px_h as usize);
    for y in 0..px_h {
        let mut row = Vec::with_capacity(px_w as usize);
        for x in 0..px_w {
            let p = rgb.get_pixel(x, y);
            row.push((p[0], p[1], p[2]));
        }
        pixels.push(row);
    }
    Ok(pixels)
}

/// Download and decode a cover image, reporting back as a message. A missing
/// or undecodable image counts as a load error.
pub fn spawn_art_fetch(remote: Remote, path: String, tx: Sender<Message>) {
    thread::spawn(move || {
        let result = remote
            .fetch_bytes(&path)
            .and_then(|bytes| decode_art(&bytes, ART_COLS, ART_ROWS));
        let msg = match result {
            Ok(pixels) => Message::CoverLoaded { path, pixels },
            Err(e) => {
                debug!(%path, "cover unavailable: {e}");
                Message::CoverFailed { path }
            }
        };
        let _ = tx.send(msg);
    });
}

/// Cover image slot with a single fallback to the default image.
#[derive(Debug)]
pub struct CoverArt {
    src: String,
    fallback: String,
    fallback_armed: bool,
    pixels: Option<ArtPixels>,
}

impl CoverArt {
    pub fn new(fallback: String) -> Self {
        CoverArt {
            src: String::new(),
            fallback,
            fallback_armed: false,
            pixels: None,
        }
    }

    pub fn pixels(&self) -> Option<&ArtPixels> {
        self.pixels.as_ref()
    }

    /// Point at a new image; returns the path to fetch.
    pub fn set_src(&mut self, path: String) -> String {
        self.src = path.clone();
        self.fallback_armed = true;
        self.pixels = None;
        path
    }

    /// Stale results for a previous source are dropped.
    pub fn on_load(&mut self, path: &str, pixels: ArtPixels) {
        if path == self.src {
            self.pixels = Some(pixels);
        }
    }

    /// On the first failure switch to the default image and return it for
    /// fetching. Later failures are final.
    pub fn on_error(&mut self, path: &str) -> Option<String> {
        if path != self.src || !self.fallback_armed {
            return None;
        }
        self.fallback_armed = false;
        warn!(%path, fallback = %self.fallback, "cover failed, using default");
        self.src = self.fallback.clone();
        Some(self.src.clone())
    }
}

struct AlbumArtWidget<'a> {
    pixels: &'a [Vec<(u8, u8, u8)>],
}

impl<'a> AlbumArtWidget<'a> {
    fn new(pixels: &'a [Vec<(u8, u8, u8)>]) -> Self {
        AlbumArtWidget { pixels }
    }
}

impl Widget for AlbumArtWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let pixel_rows = self.pixels.len();
        let art_rows = pixel_rows / 2;
        let art_cols = self.pixels.first().map(|r| r.len()).unwrap_or(0);
        let rows = (area.height as usize).min(art_rows);
        let cols = (area.width as usize).min(art_cols);
        for cy in 0..rows {
            let top_y = cy * 2;
            let bot_y = top_y + 1;
            for cx in 0..cols {
                let top = self.pixels[top_y][cx];
                let bot = self.pixels.get(bot_y).map(|r| r[cx]).unwrap_or(top);
                let x = area.x + cx as u16;
                let y = area.y + cy as u16;
                buf[(x, y)]
                    .set_char('▀')
                    .set_fg(Color::Rgb(top.0, top.1, top.2))
                    .set_bg(Color::Rgb(bot.0, bot.1, bot.2));
            }
        }
    }
}

/// What the header shows about the loaded track.
pub struct NowPlaying<'a> {
    pub title: Option<&'a str>,
    pub paused: bool,
    pub play_icon: PlayIcon,
    pub mute_icon: MuteIcon,
    pub shuffle: bool,
    pub repeat: bool,
    pub track_pos: Option<(usize, usize)>,
    pub art: Option<&'a ArtPixels>,
}

fn flag_span(label: &str, on: bool, theme: &Theme) -> Span<'static> {
    let state = if on { "On" } else { "Off" };
    let fg = if on { theme.accent } else { theme.dimmed };
    Span::styled(format!("{label}: {state}  "), Style::default().fg(fg))
}

pub fn draw_now_playing(frame: &mut Frame, area: Rect, info: &NowPlaying, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Now Playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [art_area, text_area] =
        Layout::horizontal([Constraint::Length(ART_COLS + 1), Constraint::Min(10)]).areas(inner);

    // Placeholder keeps the layout steady while the image loads
    match info.art {
        Some(pixels) => frame.render_widget(AlbumArtWidget::new(pixels), art_area),
        None => {
            let bg = Block::default().style(Style::default().bg(theme.base));
            let w = art_area.width.saturating_sub(1).min(ART_COLS);
            let h = art_area.height.min(ART_ROWS);
            frame.render_widget(bg, Rect::new(art_area.x, art_area.y, w, h));
        }
    }

    let status = if info.paused { "Paused" } else { "Playing" };
    let mut title_spans = vec![
        Span::styled(
            format!(" {} {status} ", info.play_icon.glyph()),
            Style::default().fg(Color::Black).bg(theme.accent),
        ),
        Span::raw("  "),
        Span::styled(info.title.unwrap_or("—"), Style::default().fg(theme.text)),
    ];
    if let Some((cur, total)) = info.track_pos {
        title_spans.push(Span::styled(
            format!("  {cur}/{total}"),
            Style::default().fg(theme.dimmed),
        ));
    }

    let lines = vec![
        Line::from(title_spans),
        Line::raw(""),
        Line::from(vec![
            flag_span("Shuffle", info.shuffle, theme),
            flag_span("Repeat", info.repeat, theme),
            Span::styled(info.mute_icon.glyph(), Style::default().fg(theme.secondary)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), text_area);
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    #[test]
    fn fallback_is_one_shot() {
        let mut cover = CoverArt::new("/static/images/default.jpg".into());
        let path = cover.set_src("/static/images/a.jpg".into());
        assert_eq!(path, "/static/images/a.jpg");

        let fallback = cover.on_error("/static/images/a.jpg");
        assert_eq!(fallback.as_deref(), Some("/static/images/default.jpg"));

        // The default image failing too is final
        assert_eq!(cover.on_error("/static/images/default.jpg"), None);
        cover.on_load("/static/images/default.jpg", vec![vec![(0, 0, 0)]]);
        assert!(cover.pixels().is_some());
    }

    #[test]
    fn new_source_rearms_fallback() {
        let mut cover = CoverArt::new("/d.jpg".into());
        cover.set_src("/a.jpg".into());
        cover.on_error("/a.jpg");
        cover.set_src("/b.jpg".into());
        assert_eq!(cover.on_error("/b.jpg").as_deref(), Some("/d.jpg"));
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut cover = CoverArt::new("/d.jpg".into());
        cover.set_src("/a.jpg".into());
        cover.set_src("/b.jpg".into());
        assert_eq!(cover.on_error("/a.jpg"), None);
        cover.on_load("/a.jpg", vec![vec![(1, 2, 3)]]);
        assert!(cover.pixels().is_none());
        cover.on_load("/b.jpg", vec![vec![(1, 2, 3)]]);
        assert!(cover.pixels().is_some());
    }

    #[test]
    fn decode_resizes_to_art_grid() {
        let img = RgbImage::from_pixel(40, 40, Rgb([200, 10, 10]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        let pixels = decode_art(&bytes, ART_COLS, ART_ROWS).unwrap();
        assert_eq!(pixels.len(), (ART_ROWS * 2) as usize);
        assert_eq!(pixels[0].len(), ART_COLS as usize);
        let (r, _, _) = pixels[3][3];
        assert!(r > 150);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(decode_art(b"not an image", ART_COLS, ART_ROWS).is_err());
    }
}
