use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::{Block, Widget},
};

/// One-row slider drawn with light/heavy box rules.
pub struct RoundedGauge<'a> {
    ratio: f64,
    label: String,
    filled_color: Color,
    dimmed_color: Color,
    block: Option<Block<'a>>,
}

impl<'a> RoundedGauge<'a> {
    pub fn new(ratio: f64, label: String, filled_color: Color) -> Self {
        RoundedGauge {
            ratio: if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) },
            label,
            filled_color,
            dimmed_color: Color::DarkGray,
            block: None,
        }
    }

    pub fn dimmed_color(mut self, color: Color) -> Self {
        self.dimmed_color = color;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for RoundedGauge<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if inner.width < 2 || inner.height == 0 {
            return;
        }

        let width = inner.width as usize;
        let filled = (self.ratio * width as f64).round() as usize;
        let dim = self.dimmed_color;
        let y = inner.y;

        for col in 0..width {
            let x = inner.x + col as u16;
            let (ch, fg) = if filled == 0 {
                if col == 0 {
                    ('╶', dim)
                } else if col == width - 1 {
                    ('╴', dim)
                } else {
                    ('─', dim)
                }
            } else if col < filled {
                if col == 0 {
                    ('╺', self.filled_color)
                } else if col == filled - 1 && filled < width {
                    ('╸', self.filled_color)
                } else {
                    ('━', self.filled_color)
                }
            } else if col == width - 1 {
                ('╴', dim)
            } else {
                ('─', dim)
            };

            buf[(x, y)].set_char(ch).set_fg(fg).set_bg(Color::Reset);
        }

        let label_len = self.label.chars().count();
        if label_len > 0 && label_len <= width {
            let start = inner.x + (width - label_len) as u16 / 2;
            for (i, ch) in self.label.chars().enumerate() {
                let x = start + i as u16;
                let col = (x - inner.x) as usize;
                let fg = if col < filled { Color::White } else { Color::Gray };
                buf[(x, y)].set_char(ch).set_fg(fg).set_bg(Color::Reset);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, width: u16) -> String {
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn empty_and_full() {
        let area = Rect::new(0, 0, 6, 1);
        let mut buf = Buffer::empty(area);
        RoundedGauge::new(0.0, String::new(), Color::Green).render(area, &mut buf);
        assert_eq!(row(&buf, 6), "╶────╴");

        let mut buf = Buffer::empty(area);
        RoundedGauge::new(1.0, String::new(), Color::Green).render(area, &mut buf);
        assert_eq!(row(&buf, 6), "╺━━━━━");
    }

    #[test]
    fn half_filled_with_label() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        RoundedGauge::new(0.5, "ab".into(), Color::Green).render(area, &mut buf);
        assert_eq!(row(&buf, 10), "╺━━━ab───╴");
        assert_eq!(buf[(1, 0)].fg, Color::Green);
        assert_eq!(buf[(8, 0)].fg, Color::DarkGray);
    }
}
