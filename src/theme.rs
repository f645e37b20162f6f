use ratatui::style::Color;

pub struct Theme {
    pub accent: Color,
    pub base: Color,
    pub secondary: Color,
    pub positive: Color,
    pub text: Color,
    pub dimmed: Color,
}

pub const THEME: Theme = Theme {
    accent: Color::Rgb(0x1d, 0xb9, 0x54),
    base: Color::Rgb(0x19, 0x14, 0x14),
    secondary: Color::Rgb(0xb3, 0xb3, 0xb3),
    positive: Color::Rgb(0x1d, 0xb9, 0x54),
    text: Color::White,
    dimmed: Color::DarkGray,
};

fn color_to_rgb(c: Color) -> (u8, u8, u8) {
    match c {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::Red => (205, 0, 0),
        Color::Green => (0, 205, 0),
        Color::Yellow => (205, 205, 0),
        Color::Blue => (0, 0, 238),
        Color::Magenta => (205, 0, 205),
        Color::Cyan => (0, 205, 205),
        Color::White => (229, 229, 229),
        Color::DarkGray => (127, 127, 127),
        _ => (0, 0, 0),
    }
}

/// Linear blend from `from` (t = 0) to `to` (t = 1).
pub fn lerp(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let (r0, g0, b0) = color_to_rgb(from);
    let (r1, g1, b1) = color_to_rgb(to);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::Rgb(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_hits_endpoints() {
        assert_eq!(lerp(THEME.base, THEME.accent, 0.0), THEME.base);
        assert_eq!(lerp(THEME.base, THEME.accent, 1.0), THEME.accent);
        assert_eq!(lerp(THEME.base, THEME.accent, 7.0), THEME.accent);
    }

    #[test]
    fn lerp_midpoint() {
        let mid = lerp(Color::Rgb(0, 0, 0), Color::Rgb(200, 100, 50), 0.5);
        assert_eq!(mid, Color::Rgb(100, 50, 25));
    }
}
