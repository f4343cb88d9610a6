//! 2D drawing port
//!
//! Games draw through [`Surface`], which only needs a handful of filled
//! primitives and text. The browser backend lives in `platform::web`;
//! [`RecordingSurface`] keeps the draw list for headless runs and tests.

use glam::Vec2;

/// Packed 0xRRGGBB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xffffff);
    pub const GRAY: Color = Color(0x808080);
    pub const DARK_GRAY: Color = Color(0x333333);
    pub const RED: Color = Color(0xff3b30);
    pub const GREEN: Color = Color(0x4cd964);
    pub const BLUE: Color = Color(0x1e6bff);
    pub const CYAN: Color = Color(0x00e5ff);
    pub const YELLOW: Color = Color(0xffd60a);
    pub const ORANGE: Color = Color(0xff9500);
    pub const MAGENTA: Color = Color(0xff2d95);
    pub const PURPLE: Color = Color(0x9b59ff);
    pub const PINK: Color = Color(0xffb8ff);

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn r(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn g(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn b(&self) -> u8 {
        self.0 as u8
    }

    /// Scale brightness by `factor` (clamped to [0, 1])
    pub fn shade(&self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let s = |c: u8| (c as f32 * f).round() as u8;
        Color::rgb(s(self.r()), s(self.g()), s(self.b()))
    }

    /// CSS hex form, e.g. `#ff9500`
    pub fn to_css(&self) -> String {
        format!("#{:06x}", self.0 & 0xffffff)
    }
}

/// Horizontal anchor for text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Fixed-size raster drawing surface
pub trait Surface {
    /// Size in pixels
    fn size(&self) -> (f32, f32);
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn fill_polygon(&mut self, points: &[Vec2], color: Color);
    fn fill_text(&mut self, text: &str, pos: Vec2, size: f32, align: TextAlign, color: Color);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Rect { x: f32, y: f32, w: f32, h: f32, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    Polygon { points: Vec<Vec2>, color: Color },
    Text { text: String, pos: Vec2, size: f32, color: Color },
}

/// Surface that records draw calls instead of rasterizing them
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Every text string drawn since the last clear
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.commands.push(DrawCommand::Rect { x, y, w, h, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle { center, radius, color });
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, size: f32, _align: TextAlign, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            size,
            color,
        });
    }
}

/// Dim the play field and print a centred banner (pause / game over)
pub fn draw_banner(surface: &mut dyn Surface, title: &str, subtitle: Option<&str>) {
    let (w, h) = surface.size();
    surface.fill_rect(0.0, h / 2.0 - 40.0, w, 80.0, Color::BLACK);
    surface.fill_text(title, Vec2::new(w / 2.0, h / 2.0 - 6.0), 24.0, TextAlign::Center, Color::WHITE);
    if let Some(sub) = subtitle {
        surface.fill_text(sub, Vec2::new(w / 2.0, h / 2.0 + 22.0), 14.0, TextAlign::Center, Color::GRAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_css_and_shade() {
        assert_eq!(Color::ORANGE.to_css(), "#ff9500");
        assert_eq!(Color::WHITE.shade(0.0), Color::BLACK);
        assert_eq!(Color::rgb(200, 100, 50).shade(0.5), Color::rgb(100, 50, 25));
    }

    #[test]
    fn test_recording_clear_resets() {
        let mut s = RecordingSurface::new(10.0, 10.0);
        s.fill_rect(0.0, 0.0, 1.0, 1.0, Color::RED);
        s.clear(Color::BLACK);
        assert_eq!(s.commands, vec![DrawCommand::Clear(Color::BLACK)]);
        draw_banner(&mut s, "PAUSED", None);
        assert!(s.has_text("PAUSED"));
    }
}
