#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `hue` in degrees, `saturation` and `lightness` in percent.
    pub fn hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let l = (lightness / 100.0).clamp(0.0, 1.0);
        let h = hue.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Color::rgb(to_u8(r), to_u8(g), to_u8(b))
    }

    /// Per-channel trace colour; a lone channel is drawn in white.
    pub fn channel(index: usize, channel_count: usize) -> Self {
        if channel_count == 1 {
            Color::WHITE
        } else {
            Color::hsl(index as f64 * 60.0, 100.0, 85.0)
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    Close,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    ops: Vec<PathOp>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(PathOp::MoveTo(Point::new(x, y)));
    }

    /// Starts a subpath when the path is still empty, like a canvas does.
    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.ops.is_empty() {
            self.move_to(x, y);
        } else {
            self.ops.push(PathOp::LineTo(Point::new(x, y)));
        }
    }

    pub fn close(&mut self) {
        self.ops.push(PathOp::Close);
    }

    pub fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let mut path = Self::new();
        path.move_to(x0, y0);
        path.line_to(x1, y1);
        path
    }

    pub fn ops(&self) -> &[PathOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.ops.iter().filter_map(|op| match op {
            PathOp::MoveTo(p) | PathOp::LineTo(p) => Some(*p),
            PathOp::Close => None,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Font {
    pub size: f32,
    pub bold: bool,
}

impl Font {
    pub const AXIS: Font = Font { size: 10.0, bold: false };
    pub const LABEL: Font = Font { size: 12.0, bold: true };
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub font: Font,
    pub color: Color,
    pub max_width: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Blend {
    #[default]
    SourceOver,
    /// Sum contributions ("lighter").
    Additive,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    FillRect {
        rect: Rect,
        color: Color,
    },
    Stroke {
        path: Path,
        color: Color,
        width: f64,
        /// (on, off) lengths.
        dash: Option<(f64, f64)>,
    },
    Fill {
        path: Path,
        color: Color,
    },
    Text(TextRun),
    Blit {
        src: Rect,
        dst: Rect,
        blend: Blend,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    instructions: Vec<Instruction>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.push(Instruction::FillRect { rect, color });
    }

    pub fn stroke(&mut self, path: Path, color: Color, width: f64) {
        if !path.is_empty() {
            self.push(Instruction::Stroke { path, color, width, dash: None });
        }
    }

    pub fn stroke_dashed(&mut self, path: Path, color: Color, width: f64, dash: (f64, f64)) {
        if !path.is_empty() {
            self.push(Instruction::Stroke { path, color, width, dash: Some(dash) });
        }
    }

    pub fn fill(&mut self, path: Path, color: Color) {
        if !path.is_empty() {
            self.push(Instruction::Fill { path, color });
        }
    }

    pub fn text(&mut self, run: TextRun) {
        self.push(Instruction::Text(run));
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

pub trait TextMetrics {
    fn measure(&self, text: &str, font: Font) -> f64;
}

/// Fixed-pitch estimate used when no font is loaded.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMetrics {
    /// Advance width as a fraction of the font size.
    pub advance: f64,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn measure(&self, text: &str, font: Font) -> f64 {
        text.chars().count() as f64 * font.size as f64 * self.advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        assert_eq!(Color::hsl(0.0, 100.0, 50.0), Color::rgb(255, 0, 0));
        assert_eq!(Color::hsl(120.0, 100.0, 50.0), Color::rgb(0, 255, 0));
        assert_eq!(Color::hsl(240.0, 100.0, 50.0), Color::rgb(0, 0, 255));
        assert_eq!(Color::hsl(420.0, 100.0, 0.0), Color::BLACK);
        assert_eq!(Color::hsl(0.0, 0.0, 100.0), Color::WHITE);
    }

    #[test]
    fn lone_channel_is_white() {
        assert_eq!(Color::channel(0, 1), Color::WHITE);
        assert_ne!(Color::channel(0, 2), Color::channel(1, 2));
    }

    #[test]
    fn line_to_on_empty_path_starts_subpath() {
        let mut p = Path::new();
        p.line_to(1.0, 2.0);
        p.line_to(3.0, 4.0);
        assert_eq!(p.ops()[0], PathOp::MoveTo(Point::new(1.0, 2.0)));
        assert_eq!(p.points().count(), 2);
    }

    #[test]
    fn empty_paths_are_dropped() {
        let mut list = DrawList::new();
        list.stroke(Path::new(), Color::WHITE, 1.0);
        list.fill(Path::new(), Color::WHITE);
        assert!(list.is_empty());
    }
}
