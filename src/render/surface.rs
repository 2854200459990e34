use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Paint, PathBuilder, Pattern, Pixmap, PixmapRef, SpreadMode, Stroke,
    StrokeDash, Transform,
};

use super::instruction::{Blend, Color, DrawList, Instruction, Path, PathOp, Rect};
use super::spectrogram::SpectrogramTexture;
use super::text::TextOverlay;
use crate::error::ScopeError;

/// CPU target for a [`DrawList`], backed by a tiny-skia pixmap.
pub struct SoftwareSurface {
    pixmap: Pixmap,
    text: Option<TextOverlay>,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32, text: Option<TextOverlay>) -> Result<Self, ScopeError> {
        let pixmap = Pixmap::new(width, height).ok_or(ScopeError::Surface { width, height })?;
        if text.is_none() {
            log::warn!("no font configured, text instructions will be skipped");
        }
        Ok(Self { pixmap, text })
    }

    /// RGBA8 frame. Premultiplied, which equals straight alpha once the
    /// surface has been cleared to an opaque colour.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn text(&self) -> Option<&TextOverlay> {
        self.text.as_ref()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let px = self.pixmap.pixel(x, y)?.demultiply();
        Some([px.red(), px.green(), px.blue(), px.alpha()])
    }

    pub fn clear(&mut self, color: Color) {
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    }

    /// Execute every instruction in order. Blits read from `texture`.
    pub fn execute(&mut self, list: &DrawList, texture: Option<&SpectrogramTexture>) {
        for instruction in list.instructions() {
            match instruction {
                Instruction::FillRect { rect, color } => self.fill_rect(*rect, *color),
                Instruction::Stroke { path, color, width, dash } => self.stroke(path, *color, *width, *dash),
                Instruction::Fill { path, color } => self.fill_path(path, *color),
                Instruction::Text(run) => {
                    if let Some(text) = &self.text {
                        let (width, height) = (self.pixmap.width(), self.pixmap.height());
                        text.draw(self.pixmap.data_mut(), width, height, run);
                    }
                }
                Instruction::Blit { src, dst, blend } => {
                    if let Some(pixmap) = texture.and_then(SpectrogramTexture::as_pixmap) {
                        self.blit(pixmap, *src, *dst, *blend);
                    }
                }
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(rect) = to_rect(rect) else {
            return;
        };
        let mut paint = solid(color);
        paint.anti_alias = false;
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn stroke(&mut self, path: &Path, color: Color, width: f64, dash: Option<(f64, f64)>) {
        let Some(path) = to_path(path) else {
            return;
        };
        // An unusable pattern strokes solid.
        let stroke = Stroke {
            width: width as f32,
            dash: dash.and_then(|(on, off)| StrokeDash::new(vec![on as f32, off as f32], 0.0)),
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
    }

    /// Open subpaths are closed implicitly.
    fn fill_path(&mut self, path: &Path, color: Color) {
        if let Some(path) = to_path(path) {
            self.pixmap
                .fill_path(&path, &solid(color), FillRule::EvenOdd, Transform::identity(), None);
        }
    }

    /// Nearest-neighbour copy of the `src` region of the texture onto `dst`.
    fn blit(&mut self, texture: PixmapRef, src: Rect, dst: Rect, blend: Blend) {
        if src.width <= 0.0 || src.height <= 0.0 {
            return;
        }
        let Some(area) = to_rect(dst) else {
            return;
        };
        let (sx, sy) = (dst.width / src.width, dst.height / src.height);
        let transform = Transform::from_row(
            sx as f32,
            0.0,
            0.0,
            sy as f32,
            (dst.x - src.x * sx) as f32,
            (dst.y - src.y * sy) as f32,
        );
        let paint = Paint {
            shader: Pattern::new(texture, SpreadMode::Pad, FilterQuality::Nearest, 1.0, transform),
            blend_mode: match blend {
                Blend::SourceOver => BlendMode::SourceOver,
                Blend::Additive => BlendMode::Plus,
            },
            anti_alias: false,
            ..Paint::default()
        };
        self.pixmap.fill_rect(area, &paint, Transform::identity(), None);
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint
}

fn to_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    tiny_skia::Rect::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32)
}

fn to_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for op in path.ops() {
        match *op {
            PathOp::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathOp::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathOp::Close => builder.close(),
        }
    }
    builder.finish()
}
