use std::path::Path;

use fontdue::{Font as FontFace, FontSettings};

use super::instruction::{Font, TextAlign, TextBaseline, TextMetrics, TextRun};
use crate::error::ScopeError;

/// fontdue-backed text compositing onto RGBA buffers.
pub struct TextOverlay {
    regular: FontFace,
    bold: Option<FontFace>,
}

fn load_face(path: &Path) -> Result<FontFace, ScopeError> {
    let bytes = std::fs::read(path).map_err(|e| ScopeError::FontLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    FontFace::from_bytes(bytes, FontSettings::default()).map_err(|reason| ScopeError::FontLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}

impl TextOverlay {
    pub fn from_file(path: &Path) -> Result<Self, ScopeError> {
        let regular = load_face(path)?;
        log::debug!("loaded font {}", path.display());
        Ok(Self { regular, bold: None })
    }

    /// Use a separate face for bold runs; without one bold text uses the
    /// regular face.
    pub fn with_bold(mut self, path: &Path) -> Result<Self, ScopeError> {
        self.bold = Some(load_face(path)?);
        Ok(self)
    }

    fn face(&self, font: Font) -> &FontFace {
        match (&self.bold, font.bold) {
            (Some(bold), true) => bold,
            _ => &self.regular,
        }
    }

    fn advance(&self, text: &str, face: &FontFace, size: f32) -> f32 {
        text.chars().map(|ch| face.metrics(ch, size).advance_width).sum()
    }

    /// Composite a run onto an RGBA pixel buffer, honouring alignment,
    /// baseline and the optional maximum width (text is shrunk to fit).
    pub fn draw(&self, pixels: &mut [u8], width: u32, height: u32, run: &TextRun) {
        let face = self.face(run.font);
        let mut size = run.font.size;
        let natural = self.advance(&run.text, face, size);
        if let Some(max) = run.max_width {
            if natural > max as f32 && natural > 0.0 {
                size *= max as f32 / natural;
            }
        }
        let text_width = self.advance(&run.text, face, size);
        let (ascent, descent) = face
            .horizontal_line_metrics(size)
            .map_or((size * 0.8, -size * 0.2), |m| (m.ascent, m.descent));

        let start_x = match run.align {
            TextAlign::Left => run.x as f32,
            TextAlign::Center => run.x as f32 - text_width / 2.0,
            TextAlign::Right => run.x as f32 - text_width,
        };
        let baseline = match run.baseline {
            TextBaseline::Top => run.y as f32 + ascent,
            TextBaseline::Middle => run.y as f32 + (ascent + descent) / 2.0,
            TextBaseline::Bottom => run.y as f32 + descent,
        };
        let color = run.color;

        let mut pen_x = start_x;
        for ch in run.text.chars() {
            let (metrics, bitmap) = face.rasterize(ch, size);
            let glyph_x = (pen_x + metrics.xmin as f32).round() as i32;
            let glyph_y = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }

                    let px = glyph_x + gx as i32;
                    let py = glyph_y + gy as i32;

                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }

                    let idx = ((py as u32 * width + px as u32) * 4) as usize;
                    if idx + 3 >= pixels.len() {
                        continue;
                    }

                    let a = coverage as f32 / 255.0 * (color.a as f32 / 255.0);
                    let inv_a = 1.0 - a;
                    pixels[idx] = (color.r as f32 * a + pixels[idx] as f32 * inv_a) as u8;
                    pixels[idx + 1] = (color.g as f32 * a + pixels[idx + 1] as f32 * inv_a) as u8;
                    pixels[idx + 2] = (color.b as f32 * a + pixels[idx + 2] as f32 * inv_a) as u8;
                    pixels[idx + 3] = 255;
                }
            }

            pen_x += metrics.advance_width;
        }
    }
}

impl TextMetrics for TextOverlay {
    fn measure(&self, text: &str, font: Font) -> f64 {
        self.advance(text, self.face(font), font.size) as f64
    }
}
