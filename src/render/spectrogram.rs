use tiny_skia::{ColorU8, Pixmap, PixmapRef};

use super::grid::{draw_grid, EventMarker, GridSpec};
use super::instruction::{Blend, Color, DrawList, Instruction, Rect};
use super::layout::Layout;
use super::spectrum::normalize_db;
use crate::signal::index::wrap;
use crate::signal::snapshot::{DrawSnapshot, SampleWindow};
use crate::view::mode::ScopeMode;
use crate::view::zoom::ZoomState;

/// RGBA image, one column per FFT frame and one row per bin per channel.
#[derive(Clone, Debug, Default)]
pub struct SpectrogramTexture {
    pixmap: Option<Pixmap>,
}

impl SpectrogramTexture {
    /// Empty when either side is zero.
    pub fn new(width: usize, height: usize) -> Self {
        let pixmap = u32::try_from(width)
            .ok()
            .zip(u32::try_from(height).ok())
            .and_then(|(w, h)| Pixmap::new(w, h));
        Self { pixmap }
    }

    pub fn width(&self) -> usize {
        self.pixmap.as_ref().map_or(0, |p| p.width() as usize)
    }

    pub fn height(&self) -> usize {
        self.pixmap.as_ref().map_or(0, |p| p.height() as usize)
    }

    pub fn as_pixmap(&self) -> Option<PixmapRef<'_>> {
        self.pixmap.as_ref().map(Pixmap::as_ref)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        let pixmap = self.pixmap.as_ref()?;
        let px = pixmap.pixel(u32::try_from(x).ok()?, u32::try_from(y).ok()?)?.demultiply();
        Some([px.red(), px.green(), px.blue(), px.alpha()])
    }

    pub(crate) fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let width = pixmap.width() as usize;
        if x < width && y < pixmap.height() as usize {
            pixmap.pixels_mut()[y * width + x] = ColorU8::from_rgba(color.r, color.g, color.b, color.a).premultiply();
        }
    }

    fn clear_column(&mut self, x: usize, rows: std::ops::Range<usize>) {
        for y in rows {
            self.set_pixel(x, y, Color::BLACK);
        }
    }
}

/// Heat-map colour of a dB magnitude; `None` at or below -100 dB.
pub fn heat_color(value: f32) -> Option<Color> {
    let n = normalize_db(value);
    if n == 0.0 {
        return None;
    }
    Some(Color::hsl((n * 180.0 + 240.0) % 360.0, 100.0, n * 50.0))
}

/// Owns the texture and the position up to which frames were painted.
#[derive(Debug, Default)]
pub struct SpectrogramCompositor {
    texture: SpectrogramTexture,
    painted_to: i64,
}

impl SpectrogramCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self) -> &SpectrogramTexture {
        &self.texture
    }

    /// Paint every frame written since the previous call. Returns the number
    /// of frame columns painted.
    pub fn update(&mut self, snap: &DrawSnapshot) -> usize {
        let Some(window) = snap.freq_window() else {
            return 0;
        };
        let bins = snap.fft_bins();
        let len = window.len();
        let frames = len / bins;
        let height = bins * window.channel_count();
        if self.texture.width() != frames || self.texture.height() != height {
            log::debug!("spectrogram texture resized to {}x{}", frames, height);
            self.texture = SpectrogramTexture::new(frames, height);
        }

        let write = wrap(snap.freq_write_cursor(), 0, len) as i64;
        let from = wrap(self.painted_to, 0, len) as i64;
        let to = if from >= write { write + len as i64 } else { write };
        let first_frame = from.div_euclid(bins as i64);
        let last_frame = (to + bins as i64 - 1).div_euclid(bins as i64);

        for (ch, samples) in window.channels().enumerate() {
            let band = ch * bins..(ch + 1) * bins;
            for j in first_frame..last_frame {
                let column = wrap(j, 0, frames);
                self.texture.clear_column(column, band.clone());
                for k in 0..bins {
                    let v = samples[wrap(k as i64, j * bins as i64, len)];
                    if let Some(color) = heat_color(v) {
                        self.texture.set_pixel(column, band.start + bins - k - 1, color);
                    }
                }
            }
        }

        self.painted_to = wrap(to, 0, len) as i64;
        (last_frame - first_frame).max(0) as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlitSegment {
    pub src_x: f64,
    pub src_width: f64,
    pub dst_x: f64,
    pub dst_width: f64,
}

/// Copy logical frames `[first, last)` of a ring of `frames` columns whose
/// logical zero sits at column `ring_start`, stretched over `dst_width`
/// pixels from `dst_x`. Wrapping ranges split into a tail then a head copy.
pub fn plan_blit(frames: usize, ring_start: i64, first: i64, last: i64, dst_x: f64, dst_width: f64) -> Vec<BlitSegment> {
    let span = last - first;
    if frames == 0 || span <= 0 {
        return Vec::new();
    }
    let total = frames as i64;
    let src0 = wrap(first, ring_start, frames) as i64;
    let src1 = src0 + span;
    if src1 <= total {
        return vec![BlitSegment {
            src_x: src0 as f64,
            src_width: span as f64,
            dst_x,
            dst_width,
        }];
    }
    let split = (total - src0) as f64 / span as f64;
    vec![
        BlitSegment {
            src_x: src0 as f64,
            src_width: (total - src0) as f64,
            dst_x,
            dst_width: split * dst_width,
        },
        BlitSegment {
            src_x: 0.0,
            src_width: (src1 - total) as f64,
            dst_x: dst_x + split * dst_width,
            dst_width: (1.0 - split) * dst_width,
        },
    ]
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectrogramView {
    pub first_frame: i64,
    pub last_frame: i64,
    pub frames: usize,
    pub fft_bins: usize,
    pub channels: usize,
    pub ring_base: i64,
    pub len: usize,
    pub sample_rate: f64,
}

impl SpectrogramView {
    pub fn compute(snap: &DrawSnapshot, window: &SampleWindow, zoom: &ZoomState) -> Self {
        let fft_bins = snap.fft_bins();
        let frames = window.len() / fft_bins;
        let l = frames as f64;
        // Rounding at the maximum offset can land one past the ring.
        let last_frame = ((l / zoom.zoom + l * zoom.offset).ceil() as i64).min(frames as i64);
        Self {
            first_frame: (l * zoom.offset).floor() as i64,
            last_frame,
            frames,
            fft_bins,
            channels: window.channel_count(),
            ring_base: snap.freq_write_cursor(),
            len: window.len(),
            sample_rate: snap.sample_rate.unwrap_or(0.0),
        }
    }

    pub fn px_per_frame(&self, layout: &Layout) -> f64 {
        layout.plot_width() / ((self.last_frame - self.first_frame).max(1)) as f64
    }

    pub fn px_per_row(&self, layout: &Layout) -> f64 {
        layout.plot_height() / (self.channels.max(1) * self.fft_bins.max(1)) as f64
    }
}

pub struct SpectrogramPass {
    pub view: SpectrogramView,
    pub markers: Vec<EventMarker>,
}

pub fn draw_spectrogram(
    list: &mut DrawList,
    layout: &Layout,
    snap: &DrawSnapshot,
    zoom: &ZoomState,
    texture: &SpectrogramTexture,
) -> Option<SpectrogramPass> {
    let window = snap.freq_window()?;
    let view = SpectrogramView::compute(snap, window, zoom);
    let bins = view.fft_bins as f64;

    let markers = draw_grid(
        list,
        layout,
        &GridSpec {
            mode: ScopeMode::Spectrogram,
            start: view.first_frame as f64 * bins,
            end: view.last_frame as f64 * bins,
            zero: 0.0,
            y_factor: 1.0,
            channels: view.channels,
            snapshot: snap,
            log_axis: None,
        },
    );

    let ring_start = view.ring_base.div_euclid(view.fft_bins as i64);
    for seg in plan_blit(
        view.frames,
        ring_start,
        view.first_frame,
        view.last_frame,
        layout.left,
        layout.plot_width(),
    ) {
        list.push(Instruction::Blit {
            src: Rect::new(seg.src_x, 0.0, seg.src_width, texture.height() as f64),
            dst: Rect::new(seg.dst_x, 0.0, seg.dst_width, layout.plot_height()),
            blend: Blend::Additive,
        });
    }

    Some(SpectrogramPass { view, markers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::snapshot::FftOverlap;

    fn snapshot(frames: usize, bins: usize, write_cursor: i64, fill: impl Fn(usize, usize) -> f32) -> DrawSnapshot {
        let data: Vec<f32> = (0..frames * bins).map(|i| fill(i / bins, i % bins)).collect();
        DrawSnapshot {
            write_cursor,
            freq: Some(SampleWindow::new(vec![data.clone(), data]).unwrap()),
            fft_size: bins * 2,
            fft_overlap: FftOverlap::Two,
            sample_rate: Some(8_000.0),
            ..Default::default()
        }
    }

    #[test]
    fn heat_colors() {
        assert_eq!(heat_color(-100.0), None);
        assert_eq!(heat_color(-200.0), None);
        // full scale: hue (180 + 240) % 360 = 60, lightness 50
        assert_eq!(heat_color(0.0), Some(Color::hsl(60.0, 100.0, 50.0)));
    }

    #[test]
    fn texture_is_frames_by_bins_times_channels() {
        let snap = snapshot(6, 4, 0, |_, _| 0.0);
        let mut comp = SpectrogramCompositor::new();
        assert_eq!(comp.update(&snap), 6);
        assert_eq!(comp.texture().width(), 6);
        assert_eq!(comp.texture().height(), 8);
    }

    #[test]
    fn low_bins_are_painted_at_the_bottom() {
        // only bin 0 carries energy
        let snap = snapshot(3, 4, 0, |_, k| if k == 0 { 0.0 } else { -100.0 });
        let mut comp = SpectrogramCompositor::new();
        comp.update(&snap);
        let lit = Color::hsl(60.0, 100.0, 50.0);
        let lit = [lit.r, lit.g, lit.b, 255];
        let tex = comp.texture();
        assert_eq!(tex.pixel(0, 3), Some(lit));
        assert_eq!(tex.pixel(0, 7), Some(lit));
        assert_eq!(tex.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn only_new_frames_are_repainted() {
        let mut comp = SpectrogramCompositor::new();
        comp.update(&snapshot(8, 4, 0, |_, _| -100.0));
        // two more frames written: cursor advanced by 2 frames (8 samples)
        let painted = comp.update(&snapshot(8, 4, 8, |_, _| 0.0));
        assert_eq!(painted, 2);
        let tex = comp.texture();
        assert_ne!(tex.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_ne!(tex.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(tex.pixel(2, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn unwrapped_range_is_one_copy() {
        let segs = plan_blit(10, 0, 2, 6, 50.0, 400.0);
        assert_eq!(
            segs,
            vec![BlitSegment { src_x: 2.0, src_width: 4.0, dst_x: 50.0, dst_width: 400.0 }]
        );
        assert!(plan_blit(10, 0, 4, 4, 50.0, 400.0).is_empty());
        assert!(plan_blit(0, 0, 0, 4, 50.0, 400.0).is_empty());
    }

    #[test]
    fn wrapped_blit_matches_unwrapped_viewport() {
        let frames = 10usize;
        for ring_start in 0..frames as i64 {
            for first in 0..frames as i64 {
                for last in first + 1..=frames as i64 {
                    let segs = plan_blit(frames, ring_start, first, last, 50.0, 300.0);
                    let mut columns = Vec::new();
                    for seg in &segs {
                        let start = seg.src_x as usize;
                        columns.extend(start..start + seg.src_width as usize);
                    }
                    let expected: Vec<usize> = (first..last).map(|j| wrap(j, ring_start, frames)).collect();
                    assert_eq!(columns, expected, "ring {} range {}..{}", ring_start, first, last);

                    let width: f64 = segs.iter().map(|s| s.dst_width).sum();
                    assert!((width - 300.0).abs() < 1e-9);
                    if let [a, b] = segs.as_slice() {
                        assert!((a.dst_x + a.dst_width - b.dst_x).abs() < 1e-9);
                        let px = 300.0 / (last - first) as f64;
                        assert!((a.dst_width / a.src_width - px).abs() < 1e-9);
                        assert!((b.dst_width / b.src_width - px).abs() < 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn view_never_runs_past_the_ring() {
        let frames = 1236;
        let bins = 2;
        let snap = snapshot(frames, bins, 0, |_, _| 0.0);
        let window = snap.freq_window().unwrap();
        let mut zoom_factor = 1.0;
        while zoom_factor < 16.0 {
            let mut zoom = ZoomState::default();
            zoom.set_zoom(zoom_factor, 16.0, 0.0);
            zoom.set_offset(1.0);
            let view = SpectrogramView::compute(&snap, window, &zoom);
            assert!(view.last_frame <= frames as i64, "zoom {} last {}", zoom_factor, view.last_frame);
            assert!(view.first_frame < view.last_frame);
            for ring_start in [0, 7, 1235] {
                let segs = plan_blit(frames, ring_start, view.first_frame, view.last_frame, 50.0, 750.0);
                let copied: f64 = segs.iter().map(|s| s.src_width).sum();
                assert_eq!(copied, (view.last_frame - view.first_frame) as f64);
            }
            zoom_factor *= 1.0961889485235283;
        }
    }

    #[test]
    fn draw_emits_additive_blits() {
        let snap = snapshot(8, 4, 8, |_, _| 0.0);
        let mut comp = SpectrogramCompositor::new();
        comp.update(&snap);
        let mut zoom = ZoomState::default();
        zoom.set_zoom(2.0, 16.0, 0.0);
        zoom.set_offset(0.5);
        let mut list = DrawList::new();
        let pass = draw_spectrogram(&mut list, &Layout::default(), &snap, &zoom, comp.texture()).unwrap();
        assert_eq!((pass.view.first_frame, pass.view.last_frame), (4, 8));
        let blits: Vec<_> = list
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::Blit { blend: Blend::Additive, .. }))
            .collect();
        // ring starts at frame 2, logical 4..8 -> physical 6, 7, 0, 1
        assert_eq!(blits.len(), 2);
    }
}
