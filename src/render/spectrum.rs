use super::grid::{draw_grid, EventMarker, GridSpec};
use super::instruction::{Color, DrawList, Path};
use super::layout::Layout;
use super::waveform::decimate;
use crate::signal::index::wrap;
use crate::signal::log_freq::LogAxis;
use crate::signal::snapshot::{DrawSnapshot, SampleWindow};
use crate::view::mode::ScopeMode;
use crate::view::zoom::ZoomState;

/// Magnitudes are treated as dB in `[-100, 0]`.
pub fn normalize_db(value: f32) -> f64 {
    (value as f64 / 100.0 + 1.0).clamp(0.0, 1.0)
}

/// Frequency of bin `bin` in a frame of `fft_bins` bins.
pub fn bin_to_freq(bin: f64, fft_bins: usize, sample_rate: f64) -> f64 {
    bin / fft_bins as f64 * sample_rate / 2.0
}

/// Visible bin range of the newest frame and its pixel mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectrumView {
    pub start: i64,
    pub end: i64,
    /// Logical index of bin 0 of the newest frame.
    pub frame_start: i64,
    /// Physical start of the frequency ring.
    pub ring_base: i64,
    pub fft_bins: usize,
    pub px_per_bin: f64,
    pub step: usize,
    pub sample_rate: f64,
}

impl SpectrumView {
    pub fn compute(snap: &DrawSnapshot, window: &SampleWindow, zoom: &ZoomState, layout: &Layout) -> Self {
        let fft_bins = snap.fft_bins();
        let bins = fft_bins as f64;
        let frame_start = window.len() as i64 - fft_bins as i64;
        let start = frame_start + (bins * zoom.offset).round() as i64;
        let end = frame_start + (bins / zoom.zoom + bins * zoom.offset).round() as i64;
        let px_per_bin = layout.plot_width() / ((end - start - 1).max(1)) as f64;
        Self {
            start,
            end,
            frame_start,
            ring_base: snap.freq_write_cursor(),
            fft_bins,
            px_per_bin,
            step: (1.0 / px_per_bin).round().max(1.0) as usize,
            sample_rate: snap.sample_rate.unwrap_or(0.0),
        }
    }

    pub fn freq_of(&self, j: i64) -> f64 {
        bin_to_freq((j - self.frame_start) as f64, self.fft_bins, self.sample_rate)
    }

    pub fn linear_x(&self, j: i64, layout: &Layout) -> f64 {
        (j - self.start) as f64 * self.px_per_bin + layout.left
    }

    pub fn linear_index_at(&self, x: f64, layout: &Layout) -> i64 {
        self.start + ((x - layout.left) / self.px_per_bin).round() as i64
    }

    /// Logical index of the bin nearest to `freq`.
    pub fn index_of_freq(&self, freq: f64) -> i64 {
        if self.sample_rate <= 0.0 {
            return self.frame_start;
        }
        let bin = (freq / (self.sample_rate / 2.0) * self.fft_bins as f64).round() as i64;
        self.frame_start + bin.clamp(0, self.fft_bins as i64 - 1)
    }
}

pub struct SpectrumPass {
    pub view: SpectrumView,
    pub log_axis: Option<LogAxis>,
    pub markers: Vec<EventMarker>,
}

pub fn draw_spectrum(
    list: &mut DrawList,
    layout: &Layout,
    snap: &DrawSnapshot,
    zoom: &ZoomState,
) -> Option<SpectrumPass> {
    let window = snap.freq_window()?;
    let len = window.len();
    let channels = window.channel_count();
    let view = SpectrumView::compute(snap, window, zoom, layout);
    let log_axis = snap
        .sample_rate
        .and_then(|sr| LogAxis::new(snap.axis, sr, layout.plot_width(), layout.left));

    let markers = draw_grid(
        list,
        layout,
        &GridSpec {
            mode: ScopeMode::Spectroscope,
            start: view.start as f64,
            end: view.end as f64,
            zero: 0.0,
            y_factor: 1.0,
            channels,
            snapshot: snap,
            log_axis: log_axis.as_ref(),
        },
    );

    let band_h = layout.plot_height() / channels as f64;
    for (ch, samples) in window.channels().enumerate() {
        let color = Color::channel(ch, channels);
        let sample = |j: i64| samples[wrap(j, view.ring_base, len)];
        let y_of = |v: f32| band_h * (ch as f64 + 1.0 - normalize_db(v));

        match &log_axis {
            Some(axis) => {
                let mut ticks = Path::new();
                let mut running: Option<f32> = None;
                let mut next_x = layout.left;
                for j in view.start..view.end {
                    let x = axis.freq_to_x(view.freq_of(j));
                    let s = sample(j);
                    let peak = running.map_or(s, |r| r.max(s));
                    if (x < next_x || !x.is_finite()) && j < view.end - 1 {
                        running = Some(peak);
                        continue;
                    }
                    let y = y_of(peak);
                    if y > 1.0 && x.is_finite() {
                        ticks.move_to(x, y);
                        ticks.line_to(x, y - 1.0);
                    }
                    next_x = x + view.px_per_bin;
                    running = None;
                }
                list.stroke(ticks, color, 1.0);
            }
            None => {
                let mut area = Path::new();
                for col in decimate(view.start, view.end, view.step, sample) {
                    area.line_to(view.linear_x(col.last, layout), y_of(col.max));
                }
                if !area.is_empty() {
                    let baseline = band_h * (ch as f64 + 1.0);
                    area.line_to(layout.width, baseline);
                    area.line_to(layout.left, baseline);
                    area.close();
                }
                list.fill(area, color);
            }
        }
    }

    Some(SpectrumPass { view, log_axis, markers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::instruction::{Instruction, PathOp};
    use crate::signal::log_freq::AxisScale;

    fn snapshot(frames: usize, bins: usize, axis: AxisScale) -> DrawSnapshot {
        // Two frames per channel; the newest frame ramps from -100 dB to 0 dB.
        let mut data = vec![-100.0f32; frames * bins];
        let newest = (frames - 1) * bins;
        for k in 0..bins {
            data[newest + k] = -100.0 + 100.0 * k as f32 / (bins - 1) as f32;
        }
        DrawSnapshot {
            freq: Some(SampleWindow::new(vec![data]).unwrap()),
            fft_size: bins * 2,
            sample_rate: Some(44_100.0),
            axis,
            ..Default::default()
        }
    }

    #[test]
    fn normalization_clamps() {
        assert_eq!(normalize_db(-150.0), 0.0);
        assert_eq!(normalize_db(-50.0), 0.5);
        assert_eq!(normalize_db(20.0), 1.0);
    }

    #[test]
    fn bin_frequencies() {
        assert_eq!(bin_to_freq(0.0, 128, 44_100.0), 0.0);
        assert_eq!(bin_to_freq(64.0, 128, 44_100.0), 11_025.0);
    }

    #[test]
    fn view_covers_newest_frame() {
        let snap = snapshot(2, 128, AxisScale::Linear);
        let view = SpectrumView::compute(&snap, snap.freq.as_ref().unwrap(), &ZoomState::default(), &Layout::default());
        assert_eq!(view.frame_start, 128);
        assert_eq!((view.start, view.end), (128, 256));
        assert_eq!(view.freq_of(192), 11_025.0);
        assert_eq!(view.index_of_freq(11_025.0), 192);
        assert_eq!(view.index_of_freq(1e9), 255);
    }

    #[test]
    fn linear_axis_fills_closed_area() {
        let snap = snapshot(2, 128, AxisScale::Linear);
        let layout = Layout::default();
        let mut list = DrawList::new();
        draw_spectrum(&mut list, &layout, &snap, &ZoomState::default()).unwrap();
        let fills: Vec<&Path> = list
            .instructions()
            .iter()
            .filter_map(|i| match i {
                Instruction::Fill { path, .. } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 1);
        let ops = fills[0].ops();
        assert_eq!(ops.last(), Some(&PathOp::Close));
        let pts: Vec<_> = fills[0].points().collect();
        // first bin is -100 dB on the baseline, last is 0 dB at the top
        assert!((pts[0].y - layout.plot_height()).abs() < 1e-9);
        assert!(pts[pts.len() - 3].y.abs() < 1e-9);
    }

    #[test]
    fn log_axis_emits_ticks_in_plot() {
        let snap = snapshot(2, 1024, AxisScale::Log10);
        let layout = Layout::default();
        let mut list = DrawList::new();
        let pass = draw_spectrum(&mut list, &layout, &snap, &ZoomState::default()).unwrap();
        assert!(pass.log_axis.is_some());
        let ticks = list
            .instructions()
            .iter()
            .rev()
            .find_map(|i| match i {
                Instruction::Stroke { path, width, .. } if *width == 1.0 => Some(path),
                _ => None,
            })
            .unwrap();
        let xs: Vec<f64> = ticks.points().map(|p| p.x).collect();
        assert!(!xs.is_empty());
        assert!(xs.iter().all(|x| *x >= layout.left && *x <= layout.width));
        // fewer ticks than bins: low bins merge, high bins pack into columns
        assert!(xs.len() / 2 < 1024);
    }

    #[test]
    fn too_short_frequency_window_is_skipped() {
        let mut snap = snapshot(1, 128, AxisScale::Linear);
        snap.fft_size = 1024;
        let mut list = DrawList::new();
        assert!(draw_spectrum(&mut list, &Layout::default(), &snap, &ZoomState::default()).is_none());
    }
}
