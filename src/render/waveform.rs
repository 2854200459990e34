use super::grid::{draw_grid, EventMarker, GridSpec};
use super::instruction::{Color, DrawList, Path};
use super::layout::Layout;
use crate::signal::index::wrap;
use crate::signal::snapshot::{DrawSnapshot, SampleWindow};
use crate::signal::stabilizer::{self, Stabilization};
use crate::view::mode::ScopeMode;
use crate::view::zoom::ZoomState;

pub const TRACE_WIDTH: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceLayout {
    /// One horizontal band per channel.
    Interleaved,
    /// Every channel drawn over one full-height band.
    Overlaid,
}

/// Peak-preserving summary of consecutive samples `[first, last]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Column {
    pub first: i64,
    pub last: i64,
    pub min: f32,
    pub max: f32,
}

/// Split `[start, end)` into runs of `step` samples and keep each run's
/// extremes. A trailing run shorter than `step` is dropped.
pub fn decimate(start: i64, end: i64, step: usize, mut sample: impl FnMut(i64) -> f32) -> Vec<Column> {
    let step = step.max(1) as i64;
    let mut columns = Vec::with_capacity(((end - start).max(0) / step) as usize);
    let mut current: Option<Column> = None;
    for j in start..end {
        let s = sample(j);
        let col = current.get_or_insert(Column { first: j, last: j, min: s, max: s });
        col.last = j;
        if s > col.max {
            col.max = s;
        }
        if s < col.min {
            col.min = s;
        }
        if (j - start) % step == step - 1 {
            columns.extend(current.take());
        }
    }
    columns
}

/// Visible logical range of the time window and its pixel mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeView {
    pub start: i64,
    pub end: i64,
    /// Logical index treated as time zero (the trigger when stabilized).
    pub zero: i64,
    pub y_factor: f64,
    pub px_per_sample: f64,
    pub step: usize,
}

impl TimeView {
    pub fn compute(snap: &DrawSnapshot, window: &SampleWindow, zoom: &ZoomState, layout: &Layout) -> Self {
        let len = window.len();
        let (lo, hi) = window.extent().unwrap_or((0.0, 0.0));
        let y_factor = 1f64.max(lo.abs() as f64).max(hi.abs() as f64) * zoom.vertical_zoom;

        let st = match (snap.sample_rate, window.channel(0)) {
            (Some(sr), Some(reference)) if stabilizer::applies(snap.draw_mode, len, snap.sample_rate) => {
                stabilizer::stabilize(reference, snap.write_cursor, (lo, hi), sr, snap.freq_estimated)
            }
            _ => Stabilization::unstabilized(len),
        };
        let zero = st.trigger as f64;
        let start = (zero + st.draw_len * zoom.offset).round() as i64;
        let end = (zero + st.draw_len / zoom.zoom + st.draw_len * zoom.offset).round() as i64;

        let px_per_sample = layout.plot_width() / ((end - start - 1).max(1)) as f64;
        let step = (1.0 / px_per_sample).round().max(1.0) as usize;
        Self {
            start,
            end,
            zero: st.trigger as i64,
            y_factor,
            px_per_sample,
            step,
        }
    }

    pub fn x_of(&self, j: i64, layout: &Layout) -> f64 {
        (j - self.start) as f64 * self.px_per_sample + layout.left
    }

    /// Inverse of [`TimeView::x_of`], rounded to the nearest sample.
    pub fn index_at(&self, x: f64, layout: &Layout) -> i64 {
        self.start + ((x - layout.left) / self.px_per_sample).round() as i64
    }
}

pub struct TimePass {
    pub view: TimeView,
    pub markers: Vec<EventMarker>,
}

/// Rasterize the time window. `None` when there is nothing to draw.
pub fn draw_time(
    list: &mut DrawList,
    layout: &Layout,
    snap: &DrawSnapshot,
    zoom: &ZoomState,
    trace: TraceLayout,
) -> Option<TimePass> {
    let window = snap.time_window()?;
    let len = window.len();
    let channels = window.channel_count();
    let view = TimeView::compute(snap, window, zoom, layout);

    let (mode, bands) = match trace {
        TraceLayout::Interleaved => (ScopeMode::Interleaved, channels),
        TraceLayout::Overlaid => (ScopeMode::Oscilloscope, 1),
    };
    let markers = draw_grid(
        list,
        layout,
        &GridSpec {
            mode,
            start: (view.start - view.zero) as f64,
            end: (view.end - view.zero) as f64,
            zero: view.zero as f64,
            y_factor: view.y_factor,
            channels: bands,
            snapshot: snap,
            log_axis: None,
        },
    );

    let band_h = layout.plot_height() / bands as f64;
    for (i, samples) in window.channels().enumerate() {
        let band = match trace {
            TraceLayout::Interleaved => i as f64,
            TraceLayout::Overlaid => 0.0,
        };
        let color = match trace {
            TraceLayout::Interleaved => Color::hsl(i as f64 * 60.0, 100.0, 85.0),
            TraceLayout::Overlaid => Color::channel(i, channels),
        };
        let y_of = |v: f32| band_h * (band + 0.5 - v as f64 / view.y_factor * 0.5);

        let mut path = Path::new();
        let columns = decimate(view.start, view.end, view.step, |j| {
            samples[wrap(j, snap.write_cursor, len)]
        });
        for col in columns {
            let x = view.x_of(col.last, layout);
            path.line_to(x, y_of(col.max));
            if col.min != col.max {
                path.line_to(x, y_of(col.min));
            }
        }
        list.stroke(path, color, TRACE_WIDTH);
    }

    Some(TimePass { view, markers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::instruction::Instruction;
    use crate::signal::snapshot::DrawMode;

    fn snap_with(channels: Vec<Vec<f32>>) -> DrawSnapshot {
        DrawSnapshot {
            time: Some(SampleWindow::new(channels).unwrap()),
            sample_rate: Some(44_100.0),
            ..Default::default()
        }
    }

    fn strokes(list: &DrawList, width: f64) -> Vec<&Path> {
        list.instructions()
            .iter()
            .filter_map(|i| match i {
                Instruction::Stroke { path, width: w, .. } if *w == width => Some(path),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn decimation_preserves_peaks() {
        let data: Vec<f32> = (0..1000).map(|i| ((i * 7919) % 263) as f32 / 263.0 - 0.5).collect();
        for step in [1usize, 2, 3, 7, 16, 100] {
            let cols = decimate(0, data.len() as i64, step, |j| data[j as usize]);
            assert_eq!(cols.len(), data.len() / step);
            for col in cols {
                assert_eq!((col.last - col.first + 1) as usize, step);
                for j in col.first..=col.last {
                    let s = data[j as usize];
                    assert!(col.max >= s && col.min <= s);
                }
            }
        }
    }

    #[test]
    fn decimation_of_empty_range() {
        assert!(decimate(5, 5, 3, |_| 0.0).is_empty());
        assert!(decimate(5, 2, 3, |_| 0.0).is_empty());
    }

    #[test]
    fn absent_or_empty_data_is_a_no_op() {
        let layout = Layout::default();
        let zoom = ZoomState::default();
        let mut list = DrawList::new();
        assert!(draw_time(&mut list, &layout, &DrawSnapshot::default(), &zoom, TraceLayout::Overlaid).is_none());
        let empty = snap_with(vec![Vec::new(), Vec::new()]);
        assert!(draw_time(&mut list, &layout, &empty, &zoom, TraceLayout::Interleaved).is_none());
        let none = snap_with(Vec::new());
        assert!(draw_time(&mut list, &layout, &none, &zoom, TraceLayout::Interleaved).is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn one_trace_per_channel_in_its_band() {
        let layout = Layout::new(850.0, 420.0);
        let snap = snap_with(vec![vec![1.0; 256], vec![-1.0; 256]]);
        let mut list = DrawList::new();
        draw_time(&mut list, &layout, &snap, &ZoomState::default(), TraceLayout::Interleaved).unwrap();
        let traces = strokes(&list, TRACE_WIDTH);
        assert_eq!(traces.len(), 2);
        // y_factor = 1: +1 sits at the top of band 0, -1 at the bottom of band 1
        assert!(traces[0].points().all(|p| p.y.abs() < 1e-9));
        assert!(traces[1].points().all(|p| (p.y - 400.0).abs() < 1e-9));
    }

    #[test]
    fn zoomed_out_window_is_decimated() {
        let layout = Layout::new(150.0, 220.0);
        let data: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let snap = snap_with(vec![data]);
        let mut list = DrawList::new();
        let pass = draw_time(&mut list, &layout, &snap, &ZoomState::default(), TraceLayout::Overlaid).unwrap();
        assert_eq!(pass.view.step, 10);
        let trace = strokes(&list, TRACE_WIDTH)[0];
        // two points (max then min) per column
        assert_eq!(trace.points().count(), 200);
        let ys: Vec<f64> = trace.points().take(2).map(|p| p.y).collect();
        assert!(ys[0] < ys[1]);
    }

    #[test]
    fn view_follows_zoom_and_offset() {
        let layout = Layout::default();
        let snap = snap_with(vec![vec![0.0; 1000]]);
        let mut zoom = ZoomState::default();
        zoom.set_zoom(4.0, 16.0, 0.0);
        zoom.set_offset(0.5);
        let view = TimeView::compute(&snap, snap.time_window().unwrap(), &zoom, &layout);
        assert_eq!((view.start, view.end), (500, 750));
        let x = view.x_of(600, &layout);
        assert_eq!(view.index_at(x, &layout), 600);
    }

    #[test]
    fn continuous_mode_starts_at_trigger() {
        let layout = Layout::default();
        let data: Vec<f32> = (0..1024)
            .map(|i| (2.0 * std::f64::consts::PI * 441.0 * i as f64 / 44_100.0).sin() as f32)
            .collect();
        let mut snap = snap_with(vec![data]);
        snap.draw_mode = DrawMode::Continuous;
        snap.freq_estimated = Some(441.0);
        let view = TimeView::compute(&snap, snap.time_window().unwrap(), &ZoomState::default(), &layout);
        assert!(view.zero > 0);
        assert_eq!(view.start, view.zero);
        assert_eq!(view.end, view.zero + 900);
    }
}
