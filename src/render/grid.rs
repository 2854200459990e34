use super::instruction::{Color, DrawList, Font, Path, TextAlign, TextBaseline, TextRun};
use super::layout::Layout;
use crate::signal::log_freq::LogAxis;
use crate::signal::snapshot::{DrawSnapshot, ScopeEvent};
use crate::view::mode::ScopeMode;

pub const AXIS_COLOR: Color = Color::WHITE;
pub const TEXT_COLOR: Color = Color::rgb(0xdd, 0xdd, 0x99);
pub const EVENT_COLOR: Color = Color::rgb(0xff, 0x88, 0x00);
pub const HOP_COLOR: Color = Color::rgb(0x00, 0x40, 0x00);
pub const GRID_COLOR: Color = Color::rgb(0x40, 0x40, 0x40);

/// Upper bound on time/hop gridlines across the plot.
pub const MAX_TIME_LINES: f64 = 8.0;
/// Upper bound on amplitude gridlines on each side of a channel's centre.
pub const MAX_LEVEL_LINES: f64 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub struct EventMarker {
    pub x: f64,
    pub events: Vec<ScopeEvent>,
}

#[derive(Clone, Copy, Debug)]
pub struct GridSpec<'a> {
    pub mode: ScopeMode,
    /// Visible logical range `[start, end)` in samples (or bins).
    pub start: f64,
    pub end: f64,
    /// Logical index used as the axis zero (stabilizer trigger).
    pub zero: f64,
    pub y_factor: f64,
    pub channels: usize,
    pub snapshot: &'a DrawSnapshot,
    pub log_axis: Option<&'a LogAxis>,
}

/// Gridline spacing in hops: a power of two, halved until at most
/// [`MAX_TIME_LINES`] lines span `span` hops.
pub fn hop_step(span: f64) -> Option<f64> {
    if !(span.is_finite() && span > 0.0) {
        return None;
    }
    Some(2f64.powf(span.log2().ceil()) / MAX_TIME_LINES)
}

/// Amplitude gridline spacing: doubled from 0.25 until no more than
/// [`MAX_LEVEL_LINES`] fit between the centre and the edge of a band.
pub fn level_step(y_factor: f64) -> f64 {
    let mut step = 0.25;
    if !y_factor.is_finite() {
        return step;
    }
    while y_factor / step > MAX_LEVEL_LINES {
        step *= 2.0;
    }
    step
}

fn axis_text(text: String, x: f64, y: f64, align: TextAlign) -> TextRun {
    TextRun {
        text,
        x,
        y,
        align,
        baseline: TextBaseline::Middle,
        font: Font::AXIS,
        color: TEXT_COLOR,
        max_width: None,
    }
}

pub fn draw_grid(list: &mut DrawList, layout: &Layout, grid: &GridSpec<'_>) -> Vec<EventMarker> {
    let snap = grid.snapshot;
    let in_freq = grid.mode.in_freq_domain();
    let fft_bins = snap.fft_bins() as f64;
    let buffer_size = snap.buffer_size.max(1) as f64;
    let hop_ratio = if in_freq { snap.fft_overlap.hop_ratio() } else { 1.0 };
    let sample_rate = snap.sample_rate.unwrap_or(0.0);
    let (w, plot_h) = (layout.width, layout.plot_height());

    list.text(TextRun {
        max_width: Some(40.0),
        ..axis_text(grid.mode.unit().to_string(), layout.left - 5.0, layout.height - 10.0, TextAlign::Right)
    });

    let mut axes = Path::new();
    axes.move_to(layout.left, 0.0);
    axes.line_to(layout.left, plot_h);
    axes.line_to(w, plot_h);
    list.stroke(axes, AXIS_COLOR, 1.0);

    let mut first_hop = grid.start / buffer_size / hop_ratio;
    let last_hop = grid.end / buffer_size / hop_ratio;
    let step = hop_step(last_hop - first_hop);
    if let Some(step) = step {
        first_hop -= first_hop % step;
    }

    let mut hop_cursor = snap.buffer_cursor as f64 + (grid.zero / buffer_size / hop_ratio).round();
    if in_freq {
        let frame_hops = fft_bins / buffer_size / snap.fft_overlap.factor() as f64 / 2.0;
        if frame_hops > 0.0 {
            hop_cursor -= hop_cursor % frame_hops;
        }
    }

    let denom = (grid.end - grid.start - 1.0).max(1.0);
    let hop_x = |hop: f64| {
        (hop * buffer_size * hop_ratio - grid.start) / denom * layout.plot_width() + layout.left
    };

    if let Some(axis) = grid.log_axis {
        for line in axis.gridlines() {
            let color = if line.labeled { AXIS_COLOR } else { HOP_COLOR };
            list.stroke(Path::segment(line.x, 0.0, line.x, plot_h), color, 1.0);
            if line.labeled {
                list.text(axis_text(
                    format!("{:.0}", line.freq),
                    line.x.min(w - 20.0),
                    layout.height - 10.0,
                    TextAlign::Center,
                ));
            }
        }
    } else if let Some(step) = step {
        let mut hop = first_hop;
        while hop < last_hop {
            let x = hop_x(hop);
            if x >= layout.left {
                let color = if hop.fract() == 0.0 { HOP_COLOR } else { GRID_COLOR };
                list.stroke(Path::segment(x, 0.0, x, plot_h), color, 1.0);
                let frame = hop / (fft_bins / buffer_size) * hop_ratio;
                let label = match grid.mode {
                    ScopeMode::Spectrogram => {
                        (frame.fract() == 0.0).then(|| format!("{:.0}", frame))
                    }
                    ScopeMode::Spectroscope => {
                        Some(format!("{:.0}", frame.fract() * sample_rate / 2.0))
                    }
                    _ => Some(format!("{:.0}", hop * buffer_size)),
                };
                if let Some(label) = label {
                    list.text(axis_text(label, x.min(w - 20.0), layout.height - 10.0, TextAlign::Center));
                }
            }
            hop += step;
        }
    }

    let mut markers = Vec::new();
    if snap.events.is_some() {
        let mut hop = first_hop.ceil();
        while hop < last_hop {
            let index = hop_cursor + hop;
            if index.fract() == 0.0 {
                if let Some(events) = snap.events_at(index as i64) {
                    let x = hop_x(hop);
                    if x >= layout.left {
                        list.stroke(Path::segment(x, 0.0, x, plot_h), EVENT_COLOR, 1.0);
                        markers.push(EventMarker {
                            x,
                            events: events.to_vec(),
                        });
                    }
                }
            }
            hop += 1.0;
        }
    }

    draw_levels(list, layout, grid, sample_rate);
    markers
}

/// Horizontal amplitude lines per channel band plus dashed band separators.
fn draw_levels(list: &mut DrawList, layout: &Layout, grid: &GridSpec<'_>, sample_rate: f64) {
    let channels = grid.channels.max(1);
    let band = layout.plot_height() / channels as f64;
    let y_factor = grid.y_factor;
    let step = level_step(y_factor);

    let label = |level: f64| match grid.mode {
        ScopeMode::Spectrogram => format!("{:.0}", level * sample_rate / 2.0),
        ScopeMode::Spectroscope => format!("{:.0}", -100.0 + 100.0 * level),
        _ => format!("{:.2}", -y_factor + 2.0 * y_factor * level),
    };

    let mut lines = Path::new();
    let mut push_line = |list: &mut DrawList, y: f64, text: String| {
        lines.move_to(layout.left, y);
        lines.line_to(layout.width, y);
        list.text(axis_text(text, layout.left - 5.0, y.max(10.0), TextAlign::Right));
    };

    for ch in 0..channels {
        let centre = (ch as f64 + 0.5) * band;
        push_line(list, centre, label(0.5));
        let mut j = step;
        while j < y_factor {
            let half = j / y_factor / 2.0;
            push_line(list, centre + half * band, label(0.5 - half));
            push_line(list, centre - half * band, label(0.5 + half));
            j += step;
        }
    }
    list.stroke(lines, GRID_COLOR, 1.0);

    let mut separators = Path::new();
    for ch in 1..channels {
        let y = ch as f64 * band;
        separators.move_to(0.0, y);
        separators.line_to(layout.width, y);
    }
    list.stroke_dashed(separators, AXIS_COLOR, 1.0, (4.0, 2.0));
}
