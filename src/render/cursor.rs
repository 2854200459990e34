use super::instruction::Point;
use super::layout::Layout;
use super::spectrogram::SpectrogramView;
use super::spectrum::SpectrumPass;
use super::waveform::TimeView;
use crate::signal::index::wrap;
use crate::signal::snapshot::SampleWindow;

/// What sits under the pointer: crosshair position, axis labels and one value
/// per channel (a single value in the spectrogram).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Readout {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub values: Vec<f32>,
}

fn values_at(window: &SampleWindow, j: i64, base: i64) -> Vec<f32> {
    if window.is_empty() {
        return Vec::new();
    }
    let k = wrap(j, base, window.len());
    window.channels().filter_map(|ch| ch.get(k).copied()).collect()
}

/// Snap to the nearest decimated sample and label it relative to the trigger.
pub fn time_readout(layout: &Layout, view: &TimeView, window: &SampleWindow, write_cursor: i64, p: Point) -> Option<Readout> {
    if !layout.in_plot(p) {
        return None;
    }
    let j = view.index_at(p.x, layout);
    Some(Readout {
        x: Some(view.x_of(j, layout)),
        x_label: Some(format!("{}", j - view.zero)),
        values: values_at(window, j, write_cursor),
        ..Default::default()
    })
}

/// On a log axis the frequency comes straight from the pointer and the bin is
/// found by inverting it; on a linear axis the bin is snapped first.
pub fn spectrum_readout(layout: &Layout, pass: &SpectrumPass, window: &SampleWindow, p: Point) -> Option<Readout> {
    if !layout.in_plot(p) {
        return None;
    }
    let view = &pass.view;
    let (j, x, freq) = match &pass.log_axis {
        Some(axis) => {
            let freq = axis.x_to_freq(p.x);
            (view.index_of_freq(freq), p.x, freq)
        }
        None => {
            let j = view.linear_index_at(p.x, layout);
            (j, view.linear_x(j, layout), view.freq_of(j))
        }
    };
    Some(Readout {
        x: Some(x),
        x_label: Some(format!("{:.0}", freq)),
        values: values_at(window, j, view.ring_base),
        ..Default::default()
    })
}

/// Cell under the pointer: frame column, channel band and bin row.
pub fn spectrogram_readout(layout: &Layout, view: &SpectrogramView, window: &SampleWindow, p: Point) -> Option<Readout> {
    if !layout.in_plot(p) || view.fft_bins == 0 || window.is_empty() {
        return None;
    }
    let bins = view.fft_bins as i64;
    let grid_x = view.px_per_frame(layout);
    let grid_y = view.px_per_row(layout);

    let frame = view.first_frame + ((p.x - layout.left) / grid_x).floor() as i64;
    let ch = ((p.y / grid_y / bins as f64).floor().max(0.0) as usize).min(view.channels.saturating_sub(1));
    let bin = (((layout.plot_height() - p.y) / grid_y).floor() as i64).rem_euclid(bins);
    let k = wrap(frame * bins + bin, view.ring_base, window.len());
    let freq = (k as i64 % bins) as f64 / bins as f64 * view.sample_rate / 2.0;

    Some(Readout {
        x: Some((frame - view.first_frame) as f64 * grid_x + grid_x / 2.0 + layout.left),
        y: Some(((ch as i64 + 1) * bins - bin) as f64 * grid_y),
        x_label: Some(format!("{}", frame)),
        y_label: Some(format!("{:.0}", freq)),
        values: window.channel(ch).and_then(|c| c.get(k).copied()).into_iter().collect(),
    })
}
