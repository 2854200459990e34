pub const MIN_ZOOM: f64 = 1.0;
/// Zoom ceiling for frequency views and the floor of the time-view ceiling.
pub const BASE_MAX_ZOOM: f64 = 16.0;
pub const MAX_VERTICAL_ZOOM: f64 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoomFamily {
    Oscilloscope,
    Spectroscope,
    Spectrogram,
}

impl ZoomFamily {
    pub const ALL: [ZoomFamily; 3] = [
        ZoomFamily::Oscilloscope,
        ZoomFamily::Spectroscope,
        ZoomFamily::Spectrogram,
    ];

    fn slot(self) -> usize {
        match self {
            ZoomFamily::Oscilloscope => 0,
            ZoomFamily::Spectroscope => 1,
            ZoomFamily::Spectrogram => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomState {
    pub zoom: f64,
    /// Left edge of the visible range as a fraction of the whole range.
    pub offset: f64,
    pub vertical_zoom: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            zoom: MIN_ZOOM,
            offset: 0.0,
            vertical_zoom: 1.0,
        }
    }
}

impl ZoomState {
    /// Fraction of the whole range under `cursor_in` (0..1 across the plot).
    pub fn position_at(&self, cursor_in: f64) -> f64 {
        self.offset + cursor_in / self.zoom
    }

    /// Clamp and store the zoom, shifting the offset so the position under
    /// `cursor_in` stays under it.
    pub fn set_zoom(&mut self, zoom: f64, max_zoom: f64, cursor_in: f64) {
        let anchor = self.position_at(cursor_in);
        self.zoom = clamp(zoom, MIN_ZOOM, max_zoom.max(MIN_ZOOM));
        self.set_offset(anchor - cursor_in / self.zoom);
    }

    /// Clamp to `[0, 1 - 1/zoom]` so the view never leaves the data.
    pub fn set_offset(&mut self, offset: f64) {
        let max_offset = 1.0 - 1.0 / self.zoom;
        self.offset = clamp(offset, 0.0, max_offset);
    }

    pub fn set_vertical_zoom(&mut self, vertical_zoom: f64) {
        self.vertical_zoom = clamp(vertical_zoom, 1.0, MAX_VERTICAL_ZOOM);
    }
}

fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoomBook {
    states: [ZoomState; 3],
}

impl ZoomBook {
    pub fn get(&self, family: ZoomFamily) -> &ZoomState {
        &self.states[family.slot()]
    }

    pub fn get_mut(&mut self, family: ZoomFamily) -> &mut ZoomState {
        &mut self.states[family.slot()]
    }

    /// Reset zoom and offset of every family; vertical zoom is kept.
    pub fn reset_all(&mut self) {
        for state in &mut self.states {
            state.zoom = MIN_ZOOM;
            state.offset = 0.0;
        }
    }
}

/// Zoom ceiling: fixed for frequency views, for time views the number of
/// display units (hops) in the window, never below the fixed ceiling.
pub fn max_zoom(family: ZoomFamily, samples: usize, unit: usize) -> f64 {
    match family {
        ZoomFamily::Spectroscope | ZoomFamily::Spectrogram => BASE_MAX_ZOOM,
        ZoomFamily::Oscilloscope => {
            if unit == 0 {
                return BASE_MAX_ZOOM;
            }
            (samples as f64 / unit as f64).max(BASE_MAX_ZOOM)
        }
    }
}
