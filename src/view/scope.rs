use super::mode::{self, ModeAvailability, ScopeMode};
use super::table::{self, ChannelTable, ExportTable};
use super::zoom::{max_zoom, ZoomBook, ZoomState};
use crate::render::cursor::{self, Readout};
use crate::render::grid::EventMarker;
use crate::render::instruction::{Color, DrawList, Point, Rect, TextMetrics};
use crate::render::layout::Layout;
use crate::render::overlay;
use crate::render::spectrogram::{self, SpectrogramCompositor, SpectrogramTexture};
use crate::render::spectrum;
use crate::render::waveform::{self, TraceLayout};
use crate::signal::snapshot::{DrawMode, DrawSnapshot};

pub const BACKGROUND: Color = Color::rgb(0x18, 0x18, 0x18);
pub const ZOOM_STEP: f64 = 1.5;
pub const WHEEL_PAN: f64 = 0.1;

#[derive(Clone, Copy, Debug)]
pub struct ScopeOptions {
    pub mode: ScopeMode,
    pub spectrogram_enabled: bool,
    pub layout: Layout,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            mode: ScopeMode::Oscilloscope,
            spectrogram_enabled: false,
            layout: Layout::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// Scene first, then the event and cursor overlay on top.
    Canvas { scene: DrawList, overlay: DrawList },
    Table(Vec<ChannelTable>),
}

pub struct StaticScope {
    mode: ScopeMode,
    zoom: ZoomBook,
    snapshot: DrawSnapshot,
    layout: Layout,
    cursor: Option<Point>,
    drag_x: Option<f64>,
    compositor: SpectrogramCompositor,
    spectrogram_enabled: bool,
    new_data: bool,
    redraw_pending: bool,
}

impl StaticScope {
    pub fn new(options: ScopeOptions) -> Self {
        Self {
            mode: options.mode,
            zoom: ZoomBook::default(),
            snapshot: DrawSnapshot::default(),
            layout: options.layout,
            cursor: None,
            drag_x: None,
            compositor: SpectrogramCompositor::new(),
            spectrogram_enabled: options.spectrogram_enabled,
            new_data: false,
            redraw_pending: false,
        }
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn snapshot(&self) -> &DrawSnapshot {
        &self.snapshot
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn zoom_state(&self) -> &ZoomState {
        self.zoom.get(self.mode.zoom_family())
    }

    pub fn texture(&self) -> &SpectrogramTexture {
        self.compositor.texture()
    }

    /// False while there is no time-domain data ("No Data").
    pub fn has_data(&self) -> bool {
        self.snapshot.time_window().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_x.is_some()
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    pub fn update(&mut self, snapshot: DrawSnapshot) {
        self.snapshot = snapshot;
        self.new_data = true;
        self.request_redraw();
    }

    /// Schedule a redraw unless one is already pending. Returns whether a new
    /// one was scheduled.
    pub fn request_redraw(&mut self) -> bool {
        if self.redraw_pending {
            return false;
        }
        self.redraw_pending = true;
        true
    }

    pub fn frame(&mut self, metrics: &dyn TextMetrics) -> Option<Frame> {
        if !self.redraw_pending {
            return None;
        }
        self.redraw_pending = false;
        if !self.has_data() {
            log::debug!("no time-domain data, drawing background only");
        }
        if self.new_data && self.spectrogram_enabled {
            let painted = self.compositor.update(&self.snapshot);
            log::debug!("spectrogram painted {} frame(s)", painted);
        }
        self.new_data = false;

        if self.mode == ScopeMode::Data {
            return Some(Frame::Table(table::data_table(&self.snapshot)));
        }
        let (scene, overlay) = self.render(metrics);
        Some(Frame::Canvas { scene, overlay })
    }

    fn render(&self, metrics: &dyn TextMetrics) -> (DrawList, DrawList) {
        let layout = &self.layout;
        let snap = &self.snapshot;
        let zoom = self.zoom_state();
        let mut scene = DrawList::new();
        scene.fill_rect(Rect::new(0.0, 0.0, layout.width, layout.height), BACKGROUND);

        let pointer = self.cursor;
        let (markers, readout): (Vec<EventMarker>, Option<Readout>) = match self.mode {
            ScopeMode::Data => (Vec::new(), None),
            ScopeMode::Interleaved | ScopeMode::Oscilloscope => {
                let trace = if self.mode == ScopeMode::Interleaved {
                    TraceLayout::Interleaved
                } else {
                    TraceLayout::Overlaid
                };
                match (waveform::draw_time(&mut scene, layout, snap, zoom, trace), snap.time_window()) {
                    (Some(pass), Some(window)) => {
                        let readout = pointer
                            .and_then(|p| cursor::time_readout(layout, &pass.view, window, snap.write_cursor, p));
                        (pass.markers, readout)
                    }
                    _ => (Vec::new(), None),
                }
            }
            ScopeMode::Spectroscope => match (spectrum::draw_spectrum(&mut scene, layout, snap, zoom), snap.freq_window()) {
                (Some(pass), Some(window)) => {
                    let readout = pointer.and_then(|p| cursor::spectrum_readout(layout, &pass, window, p));
                    (pass.markers, readout)
                }
                _ => (Vec::new(), None),
            },
            ScopeMode::Spectrogram => {
                let texture = self.compositor.texture();
                match (spectrogram::draw_spectrogram(&mut scene, layout, snap, zoom, texture), snap.freq_window()) {
                    (Some(pass), Some(window)) => {
                        let readout = pointer.and_then(|p| cursor::spectrogram_readout(layout, &pass.view, window, p));
                        (pass.markers, readout)
                    }
                    _ => (Vec::new(), None),
                }
            }
        };

        let mut over = DrawList::new();
        for marker in &markers {
            overlay::draw_event_labels(&mut over, layout, marker, metrics);
        }
        if let Some(readout) = &readout {
            overlay::draw_readout(&mut over, layout, readout);
        }
        (scene, over)
    }

    pub fn set_mode(&mut self, mode: ScopeMode) {
        self.mode = mode;
        self.request_redraw();
    }

    pub fn cycle_mode(&mut self) -> ScopeMode {
        let avail = ModeAvailability {
            spectrogram_enabled: self.spectrogram_enabled,
            continuous: self.snapshot.draw_mode == DrawMode::Continuous,
            single_channel: self.snapshot.time.as_ref().is_some_and(|t| t.channel_count() == 1),
        };
        let next = mode::cycle(self.mode, avail);
        log::debug!("mode {} -> {}", self.mode, next);
        self.set_mode(next);
        next
    }

    fn accepts_pointer(&self) -> bool {
        self.has_data() && self.mode != ScopeMode::Data
    }

    /// Fraction of the plot under the cursor, the centre without one.
    fn cursor_in(&self) -> f64 {
        self.cursor.map_or(0.5, |c| self.layout.cursor_fraction(c.x))
    }

    fn max_zoom(&self) -> f64 {
        let samples = self.snapshot.time_window().map_or(0, |w| w.len());
        max_zoom(self.mode.zoom_family(), samples, self.snapshot.buffer_size)
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        let (max, cursor_in) = (self.max_zoom(), self.cursor_in());
        self.zoom.get_mut(self.mode.zoom_family()).set_zoom(zoom, max, cursor_in);
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.zoom.get_mut(self.mode.zoom_family()).set_offset(offset);
    }

    pub fn set_vertical_zoom(&mut self, vertical_zoom: f64) {
        self.zoom.get_mut(self.mode.zoom_family()).set_vertical_zoom(vertical_zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom_state().zoom * ZOOM_STEP);
        self.request_redraw();
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom_state().zoom / ZOOM_STEP);
        self.request_redraw();
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(1.0);
        self.request_redraw();
    }

    pub fn reset_zoom_all(&mut self) {
        self.zoom.reset_all();
        self.request_redraw();
    }

    pub fn zoom_label(&self) -> String {
        format!("{:.1}x", self.zoom_state().zoom)
    }

    pub fn pointer_move(&mut self, p: Point) -> bool {
        if !self.accepts_pointer() {
            return false;
        }
        self.cursor = Some(self.layout.clamp(p));
        self.request_redraw();
        true
    }

    pub fn pointer_leave(&mut self) -> bool {
        if !self.accepts_pointer() {
            return false;
        }
        self.cursor = None;
        self.request_redraw();
        true
    }

    pub fn begin_drag(&mut self, x: f64) -> bool {
        if !self.accepts_pointer() {
            return false;
        }
        self.drag_x = Some(x);
        true
    }

    /// Pan by the horizontal movement since the previous drag position.
    pub fn drag_to(&mut self, x: f64) {
        let Some(prev) = self.drag_x else {
            return;
        };
        self.drag_x = Some(x);
        let before = *self.zoom_state();
        let delta = -(x - prev) / before.zoom / self.layout.width;
        if delta != 0.0 {
            self.set_offset(before.offset + delta);
        }
        if *self.zoom_state() != before {
            self.request_redraw();
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_x = None;
    }

    /// Wheel over the vertical axis scales the amplitude, anywhere else it
    /// zooms (and pans with a horizontal delta) then tracks the pointer.
    pub fn wheel(&mut self, p: Point, delta_x: f64, delta_y: f64) {
        if !self.accepts_pointer() {
            return;
        }
        let multiplier = if delta_y > 0.0 {
            1.0 / ZOOM_STEP
        } else if delta_y < 0.0 {
            ZOOM_STEP
        } else {
            1.0
        };
        if p.x < self.layout.left && p.y < self.layout.plot_height() {
            let family = self.mode.zoom_family();
            let state = self.zoom.get_mut(family);
            state.set_vertical_zoom(state.vertical_zoom / multiplier);
            self.request_redraw();
            return;
        }
        if multiplier != 1.0 {
            self.set_zoom(self.zoom_state().zoom * multiplier);
        }
        if delta_x != 0.0 {
            let step = if delta_x > 0.0 { WHEEL_PAN } else { -WHEEL_PAN };
            self.set_offset(self.zoom_state().offset + step);
        }
        self.pointer_move(p);
    }

    pub fn data_table(&self) -> Vec<ChannelTable> {
        table::data_table(&self.snapshot)
    }

    pub fn export_table(&self) -> Option<ExportTable> {
        table::export_table(&self.snapshot, self.mode)
    }
}
