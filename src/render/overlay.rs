use super::cursor::Readout;
use super::grid::{EventMarker, TEXT_COLOR};
use super::instruction::{Color, DrawList, Font, Path, Rect, TextAlign, TextBaseline, TextMetrics, TextRun};
use super::layout::Layout;

const ROW_PITCH: f64 = 15.0;
const LABEL_BOX: Color = Color::rgba(0, 0, 0, 191);
const READOUT_BOX: Color = Color::rgba(0, 0, 0, 128);
const CROSSHAIR: Color = Color::rgb(0xb0, 0xb0, 0xb0);
/// Left edge of the value column, measured from the right border.
const VALUE_COLUMN: f64 = 70.0;

fn label(text: String, x: f64, y: f64, align: TextAlign, baseline: TextBaseline, max_width: f64) -> TextRun {
    TextRun {
        text,
        x,
        y,
        align,
        baseline,
        font: Font::LABEL,
        color: TEXT_COLOR,
        max_width: Some(max_width),
    }
}

/// Stack the labels of one marker in a box hanging from the top edge, to the
/// right of the marker when they fit and to its left otherwise.
pub fn draw_event_labels(list: &mut DrawList, layout: &Layout, marker: &EventMarker, metrics: &dyn TextMetrics) {
    if marker.events.is_empty() {
        return;
    }
    let lines: Vec<String> = marker.events.iter().map(|e| e.label()).collect();
    let box_w = lines
        .iter()
        .map(|s| metrics.measure(s, Font::LABEL))
        .fold(0.0, f64::max)
        + 5.0;
    let box_h = lines.len() as f64 * ROW_PITCH + 2.0;
    let (box_x, align) = if layout.width - marker.x >= box_w {
        (marker.x, TextAlign::Left)
    } else {
        (marker.x - box_w, TextAlign::Right)
    };
    list.fill_rect(Rect::new(box_x, 0.0, box_w, box_h), LABEL_BOX);
    for (i, line) in lines.into_iter().enumerate() {
        list.text(label(line, marker.x, (i + 1) as f64 * ROW_PITCH, align, TextBaseline::Bottom, box_w));
    }
}

/// Crosshair, axis label boxes and the value column.
pub fn draw_readout(list: &mut DrawList, layout: &Layout, readout: &Readout) {
    let (w, h) = (layout.width, layout.height);
    let mut cross = Path::new();
    if let Some(x) = readout.x {
        cross.move_to(x, 0.0);
        cross.line_to(x, layout.plot_height());
    }
    if let Some(y) = readout.y {
        cross.move_to(layout.left, y);
        cross.line_to(w, y);
    }
    list.stroke(cross, CROSSHAIR, 1.0);

    if let (Some(x), Some(text)) = (readout.x, &readout.x_label) {
        list.fill_rect(Rect::new((x - 20.0).min(w - 40.0), h - 18.0, 40.0, 16.0), READOUT_BOX);
        list.text(label(text.clone(), x.min(w - 20.0), h - 10.0, TextAlign::Center, TextBaseline::Middle, 40.0));
    }
    if let (Some(y), Some(text)) = (readout.y, &readout.y_label) {
        list.fill_rect(Rect::new(5.0, (y - 8.0).max(0.0), 45.0, 16.0), READOUT_BOX);
        list.text(label(text.clone(), 40.0, y.max(10.0), TextAlign::Right, TextBaseline::Middle, 40.0));
    }

    if readout.values.is_empty() {
        return;
    }
    list.fill_rect(
        Rect::new(w - VALUE_COLUMN, 0.0, VALUE_COLUMN + 10.0, readout.values.len() as f64 * ROW_PITCH + 5.0),
        LABEL_BOX,
    );
    for (i, v) in readout.values.iter().enumerate() {
        list.text(label(
            format!("{:.7}", v),
            w - 2.0,
            (i + 1) as f64 * ROW_PITCH,
            TextAlign::Right,
            TextBaseline::Bottom,
            VALUE_COLUMN,
        ));
    }
}
