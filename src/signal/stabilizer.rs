use super::index::wrap;
use super::snapshot::DrawMode;

/// Offset added to the mid-level so a flat or noisy signal does not retrigger.
pub const TRIGGER_EPSILON: f32 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stabilization {
    /// Logical index (relative to the write cursor) used as the display zero.
    pub trigger: usize,
    /// Samples to lay out across the full plot width at zoom 1.
    pub draw_len: f64,
}

impl Stabilization {
    /// No trigger: the whole window from its logical start.
    pub fn unstabilized(len: usize) -> Self {
        Self {
            trigger: 0,
            draw_len: len as f64,
        }
    }
}

/// Triggering only runs for continuous acquisition with less than one
/// second of audio in view.
pub fn applies(mode: DrawMode, len: usize, sample_rate: Option<f64>) -> bool {
    mode == DrawMode::Continuous && sample_rate.is_some_and(|sr| (len as f64) < sr)
}

/// Locate the trigger on `reference` (logically rotated by `write_cursor`)
/// and compute a whole-period draw length.
///
/// `extent` is the global (min, max) across all channels.
pub fn stabilize(
    reference: &[f32],
    write_cursor: i64,
    extent: (f32, f32),
    sample_rate: f64,
    freq_estimated: Option<f64>,
) -> Stabilization {
    let len = reference.len();
    if len == 0 {
        return Stabilization::unstabilized(0);
    }
    let threshold = (extent.0 + extent.1) * 0.5 + TRIGGER_EPSILON;
    let trigger = find_trigger(reference, write_cursor, threshold).unwrap_or_else(|| {
        log::debug!("no zero crossing around {:.4}, drawing unstabilized", threshold);
        0
    });

    let period = freq_estimated.map_or(f64::NAN, |f| sample_rate / f);
    let cycles = (len as f64 / period).floor() - 1.0;
    let remaining = (len - trigger) as f64;
    let draw_len = if period.is_finite() && cycles > 0.0 {
        (period * cycles).min(remaining)
    } else {
        remaining
    };

    Stabilization { trigger, draw_len }
}

/// First sample above `threshold`, then the first one after it back below.
/// A crossing on the last sample leaves nothing to draw and is rejected.
fn find_trigger(reference: &[f32], write_cursor: i64, threshold: f32) -> Option<usize> {
    let len = reference.len();
    let sample = |i: usize| reference[wrap(i as i64, write_cursor, len)];

    let rising = (0..len).find(|&i| sample(i) > threshold)?;
    (rising + 1..len)
        .find(|&i| sample(i) < threshold)
        .filter(|&i| i < len - 1)
}
