/// Resolve a logical index against a circular buffer of `len` samples whose
/// logical zero sits at physical position `base`.
///
/// Total over all `i64` inputs; `len` must be non-zero (callers skip empty
/// buffers before resolving).
#[inline]
pub fn wrap(i: i64, base: i64, len: usize) -> usize {
    debug_assert!(len > 0, "wrap() on an empty buffer");
    let len = len as i64;
    (i.rem_euclid(len) + base.rem_euclid(len)).rem_euclid(len) as usize
}

/// Read a sample through [`wrap`], returning `None` for an empty channel.
#[inline]
pub fn read_wrapped(channel: &[f32], i: i64, base: i64) -> Option<f32> {
    if channel.is_empty() {
        return None;
    }
    channel.get(wrap(i, base, channel.len())).copied()
}
