use serde::{Deserialize, Serialize};

use super::log_freq::AxisScale;
use crate::error::ScopeError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    Offline,
    Continuous,
    #[serde(rename = "onevent")]
    OnEvent,
    #[default]
    Manual,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FftOverlap {
    One,
    #[default]
    Two,
    Four,
    Eight,
}

impl FftOverlap {
    pub fn factor(self) -> u32 {
        match self {
            FftOverlap::One => 1,
            FftOverlap::Two => 2,
            FftOverlap::Four => 4,
            FftOverlap::Eight => 8,
        }
    }

    /// Frequency-domain samples written per time-domain sample.
    pub fn hop_ratio(self) -> f64 {
        self.factor() as f64 / 2.0
    }
}

impl TryFrom<u32> for FftOverlap {
    type Error = ScopeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FftOverlap::One),
            2 => Ok(FftOverlap::Two),
            4 => Ok(FftOverlap::Four),
            8 => Ok(FftOverlap::Eight),
            other => Err(ScopeError::InvalidOverlap(other)),
        }
    }
}

impl From<FftOverlap> for u32 {
    fn from(value: FftOverlap) -> Self {
        value.factor()
    }
}

/// Per-channel sample storage. All channels share one length.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f32>>", into = "Vec<Vec<f32>>")]
pub struct SampleWindow {
    channels: Vec<Vec<f32>>,
}

impl SampleWindow {
    pub fn new(channels: Vec<Vec<f32>>) -> Result<Self, ScopeError> {
        if let Some(first) = channels.first() {
            let expected = first.len();
            if let Some((channel, ch)) = channels
                .iter()
                .enumerate()
                .find(|(_, ch)| ch.len() != expected)
            {
                return Err(ScopeError::RaggedChannels {
                    channel,
                    expected,
                    found: ch.len(),
                });
            }
        }
        Ok(Self { channels })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// True when there is nothing to draw: no channels or zero-length channels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn extent(&self) -> Option<(f32, f32)> {
        let mut samples = self.channels.iter().flatten().copied();
        let first = samples.next()?;
        Some(samples.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
    }
}

impl TryFrom<Vec<Vec<f32>>> for SampleWindow {
    type Error = ScopeError;

    fn try_from(value: Vec<Vec<f32>>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SampleWindow> for Vec<Vec<f32>> {
    fn from(value: SampleWindow) -> Self {
        value.channels
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScopeEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ScopeEvent {
    pub fn label(&self) -> String {
        if let Some(path) = self.data.get("path") {
            let value = self.data.get("value").unwrap_or(&serde_json::Value::Null);
            return format!("{}: {}", plain(path), plain(value));
        }
        match &self.data {
            serde_json::Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(plain).collect();
                format!("{}: {}", self.kind, joined.join(","))
            }
            serde_json::Value::Null => self.kind.clone(),
            other => format!("{}: {}", self.kind, plain(other)),
        }
    }
}

fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One renderable instant. Replaced wholesale on every update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawSnapshot {
    #[serde(default)]
    pub draw_mode: DrawMode,
    /// Logical index of the most recently written sample.
    #[serde(rename = "$", default)]
    pub write_cursor: i64,
    #[serde(rename = "$buffer", default)]
    pub buffer_cursor: i64,
    #[serde(rename = "t", default)]
    pub time: Option<SampleWindow>,
    #[serde(rename = "f", default)]
    pub freq: Option<SampleWindow>,
    #[serde(rename = "e", default)]
    pub events: Option<Vec<Vec<ScopeEvent>>>,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default)]
    pub fft_overlap: FftOverlap,
    #[serde(default)]
    pub freq_estimated: Option<f64>,
    #[serde(default)]
    pub sample_rate: Option<f64>,
    #[serde(rename = "xLogBase", default)]
    pub axis: AxisScale,
}

fn default_buffer_size() -> usize {
    128
}

fn default_fft_size() -> usize {
    256
}

impl Default for DrawSnapshot {
    fn default() -> Self {
        Self {
            draw_mode: DrawMode::Manual,
            write_cursor: 0,
            buffer_cursor: 0,
            time: None,
            freq: None,
            events: None,
            buffer_size: default_buffer_size(),
            fft_size: default_fft_size(),
            fft_overlap: FftOverlap::Two,
            freq_estimated: None,
            sample_rate: None,
            axis: AxisScale::Linear,
        }
    }
}

impl DrawSnapshot {
    pub fn time_window(&self) -> Option<&SampleWindow> {
        self.time.as_ref().filter(|w| !w.is_empty())
    }

    /// Frequency-domain window, only when it holds at least one full frame.
    pub fn freq_window(&self) -> Option<&SampleWindow> {
        let bins = self.fft_bins();
        self.freq
            .as_ref()
            .filter(|w| bins > 0 && w.len() >= bins)
    }

    pub fn fft_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Physical start of the frequency ring, aligned down to a frame boundary.
    pub fn freq_write_cursor(&self) -> i64 {
        let bins = self.fft_bins() as i64;
        let cursor = self.write_cursor * self.fft_overlap.factor() as i64 / 2;
        if bins == 0 {
            return cursor;
        }
        cursor - cursor.rem_euclid(bins)
    }

    pub fn events_at(&self, hop: i64) -> Option<&[ScopeEvent]> {
        let hop = usize::try_from(hop).ok()?;
        self.events
            .as_ref()?
            .get(hop)
            .map(Vec::as_slice)
            .filter(|e| !e.is_empty())
    }
}
