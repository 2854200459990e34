use super::mode::ScopeMode;
use crate::signal::index::wrap;
use crate::signal::snapshot::DrawSnapshot;

/// Rows shown per channel before the table is cut short.
pub const DATA_TABLE_ROWS: usize = 2048;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataRow {
    /// Logical index, 0 being the oldest sample.
    pub index: usize,
    pub value: f32,
    /// First sample of a hop that carries events.
    pub highlight: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelTable {
    pub rows: Vec<DataRow>,
    /// The channel holds more than [`DATA_TABLE_ROWS`] samples.
    pub truncated: bool,
}

pub fn data_table(snap: &DrawSnapshot) -> Vec<ChannelTable> {
    let Some(window) = snap.time_window() else {
        return Vec::new();
    };
    let len = window.len();
    let hop = snap.buffer_size.max(1);
    window
        .channels()
        .map(|samples| {
            let rows = (0..len.min(DATA_TABLE_ROWS))
                .map(|j| {
                    let highlight = j % hop == 0
                        && snap
                            .events_at(snap.buffer_cursor + (j / hop) as i64)
                            .is_some_and(|events| !events.is_empty());
                    DataRow {
                        index: j,
                        value: samples[wrap(j as i64, snap.write_cursor, len)],
                        highlight,
                    }
                })
                .collect();
            ChannelTable {
                rows,
                truncated: len > DATA_TABLE_ROWS,
            }
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<f32>>,
}

fn channel_header(channels: usize) -> Vec<String> {
    (1..=channels).map(|i| format!("channel{}", i)).collect()
}

/// Export what the given mode shows: the time window for time views and Data,
/// the newest frame for the spectroscope, and every frame for the spectrogram
/// (bins as rows). `None` when that data is missing.
pub fn export_table(snap: &DrawSnapshot, mode: ScopeMode) -> Option<ExportTable> {
    match mode {
        ScopeMode::Data | ScopeMode::Interleaved | ScopeMode::Oscilloscope => {
            let window = snap.time_window()?;
            let len = window.len();
            let rows: Vec<Vec<f32>> = (0..len as i64)
                .map(|j| {
                    let k = wrap(j, snap.write_cursor, len);
                    window.channels().map(|ch| ch[k]).collect()
                })
                .collect();
            Some(ExportTable {
                header: channel_header(window.channel_count()),
                rows,
            })
        }
        ScopeMode::Spectroscope => {
            let window = snap.freq_window()?;
            let len = window.len();
            let base = snap.freq_write_cursor();
            let rows: Vec<Vec<f32>> = (len - snap.fft_bins()..len)
                .map(|j| {
                    let k = wrap(j as i64, base, len);
                    window.channels().map(|ch| ch[k]).collect()
                })
                .collect();
            Some(ExportTable {
                header: channel_header(window.channel_count()),
                rows,
            })
        }
        ScopeMode::Spectrogram => {
            let window = snap.freq_window()?;
            let len = window.len();
            let bins = snap.fft_bins();
            let frames = len / bins;
            let base = snap.freq_write_cursor();
            let header: Vec<String> = (1..=frames)
                .flat_map(|h| (1..=window.channel_count()).map(move |c| format!("frame{}_channel{}", h, c)))
                .collect();
            let rows = (0..bins)
                .map(|bin| {
                    let mut row = Vec::with_capacity(frames * window.channel_count());
                    for h in 0..frames {
                        let k = wrap((h * bins + bin) as i64, base, len);
                        row.extend(window.channels().map(|ch| ch[k]));
                    }
                    row
                })
                .collect();
            Some(ExportTable { header, rows })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::snapshot::{SampleWindow, ScopeEvent};

    fn time_snapshot(len: usize, write_cursor: i64) -> DrawSnapshot {
        let a: Vec<f32> = (0..len).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..len).map(|i| -(i as f32)).collect();
        DrawSnapshot {
            write_cursor,
            time: Some(SampleWindow::new(vec![a, b]).unwrap()),
            buffer_size: 4,
            ..Default::default()
        }
    }

    #[test]
    fn table_is_in_logical_order() {
        let snap = time_snapshot(8, 3);
        let tables = data_table(&snap);
        assert_eq!(tables.len(), 2);
        let values: Vec<f32> = tables[0].rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0, 6.0, 7.0, 0.0, 1.0, 2.0]);
        assert!(!tables[0].truncated);
    }

    #[test]
    fn long_channels_are_truncated() {
        let snap = time_snapshot(DATA_TABLE_ROWS + 10, 0);
        let tables = data_table(&snap);
        assert_eq!(tables[1].rows.len(), DATA_TABLE_ROWS);
        assert!(tables[1].truncated);
    }

    #[test]
    fn hops_with_events_are_highlighted() {
        let mut snap = time_snapshot(12, 0);
        snap.buffer_cursor = 1;
        let event = ScopeEvent {
            kind: "bang".into(),
            data: serde_json::Value::Null,
        };
        snap.events = Some(vec![vec![], vec![], vec![event], vec![]]);
        let highlighted: Vec<usize> = data_table(&snap)[0]
            .rows
            .iter()
            .filter(|r| r.highlight)
            .map(|r| r.index)
            .collect();
        // hop 1 of the window is absolute hop 2
        assert_eq!(highlighted, vec![4]);
    }

    #[test]
    fn no_time_data_gives_empty_table() {
        assert!(data_table(&DrawSnapshot::default()).is_empty());
        assert!(export_table(&DrawSnapshot::default(), ScopeMode::Oscilloscope).is_none());
    }

    #[test]
    fn time_export() {
        let table = export_table(&time_snapshot(4, 1), ScopeMode::Oscilloscope).unwrap();
        assert_eq!(table.header, vec!["channel1", "channel2"]);
        assert_eq!(table.rows[0], vec![1.0, -1.0]);
        assert_eq!(table.rows[3], vec![0.0, 0.0]);
    }

    #[test]
    fn frequency_exports() {
        let bins = 2;
        let data: Vec<f32> = (0..6).map(|i| i as f32).collect();
        let snap = DrawSnapshot {
            freq: Some(SampleWindow::new(vec![data]).unwrap()),
            fft_size: bins * 2,
            ..Default::default()
        };
        let spectrum = export_table(&snap, ScopeMode::Spectroscope).unwrap();
        assert_eq!(spectrum.header, vec!["channel1"]);
        assert_eq!(spectrum.rows, vec![vec![4.0], vec![5.0]]);

        let gram = export_table(&snap, ScopeMode::Spectrogram).unwrap();
        assert_eq!(gram.header, vec!["frame1_channel1", "frame2_channel1", "frame3_channel1"]);
        assert_eq!(gram.rows, vec![vec![0.0, 2.0, 4.0], vec![1.0, 3.0, 5.0]]);
    }
}
