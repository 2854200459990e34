use clap::Parser;
use std::path::PathBuf;

use staticscope::ScopeMode;

#[derive(Parser, Debug)]
#[command(name = "staticscope", about = "Render recorded scope snapshots to video")]
pub struct Cli {
    /// Snapshot stream, one JSON snapshot per line
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "scope.mp4")]
    pub output: PathBuf,

    /// Config file (default: ./staticscope.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// View mode: data, interleaved, oscilloscope, spectroscope, spectrogram
    #[arg(short, long)]
    pub mode: Option<ScopeMode>,

    /// Do not maintain the spectrogram image
    #[arg(long)]
    pub no_spectrogram: bool,

    /// Horizontal zoom applied before the first frame
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Pan offset (fraction of the data) applied before the first frame
    #[arg(long, default_value_t = 0.0)]
    pub offset: f64,

    /// Vertical zoom applied before the first frame
    #[arg(long, default_value_t = 1.0)]
    pub vzoom: f64,

    /// Pointer position for the value readout, as x,y in pixels
    #[arg(long, value_delimiter = ',')]
    pub cursor: Vec<f64>,

    /// Write the export table of the last snapshot as CSV
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// TTF/OTF font used for labels
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Surface width in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 400)]
    pub height: u32,

    /// Frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_options() {
        let cli = Cli::try_parse_from([
            "staticscope",
            "snaps.jsonl",
            "--mode",
            "spectroscope",
            "--zoom",
            "4",
            "--cursor",
            "400,120",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(ScopeMode::Spectroscope));
        assert_eq!(cli.zoom, 4.0);
        assert_eq!(cli.cursor, vec![400.0, 120.0]);
        assert_eq!(cli.width, 800);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["staticscope", "--mode", "vectorscope"]).is_err());
    }
}
